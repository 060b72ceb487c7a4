//! Built-in rule families
//!
//! [`block`] holds the paragraph-level rules, [`inline`] the span-level
//! ones. The two built-in dialects are assembled here: [`markdown_builder`]
//! lists the classic rules in match order, [`gfm_builder`] layers the
//! GitHub-flavored additions on top of it by name.

pub mod block;
pub mod inline;

use crate::engine::dialect::DialectBuilder;

use self::block::{
    AtxHeading, BlankLine, BlockText, Blockquote, FencedCode, HorizontalRule, HtmlBlock,
    IndentedCode, LinkDefinition, List, Paragraph, SetextHeading, Table,
};
use self::inline::{
    Autolink, CodeSpan, Emphasis, Escape, InlineHtml, InlineText, LineBreak, Link, NoLink, RefLink,
    Strikethrough, Strong, Url,
};

/// Names of the built-in rules, for anchoring builder edits
pub mod names {
    /// Runs of blank lines
    pub const BLANK_LINE: &str = "blank_line";
    /// Indentation-based code block
    pub const INDENTED_CODE: &str = "indented_code";
    /// Fenced code block
    pub const FENCED_CODE: &str = "fenced_code";
    /// ATX heading
    pub const HEADING: &str = "heading";
    /// Setext heading
    pub const SETEXT_HEADING: &str = "setext_heading";
    /// Thematic break
    pub const HORIZONTAL_RULE: &str = "horizontal_rule";
    /// Block quote
    pub const BLOCKQUOTE: &str = "blockquote";
    /// Bullet or ordered list
    pub const LIST: &str = "list";
    /// Raw HTML block
    pub const HTML_BLOCK: &str = "html_block";
    /// Link-reference definition
    pub const LINK_DEFINITION: &str = "link_definition";
    /// Pipe table
    pub const TABLE: &str = "table";
    /// Paragraph
    pub const PARAGRAPH: &str = "paragraph";
    /// Fallback of both passes
    pub const TEXT: &str = "text";

    /// Backslash escape
    pub const ESCAPE: &str = "escape";
    /// `<scheme:...>` / `<user@host>`
    pub const AUTOLINK: &str = "autolink";
    /// Bare `http(s)://` link
    pub const URL: &str = "url";
    /// Inline HTML
    pub const HTML: &str = "html";
    /// `[text](url)` and `![alt](src)`
    pub const LINK: &str = "link";
    /// `[text][label]`
    pub const REF_LINK: &str = "ref_link";
    /// `[label]`
    pub const NO_LINK: &str = "no_link";
    /// `**strong**`
    pub const STRONG: &str = "strong";
    /// `*emphasis*`
    pub const EMPHASIS: &str = "emphasis";
    /// `` `code` ``
    pub const CODE: &str = "code";
    /// Hard line break
    pub const LINE_BREAK: &str = "line_break";
    /// `~~strikethrough~~`
    pub const STRIKETHROUGH: &str = "strikethrough";
}

/// Rules of classic Markdown, in match order
pub fn markdown_builder() -> DialectBuilder {
    DialectBuilder::new("markdown")
        .block(BlankLine)
        .block(IndentedCode)
        .block(AtxHeading::markdown())
        .block(SetextHeading)
        .block(HorizontalRule)
        .block(Blockquote)
        .block(List::markdown())
        .block(HtmlBlock)
        .block(LinkDefinition)
        .block(Paragraph)
        .block(BlockText)
        .inline(Escape::markdown())
        .inline(Autolink)
        .inline(InlineHtml)
        .inline(Link)
        .inline(RefLink)
        .inline(NoLink)
        .inline(Strong)
        .inline(Emphasis)
        .inline(CodeSpan)
        .inline(LineBreak)
        .inline(InlineText::markdown())
}

/// GitHub-flavored additions layered on [`markdown_builder`]
pub fn gfm_builder() -> DialectBuilder {
    markdown_builder()
        .name("gfm")
        .block_before(names::HEADING, FencedCode)
        .block_before(names::SETEXT_HEADING, Table)
        .replace_block(names::HEADING, AtxHeading::gfm())
        .replace_block(names::LIST, List::gfm())
        .replace_inline(names::ESCAPE, Escape::gfm())
        .inline_after(names::AUTOLINK, Url)
        .inline_before(names::TEXT, Strikethrough)
        .replace_inline(names::TEXT, InlineText::gfm())
}

/// Resolve backslash escapes of ASCII punctuation
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\*b\\c\q"), r"a*b\c\q");
        assert_eq!(unescape(r"trailing\"), r"trailing\");
    }

    #[test]
    fn test_names_are_unique_per_pass() {
        let dialect = gfm_builder().build().unwrap();
        let mut block = dialect.block_rule_names();
        block.sort_unstable();
        block.dedup();
        assert_eq!(block.len(), dialect.block_rules().len());
    }
}
