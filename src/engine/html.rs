//! HTML rendering of a token tree
//!
//! Text and attribute values go through `html_escape`; raw HTML tokens are
//! written through unchanged. Blank lines and link definitions render to
//! nothing.
//!
//! # Example
//!
//! ```
//! use markdialect::{parse, Dialect, HtmlRenderer};
//!
//! let doc = parse("# Hi\n\nSome *text* & more.", &Dialect::markdown()).unwrap();
//! assert_eq!(
//!     HtmlRenderer::new().render(&doc),
//!     "<h1>Hi</h1>\n<p>Some <em>text</em> &amp; more.</p>\n"
//! );
//! ```

use super::token::{Alignment, Document, Token, TokenKind};

/// Renders documents to an HTML string
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer {
    /// Prefix for the class of fenced code with a language
    language_prefix: Option<&'static str>,
}

impl HtmlRenderer {
    /// Create a renderer with the `language-` class prefix
    pub fn new() -> Self {
        Self {
            language_prefix: Some("language-"),
        }
    }

    /// Set the class prefix for fenced code languages; `None` drops the
    /// class attribute
    pub fn with_language_prefix(mut self, prefix: Option<&'static str>) -> Self {
        self.language_prefix = prefix;
        self
    }

    /// Render a document
    pub fn render(&self, doc: &Document) -> String {
        self.render_tokens(&doc.tokens)
    }

    /// Render a list of sibling block tokens
    pub fn render_tokens(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            self.block(token, false, &mut out);
        }
        out
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    fn block(&self, token: &Token, loose: bool, out: &mut String) {
        match &token.kind {
            TokenKind::BlankLine | TokenKind::LinkDefinition { .. } => {}
            TokenKind::Heading { level, .. } => {
                out.push_str(&format!("<h{}>", level));
                self.inlines(&token.children, out);
                out.push_str(&format!("</h{}>\n", level));
            }
            TokenKind::Paragraph => self.paragraph(token, out),
            TokenKind::Plain if loose => self.paragraph(token, out),
            TokenKind::Plain => {
                self.inlines(&token.children, out);
                out.push('\n');
            }
            TokenKind::CodeBlock { text } => self.code_block(None, text, out),
            TokenKind::FencedCode { lang, text, .. } => self.code_block(lang.as_deref(), text, out),
            TokenKind::Blockquote => {
                out.push_str("<blockquote>\n");
                for child in &token.children {
                    self.block(child, false, out);
                }
                out.push_str("</blockquote>\n");
            }
            TokenKind::List {
                ordered,
                start,
                loose,
            } => self.list(token, *ordered, *start, *loose, out),
            TokenKind::Table { .. } => self.table(token, out),
            TokenKind::HorizontalRule => out.push_str("<hr />\n"),
            TokenKind::HtmlBlock { html } => {
                out.push_str(html);
                out.push('\n');
            }
            // stray rows, cells and inline tokens
            _ => self.inline(token, out),
        }
    }

    fn paragraph(&self, token: &Token, out: &mut String) {
        out.push_str("<p>");
        self.inlines(&token.children, out);
        out.push_str("</p>\n");
    }

    fn code_block(&self, lang: Option<&str>, text: &str, out: &mut String) {
        out.push_str("<pre><code");
        if let (Some(prefix), Some(lang)) = (self.language_prefix, lang) {
            out.push_str(" class=\"");
            out.push_str(prefix);
            html_escape::encode_double_quoted_attribute_to_string(lang, out);
            out.push('"');
        }
        out.push('>');
        html_escape::encode_text_to_string(text, out);
        if !text.is_empty() && !text.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</code></pre>\n");
    }

    fn list(&self, token: &Token, ordered: bool, start: Option<u64>, loose: bool, out: &mut String) {
        let tag = if ordered { "ol" } else { "ul" };
        match start {
            Some(n) if ordered && n != 1 => out.push_str(&format!("<ol start=\"{}\">\n", n)),
            _ => out.push_str(&format!("<{}>\n", tag)),
        }

        for item in &token.children {
            out.push_str("<li>");
            let blocks: Vec<&Token> = item
                .children
                .iter()
                .filter(|t| !matches!(t.kind, TokenKind::BlankLine))
                .collect();
            if loose && !blocks.is_empty() {
                out.push('\n');
            }
            for (i, child) in blocks.iter().enumerate() {
                if !loose && matches!(child.kind, TokenKind::Plain) {
                    self.inlines(&child.children, out);
                    if i + 1 < blocks.len() {
                        out.push('\n');
                    }
                } else {
                    if !loose && i == 0 {
                        out.push('\n');
                    }
                    self.block(child, loose, out);
                }
            }
            out.push_str("</li>\n");
        }

        out.push_str(&format!("</{}>\n", tag));
    }

    fn table(&self, token: &Token, out: &mut String) {
        out.push_str("<table>\n");
        let (head, body): (Vec<&Token>, Vec<&Token>) = token
            .children
            .iter()
            .partition(|row| matches!(row.kind, TokenKind::TableRow { header: true }));

        if !head.is_empty() {
            out.push_str("<thead>\n");
            for row in head {
                self.row(row, "th", out);
            }
            out.push_str("</thead>\n");
        }
        if !body.is_empty() {
            out.push_str("<tbody>\n");
            for row in body {
                self.row(row, "td", out);
            }
            out.push_str("</tbody>\n");
        }
        out.push_str("</table>\n");
    }

    fn row(&self, row: &Token, tag: &str, out: &mut String) {
        out.push_str("<tr>\n");
        for cell in &row.children {
            let align = match cell.kind {
                TokenKind::TableCell { alignment } => alignment,
                _ => Alignment::None,
            };
            match align {
                Alignment::None => out.push_str(&format!("<{}>", tag)),
                Alignment::Left => out.push_str(&format!("<{} style=\"text-align: left\">", tag)),
                Alignment::Center => {
                    out.push_str(&format!("<{} style=\"text-align: center\">", tag))
                }
                Alignment::Right => out.push_str(&format!("<{} style=\"text-align: right\">", tag)),
            }
            self.inlines(&cell.children, out);
            out.push_str(&format!("</{}>\n", tag));
        }
        out.push_str("</tr>\n");
    }

    // ========================================================================
    // Inlines
    // ========================================================================

    fn inlines(&self, tokens: &[Token], out: &mut String) {
        for token in tokens {
            self.inline(token, out);
        }
    }

    fn inline(&self, token: &Token, out: &mut String) {
        match &token.kind {
            TokenKind::Text { text } => {
                html_escape::encode_text_to_string(text, out);
            }
            TokenKind::Link { url, title } => {
                out.push_str("<a href=\"");
                html_escape::encode_double_quoted_attribute_to_string(url, out);
                out.push('"');
                self.title(title.as_deref(), out);
                out.push('>');
                self.inlines(&token.children, out);
                out.push_str("</a>");
            }
            TokenKind::Image { url, title, alt } => {
                out.push_str("<img src=\"");
                html_escape::encode_double_quoted_attribute_to_string(url, out);
                out.push_str("\" alt=\"");
                html_escape::encode_double_quoted_attribute_to_string(alt, out);
                out.push('"');
                self.title(title.as_deref(), out);
                out.push_str(" />");
            }
            TokenKind::Emphasis => self.wrap("em", token, out),
            TokenKind::Strong => self.wrap("strong", token, out),
            TokenKind::Strikethrough => self.wrap("del", token, out),
            TokenKind::Code { code } => {
                out.push_str("<code>");
                html_escape::encode_text_to_string(code, out);
                out.push_str("</code>");
            }
            TokenKind::LineBreak => out.push_str("<br />\n"),
            TokenKind::Html { html } => out.push_str(html),
            _ => self.inlines(&token.children, out),
        }
    }

    fn wrap(&self, tag: &str, token: &Token, out: &mut String) {
        out.push_str(&format!("<{}>", tag));
        self.inlines(&token.children, out);
        out.push_str(&format!("</{}>", tag));
    }

    fn title(&self, title: Option<&str>, out: &mut String) {
        if let Some(title) = title {
            out.push_str(" title=\"");
            html_escape::encode_double_quoted_attribute_to_string(title, out);
            out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dialect::Dialect;
    use crate::engine::parser::parse;

    fn render(source: &str, dialect: &Dialect) -> String {
        HtmlRenderer::new().render(&parse(source, dialect).unwrap())
    }

    #[test]
    fn test_render_code_block_escapes() {
        assert_eq!(
            render("    a < b", &Dialect::markdown()),
            "<pre><code>a &lt; b\n</code></pre>\n"
        );
    }

    #[test]
    fn test_render_fenced_language() {
        let html = render("```rust\nfn main() {}\n```", &Dialect::gfm());
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );

        let plain = HtmlRenderer::new()
            .with_language_prefix(None)
            .render(&parse("```rust\nx\n```", &Dialect::gfm()).unwrap());
        assert_eq!(plain, "<pre><code>x\n</code></pre>\n");
    }

    #[test]
    fn test_render_tight_list() {
        assert_eq!(
            render("- a\n- b", &Dialect::markdown()),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_render_loose_ordered_list() {
        assert_eq!(
            render("3. a\n\n4. b", &Dialect::markdown()),
            "<ol start=\"3\">\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_render_link_attributes() {
        assert_eq!(
            render("[a](/x?a=1&b=2 \"say \\\"hi\\\"\")", &Dialect::markdown()),
            "<p><a href=\"/x?a=1&amp;b=2\" title=\"say &quot;hi&quot;\">a</a></p>\n"
        );
    }

    #[test]
    fn test_render_table_alignment() {
        let html = render("| a | b |\n|:--|--:|\n| 1 | 2 |", &Dialect::gfm());
        assert!(html.starts_with("<table>\n<thead>\n<tr>\n<th style=\"text-align: left\">a</th>\n"));
        assert!(html.contains("<td style=\"text-align: right\">2</td>"));
        assert!(html.ends_with("</tbody>\n</table>\n"));
    }

    #[test]
    fn test_definitions_render_nothing() {
        assert_eq!(
            render("[x]\n\n[x]: /url", &Dialect::markdown()),
            "<p><a href=\"/url\">x</a></p>\n"
        );
    }
}
