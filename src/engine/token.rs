//! Token stream / document model
//!
//! A parse produces a tree of [`Token`]s. Block tokens (paragraphs, lists,
//! tables, ...) own either block children or, for the inline-bearing kinds,
//! inline children (text runs, emphasis, links, ...).

use serde::{Deserialize, Serialize};

use super::references::LinkReferences;
use super::source_location::Span;

/// Column alignment of a table cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// No alignment marker in the separator row
    #[default]
    None,
    /// `:---`
    Left,
    /// `:---:`
    Center,
    /// `---:`
    Right,
}

/// Node kinds with their kind-specific attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenKind {
    // ------------------------------------------------------------------
    // Block kinds
    // ------------------------------------------------------------------
    /// One or more whitespace-only lines
    BlankLine,

    /// ATX (`# Title`) or Setext (underlined) heading
    Heading {
        /// Heading level, 1-based
        level: u8,
        /// Whether the heading used the underline form
        setext: bool,
    },

    /// Paragraph of inline content
    Paragraph,

    /// Inline content that is not a paragraph (list item text, stray text)
    Plain,

    /// Indentation-based code block
    CodeBlock {
        /// Code with the indentation removed
        text: String,
    },

    /// Delimiter-based code block
    FencedCode {
        /// First word of the info string
        lang: Option<String>,
        /// Full info string after the opening fence
        info: String,
        /// Code between the fences
        text: String,
    },

    /// Block quote; children are blocks
    Blockquote,

    /// Ordered or bullet list; children are list items
    List {
        /// `1.` style rather than `-` style
        ordered: bool,
        /// Number of the first item of an ordered list
        start: Option<u64>,
        /// Whether blank lines separate items or blocks inside items
        loose: bool,
    },

    /// List item; children are blocks
    ListItem {
        /// Position of the item in its list, 0-based
        index: usize,
    },

    /// Pipe table; children are rows, the first one being the header
    Table {
        /// Alignment of each column
        alignments: Vec<Alignment>,
    },

    /// Table row; children are cells
    TableRow {
        /// Whether this is the header row
        header: bool,
    },

    /// Table cell of inline content
    TableCell {
        /// Alignment inherited from the column
        alignment: Alignment,
    },

    /// Thematic break
    HorizontalRule,

    /// Raw HTML passed through untouched
    HtmlBlock {
        /// The HTML source
        html: String,
    },

    /// `[label]: url "title"` definition
    LinkDefinition {
        /// Label as written
        label: String,
        /// Destination
        url: String,
        /// Optional title
        title: Option<String>,
    },

    // ------------------------------------------------------------------
    // Inline kinds
    // ------------------------------------------------------------------
    /// Run of literal text
    Text {
        /// The text, with escapes resolved
        text: String,
    },

    /// Hyperlink; children are the link text
    Link {
        /// Destination
        url: String,
        /// Optional title
        title: Option<String>,
    },

    /// Image
    Image {
        /// Source
        url: String,
        /// Optional title
        title: Option<String>,
        /// Alternative text, unparsed
        alt: String,
    },

    /// `*emphasis*`
    Emphasis,

    /// `**strong**`
    Strong,

    /// `~~strikethrough~~`
    Strikethrough,

    /// `` `code` `` span
    Code {
        /// Code with surrounding whitespace trimmed
        code: String,
    },

    /// Hard line break
    LineBreak,

    /// Inline HTML tag or comment
    Html {
        /// The HTML source
        html: String,
    },
}

impl TokenKind {
    /// Whether tokens of this kind belong to the block pass
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            TokenKind::BlankLine
                | TokenKind::Heading { .. }
                | TokenKind::Paragraph
                | TokenKind::Plain
                | TokenKind::CodeBlock { .. }
                | TokenKind::FencedCode { .. }
                | TokenKind::Blockquote
                | TokenKind::List { .. }
                | TokenKind::ListItem { .. }
                | TokenKind::Table { .. }
                | TokenKind::TableRow { .. }
                | TokenKind::TableCell { .. }
                | TokenKind::HorizontalRule
                | TokenKind::HtmlBlock { .. }
                | TokenKind::LinkDefinition { .. }
        )
    }

    /// Whether tokens of this kind are blocks whose children are inline
    pub fn is_inline_container(&self) -> bool {
        matches!(
            self,
            TokenKind::Heading { .. }
                | TokenKind::Paragraph
                | TokenKind::Plain
                | TokenKind::TableCell { .. }
        )
    }

    /// Short lowercase name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::BlankLine => "blank_line",
            TokenKind::Heading { .. } => "heading",
            TokenKind::Paragraph => "paragraph",
            TokenKind::Plain => "plain",
            TokenKind::CodeBlock { .. } => "code_block",
            TokenKind::FencedCode { .. } => "fenced_code",
            TokenKind::Blockquote => "blockquote",
            TokenKind::List { .. } => "list",
            TokenKind::ListItem { .. } => "list_item",
            TokenKind::Table { .. } => "table",
            TokenKind::TableRow { .. } => "table_row",
            TokenKind::TableCell { .. } => "table_cell",
            TokenKind::HorizontalRule => "horizontal_rule",
            TokenKind::HtmlBlock { .. } => "html_block",
            TokenKind::LinkDefinition { .. } => "link_definition",
            TokenKind::Text { .. } => "text",
            TokenKind::Link { .. } => "link",
            TokenKind::Image { .. } => "image",
            TokenKind::Emphasis => "emphasis",
            TokenKind::Strong => "strong",
            TokenKind::Strikethrough => "strikethrough",
            TokenKind::Code { .. } => "code",
            TokenKind::LineBreak => "line_break",
            TokenKind::Html { .. } => "html",
        }
    }
}

/// One structural node of the output document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Kind and attributes
    #[serde(flatten)]
    pub kind: TokenKind,
    /// Byte range in the text of the scope that produced the token
    pub span: Span,
    /// Child tokens, for container kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Token>,
}

impl Token {
    /// Create a token without children
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// Create a token with children
    pub fn with_children(kind: TokenKind, span: Span, children: Vec<Token>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Create a text run
    pub fn text(text: impl Into<String>, span: Span) -> Self {
        Self::new(TokenKind::Text { text: text.into() }, span)
    }

    /// Create an inline-bearing block whose inline source is parsed later
    ///
    /// The raw source is held as a single `Text` child until the inline
    /// pass replaces it.
    pub fn deferred(kind: TokenKind, span: Span, source: String) -> Self {
        let children = if source.is_empty() {
            Vec::new()
        } else {
            vec![Token::text(source, Span::new(0, 0))]
        };
        Self::with_children(kind, span, children)
    }

    /// Raw inline source of a token built with [`Token::deferred`]
    ///
    /// Returns `None` once the inline pass has replaced the placeholder.
    pub fn deferred_source(&self) -> Option<&str> {
        match self.children.as_slice() {
            [only] if only.span.is_empty() => only.as_text().filter(|t| !t.is_empty()),
            _ => None,
        }
    }

    /// The text of a `Text` token
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of this token and its descendants
    ///
    /// Code spans contribute their code, images their alt text.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            TokenKind::Text { text } => out.push_str(text),
            TokenKind::Code { code } => out.push_str(code),
            TokenKind::Image { alt, .. } => out.push_str(alt),
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Visit this token and all descendants depth-first, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Token)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Number of tokens in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Token::count).sum::<usize>()
    }
}

/// Merge adjacent `Text` tokens whose spans touch
pub fn coalesce_text(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (Some(last), TokenKind::Text { text }) = (out.last_mut(), &token.kind) {
            if last.span.is_followed_by(&token.span) {
                if let TokenKind::Text { text: merged } = &mut last.kind {
                    merged.push_str(text);
                    last.span = last.span.merge(&token.span);
                    continue;
                }
            }
        }
        out.push(token);
    }
    out
}

/// Result of parsing one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Top-level block tokens; their spans tile the source
    pub tokens: Vec<Token>,
    /// Link-reference definitions collected during the block pass
    #[serde(skip)]
    pub references: LinkReferences,
}

impl Document {
    /// Visit every token in document order
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a Token)) {
        for token in &self.tokens {
            token.walk(&mut visit);
        }
    }

    /// Top-level tokens other than blank lines
    pub fn blocks(&self) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::BlankLine))
    }

    /// Total number of tokens in the tree
    pub fn token_count(&self) -> usize {
        self.tokens.iter().map(Token::count).sum()
    }

    /// Serialize the token tree as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the token tree as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_inline_kinds() {
        assert!(TokenKind::Paragraph.is_block());
        assert!(TokenKind::Paragraph.is_inline_container());
        assert!(TokenKind::Blockquote.is_block());
        assert!(!TokenKind::Blockquote.is_inline_container());
        assert!(!TokenKind::Emphasis.is_block());
        assert_eq!(TokenKind::LineBreak.name(), "line_break");
    }

    #[test]
    fn test_deferred_holds_source_as_text() {
        let token = Token::deferred(TokenKind::Paragraph, Span::new(0, 4), "body".into());
        assert_eq!(token.children.len(), 1);
        assert_eq!(token.children[0].as_text(), Some("body"));
        assert_eq!(token.deferred_source(), Some("body"));

        let empty = Token::deferred(TokenKind::Paragraph, Span::new(0, 1), String::new());
        assert!(empty.children.is_empty());
    }

    #[test]
    fn test_plain_text_descends() {
        let token = Token::with_children(
            TokenKind::Paragraph,
            Span::new(0, 12),
            vec![
                Token::text("a ", Span::new(0, 2)),
                Token::with_children(
                    TokenKind::Strong,
                    Span::new(2, 7),
                    vec![Token::text("b", Span::new(0, 1))],
                ),
                Token::new(TokenKind::Code { code: "c".into() }, Span::new(7, 10)),
            ],
        );
        assert_eq!(token.plain_text(), "a bc");
        assert_eq!(token.count(), 5);
    }

    #[test]
    fn test_coalesce_text_merges_touching_runs() {
        let tokens = vec![
            Token::text("[", Span::new(0, 1)),
            Token::text("x", Span::new(1, 2)),
            Token::new(TokenKind::LineBreak, Span::new(2, 5)),
            Token::text("y", Span::new(5, 6)),
        ];
        let merged = coalesce_text(tokens);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].as_text(), Some("[x"));
        assert_eq!(merged[0].span, Span::new(0, 2));
    }

    #[test]
    fn test_token_json_shape() {
        let token = Token::new(
            TokenKind::Heading {
                level: 2,
                setext: false,
            },
            Span::new(0, 5),
        );
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["type"], "heading");
        assert_eq!(json["level"], 2);
        assert_eq!(json["span"]["end"], 5);
        assert!(json.get("children").is_none());

        let back: Token = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }
}
