//! Developer tools
//!
//! - [`TreePrinter`]: indented dump of a token tree
//! - [`SourceFormatter`]: a source line with a caret under an offset, for
//!   error reports

use super::token::{Document, Token, TokenKind};
use std::fmt::Write;

/// Token tree pretty printer
///
/// ```
/// use markdialect::{parse, Dialect, TreePrinter};
///
/// let doc = parse("*hi*", &Dialect::markdown()).unwrap();
/// let out = TreePrinter::new().print(&doc);
/// assert!(out.starts_with("paragraph 0..4\n  emphasis 0..4\n"));
/// ```
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Print a whole document
    pub fn print(&self, doc: &Document) -> String {
        self.print_tokens(&doc.tokens)
    }

    /// Print a list of sibling tokens
    pub fn print_tokens(&self, tokens: &[Token]) -> String {
        let mut output = String::new();
        for token in tokens {
            self.print_token(token, 0, &mut output);
        }
        output
    }

    fn print_token(&self, token: &Token, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if self.max_depth.is_some_and(|max| depth > max) {
            let _ = writeln!(output, "{}...", indent);
            return;
        }

        let _ = write!(output, "{}{}", indent, token.kind.name());
        let attrs = attributes(&token.kind);
        if !attrs.is_empty() {
            let _ = write!(output, " {}", attrs);
        }
        let _ = writeln!(output, " {}", token.span);

        for child in &token.children {
            self.print_token(child, depth + 1, output);
        }
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind-specific attributes as `key=value` pairs
fn attributes(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Heading { level, setext } => format!("level={} setext={}", level, setext),
        TokenKind::CodeBlock { text } => format!("text={:?}", text),
        TokenKind::FencedCode { lang, text, .. } => match lang {
            Some(lang) => format!("lang={} text={:?}", lang, text),
            None => format!("text={:?}", text),
        },
        TokenKind::List {
            ordered,
            start,
            loose,
        } => match start {
            Some(start) => format!("ordered={} start={} loose={}", ordered, start, loose),
            None => format!("ordered={} loose={}", ordered, loose),
        },
        TokenKind::ListItem { index } => format!("index={}", index),
        TokenKind::Table { alignments } => format!("columns={}", alignments.len()),
        TokenKind::TableRow { header } => format!("header={}", header),
        TokenKind::TableCell { alignment } => format!("align={:?}", alignment).to_lowercase(),
        TokenKind::HtmlBlock { html } | TokenKind::Html { html } => format!("{:?}", html),
        TokenKind::LinkDefinition { label, url, .. } => format!("[{}] -> {}", label, url),
        TokenKind::Text { text } => format!("{:?}", text),
        TokenKind::Link { url, .. } => format!("-> {}", url),
        TokenKind::Image { url, alt, .. } => format!("{:?} -> {}", alt, url),
        TokenKind::Code { code } => format!("{:?}", code),
        _ => String::new(),
    }
}

/// Source code formatter for showing parse context
pub struct SourceFormatter;

impl SourceFormatter {
    /// Format the line holding `offset`, with `context_lines` lines around
    /// it and a caret under the offset
    pub fn format_line(input: &str, offset: usize, context_lines: usize) -> String {
        let mut output = String::new();

        let mut lines: Vec<(usize, usize)> = Vec::new();
        let mut line_start = 0;
        for at in memchr::memchr_iter(b'\n', input.as_bytes()) {
            lines.push((line_start, at));
            line_start = at + 1;
        }
        lines.push((line_start, input.len()));

        let current_line = lines
            .iter()
            .position(|&(start, end)| offset >= start && offset <= end)
            .unwrap_or(lines.len() - 1);

        let first = current_line.saturating_sub(context_lines);
        let last = (current_line + context_lines + 1).min(lines.len());

        for (i, &(start, end)) in lines.iter().enumerate().take(last).skip(first) {
            let _ = writeln!(output, "{:4} | {}", i + 1, &input[start..end]);

            if i == current_line {
                let column = input
                    .get(start..offset.min(end))
                    .map_or(0, |prefix| prefix.chars().count());
                let _ = writeln!(output, "     | {}^", " ".repeat(column));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dialect::Dialect;
    use crate::engine::parser::parse;

    #[test]
    fn test_tree_printer() {
        let doc = parse("# Title\n\n- a\n- b", &Dialect::markdown()).unwrap();
        let output = TreePrinter::new().print(&doc);

        assert!(output.starts_with("heading level=1 setext=false 0.."));
        assert!(output.contains("  text \"Title\" 0..5"));
        assert!(output.contains("list ordered=false loose=false"));
        assert!(output.contains("  list_item index=1"));
    }

    #[test]
    fn test_tree_printer_max_depth() {
        let doc = parse("> > deep", &Dialect::markdown()).unwrap();
        let output = TreePrinter::new().indent("->").max_depth(1).print(&doc);

        assert!(output.starts_with("blockquote 0..8\n->blockquote"));
        assert!(output.contains("->->..."));
        assert!(!output.contains("paragraph"));
    }

    #[test]
    fn test_source_formatter() {
        let input = "line one\nline two\nline three";
        let formatted = SourceFormatter::format_line(input, 14, 1);

        assert!(formatted.contains("   1 | line one"));
        assert!(formatted.contains("   2 | line two\n     |      ^\n"));
        assert!(formatted.contains("   3 | line three"));
    }

    #[test]
    fn test_source_formatter_past_end() {
        let formatted = SourceFormatter::format_line("abc", 99, 0);
        assert_eq!(formatted, "   1 | abc\n     |    ^\n");
    }
}
