//! Integration tests for the built-in inline rules
//!
//! Inline content is checked through single-paragraph documents.

use std::time::{Duration, Instant};

use markdialect::{parse, Dialect, Span, Token, TokenKind};

fn inline_with(source: &str, dialect: &Dialect) -> Vec<Token> {
    let doc = parse(source, dialect).unwrap();
    assert_eq!(doc.tokens.len(), 1, "expected a single block for {:?}", source);
    doc.tokens[0].children.clone()
}

fn md(source: &str) -> Vec<Token> {
    inline_with(source, &Dialect::markdown())
}

fn gfm(source: &str) -> Vec<Token> {
    inline_with(source, &Dialect::gfm())
}

fn link(url: &str, span: Span, children: Vec<Token>) -> Token {
    Token::with_children(
        TokenKind::Link {
            url: url.to_string(),
            title: None,
        },
        span,
        children,
    )
}

// ============================================================================
// Escapes and code
// ============================================================================

#[test]
fn test_escapes_merge_into_text() {
    assert_eq!(
        md("\\*not em\\*"),
        vec![Token::text("*not em*", Span::new(0, 10))]
    );
}

#[test]
fn test_escapable_set_depends_on_dialect() {
    assert_eq!(md("\\~x"), vec![Token::text("\\~x", Span::new(0, 3))]);
    assert_eq!(gfm("\\~x"), vec![Token::text("~x", Span::new(0, 3))]);
}

#[test]
fn test_code_span_with_inner_backtick() {
    assert_eq!(
        md("`` a ` b ``"),
        vec![Token::new(
            TokenKind::Code {
                code: "a ` b".to_string()
            },
            Span::new(0, 11)
        )]
    );
}

#[test]
fn test_code_span_hides_emphasis() {
    let tokens = md("`*x*` *y*");
    assert!(matches!(&tokens[0].kind, TokenKind::Code { code } if code == "*x*"));
    assert_eq!(tokens[2].kind, TokenKind::Emphasis);
}

#[test]
fn test_hard_line_break() {
    assert_eq!(
        md("a  \nb"),
        vec![
            Token::text("a", Span::new(0, 1)),
            Token::new(TokenKind::LineBreak, Span::new(1, 4)),
            Token::text("b", Span::new(4, 5)),
        ]
    );
    assert_eq!(md("a\\\nb")[1].kind, TokenKind::LineBreak);
    assert_eq!(md("a\nb"), vec![Token::text("a\nb", Span::new(0, 3))]);
}

// ============================================================================
// HTML and autolinks
// ============================================================================

#[test]
fn test_inline_html() {
    let tokens = md("a <span class=\"x\">b</span>");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.name()).collect();
    assert_eq!(kinds, vec!["text", "html", "text", "html"]);
    assert_eq!(
        tokens[1].kind,
        TokenKind::Html {
            html: "<span class=\"x\">".to_string()
        }
    );
}

#[test]
fn test_autolinks() {
    assert_eq!(
        md("see <https://x.io>"),
        vec![
            Token::text("see ", Span::new(0, 4)),
            link(
                "https://x.io",
                Span::new(4, 18),
                vec![Token::text("https://x.io", Span::new(0, 12))]
            ),
        ]
    );

    let tokens = md("mail <me@x.org>");
    assert_eq!(
        tokens[1],
        link(
            "mailto:me@x.org",
            Span::new(5, 15),
            vec![Token::text("me@x.org", Span::new(0, 8))]
        )
    );
}

#[test]
fn test_bare_urls_in_gfm() {
    assert_eq!(
        gfm("visit https://example.com/a_(b)."),
        vec![
            Token::text("visit ", Span::new(0, 6)),
            link(
                "https://example.com/a_(b)",
                Span::new(6, 31),
                vec![Token::text("https://example.com/a_(b)", Span::new(0, 25))]
            ),
            Token::text(".", Span::new(31, 32)),
        ]
    );
    assert_eq!(md("visit https://x.io").len(), 1);
}

// ============================================================================
// Links and images
// ============================================================================

#[test]
fn test_inline_link_with_title() {
    let tokens = md("[a *b*](/u \"t\")");
    assert_eq!(tokens.len(), 1);
    assert_eq!(
        tokens[0].kind,
        TokenKind::Link {
            url: "/u".to_string(),
            title: Some("t".to_string())
        }
    );
    assert_eq!(tokens[0].children[0], Token::text("a ", Span::new(0, 2)));
    assert_eq!(tokens[0].children[1].kind, TokenKind::Emphasis);
}

#[test]
fn test_image() {
    assert_eq!(
        md("![alt *x*](/i.png)"),
        vec![Token::new(
            TokenKind::Image {
                url: "/i.png".to_string(),
                title: None,
                alt: "alt *x*".to_string(),
            },
            Span::new(0, 18)
        )]
    );
}

#[test]
fn test_links_do_not_nest() {
    let tokens = md("[a [b](/x)](/y)");
    assert_eq!(tokens.len(), 1);
    assert_eq!(
        tokens[0],
        link("/y", Span::new(0, 15), vec![Token::text("a [b](/x)", Span::new(0, 9))])
    );
}

#[test]
fn test_reference_links() {
    let doc = parse(
        "[x][Ref] and [ref][] and [REF]\n\n[ref]: /r",
        &Dialect::markdown(),
    )
    .unwrap();
    let tokens = &doc.tokens[0].children;

    let urls: Vec<_> = tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::Link { url, .. } => Some(url.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(urls, vec!["/r", "/r", "/r"]);
    assert_eq!(tokens[0].plain_text(), "x");
    assert_eq!(tokens[2].plain_text(), "ref");
}

#[test]
fn test_unresolved_reference_is_text() {
    assert_eq!(md("[nope] [x][nope]"), vec![Token::text("[nope] [x][nope]", Span::new(0, 16))]);
}

#[test]
fn test_unclosed_bracket_is_text() {
    assert_eq!(md("[a](/b"), vec![Token::text("[a](/b", Span::new(0, 6))]);
}

// ============================================================================
// Emphasis
// ============================================================================

#[test]
fn test_nested_emphasis() {
    let tokens = md("*a **b** c*");
    assert_eq!(tokens.len(), 1);
    let em = &tokens[0];
    assert_eq!(em.kind, TokenKind::Emphasis);
    let kinds: Vec<_> = em.children.iter().map(|t| t.kind.name()).collect();
    assert_eq!(kinds, vec!["text", "strong", "text"]);
    assert_eq!(em.children[1].span, Span::new(2, 7));
}

#[test]
fn test_underscore_inside_word_is_text() {
    assert_eq!(
        md("snake_case_name"),
        vec![Token::text("snake_case_name", Span::new(0, 15))]
    );
    assert_eq!(md("__bold__")[0].kind, TokenKind::Strong);
}

#[test]
fn test_whitespace_after_opener_is_text() {
    assert_eq!(md("a * not* b"), vec![Token::text("a * not* b", Span::new(0, 10))]);
}

#[test]
fn test_strikethrough_is_gfm_only() {
    assert_eq!(gfm("~~gone~~")[0].kind, TokenKind::Strikethrough);
    assert_eq!(md("~~gone~~"), vec![Token::text("~~gone~~", Span::new(0, 8))]);
}

// ============================================================================
// Unclosed openers
// ============================================================================

#[test]
fn test_unclosed_openers_parse_in_linear_time() {
    let cases = [
        "[".repeat(40_000),
        "![".repeat(20_000),
        "*a ".repeat(13_334),
        "_a ".repeat(13_334),
        "**a ".repeat(10_000),
        "~~a ".repeat(10_000),
        "[a](b (".repeat(6_000),
        "[a](((".repeat(7_000),
        format!("a {}", "<!--".repeat(10_000)),
    ];

    for source in &cases {
        let start = Instant::now();
        let tokens = gfm(source);
        let elapsed = start.elapsed();

        assert!(
            elapsed < Duration::from_secs(1),
            "{:?}... took {:?}",
            &source[..8],
            elapsed
        );
        assert_eq!(
            tokens,
            vec![Token::text(source.trim_end(), Span::new(0, source.trim_end().len()))],
            "{:?}... should stay text",
            &source[..8]
        );
    }
}

#[test]
fn test_inner_brackets_do_not_hide_the_outer_link() {
    let tokens = md("[a [b] c](/u) [d]");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].span, Span::new(0, 13));
    assert_eq!(tokens[0].plain_text(), "a [b] c");
    assert_eq!(tokens[1], Token::text(" [d]", Span::new(13, 17)));
}

#[test]
fn test_closed_spans_after_unclosed_opener() {
    let tokens = md("[x `]` [d](/e) *f*");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.name()).collect();
    assert_eq!(kinds, vec!["text", "code", "text", "link", "text", "emphasis"]);
    assert_eq!(tokens[0], Token::text("[x ", Span::new(0, 3)));
    assert_eq!(tokens[3].span, Span::new(7, 14));
    assert_eq!(tokens[5].span, Span::new(15, 18));
}
