//! Integration tests for engine-level guarantees
//!
//! These tests cover:
//! - The documented end-to-end scenarios
//! - Span tiling of top-level blocks and of nested scopes
//! - Nesting limits degrading to text
//! - Defective rules aborting the parse

use markdialect::engine::Pass;
use markdialect::prelude::*;
use markdialect::rules::names;

fn walk_depth(token: &Token, kind: &str) -> usize {
    if token.kind.name() != kind {
        return 0;
    }
    1 + token
        .children
        .iter()
        .map(|c| walk_depth(c, kind))
        .max()
        .unwrap_or(0)
}

fn innermost(mut token: &Token) -> &Token {
    while let Some(child) = token.children.first() {
        if !matches!(child.kind, TokenKind::Blockquote) {
            break;
        }
        token = child;
    }
    token
}

fn assert_tiles(tokens: &[Token], len: usize) {
    let mut pos = 0;
    for token in tokens {
        assert_eq!(token.span.start, pos, "gap or overlap before {:?}", token.kind);
        pos = token.span.end;
    }
    assert_eq!(pos, len);
}

/// Check that every nested scope is covered by its children
///
/// List items share the list's coordinates. Every other scope restarts at
/// zero: block bodies are at most as long as the container span, and inline
/// span content is the span minus its delimiters.
fn assert_nested_tiles(token: &Token) {
    let Some(last) = token.children.last() else {
        return;
    };
    match &token.kind {
        TokenKind::List { .. } => {
            let mut pos = token.span.start;
            for item in &token.children {
                assert_eq!(item.span.start, pos, "gap or overlap before {:?}", item.kind);
                pos = item.span.end;
            }
            assert_eq!(pos, token.span.end);
        }
        TokenKind::Emphasis => assert_tiles(&token.children, token.span.len() - 2),
        TokenKind::Strong | TokenKind::Strikethrough => {
            assert_tiles(&token.children, token.span.len() - 4)
        }
        kind => {
            assert_tiles(&token.children, last.span.end);
            assert!(
                last.span.end <= token.span.len(),
                "{:?} children run past its body",
                kind
            );
        }
    }
    for child in &token.children {
        assert_nested_tiles(child);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_heading_and_paragraph() {
    let doc = parse("# Title\n\nBody text.", &Dialect::markdown()).unwrap();
    let blocks: Vec<&Token> = doc.blocks().collect();

    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0].kind,
        TokenKind::Heading {
            level: 1,
            setext: false
        }
    );
    assert_eq!(blocks[0].children, vec![Token::text("Title", Span::new(0, 5))]);
    assert_eq!(blocks[1].kind, TokenKind::Paragraph);
    assert_eq!(
        blocks[1].children,
        vec![Token::text("Body text.", Span::new(0, 10))]
    );
}

#[test]
fn test_emphasis_and_strong() {
    let doc = parse("*em* and **strong**", &Dialect::markdown()).unwrap();
    let inline = &doc.tokens[0].children;

    assert_eq!(
        inline,
        &vec![
            Token::with_children(
                TokenKind::Emphasis,
                Span::new(0, 4),
                vec![Token::text("em", Span::new(0, 2))]
            ),
            Token::text(" and ", Span::new(4, 9)),
            Token::with_children(
                TokenKind::Strong,
                Span::new(9, 19),
                vec![Token::text("strong", Span::new(0, 6))]
            ),
        ]
    );
}

#[test]
fn test_unterminated_code_span_is_text() {
    let doc = parse("`code", &Dialect::markdown()).unwrap();
    assert_eq!(
        doc.tokens[0].children,
        vec![Token::text("`code", Span::new(0, 5))]
    );
}

#[test]
fn test_reference_definition_resolves() {
    let source = "[ref]: http://example.com \"Title\"\n\n[ref]";
    let doc = parse(source, &Dialect::markdown()).unwrap();

    let target = doc.references.get("ref").unwrap();
    assert_eq!(target.url, "http://example.com");
    assert_eq!(target.title.as_deref(), Some("Title"));

    let para = doc.blocks().last().unwrap();
    assert_eq!(para.kind, TokenKind::Paragraph);
    assert_eq!(
        para.children,
        vec![Token::with_children(
            TokenKind::Link {
                url: "http://example.com".to_string(),
                title: Some("Title".to_string()),
            },
            Span::new(0, 5),
            vec![Token::text("ref", Span::new(0, 3))]
        )]
    );
}

#[test]
fn test_forward_reference_resolves() {
    let doc = parse("see [docs]\n\n[docs]: /manual", &Dialect::gfm()).unwrap();
    let link = &doc.tokens[0].children[1];
    assert!(matches!(&link.kind, TokenKind::Link { url, .. } if url == "/manual"));
}

#[test]
fn test_deep_blockquote_flattens() {
    let source = format!("{} deep", ">".repeat(10_000));
    let doc = parse(&source, &Dialect::markdown()).unwrap();

    assert_eq!(doc.tokens.len(), 1);
    assert_eq!(walk_depth(&doc.tokens[0], "blockquote"), 32);

    let last = innermost(&doc.tokens[0]);
    let para = &last.children[0];
    assert_eq!(para.kind, TokenKind::Paragraph);
    let text = para.plain_text();
    assert!(text.starts_with(">>>"));
    assert!(text.ends_with(" deep"));
    assert_eq!(text.len(), 10_000 - 32 + " deep".len());
}

#[test]
fn test_nesting_limit_is_configurable() {
    let dialect = Dialect::markdown();
    let config = ParserConfig::new().with_max_nesting_depth(3);
    let doc = Parser::with_config(&dialect, config)
        .parse("> > > > > x")
        .unwrap();

    assert_eq!(walk_depth(&doc.tokens[0], "blockquote"), 3);
    assert_eq!(innermost(&doc.tokens[0]).plain_text(), "> > x");
}

#[test]
fn test_deep_lists_flatten() {
    let source: String = (0..100)
        .map(|depth| format!("{}- item\n", "  ".repeat(depth)))
        .collect();
    let dialect = Dialect::markdown();
    let config = ParserConfig::new().with_max_nesting_depth(4);
    let doc = Parser::with_config(&dialect, config).parse(&source).unwrap();

    let mut lists = 0;
    doc.walk(|t| {
        if matches!(t.kind, TokenKind::List { .. }) {
            lists += 1;
        }
    });
    assert_eq!(lists, 4);
}

#[test]
fn test_inline_nesting_limit() {
    let dialect = Dialect::markdown();
    let config = ParserConfig::new().with_max_inline_depth(1);
    let doc = Parser::with_config(&dialect, config)
        .parse("**a *b* c**")
        .unwrap();

    let strong = &doc.tokens[0].children[0];
    assert_eq!(strong.kind, TokenKind::Strong);
    assert_eq!(
        strong.children,
        vec![Token::text("a *b* c", Span::new(0, 7))]
    );
}

// ============================================================================
// Coverage and determinism
// ============================================================================

#[test]
fn test_top_level_spans_tile_source() {
    let source = "# Title\n\n> quote\n> more\n\n- a\n- b\n\n    code\n\n---\n\
                  <div>\nraw\n</div>\n\n[x]: /url\n\ntext *with* [x]\n";
    for dialect in [Dialect::markdown(), Dialect::gfm()] {
        let doc = parse(source, &dialect).unwrap();
        assert_tiles(&doc.tokens, source.len());
    }
}

#[test]
fn test_inline_spans_tile_content() {
    let source = "a \\* b `c` <b>d</b> [e](/f) ~~g~~ https://h.io  \nend";
    let doc = parse(source, &Dialect::gfm()).unwrap();
    let para = &doc.tokens[0];
    assert_tiles(&para.children, source.len());
}

#[test]
fn test_nested_scopes_tile_their_content() {
    let source = "> quote *em* and **strong**\n> - item ~~s~~ [l *i*](/u)\n> - two\n\n\
                  - a __b__\n  > c *d*\n\n  more\n- <x@y.io> ~~*z*~~\n";
    let doc = parse(source, &Dialect::gfm()).unwrap();
    assert_tiles(&doc.tokens, source.len());

    let mut kinds = Vec::new();
    doc.walk(|t| kinds.push(t.kind.name()));
    for kind in ["blockquote", "list_item", "emphasis", "strong", "strikethrough", "link"] {
        assert!(kinds.contains(&kind), "no {} in {:?}", kind, kinds);
    }
    for token in &doc.tokens {
        assert_nested_tiles(token);
    }
}

#[test]
fn test_container_bodies_tile_exactly() {
    // quote body "a *b*\nc"
    let doc = parse("> a *b*\n> c", &Dialect::markdown()).unwrap();
    let quote = &doc.tokens[0];
    assert_eq!(quote.kind, TokenKind::Blockquote);
    assert_tiles(&quote.children, 7);
    assert_tiles(&quote.children[0].children, 7);

    // item body "x\ny"
    let doc = parse("- x\n  y", &Dialect::markdown()).unwrap();
    let item = &doc.tokens[0].children[0];
    assert_eq!(item.kind, TokenKind::ListItem { index: 0 });
    assert_tiles(&item.children, 3);
    assert_tiles(&item.children[0].children, 3);
}

#[test]
fn test_parse_is_deterministic() {
    let source = "Title\n=====\n\n1. one\n2. *two*\n\n| a |\n|---|\n| b |\n";
    let dialect = Dialect::gfm();
    assert_eq!(parse(source, &dialect).unwrap(), parse(source, &dialect).unwrap());
}

#[test]
fn test_plain_prose_is_one_paragraph() {
    let doc = parse("just some words", &Dialect::gfm()).unwrap();
    assert_eq!(doc.tokens.len(), 1);
    assert_eq!(doc.tokens[0].kind, TokenKind::Paragraph);
    assert_eq!(
        doc.tokens[0].children,
        vec![Token::text("just some words", Span::new(0, 15))]
    );
}

#[test]
fn test_empty_input() {
    let doc = parse("", &Dialect::markdown()).unwrap();
    assert!(doc.tokens.is_empty());
    assert_eq!(doc.token_count(), 0);
}

// ============================================================================
// Defective rules
// ============================================================================

struct Stuck;

impl Rule<BlockContext> for Stuck {
    fn name(&self) -> &str {
        "stuck"
    }

    fn try_match(&self, _input: &str, pos: usize, _cx: &BlockContext) -> Option<Match> {
        Some(Match::new(pos, pos))
    }

    fn apply(&self, _m: &Match, _input: &str, _cx: &BlockContext) -> Result<Applied, EngineError> {
        Ok(Applied::new(Vec::new(), 0))
    }
}

#[test]
fn test_zero_consumption_aborts() {
    let dialect = Dialect::markdown()
        .to_builder()
        .block_before(names::PARAGRAPH, Stuck)
        .build()
        .unwrap();

    let err = parse("hello", &dialect).unwrap_err();
    assert_eq!(
        err,
        EngineError::EmptyMatch {
            pass: Pass::Block,
            rule: "stuck".to_string(),
            position: 0,
        }
    );
    assert!(err.to_string().contains("stuck"));
}

#[test]
fn test_input_size_limit() {
    let dialect = Dialect::markdown();
    let config = ParserConfig::new().with_max_input_size(4);
    let err = Parser::with_config(&dialect, config)
        .parse("too long")
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InputTooLarge {
            input_size: 8,
            max_size: 4
        }
    );

    let unlimited = ParserConfig::new().with_max_input_size(0);
    assert!(Parser::with_config(&dialect, unlimited).parse("too long").is_ok());
}
