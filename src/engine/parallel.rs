//! Batch parsing
//!
//! Documents are independent, so a batch can be spread over a thread pool.
//! With the `parallel` feature the batch runs on rayon's pool; without it
//! the same functions parse sequentially.
//!
//! # Example
//!
//! ```
//! use markdialect::{Dialect, parse_batch_parallel};
//!
//! let dialect = Dialect::gfm();
//! let results = parse_batch_parallel(&dialect, &["# One", "two", "- three"]);
//!
//! // Results are in the same order as inputs
//! assert_eq!(results.len(), 3);
//! assert!(results.iter().all(|r| r.is_ok()));
//! ```

use super::dialect::Dialect;
use super::error::EngineError;
use super::parser::{Parser, ParserConfig};
use super::token::Document;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parse multiple inputs with the default configuration
pub fn parse_batch_parallel(
    dialect: &Dialect,
    inputs: &[&str],
) -> Vec<Result<Document, EngineError>> {
    parse_batch_with_config(dialect, ParserConfig::default(), inputs)
}

/// Parse multiple inputs, each with `config`
#[cfg(feature = "rayon")]
pub fn parse_batch_with_config(
    dialect: &Dialect,
    config: ParserConfig,
    inputs: &[&str],
) -> Vec<Result<Document, EngineError>> {
    let parser = Parser::with_config(dialect, config);
    inputs.par_iter().map(|input| parser.parse(input)).collect()
}

/// Parse multiple inputs sequentially (fallback when rayon is not available)
#[cfg(not(feature = "rayon"))]
pub fn parse_batch_with_config(
    dialect: &Dialect,
    config: ParserConfig,
    inputs: &[&str],
) -> Vec<Result<Document, EngineError>> {
    let parser = Parser::with_config(dialect, config);
    inputs.iter().map(|input| parser.parse(input)).collect()
}

/// Parse multiple owned inputs in parallel
#[cfg(feature = "rayon")]
pub fn parse_batch_parallel_owned(
    dialect: &Dialect,
    inputs: Vec<String>,
) -> Vec<Result<Document, EngineError>> {
    let parser = Parser::new(dialect);
    inputs
        .into_par_iter()
        .map(|input| parser.parse(&input))
        .collect()
}

/// Parse multiple owned inputs sequentially (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parse_batch_parallel_owned(
    dialect: &Dialect,
    inputs: Vec<String>,
) -> Vec<Result<Document, EngineError>> {
    let parser = Parser::new(dialect);
    inputs.into_iter().map(|input| parser.parse(&input)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::token::TokenKind;

    #[test]
    fn test_parse_batch_keeps_order() {
        let dialect = Dialect::markdown();
        let inputs = vec!["# heading", "> quote", "plain"];
        let results = parse_batch_parallel(&dialect, &inputs);

        assert_eq!(results.len(), 3);
        let kinds: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().tokens[0].kind.name())
            .collect();
        assert_eq!(kinds, vec!["heading", "blockquote", "paragraph"]);
    }

    #[test]
    fn test_parse_batch_with_failures() {
        let dialect = Dialect::markdown();
        let config = ParserConfig::new().with_max_input_size(8);
        let inputs = vec!["short", "much too long for the limit", "ok"];
        let results = parse_batch_with_config(&dialect, config, &inputs);

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(EngineError::InputTooLarge { max_size: 8, .. })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_parse_batch_owned() {
        let dialect = Dialect::gfm();
        let inputs = vec!["~~gone~~".to_string(), "```\ncode\n```".to_string()];
        let results = parse_batch_parallel_owned(&dialect, inputs);

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert!(matches!(
            first.tokens[0].children[0].kind,
            TokenKind::Strikethrough
        ));
        let second = results[1].as_ref().unwrap();
        assert!(matches!(second.tokens[0].kind, TokenKind::FencedCode { .. }));
    }
}
