//! Link-reference side table
//!
//! Definitions (`[label]: url "title"`) are collected from the block token
//! tree after the block pass, so reference links may point forward.

use ahash::RandomState;
use hashbrown::HashMap;

use super::token::{Token, TokenKind};

/// Longest accepted reference label, in bytes
pub const MAX_LABEL_LEN: usize = 999;

/// Destination of a reference definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Link destination
    pub url: String,
    /// Optional link title
    pub title: Option<String>,
}

/// Label -> target table, keyed by normalized label
#[derive(Debug, Clone, Default)]
pub struct LinkReferences {
    map: HashMap<String, LinkTarget, RandomState>,
}

impl PartialEq for LinkReferences {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl LinkReferences {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; the first definition of a label wins
    ///
    /// Returns `false` if the label was already defined.
    pub fn insert(&mut self, label: &str, target: LinkTarget) -> bool {
        let key = normalize_label(label);
        if key.is_empty() || self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, target);
        true
    }

    /// Look up a label, matching case-insensitively with whitespace collapsed
    pub fn get(&self, label: &str) -> Option<&LinkTarget> {
        self.map.get(&normalize_label(label))
    }

    /// Check whether a label is defined
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no labels are defined
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Collect every `LinkDefinition` token in a block tree
    pub fn collect_from(tokens: &[Token]) -> Self {
        let mut refs = Self::new();
        for token in tokens {
            token.walk(&mut |t| {
                if let TokenKind::LinkDefinition { label, url, title } = &t.kind {
                    refs.insert(
                        label,
                        LinkTarget {
                            url: url.clone(),
                            title: title.clone(),
                        },
                    );
                }
            });
        }
        refs
    }
}

/// Normalize a reference label: trim, collapse internal whitespace, lowercase
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for word in label.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.to_lowercase()
}
