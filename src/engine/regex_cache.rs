//! Thread-local regex cache for rule patterns
//!
//! Rules are stateless and shared across threads, so they cannot own a
//! compiled `Regex` lazily. Instead they look their pattern up here; each
//! thread compiles a pattern once and reuses it for every later match.

use hashbrown::HashMap;
use regex::Regex;
use std::cell::RefCell;

thread_local! {
    static REGEX_CACHE: RefCell<HashMap<&'static str, Regex>> = RefCell::new(HashMap::new());
}

/// Get or compile a rule pattern
///
/// Returns `None` if the pattern does not compile; rules treat that as
/// "no match" so a bad pattern degrades to plain text.
#[inline]
pub fn get_or_compile(pattern: &'static str) -> Option<Regex> {
    with_regex(pattern, Regex::clone)
}

/// Run `f` on the cached regex for `pattern`, compiling it on first use
///
/// The regex is borrowed from the cache rather than cloned, so its search
/// scratch space is reused between calls on the same thread.
pub fn with_regex<R>(pattern: &'static str, f: impl FnOnce(&Regex) -> R) -> Option<R> {
    REGEX_CACHE.with(|cache| {
        if let Some(regex) = cache.borrow().get(pattern) {
            return Some(f(regex));
        }

        match Regex::new(pattern) {
            Ok(regex) => {
                let out = f(&regex);
                cache.borrow_mut().insert(pattern, regex);
                Some(out)
            }
            Err(_) => {
                log_debug!("rule pattern failed to compile: {}", pattern);
                None
            }
        }
    })
}

/// Match an anchored pattern at `pos`, returning the captures
///
/// Patterns passed here must start with `^`; matching runs against
/// `input[pos..]`, so the anchor pins the match to `pos`.
pub fn captures_at<'t>(
    pattern: &'static str,
    input: &'t str,
    pos: usize,
) -> Option<regex::Captures<'t>> {
    let haystack = input.get(pos..)?;
    with_regex(pattern, |regex| regex.captures(haystack))?
}

/// Clear the regex cache of the current thread
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of patterns cached on the current thread
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_compilation() {
        clear_cache();

        assert!(get_or_compile("^[0-9]+").is_some());
        assert_eq!(cache_size(), 1);

        assert!(get_or_compile("^[0-9]+").is_some());
        assert_eq!(cache_size(), 1);

        assert!(get_or_compile("^[a-z]+").is_some());
        assert_eq!(cache_size(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        clear_cache();
        assert!(get_or_compile("[invalid").is_none());
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn test_with_regex_compiles_once() {
        clear_cache();
        assert_eq!(with_regex("^a+", |r| r.is_match("aaa")), Some(true));
        assert_eq!(with_regex("^a+", |r| r.is_match("b")), Some(false));
        assert_eq!(cache_size(), 1);
        assert_eq!(with_regex("(", |r| r.is_match("(")), None);
    }

    #[test]
    fn test_captures_at_is_anchored_to_pos() {
        let input = "ab 123 cd";
        let caps = captures_at(r"^([0-9]+)", input, 3).unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "123");
        assert!(captures_at(r"^([0-9]+)", input, 0).is_none());
        assert!(captures_at(r"^x", input, 99).is_none());
    }
}
