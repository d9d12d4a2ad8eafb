//! Key pattern validation and matching.
//!
//! A pattern is either a literal key or a literal followed by one trailing
//! `*`. No other wildcards and no escape syntax: `*`, `?`, `[`, `]` and `\`
//! are rejected inside the literal part so that the same pattern means the
//! same thing to the Redis `MATCH` glob and to the in-process prefix
//! matcher.

use crate::error::{Error, Result};

/// Characters that are glob-active in Redis and therefore banned from the
/// literal part of a pattern. `\` is Redis's glob escape: letting it
/// through would make `MATCH` drop it while the prefix matcher keeps it.
const GLOB_CHARS: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Validate a pattern before it reaches any store.
///
/// Rejects the empty pattern, embedded wildcards, and unsupported glob
/// characters. A bare `*` is accepted here; callers that must not allow a
/// full wipe (pattern invalidation) apply that restriction themselves.
pub fn validate(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(Error::invalid_pattern("pattern must not be empty"));
    }
    let literal = pattern.strip_suffix('*').unwrap_or(pattern);
    if let Some(bad) = literal.chars().find(|c| GLOB_CHARS.contains(c)) {
        return Err(Error::invalid_pattern(format!(
            "unsupported character '{bad}' in pattern '{pattern}': only one trailing '*' is allowed"
        )));
    }
    Ok(())
}

/// True when `key` matches a validated pattern.
///
/// Trailing `*` matches by prefix; a plain literal matches exactly one key.
pub fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_literal_and_trailing_wildcard() {
        assert!(validate("balance:abc").is_ok());
        assert!(validate("balance:*").is_ok());
        assert!(validate("balance*").is_ok());
        assert!(validate("*").is_ok());
    }

    #[test]
    fn test_rejects_empty_and_embedded_wildcards() {
        assert!(validate("").is_err());
        assert!(validate("bal*ance").is_err());
        assert!(validate("**").is_err());
        assert!(validate("balance:?").is_err());
        assert!(validate("balance:[ab]*").is_err());
    }

    #[test]
    fn test_rejects_glob_escape_character() {
        // Redis MATCH would swallow the escape and match 'ab:*'; the prefix
        // matcher would look for a literal backslash. Neither meaning wins.
        assert!(validate("a\\b:*").is_err());
        assert!(validate("balance\\*").is_err());
        assert!(validate("\\").is_err());
    }

    #[test]
    fn test_wildcard_matches_by_prefix() {
        assert!(key_matches("balance:*", "balance:a"));
        assert!(key_matches("balance:*", "balance:"));
        assert!(!key_matches("balance:*", "validator:x"));
        assert!(key_matches("*", "anything"));
    }

    #[test]
    fn test_literal_matches_exactly() {
        assert!(key_matches("balance:a", "balance:a"));
        assert!(!key_matches("balance:a", "balance:ab"));
        assert!(!key_matches("balance", "balance:a"));
    }
}
