//! TTL policy resolution.
//!
//! An immutable, ordered rule list built once at startup. Resolution walks
//! the rules most-specific-first and returns the first match, falling back
//! to the default TTL; it never fails and has no side effects.
//!
//! Matching semantics: a literal rule binds to an operation family, so
//! `balance` matches `balance:<digest>` (and the bare key `balance`) but not
//! `balances:<digest>`. A trailing-`*` rule matches by plain prefix. More
//! specific rules win: longer literal prefix first, literal before wildcard
//! at equal length, lexical order as the final tiebreak.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::pattern;

/// One compiled TTL rule.
///
/// `priority` is the rule's rank in the evaluation order (0 is checked
/// first); it is assigned during compilation, not supplied by hand.
#[derive(Debug, Clone)]
pub struct TtlRule {
    /// Validated pattern, literal or trailing-`*`
    pub pattern: String,
    /// Validity duration for matching keys
    pub ttl: Duration,
    /// Evaluation rank assigned at compile time
    pub priority: usize,
}

impl TtlRule {
    fn is_wildcard(&self) -> bool {
        self.pattern.ends_with('*')
    }

    fn literal_prefix(&self) -> &str {
        self.pattern.strip_suffix('*').unwrap_or(&self.pattern)
    }

    fn matches(&self, key: &str) -> bool {
        let prefix = self.literal_prefix();
        if self.is_wildcard() {
            key.starts_with(prefix)
        } else {
            key == prefix || (key.starts_with(prefix) && key[prefix.len()..].starts_with(':'))
        }
    }
}

/// Immutable TTL policy: ordered rules plus a default.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    rules: Vec<TtlRule>,
    default_ttl: Duration,
}

impl TtlPolicy {
    /// Compile a policy from `(pattern, ttl)` pairs.
    ///
    /// Validates every pattern, rejects duplicates, orders the rules
    /// most-specific-first and assigns priorities. Fails only on malformed
    /// configuration; a compiled policy cannot fail to resolve.
    pub fn new(rules: Vec<(String, Duration)>, default_ttl: Duration) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (rule_pattern, ttl) in rules {
            pattern::validate(&rule_pattern)?;
            if compiled
                .iter()
                .any(|r: &TtlRule| r.pattern == rule_pattern)
            {
                return Err(Error::configuration(format!(
                    "duplicate TTL rule pattern '{rule_pattern}'"
                )));
            }
            compiled.push(TtlRule {
                pattern: rule_pattern,
                ttl,
                priority: 0,
            });
        }

        compiled.sort_by(|a, b| {
            b.literal_prefix()
                .len()
                .cmp(&a.literal_prefix().len())
                .then(a.is_wildcard().cmp(&b.is_wildcard()))
                .then(a.pattern.cmp(&b.pattern))
        });
        for (rank, rule) in compiled.iter_mut().enumerate() {
            rule.priority = rank;
        }

        Ok(Self {
            rules: compiled,
            default_ttl,
        })
    }

    /// Policy with no rules; every key gets the default TTL.
    pub fn default_only(default_ttl: Duration) -> Self {
        Self {
            rules: Vec::new(),
            default_ttl,
        }
    }

    /// Resolve the TTL for a cache key. Pure; never fails.
    pub fn resolve(&self, key: &str) -> Duration {
        self.rules
            .iter()
            .find(|rule| rule.matches(key))
            .map_or(self.default_ttl, |rule| rule.ttl)
    }

    /// The compiled rules in evaluation order.
    pub fn rules(&self) -> &[TtlRule] {
        &self.rules
    }

    /// The fallback TTL applied when no rule matches.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Duration = Duration::from_secs(300);

    fn policy(rules: &[(&str, u64)]) -> TtlPolicy {
        TtlPolicy::new(
            rules
                .iter()
                .map(|(p, secs)| ((*p).to_string(), Duration::from_secs(*secs)))
                .collect(),
            DEFAULT,
        )
        .unwrap()
    }

    #[test]
    fn test_unmatched_keys_fall_back_to_default() {
        let policy = policy(&[("balance", 60)]);
        assert_eq!(policy.resolve("validator:abc"), DEFAULT);
    }

    #[test]
    fn test_literal_rule_binds_to_operation_family() {
        let policy = policy(&[("balance", 60)]);
        assert_eq!(policy.resolve("balance:abc"), Duration::from_secs(60));
        assert_eq!(policy.resolve("balance"), Duration::from_secs(60));
        assert_eq!(policy.resolve("balances:abc"), DEFAULT);
    }

    #[test]
    fn test_longest_literal_prefix_wins() {
        let policy = policy(&[("bal*", 10), ("balance:*", 20)]);
        assert_eq!(policy.resolve("balance:abc"), Duration::from_secs(20));
        assert_eq!(policy.resolve("ballot:abc"), Duration::from_secs(10));
    }

    #[test]
    fn test_literal_beats_wildcard_at_equal_length() {
        let policy = policy(&[("balance*", 10), ("balance", 20)]);
        assert_eq!(policy.resolve("balance:abc"), Duration::from_secs(20));
        // The wildcard still catches what the literal's family boundary excludes.
        assert_eq!(policy.resolve("balances:abc"), Duration::from_secs(10));
    }

    #[test]
    fn test_priorities_reflect_evaluation_order() {
        let policy = policy(&[("a*", 1), ("abc*", 2), ("ab*", 3)]);
        let order: Vec<&str> = policy.rules().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(order, vec!["abc*", "ab*", "a*"]);
        assert_eq!(
            policy.rules().iter().map(|r| r.priority).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_duplicate_patterns_are_rejected() {
        let result = TtlPolicy::new(
            vec![
                ("balance".to_string(), Duration::from_secs(1)),
                ("balance".to_string(), Duration::from_secs(2)),
            ],
            DEFAULT,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_patterns_are_rejected() {
        let result = TtlPolicy::new(
            vec![("bal*ance".to_string(), Duration::from_secs(1))],
            DEFAULT,
        );
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }
}
