//! Deterministic cache key derivation.
//!
//! Parameters are canonicalized (fields sorted by name, values rendered in a
//! fixed textual form) and hashed, so logically identical calls map to the
//! same key regardless of argument ordering. The operation name stays in
//! clear text as the key prefix: `<operation>:<sha256 hex>`. That keeps keys
//! human-inspectable and lets TTL rules and invalidation patterns match on
//! the operation family without decoding the digest.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Separates a field name from its value in the canonical form.
/// Control characters cannot appear in a normal field name.
const FIELD_SEP: char = '\u{1f}';

/// Separates field pairs in the canonical form.
const PAIR_SEP: char = '\u{1e}';

/// Derive the cache key for an operation invocation.
pub fn derive(operation: &str, params: &Map<String, Value>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(params).as_bytes());
    format!("{operation}:{:x}", hasher.finalize())
}

/// Render parameters into the canonical pre-hash form.
fn canonicalize(params: &Map<String, Value>) -> String {
    let mut fields: Vec<(&String, &Value)> = params.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut canonical = String::new();
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            canonical.push(PAIR_SEP);
        }
        canonical.push_str(name);
        canonical.push(FIELD_SEP);
        render_value(value, &mut canonical);
    }
    canonical
}

/// Fixed textual rendering of a parameter value.
///
/// Strings are JSON-escaped so a string value can never imitate the
/// rendering of a composite value; nested objects render with sorted keys.
fn render_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => {
            let _ = write!(out, "{}", Value::String(s.clone()));
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                render_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut fields: Vec<(&String, &Value)> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(name);
                out.push(':');
                render_value(item, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = derive(
            "balance",
            &params(json!({"address": "a", "denom": "scrt"})),
        );
        let b = derive(
            "balance",
            &params(json!({"denom": "scrt", "address": "a"})),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_any_differing_value_changes_the_key() {
        let a = derive(
            "balance",
            &params(json!({"address": "a", "denom": "scrt"})),
        );
        let b = derive(
            "balance",
            &params(json!({"address": "b", "denom": "scrt"})),
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_is_operation_prefixed_hex_digest() {
        let key = derive("balance", &Map::new());
        let (prefix, digest) = key.split_once(':').unwrap();
        assert_eq!(prefix, "balance");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_operations_partition_the_key_space() {
        let p = params(json!({"q": 1}));
        assert_ne!(derive("balance", &p), derive("validator", &p));
    }

    #[test]
    fn test_value_types_are_distinguished() {
        let as_string = derive("op", &params(json!({"v": "1"})));
        let as_number = derive("op", &params(json!({"v": 1})));
        assert_ne!(as_string, as_number);
    }

    #[test]
    fn test_nested_objects_canonicalize_recursively() {
        let a = derive("op", &params(json!({"f": {"x": 1, "y": 2}})));
        let b = derive("op", &params(json!({"f": {"y": 2, "x": 1}})));
        assert_eq!(a, b);
    }

    #[test]
    fn test_a_string_cannot_imitate_a_composite() {
        let literal = derive("op", &params(json!({"v": "[1]"})));
        let array = derive("op", &params(json!({"v": [1]})));
        assert_ne!(literal, array);
    }
}
