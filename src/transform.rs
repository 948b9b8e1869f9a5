//! # Operator Transforms
//!
//! Value-level transforms applied to a parameter before it is bound. The
//! wildcard operators turn `null` or blank input into `null`, so a template can
//! drop an optional `LIKE` predicate when the caller passed an empty filter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operator applied to a declared parameter value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Identity
    #[default]
    #[serde(alias = "DEFAULT")]
    Equal,
    /// `%value%`
    Containing,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
}

impl Operator {
    pub fn transform(self, value: Value) -> Value {
        match self {
            Operator::Equal => value,
            Operator::Containing => wrap_non_blank(value, "%", "%"),
            Operator::StartsWith => wrap_non_blank(value, "", "%"),
            Operator::EndsWith => wrap_non_blank(value, "%", ""),
        }
    }
}

/// Text of a value as a template sees it: string contents, or the JSON rendering
pub(crate) fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn wrap_non_blank(value: Value, prefix: &str, suffix: &str) -> Value {
    match stringify(&value) {
        Some(text) if !text.trim().is_empty() => Value::String(format!("{prefix}{text}{suffix}")),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wildcards() {
        assert_eq!(Operator::Containing.transform(json!("al")), json!("%al%"));
        assert_eq!(Operator::StartsWith.transform(json!("al")), json!("al%"));
        assert_eq!(Operator::EndsWith.transform(json!("al")), json!("%al"));
    }

    #[test]
    fn test_blank_becomes_null() {
        for op in [Operator::Containing, Operator::StartsWith, Operator::EndsWith] {
            assert_eq!(op.transform(Value::Null), Value::Null);
            assert_eq!(op.transform(json!("")), Value::Null);
            assert_eq!(op.transform(json!("   ")), Value::Null);
        }
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        assert_eq!(Operator::Containing.transform(json!(42)), json!("%42%"));
        assert_eq!(Operator::Equal.transform(json!(42)), json!(42));
    }

    #[test]
    fn test_deserialize_legacy_default_name() {
        let op: Operator = serde_json::from_value(json!("DEFAULT")).unwrap();
        assert_eq!(op, Operator::Equal);
        let op: Operator = serde_json::from_value(json!("STARTS_WITH")).unwrap();
        assert_eq!(op, Operator::StartsWith);
    }
}
