//! Shared key classification for the complexity analyzer (C7) and the
//! filter transformer (C8): both need to tell a logical combinator from
//! a field, and a field's operator group from a relationship filter,
//! using the same case-insensitive, snake_case-tolerant vocabulary.

use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

/// Canonicalizes a key for vocabulary comparison: lowercase, no
/// underscores, so `NotIn`, `not_in`, and `NOTIN` all compare equal.
pub fn canon(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalKind {
    And,
    Or,
    Not,
}

/// Classifies `key` as a logical combinator, independent of position —
/// callers decide whether the current walk position even considers
/// logical keys (a key inside an already-established operator group is
/// never reclassified as logical).
pub fn logical_kind(key: &str) -> Option<LogicalKind> {
    match canon(key).as_str() {
        "and" => Some(LogicalKind::And),
        "or" => Some(LogicalKind::Or),
        "not" => Some(LogicalKind::Not),
        _ => None,
    }
}

const OPERATOR_KEYS: &[&str] = &[
    "eq",
    "not",
    "in",
    "notin",
    "lt",
    "lte",
    "gt",
    "gte",
    "contains",
    "startswith",
    "endswith",
    "between",
    "isnull",
];

const MODIFIER_KEYS: &[&str] = &["fold"];

pub fn is_operator_key(key: &str) -> bool {
    OPERATOR_KEYS.contains(&canon(key).as_str())
}

pub fn is_modifier_key(key: &str) -> bool {
    MODIFIER_KEYS.contains(&canon(key).as_str())
}

/// A sub-map is an *operator group* when it is non-empty and every
/// child key belongs to the recognized operator/modifier vocabulary.
/// Otherwise it's a relationship filter over a related entity.
pub fn is_operator_group(sub: &JsonMap<String, JsonValue>) -> bool {
    !sub.is_empty()
        && sub
            .keys()
            .all(|k| is_operator_key(k) || is_modifier_key(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canon_strips_case_and_underscores() {
        assert_eq!(canon("NotIn"), "notin");
        assert_eq!(canon("not_in"), "notin");
        assert_eq!(canon("NOT_IN"), "notin");
    }

    #[test]
    fn logical_keys_recognized_case_insensitively() {
        assert_eq!(logical_kind("And"), Some(LogicalKind::And));
        assert_eq!(logical_kind("OR"), Some(LogicalKind::Or));
        assert_eq!(logical_kind("not"), Some(LogicalKind::Not));
        assert_eq!(logical_kind("Name"), None);
    }

    #[test]
    fn operator_group_detects_pure_operator_maps() {
        let mut m = JsonMap::new();
        m.insert("Eq".into(), JsonValue::String("x".into()));
        m.insert("Contains".into(), JsonValue::String("y".into()));
        assert!(is_operator_group(&m));
    }

    #[test]
    fn relationship_detected_when_a_child_is_not_an_operator() {
        let mut m = JsonMap::new();
        m.insert("Name".into(), JsonValue::Object(JsonMap::new()));
        assert!(!is_operator_group(&m));
    }

    #[test]
    fn empty_map_is_not_an_operator_group() {
        assert!(!is_operator_group(&JsonMap::new()));
    }
}
