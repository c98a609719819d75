//! Filter map utilities (C6): marshal a typed filter value into the
//! nested mapping, and prune empties so the invariants in the data
//! model (no nil values, no empty maps, no empty lists) hold.

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{RelayError, RelayResult};

/// A filter tree node: a JSON object keyed by logical/field/operator
/// names. `serde_json::Map` is BTreeMap-backed by default (without the
/// `preserve_order` feature), so iteration and serialization are
/// already in sorted key order.
pub type FilterMap = JsonMap<String, JsonValue>;

/// Marshals `v` to a `FilterMap` via `serde_json`, then prunes it.
///
/// Callers should derive `Serialize` on their filter struct with
/// `#[serde(rename_all = "PascalCase")]` (the "dedicated tag key [that]
/// forces struct-field names") and avoid `skip_serializing_if`, since
/// pruning — not struct-level elision — is what removes empties here.
pub fn to_map<V: Serialize>(v: &V) -> RelayResult<FilterMap> {
    let value = serde_json::to_value(v).map_err(|e| {
        let err = RelayError::InternalInvariant(format!("filter value did not marshal: {e}"));
        tracing::error!(error = %err, "filter value failed to marshal to JSON");
        err
    })?;
    let JsonValue::Object(map) = value else {
        let err = RelayError::InternalInvariant("filter value must marshal to a JSON object".into());
        tracing::error!(error = %err, "filter value did not marshal to a JSON object");
        return Err(err);
    };
    Ok(prune_map(map))
}

/// Recursively removes `null` values, empty sub-maps, and empty lists.
/// Idempotent: pruning an already-pruned map is a no-op.
pub fn prune_map(map: FilterMap) -> FilterMap {
    match prune_value(JsonValue::Object(map)) {
        Some(JsonValue::Object(pruned)) => pruned,
        _ => FilterMap::new(),
    }
}

fn prune_value(value: JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Null => None,
        JsonValue::Object(map) => {
            let mut pruned = JsonMap::new();
            for (key, val) in map {
                if let Some(v) = prune_value(val) {
                    pruned.insert(key, v);
                }
            }
            if pruned.is_empty() {
                None
            } else {
                Some(JsonValue::Object(pruned))
            }
        }
        JsonValue::Array(items) => {
            let pruned: Vec<JsonValue> = items.into_iter().filter_map(prune_value).collect();
            if pruned.is_empty() {
                None
            } else {
                Some(JsonValue::Array(pruned))
            }
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: JsonValue) -> FilterMap {
        match v {
            JsonValue::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn prune_removes_nulls_and_empties() {
        let input = obj(json!({
            "And": [
                {"Name": {"Eq": "x"}},
                {"Age": {}},
                null,
            ],
            "Empty": {},
            "EmptyList": [],
            "Keep": {"Eq": "y"},
        }));
        let pruned = prune_map(input);
        assert!(!pruned.contains_key("Empty"));
        assert!(!pruned.contains_key("EmptyList"));
        assert_eq!(pruned["Keep"], json!({"Eq": "y"}));
        let and = pruned["And"].as_array().unwrap();
        assert_eq!(and.len(), 1);
        assert_eq!(and[0], json!({"Name": {"Eq": "x"}}));
    }

    #[test]
    fn prune_is_idempotent() {
        let input = obj(json!({"Name": {"Eq": "x"}, "Dead": null}));
        let once = prune_map(input.clone());
        let twice = prune_map(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn to_map_marshals_and_prunes() {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Filter {
            name: Option<String>,
            age: Option<i32>,
        }
        let map = to_map(&Filter {
            name: Some("x".into()),
            age: None,
        })
        .unwrap();
        assert!(map.contains_key("Name"));
        assert!(!map.contains_key("Age"));
    }
}
