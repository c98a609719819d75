//! Key-rewriting transforms (C8): walk a filter map preserving logical
//! structure, letting a caller-supplied function rewrite or drop each
//! key it encounters — field, operator, modifier, and the logical
//! combinators (`and`/`or`/`not`) alike.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use super::keys::{is_modifier_key, is_operator_group, logical_kind, LogicalKind};
use super::map::FilterMap;
use crate::error::{RelayError, RelayResult};

/// A live handle onto an output container being assembled during a
/// walk. Shared (not owned) so a [`Transform`] can be handed the exact
/// in-progress map it's about to be inserted into, and write into it
/// directly via [`TransformInput::target_map`]/[`TransformInput::containers`]
/// rather than only through its `{Key, Value}` return.
pub type SharedMap = Rc<RefCell<FilterMap>>;

/// A key's position in the tree, as a sequence of segments. List
/// indices inside `And`/`Or` are recorded as `[i]` segments so the path
/// round-trips through [`KeyPath::to_string`] unambiguously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        KeyPath(segments)
    }

    fn index(&self, i: usize) -> Self {
        self.child(format!("[{i}]"))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            if seg.starts_with('[') {
                write!(f, "{seg}")?;
            } else {
                if !first {
                    write!(f, ".")?;
                }
                write!(f, "{seg}")?;
            }
            first = false;
        }
        Ok(())
    }
}

/// Classification of the key currently being visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Logical,
    Field,
    Operator,
    Modifier,
}

/// Everything a [`Transform`] needs to decide how to rewrite one key.
pub struct TransformInput<'a> {
    pub path: KeyPath,
    pub key_type: KeyType,
    pub key: &'a str,
    pub value: &'a JsonValue,
    pub root_map: &'a FilterMap,
    pub parent_map: &'a FilterMap,
    /// The output container this key's rewritten entry will land in —
    /// the map under construction, not the source map being read. `fn`
    /// may write extra entries into it directly; whatever `walk` itself
    /// inserts for this key happens afterward, so both are visible in
    /// the final result.
    pub target_map: SharedMap,
    /// The output-container ancestor chain, parallel to `path`'s map
    /// levels: `containers[0]` is the output root, and each later entry
    /// is the exact sub-container that will hold the next relationship/
    /// logical-branch descendant's result. `containers.last()` is
    /// always the same container as `target_map`.
    pub containers: Vec<SharedMap>,
    /// `true` when `target_map` is itself an operator group, i.e. `key`
    /// is an operator/modifier name rather than a field name.
    pub in_operator_group: bool,
}

/// A rewritten key and (optionally) rewritten value. Returning `None`
/// from a [`Transform`] drops the key, and an empty `new_key` also
/// drops it — both prune the subtree the same way [`super::map::prune_map`] does.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub new_key: String,
    pub new_value: Option<JsonValue>,
}

/// A key-rewrite function: given everything about the key at `input`,
/// decide its replacement, `None` to drop it, or an error to abort the
/// whole walk. An error is wrapped in [`RelayError::TransformError`]
/// with the failing [`KeyPath`] attached for locality.
pub trait Transform:
    Fn(TransformInput<'_>) -> Result<Option<TransformOutput>, Box<dyn std::error::Error + Send + Sync>>
    + Send
    + Sync
{
}
impl<F> Transform for F where
    F: Fn(TransformInput<'_>) -> Result<Option<TransformOutput>, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync
{
}

/// Walks `source`, applying `f` to every key position it encounters,
/// including the logical combinators (`And`/`Or`/`Not`, `KeyType::Logical`)
/// themselves, and returns the rewritten map. Logical list/branch shape
/// is preserved (order kept, each branch rebuilt into a fresh sub-map),
/// but whether `and`/`or`/`not` are renamed is entirely up to `f`.
pub fn transform(source: &FilterMap, f: &impl Transform) -> RelayResult<FilterMap> {
    let out: SharedMap = Rc::new(RefCell::new(FilterMap::new()));
    let containers = vec![Rc::clone(&out)];
    let result = walk(source, source, &out, &containers, &KeyPath::root(), f);
    drop(containers);
    result?;
    Ok(unwrap_shared(out))
}

/// Extracts the finished map from a [`SharedMap`]. Falls back to a
/// clone if a `fn` retained its own handle, so the refcount isn't
/// exactly 1 at the point the walk that owns it is done with it.
fn unwrap_shared(container: SharedMap) -> FilterMap {
    Rc::try_unwrap(container)
        .map(|cell| cell.into_inner())
        .unwrap_or_else(|rc| rc.borrow().clone())
}

fn walk(
    root: &FilterMap,
    source: &FilterMap,
    out: &SharedMap,
    containers: &[SharedMap],
    path: &KeyPath,
    f: &impl Transform,
) -> RelayResult<()> {
    let group = is_operator_group(source);

    for (key, value) in source {
        let child_path = path.child(key.clone());

        let key_type = if logical_kind(key).is_some() {
            KeyType::Logical
        } else if group {
            if is_modifier_key(key) {
                KeyType::Modifier
            } else {
                KeyType::Operator
            }
        } else {
            KeyType::Field
        };

        let input = TransformInput {
            path: child_path.clone(),
            key_type,
            key,
            value,
            root_map: root,
            parent_map: source,
            target_map: Rc::clone(out),
            containers: containers.to_vec(),
            in_operator_group: group,
        };

        let outcome = f(input).map_err(|err| {
            tracing::warn!(path = %child_path, "transform function failed");
            RelayError::transform(child_path.to_string(), err)
        })?;
        let Some(rewritten) = outcome else {
            continue;
        };
        if rewritten.new_key.is_empty() {
            continue;
        }

        if let Some(v) = rewritten.new_value {
            out.borrow_mut().insert(rewritten.new_key, v);
            continue;
        }

        match key_type {
            KeyType::Logical => {
                let kind = logical_kind(key).expect("KeyType::Logical implies logical_kind(key)");
                let new_value = match kind {
                    LogicalKind::And | LogicalKind::Or => {
                        let JsonValue::Array(branches) = value else {
                            out.borrow_mut().insert(rewritten.new_key, value.clone());
                            continue;
                        };
                        let mut new_branches = Vec::with_capacity(branches.len());
                        for (i, branch) in branches.iter().enumerate() {
                            let Some(sub) = branch.as_object() else {
                                continue;
                            };
                            let child: SharedMap = Rc::new(RefCell::new(FilterMap::new()));
                            let mut nested = containers.to_vec();
                            nested.push(Rc::clone(&child));
                            let branch_result = walk(root, sub, &child, &nested, &child_path.index(i), f);
                            drop(nested);
                            branch_result?;
                            let rendered = unwrap_shared(child);
                            if !rendered.is_empty() {
                                new_branches.push(JsonValue::Object(rendered));
                            }
                        }
                        if new_branches.is_empty() {
                            continue;
                        }
                        JsonValue::Array(new_branches)
                    }
                    LogicalKind::Not => {
                        let Some(sub) = value.as_object() else {
                            out.borrow_mut().insert(rewritten.new_key, value.clone());
                            continue;
                        };
                        let child: SharedMap = Rc::new(RefCell::new(FilterMap::new()));
                        let mut nested = containers.to_vec();
                        nested.push(Rc::clone(&child));
                        let not_result = walk(root, sub, &child, &nested, &child_path, f);
                        drop(nested);
                        not_result?;
                        let rendered = unwrap_shared(child);
                        if rendered.is_empty() {
                            continue;
                        }
                        JsonValue::Object(rendered)
                    }
                };
                out.borrow_mut().insert(rewritten.new_key, new_value);
            }
            KeyType::Field if !group => match value {
                JsonValue::Object(sub) => {
                    let child: SharedMap = Rc::new(RefCell::new(FilterMap::new()));
                    let mut nested = containers.to_vec();
                    nested.push(Rc::clone(&child));
                    let field_result = walk(root, sub, &child, &nested, &child_path, f);
                    drop(nested);
                    field_result?;
                    let rendered = unwrap_shared(child);
                    if rendered.is_empty() {
                        continue;
                    }
                    out.borrow_mut()
                        .insert(rewritten.new_key, JsonValue::Object(rendered));
                }
                other => {
                    out.borrow_mut().insert(rewritten.new_key, other.clone());
                }
            },
            _ => {
                out.borrow_mut().insert(rewritten.new_key, value.clone());
            }
        }
    }

    Ok(())
}

/// Capitalizes only the first character of `s`, lowercasing nothing
/// else (`"categoryId"` -> `"CategoryId"`).
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[allow(non_snake_case)]
pub fn Capitalize(s: &str) -> String {
    capitalize(s)
}

const ACRONYMS: &[&str] = &[
    "id", "url", "api", "http", "json", "uuid", "ip", "html", "xml", "db", "sql",
];

/// Splits `s` into words at snake/kebab separators and at camelCase /
/// acronym boundaries, so a run of capitals (`XML`) stays one word
/// while still splitting before a capital that starts a new word
/// (`XMLHttp` -> `XML`, `Http`).
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = current.chars().last().unwrap();
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            let boundary = prev.is_lowercase() || (prev.is_uppercase() && next_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Rewrites an identifier to PascalCase while treating a known set of
/// acronyms (`id`, `url`, `api`, `http`, `json`, …) as all-uppercase
/// units, and splitting runs of upper-case letters into separate words
/// so e.g. `XMLHttpRequest` -> `XMLHTTPRequest`.
pub fn smart_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let lower = w.to_lowercase();
            if ACRONYMS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else {
                capitalize(&lower)
            }
        })
        .collect()
}

#[allow(non_snake_case)]
pub fn SmartPascalCase(s: &str) -> String {
    smart_pascal_case(s)
}

/// Builds a [`Transform`] that renames every field/operator/modifier
/// key via [`smart_pascal_case`], leaving values untouched.
pub fn with_smart_pascal_case() -> impl Transform {
    |input: TransformInput<'_>| {
        Ok(Some(TransformOutput {
            new_key: smart_pascal_case(input.key),
            new_value: None,
        }))
    }
}

#[allow(non_snake_case)]
pub fn WithSmartPascalCase() -> impl Transform {
    with_smart_pascal_case()
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
    fn smart_pascal_case_treats_id_as_an_acronym() {
        assert_eq!(smart_pascal_case("categoryId"), "CategoryID");
        assert_eq!(smart_pascal_case("user_name"), "UserName");
        assert_eq!(smart_pascal_case("api_key"), "APIKey");
    }

    #[test]
    fn smart_pascal_case_splits_acronym_runs() {
        assert_eq!(smart_pascal_case("XMLHttpRequest"), "XMLHTTPRequest");
    }

    #[test]
    fn capitalize_only_touches_first_character() {
        assert_eq!(capitalize("eq"), "Eq");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn field_and_its_operator_both_get_renamed() {
        let input = obj(json!({"categoryId": {"eq": "A"}}));
        let out = transform(&input, &with_smart_pascal_case()).unwrap();
        assert_eq!(out, obj(json!({"CategoryID": {"Eq": "A"}})));
    }

    #[test]
    fn relationship_filters_are_distinguished_from_operator_groups() {
        // `category` holds a sub-map whose own child ("name") is itself a
        // relationship-shaped map, not an operator group - so `category`
        // and `name` are Field keys (renamed), while `eq` inside is an
        // Operator key (also renamed), and nesting is preserved.
        let input = obj(json!({
            "category": {"name": {"eq": "Books"}}
        }));
        let out = transform(&input, &with_smart_pascal_case()).unwrap();
        assert_eq!(out, obj(json!({"Category": {"Name": {"Eq": "Books"}}})));
    }

    #[test]
    fn logical_structure_is_preserved_across_renames() {
        // `and`/`or`/`not` are visited as `KeyType::Logical` like any
        // other key, so `with_smart_pascal_case` renames them too.
        let input = obj(json!({
            "and": [
                {"name": {"eq": "x"}},
                {"age": {"gt": 1}},
            ]
        }));
        let out = transform(&input, &with_smart_pascal_case()).unwrap();
        assert_eq!(
            out,
            obj(json!({
                "And": [
                    {"Name": {"Eq": "x"}},
                    {"Age": {"Gt": 1}},
                ]
            }))
        );
    }

    #[test]
    fn logical_keys_are_classified_as_logical() {
        let input = obj(json!({
            "not": {"name": {"eq": "x"}}
        }));
        let seen = RefCell::new(Vec::new());
        let out = transform(&input, &|i: TransformInput<'_>| {
            seen.borrow_mut().push((i.key.to_string(), i.key_type));
            Ok(Some(TransformOutput {
                new_key: i.key.to_string(),
                new_value: None,
            }))
        })
        .unwrap();
        assert_eq!(out, obj(json!({"not": {"name": {"eq": "x"}}})));
        assert_eq!(
            *seen.borrow(),
            vec![
                ("not".to_string(), KeyType::Logical),
                ("name".to_string(), KeyType::Field),
                ("eq".to_string(), KeyType::Operator),
            ]
        );
    }

    #[test]
    fn transform_fn_can_write_directly_into_target_map() {
        // `target_map` is the live output container, not the source map:
        // a `fn` can insert a sibling entry into it mid-walk and see it
        // survive alongside whatever `walk` itself inserts for the key.
        let input = obj(json!({"name": {"eq": "x"}}));
        let out = transform(&input, &|i: TransformInput<'_>| {
            if i.key == "name" {
                i.target_map
                    .borrow_mut()
                    .insert("Injected".to_string(), json!(true));
            }
            Ok(Some(TransformOutput {
                new_key: smart_pascal_case(i.key),
                new_value: None,
            }))
        })
        .unwrap();
        assert_eq!(
            out,
            obj(json!({"Injected": true, "Name": {"Eq": "x"}}))
        );
    }

    #[test]
    fn containers_stack_grows_with_relationship_nesting() {
        let depths = RefCell::new(Vec::new());
        let input = obj(json!({"category": {"name": {"eq": "x"}}}));
        transform(&input, &|i: TransformInput<'_>| {
            depths.borrow_mut().push(i.containers.len());
            assert!(Rc::ptr_eq(i.containers.last().unwrap(), &i.target_map));
            Ok(Some(TransformOutput {
                new_key: i.key.to_string(),
                new_value: None,
            }))
        })
        .unwrap();
        assert_eq!(*depths.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn dropping_a_key_prunes_its_now_empty_parent() {
        let input = obj(json!({"secret": {"eq": "x"}, "name": {"eq": "y"}}));
        let out = transform(&input, &|i: TransformInput<'_>| {
            if i.key == "secret" {
                Ok(None)
            } else {
                Ok(Some(TransformOutput {
                    new_key: i.key.to_string(),
                    new_value: None,
                }))
            }
        })
        .unwrap();
        assert_eq!(out, obj(json!({"name": {"eq": "y"}})));
    }

    #[test]
    fn transform_function_error_is_wrapped_with_key_path() {
        let input = obj(json!({"name": {"eq": "x"}}));
        let err = transform(&input, &|i: TransformInput<'_>| {
            if i.key_type == KeyType::Operator {
                Err("boom".into())
            } else {
                Ok(Some(TransformOutput {
                    new_key: i.key.to_string(),
                    new_value: None,
                }))
            }
        })
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::RelayErrorKind::TransformError);
        assert!(err.to_string().contains("name.eq"));
    }

    #[test]
    fn key_path_renders_list_indices_without_a_dot() {
        let path = KeyPath::root().child("and").index(1).child("age");
        assert_eq!(path.to_string(), "and[1].age");
    }
}
