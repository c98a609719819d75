//! The polymorphic node capability (`Node[T]` in the data model).
//!
//! Two codebases want different things from an edge: most just hand the
//! backing row straight through as both the typed value and the cursor
//! snapshot; some keep a distinct, smaller view type for the cursor so a
//! DB row's private columns never leak into a keyset cursor. Both are
//! the same capability — "give me `T`" and "give me something
//! JSON-marshallable for the cursor" — modeled here as one tagged enum
//! rather than two unrelated structs.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// A node paired with the snapshot used to build its keyset cursor.
///
/// `SelfNode` is the common case: the node itself is the snapshot.
/// `Wrapper` carries a distinct snapshot value (`S`) alongside the
/// typed view (`T`), for callers whose edge type and cursor-snapshot
/// type diverge (e.g. a DB row vs. a read-model view).
#[derive(Debug, Clone)]
pub enum Node<T, S = T> {
    SelfNode(T),
    Wrapper { view: T, snapshot: S },
}

impl<T, S> Node<T, S> {
    pub fn wrapper(view: T, snapshot: S) -> Self {
        Node::Wrapper { view, snapshot }
    }

    /// Consumes the node, yielding the typed edge value.
    pub fn into_view(self) -> T {
        match self {
            Node::SelfNode(t) => t,
            Node::Wrapper { view, .. } => view,
        }
    }
}

impl<T, S> Node<T, S>
where
    T: Serialize,
    S: Serialize,
{
    /// Marshals the snapshot half of the capability to a JSON value for
    /// keyset cursor encoding. Fails the same way `serde_json` fails on
    /// unsupported types (e.g. a function value).
    pub fn snapshot_json(&self) -> serde_json::Result<JsonValue> {
        match self {
            Node::SelfNode(t) => serde_json::to_value(t),
            Node::Wrapper { snapshot, .. } => serde_json::to_value(snapshot),
        }
    }
}
