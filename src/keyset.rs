//! Keyset cursor strategy (C2): a JSON object over the ordering keys,
//! forced-emit and sorted so cursors stay byte-stable across releases.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{RelayError, RelayErrorKind, RelayResult};
use crate::node::Node;
use crate::order::Order;
use crate::pagination::{
    ApplyCursorsRequest, ApplyCursorsResponse, Edge, PageSource, RequestContext, ready_cursor,
};

/// Marshals `node`'s snapshot to JSON, keeps only the fields named in
/// `keys` (failing if any is absent), and re-marshals with keys in
/// sorted order. The node's `Serialize` impl is expected to emit every
/// ordering field unconditionally — a field elided because it holds a
/// zero value would silently break cursor stability.
pub fn encode_keyset_cursor<T, S>(node: &Node<T, S>, keys: &[String]) -> RelayResult<String>
where
    T: Serialize,
    S: Serialize,
{
    let snapshot = node
        .snapshot_json()
        .map_err(|e| RelayError::NodeSnapshotError(e.to_string()))?;
    let JsonValue::Object(fields) = snapshot else {
        return Err(RelayError::NodeSnapshotError(
            "node snapshot did not marshal to a JSON object".into(),
        ));
    };

    let mut projected = Map::new();
    for key in keys {
        let value = fields.get(key).ok_or_else(|| {
            RelayError::NodeSnapshotError(format!("snapshot missing ordering field {key:?}"))
        })?;
        projected.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&projected).map_err(|e| RelayError::NodeSnapshotError(e.to_string()))
}

/// Parses a keyset cursor string, requiring its key set to equal
/// `keys` exactly (no missing keys, no extras).
pub fn decode_keyset_cursor(s: &str, keys: &[String]) -> RelayResult<Map<String, JsonValue>> {
    let value: JsonValue = serde_json::from_str(s)
        .map_err(|_| RelayError::InvalidCursor("malformed keyset cursor JSON".into()))?;
    let JsonValue::Object(map) = value else {
        return Err(RelayError::InvalidCursor(
            "keyset cursor is not a JSON object".into(),
        ));
    };
    if map.len() != keys.len() {
        return Err(RelayError::InvalidCursor(
            "keyset cursor key count does not match OrderBy".into(),
        ));
    }
    for key in keys {
        if !map.contains_key(key) {
            return Err(RelayError::InvalidCursor(format!(
                "keyset cursor missing key {key:?}"
            )));
        }
    }
    Ok(map)
}

/// The finder contract for keyset pagination: boundaries are decoded
/// keyset cursor maps (or `None` at either edge of the dataset).
#[async_trait]
pub trait KeysetFinder<T, S = T>: Send + Sync {
    async fn count(&self, ctx: &RequestContext) -> RelayResult<i64>;

    async fn find(
        &self,
        ctx: &RequestContext,
        after: Option<&Map<String, JsonValue>>,
        before: Option<&Map<String, JsonValue>>,
        order_by: &[Order],
        limit: i64,
        from_end: bool,
    ) -> RelayResult<Vec<Node<T, S>>>;
}

/// Wraps a [`KeysetFinder`] as a [`PageSource`], implementing the
/// keyset adapter algorithm (§4.2).
pub struct KeysetAdapter<T, S, F> {
    finder: F,
    _marker: std::marker::PhantomData<(T, S)>,
}

impl<T, S, F> KeysetAdapter<T, S, F> {
    pub fn new(finder: F) -> Self {
        KeysetAdapter {
            finder,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, S, F> PageSource<T> for KeysetAdapter<T, S, F>
where
    T: Serialize + Send + Sync + 'static,
    S: Serialize + Send + Sync + 'static,
    F: KeysetFinder<T, S> + Send + Sync,
{
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>> {
        let keys: Vec<String> = req.order_by.iter().map(|o| o.field.clone()).collect();
        if keys.is_empty() {
            tracing::warn!(kind = %RelayErrorKind::MissingOrderBy, "keyset pagination with empty OrderBy");
            return Err(RelayError::MissingOrderBy);
        }

        let after = req
            .after
            .as_deref()
            .map(|s| decode_keyset_cursor(s, &keys))
            .transpose()
            .map_err(|err| {
                tracing::warn!(kind = %err.kind(), "malformed 'after' keyset cursor");
                err
            })?;
        let before = req
            .before
            .as_deref()
            .map(|s| decode_keyset_cursor(s, &keys))
            .transpose()
            .map_err(|err| {
                tracing::warn!(kind = %err.kind(), "malformed 'before' keyset cursor");
                err
            })?;

        if let (Some(a), Some(b)) = (&after, &before) {
            if a == b {
                let err = RelayError::InvalidPagination(
                    "'after' and 'before' refer to the same cursor".into(),
                );
                tracing::warn!(kind = %err.kind(), "rejected identical after/before cursors");
                return Err(err);
            }
        }

        let total_count = if ctx.skip.total_count {
            None
        } else {
            Some(self.finder.count(ctx).await?)
        };

        if ctx.skip.all_results_skipped() {
            tracing::debug!("all results skipped; returning TotalCount only");
            return Ok(ApplyCursorsResponse::empty(total_count));
        }

        let limit_exhausted = req.limit <= 0 || total_count.map_or(false, |tc| tc <= 0);
        if limit_exhausted {
            tracing::debug!("limit exhausted; short-circuiting to an empty page");
            let mut resp = ApplyCursorsResponse::empty(total_count);
            resp.has_after_or_previous = after.is_some();
            resp.has_before_or_next = before.is_some();
            return Ok(resp);
        }

        let nodes = self
            .finder
            .find(
                ctx,
                after.as_ref(),
                before.as_ref(),
                &req.order_by,
                req.limit,
                req.from_end,
            )
            .await?;

        let mut lazy_edges = Vec::with_capacity(nodes.len());
        for node in nodes {
            let cursor = encode_keyset_cursor(&node, &keys)?;
            lazy_edges.push(Edge {
                node: node.into_view(),
                cursor: ready_cursor(cursor),
            });
        }

        Ok(ApplyCursorsResponse {
            lazy_edges,
            total_count,
            has_after_or_previous: after.is_some(),
            has_before_or_next: before.is_some(),
        })
    }
}
