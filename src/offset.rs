//! Offset cursor strategy (C3): the cursor payload is the decimal
//! 0-based index of the boundary row.

use async_trait::async_trait;

use crate::error::{RelayError, RelayResult};
use crate::node::Node;
use crate::pagination::{
    ApplyCursorsRequest, ApplyCursorsResponse, Edge, PageSource, RequestContext, ready_cursor,
};

pub fn encode_offset_cursor(offset: i64) -> String {
    offset.to_string()
}

pub fn decode_offset_cursor(s: &str) -> RelayResult<i64> {
    let value: i64 = s
        .parse()
        .map_err(|_| RelayError::InvalidCursor("offset cursor is not a valid integer".into()))?;
    if value < 0 {
        return Err(RelayError::InvalidCursor(
            "offset cursor must be non-negative".into(),
        ));
    }
    Ok(value)
}

/// The finder contract for offset pagination: the adapter has already
/// reduced the request to a concrete `(skip, limit)` window.
#[async_trait]
pub trait OffsetFinder<T, S = T>: Send + Sync {
    async fn count(&self, ctx: &RequestContext) -> RelayResult<i64>;

    async fn find(&self, ctx: &RequestContext, skip: i64, limit: i64) -> RelayResult<Vec<Node<T, S>>>;
}

pub struct OffsetAdapter<T, S, F> {
    finder: F,
    _marker: std::marker::PhantomData<(T, S)>,
}

impl<T, S, F> OffsetAdapter<T, S, F> {
    pub fn new(finder: F) -> Self {
        OffsetAdapter {
            finder,
            _marker: std::marker::PhantomData,
        }
    }
}

/// Derives `(skip, limit)` per §4.3. `total` is only consulted when
/// present; callers must have already supplied it when `from_end` is
/// true and `before` is absent (enforced by the caller before this
/// runs).
fn derive_window(
    after: Option<i64>,
    before: Option<i64>,
    limit: i64,
    from_end: bool,
) -> (i64, i64) {
    let mut skip = if let Some(after) = after {
        after + 1
    } else if let Some(before) = before {
        before - limit
    } else {
        0
    };
    if skip < 0 {
        skip = 0;
    }

    let mut limit = limit;
    if let Some(before) = before {
        let range_len = (before - skip).max(0);
        limit = limit.min(range_len);
        if from_end && limit < range_len {
            skip = before - limit;
        }
    }
    (skip, limit)
}

#[async_trait]
impl<T, S, F> PageSource<T> for OffsetAdapter<T, S, F>
where
    T: Send + Sync + 'static,
    S: Send + Sync + 'static,
    F: OffsetFinder<T, S> + Send + Sync,
{
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>> {
        let after = req.after.as_deref().map(decode_offset_cursor).transpose().map_err(|err| {
            tracing::warn!(kind = %err.kind(), "malformed 'after' offset cursor");
            err
        })?;
        let mut before = req
            .before
            .as_deref()
            .map(decode_offset_cursor)
            .transpose()
            .map_err(|err| {
                tracing::warn!(kind = %err.kind(), "malformed 'before' offset cursor");
                err
            })?;

        if let (Some(a), Some(b)) = (after, before) {
            if a >= b {
                let err = RelayError::InvalidPagination("after >= before".into());
                tracing::warn!(kind = %err.kind(), "rejected after >= before");
                return Err(err);
            }
        }

        let total_count = if ctx.skip.total_count {
            None
        } else {
            Some(self.finder.count(ctx).await?)
        };

        if req.from_end && before.is_none() {
            let total = total_count.ok_or_else(|| {
                let err = RelayError::InvalidPagination(
                    "FromEnd without 'before' requires a known TotalCount".into(),
                );
                tracing::warn!(kind = %err.kind(), "FromEnd without a TotalCount source");
                err
            })?;
            before = Some(total);
        }

        if ctx.skip.all_results_skipped() {
            tracing::debug!("all results skipped; returning TotalCount only");
            return Ok(ApplyCursorsResponse::empty(total_count));
        }

        let (skip, limit) = derive_window(after, before, req.limit, req.from_end);
        tracing::debug!(skip, limit, "derived offset window");

        let exceeds_total = total_count.map_or(false, |tc| skip >= tc);
        if limit <= 0 || exceeds_total {
            tracing::debug!("window empty or past TotalCount; short-circuiting");
            let mut resp = ApplyCursorsResponse::empty(total_count);
            resp.has_after_or_previous = has_after_or_previous(after, total_count);
            resp.has_before_or_next = has_before_or_next(before, total_count);
            return Ok(resp);
        }

        let nodes = self.finder.find(ctx, skip, limit).await?;

        let mut lazy_edges = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.into_iter().enumerate() {
            let cursor = encode_offset_cursor(skip + i as i64);
            lazy_edges.push(Edge {
                node: node.into_view(),
                cursor: ready_cursor(cursor),
            });
        }

        Ok(ApplyCursorsResponse {
            lazy_edges,
            total_count,
            has_after_or_previous: has_after_or_previous(after, total_count),
            has_before_or_next: has_before_or_next(before, total_count),
        })
    }
}

fn has_after_or_previous(after: Option<i64>, total: Option<i64>) -> bool {
    match (after, total) {
        (Some(a), Some(total)) => a < total,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

fn has_before_or_next(before: Option<i64>, total: Option<i64>) -> bool {
    match (before, total) {
        (Some(b), Some(total)) => b < total,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trip() {
        for i in 0..50i64 {
            let s = encode_offset_cursor(i);
            assert_eq!(decode_offset_cursor(&s).unwrap(), i);
        }
    }

    #[test]
    fn decode_rejects_negative() {
        assert!(decode_offset_cursor("-1").is_err());
    }

    #[test]
    fn decode_rejects_non_integer() {
        assert!(decode_offset_cursor("abc").is_err());
    }

    #[test]
    fn window_after_with_total() {
        // after=5, limit=3, total=10 -> skip=6, limit=3
        let (skip, limit) = derive_window(Some(5), None, 3, false);
        assert_eq!((skip, limit), (6, 3));
    }

    #[test]
    fn window_before_without_after() {
        // before=4, limit=10 -> skip=0, limit=4
        let (skip, limit) = derive_window(None, Some(4), 10, false);
        assert_eq!((skip, limit), (0, 4));
    }

    #[test]
    fn window_from_end_no_before_uses_total() {
        // fromEnd=true, before=total=20, limit=5 -> skip=15, limit=5
        let (skip, limit) = derive_window(None, Some(20), 5, true);
        assert_eq!((skip, limit), (15, 5));
    }

    #[test]
    fn after_below_total_yields_previous_page() {
        // after=9, total=10: the formula in §4.3 ("after != nil && after
        // < total") is the ground truth here; 9 < 10 so a previous page
        // exists. (See DESIGN.md for the note on the scenario table's
        // "HasAfterOrPrevious=false" line, which this decision overrides.)
        assert!(has_after_or_previous(Some(9), Some(10)));
    }

    #[test]
    fn after_at_or_past_total_yields_no_previous_page() {
        assert!(!has_after_or_previous(Some(10), Some(10)));
    }
}
