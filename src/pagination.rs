//! The pagination dispatcher (C4): normalizes Relay `(first, last,
//! after, before)` arguments into an [`ApplyCursorsRequest`], delegates
//! to a composed [`PageSource`] chain (primary-order injector → codec
//! → cursor-strategy adapter), and derives the final [`PageInfo`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{RelayError, RelayResult};
use crate::order::{Order, PrimaryOrderInjector};

/// Request-scoped flags controlling which parts of a page the caller
/// actually needs. Carried via [`RequestContext`] rather than as extra
/// per-call parameters, mirroring the ambient-context style the Relay
/// request surface favors for cross-cutting settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
    pub total_count: bool,
    pub edges: bool,
    pub nodes: bool,
    pub page_info: bool,
}

impl SkipFlags {
    /// True when the finder may be skipped entirely: every one of
    /// edges/nodes/page_info is flagged skip (total_count is handled
    /// separately since it's a distinct call to `count`, not `find`).
    pub fn all_results_skipped(&self) -> bool {
        self.edges && self.nodes && self.page_info
    }
}

/// A cooperative cancellation signal threaded through finder/counter
/// calls and deferred cursor closures. The library itself never blocks
/// on it — only checks it at call boundaries.
pub trait CancellationToken: Send + Sync + fmt::Debug {
    fn is_cancelled(&self) -> bool;
}

/// Default token for callers with no cancellation source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

fn check_cancelled(token: &dyn CancellationToken) -> RelayResult<()> {
    if token.is_cancelled() {
        Err(RelayError::FinderError(Box::new(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "request cancelled",
        ))))
    } else {
        Ok(())
    }
}

/// Per-call configuration threaded through the dispatcher, adapters,
/// codecs, and cursor closures.
#[derive(Clone)]
pub struct RequestContext {
    pub skip: SkipFlags,
    pub cancellation: Arc<dyn CancellationToken>,
}

impl Default for RequestContext {
    fn default() -> Self {
        RequestContext {
            skip: SkipFlags::default(),
            cancellation: Arc::new(NeverCancelled),
        }
    }
}

impl RequestContext {
    pub fn with_skip(skip: SkipFlags) -> Self {
        RequestContext {
            skip,
            ..Default::default()
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// The normalized query passed down the `PageSource` chain.
#[derive(Debug, Clone)]
pub struct ApplyCursorsRequest {
    pub after: Option<String>,
    pub before: Option<String>,
    pub order_by: Vec<Order>,
    pub limit: i64,
    pub from_end: bool,
}

/// A deferred cursor producer. Captures only owned values (the inner,
/// strategy-level cursor string) — never a reference back to the
/// finder — so it can outlive the response if the caller retains it.
pub type CursorFn = Box<dyn Fn(&dyn CancellationToken) -> RelayResult<String> + Send + Sync>;

/// Builds a trivial cursor closure that returns a precomputed inner
/// cursor string, checking cancellation before returning it.
pub fn ready_cursor(inner: String) -> CursorFn {
    Box::new(move |token| {
        check_cancelled(token)?;
        Ok(inner.clone())
    })
}

pub struct Edge<T> {
    pub node: T,
    pub cursor: CursorFn,
}

impl<T: fmt::Debug> fmt::Debug for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge").field("node", &self.node).finish()
    }
}

/// The response assembled by a cursor-strategy adapter or a codec
/// wrapping one.
pub struct ApplyCursorsResponse<T> {
    pub lazy_edges: Vec<Edge<T>>,
    pub total_count: Option<i64>,
    pub has_after_or_previous: bool,
    pub has_before_or_next: bool,
}

impl<T> ApplyCursorsResponse<T> {
    pub fn empty(total_count: Option<i64>) -> Self {
        ApplyCursorsResponse {
            lazy_edges: Vec::new(),
            total_count,
            has_after_or_previous: false,
            has_before_or_next: false,
        }
    }
}

/// The composable middleware contract: a cursor-strategy adapter (the
/// innermost implementation) or a codec/injector decorator wrapping
/// one. Corresponds to the Go design's `ApplyCursorsFunc[T]`.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>>;
}

/// Relay connection arguments as received from a resolver: at most one
/// of `first`/`last`, opaque `after`/`before`, plus the caller's
/// requested ordering (before primary-order injection).
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub order_by: Vec<Order>,
}

impl ConnectionArgs {
    fn normalize(&self) -> RelayResult<(i64, bool)> {
        if self.first.is_some() && self.last.is_some() {
            return Err(RelayError::InvalidPagination(
                "at most one of 'first' or 'last' may be set".into(),
            ));
        }
        if let Some(first) = self.first {
            if first < 0 {
                return Err(RelayError::InvalidPagination("'first' must be >= 0".into()));
            }
            return Ok((first, false));
        }
        if let Some(last) = self.last {
            if last < 0 {
                return Err(RelayError::InvalidPagination("'last' must be >= 0".into()));
            }
            // `last` always anchors the page at the end of the ordered
            // set, whether or not `before` was also supplied.
            return Ok((last, true));
        }
        Err(RelayError::InvalidPagination(
            "exactly one of 'first' or 'last' must be set".into(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub total_count: Option<i64>,
}

pub struct MaterializedEdge<T> {
    pub node: T,
    pub cursor: String,
}

pub struct Connection<T> {
    pub edges: Vec<MaterializedEdge<T>>,
    pub page_info: PageInfo,
}

/// The outer orchestration: normalizes Relay arguments, injects the
/// primary ordering, delegates to the composed `PageSource` chain, and
/// derives orientation-dependent `PageInfo` booleans.
pub struct Dispatcher<T> {
    injector: PrimaryOrderInjector,
    source: Arc<dyn PageSource<T>>,
}

impl<T> Dispatcher<T> {
    pub fn new(source: Arc<dyn PageSource<T>>, injector: PrimaryOrderInjector) -> Self {
        Dispatcher { injector, source }
    }

    pub async fn paginate(
        &self,
        ctx: &RequestContext,
        args: ConnectionArgs,
    ) -> RelayResult<Connection<T>> {
        let (limit, from_end) = match args.normalize() {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(kind = %err.kind(), "rejected pagination request");
                return Err(err);
            }
        };
        let order_by = self.injector.inject(&args.order_by);
        let req = ApplyCursorsRequest {
            after: args.after,
            before: args.before,
            order_by,
            limit,
            from_end,
        };
        let span = tracing::info_span!("apply_cursors", limit, from_end);
        tracing::debug!(parent: &span, "dispatching page request");
        let response = {
            use tracing::Instrument;
            match self.source.apply(ctx, req.clone()).instrument(span).await {
                Ok(r) => r,
                Err(err) => {
                    tracing::warn!(kind = %err.kind(), "page source rejected request");
                    return Err(err);
                }
            }
        };
        self.assemble(ctx, req, response)
    }

    fn assemble(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
        response: ApplyCursorsResponse<T>,
    ) -> RelayResult<Connection<T>> {
        let total_count = response.total_count;
        let more_than_requested = total_count.map_or(false, |tc| tc > req.limit);

        let has_previous_page = response.has_after_or_previous
            || (req.from_end && more_than_requested);
        let has_next_page =
            response.has_before_or_next || (!req.from_end && more_than_requested);

        let mut edges = Vec::with_capacity(response.lazy_edges.len());
        for edge in response.lazy_edges {
            let cursor = (edge.cursor)(ctx.cancellation.as_ref())?;
            edges.push(MaterializedEdge {
                node: edge.node,
                cursor,
            });
        }

        let start_cursor = edges.first().map(|e| e.cursor.clone());
        let end_cursor = edges.last().map(|e| e.cursor.clone());

        Ok(Connection {
            edges,
            page_info: PageInfo {
                has_next_page,
                has_previous_page,
                start_cursor,
                end_cursor,
                total_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        total_count: Option<i64>,
        has_after_or_previous: bool,
        has_before_or_next: bool,
    }

    #[async_trait]
    impl PageSource<i64> for FixedSource {
        async fn apply(
            &self,
            _ctx: &RequestContext,
            _req: ApplyCursorsRequest,
        ) -> RelayResult<ApplyCursorsResponse<i64>> {
            Ok(ApplyCursorsResponse {
                lazy_edges: vec![Edge {
                    node: 1,
                    cursor: ready_cursor("1".into()),
                }],
                total_count: self.total_count,
                has_after_or_previous: self.has_after_or_previous,
                has_before_or_next: self.has_before_or_next,
            })
        }
    }

    fn dispatcher(source: FixedSource) -> Dispatcher<i64> {
        Dispatcher::new(Arc::new(source), PrimaryOrderInjector::default())
    }

    #[tokio::test]
    async fn forward_page_with_more_results_sets_has_next_page() {
        let d = dispatcher(FixedSource {
            total_count: Some(20),
            has_after_or_previous: false,
            has_before_or_next: false,
        });
        let args = ConnectionArgs {
            first: Some(3),
            ..Default::default()
        };
        let conn = d.paginate(&RequestContext::default(), args).await.unwrap();
        assert!(conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
    }

    #[tokio::test]
    async fn backward_page_with_more_results_sets_has_previous_page() {
        let d = dispatcher(FixedSource {
            total_count: Some(20),
            has_after_or_previous: false,
            has_before_or_next: false,
        });
        let args = ConnectionArgs {
            last: Some(3),
            ..Default::default()
        };
        let conn = d.paginate(&RequestContext::default(), args).await.unwrap();
        assert!(conn.page_info.has_previous_page);
        assert!(!conn.page_info.has_next_page);
    }

    #[tokio::test]
    async fn both_first_and_last_is_rejected() {
        let d = dispatcher(FixedSource {
            total_count: None,
            has_after_or_previous: false,
            has_before_or_next: false,
        });
        let args = ConnectionArgs {
            first: Some(1),
            last: Some(1),
            ..Default::default()
        };
        let err = d.paginate(&RequestContext::default(), args).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::RelayErrorKind::InvalidPagination);
    }
}
