use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RelayResult;
use crate::pagination::{ApplyCursorsRequest, ApplyCursorsResponse, PageSource, RequestContext};

/// Identity codec: the wire cursor format *is* the inner cursor
/// format. Exists so a `Dispatcher` chain always has a codec stage,
/// keeping chain construction uniform whether or not encoding is
/// wanted.
pub struct RawCodec<T> {
    inner: Arc<dyn PageSource<T>>,
    _marker: PhantomData<T>,
}

impl<T> RawCodec<T> {
    pub fn new(inner: Arc<dyn PageSource<T>>) -> Self {
        RawCodec {
            inner,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + Sync> PageSource<T> for RawCodec<T> {
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>> {
        self.inner.apply(ctx, req).await
    }
}
