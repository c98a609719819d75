use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::{decode_request, encode_cursor, invalid};
use crate::error::RelayResult;
use crate::pagination::{ApplyCursorsRequest, ApplyCursorsResponse, Edge, PageSource, RequestContext};

/// RFC 4648 §5 (URL-safe, unpadded) Base64 wrapper over the inner
/// cursor string.
pub struct Base64Codec<T> {
    inner: Arc<dyn PageSource<T>>,
    _marker: PhantomData<T>,
}

impl<T> Base64Codec<T> {
    pub fn new(inner: Arc<dyn PageSource<T>>) -> Self {
        Base64Codec {
            inner,
            _marker: PhantomData,
        }
    }
}

fn decode_b64(wire: &str) -> RelayResult<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(wire)
        .map_err(|_| invalid("malformed base64 cursor"))?;
    String::from_utf8(bytes).map_err(|_| invalid("cursor is not valid utf-8"))
}

fn encode_b64(inner: String) -> RelayResult<String> {
    Ok(URL_SAFE_NO_PAD.encode(inner.as_bytes()))
}

#[async_trait]
impl<T: Send + Sync + 'static> PageSource<T> for Base64Codec<T> {
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>> {
        let decoded = decode_request(req, decode_b64)?;
        let mut response = self.inner.apply(ctx, decoded).await?;
        response.lazy_edges = response
            .lazy_edges
            .into_iter()
            .map(|edge| Edge {
                node: edge.node,
                cursor: encode_cursor(edge.cursor, encode_b64),
            })
            .collect();
        Ok(response)
    }
}
