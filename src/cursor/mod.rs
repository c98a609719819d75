//! Cursor codecs (C1): middleware wrapping a [`PageSource`], each
//! translating the wire cursor format to/from the inner plaintext
//! cursor the strategy adapters (keyset/offset) produce and consume.
//!
//! Composition is left-to-right: the outermost codec is the one that
//! speaks wire format to the caller. Decode failures surface as
//! [`RelayError::InvalidCursor`] *before* the inner `PageSource` (and
//! therefore the finder) is ever invoked.

mod base64_codec;
mod gcm_codec;
mod raw_codec;

pub use base64_codec::Base64Codec;
pub use gcm_codec::GcmCodec;
pub use raw_codec::RawCodec;

use crate::error::{RelayError, RelayResult};
use crate::pagination::{ApplyCursorsRequest, CursorFn};

/// Decodes `req.after`/`req.before` through `decode`, failing the
/// whole request before the inner source is ever called if either is
/// malformed, or if both are present and decode to the same value.
fn decode_request(
    req: ApplyCursorsRequest,
    decode: impl Fn(&str) -> RelayResult<String>,
) -> RelayResult<ApplyCursorsRequest> {
    let after = req.after.as_deref().map(&decode).transpose()?;
    let before = req.before.as_deref().map(&decode).transpose()?;
    Ok(ApplyCursorsRequest {
        after,
        before,
        ..req
    })
}

/// Wraps an inner cursor closure so its result is passed through
/// `encode` before being handed back to the caller.
fn encode_cursor(inner: CursorFn, encode: impl Fn(String) -> RelayResult<String> + Send + Sync + 'static) -> CursorFn {
    Box::new(move |token| {
        let plaintext = inner(token)?;
        encode(plaintext)
    })
}

fn invalid(context: &str) -> RelayError {
    tracing::warn!(context, "rejected malformed wire cursor");
    RelayError::InvalidCursor(context.to_string())
}
