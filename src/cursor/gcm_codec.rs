use std::marker::PhantomData;
use std::sync::Arc;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;

use super::{decode_request, encode_cursor, invalid};
use crate::error::RelayResult;
use crate::pagination::{ApplyCursorsRequest, ApplyCursorsResponse, Edge, PageSource, RequestContext};

const NONCE_LEN: usize = 12;

fn decode_gcm(cipher: &Aes256Gcm, wire: &str) -> RelayResult<String> {
    let raw = URL_SAFE_NO_PAD
        .decode(wire)
        .map_err(|_| invalid("malformed base64 cursor"))?;
    if raw.len() < NONCE_LEN {
        return Err(invalid("ciphertext shorter than nonce"));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| invalid("cursor decryption failed"))?;
    String::from_utf8(plaintext).map_err(|_| invalid("cursor is not valid utf-8"))
}

fn encode_gcm(cipher: &Aes256Gcm, inner: &str) -> RelayResult<String> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, inner.as_bytes())
        .map_err(|_| invalid("cursor encryption failed"))?;
    let mut wire = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    wire.extend_from_slice(&nonce_bytes);
    wire.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(wire))
}

/// AES-GCM wrapper over the inner cursor string: wire format is
/// `Base64URL_noPad(nonce || seal(inner))`. The cipher is supplied by
/// the caller (key management is an out-of-scope collaborator) and is
/// required to be safe for concurrent use, matching the teacher's
/// `crypto-core` convention of treating injected crypto primitives as
/// shareable across calls. A fresh random nonce is generated per call.
pub struct GcmCodec<T> {
    inner: Arc<dyn PageSource<T>>,
    cipher: Arc<Aes256Gcm>,
    _marker: PhantomData<T>,
}

impl<T> GcmCodec<T> {
    pub fn new(inner: Arc<dyn PageSource<T>>, cipher: Arc<Aes256Gcm>) -> Self {
        GcmCodec {
            inner,
            cipher,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> PageSource<T> for GcmCodec<T> {
    async fn apply(
        &self,
        ctx: &RequestContext,
        req: ApplyCursorsRequest,
    ) -> RelayResult<ApplyCursorsResponse<T>> {
        let cipher = Arc::clone(&self.cipher);
        let decoded = decode_request(req, |wire| decode_gcm(&cipher, wire))?;
        let mut response = self.inner.apply(ctx, decoded).await?;
        response.lazy_edges = response
            .lazy_edges
            .into_iter()
            .map(|edge| {
                let cipher = Arc::clone(&self.cipher);
                Edge {
                    node: edge.node,
                    cursor: encode_cursor(edge.cursor, move |inner| encode_gcm(&cipher, &inner)),
                }
            })
            .collect();
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::KeyInit;
    use serial_test::serial;

    fn test_cipher() -> Aes256Gcm {
        Aes256Gcm::new(&[7u8; 32].into())
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = test_cipher();
        let wire = encode_gcm(&cipher, "{\"ID\":225}").unwrap();
        assert_eq!(decode_gcm(&cipher, &wire).unwrap(), "{\"ID\":225}");
    }

    #[test]
    #[serial]
    fn two_encryptions_of_same_plaintext_differ() {
        let cipher = test_cipher();
        let a = encode_gcm(&cipher, "same").unwrap();
        let b = encode_gcm(&cipher, "same").unwrap();
        assert_ne!(a, b, "fresh nonce must be used per call");
    }

    #[test]
    fn rejects_ciphertext_shorter_than_nonce() {
        let cipher = test_cipher();
        let short = URL_SAFE_NO_PAD.encode([1u8, 2, 3]);
        assert!(decode_gcm(&cipher, &short).is_err());
    }

    #[test]
    fn rejects_tampered_ciphertext() {
        let cipher = test_cipher();
        let wire = encode_gcm(&cipher, "payload").unwrap();
        let mut raw = URL_SAFE_NO_PAD.decode(&wire).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = URL_SAFE_NO_PAD.encode(raw);
        assert!(decode_gcm(&cipher, &tampered).is_err());
    }
}
