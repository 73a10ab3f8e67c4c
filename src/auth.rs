//! Request signing for authenticated endpoints
//!
//! Private REST calls and the order events feed authenticate with a
//! base64-encoded JSON payload of `{request, nonce, ...}` and a hex
//! HMAC-SHA384 of that payload keyed by the API secret. Nonces are
//! strictly increasing per credential.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use aws_lc_rs::hmac;
use base64::prelude::*;
use chrono::Utc;
use serde_json::{Map, Value};
use zeroize::ZeroizeOnDrop;

/// API credentials for signing requests.
///
/// The secret is zeroized on drop and redacted in Debug output.
#[derive(ZeroizeOnDrop)]
pub struct Credential {
    #[zeroize(skip)]
    pub api_key: String,
    api_secret: Box<[u8]>,
    #[zeroize(skip)]
    last_nonce: AtomicU64,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Credential))
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// A signed header set for one request.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub api_key: String,
    /// Base64 of the JSON payload
    pub payload: String,
    /// Hex HMAC-SHA384 of the base64 payload
    pub signature: String,
}

impl SignedRequest {
    /// Header names and values in wire form.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            ("X-GEMINI-APIKEY", self.api_key.as_str()),
            ("X-GEMINI-PAYLOAD", self.payload.as_str()),
            ("X-GEMINI-SIGNATURE", self.signature.as_str()),
        ]
    }
}

impl Credential {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret: api_secret.into_bytes().into_boxed_slice(),
            last_nonce: AtomicU64::new(0),
        }
    }

    /// Sign a request path with a fresh nonce and extra payload fields.
    pub fn sign_request(&self, request: &str, payload: Map<String, Value>) -> SignedRequest {
        self.sign_with_nonce(request, payload, self.next_nonce())
    }

    /// Sign with an explicit nonce. The payload always carries `request`
    /// and `nonce`; extra fields ride alongside.
    pub fn sign_with_nonce(
        &self,
        request: &str,
        mut payload: Map<String, Value>,
        nonce: u64,
    ) -> SignedRequest {
        payload.insert("request".to_string(), Value::from(request));
        payload.insert("nonce".to_string(), Value::from(nonce));

        let body = Value::Object(payload).to_string();
        let encoded = BASE64_STANDARD.encode(body.as_bytes());

        let key = hmac::Key::new(hmac::HMAC_SHA384, &self.api_secret);
        let tag = hmac::sign(&key, encoded.as_bytes());

        SignedRequest {
            api_key: self.api_key.clone(),
            payload: encoded,
            signature: hex::encode(tag.as_ref()),
        }
    }

    /// Wall-clock milliseconds, bumped past the previous nonce so two
    /// calls in the same millisecond still increase.
    fn next_nonce(&self) -> u64 {
        let now = Utc::now().timestamp_millis() as u64;
        let mut prev = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self.last_nonce.compare_exchange_weak(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }
}
