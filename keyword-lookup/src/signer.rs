//! HMAC request signing for the keyword tool API.
//!
//! The signed message is `"{timestamp}.{method}.{path}"` and the signature is the
//! standard base64 encoding of its HMAC-SHA256 digest.
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

pub fn sign(secret_key: &[u8], timestamp: &str, method: &str, path: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key).expect("HMAC can take key of any size");
    mac.update(format!("{timestamp}.{method}.{path}").as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Milliseconds since the unix epoch, as sent in the `X-Timestamp` header.
pub fn current_timestamp_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

#[derive(Clone)]
pub struct RequestSigner {
    secret_key: String,
}

impl RequestSigner {
    pub fn new<S: Into<String>>(secret_key: S) -> Self {
        RequestSigner {
            secret_key: secret_key.into(),
        }
    }

    pub fn sign(&self, timestamp: &str, method: &str, path: &str) -> String {
        sign(self.secret_key.as_bytes(), timestamp, method, path)
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
