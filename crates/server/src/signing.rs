//! Signed download links.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Link expired")]
    Expired,

    #[error("Invalid signature")]
    Invalid,
}

/// Signs `(bucket, name, expiry)` triples with a shared key.
#[derive(Clone)]
pub struct UrlSigner {
    key: String,
    ttl_minutes: u32,
}

impl UrlSigner {
    pub fn new(key: impl Into<String>, ttl_minutes: u32) -> Self {
        Self {
            key: key.into(),
            ttl_minutes,
        }
    }

    pub fn ttl_minutes(&self) -> u32 {
        self.ttl_minutes
    }

    fn mac(&self, bucket: &str, name: &str, expires: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(bucket.as_bytes());
        mac.update(b"\n");
        mac.update(name.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    /// Hex HMAC-SHA256 over bucket, name and expiry.
    pub fn signature(&self, bucket: &str, name: &str, expires: i64) -> String {
        hex::encode(self.mac(bucket, name, expires).finalize().into_bytes())
    }

    /// Build a download URL valid for the configured TTL from `now`.
    pub fn sign(&self, base_url: &str, bucket: &str, name: &str, now: DateTime<Utc>) -> String {
        let expires = (now + Duration::minutes(i64::from(self.ttl_minutes))).timestamp();
        format!(
            "{}/files/{}/{}?expires={}&signature={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(bucket),
            urlencoding::encode(name),
            expires,
            self.signature(bucket, name, expires)
        )
    }

    /// Check a presented signature.
    pub fn verify(
        &self,
        bucket: &str,
        name: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        let presented = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;
        self.mac(bucket, name, expires)
            .verify_slice(&presented)
            .map_err(|_| SignatureError::Invalid)
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("key", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}
