//! Qiniu upload token signing.
//!
//! An upload token authorizes one form upload into a bucket until its
//! deadline. It is `access_key:signature:encoded_policy`, where the policy is
//! compact JSON encoded with URL-safe base64 and the signature is the
//! URL-safe base64 HMAC-SHA1 of the encoded policy under the secret key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, TimeZone};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

use super::error::StorageError;

type HmacSha1 = Hmac<Sha1>;

/// Upload policy limiting what a token may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutPolicy {
    /// Bucket (optionally `bucket:key`) the upload is restricted to.
    pub scope: String,
    /// Unix time in seconds after which the token is rejected.
    pub deadline: i64,
}

impl PutPolicy {
    /// Policy for `bucket`, valid for `ttl_secs` from `now`.
    #[must_use]
    pub fn new<Tz: TimeZone>(
        bucket: impl Into<String>,
        now: &DateTime<Tz>,
        ttl_secs: u64,
    ) -> Self {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        Self {
            scope: bucket.into(),
            deadline: now.timestamp().saturating_add(ttl),
        }
    }
}

/// Access/secret key pair.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[hidden]")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials from an access/secret key pair.
    #[must_use]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Returns the access key.
    #[must_use]
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// URL-safe base64 HMAC-SHA1 of `data` under the secret key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Token` if the HMAC cannot be keyed.
    pub fn sign(&self, data: &[u8]) -> Result<String, StorageError> {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| StorageError::Token(e.to_string()))?;
        mac.update(data);
        Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
    }

    /// Mints an upload token for `policy`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Token` if the policy cannot be serialized or signed.
    pub fn upload_token(&self, policy: &PutPolicy) -> Result<String, StorageError> {
        let json = serde_json::to_vec(policy).map_err(|e| StorageError::Token(e.to_string()))?;
        let encoded_policy = URL_SAFE.encode(json);
        let signature = self.sign(encoded_policy.as_bytes())?;

        Ok(format!("{}:{signature}:{encoded_policy}", self.access_key))
    }
}
