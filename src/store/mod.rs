//! Credential store holding the shared SoundCloud token record.
//!
//! The store is the only shared state between requests (and between
//! instances of the service). Records are always written whole together with
//! a store-side TTL so stale tokens evict themselves.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::redact::redacted;

#[cfg(test)]
pub mod memory;
pub mod upstash;

pub use upstash::UpstashStore;

/// Fixed key of the current token record.
pub const TOKEN_KEY: &str = "soundcloud_token";

/// The cached application credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch milliseconds, safety buffer already subtracted.
    pub expires_at: i64,
    #[serde(default)]
    pub scope: String,
}

impl TokenRecord {
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }

    /// Refresh token, if the issuer supplied a usable one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &redacted(Some(&self.access_token)))
            .field("refresh_token", &redacted(self.refresh_token.as_deref()))
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Key-value store for token records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, StoreError>;

    /// Replace the record under `key`, evicting it after `ttl_secs`.
    async fn set(&self, key: &str, record: &TokenRecord, ttl_secs: u64) -> Result<(), StoreError>;
}
