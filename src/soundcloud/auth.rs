//! Access token brokering for the SoundCloud API.
//!
//! The token is an application credential (client credentials flow) shared
//! by every request and every instance of the service. The credential store
//! is the source of truth; nothing is cached in process, so each call
//! re-reads the store.
//!
//! Lookup order: stored token if still valid, then a refresh exchange if the
//! stored record carries a refresh token, then a fresh client credentials
//! exchange. Concurrent callers that all miss may each acquire and overwrite
//! the record; any valid record serves every caller, so no lock is taken.

use std::sync::Arc;

use base64::Engine;
use reqwest::{header, Client, RequestBuilder};
use serde::Deserialize;

use crate::error::AuthError;
use crate::redact::redacted;
use crate::store::{CredentialStore, TokenRecord, TOKEN_KEY};

/// Subtracted from the issuer's lifetime for both `expires_at` and the store TTL.
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 60;

/// Lifetime to record for a token the issuer says lasts `expires_in` seconds.
///
/// Never zero, since the store rejects non-positive TTLs.
pub fn adjusted_lifetime_secs(expires_in: u64) -> u64 {
    expires_in.saturating_sub(TOKEN_EXPIRY_BUFFER_SECS).max(1)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u64,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    /// Build the record to store and its TTL in seconds.
    fn into_record(self, now_ms: i64) -> (TokenRecord, u64) {
        let ttl = adjusted_lifetime_secs(self.expires_in);
        let record = TokenRecord {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now_ms.saturating_add(
                i64::try_from(ttl).unwrap_or(i64::MAX).saturating_mul(1000),
            ),
            scope: self.scope.unwrap_or_default(),
        };
        (record, ttl)
    }
}

/// Obtains, stores and refreshes the shared SoundCloud access token.
pub struct TokenManager {
    http: Client,
    store: Arc<dyn CredentialStore>,
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: String,
}

impl TokenManager {
    pub fn new(
        http: Client,
        store: Arc<dyn CredentialStore>,
        client_id: Option<String>,
        client_secret: Option<String>,
        token_url: String,
    ) -> Self {
        Self {
            http,
            store,
            client_id,
            client_secret,
            token_url,
        }
    }

    /// Returns a currently valid access token.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let stored = self.store.get(TOKEN_KEY).await?;

        if let Some(record) = &stored {
            if record.is_valid_at(now_millis()) {
                tracing::debug!("using stored access token");
                return Ok(record.access_token.clone());
            }
        }

        if let Some(refresh_token) = stored.as_ref().and_then(TokenRecord::refresh_token) {
            match self.refresh(refresh_token).await {
                Ok(token) => return self.persist(token).await,
                Err(e) => tracing::warn!(error = %e, "token refresh failed, requesting a new token"),
            }
        }

        let token = self.client_credentials().await?;
        self.persist(token).await
    }

    fn credentials(&self) -> Result<(&str, &str), AuthError> {
        let id = self
            .client_id
            .as_deref()
            .ok_or(AuthError::MissingConfig("SOUNDCLOUD_CLIENT_ID"))?;
        let secret = self
            .client_secret
            .as_deref()
            .ok_or(AuthError::MissingConfig("SOUNDCLOUD_CLIENT_SECRET"))?;
        Ok((id, secret))
    }

    async fn client_credentials(&self) -> Result<TokenResponse, AuthError> {
        let (id, secret) = self.credentials()?;
        tracing::info!(
            client_id = %redacted(Some(id)),
            client_secret = %redacted(Some(secret)),
            "requesting client credentials token"
        );

        let auth = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", id, secret));
        let request = self
            .http
            .post(&self.token_url)
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")]);
        self.exchange(request, "client_credentials").await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let (id, secret) = self.credentials()?;
        tracing::info!(
            refresh_token = %redacted(Some(refresh_token)),
            "refreshing access token"
        );

        let request = self.http.post(&self.token_url).form(&[
            ("grant_type", "refresh_token"),
            ("client_id", id),
            ("client_secret", secret),
            ("refresh_token", refresh_token),
        ]);
        self.exchange(request, "refresh_token").await
    }

    async fn exchange(
        &self,
        request: RequestBuilder,
        grant: &'static str,
    ) -> Result<TokenResponse, AuthError> {
        let res = request
            .header(header::ACCEPT, "application/json; charset=utf-8")
            .send()
            .await
            .map_err(|e| AuthError::Exchange(format!("{} request failed: {}", grant, e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(grant, %status, body_len = body.len(), "token endpoint rejected request");
            return Err(AuthError::UpstreamAuth(status));
        }

        let body = res
            .text()
            .await
            .map_err(|e| AuthError::Exchange(format!("{} response unreadable: {}", grant, e)))?;
        // serde messages can quote token values, so only the error position is kept.
        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(
                grant,
                category = ?e.classify(),
                line = e.line(),
                column = e.column(),
                body_len = body.len(),
                "token response malformed"
            );
            AuthError::Exchange(format!("{} response malformed", grant))
        })
    }

    async fn persist(&self, token: TokenResponse) -> Result<String, AuthError> {
        let (record, ttl) = token.into_record(now_millis());
        self.store.set(TOKEN_KEY, &record, ttl).await?;
        tracing::info!(
            access_token = %redacted(Some(&record.access_token)),
            has_refresh_token = record.refresh_token().is_some(),
            ttl_secs = ttl,
            "stored new access token"
        );
        Ok(record.access_token)
    }
}
