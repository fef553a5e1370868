//! Upstash Redis over its REST command API.
//!
//! Every command is a `POST` of a JSON array (`["GET", key]`) to the database
//! URL, authorized with the database's bearer token. Replies are
//! `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CredentialStore, TokenRecord};
use crate::error::StoreError;

/// Credential store backed by Upstash Redis.
#[derive(Clone)]
pub struct UpstashStore {
    client: Client,
    url: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashStore {
    pub fn new(client: Client, url: Option<String>, token: Option<String>) -> Self {
        Self { client, url, token }
    }

    async fn command(&self, args: Value) -> Result<Value, StoreError> {
        let url = self
            .url
            .as_deref()
            .ok_or(StoreError::NotConfigured("KV_REST_API_URL"))?;
        let token = self
            .token
            .as_deref()
            .ok_or(StoreError::NotConfigured("KV_REST_API_TOKEN"))?;

        let res = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&args)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return match serde_json::from_str::<CommandResponse>(&body) {
                Ok(CommandResponse { error: Some(e), .. }) => Err(StoreError::Command(e)),
                _ => Err(StoreError::Status(status)),
            };
        }

        let body: CommandResponse = res.json().await?;
        match body.error {
            Some(e) => Err(StoreError::Command(e)),
            None => Ok(body.result),
        }
    }
}

#[async_trait]
impl CredentialStore for UpstashStore {
    /// An undecodable record reads as absent so the next token write replaces it.
    async fn get(&self, key: &str) -> Result<Option<TokenRecord>, StoreError> {
        let decoded = match self.command(json!(["GET", key])).await? {
            Value::Null => return Ok(None),
            Value::String(raw) => serde_json::from_str(&raw),
            other => serde_json::from_value(other),
        };
        match decoded {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                // Only the error position is logged; the message may quote token material.
                tracing::warn!(
                    key,
                    category = ?e.classify(),
                    line = e.line(),
                    column = e.column(),
                    "stored token record is undecodable, treating it as absent"
                );
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, record: &TokenRecord, ttl_secs: u64) -> Result<(), StoreError> {
        let value = serde_json::to_string(record).map_err(|_| StoreError::Encode)?;
        match self.command(json!(["SET", key, value, "EX", ttl_secs])).await? {
            Value::String(ref s) if s == "OK" => Ok(()),
            other => Err(StoreError::Command(format!("unexpected SET reply: {}", other))),
        }
    }
}
