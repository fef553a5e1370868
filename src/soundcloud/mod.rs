//! SoundCloud API client.
//!
//! Relays catalog search and stream URL resolution, authorized with the
//! shared application token from [`TokenManager`].

use std::sync::Arc;

use reqwest::{header, redirect, Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::CatalogError;

mod auth;
mod types;

pub use auth::TokenManager;
pub use types::{SearchPage, Track};

/// Redirects followed while resolving a stream before giving up.
const MAX_STREAM_HOPS: usize = 10;

/// SoundCloud API client.
#[derive(Clone)]
pub struct SoundCloudClient {
    client: Client,
    /// Never follows redirects itself, so the token only goes to the API origin.
    stream_client: Client,
    api_base: String,
    tokens: Arc<TokenManager>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    collection: Vec<Track>,
    #[serde(default)]
    next_href: Option<String>,
}

fn describe(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown")
    )
}

impl SoundCloudClient {
    pub fn new(
        client: Client,
        api_base: String,
        tokens: Arc<TokenManager>,
    ) -> Result<Self, reqwest::Error> {
        let stream_client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            stream_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn oauth(token: &str) -> String {
        format!("OAuth {}", token)
    }

    /// Search playable tracks. Results are returned in upstream order.
    pub async fn search_tracks(
        &self,
        q: &str,
        limit: u32,
        offset: u32,
    ) -> Result<SearchPage, CatalogError> {
        let token = self.tokens.access_token().await?;

        let url = format!(
            "{}/tracks?q={}&limit={}&offset={}&access=playable&linked_partitioning=true",
            self.api_base,
            urlencoding::encode(q),
            limit.max(1),
            offset,
        );

        let res = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json; charset=utf-8")
            .header(header::AUTHORIZATION, Self::oauth(&token))
            .send()
            .await
            .map_err(|e| CatalogError::UpstreamSearch {
                status: None,
                reason: format!("search request failed: {}", e.without_url()),
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(%status, body_len = body.len(), "search rejected upstream");
            return Err(CatalogError::UpstreamSearch {
                status: Some(status),
                reason: describe(status),
            });
        }

        let body: SearchResponse = res.json().await.map_err(|e| CatalogError::UpstreamSearch {
            status: Some(status),
            reason: format!("search parse failed: {}", e.without_url()),
        })?;

        let has_next_page = body.next_href.map_or(false, |href| !href.is_empty());
        tracing::debug!(
            results = body.collection.len(),
            has_next_page,
            offset,
            "search complete"
        );
        Ok(SearchPage {
            tracks: body.collection,
            has_next_page,
        })
    }

    /// Resolve the short-lived media URL a track streams from.
    ///
    /// The stream endpoint redirects to a signed CDN location, which may
    /// redirect again. Every hop is followed, but the `OAuth` header is only
    /// sent to the API origin. The first non-redirect location is returned;
    /// its body is never read. Each call yields a fresh grant.
    pub async fn resolve_stream_url(&self, track_id: &str) -> Result<String, CatalogError> {
        let token = self.tokens.access_token().await?;

        let mut url = Url::parse(&format!(
            "{}/tracks/{}/stream",
            self.api_base,
            urlencoding::encode(track_id)
        ))
        .map_err(|e| CatalogError::StreamResolution(format!("invalid stream url: {}", e)))?;
        let api_origin = url.origin();

        for _ in 0..MAX_STREAM_HOPS {
            let mut request = self.stream_client.get(url.clone());
            if url.origin() == api_origin {
                request = request.header(header::AUTHORIZATION, Self::oauth(&token));
            }
            let res = request.send().await.map_err(|e| {
                CatalogError::StreamResolution(format!("stream request failed: {}", e.without_url()))
            })?;

            let status = res.status();
            if status.is_redirection() {
                let location = res
                    .headers()
                    .get(header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        CatalogError::StreamResolution(format!("{} without a location", describe(status)))
                    })?;
                url = url.join(location).map_err(|e| {
                    CatalogError::StreamResolution(format!("invalid redirect location: {}", e))
                })?;
                continue;
            }

            if status.is_success() {
                tracing::debug!(track_id, host = url.host_str(), "resolved stream url");
                return Ok(url.to_string());
            }
            return Err(CatalogError::StreamResolution(describe(status)));
        }

        Err(CatalogError::StreamResolution(format!(
            "more than {} redirects",
            MAX_STREAM_HOPS
        )))
    }
}
