//! HTTP handlers for the SoundCloud search API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::soundcloud::{SoundCloudClient, Track};

/// Tracks per results page.
pub const RESULTS_PER_PAGE: u32 = 25;

/// Query parameters for search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query (required).
    #[serde(default)]
    pub q: String,
    /// 1-based page number.
    #[serde(default)]
    pub page: Option<u32>,
}

/// API response for track search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub page: u32,
    pub tracks: Vec<TrackResponse>,
    pub has_next_page: bool,
}

/// Single track in API response.
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
    pub duration_ms: u64,
    pub duration: String,
    pub genre: Option<String>,
    pub permalink_url: Option<String>,
    pub playback_count: u64,
    pub favoritings_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub track_id: String,
    pub url: String,
}

/// Render milliseconds as `m:ss`.
pub fn format_duration(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn track_to_response(t: &Track) -> TrackResponse {
    TrackResponse {
        id: t.id.to_string(),
        title: t.title.clone(),
        artist: t.user.username.clone(),
        artwork_url: t.display_artwork_url(),
        duration_ms: t.duration,
        duration: format_duration(t.duration),
        genre: t.genre.clone(),
        permalink_url: t.permalink_url.clone(),
        playback_count: t.playback_count.unwrap_or(0),
        favoritings_count: t.favoritings_count.unwrap_or(0),
        comment_count: t.comment_count.unwrap_or(0),
    }
}

/// GET /health - Health check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/search - Search SoundCloud for playable tracks.
pub async fn search(
    State(soundcloud): State<SoundCloudClient>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query 'q' is required and cannot be empty".into()));
    }

    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1).saturating_mul(RESULTS_PER_PAGE);

    let result = soundcloud
        .search_tracks(query, RESULTS_PER_PAGE, offset)
        .await?;

    let response = SearchResponse {
        query: query.to_string(),
        page,
        tracks: result.tracks.iter().map(track_to_response).collect(),
        has_next_page: result.has_next_page,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/tracks/:id/stream - Resolve a playable media URL.
pub async fn stream(
    State(soundcloud): State<SoundCloudClient>,
    Path(track_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let url = soundcloud.resolve_stream_url(&track_id).await?;
    Ok(Json(StreamResponse { track_id, url }))
}

/// Build the API router.
pub fn router() -> Router<SoundCloudClient> {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/search", get(search))
        .route("/api/v1/tracks/:id/stream", get(stream))
}
