use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the credential store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("credential store is not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("credential store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("credential store returned {0}")]
    Status(reqwest::StatusCode),

    #[error("credential store command failed: {0}")]
    Command(String),

    #[error("token record could not be encoded")]
    Encode,
}

/// Failures obtaining an access token.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Read or write against the credential store failed.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// The credential endpoint answered with a non-2xx status.
    #[error("token endpoint returned {0}")]
    UpstreamAuth(reqwest::StatusCode),

    /// Network failure or unparseable body from the credential endpoint.
    #[error("token exchange failed: {0}")]
    Exchange(String),
}

/// Failures of the two relayed catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("authentication failed: {0}")]
    AuthFailure(#[from] AuthError),

    #[error("upstream search failed: {reason}")]
    UpstreamSearch {
        status: Option<reqwest::StatusCode>,
        reason: String,
    },

    #[error("stream resolution failed: {0}")]
    StreamResolution(String),
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Catalog(CatalogError),
    BadRequest(String),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Catalog(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, detail) = match &self {
            AppError::Catalog(e @ CatalogError::AuthFailure(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "search unavailable, try again",
                Some(e.to_string()),
            ),
            AppError::Catalog(e @ CatalogError::UpstreamSearch { status, .. }) => {
                tracing::debug!(upstream_status = ?status, "upstream search rejected");
                (
                    StatusCode::BAD_GATEWAY,
                    "search unavailable, try again",
                    Some(e.to_string()),
                )
            }
            AppError::Catalog(e @ CatalogError::StreamResolution(_)) => (
                StatusCode::BAD_GATEWAY,
                "playback unavailable, try again",
                Some(e.to_string()),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str(), None),
        };
        if let AppError::Catalog(e) = &self {
            tracing::warn!(error = %e, "request failed");
        }
        (
            status,
            Json(json!({ "error": message, "detail": detail })),
        )
            .into_response()
    }
}
