use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Render URL is required")]
    MissingRenderUrl,

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single capture. None of these are retried.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Rendering timeout after {waited_ms}ms: {state}")]
    RenderTimeout {
        waited_ms: u64,
        /// Snapshot of the page globals at the moment the wait gave up
        state: serde_json::Value,
    },

    #[error("Canvas element not found (selector '{selector}', {canvas_count} canvas elements on page): {content}")]
    ElementNotFound {
        selector: String,
        canvas_count: u64,
        content: serde_json::Value,
    },

    #[error("Capture failed: {0}")]
    Capture(String),
}

/// Configuration problem that was worked around with a default
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Ignoring invalid value {value:?} for {variable}")]
    InvalidEnv { variable: String, value: String },
}

impl From<chromiumoxide::error::CdpError> for CaptureError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        CaptureError::Capture(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingRenderUrl => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Capture(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to generate image",
                    "details": e.to_string(),
                }),
            ),
            ApiError::Internal(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Failed to generate image",
                    "details": details,
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
