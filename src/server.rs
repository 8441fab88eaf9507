//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    body::Bytes,
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{ChromeCapturer, SnapshotCapturer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub capturer: Arc<dyn SnapshotCapturer>,
}

impl AppState {
    /// State backed by an arbitrary capturer (used by tests)
    pub fn with_capturer(capturer: Arc<dyn SnapshotCapturer>) -> Self {
        Self { capturer }
    }
}

/// Create application state that captures with headless Chromium.
pub fn create_app_state(config: &AppConfig) -> AppState {
    AppState {
        capturer: Arc::new(ChromeCapturer::new(config.capture.clone())),
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::handle_root))
        .route("/health", get(api::handle_health))
        .route("/export-image", post(handle_export_image))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// Wrapper handler to extract the capturer for the underlying API handler

async fn handle_export_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    api::handle_export_image(State(state.capturer), body).await
}
