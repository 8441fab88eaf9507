//! Test application factory for integration tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use maimai_render::error::CaptureError;
use maimai_render::models::CapturedImage;
use maimai_render::server::{build_router, AppState};
use maimai_render::services::SnapshotCapturer;

use super::fixtures;

/// What the fake capturer does when asked for a snapshot
#[derive(Clone)]
pub enum FakeOutcome {
    Png(Vec<u8>),
    NavigationFails(String),
    RenderTimeout,
    NoCanvas,
}

/// Capturer that never starts a browser and records every URL it is given
pub struct FakeCapturer {
    outcome: FakeOutcome,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCapturer {
    pub fn new(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FakeOutcome::Png(fixtures::png_bytes(64, 32)))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotCapturer for FakeCapturer {
    async fn capture(&self, render_url: &str) -> Result<CapturedImage, CaptureError> {
        self.calls.lock().unwrap().push(render_url.to_string());

        match &self.outcome {
            FakeOutcome::Png(bytes) => CapturedImage::from_png(bytes.clone()),
            FakeOutcome::NavigationFails(reason) => Err(CaptureError::Navigation(reason.clone())),
            FakeOutcome::RenderTimeout => Err(CaptureError::RenderTimeout {
                waited_ms: 45000,
                state: serde_json::json!({
                    "renderComplete": null,
                    "canvasPresent": true,
                    "fabricLoaded": false,
                    "lastError": "Fabric.js not loaded",
                    "readyState": "complete"
                }),
            }),
            FakeOutcome::NoCanvas => Err(CaptureError::ElementNotFound {
                selector: "canvas".to_string(),
                canvas_count: 0,
                content: serde_json::json!({
                    "bodyHTML": "<div>Snapshot not found</div>",
                    "canvasCount": 0,
                    "hasRenderStatus": false
                }),
            }),
        }
    }
}

/// Test application with router and direct access to the capturer
pub struct TestApp {
    router: axum::Router,
    pub capturer: Arc<FakeCapturer>,
}

impl TestApp {
    /// Create a test application whose captures succeed
    pub fn new() -> Self {
        Self::with_capturer(FakeCapturer::succeeding())
    }

    /// Create a test application around a specific fake capturer
    pub fn with_capturer(capturer: FakeCapturer) -> Self {
        let capturer = Arc::new(capturer);
        let state = AppState::with_capturer(capturer.clone());

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, capturer }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// POST an export request for the given render URL
    pub async fn export(&self, render_url: &str) -> TestResponse {
        self.post_json("/export-image", &fixtures::export_body(render_url))
            .await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get a header value as string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
