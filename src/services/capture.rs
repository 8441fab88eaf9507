//! Canvas capture through headless Chromium.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::time::{Duration, Instant};

use crate::error::CaptureError;
use crate::models::{CaptureConfig, CapturedImage};
use crate::services::browser::BrowserSession;
use crate::services::capturer::SnapshotCapturer;
use crate::services::page_probe;
use crate::services::wait::poll_until;

/// Lifecycle event Chromium emits once no requests have been in flight
/// for a short quiet period
const NETWORK_IDLE: &str = "networkIdle";

/// Captures the canvas of a page in a fresh browser per call
pub struct ChromeCapturer {
    config: CaptureConfig,
}

impl ChromeCapturer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SnapshotCapturer for ChromeCapturer {
    async fn capture(&self, render_url: &str) -> Result<CapturedImage, CaptureError> {
        let started = Instant::now();
        tracing::info!(render_url, "Starting capture");

        let mut session = BrowserSession::launch(&self.config).await?;

        let result = match session.new_page().await {
            Ok(page) => capture_page(&page, render_url, &self.config).await,
            Err(e) => Err(e),
        };

        session.close().await;

        match &result {
            Ok(image) => {
                let (width, height) = image.dimensions();
                tracing::info!(
                    size_bytes = image.len(),
                    width,
                    height,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Capture completed"
                );
            }
            Err(e) => tracing::error!(
                %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Capture failed"
            ),
        }

        result
    }
}

async fn capture_page(
    page: &Page,
    render_url: &str,
    config: &CaptureConfig,
) -> Result<CapturedImage, CaptureError> {
    tracing::info!(render_url, "Navigating");
    let started = Instant::now();
    navigate(page, render_url, config.navigation_timeout()).await?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Navigation completed"
    );

    let title = page
        .evaluate("document.title")
        .await
        .ok()
        .and_then(|v| v.into_value::<String>().ok())
        .unwrap_or_default();
    tracing::info!(%title, "Page loaded");

    wait_for_render(page, config).await?;

    if !config.settle().is_zero() {
        tokio::time::sleep(config.settle()).await;
    }

    screenshot_canvas(page, config).await
}

/// Navigate and wait until the main frame's network goes idle.
async fn navigate(page: &Page, url: &str, timeout: Duration) -> Result<(), CaptureError> {
    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await?;
    // Subscribe first so the idle event cannot slip past
    let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;

    let navigation = async {
        let response = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| CaptureError::Navigation(format!("{url}: {e}")))?;
        let navigated = response.result;

        if let Some(error_text) = navigated.error_text {
            return Err(CaptureError::Navigation(format!("{url}: {error_text}")));
        }

        while let Some(event) = lifecycle.next().await {
            let same_load = navigated
                .loader_id
                .as_ref()
                .map_or(true, |id| *id == event.loader_id);
            if event.name == NETWORK_IDLE && event.frame_id == navigated.frame_id && same_load {
                return Ok(());
            }
        }

        Err(CaptureError::Navigation(format!(
            "{url}: page closed before the network went idle"
        )))
    };

    tokio::time::timeout(timeout, navigation)
        .await
        .map_err(|_| {
            CaptureError::Navigation(format!(
                "{url}: timed out after {}ms waiting for network idle",
                timeout.as_millis()
            ))
        })?
}

/// Wait for the page to raise its completion flag.
async fn wait_for_render(page: &Page, config: &CaptureConfig) -> Result<(), CaptureError> {
    tracing::info!(
        flag = %config.completion_flag,
        timeout_ms = config.render_timeout_ms,
        "Waiting for rendering to complete"
    );
    let started = Instant::now();
    let flag = config.completion_flag.as_str();

    let completed = poll_until(config.render_timeout(), config.poll_interval(), || {
        page_probe::is_render_complete(page, flag)
    })
    .await;

    let waited_ms = started.elapsed().as_millis() as u64;
    if completed {
        tracing::info!(elapsed_ms = waited_ms, "Rendering completed");
        return Ok(());
    }

    let state = page_probe::read_render_state(page, flag, &config.canvas_selector).await;
    tracing::error!(%state, waited_ms, "Rendering timeout");
    Err(CaptureError::RenderTimeout { waited_ms, state })
}

/// Whether a `find_element` failure means the selector matched nothing.
///
/// Chromium answers a lookup of the empty node id with a protocol error;
/// anything else is the connection or the browser failing.
fn is_missing_element(error: &CdpError) -> bool {
    matches!(error, CdpError::NotFound | CdpError::Chrome(_))
}

/// Capture exactly the canvas element as PNG.
async fn screenshot_canvas(
    page: &Page,
    config: &CaptureConfig,
) -> Result<CapturedImage, CaptureError> {
    let selector = config.canvas_selector.as_str();
    let started = Instant::now();

    let element = match page.find_element(selector).await {
        Ok(element) => element,
        Err(e) if !is_missing_element(&e) => {
            return Err(CaptureError::Capture(format!(
                "Failed to locate '{selector}': {e}"
            )));
        }
        Err(e) => {
            let (content, raw) = page_probe::read_page_content(page, selector).await;
            tracing::error!(%e, content = %raw, "Canvas element not found");
            return Err(CaptureError::ElementNotFound {
                selector: selector.to_string(),
                canvas_count: content.canvas_count,
                content: raw,
            });
        }
    };

    let bytes = tokio::time::timeout(
        config.screenshot_timeout(),
        element.screenshot(CaptureScreenshotFormat::Png),
    )
    .await
    .map_err(|_| {
        CaptureError::Capture(format!(
            "Screenshot timed out after {}ms",
            config.screenshot_timeout_ms
        ))
    })??;

    let image = CapturedImage::from_png(bytes)?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        size_bytes = image.len(),
        "Screenshot taken"
    );
    Ok(image)
}
