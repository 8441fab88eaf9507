//! Per-capture headless Chromium session.
//!
//! A [`BrowserSession`] owns one browser process, the task driving its CDP
//! connection, and a throwaway profile directory. Call [`BrowserSession::close`]
//! on every exit path; dropping an unclosed session still stops the CDP task,
//! kills the child process and removes the profile directory.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::cdp::browser_protocol::network::{EventLoadingFailed, EventRequestWillBeSent};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use crate::error::CaptureError;
use crate::models::CaptureConfig;

/// Flags every capture browser is started with
const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--enable-font-antialiasing",
];

/// Bound for each teardown step
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Name prefix of per-session profile directories
pub const PROFILE_PREFIX: &str = "maimai-render-";

/// Page emulation applied by chromiumoxide to every new page
fn viewport(config: &CaptureConfig) -> Viewport {
    Viewport {
        width: config.viewport_width,
        height: config.viewport_height,
        device_scale_factor: Some(config.device_scale_factor),
        emulating_mobile: false,
        is_landscape: false,
        has_touch: false,
    }
}

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    listeners: Vec<JoinHandle<()>>,
    // Declared last: removed only after the browser handle is gone
    profile_dir: TempDir,
}

impl BrowserSession {
    /// Launch a headless browser sized for the configured viewport.
    pub async fn launch(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let started = Instant::now();

        let mut profile = tempfile::Builder::new();
        profile.prefix(PROFILE_PREFIX);
        let profile_dir = match &config.profile_root {
            Some(root) => profile.tempdir_in(root),
            None => profile.tempdir(),
        }
        .map_err(|e| CaptureError::Capture(format!("Failed to create profile dir: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(config.viewport_width, config.viewport_height)
            .viewport(viewport(config))
            .user_data_dir(profile_dir.path())
            .args(
                LAUNCH_ARGS
                    .iter()
                    .map(|arg| arg.to_string())
                    .chain(config.extra_args.iter().cloned()),
            );
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder
            .build()
            .map_err(|e| CaptureError::Capture(format!("Invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CaptureError::Capture(format!("Failed to launch browser: {e}")))?;

        // Drives the CDP websocket; the session is dead without it
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(%e, "CDP handler event error");
                }
            }
        });

        let mut session = Self {
            browser,
            handler,
            listeners: Vec::new(),
            profile_dir,
        };

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            pid = ?session.process_id(),
            profile = %session.profile_dir().display(),
            "Browser launched"
        );

        Ok(session)
    }

    /// Open a blank page; the viewport and scale factor come from launch.
    pub async fn new_page(&mut self) -> Result<Page, CaptureError> {
        let page = self.browser.new_page("about:blank").await?;
        self.forward_page_events(&page).await?;

        Ok(page)
    }

    /// Mirror console output, uncaught exceptions and failed requests into
    /// the service log.
    async fn forward_page_events(&mut self, page: &Page) -> Result<(), CaptureError> {
        let mut console = page.event_listener::<EventConsoleApiCalled>().await?;
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = console.next().await {
                let text = event
                    .args
                    .iter()
                    .filter_map(|arg| {
                        arg.value
                            .as_ref()
                            .map(|v| match v {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            })
                            .or_else(|| arg.description.clone())
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                tracing::debug!(kind = ?event.r#type, %text, "Browser console");
            }
        }));

        let mut exceptions = page.event_listener::<EventExceptionThrown>().await?;
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                tracing::warn!(%message, "Page error");
            }
        }));

        let mut requests = page.event_listener::<EventRequestWillBeSent>().await?;
        let mut failures = page.event_listener::<EventLoadingFailed>().await?;
        self.listeners.push(tokio::spawn(async move {
            let mut urls: HashMap<String, String> = HashMap::new();
            loop {
                tokio::select! {
                    Some(event) = requests.next() => {
                        urls.insert(event.request_id.inner().clone(), event.request.url.clone());
                    }
                    Some(event) = failures.next() => {
                        let url = urls
                            .remove(event.request_id.inner())
                            .unwrap_or_default();
                        tracing::warn!(%url, error = %event.error_text, "Request failed");
                    }
                    else => break,
                }
            }
        }));

        Ok(())
    }

    /// Close the browser and wait for its process to exit.
    pub async fn close(mut self) {
        let started = Instant::now();
        tracing::info!("Closing browser");

        match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.close()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(%e, "Browser close command failed"),
            Err(_) => tracing::warn!("Browser close command timed out"),
        }

        match tokio::time::timeout(CLOSE_TIMEOUT, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::warn!(%e, "Waiting for browser exit failed, killing");
                self.kill().await;
            }
            Err(_) => {
                tracing::warn!("Browser did not exit in time, killing");
                self.kill().await;
            }
        }

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Browser closed"
        );
    }

    /// OS process id of the browser, if it was spawned by this session
    pub fn process_id(&mut self) -> Option<u32> {
        self.browser
            .get_mut_child()
            .and_then(|child| child.as_mut_inner().id())
    }

    /// Directory holding this session's browser profile
    pub fn profile_dir(&self) -> &Path {
        self.profile_dir.path()
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = self.browser.kill().await {
            tracing::warn!(%e, "Failed to kill browser process");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        for listener in &self.listeners {
            listener.abort();
        }
        self.handler.abort();

        // Unclosed session: signal the process now so it is not writing
        // into the profile directory while that is removed
        if let Some(child) = self.browser.get_mut_child() {
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.as_mut_inner().start_kill() {
                    tracing::warn!(%e, "Failed to kill unclosed browser");
                }
            }
        }
    }
}
