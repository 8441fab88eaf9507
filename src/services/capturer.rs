use crate::error::CaptureError;
use crate::models::CapturedImage;
use async_trait::async_trait;

/// Something that turns a render URL into a PNG of the page's canvas
#[async_trait]
pub trait SnapshotCapturer: Send + Sync {
    /// Render the page at `render_url` and capture its canvas.
    async fn capture(&self, render_url: &str) -> Result<CapturedImage, CaptureError>;
}
