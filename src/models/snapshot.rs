//! Request and filename types for snapshot exports.

use serde::Deserialize;
use std::io::Cursor;
use utoipa::ToSchema;

use crate::error::CaptureError;

const FILENAME_PREFIX: &str = "maimai-profile-";

/// Request body for `/export-image`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// URL of the page that draws the snapshot onto a canvas
    #[serde(default)]
    pub render_url: Option<String>,
}

impl ExportRequest {
    /// Parse a raw request body. Anything that is not a JSON object with a
    /// non-empty `renderUrl` yields `None`.
    pub fn render_url_from_body(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ExportRequest>(body)
            .ok()
            .and_then(|req| req.render_url)
            .filter(|url| !url.trim().is_empty())
    }
}

/// PNG bitmap of a captured element
#[derive(Debug, Clone)]
pub struct CapturedImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedImage {
    /// Wrap screenshot bytes, rejecting anything that is not a PNG.
    pub fn from_png(bytes: Vec<u8>) -> Result<Self, CaptureError> {
        let (width, height) = {
            let reader = png::Decoder::new(Cursor::new(bytes.as_slice()))
                .read_info()
                .map_err(|e| {
                    CaptureError::Capture(format!("Screenshot is not a valid PNG: {e}"))
                })?;
            (reader.info().width, reader.info().height)
        };

        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Attachment filename for an exported snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFilename {
    stem: String,
}

impl ExportFilename {
    /// Derive the filename from the render URL's `snapshotId` parameter,
    /// falling back to the given unix timestamp.
    pub fn from_render_url(render_url: &str, timestamp: i64) -> Self {
        let snapshot_id = url::Url::parse(render_url).ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "snapshotId")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty())
        });

        let stem = match snapshot_id {
            Some(id) => format!("snapshot-{}", sanitize(&id)),
            None => format!("snapshot-{timestamp}"),
        };

        Self { stem }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn file_name(&self) -> String {
        format!("{FILENAME_PREFIX}{}.png", self.stem)
    }

    /// Value for the `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name())
    }
}

/// Keep ids header-safe: anything outside `[A-Za-z0-9._-]` becomes `_`.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
