use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{ExportFilename, ExportRequest};
use crate::services::SnapshotCapturer;

/// Render a snapshot page and download its canvas as PNG
///
/// Starts a headless browser, loads `renderUrl`, waits for the page to set
/// `window.renderComplete`, and returns the canvas bitmap as an attachment.
#[utoipa::path(
    post,
    path = "/export-image",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "PNG image of the rendered canvas", content_type = "image/png"),
        (status = 400, description = "Render URL missing from the request body"),
        (status = 500, description = "Browser capture failed"),
    ),
    tag = "Export"
)]
pub async fn handle_export_image(
    State(capturer): State<Arc<dyn SnapshotCapturer>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let render_url = ExportRequest::render_url_from_body(&body).ok_or_else(|| {
        tracing::error!("No render URL provided");
        ApiError::MissingRenderUrl
    })?;

    // Runs detached so a dropped client connection cannot abort the browser
    // mid-teardown
    let url = render_url.clone();
    let image = tokio::spawn(async move { capturer.capture(&url).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Capture task failed: {e}")))?
        .map_err(|e| {
            tracing::error!(%e, "Failed to generate image");
            ApiError::Capture(e)
        })?;

    let filename =
        ExportFilename::from_render_url(&render_url, chrono::Utc::now().timestamp());

    tracing::info!(
        filename = %filename.file_name(),
        size_bytes = image.len(),
        "Export completed"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, filename.content_disposition()),
            (header::CONTENT_LENGTH, image.len().to_string()),
        ],
        Bytes::from(image.into_bytes()),
    )
        .into_response())
}
