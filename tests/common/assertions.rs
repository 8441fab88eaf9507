//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a downloadable PNG with a matching Content-Length
pub fn assert_png_attachment(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );

    assert_eq!(
        response.header("content-type"),
        Some("image/png"),
        "Expected Content-Type: image/png"
    );

    let content_length: usize = response
        .header("content-length")
        .expect("Expected Content-Length header")
        .parse()
        .expect("Content-Length should be numeric");
    assert_eq!(content_length, response.body.len());

    let disposition = response
        .header("content-disposition")
        .expect("Expected Content-Disposition header");
    assert!(
        disposition.starts_with("attachment; filename=\"maimai-profile-snapshot-"),
        "Unexpected Content-Disposition: {disposition}"
    );
}

/// Assert the 400 response for a request without a render URL
pub fn assert_missing_url(response: &TestResponse) {
    assert_status(response, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "Render URL is required");
}

/// Assert a 500 capture failure and return its details string
pub fn assert_capture_failure(response: &TestResponse) -> String {
    assert_status(response, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "Failed to generate image");
    json["details"]
        .as_str()
        .expect("Expected details string")
        .to_string()
}

/// Extract the filename from a Content-Disposition header
pub fn attachment_filename(response: &TestResponse) -> String {
    let disposition = response
        .header("content-disposition")
        .expect("Expected Content-Disposition header");
    disposition
        .split("filename=\"")
        .nth(1)
        .and_then(|rest| rest.strip_suffix('"'))
        .expect("Expected quoted filename")
        .to_string()
}
