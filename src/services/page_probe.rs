//! Scripts evaluated inside the rendered page, and their typed results.
//!
//! The page under capture is expected to set `window.<flag> = true` once it
//! has finished drawing, and may leave an error message in
//! `window.lastError`. These probes read that contract back out.

use chromiumoxide::Page;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Upper bound for a single diagnostic read after a failure
const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of `<body>` characters included in not-found diagnostics
const BODY_EXCERPT_CHARS: usize = 500;

fn js_string(value: &str) -> String {
    // A JSON string literal is a valid JS string literal
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Expression that is `true` once the page has signalled completion.
pub fn completion_expression(flag: &str) -> String {
    format!("window[{}] === true", js_string(flag))
}

/// Expression describing the page state when the completion wait gives up.
pub fn render_state_expression(flag: &str, selector: &str) -> String {
    format!(
        r#"(() => ({{
    renderComplete: window[{flag}] === undefined ? null : window[{flag}],
    canvasPresent: !!document.querySelector({selector}),
    fabricLoaded: !!window.fabric,
    lastError: window.lastError === undefined ? null : String(window.lastError),
    readyState: document.readyState
}}))()"#,
        flag = js_string(flag),
        selector = js_string(selector),
    )
}

/// Expression describing page content when the capture target is missing.
pub fn page_content_expression(selector: &str) -> String {
    format!(
        r#"(() => ({{
    bodyHTML: document.body ? document.body.innerHTML.substring(0, {chars}) : null,
    canvasCount: document.querySelectorAll({selector}).length,
    hasRenderStatus: !!document.querySelector('#render-status')
}}))()"#,
        chars = BODY_EXCERPT_CHARS,
        selector = js_string(selector),
    )
}

/// Content diagnostics for a page without a capture target
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    #[serde(default, rename = "bodyHTML")]
    pub body_html: Option<String>,
    #[serde(default)]
    pub canvas_count: u64,
    #[serde(default)]
    pub has_render_status: bool,
}

/// Check the completion flag once.
pub async fn is_render_complete(
    page: &Page,
    flag: &str,
) -> Result<bool, chromiumoxide::error::CdpError> {
    let result = page.evaluate(completion_expression(flag)).await?;
    Ok(result.into_value::<bool>().unwrap_or(false))
}

/// Read the render-state diagnostics. Never fails: an unreadable page is
/// reported inside the returned value.
pub async fn read_render_state(page: &Page, flag: &str, selector: &str) -> Value {
    read_diagnostic(page, render_state_expression(flag, selector)).await
}

/// Read content diagnostics for a page where the target was not found.
pub async fn read_page_content(page: &Page, selector: &str) -> (PageContent, Value) {
    let raw = read_diagnostic(page, page_content_expression(selector)).await;
    let content = serde_json::from_value::<PageContent>(raw.clone()).unwrap_or_default();
    (content, raw)
}

async fn read_diagnostic(page: &Page, expression: String) -> Value {
    match tokio::time::timeout(DIAGNOSTIC_TIMEOUT, page.evaluate(expression)).await {
        Ok(Ok(result)) => result
            .into_value::<Value>()
            .unwrap_or_else(|e| serde_json::json!({ "diagnosticError": e.to_string() })),
        Ok(Err(e)) => serde_json::json!({ "diagnosticError": e.to_string() }),
        Err(_) => serde_json::json!({ "diagnosticError": "page did not answer" }),
    }
}
