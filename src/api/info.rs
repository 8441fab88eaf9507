use axum::response::{IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

pub const SERVICE_ID: &str = "maimai-render-server";
pub const SERVICE_NAME: &str = "MaiMai Render Server";

/// Response from the /health endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
    pub service: String,
}

/// Endpoint listing included in the service info
#[derive(Debug, Serialize, ToSchema)]
pub struct EndpointList {
    pub export: String,
    pub health: String,
}

/// Response from the / endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub endpoints: EndpointList,
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Service"
)]
pub async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_ID.to_string(),
    })
}

/// Service name, version and endpoints
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service metadata", body = ServiceInfo)),
    tag = "Service"
)]
pub async fn handle_root() -> impl IntoResponse {
    Json(ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointList {
            export: "/export-image (POST)".to_string(),
            health: "/health (GET)".to_string(),
        },
    })
}
