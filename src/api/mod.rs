pub mod export;
pub mod info;

pub use export::{__path_handle_export_image, handle_export_image};
pub use info::{__path_handle_health, __path_handle_root, handle_health, handle_root};
pub use info::{EndpointList, HealthResponse, ServiceInfo};
