pub mod config;
pub mod snapshot;

pub use config::{AppConfig, CaptureConfig, ServerConfig};
pub use snapshot::{CapturedImage, ExportFilename, ExportRequest};
