pub mod browser;
pub mod capture;
pub mod capturer;
pub mod page_probe;
pub mod wait;

pub use browser::BrowserSession;
pub use capture::ChromeCapturer;
pub use capturer::SnapshotCapturer;
pub use wait::poll_until;
