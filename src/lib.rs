//! MaiMai Render Server
//!
//! Turns a snapshot render page into a PNG by driving headless Chromium.
//! This library exposes modules for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
