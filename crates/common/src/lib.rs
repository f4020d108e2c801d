//! Shared building blocks for hookwatch
//!
//! Holds the captured-request model, configuration loading, platform
//! paths and clipboard access used by the capture engine, the relay
//! server and the terminal UI.

pub mod clipboard;
pub mod config;
pub mod model;
pub mod platform;

pub use config::{CaptureMode, Config, ConfigError};
pub use model::CapturedRequest;
