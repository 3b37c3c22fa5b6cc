//! # Tutorbot Telemetry
//!
//! Structured logging for the bot, built on `tracing`.
//!
//! - console output as JSON, pretty or compact lines
//! - optional daily-rolling log files written off the hot path
//! - `RUST_LOG` overrides the configured level
//!
//! ```no_run
//! use tutorbot_telemetry::{TelemetryConfig, TelemetrySystem};
//!
//! let _guard = TelemetrySystem::init(TelemetryConfig::default()).unwrap();
//! tracing::info!("Application started");
//! ```

pub mod config;
pub mod system;

pub use config::{LogFormat, LogLevel, LoggingConfig, TelemetryConfig};
pub use system::{TelemetryGuard, TelemetrySystem};

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Telemetry system error: {message}")]
    System { message: String },
}
