//! Telemetry configuration

use crate::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Global enable/disable toggle
    pub enabled: bool,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,

    pub format: LogFormat,

    pub console_enabled: bool,

    /// Write a daily-rolling log file as well
    pub file_enabled: bool,

    pub log_dir: PathBuf,

    /// Base filename; the date is appended by the rolling appender
    pub log_file_name: String,

    /// Include source location in logs
    pub include_location: bool,

    /// Include thread names/IDs
    pub include_thread_info: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::Config {
                message: format!("Unknown log level '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON format
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::Config {
                message: format!("Unknown log format '{}'", other),
            }),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let log_dir = Self::default_log_dir().unwrap_or_else(|_| PathBuf::from("./logs"));

        Self {
            enabled: true,
            logging: LoggingConfig {
                level: LogLevel::Info,
                format: LogFormat::Compact,
                console_enabled: true,
                file_enabled: false,
                log_dir,
                log_file_name: "tutorbot.log".to_string(),
                include_location: false,
                include_thread_info: false,
            },
        }
    }
}

impl TelemetryConfig {
    pub fn load_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TUTORBOT_LOG_LEVEL") {
            if let Ok(level) = level.parse() {
                self.logging.level = level;
            }
        }

        if let Ok(format) = std::env::var("TUTORBOT_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.logging.format = format;
            }
        }

        self.enabled = env_flag("TUTORBOT_TELEMETRY", self.enabled);
        self.logging.console_enabled = env_flag("TUTORBOT_LOG_CONSOLE", self.logging.console_enabled);
        self.logging.file_enabled = env_flag("TUTORBOT_FILE_LOGGING", self.logging.file_enabled);
        self.logging.include_location =
            env_flag("TUTORBOT_LOG_LOCATION", self.logging.include_location);
        self.logging.include_thread_info =
            env_flag("TUTORBOT_LOG_THREADS", self.logging.include_thread_info);

        if let Ok(dir) = std::env::var("TUTORBOT_LOG_DIR") {
            self.logging.log_dir = PathBuf::from(dir);
        }
    }

    fn default_log_dir() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "tutorbot", "tutorbot").ok_or_else(|| Error::Config {
                message: "Could not determine log directory".to_string(),
            })?;

        Ok(project_dirs.data_dir().join("logs"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.logging.file_enabled {
            if self.logging.log_file_name.trim().is_empty() {
                return Err(Error::Config {
                    message: "log_file_name must not be empty".to_string(),
                });
            }

            std::fs::create_dir_all(&self.logging.log_dir)?;

            let probe = self.logging.log_dir.join(".tutorbot_write_test");
            std::fs::write(&probe, "test")?;
            std::fs::remove_file(&probe)?;
        }

        Ok(())
    }
}

/// Boolean env var; unset or unparseable values keep `current`.
fn env_flag(name: &str, current: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(current)
}
