//! Global subscriber setup

use crate::{
    config::{LogFormat, TelemetryConfig},
    Error, Result,
};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

pub struct TelemetrySystem;

/// Keeps the background log writer alive; drop it last so buffered lines are flushed.
pub struct TelemetryGuard {
    _file_guard: Option<WorkerGuard>,
}

impl TelemetrySystem {
    /// Install the global tracing subscriber described by `config`.
    pub fn init(config: TelemetryConfig) -> Result<TelemetryGuard> {
        config.validate()?;

        let (file_layer, file_guard) = match Self::build_file_layer(&config) {
            Some((layer, guard)) => (Some(layer), Some(guard)),
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(Self::build_env_filter(&config)?)
            .with(Self::build_console_layer(&config))
            .with(file_layer)
            .try_init()
            .map_err(|e| Error::System {
                message: format!("Failed to initialize tracing subscriber: {}", e),
            })?;

        tracing::debug!(
            telemetry.event = "system_initialized",
            telemetry.version = env!("CARGO_PKG_VERSION"),
            format = ?config.logging.format,
            file_logging = config.logging.file_enabled,
            "Telemetry initialized"
        );

        Ok(TelemetryGuard {
            _file_guard: file_guard,
        })
    }

    fn build_env_filter(config: &TelemetryConfig) -> Result<EnvFilter> {
        if let Ok(env_filter) = std::env::var("RUST_LOG") {
            return EnvFilter::try_new(env_filter).map_err(|e| Error::Config {
                message: format!("Invalid RUST_LOG: {}", e),
            });
        }

        if !config.enabled {
            return Ok(EnvFilter::new("off"));
        }

        let level: Level = config.logging.level.into();
        let directives = format!("{},hyper=warn,reqwest=warn,h2=warn", level);
        EnvFilter::try_new(directives).map_err(|e| Error::Config {
            message: format!("Invalid log filter: {}", e),
        })
    }

    fn build_console_layer<S>(config: &TelemetryConfig) -> Option<BoxedLayer<S>>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static,
    {
        if !config.enabled || !config.logging.console_enabled {
            return None;
        }

        let logging = &config.logging;
        let layer = match logging.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_target(true)
                .with_file(logging.include_location)
                .with_line_number(logging.include_location)
                .with_thread_ids(logging.include_thread_info)
                .with_thread_names(logging.include_thread_info)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(logging.include_location)
                .with_line_number(logging.include_location)
                .with_thread_ids(logging.include_thread_info)
                .with_thread_names(logging.include_thread_info)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_target(false)
                .with_file(logging.include_location)
                .with_line_number(logging.include_location)
                .with_thread_ids(logging.include_thread_info)
                .with_thread_names(logging.include_thread_info)
                .boxed(),
        };

        Some(layer)
    }

    fn build_file_layer<S>(config: &TelemetryConfig) -> Option<(BoxedLayer<S>, WorkerGuard)>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + Send + Sync + 'static,
    {
        if !config.enabled || !config.logging.file_enabled {
            return None;
        }

        let logging = &config.logging;
        let appender = tracing_appender::rolling::daily(&logging.log_dir, &logging.log_file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        // Files are always JSON so they can be shipped and queried.
        let layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_file(logging.include_location)
            .with_line_number(logging.include_location)
            .with_thread_ids(logging.include_thread_info)
            .with_thread_names(logging.include_thread_info)
            .boxed();

        Some((layer, guard))
    }
}
