//! Logging and tracing setup for the `tabula` binary
//!
//! Console output goes to stderr so that stdout carries only the response.
//! JSON files roll daily in the log directory. `RUST_LOG` overrides the
//! configured filter.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Where daily JSON files go
    pub log_dir: PathBuf,
    pub json_files: bool,
    /// Human-readable lines on stderr
    pub console: bool,
    pub source_location: bool,
    /// Emit span open/close events, which carry busy/idle timings
    pub span_timing: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            json_files: true,
            console: true,
            source_location: cfg!(debug_assertions),
            span_timing: cfg!(debug_assertions),
            filter: "info,tabula_cli=debug,tabula_services=debug,tabula_query=debug,tabula_schema=debug,tabula_connection=debug,tabula_driver_sqlite=debug".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Warnings on the console, JSON logs for later inspection
    pub fn production() -> Self {
        Self {
            log_dir: log_directory(),
            json_files: true,
            console: true,
            source_location: false,
            span_timing: false,
            filter: "warn,tabula_services=info".to_string(),
        }
    }

    /// Verbose console output plus JSON logs
    pub fn development() -> Self {
        Self::default()
    }

    /// Preset for a `-v` count: 0 production, 1 development, 2+ everything
    pub fn for_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => Self::production(),
            1 => Self::development(),
            _ => Self {
                filter: "trace".to_string(),
                ..Self::development()
            },
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the JSON file writer; keep it alive until the
/// process exits.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.filter));

    // NEW fires once per span; ENTER would fire on every re-poll
    let span_events = if config.span_timing {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut guard = None;

    if config.console {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .with_span_events(span_events.clone())
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone())
            .boxed();
        layers.push(console_layer);
    }

    if config.json_files {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "tabula.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.json_files,
        console_enabled = config.console,
        "logging initialized"
    );
    Ok(guard)
}

/// Default log directory
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tabula")
        .join("logs")
}
