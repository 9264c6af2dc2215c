//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The libraries only emit events; this module installs the one global
//! subscriber for the `ledger-audit` binary.
//!
//! # Log Levels
//!
//! - `error`: Fatal errors
//! - `warn`: Skipped tests, failed statistical prechecks, ignored overrides
//! - `info`: Stage summaries (detection, quality, score, sample)
//! - `debug`: Per-field and per-test detail
//!
//! Cell values are never logged at any level.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Crates whose events follow the configured level.
const WORKSPACE_TARGETS: &[&str] = &[
    "audit_cli",
    "audit_core",
    "audit_ingest",
    "audit_map",
    "audit_model",
    "audit_sample",
    "audit_score",
    "audit_stats",
    "audit_validate",
];

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// Single line per event.
    Compact,
    /// One JSON object per event, with analysis span timings.
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` decide; cleared once a level is set explicitly.
    pub use_env_filter: bool,
    pub format: LogFormat,
    pub ansi: bool,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            format: LogFormat::default(),
            ansi: true,
            log_file: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn with_level(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self.use_env_filter = false;
        self
    }

    /// Filter directives for the workspace crates, other crates at warn.
    pub fn directives(&self) -> String {
        let level = self.level_filter.to_string().to_lowercase();
        let mut directives = vec!["warn".to_string()];
        directives.extend(WORKSPACE_TARGETS.iter().map(|target| format!("{target}={level}")));
        directives.join(",")
    }

    /// `RUST_LOG` wins only when no level was given on the command line.
    fn env_filter(&self) -> EnvFilter {
        if self.use_env_filter
            && let Ok(filter) = EnvFilter::try_from_default_env()
        {
            return filter;
        }
        EnvFilter::new(self.directives())
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let (writer, ansi) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(io::stderr), config.ansi),
    };

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .without_time()
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .without_time()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(config.env_filter())
        .init();
    Ok(())
}
