//! CLI argument definitions for `ledger-audit`.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use audit_model::RiskTier;
use audit_score::Normalization;
use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use crate::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "ledger-audit",
    version,
    about = "Ledger anomaly detection and risk scoring",
    long_about = "Score a parsed ledger extract for anomalies.\n\n\
                  Input is a JSON document with column_names, rows and an optional\n\
                  column_mapping. Columns are detected automatically, data quality is\n\
                  assessed, statistical tests run and a 0-100 risk score is reported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings implied by the global flags.
    ///
    /// `--log-level` beats `-v`/`-q`, and either one disables `RUST_LOG`.
    pub fn log_config(&self) -> LogConfig {
        let mut config = match self.log_level {
            Some(level) => LogConfig::default().with_level(level.into()),
            None if self.verbosity.is_present() => {
                LogConfig::default().with_level(self.verbosity.tracing_level_filter())
            }
            None => LogConfig::default(),
        };
        config.format = self.log_format.into();
        config.log_file.clone_from(&self.log_file);
        config.ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stderr().is_terminal(),
        };
        config
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a parsed journal entry extract.
    Analyze(AnalyzeArgs),

    /// List the journal entry column profile.
    Profile,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// JSON input with column_names, rows and optional column_mapping.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// JSON options file; flags below override its values.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write the full JSON report to this file.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// What to print on stdout.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Base score normalization.
    #[arg(long = "normalization", value_enum)]
    pub normalization: Option<NormalizationArg>,

    /// Distinct tests that must flag a row before the score is escalated.
    #[arg(long = "multi-flag-threshold", value_name = "N")]
    pub multi_flag_threshold: Option<usize>,

    /// Draw this fraction of each stratum.
    #[arg(long = "sample-rate", value_name = "RATE", conflicts_with = "sample_per_stratum")]
    pub sample_rate: Option<f64>,

    /// Draw this many rows from each stratum.
    #[arg(long = "sample-per-stratum", value_name = "N")]
    pub sample_per_stratum: Option<usize>,

    /// Stratify the sample by these keys (amount_band, month, account).
    #[arg(long = "stratify-by", value_name = "KEY")]
    pub stratify_by: Vec<String>,

    /// Seed for a reproducible sample.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Sample only rows flagged by at least one test.
    #[arg(long = "sample-flagged")]
    pub sample_flagged: bool,

    /// Exit with status 2 when the risk tier is at or above this tier.
    #[arg(long = "fail-on", value_enum, value_name = "TIER")]
    pub fail_on: Option<TierArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NormalizationArg {
    MaxPossible,
    TotalEntries,
}

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::MaxPossible => Normalization::MaxPossible,
            NormalizationArg::TotalEntries => Normalization::TotalEntries,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Low,
    Elevated,
    Moderate,
    High,
    Critical,
}

impl From<TierArg> for RiskTier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Low => RiskTier::Low,
            TierArg::Elevated => RiskTier::Elevated,
            TierArg::Moderate => RiskTier::Moderate,
            TierArg::High => RiskTier::High,
            TierArg::Critical => RiskTier::Critical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}
