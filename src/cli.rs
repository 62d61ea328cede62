//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Priority;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

/// FinSight - GRPV stock scoring and market-intelligence card analytics
///
/// Scores stock symbols on Growth, Risk, Profitability and Valuation, and
/// aggregates trading, contract, lobbying, patent and sentiment cards into
/// data-health indicators, correlations, insights and alerts.
///
/// Examples:
///   finsight --input ./snapshots
///   finsight --input snapshot.json --format json --output report.json
///   finsight --demo --seed 7 --as-of 2026-06-30T00:00:00Z
///   finsight --input ./snapshots --fail-on high
///   finsight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Snapshot file or directory of .json snapshots
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present_any = ["init_config", "demo"],
        conflicts_with = "demo"
    )]
    pub input: Option<PathBuf>,

    /// Use a generated demo snapshot instead of --input
    #[arg(long)]
    pub demo: bool,

    /// Seed for the demo snapshot
    #[arg(long, default_value = "42", value_name = "N", env = "FINSIGHT_SEED")]
    pub seed: u64,

    /// Output file path for the report
    ///
    /// Defaults to general.output from the config file (finsight_report.md).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .finsight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of subjects scored concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Score cache file, loaded before and saved after the run
    #[arg(long, value_name = "FILE", env = "FINSIGHT_CACHE")]
    pub cache: Option<PathBuf>,

    /// Hours a cached score stays fresh
    #[arg(long, value_name = "HOURS")]
    pub cache_ttl_hours: Option<i64>,

    /// Evaluation instant (RFC 3339)
    ///
    /// Overrides the snapshot's as_of. Defaults to the current time.
    #[arg(long, value_name = "RFC3339")]
    pub as_of: Option<DateTime<Utc>>,

    /// Directory names skipped when walking --input (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Fail if alerts at or above this priority are raised
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: critical, high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Minimum priority of insights and alerts to include in the report
    ///
    /// Values: critical, high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub min_priority: Option<FailOnLevel>,

    /// Dry run: load the input and show what would be scored, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .finsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Priority level for --fail-on and --min-priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl From<FailOnLevel> for Priority {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Priority::Low,
            FailOnLevel::Medium => Priority::Medium,
            FailOnLevel::High => Priority::High,
            FailOnLevel::Critical => Priority::Critical,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() && !self.demo {
            return Err("Either --input or --demo is required".to_string());
        }

        if let Some(concurrency) = self.concurrency {
            if concurrency == 0 {
                return Err("Concurrency must be at least 1".to_string());
            }
        }

        if let Some(ttl) = self.cache_ttl_hours {
            if ttl < 0 {
                return Err("Cache TTL must not be negative".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Log level once the config file's `general.verbose` is known.
    /// `--quiet` still wins over a verbose config.
    pub fn log_level_with_config(&self, config_verbose: bool) -> tracing::Level {
        if config_verbose && !self.quiet {
            tracing::Level::DEBUG
        } else {
            self.log_level()
        }
    }

    /// Human-readable name of the input, used in the report metadata.
    pub fn source_label(&self) -> String {
        match self.input {
            Some(ref path) => path.display().to_string(),
            None => format!("demo (seed {})", self.seed),
        }
    }
}
