//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.finsight.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".finsight.toml";

/// Longest accepted recent window, in days (ten years).
pub const MAX_RECENT_WINDOW_DAYS: i64 = 3650;

/// Longest accepted score cache TTL, in hours (ten years).
pub const MAX_CACHE_TTL_HOURS: i64 = crate::scoring::cache::MAX_TTL_HOURS;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Subject scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Card aggregation settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Insight and alert thresholds.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of subjects scored concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "finsight_report.md".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Subject scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// How long a computed score stays fresh, in hours.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: i64,

    /// Where the score cache is persisted between runs. In-memory only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            cache_ttl_hours: default_cache_ttl_hours(),
            cache_path: None,
        }
    }
}

fn default_cache_ttl_hours() -> i64 {
    crate::scoring::cache::DEFAULT_TTL_HOURS
}

/// Card aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Width of the recent window, in days.
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,

    /// Number of windows in each correlation series.
    #[serde(default = "default_correlation_windows")]
    pub correlation_windows: usize,

    /// Card count that counts as full coverage.
    #[serde(default = "default_expected_cards")]
    pub expected_cards: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
            correlation_windows: default_correlation_windows(),
            expected_cards: default_expected_cards(),
        }
    }
}

fn default_recent_window_days() -> i64 {
    30
}

fn default_correlation_windows() -> usize {
    6
}

fn default_expected_cards() -> usize {
    5
}

/// Thresholds for the insight and alert rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_compliance_target")]
    pub compliance_target: f64,

    #[serde(default = "default_compliance_excellent")]
    pub compliance_excellent: f64,

    /// Potential conflicts tolerated per card before alerting.
    #[serde(default = "default_conflict_limit")]
    pub conflict_limit: usize,

    #[serde(default = "default_data_quality_floor")]
    pub data_quality_floor: f64,

    #[serde(default = "default_freshness_floor")]
    pub freshness_floor: f64,

    #[serde(default = "default_card_compliance_floor")]
    pub card_compliance_floor: f64,

    /// Minimum |r| reported as a strong correlation.
    #[serde(default = "default_correlation_floor")]
    pub correlation_floor: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            compliance_target: default_compliance_target(),
            compliance_excellent: default_compliance_excellent(),
            conflict_limit: default_conflict_limit(),
            data_quality_floor: default_data_quality_floor(),
            freshness_floor: default_freshness_floor(),
            card_compliance_floor: default_card_compliance_floor(),
            correlation_floor: default_correlation_floor(),
        }
    }
}

fn default_compliance_target() -> f64 {
    80.0
}

fn default_compliance_excellent() -> f64 {
    95.0
}

fn default_conflict_limit() -> usize {
    10
}

fn default_data_quality_floor() -> f64 {
    70.0
}

fn default_freshness_floor() -> f64 {
    60.0
}

fn default_card_compliance_floor() -> f64 {
    50.0
}

fn default_correlation_floor() -> f64 {
    0.6
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the correlation table in the Markdown report.
    #[serde(default = "default_true")]
    pub include_correlations: bool,

    /// Maximum subject rows in the Markdown score table.
    #[serde(default = "default_max_subjects")]
    pub max_subjects: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_correlations: true,
            max_subjects: default_max_subjects(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_subjects() -> usize {
    50
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(ref cache) = args.cache {
            self.scoring.cache_path = Some(cache.display().to_string());
        }
        if let Some(ttl) = args.cache_ttl_hours {
            self.scoring.cache_ttl_hours = ttl;
        }
    }

    /// Checks values a file could set but the run cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.general.concurrency == 0 {
            anyhow::bail!("general.concurrency must be at least 1");
        }
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.scoring.cache_ttl_hours) {
            anyhow::bail!(
                "scoring.cache_ttl_hours must be between 0 and {}",
                MAX_CACHE_TTL_HOURS
            );
        }
        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&self.aggregator.recent_window_days) {
            anyhow::bail!(
                "aggregator.recent_window_days must be between 1 and {}",
                MAX_RECENT_WINDOW_DAYS
            );
        }
        if self.aggregator.correlation_windows < 2 {
            anyhow::bail!("aggregator.correlation_windows must be at least 2");
        }
        if self.aggregator.expected_cards == 0 {
            anyhow::bail!("aggregator.expected_cards must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.concurrency, 4);
        assert_eq!(config.scoring.cache_ttl_hours, 24);
        assert_eq!(config.aggregator.correlation_windows, 6);
        assert_eq!(config.rules.conflict_limit, 10);
        assert!(config.report.include_correlations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[scoring]
cache_ttl_hours = 6
cache_path = "scores.json"

[rules]
compliance_target = 90.0
conflict_limit = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.scoring.cache_ttl_hours, 6);
        assert_eq!(config.scoring.cache_path.as_deref(), Some("scores.json"));
        assert_eq!(config.rules.compliance_target, 90.0);
        assert_eq!(config.rules.conflict_limit, 3);
        // Untouched keys keep their defaults.
        assert_eq!(config.rules.freshness_floor, 60.0);
        assert_eq!(config.aggregator.expected_cards, 5);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scoring]"));
        assert!(toml_str.contains("[rules]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.rules.correlation_floor, 0.6);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.aggregator.correlation_windows = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.aggregator.expected_cards = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_upper_bounds() {
        let mut config = Config::default();
        config.aggregator.recent_window_days = MAX_RECENT_WINDOW_DAYS;
        config.scoring.cache_ttl_hours = MAX_CACHE_TTL_HOURS;
        assert!(config.validate().is_ok());

        config.aggregator.recent_window_days = 100_000_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.cache_ttl_hours = i64::MAX;
        assert!(config.validate().is_err());

        config.scoring.cache_ttl_hours = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[report]\nmax_subjects = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.report.max_subjects, 5);

        std::fs::write(&path, "[report\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
