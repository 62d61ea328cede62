//! FinSight - GRPV stock scoring and market-intelligence analytics
//!
//! A CLI tool that scores stock symbols from factor snapshots and
//! aggregates metric cards into health indicators, insights and alerts.
//!
//! Exit codes:
//!   0 - Success (no alerts above threshold, or no --fail-on set)
//!   1 - Runtime error (unreadable input, bad config, write failure, etc.)
//!   2 - Alerts raised at or above the --fail-on threshold

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use finsight::analysis::cards::CardWindow;
use finsight::analysis::{self, AggregatorSettings};
use finsight::cli::{Args, OutputFormat};
use finsight::config::{Config, DEFAULT_CONFIG_FILE};
use finsight::input::{self, LoadOptions, Snapshot};
use finsight::models::{FindingSummary, Priority, Report, ReportMetadata};
use finsight::scoring::cache::ttl_from_hours;
use finsight::scoring::ScoreCache;
use finsight::{demo, report, runner};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so general.verbose can set the log level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level_with_config(config.general.verbose));

    info!("FinSight v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    origin.log();

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .finsight.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to tune cache freshness, windows and rule thresholds.");
    Ok(())
}

/// Initialize logging at the given level. `RUST_LOG` wins when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete scoring and aggregation workflow. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    config.validate()?;

    // Step 1: Get the snapshot
    let snapshot = get_snapshot(&args)?;
    if snapshot.is_empty() {
        warn!("Snapshot carries no subjects and no cards");
    }

    let as_of = args
        .as_of
        .or(snapshot.as_of)
        .unwrap_or_else(Utc::now);
    info!("Evaluating as of {}", as_of.to_rfc3339());

    // Handle --dry-run: show what would be processed and exit
    if args.dry_run {
        return handle_dry_run(&snapshot, as_of, &config);
    }

    // Step 2: Score subjects
    let cache_path = config.scoring.cache_path.as_ref().map(PathBuf::from);
    let cache = Arc::new(open_cache(cache_path.as_deref(), config.scoring.cache_ttl_hours)?);

    if !args.quiet {
        println!(
            "📈 Scoring {} subjects (concurrency {})...",
            snapshot.subjects.len(),
            config.general.concurrency
        );
    }

    let subjects = runner::score_subjects(
        snapshot.subjects,
        Arc::clone(&cache),
        as_of,
        config.general.concurrency,
        !args.quiet,
    )
    .await?;

    if let Some(ref path) = cache_path {
        cache.save(path)?;
        debug!("Saved {} cached scores to {}", cache.len(), path.display());
    }

    // Step 3: Aggregate cards
    let summary = if snapshot.cards.is_empty() {
        info!("No metric cards supplied, skipping aggregation");
        None
    } else {
        if !args.quiet {
            println!("🧮 Aggregating {} metric cards...", snapshot.cards.len());
        }
        let settings = AggregatorSettings::from(&config);
        let mut summary = analysis::aggregate(&snapshot.cards, as_of, &settings);
        analysis::sort_alerts_by_priority(&mut summary.alerts);
        Some(summary)
    };

    // Step 4: Build the report
    let cache_hits = subjects.iter().filter(|s| s.from_cache).count();
    let metadata = ReportMetadata {
        source: args.source_label(),
        as_of,
        generated_at: Utc::now(),
        subjects_scored: subjects.len(),
        cache_hits,
        cards_aggregated: summary.as_ref().map(|s| s.cards.len()).unwrap_or(0),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let mut report = Report {
        metadata,
        subjects,
        summary,
        findings: FindingSummary::default(),
    };
    report.recount_findings();

    // Apply --min-priority filter
    if let Some(min_level) = args.min_priority {
        report.retain_min_priority(Priority::from(min_level));
    }

    // Step 5: Render and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = PathBuf::from(&config.general.output);
    report::write_report(&output, &output_path)?;

    // Print summary
    if !args.quiet {
        print_summary(&report, &output_path);
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if report.has_alert_at_or_above(Priority::from(fail_level)) {
            eprintln!(
                "\n⛔ Alerts raised at or above {:?} priority. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn print_summary(report: &Report, output_path: &Path) {
    let findings = &report.findings;

    println!("\n📊 Run Summary:");
    println!(
        "   Subjects scored: {} ({} from cache)",
        report.metadata.subjects_scored, report.metadata.cache_hits
    );
    if let Some(best) = report.subjects.first() {
        println!(
            "   Top subject: {} ({:.1}, {})",
            best.symbol,
            best.score.overall(),
            best.recommendation.rating
        );
    }
    if let Some(ref summary) = report.summary {
        println!(
            "   Data health: {} ({:.1}/100)",
            summary.health_status, summary.health_score
        );
    }
    println!("   Findings: {}", findings.total);
    println!(
        "   - 🔴 Critical: {} | 🟠 High: {} | 🟡 Medium: {} | 🟢 Low: {}",
        findings.critical, findings.high, findings.medium, findings.low
    );
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
    println!("\n✅ Done! Report saved to: {}", output_path.display());
}

/// Handle --dry-run: print what would be scored and aggregated, exit.
fn handle_dry_run(snapshot: &Snapshot, as_of: DateTime<Utc>, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: nothing will be scored or written.\n");
    println!("   As of: {}", as_of.to_rfc3339());

    if snapshot.subjects.is_empty() {
        println!("   No subjects found.");
    } else {
        println!("   {} subjects would be scored:\n", snapshot.subjects.len());
        for subject in &snapshot.subjects {
            println!(
                "     📄 {} for {} ({} factors)",
                subject.symbol,
                subject.requester,
                subject.growth.len()
                    + subject.risk.len()
                    + subject.profitability.len()
                    + subject.valuation.len()
            );
        }
    }

    let window = CardWindow {
        as_of,
        recent_days: config.aggregator.recent_window_days,
        series_windows: config.aggregator.correlation_windows,
    };
    let cards = snapshot.cards.summaries(&window);
    if cards.is_empty() {
        println!("\n   No metric cards found.");
    } else {
        println!("\n   {} cards would be aggregated:\n", cards.len());
        for card in &cards {
            println!("     🗂️  {} ({} records)", card.name, card.total_records);
        }
    }

    println!("\n✅ Dry run complete.");
    Ok(0)
}

/// Load the snapshot from --input or generate the demo one.
fn get_snapshot(args: &Args) -> Result<Snapshot> {
    if args.demo {
        let as_of = args.as_of.unwrap_or_else(Utc::now);
        info!("Generating demo snapshot (seed {})", args.seed);
        return Ok(demo::generate(args.seed, as_of));
    }

    let path = args
        .input
        .as_ref()
        .context("No input given; pass --input or --demo")?;

    let mut options = LoadOptions::default();
    if let Some(ref excludes) = args.exclude {
        options.excludes = excludes.clone();
    }

    info!("Loading snapshots from: {}", path.display());
    let snapshot = input::load(path, &options)?;
    Ok(snapshot)
}

/// Open the score cache, from disk when a path is configured.
fn open_cache(path: Option<&Path>, ttl_hours: i64) -> Result<ScoreCache> {
    match path {
        Some(path) => ScoreCache::load(path, ttl_from_hours(ttl_hours)),
        None => Ok(ScoreCache::with_ttl_hours(ttl_hours)),
    }
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    Fallback(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => {
                info!("Loaded default config from {}", DEFAULT_CONFIG_FILE)
            }
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Fallback(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(e))),
    }
}
