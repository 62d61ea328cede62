//! Markdown report generation.
//!
//! This module generates Markdown and JSON reports from the subject scores
//! and the card aggregation of one run.

use crate::analysis::{
    alerts_at_or_above, group_insights_by_category, top_alerts, AggregateSummary, CardSummary,
};
use crate::config::ReportConfig;
use crate::models::{
    Alert, CorrelationResult, FindingSummary, Priority, Report, ReportMetadata, SubjectScore,
};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# FinSight Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, options));
    output.push_str(&generate_findings_section(&report.findings));
    output.push_str(&generate_subjects_section(&report.subjects, options.max_subjects));

    if let Some(ref summary) = report.summary {
        output.push_str(&generate_cards_section(&summary.cards));
        output.push_str(&generate_health_section(summary));
        if options.include_correlations {
            output.push_str(&generate_correlations_section(&summary.correlations));
        }
        output.push_str(&generate_insights_section(summary));
        output.push_str(&generate_alerts_section(&summary.alerts));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **As Of:** {}\n",
        metadata.as_of.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Subjects Scored:** {}\n",
        metadata.subjects_scored
    ));
    if metadata.cache_hits > 0 {
        section.push_str(&format!("- **Served From Cache:** {}\n", metadata.cache_hits));
    }
    section.push_str(&format!(
        "- **Cards Aggregated:** {}\n",
        metadata.cards_aggregated
    ));
    section.push_str(&format!(
        "- **Run Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report, options: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Findings](#findings)\n");
    toc.push_str("- [Subject Scores](#subject-scores)\n");

    if report.summary.is_some() {
        toc.push_str("- [Metric Cards](#metric-cards)\n");
        toc.push_str("- [Data Health](#data-health)\n");
        if options.include_correlations {
            toc.push_str("- [Correlations](#correlations)\n");
        }
        toc.push_str("- [Insights](#insights)\n");
        toc.push_str("- [Alerts](#alerts)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the findings breakdown.
fn generate_findings_section(findings: &FindingSummary) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");
    section.push_str(&format!(
        "| {} Critical | {} High | {} Medium | {} Low | **Total** |\n",
        Priority::Critical.emoji(),
        Priority::High.emoji(),
        Priority::Medium.emoji(),
        Priority::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        findings.critical, findings.high, findings.medium, findings.low, findings.total
    ));

    section
}

/// Generate the subject score table.
fn generate_subjects_section(subjects: &[SubjectScore], max_rows: usize) -> String {
    let mut section = String::new();

    section.push_str("## Subject Scores\n\n");

    if subjects.is_empty() {
        section.push_str("No subjects were scored.\n\n");
        return section;
    }

    section.push_str(
        "| Symbol | Growth | Risk | Profitability | Valuation | **Overall** | Rating | Strongest | Weakest |\n",
    );
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---|:---|:---|\n");

    for subject in subjects.iter().take(max_rows) {
        section.push_str(&generate_subject_row(subject));
    }

    if subjects.len() > max_rows {
        section.push_str(&format!(
            "\n*{} more subjects omitted.*\n",
            subjects.len() - max_rows
        ));
    }
    section.push('\n');

    section
}

fn generate_subject_row(subject: &SubjectScore) -> String {
    let score = &subject.score;
    let cached = if subject.from_cache { " *(cached)*" } else { "" };

    format!(
        "| `{}`{} | {:.1} | {:.1} | {:.1} | {:.1} | **{:.1}** | {} | {} | {} |\n",
        subject.symbol,
        cached,
        score.growth(),
        score.risk(),
        score.profitability(),
        score.valuation(),
        score.overall(),
        subject.recommendation.rating,
        subject.recommendation.strongest,
        subject.recommendation.weakest,
    )
}

/// Generate the card summary table.
fn generate_cards_section(cards: &[CardSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Metric Cards\n\n");

    if cards.is_empty() {
        section.push_str("No metric cards were supplied.\n\n");
        return section;
    }

    section.push_str(
        "| Card | Records | Recent | Recent Value | Compliance | Growth | Trend | Conflicts | Freshness |\n",
    );
    section.push_str("|:---|:---:|:---:|---:|:---:|:---:|:---|:---:|:---:|\n");

    for card in cards {
        section.push_str(&format!(
            "| {} | {} | {} | {:.2} | {:.1}% | {:+.1}% | {} | {} | {:.0} |\n",
            card.name,
            card.total_records,
            card.recent_records,
            card.total_value,
            card.compliance_rate,
            card.growth_rate,
            card.trend,
            card.potential_conflicts,
            card.freshness,
        ));
    }
    section.push('\n');

    section
}

/// Generate the data health section.
fn generate_health_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## Data Health\n\n");
    section.push_str(&format!(
        "**Status:** {} ({:.1}/100)\n\n",
        summary.health_status, summary.health_score
    ));
    section.push_str("| Indicator | Score |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!(
        "| Overall Compliance | {:.1} |\n",
        summary.overall_compliance_score
    ));
    section.push_str(&format!("| Data Quality | {:.1} |\n", summary.data_quality_score));
    section.push_str(&format!("| Freshness | {:.1} |\n", summary.freshness_score));
    section.push_str(&format!("| Coverage | {:.1} |\n", summary.coverage_score));
    section.push('\n');

    section
}

/// Generate the correlation table.
fn generate_correlations_section(correlations: &[CorrelationResult]) -> String {
    let mut section = String::new();

    section.push_str("## Correlations\n\n");

    if correlations.is_empty() {
        section.push_str("Fewer than two cards carry records; nothing to correlate.\n\n");
        return section;
    }

    section.push_str("| Series | Series | Coefficient | Strength |\n");
    section.push_str("|:---|:---|:---:|:---|\n");

    let mut sorted: Vec<&CorrelationResult> = correlations.iter().collect();
    sorted.sort_by(|a, b| {
        b.coefficient
            .abs()
            .partial_cmp(&a.coefficient.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for correlation in sorted {
        section.push_str(&format!(
            "| {} | {} | {:+.3} | {} |\n",
            correlation.source_a,
            correlation.source_b,
            correlation.coefficient,
            correlation.strength
        ));
    }
    section.push('\n');

    section
}

/// Generate the insights section, grouped by category.
fn generate_insights_section(summary: &AggregateSummary) -> String {
    let mut section = String::new();

    section.push_str("## Insights\n\n");

    if summary.insights.is_empty() {
        section.push_str("No insights were generated.\n\n");
        return section;
    }

    let grouped = group_insights_by_category(&summary.insights);
    let mut categories: Vec<_> = grouped.keys().cloned().collect();
    categories.sort();

    for category in categories {
        section.push_str(&format!("### {}\n\n", category));
        for insight in &grouped[&category] {
            section.push_str(&format!(
                "- {} **{}**: {}\n",
                insight.priority.emoji(),
                insight.title,
                insight.description
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the alerts section, most urgent first.
fn generate_alerts_section(alerts: &[Alert]) -> String {
    let mut section = String::new();

    section.push_str("## Alerts\n\n");

    if alerts.is_empty() {
        section.push_str("No alerts were raised. 🎉\n\n");
        return section;
    }

    let urgent = alerts_at_or_above(alerts, Priority::High);
    if urgent > 0 {
        section.push_str(&format!(
            "> ⚠️ **{} alert(s) at High priority or above.**\n\n",
            urgent
        ));
    }

    for alert in top_alerts(alerts, alerts.len()) {
        section.push_str(&generate_alert_block(&alert));
    }

    section
}

/// Generate a single alert block.
fn generate_alert_block(alert: &Alert) -> String {
    let mut block = String::new();

    let badge = match alert.priority {
        Priority::Critical => "🔴 **CRITICAL**",
        Priority::High => "🟠 **HIGH**",
        Priority::Medium => "🟡 **MEDIUM**",
        Priority::Low => "🟢 **LOW**",
    };

    block.push_str(&format!("#### {} {} - {}\n\n", badge, alert.source, alert.title));
    block.push_str(&format!("{}\n\n", alert.message));
    block.push_str("---\n\n");

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by FinSight v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cards::{TradeRecord, Transaction};
    use crate::analysis::{aggregate, AggregatorSettings, CardSet, MetricCard};
    use crate::scoring::{score_subject, FactorSet, Recommendation};
    use chrono::{Duration, TimeZone, Utc};

    fn create_test_report() -> Report {
        let as_of = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap();
        let today = as_of.date_naive();

        let trades = (0..15)
            .map(|i| TradeRecord {
                official: "Rep. Test".to_string(),
                ticker: "AAPL".to_string(),
                transaction: Transaction::Purchase,
                amount: 10_000.0,
                traded_on: today - Duration::days(i),
                disclosed_on: Some(today - Duration::days(i)),
                potential_conflict: true,
            })
            .collect();
        let cards = CardSet {
            trading: Some(MetricCard::with_records(trades)),
            ..CardSet::default()
        };
        let summary = aggregate(&cards, as_of, &AggregatorSettings::default());

        let score = score_subject(
            &FactorSet::new()
                .with("Q1 Revenue Growth", 0.20)
                .with("Q2 Revenue Growth", 0.10),
            &FactorSet::new()
                .with("Year 1 Debt/Equity", 1.0)
                .with("Beta", 1.5),
            &FactorSet::new(),
            &FactorSet::new(),
        );

        let mut report = Report {
            metadata: ReportMetadata {
                source: "snapshot.json".to_string(),
                as_of,
                generated_at: as_of,
                subjects_scored: 1,
                cache_hits: 0,
                cards_aggregated: 1,
                duration_seconds: 0.4,
            },
            subjects: vec![SubjectScore {
                symbol: "AAPL".to_string(),
                requester: "alice".to_string(),
                score,
                recommendation: Recommendation::from_score(&score),
                computed_at: as_of,
                from_cache: false,
            }],
            summary: Some(summary),
            findings: FindingSummary::default(),
        };
        report.recount_findings();
        report
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# FinSight Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Subject Scores"));
        assert!(markdown.contains("`AAPL`"));
        assert!(markdown.contains("## Metric Cards"));
        assert!(markdown.contains("## Data Health"));
        assert!(markdown.contains("## Alerts"));
        assert!(markdown.contains("HIGH"));
    }

    #[test]
    fn test_correlations_can_be_disabled() {
        let report = create_test_report();
        let options = ReportConfig {
            include_correlations: false,
            ..ReportConfig::default()
        };
        let markdown = generate_markdown_report(&report, &options);

        assert!(!markdown.contains("## Correlations"));
    }

    #[test]
    fn test_subject_rows_are_capped() {
        let report = create_test_report();
        let subjects = vec![report.subjects[0].clone(); 3];

        let section = generate_subjects_section(&subjects, 2);

        assert_eq!(section.matches("`AAPL`").count(), 2);
        assert!(section.contains("1 more subjects omitted"));
    }

    #[test]
    fn test_report_without_cards() {
        let mut report = create_test_report();
        report.summary = None;
        report.recount_findings();

        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(!markdown.contains("## Metric Cards"));
        assert!(!markdown.contains("[Alerts]"));
        assert_eq!(report.findings.total, 0);
    }

    #[test]
    fn test_generate_alert_block() {
        let alert = Alert {
            source: "Congressional Trading".to_string(),
            title: "Potential conflicts".to_string(),
            message: "15 trades flagged".to_string(),
            priority: Priority::Critical,
            raised_at: Utc::now(),
        };

        let block = generate_alert_block(&alert);

        assert!(block.contains("CRITICAL"));
        assert!(block.contains("Congressional Trading"));
        assert!(block.contains("15 trades flagged"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"subjects\""));
        assert!(json.contains("\"overall\""));
        assert!(json.contains("\"alerts\""));
    }

    #[test]
    fn test_write_report_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.md");

        write_report("# hi\n", &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }
}
