//! Cross-card aggregation.
//!
//! One pass takes every supplied metric card, derives the card summaries,
//! the data-health indicators and the pairwise correlations, and then runs
//! the insight and alert rules over the result.

use super::cards::{CardSet, CardSummary, CardWindow};
use super::insights::{self, RuleInput, RuleThresholds};
use super::stats::{
    correlation_strength, coverage_score, data_quality, freshness_for_days, health_score,
    health_status, mean, pearson_correlation,
};
use crate::models::{Alert, CorrelationResult, HealthStatus, Insight, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Knobs for an aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorSettings {
    /// Width of the recent and month-over-month windows, in days.
    pub recent_days: i64,
    /// Number of windows in each correlation series.
    pub series_windows: usize,
    /// Card count that means full coverage.
    pub expected_cards: usize,
    pub thresholds: RuleThresholds,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            recent_days: 30,
            series_windows: 6,
            expected_cards: 5,
            thresholds: RuleThresholds::default(),
        }
    }
}

impl From<&crate::config::Config> for AggregatorSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            recent_days: config.aggregator.recent_window_days,
            series_windows: config.aggregator.correlation_windows,
            expected_cards: config.aggregator.expected_cards,
            thresholds: RuleThresholds::from(&config.rules),
        }
    }
}

/// Output of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub as_of: DateTime<Utc>,
    pub cards: Vec<CardSummary>,
    /// Average compliance rate over cards with records.
    pub overall_compliance_score: f64,
    pub data_quality_score: f64,
    pub freshness_score: f64,
    pub coverage_score: f64,
    pub health_score: f64,
    pub health_status: HealthStatus,
    pub correlations: Vec<CorrelationResult>,
    pub insights: Vec<Insight>,
    pub alerts: Vec<Alert>,
}

/// Runs one full aggregation pass.
pub fn aggregate(
    cards: &CardSet,
    as_of: DateTime<Utc>,
    settings: &AggregatorSettings,
) -> AggregateSummary {
    let window = CardWindow {
        as_of,
        recent_days: settings.recent_days,
        series_windows: settings.series_windows,
    };
    let summaries = cards.summaries(&window);

    let reporting: Vec<&CardSummary> = summaries.iter().filter(|c| c.has_records()).collect();

    let overall_compliance_score = mean(
        &reporting
            .iter()
            .map(|c| c.compliance_rate)
            .collect::<Vec<_>>(),
    );

    let recent: usize = summaries.iter().map(|c| c.recent_records).sum();
    let total: usize = summaries.iter().map(|c| c.total_records).sum();
    let data_quality_score = data_quality(recent, total);

    let freshness_score = if summaries.is_empty() {
        freshness_for_days(f64::INFINITY)
    } else {
        mean(&summaries.iter().map(|c| c.freshness).collect::<Vec<_>>())
    };

    let coverage = coverage_score(reporting.len(), settings.expected_cards);
    let health = health_score(data_quality_score, freshness_score, coverage);
    let status = health_status(data_quality_score, freshness_score, coverage);

    let correlations = correlate_cards(&summaries);

    debug!(
        cards = summaries.len(),
        reporting = reporting.len(),
        correlations = correlations.len(),
        "aggregated cards"
    );

    let findings = insights::evaluate(
        &RuleInput {
            cards: &summaries,
            correlations: &correlations,
            overall_compliance_score,
            data_quality_score,
            freshness_score,
            coverage_score: coverage,
            health_status: status,
        },
        &settings.thresholds,
        as_of,
    );

    AggregateSummary {
        as_of,
        cards: summaries,
        overall_compliance_score,
        data_quality_score,
        freshness_score,
        coverage_score: coverage,
        health_score: health,
        health_status: status,
        correlations,
        insights: findings.insights,
        alerts: findings.alerts,
    }
}

/// Pearson correlation of the monthly series of every pair of cards with records.
pub fn correlate_cards(cards: &[CardSummary]) -> Vec<CorrelationResult> {
    let reporting: Vec<&CardSummary> = cards.iter().filter(|c| c.has_records()).collect();
    let mut results = Vec::new();

    for (i, a) in reporting.iter().enumerate() {
        for b in &reporting[i + 1..] {
            let coefficient = pearson_correlation(&a.monthly_series, &b.monthly_series);
            results.push(CorrelationResult {
                source_a: a.name.clone(),
                source_b: b.name.clone(),
                coefficient,
                strength: correlation_strength(coefficient),
            });
        }
    }

    results
}

/// Sort alerts by priority (critical first).
pub fn sort_alerts_by_priority(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Get the top N alerts by priority.
pub fn top_alerts(alerts: &[Alert], n: usize) -> Vec<Alert> {
    let mut sorted: Vec<Alert> = alerts.to_vec();
    sort_alerts_by_priority(&mut sorted);
    sorted.truncate(n);
    sorted
}

/// Group insights by category, keeping rule order within each group.
pub fn group_insights_by_category(insights: &[Insight]) -> HashMap<String, Vec<Insight>> {
    let mut grouped: HashMap<String, Vec<Insight>> = HashMap::new();

    for insight in insights {
        grouped
            .entry(insight.category.clone())
            .or_default()
            .push(insight.clone());
    }

    grouped
}

/// Count alerts at or above a priority.
pub fn alerts_at_or_above(alerts: &[Alert], threshold: Priority) -> usize {
    alerts.iter().filter(|a| a.priority >= threshold).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cards::{
        ContractRecord, LobbyingRecord, MetricCard, TradeRecord, Transaction,
    };
    use chrono::{Duration, NaiveDate, TimeZone};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
    }

    fn day(offset: i64) -> NaiveDate {
        as_of().date_naive() - Duration::days(offset)
    }

    fn contracts_by_window(amounts: &[f64]) -> MetricCard<ContractRecord> {
        // amounts[0] is the oldest window
        let n = amounts.len() as i64;
        MetricCard::with_records(
            amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| ContractRecord {
                    agency: "GSA".to_string(),
                    recipient: "Acme".to_string(),
                    amount: *amount,
                    awarded_on: day((n - 1 - i as i64) * 30 + 1),
                    compliant: true,
                })
                .collect(),
        )
    }

    fn lobbying_by_window(amounts: &[f64]) -> MetricCard<LobbyingRecord> {
        let n = amounts.len() as i64;
        MetricCard::with_records(
            amounts
                .iter()
                .enumerate()
                .map(|(i, amount)| LobbyingRecord {
                    client: "Acme".to_string(),
                    registrant: "K Street LLP".to_string(),
                    amount: *amount,
                    filed_on: day((n - 1 - i as i64) * 30 + 1),
                    on_time: true,
                })
                .collect(),
        )
    }

    #[test]
    fn test_correlated_cards() {
        let cards = CardSet {
            contracts: Some(contracts_by_window(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
            lobbying: Some(lobbying_by_window(&[2.0, 4.0, 6.0, 8.0, 10.0, 12.0])),
            ..CardSet::default()
        };
        let summary = aggregate(&cards, as_of(), &AggregatorSettings::default());

        assert_eq!(summary.correlations.len(), 1);
        let c = &summary.correlations[0];
        assert_eq!(c.source_a, "Government Contracts");
        assert_eq!(c.source_b, "Lobbying");
        assert!((c.coefficient - 1.0).abs() < 1e-9);
        assert_eq!(c.strength, crate::models::CorrelationStrength::VeryStrong);
        assert!(summary
            .insights
            .iter()
            .any(|i| i.category == "Correlation"));
    }

    fn conflicted_trades(count: i64) -> CardSet {
        let trades = (0..count)
            .map(|i| TradeRecord {
                official: "Rep. Example".to_string(),
                ticker: "ACME".to_string(),
                transaction: Transaction::Purchase,
                amount: 1_000.0,
                traded_on: day(i),
                disclosed_on: Some(day(i)),
                potential_conflict: true,
            })
            .collect();
        CardSet {
            trading: Some(MetricCard::with_records(trades)),
            ..CardSet::default()
        }
    }

    #[test]
    fn test_conflicted_trading_card_raises_high_alert() {
        let summary = aggregate(&conflicted_trades(15), as_of(), &AggregatorSettings::default());
        let conflict_alert = summary
            .alerts
            .iter()
            .find(|a| a.title == "Potential conflicts of interest")
            .expect("conflict alert");
        assert_eq!(conflict_alert.priority, Priority::High);
        assert_eq!(conflict_alert.source, "Congressional Trading");
    }

    #[test]
    fn test_settings_from_config_file() {
        let config: crate::config::Config = toml::from_str(
            r#"
[aggregator]
expected_cards = 1

[rules]
conflict_limit = 20
"#,
        )
        .unwrap();
        let settings = AggregatorSettings::from(&config);
        assert_eq!(settings.expected_cards, 1);

        let summary = aggregate(&conflicted_trades(15), as_of(), &settings);
        assert_eq!(summary.coverage_score, 100.0);
        assert!(!summary
            .alerts
            .iter()
            .any(|a| a.title == "Potential conflicts of interest"));
        assert!(!summary.alerts.iter().any(|a| a.title == "Missing cards"));
    }

    #[test]
    fn test_health_indicators() {
        let cards = CardSet {
            contracts: Some(contracts_by_window(&[5.0, 5.0])),
            ..CardSet::default()
        };
        let summary = aggregate(&cards, as_of(), &AggregatorSettings::default());

        assert_eq!(summary.overall_compliance_score, 100.0);
        assert_eq!(summary.data_quality_score, 50.0);
        // newest record is a day and a half old
        assert_eq!(summary.freshness_score, 80.0);
        assert_eq!(summary.coverage_score, 20.0);
        assert_eq!(summary.health_status, HealthStatus::Critical);
        assert!(summary.correlations.is_empty());
        assert!(summary.alerts.iter().any(|a| a.title == "Missing cards"));
    }

    #[test]
    fn test_empty_card_set() {
        let summary = aggregate(&CardSet::default(), as_of(), &AggregatorSettings::default());

        assert!(summary.cards.is_empty());
        assert_eq!(summary.overall_compliance_score, 0.0);
        assert_eq!(summary.data_quality_score, 0.0);
        assert_eq!(summary.freshness_score, 20.0);
        assert_eq!(summary.coverage_score, 0.0);
        assert_eq!(summary.health_status, HealthStatus::Critical);
    }

    #[test]
    fn test_top_alerts() {
        let now = Utc::now();
        let alert = |priority| Alert {
            source: "Summary".to_string(),
            title: "t".to_string(),
            message: String::new(),
            priority,
            raised_at: now,
        };
        let alerts = vec![
            alert(Priority::Low),
            alert(Priority::Critical),
            alert(Priority::Medium),
        ];

        let top = top_alerts(&alerts, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].priority, Priority::Critical);
        assert_eq!(top[1].priority, Priority::Medium);
        assert_eq!(alerts_at_or_above(&alerts, Priority::Medium), 2);
    }
}
