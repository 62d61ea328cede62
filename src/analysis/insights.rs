//! Threshold rules that turn aggregate metrics into insights and alerts.
//!
//! Rules run in a fixed order on every pass. Each one only appends to the
//! output list; nothing is suppressed or deduplicated across passes.

use super::cards::CardSummary;
use super::trend::TrendLabel;
use crate::models::{Alert, CorrelationResult, HealthStatus, Insight, Priority};
use chrono::{DateTime, Utc};

/// Cut points used by the rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Overall compliance below this raises a High insight.
    pub compliance_target: f64,
    /// Overall compliance at or above this raises a Low insight.
    pub compliance_excellent: f64,
    /// More potential conflicts than this on a card raises a High alert.
    pub conflict_limit: usize,
    /// Data quality below this raises a Medium alert.
    pub data_quality_floor: f64,
    /// Freshness below this raises a Medium alert.
    pub freshness_floor: f64,
    /// A card compliance rate below this raises a Critical alert.
    pub card_compliance_floor: f64,
    /// |r| at or above this raises a Medium insight.
    pub correlation_floor: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            compliance_target: 80.0,
            compliance_excellent: 95.0,
            conflict_limit: 10,
            data_quality_floor: 70.0,
            freshness_floor: 60.0,
            card_compliance_floor: 50.0,
            correlation_floor: 0.6,
        }
    }
}

impl From<&crate::config::RulesConfig> for RuleThresholds {
    fn from(config: &crate::config::RulesConfig) -> Self {
        Self {
            compliance_target: config.compliance_target,
            compliance_excellent: config.compliance_excellent,
            conflict_limit: config.conflict_limit,
            data_quality_floor: config.data_quality_floor,
            freshness_floor: config.freshness_floor,
            card_compliance_floor: config.card_compliance_floor,
            correlation_floor: config.correlation_floor,
        }
    }
}

/// Already-computed metrics the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub cards: &'a [CardSummary],
    pub correlations: &'a [CorrelationResult],
    pub overall_compliance_score: f64,
    pub data_quality_score: f64,
    pub freshness_score: f64,
    pub coverage_score: f64,
    pub health_status: HealthStatus,
}

/// Output of one rule pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Findings {
    pub insights: Vec<Insight>,
    pub alerts: Vec<Alert>,
}

impl Findings {
    fn insight(
        &mut self,
        now: DateTime<Utc>,
        category: &str,
        title: impl Into<String>,
        description: String,
        priority: Priority,
    ) {
        self.insights.push(Insight {
            category: category.to_string(),
            title: title.into(),
            description,
            priority,
            generated_at: now,
        });
    }

    fn alert(
        &mut self,
        now: DateTime<Utc>,
        source: &str,
        title: impl Into<String>,
        message: String,
        priority: Priority,
    ) {
        self.alerts.push(Alert {
            source: source.to_string(),
            title: title.into(),
            message,
            priority,
            raised_at: now,
        });
    }
}

type Rule = fn(&RuleInput<'_>, &RuleThresholds, DateTime<Utc>, &mut Findings);

const INSIGHT_RULES: [Rule; 5] = [
    compliance_below_target,
    compliance_excellent,
    strong_correlations,
    card_trends,
    health_excellent,
];

const ALERT_RULES: [Rule; 5] = [
    potential_conflicts,
    card_compliance_breach,
    low_data_quality,
    stale_data,
    missing_cards,
];

/// Runs every insight rule, then every alert rule.
pub fn evaluate(
    input: &RuleInput<'_>,
    thresholds: &RuleThresholds,
    now: DateTime<Utc>,
) -> Findings {
    let mut findings = Findings::default();
    for rule in INSIGHT_RULES.iter().chain(ALERT_RULES.iter()) {
        rule(input, thresholds, now, &mut findings);
    }
    findings
}

fn compliance_below_target(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    if input.overall_compliance_score < t.compliance_target {
        out.insight(
            now,
            "Compliance",
            "Compliance below target",
            format!(
                "Overall compliance is {:.1}%, below the {:.0}% target.",
                input.overall_compliance_score, t.compliance_target
            ),
            Priority::High,
        );
    }
}

fn compliance_excellent(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    let any_records = input.cards.iter().any(CardSummary::has_records);
    if any_records && input.overall_compliance_score >= t.compliance_excellent {
        out.insight(
            now,
            "Compliance",
            "Strong compliance",
            format!(
                "Overall compliance is {:.1}% across all reporting cards.",
                input.overall_compliance_score
            ),
            Priority::Low,
        );
    }
}

fn strong_correlations(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    for c in input.correlations {
        if c.coefficient.abs() >= t.correlation_floor {
            let direction = if c.coefficient > 0.0 { "together" } else { "in opposite directions" };
            out.insight(
                now,
                "Correlation",
                format!("Strong relationship: {} / {}", c.source_a, c.source_b),
                format!(
                    "{} and {} move {} (r = {:.2}, {}).",
                    c.source_a, c.source_b, direction, c.coefficient, c.strength
                ),
                Priority::Medium,
            );
        }
    }
}

fn card_trends(
    input: &RuleInput<'_>,
    _t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    for card in input.cards {
        match card.trend {
            TrendLabel::StronglyIncreasing => out.insight(
                now,
                "Trend",
                format!("{} activity surging", card.name),
                format!(
                    "{} grew {:.1}% month over month.",
                    card.name, card.growth_rate
                ),
                Priority::Medium,
            ),
            TrendLabel::StronglyDecreasing => out.insight(
                now,
                "Trend",
                format!("{} activity falling", card.name),
                format!(
                    "{} changed {:.1}% month over month.",
                    card.name, card.growth_rate
                ),
                Priority::Low,
            ),
            _ => {}
        }
    }
}

fn health_excellent(
    input: &RuleInput<'_>,
    _t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    if input.health_status == HealthStatus::Excellent {
        out.insight(
            now,
            "Data Health",
            "Data health excellent",
            "Data quality, freshness and coverage are all strong.".to_string(),
            Priority::Low,
        );
    }
}

fn potential_conflicts(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    for card in input.cards {
        if card.potential_conflicts > t.conflict_limit {
            out.alert(
                now,
                &card.name,
                "Potential conflicts of interest",
                format!(
                    "{} records flagged as potential conflicts (limit {}).",
                    card.potential_conflicts, t.conflict_limit
                ),
                Priority::High,
            );
        }
    }
}

fn card_compliance_breach(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    for card in input.cards.iter().filter(|c| c.has_records()) {
        if card.compliance_rate < t.card_compliance_floor {
            out.alert(
                now,
                &card.name,
                "Compliance breach",
                format!(
                    "Only {:.1}% of {} records are compliant.",
                    card.compliance_rate, card.total_records
                ),
                Priority::Critical,
            );
        }
    }
}

fn low_data_quality(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    if input.data_quality_score < t.data_quality_floor {
        out.alert(
            now,
            "Summary",
            "Low data quality",
            format!(
                "Only {:.1}% of records fall in the recent window (floor {:.0}%).",
                input.data_quality_score, t.data_quality_floor
            ),
            Priority::Medium,
        );
    }
}

fn stale_data(
    input: &RuleInput<'_>,
    t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    if input.freshness_score < t.freshness_floor {
        out.alert(
            now,
            "Summary",
            "Stale data",
            format!(
                "Average freshness is {:.1} (floor {:.0}).",
                input.freshness_score, t.freshness_floor
            ),
            Priority::Medium,
        );
    }
}

fn missing_cards(
    input: &RuleInput<'_>,
    _t: &RuleThresholds,
    now: DateTime<Utc>,
    out: &mut Findings,
) {
    if input.coverage_score < 100.0 {
        out.alert(
            now,
            "Summary",
            "Missing cards",
            format!(
                "Coverage is {:.1}%; some expected cards have no records.",
                input.coverage_score
            ),
            Priority::Low,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cards::CardKind;
    use crate::models::CorrelationStrength;

    fn card(name: &str, conflicts: usize, compliance: f64, trend: TrendLabel) -> CardSummary {
        CardSummary {
            kind: CardKind::Trading,
            name: name.to_string(),
            total_records: 20,
            recent_records: 20,
            total_value: 0.0,
            average_value: 0.0,
            min_value: 0.0,
            max_value: 0.0,
            compliance_rate: compliance,
            growth_rate: 0.0,
            trend,
            potential_conflicts: conflicts,
            data_quality: 100.0,
            freshness: 100.0,
            last_updated: None,
            monthly_series: Vec::new(),
        }
    }

    fn healthy_input(cards: &[CardSummary]) -> RuleInput<'_> {
        RuleInput {
            cards,
            correlations: &[],
            overall_compliance_score: 90.0,
            data_quality_score: 100.0,
            freshness_score: 100.0,
            coverage_score: 100.0,
            health_status: HealthStatus::Good,
        }
    }

    #[test]
    fn test_quiet_when_healthy() {
        let cards = [card("Trading", 0, 90.0, TrendLabel::Stable)];
        let findings = evaluate(&healthy_input(&cards), &RuleThresholds::default(), Utc::now());
        assert!(findings.insights.is_empty());
        assert!(findings.alerts.is_empty());
    }

    #[test]
    fn test_conflicts_over_limit_raise_high_alert() {
        let cards = [card("Congressional Trading", 15, 90.0, TrendLabel::Stable)];
        let findings = evaluate(&healthy_input(&cards), &RuleThresholds::default(), Utc::now());

        assert_eq!(findings.alerts.len(), 1);
        assert_eq!(findings.alerts[0].priority, Priority::High);
        assert_eq!(findings.alerts[0].source, "Congressional Trading");
    }

    #[test]
    fn test_conflicts_at_limit_do_not_alert() {
        let cards = [card("Trading", 10, 90.0, TrendLabel::Stable)];
        let findings = evaluate(&healthy_input(&cards), &RuleThresholds::default(), Utc::now());
        assert!(findings.alerts.is_empty());
    }

    #[test]
    fn test_low_compliance_raises_insight_and_alert() {
        let cards = [card("Lobbying", 0, 40.0, TrendLabel::Stable)];
        let mut input = healthy_input(&cards);
        input.overall_compliance_score = 40.0;

        let findings = evaluate(&input, &RuleThresholds::default(), Utc::now());
        assert_eq!(findings.insights[0].title, "Compliance below target");
        assert_eq!(findings.insights[0].priority, Priority::High);
        assert_eq!(findings.alerts[0].priority, Priority::Critical);
    }

    #[test]
    fn test_summary_level_alerts_in_order() {
        let cards = [card("Trading", 0, 90.0, TrendLabel::Stable)];
        let mut input = healthy_input(&cards);
        input.data_quality_score = 50.0;
        input.freshness_score = 40.0;
        input.coverage_score = 20.0;

        let findings = evaluate(&input, &RuleThresholds::default(), Utc::now());
        let titles: Vec<_> = findings.alerts.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Low data quality", "Stale data", "Missing cards"]);
    }

    #[test]
    fn test_strong_correlation_and_trend_insights() {
        let cards = [card("Patents", 0, 90.0, TrendLabel::StronglyIncreasing)];
        let correlations = [CorrelationResult {
            source_a: "Lobbying".to_string(),
            source_b: "Government Contracts".to_string(),
            coefficient: -0.7,
            strength: CorrelationStrength::Strong,
        }];
        let mut input = healthy_input(&cards);
        input.correlations = &correlations;

        let findings = evaluate(&input, &RuleThresholds::default(), Utc::now());
        let categories: Vec<_> = findings.insights.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories, vec!["Correlation", "Trend"]);
        assert!(findings.insights[0].description.contains("opposite"));
    }

    #[test]
    fn test_rules_do_not_deduplicate_across_passes() {
        let cards = [card("Trading", 20, 90.0, TrendLabel::Stable)];
        let input = healthy_input(&cards);
        let now = Utc::now();

        let first = evaluate(&input, &RuleThresholds::default(), now);
        let second = evaluate(&input, &RuleThresholds::default(), now);
        assert_eq!(first, second);
        assert_eq!(second.alerts.len(), 1);
    }
}
