//! Data models shared by the scorer, the aggregator and the report layer.
//!
//! This module contains the finding types (insights and alerts), the
//! correlation and health labels, and the report envelope.

use crate::analysis::AggregateSummary;
use crate::scoring::{CompositeScore, Recommendation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a generated insight or alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational finding.
    Low,
    /// Worth a look during the next review.
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Critical => write!(f, "Critical"),
        }
    }
}

impl Priority {
    /// Returns an emoji representation of the priority.
    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🟠",
            Priority::Critical => "🔴",
        }
    }
}

/// A finding produced by the insight rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Area the insight belongs to (Compliance, Correlation, Trend, ...).
    pub category: String,
    /// Short title.
    pub title: String,
    /// Human-readable explanation with the numbers that triggered it.
    pub description: String,
    /// Priority of the insight.
    pub priority: Priority,
    /// When the aggregation pass produced it.
    pub generated_at: DateTime<Utc>,
}

/// A threshold breach produced by the alert rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Card name, or "Summary" for aggregate-level alerts.
    pub source: String,
    /// Short title.
    pub title: String,
    /// Human-readable explanation with the numbers that triggered it.
    pub message: String,
    /// Priority of the alert.
    pub priority: Priority,
    /// When the aggregation pass raised it.
    pub raised_at: DateTime<Utc>,
}

/// Qualitative strength of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    /// |r| < 0.2
    VeryWeak,
    /// 0.2 <= |r| < 0.4
    Weak,
    /// 0.4 <= |r| < 0.6
    Moderate,
    /// 0.6 <= |r| < 0.8
    Strong,
    /// |r| >= 0.8
    VeryStrong,
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationStrength::VeryWeak => write!(f, "Very Weak"),
            CorrelationStrength::Weak => write!(f, "Weak"),
            CorrelationStrength::Moderate => write!(f, "Moderate"),
            CorrelationStrength::Strong => write!(f, "Strong"),
            CorrelationStrength::VeryStrong => write!(f, "Very Strong"),
        }
    }
}

/// Pearson correlation between two card series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Label of the first series.
    pub source_a: String,
    /// Label of the second series.
    pub source_b: String,
    /// Coefficient in [-1, 1].
    pub coefficient: f64,
    /// Strength bucket of |coefficient|.
    pub strength: CorrelationStrength,
}

/// Overall data health bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "Excellent"),
            HealthStatus::Good => write!(f, "Good"),
            HealthStatus::Fair => write!(f, "Fair"),
            HealthStatus::Poor => write!(f, "Poor"),
            HealthStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// The scoring outcome for one subject, as handed to the report layer.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectScore {
    /// Stock symbol.
    pub symbol: String,
    /// Who asked for the score.
    pub requester: String,
    /// The four sub-scores and the overall score.
    pub score: CompositeScore,
    /// Rating derived from the score.
    pub recommendation: Recommendation,
    /// When the score was computed (earlier than now when served from cache).
    pub computed_at: DateTime<Utc>,
    /// Whether the score came from the freshness cache.
    pub from_cache: bool,
}

/// Counts of findings by priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSummary {
    /// Total number of insights and alerts.
    pub total: usize,
    /// Number of critical findings.
    pub critical: usize,
    /// Number of high priority findings.
    pub high: usize,
    /// Number of medium priority findings.
    pub medium: usize,
    /// Number of low priority findings.
    pub low: usize,
}

impl FindingSummary {
    /// Creates a summary from the priorities of all findings.
    pub fn from_priorities<I>(priorities: I) -> Self
    where
        I: IntoIterator<Item = Priority>,
    {
        let mut summary = Self::default();

        for priority in priorities {
            summary.total += 1;
            match priority {
                Priority::Critical => summary.critical += 1,
                Priority::High => summary.high += 1,
                Priority::Medium => summary.medium += 1,
                Priority::Low => summary.low += 1,
            }
        }

        summary
    }
}

/// Metadata about a report run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the input came from (a path or "demo (seed N)").
    pub source: String,
    /// Evaluation instant every computation was anchored to.
    pub as_of: DateTime<Utc>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Number of subjects scored.
    pub subjects_scored: usize,
    /// Number of those served from the cache.
    pub cache_hits: usize,
    /// Number of metric cards aggregated.
    pub cards_aggregated: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Metadata about the run.
    pub metadata: ReportMetadata,
    /// Subject scores, best overall score first.
    pub subjects: Vec<SubjectScore>,
    /// Card aggregation, when the input carried cards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<AggregateSummary>,
    /// Counts of insights and alerts by priority.
    pub findings: FindingSummary,
}

impl Report {
    /// Returns true when any alert is at or above `threshold`.
    pub fn has_alert_at_or_above(&self, threshold: Priority) -> bool {
        self.summary
            .as_ref()
            .map(|s| s.alerts.iter().any(|a| a.priority >= threshold))
            .unwrap_or(false)
    }

    /// Drops insights and alerts below `min` and recounts the findings.
    pub fn retain_min_priority(&mut self, min: Priority) {
        if let Some(summary) = self.summary.as_mut() {
            summary.insights.retain(|i| i.priority >= min);
            summary.alerts.retain(|a| a.priority >= min);
        }
        self.recount_findings();
    }

    /// Recomputes `findings` from the current insights and alerts.
    pub fn recount_findings(&mut self) {
        self.findings = match &self.summary {
            Some(summary) => FindingSummary::from_priorities(
                summary
                    .insights
                    .iter()
                    .map(|i| i.priority)
                    .chain(summary.alerts.iter().map(|a| a.priority)),
            ),
            None => FindingSummary::default(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert!(Priority::High < Priority::Critical);
    }

    #[test]
    fn test_priority_emoji() {
        assert_eq!(Priority::Critical.emoji(), "🔴");
        assert_eq!(Priority::High.emoji(), "🟠");
        assert_eq!(Priority::Medium.emoji(), "🟡");
        assert_eq!(Priority::Low.emoji(), "🟢");
    }

    #[test]
    fn test_strength_display() {
        assert_eq!(CorrelationStrength::VeryStrong.to_string(), "Very Strong");
        assert_eq!(CorrelationStrength::VeryWeak.to_string(), "Very Weak");
    }

    #[test]
    fn test_finding_summary() {
        let summary = FindingSummary::from_priorities(vec![
            Priority::Critical,
            Priority::High,
            Priority::High,
            Priority::Low,
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
    }
}
