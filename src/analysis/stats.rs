//! Summary statistics used by the aggregator.
//!
//! Every function guards its denominators and returns a defined fallback
//! (usually 0) for degenerate input.

use crate::models::{CorrelationStrength, HealthStatus};
use chrono::{DateTime, Duration, Utc};

/// Share of records that are recent, as a percentage.
pub fn data_quality(recent_count: usize, total_count: usize) -> f64 {
    if total_count == 0 {
        return 0.0;
    }
    recent_count as f64 / total_count as f64 * 100.0
}

/// Freshness score for an age in days. Breakpoints are inclusive.
pub fn freshness_for_days(days: f64) -> f64 {
    if days <= 1.0 {
        100.0
    } else if days <= 7.0 {
        80.0
    } else if days <= 30.0 {
        60.0
    } else if days <= 90.0 {
        40.0
    } else {
        20.0
    }
}

/// Freshness score for a last-update instant seen from `now`.
pub fn update_freshness(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    freshness_for_age(now - last_updated)
}

/// Freshness score for an exact age. Breakpoints are inclusive; a future
/// stamp counts as fresh.
pub fn freshness_for_age(age: Duration) -> f64 {
    if age <= Duration::days(1) {
        100.0
    } else if age <= Duration::days(7) {
        80.0
    } else if age <= Duration::days(30) {
        60.0
    } else if age <= Duration::days(90) {
        40.0
    } else {
        20.0
    }
}

/// Share of expected cards that are present, as a percentage capped at 100.
pub fn coverage_score(present_count: usize, expected_count: usize) -> f64 {
    if expected_count == 0 {
        return 0.0;
    }
    (present_count as f64 / expected_count as f64 * 100.0).min(100.0)
}

/// Average of the three health inputs.
pub fn health_score(quality: f64, freshness: f64, coverage: f64) -> f64 {
    (quality + freshness + coverage) / 3.0
}

/// Health bucket for the average of quality, freshness and coverage.
pub fn health_status(quality: f64, freshness: f64, coverage: f64) -> HealthStatus {
    let score = health_score(quality, freshness, coverage);
    if score >= 90.0 {
        HealthStatus::Excellent
    } else if score >= 80.0 {
        HealthStatus::Good
    } else if score >= 70.0 {
        HealthStatus::Fair
    } else if score >= 60.0 {
        HealthStatus::Poor
    } else {
        HealthStatus::Critical
    }
}

/// Pearson correlation coefficient of two equal-length series.
///
/// Returns 0 when the lengths differ, when there are fewer than two
/// points, or when either series has no variance.
pub fn pearson_correlation(series_a: &[f64], series_b: &[f64]) -> f64 {
    let n = series_a.len();
    if n != series_b.len() || n < 2 {
        return 0.0;
    }

    let mean_a = mean(series_a);
    let mean_b = mean(series_b);

    let mut covariance = 0.0;
    let mut ss_a = 0.0;
    let mut ss_b = 0.0;
    for (a, b) in series_a.iter().zip(series_b) {
        let da = a - mean_a;
        let db = b - mean_b;
        covariance += da * db;
        ss_a += da * da;
        ss_b += db * db;
    }

    if ss_a == 0.0 || ss_b == 0.0 {
        return 0.0;
    }

    (covariance / (ss_a.sqrt() * ss_b.sqrt())).clamp(-1.0, 1.0)
}

/// Strength bucket for a coefficient, by absolute value.
pub fn correlation_strength(coefficient: f64) -> CorrelationStrength {
    let r = coefficient.abs();
    if r >= 0.8 {
        CorrelationStrength::VeryStrong
    } else if r >= 0.6 {
        CorrelationStrength::Strong
    } else if r >= 0.4 {
        CorrelationStrength::Moderate
    } else if r >= 0.2 {
        CorrelationStrength::Weak
    } else {
        CorrelationStrength::VeryWeak
    }
}

/// Percentage change from `previous` to `current`; 0 when `previous` is 0.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
