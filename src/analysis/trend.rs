//! Trend labels derived from month-over-month growth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative bucket for a growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    StronglyIncreasing,
    Increasing,
    Stable,
    Decreasing,
    StronglyDecreasing,
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendLabel::StronglyIncreasing => write!(f, "Strongly Increasing"),
            TrendLabel::Increasing => write!(f, "Increasing"),
            TrendLabel::Stable => write!(f, "Stable"),
            TrendLabel::Decreasing => write!(f, "Decreasing"),
            TrendLabel::StronglyDecreasing => write!(f, "Strongly Decreasing"),
        }
    }
}

/// Growth-rate cut points, in percent. A rate must be strictly above a
/// cut point to land in the bucket above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendThresholds {
    pub strong_up: f64,
    pub up: f64,
    pub down: f64,
    pub strong_down: f64,
}

impl TrendThresholds {
    pub const fn new(strong_up: f64, up: f64, down: f64, strong_down: f64) -> Self {
        Self {
            strong_up,
            up,
            down,
            strong_down,
        }
    }

    /// Trading volume and contracts.
    pub const STANDARD: Self = Self::new(15.0, 8.0, -8.0, -15.0);
    pub const LOBBYING: Self = Self::new(20.0, 10.0, -10.0, -20.0);
    pub const PATENTS: Self = Self::new(25.0, 15.0, -5.0, -15.0);
    pub const SENTIMENT: Self = Self::new(15.0, 8.0, -8.0, -15.0);
}

/// Buckets a growth rate with the given cut points.
pub fn trend_label(growth_rate: f64, thresholds: &TrendThresholds) -> TrendLabel {
    if growth_rate > thresholds.strong_up {
        TrendLabel::StronglyIncreasing
    } else if growth_rate > thresholds.up {
        TrendLabel::Increasing
    } else if growth_rate > thresholds.down {
        TrendLabel::Stable
    } else if growth_rate > thresholds.strong_down {
        TrendLabel::Decreasing
    } else {
        TrendLabel::StronglyDecreasing
    }
}
