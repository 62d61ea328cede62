//! Cross-card statistical aggregation.
//!
//! Metric cards are summarised independently, then combined into data-health
//! indicators, pairwise correlations and rule-based insights and alerts.

pub mod aggregator;
pub mod cards;
pub mod insights;
pub mod stats;
pub mod trend;

pub use aggregator::*;
pub use cards::{CardKind, CardSet, CardSummary, MetricCard};
pub use trend::{TrendLabel, TrendThresholds};
