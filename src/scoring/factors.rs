//! Labelled factor observations.
//!
//! A [`FactorSet`] maps free-form labels such as `"Q3 Revenue Growth"` or
//! `"Year 2 P/E"` to raw values. Scorers pick values out of a set by family,
//! where a family is a case-insensitive substring of the label.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label substrings identifying each factor family.
pub mod family {
    pub const DEBT_EQUITY: &str = "debt/equity";
    pub const BETA: &str = "beta";

    pub const PROFIT_MARGIN: &str = "profit margin";
    pub const OPERATING_MARGIN: &str = "operating margin";
    pub const DIVIDEND_YIELD: &str = "dividend yield";
    pub const EBITDA_SALES: &str = "ebitda/sales";

    pub const PE: &str = "p/e";
    pub const PEG: &str = "peg";
    pub const PB: &str = "p/b";
    pub const EV_REVENUE: &str = "ev/revenue";
    pub const EPS: &str = "eps";
    pub const MARKET_CAP: &str = "market cap";
}

/// A labelled collection of raw numeric observations for one score family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorSet {
    values: BTreeMap<String, f64>,
}

impl FactorSet {
    /// Creates an empty factor set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, label: impl Into<String>, value: f64) -> Self {
        self.insert(label, value);
        self
    }

    /// Inserts or replaces one observation.
    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.values.insert(label.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over every value regardless of label.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }

    /// Iterates over the values whose label contains `needle`, ignoring case.
    pub fn family<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = f64> + 'a {
        let needle = needle.to_lowercase();
        self.values
            .iter()
            .filter(move |(label, _)| label.to_lowercase().contains(&needle))
            .map(|(_, value)| *value)
    }

    /// Average of a family, or `None` when no label matches.
    pub fn family_average(&self, needle: &str) -> Option<f64> {
        mean(self.family(needle))
    }

    /// Average of every value, or `None` when the set is empty.
    pub fn average(&self) -> Option<f64> {
        mean(self.values())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FactorSet {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
