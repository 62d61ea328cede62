//! GRPV composite factor scoring.
//!
//! Each scorer turns one [`FactorSet`] into a 0-100 score. Degenerate input
//! yields a defined default instead of an error so callers always get a
//! number back.

use super::factors::{family, FactorSet};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Lower and upper edge of the growth range mapped onto 0-100.
const GROWTH_FLOOR: f64 = -0.10;
const GROWTH_SPAN: f64 = 0.40;

/// Returned by the risk scorer when fewer than two factors are present.
/// Arbitrary tuning: missing data reads as medium risk.
pub const NEUTRAL_RISK_SCORE: f64 = 50.0;

const DEBT_SCALE: f64 = 50.0;
const BETA_SCALE: f64 = 66.67;
const DEFAULT_BETA: f64 = 1.0;
const BETA_WEIGHT: f64 = 0.6;
const DEBT_WEIGHT: f64 = 0.4;

/// (family, ceiling as a fraction, weight)
const PROFITABILITY_FAMILIES: [(&str, f64, f64); 4] = [
    (family::PROFIT_MARGIN, 0.30, 0.3),
    (family::OPERATING_MARGIN, 0.40, 0.3),
    (family::DIVIDEND_YIELD, 0.05, 0.2),
    (family::EBITDA_SALES, 0.50, 0.2),
];

/// Valuation defaults used when a family is absent. Arbitrary tuning.
pub mod valuation_defaults {
    pub const PE: f64 = 20.0;
    pub const PEG: f64 = 2.0;
    pub const PB: f64 = 5.0;
    pub const EV_REVENUE: f64 = 8.0;
    pub const EPS: f64 = 0.0;
    pub const MARKET_CAP_RELATIVE: f64 = 1.0;
}

const OVERALL_WEIGHT: f64 = 0.25;

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Four GRPV sub-scores. `overall` is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CompositeScoreRepr", into = "CompositeScoreRepr")]
pub struct CompositeScore {
    growth: f64,
    risk: f64,
    profitability: f64,
    valuation: f64,
}

impl CompositeScore {
    /// Builds a score, clamping every sub-score into [0, 100].
    pub fn new(growth: f64, risk: f64, profitability: f64, valuation: f64) -> Self {
        Self {
            growth: clamp_score(growth),
            risk: clamp_score(risk),
            profitability: clamp_score(profitability),
            valuation: clamp_score(valuation),
        }
    }

    pub fn growth(&self) -> f64 {
        self.growth
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }

    pub fn profitability(&self) -> f64 {
        self.profitability
    }

    pub fn valuation(&self) -> f64 {
        self.valuation
    }

    /// Equal-weighted average of the four sub-scores.
    pub fn overall(&self) -> f64 {
        compute_overall_score(self)
    }

    /// Sub-scores paired with their category names, in GRPV order.
    pub fn categories(&self) -> [(&'static str, f64); 4] {
        [
            ("Growth", self.growth),
            ("Risk", self.risk),
            ("Profitability", self.profitability),
            ("Valuation", self.valuation),
        ]
    }
}

/// Wire form of [`CompositeScore`]; `overall` is written out and ignored on read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CompositeScoreRepr {
    growth: f64,
    risk: f64,
    profitability: f64,
    valuation: f64,
    #[serde(default)]
    overall: f64,
}

impl From<CompositeScoreRepr> for CompositeScore {
    fn from(repr: CompositeScoreRepr) -> Self {
        CompositeScore::new(repr.growth, repr.risk, repr.profitability, repr.valuation)
    }
}

impl From<CompositeScore> for CompositeScoreRepr {
    fn from(score: CompositeScore) -> Self {
        Self {
            growth: score.growth,
            risk: score.risk,
            profitability: score.profitability,
            valuation: score.valuation,
            overall: score.overall(),
        }
    }
}

/// Average growth rate mapped from [-10%, +30%] onto [0, 100].
pub fn compute_growth_score(factors: &FactorSet) -> f64 {
    let Some(avg) = factors.average() else {
        return 0.0;
    };
    clamp_score((avg - GROWTH_FLOOR) / GROWTH_SPAN * 100.0)
}

/// Leverage and volatility combined into a score where higher is safer.
pub fn compute_risk_score(factors: &FactorSet) -> f64 {
    if factors.len() < 2 {
        trace!(entries = factors.len(), "insufficient risk factors, using neutral score");
        return NEUTRAL_RISK_SCORE;
    }

    let debt_score = factors
        .family_average(family::DEBT_EQUITY)
        .map(|avg| (avg * DEBT_SCALE).min(100.0))
        .unwrap_or(0.0);
    let beta = factors.family_average(family::BETA).unwrap_or(DEFAULT_BETA);
    let beta_score = (beta * BETA_SCALE).min(100.0);

    let combined = BETA_WEIGHT * beta_score + DEBT_WEIGHT * debt_score;
    clamp_score(100.0 - combined)
}

/// Margins and yield scaled against per-family ceilings.
pub fn compute_profitability_score(factors: &FactorSet) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }

    let total: f64 = PROFITABILITY_FAMILIES
        .iter()
        .map(|(needle, ceiling, weight)| {
            let avg = factors.family_average(needle).unwrap_or(0.0);
            clamp_score(avg / ceiling * 100.0) * weight
        })
        .sum();

    clamp_score(total)
}

/// Valuation multiples where cheaper scores higher; EPS is the exception.
pub fn compute_valuation_score(factors: &FactorSet) -> f64 {
    use valuation_defaults as d;

    let pe = factors.family_average(family::PE).unwrap_or(d::PE);
    let peg = factors.family_average(family::PEG).unwrap_or(d::PEG);
    let pb = factors.family_average(family::PB).unwrap_or(d::PB);
    let ev_revenue = factors
        .family_average(family::EV_REVENUE)
        .unwrap_or(d::EV_REVENUE);
    let eps = factors.family_average(family::EPS).unwrap_or(d::EPS);
    let market_cap = factors
        .family_average(family::MARKET_CAP)
        .unwrap_or(d::MARKET_CAP_RELATIVE);

    let weighted = [
        (clamp_score(100.0 - pe * 2.5), 0.2),
        (clamp_score(100.0 - peg * 25.0), 0.2),
        (clamp_score(100.0 - pb * 10.0), 0.15),
        (clamp_score(100.0 - ev_revenue * 6.25), 0.15),
        (clamp_score(eps * 10.0), 0.2),
        (clamp_score(100.0 - market_cap * 50.0), 0.1),
    ];

    clamp_score(weighted.iter().map(|(score, weight)| score * weight).sum())
}

/// Equal-weighted average of the four sub-scores.
pub fn compute_overall_score(sub: &CompositeScore) -> f64 {
    OVERALL_WEIGHT * (sub.growth + sub.risk + sub.profitability + sub.valuation)
}

/// Runs all four scorers for one subject.
pub fn score_subject(
    growth: &FactorSet,
    risk: &FactorSet,
    profitability: &FactorSet,
    valuation: &FactorSet,
) -> CompositeScore {
    CompositeScore::new(
        compute_growth_score(growth),
        compute_risk_score(risk),
        compute_profitability_score(profitability),
        compute_valuation_score(valuation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn in_range(v: f64) -> bool {
        (0.0..=100.0).contains(&v)
    }

    #[test]
    fn test_growth_score_scenario() {
        let factors = FactorSet::new()
            .with("Q1 Revenue Growth", 0.20)
            .with("Q2 Revenue Growth", 0.10);
        assert!((compute_growth_score(&factors) - 62.5).abs() < EPS);
    }

    #[test]
    fn test_growth_score_bounds() {
        assert_eq!(compute_growth_score(&FactorSet::new()), 0.0);
        let boom = FactorSet::new().with("Q1 Revenue Growth", 2.0);
        assert_eq!(compute_growth_score(&boom), 100.0);
        let bust = FactorSet::new().with("Q1 Revenue Growth", -0.5);
        assert_eq!(compute_growth_score(&bust), 0.0);
    }

    #[test]
    fn test_risk_score_scenario() {
        let factors = FactorSet::new()
            .with("Year 1 Debt/Equity", 1.0)
            .with("Beta", 1.5);
        assert!((compute_risk_score(&factors) - 20.0).abs() < EPS);
    }

    #[test]
    fn test_risk_score_insufficient_data_is_neutral() {
        assert_eq!(compute_risk_score(&FactorSet::new()), 50.0);
        assert_eq!(compute_risk_score(&FactorSet::new().with("Beta", 3.0)), 50.0);
    }

    #[test]
    fn test_risk_score_defaults_beta_to_one() {
        let factors = FactorSet::new()
            .with("Year 1 Debt/Equity", 0.5)
            .with("Year 2 Debt/Equity", 0.5);
        // debt 25, beta 66.67 -> combined 50.002
        assert!((compute_risk_score(&factors) - 49.998).abs() < 1e-6);
    }

    #[test]
    fn test_profitability_score() {
        let factors = FactorSet::new()
            .with("Profit Margin", 0.15)
            .with("Operating Margin", 0.20)
            .with("Dividend Yield", 0.025)
            .with("EBITDA/Sales", 0.25);
        // every family sits at half its ceiling
        assert!((compute_profitability_score(&factors) - 50.0).abs() < 1e-6);
        assert_eq!(compute_profitability_score(&FactorSet::new()), 0.0);
    }

    #[test]
    fn test_profitability_family_is_capped() {
        let factors = FactorSet::new().with("Dividend Yield", 0.50);
        // capped at 100 before weighting
        assert!((compute_profitability_score(&factors) - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_valuation_defaults() {
        // every default maps to 50 except EPS which maps to 0
        let expected = 50.0 * (0.2 + 0.2 + 0.15 + 0.15 + 0.1);
        assert!((compute_valuation_score(&FactorSet::new()) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_valuation_cheap_beats_expensive() {
        let cheap = FactorSet::new()
            .with("Year 1 P/E", 8.0)
            .with("PEG", 0.8)
            .with("P/B", 1.2)
            .with("EPS", 6.0);
        let expensive = FactorSet::new()
            .with("Year 1 P/E", 60.0)
            .with("PEG", 4.0)
            .with("P/B", 15.0)
            .with("EPS", 0.5);
        assert!(compute_valuation_score(&cheap) > compute_valuation_score(&expensive));
    }

    #[test]
    fn test_overall_is_equal_weighted() {
        let score = CompositeScore::new(62.5, 20.0, 50.0, 40.0);
        assert_eq!(score.overall(), 0.25 * (62.5 + 20.0 + 50.0 + 40.0));
    }

    #[test]
    fn test_composite_clamps_sub_scores() {
        let score = CompositeScore::new(150.0, -5.0, f64::NAN, 42.0);
        assert_eq!(score.growth(), 100.0);
        assert_eq!(score.risk(), 0.0);
        assert_eq!(score.profitability(), 0.0);
        assert!(in_range(score.overall()));
    }

    #[test]
    fn test_all_scores_in_range_for_extreme_input() {
        let wild = FactorSet::new()
            .with("Q1 Revenue Growth", -1e9)
            .with("Debt/Equity", 1e9)
            .with("Beta", -1e9)
            .with("Profit Margin", 1e9)
            .with("P/E", -1e9)
            .with("EPS", 1e9);

        let score = score_subject(&wild, &wild, &wild, &wild);
        for (_, value) in score.categories() {
            assert!(in_range(value));
        }
        assert!(in_range(score.overall()));
    }

    #[test]
    fn test_json_includes_overall() {
        let score = CompositeScore::new(80.0, 60.0, 40.0, 20.0);
        let json = serde_json::to_value(score).unwrap();
        assert_eq!(json["overall"], 50.0);

        let back: CompositeScore = serde_json::from_value(json).unwrap();
        assert_eq!(back, score);
    }
}
