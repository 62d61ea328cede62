//! Typed recommendation derived from a composite score.

use super::grpv::CompositeScore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rating bucket for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl Rating {
    /// Buckets an overall score: 80 / 65 / 45 / 30.
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 80.0 {
            Rating::StrongBuy
        } else if overall >= 65.0 {
            Rating::Buy
        } else if overall >= 45.0 {
            Rating::Hold
        } else if overall >= 30.0 {
            Rating::Sell
        } else {
            Rating::StrongSell
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::StrongSell => write!(f, "Strong Sell"),
            Rating::Sell => write!(f, "Sell"),
            Rating::Hold => write!(f, "Hold"),
            Rating::Buy => write!(f, "Buy"),
            Rating::StrongBuy => write!(f, "Strong Buy"),
        }
    }
}

/// What the report shows next to a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rating: Rating,
    /// Category with the highest sub-score.
    pub strongest: String,
    /// Category with the lowest sub-score.
    pub weakest: String,
}

impl Recommendation {
    /// Derives a recommendation. Ties resolve to the earlier GRPV category.
    pub fn from_score(score: &CompositeScore) -> Self {
        let categories = score.categories();

        let mut strongest = categories[0];
        let mut weakest = categories[0];
        for candidate in &categories[1..] {
            if candidate.1 > strongest.1 {
                strongest = *candidate;
            }
            if candidate.1 < weakest.1 {
                weakest = *candidate;
            }
        }

        Self {
            rating: Rating::from_overall(score.overall()),
            strongest: strongest.0.to_string(),
            weakest: weakest.0.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_buckets() {
        assert_eq!(Rating::from_overall(95.0), Rating::StrongBuy);
        assert_eq!(Rating::from_overall(80.0), Rating::StrongBuy);
        assert_eq!(Rating::from_overall(70.0), Rating::Buy);
        assert_eq!(Rating::from_overall(45.0), Rating::Hold);
        assert_eq!(Rating::from_overall(30.0), Rating::Sell);
        assert_eq!(Rating::from_overall(0.0), Rating::StrongSell);
    }

    #[test]
    fn test_strongest_and_weakest() {
        let score = CompositeScore::new(62.5, 20.0, 75.0, 40.0);
        let rec = Recommendation::from_score(&score);
        assert_eq!(rec.strongest, "Profitability");
        assert_eq!(rec.weakest, "Risk");
        assert_eq!(rec.rating, Rating::Hold);
    }

    #[test]
    fn test_ties_resolve_to_first_category() {
        let score = CompositeScore::new(50.0, 50.0, 50.0, 50.0);
        let rec = Recommendation::from_score(&score);
        assert_eq!(rec.strongest, "Growth");
        assert_eq!(rec.weakest, "Growth");
    }
}
