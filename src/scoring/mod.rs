//! GRPV (Growth/Risk/Profitability/Valuation) composite scoring.
//!
//! The scorers are pure functions of their factor sets. The cache sits in
//! front of them and decides whether a stored score is still fresh.

pub mod cache;
pub mod factors;
pub mod grpv;
pub mod recommendation;

pub use cache::{CacheOutcome, CachedScore, ScoreCache, ScoreKey};
pub use factors::FactorSet;
pub use grpv::{
    compute_growth_score, compute_overall_score, compute_profitability_score,
    compute_risk_score, compute_valuation_score, score_subject, CompositeScore,
};
pub use recommendation::{Rating, Recommendation};
