//! Concurrent scoring of many subjects over a shared cache.
//!
//! Scoring is pure and cheap, but a snapshot can carry many subjects. Each
//! subject is scored on a blocking task, bounded by `concurrency`; the
//! [`ScoreCache`] is the only shared state.

use crate::input::SubjectInput;
use crate::models::SubjectScore;
use crate::scoring::{score_subject, Recommendation, ScoreCache, ScoreKey};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, info};

/// Scores one subject, reusing a fresh cached score when there is one.
pub fn score_one(cache: &ScoreCache, subject: &SubjectInput, now: DateTime<Utc>) -> SubjectScore {
    let key = ScoreKey::new(subject.symbol.clone(), subject.requester.clone());
    let outcome = cache.get_or_compute(&key, now, || {
        score_subject(
            &subject.growth,
            &subject.risk,
            &subject.profitability,
            &subject.valuation,
        )
    });

    let score = outcome.entry.score;
    debug!(
        symbol = %subject.symbol,
        overall = score.overall(),
        cached = outcome.hit,
        "scored subject"
    );

    SubjectScore {
        symbol: subject.symbol.clone(),
        requester: subject.requester.clone(),
        score,
        recommendation: Recommendation::from_score(&score),
        computed_at: outcome.entry.computed_at,
        from_cache: outcome.hit,
    }
}

/// Scores every subject, best overall score first.
pub async fn score_subjects(
    subjects: Vec<SubjectInput>,
    cache: Arc<ScoreCache>,
    now: DateTime<Utc>,
    concurrency: usize,
    show_progress: bool,
) -> Result<Vec<SubjectScore>> {
    let progress = progress_bar(subjects.len() as u64, show_progress);

    let results: Vec<_> = stream::iter(subjects)
        .map(|subject| {
            let cache = Arc::clone(&cache);
            tokio::task::spawn_blocking(move || score_one(&cache, &subject, now))
        })
        .buffer_unordered(concurrency.max(1))
        .inspect(|_| progress.inc(1))
        .collect()
        .await;

    progress.finish_and_clear();

    let mut scores = Vec::with_capacity(results.len());
    for result in results {
        scores.push(result.context("Scoring task failed")?);
    }

    scores.sort_by(|a, b| {
        b.score
            .overall()
            .partial_cmp(&a.score.overall())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
            .then_with(|| a.requester.cmp(&b.requester))
    });

    let hits = scores.iter().filter(|s| s.from_cache).count();
    info!("Scored {} subjects ({} from cache)", scores.len(), hits);

    Ok(scores)
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} subjects")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
