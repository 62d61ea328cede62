//! Freshness cache for composite scores.
//!
//! A score computed for a `(symbol, requester)` pair is reused while it is
//! younger than the TTL (24 hours by default). Each key owns its own slot
//! mutex, so concurrent callers asking for the same key wait for a single
//! recomputation instead of racing.

use super::grpv::CompositeScore;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Default freshness window.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Longest freshness window a cache accepts, in hours.
pub const MAX_TTL_HOURS: i64 = 87_600;

/// TTL for an hour count, clamped to `0..=MAX_TTL_HOURS`.
pub fn ttl_from_hours(hours: i64) -> Duration {
    Duration::hours(hours.clamp(0, MAX_TTL_HOURS))
}

/// Cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreKey {
    pub symbol: String,
    pub requester: String,
}

impl ScoreKey {
    pub fn new(symbol: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            requester: requester.into(),
        }
    }
}

/// A stored score and when it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedScore {
    pub score: CompositeScore,
    pub computed_at: DateTime<Utc>,
}

/// Result of [`ScoreCache::get_or_compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheOutcome {
    pub entry: CachedScore,
    /// True when the stored entry was fresh and reused.
    pub hit: bool,
}

/// On-disk form of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    #[serde(flatten)]
    key: ScoreKey,
    #[serde(flatten)]
    entry: CachedScore,
}

type Slot = Arc<Mutex<Option<CachedScore>>>;

/// Score cache shared across scoring tasks.
#[derive(Debug)]
pub struct ScoreCache {
    ttl: Duration,
    slots: Mutex<HashMap<ScoreKey, Slot>>,
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::with_ttl_hours(DEFAULT_TTL_HOURS)
    }
}

impl ScoreCache {
    /// Creates an empty cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl_hours(hours: i64) -> Self {
        Self::new(ttl_from_hours(hours))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// An entry is fresh while its age is within the TTL, inclusive.
    pub fn is_fresh(&self, entry: &CachedScore, now: DateTime<Utc>) -> bool {
        now - entry.computed_at <= self.ttl
    }

    /// Number of keys with a stored entry, fresh or not.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored entry for `key` if it is still fresh at `now`.
    pub fn get(&self, key: &ScoreKey, now: DateTime<Utc>) -> Option<CachedScore> {
        let slot = self.slots.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()?;
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        (*guard).filter(|entry| self.is_fresh(entry, now))
    }

    /// Returns the fresh entry for `key`, or runs `compute` and stores its
    /// result stamped with `now`. Callers for the same key are serialized.
    pub fn get_or_compute<F>(&self, key: &ScoreKey, now: DateTime<Utc>, compute: F) -> CacheOutcome
    where
        F: FnOnce() -> CompositeScore,
    {
        let slot = self.slot(key);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry, now) {
                debug!(symbol = %key.symbol, requester = %key.requester, "score cache hit");
                return CacheOutcome {
                    entry: *entry,
                    hit: true,
                };
            }
        }

        let entry = CachedScore {
            score: compute(),
            computed_at: now,
        };
        *guard = Some(entry);
        debug!(symbol = %key.symbol, requester = %key.requester, "score computed");

        CacheOutcome { entry, hit: false }
    }

    /// Stores an entry unconditionally.
    pub fn insert(&self, key: ScoreKey, entry: CachedScore) {
        let slot = self.slot(&key);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    fn slot(&self, key: &ScoreKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key.clone()).or_default().clone()
    }

    /// Loads a cache file. A missing file gives an empty cache.
    pub fn load(path: &Path, ttl: Duration) -> Result<Self> {
        let cache = Self::new(ttl);

        if !path.exists() {
            debug!("No score cache at {}, starting empty", path.display());
            return Ok(cache);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read score cache: {}", path.display()))?;
        let entries: Vec<PersistedEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse score cache: {}", path.display()))?;

        info!("Loaded {} cached scores from {}", entries.len(), path.display());
        for persisted in entries {
            cache.insert(persisted.key, persisted.entry);
        }

        Ok(cache)
    }

    /// Writes every stored entry to `path`, sorted by key.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut entries: Vec<PersistedEntry> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .filter_map(|(key, slot)| {
                    let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
                    (*guard).map(|entry| PersistedEntry {
                        key: key.clone(),
                        entry,
                    })
                })
                .collect()
        };
        entries.sort_by(|a, b| {
            (&a.key.symbol, &a.key.requester).cmp(&(&b.key.symbol, &b.key.requester))
        });

        let content = serde_json::to_string_pretty(&entries)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write score cache: {}", path.display()))?;

        info!("Saved {} cached scores to {}", entries.len(), path.display());
        Ok(())
    }
}
