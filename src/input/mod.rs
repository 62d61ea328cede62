//! Snapshot loading.
//!
//! A snapshot is the JSON document the data-fetch layer hands over: factor
//! sets per subject and raw metric cards. Input can be a single file or a
//! directory of `.json` files, which are merged into one snapshot.

use crate::analysis::CardSet;
use crate::error::InputError;
use crate::scoring::FactorSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Requester recorded when a subject does not name one.
pub const ANONYMOUS_REQUESTER: &str = "anonymous";

fn default_requester() -> String {
    ANONYMOUS_REQUESTER.to_string()
}

/// Raw factor sets for one stock symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInput {
    pub symbol: String,
    #[serde(default = "default_requester")]
    pub requester: String,
    #[serde(default)]
    pub growth: FactorSet,
    #[serde(default)]
    pub risk: FactorSet,
    #[serde(default)]
    pub profitability: FactorSet,
    #[serde(default)]
    pub valuation: FactorSet,
}

/// One input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Evaluation instant; the run's start time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subjects: Vec<SubjectInput>,
    #[serde(default)]
    pub cards: CardSet,
}

impl Snapshot {
    /// Folds another snapshot in: subjects appended, card records appended
    /// per kind, latest `as_of` kept.
    pub fn merge(&mut self, other: Snapshot) {
        self.as_of = match (self.as_of, other.as_of) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.subjects.extend(other.subjects);
        self.cards.merge(other.cards);
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.cards.is_empty()
    }
}

/// Options for discovering snapshot files under a directory.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory names to skip (hidden entries are always skipped).
    pub excludes: Vec<String>,
    /// Files larger than this are skipped, in bytes.
    pub max_file_size: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            excludes: vec!["target", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 64 * 1024 * 1024,
        }
    }
}

impl LoadOptions {
    fn is_excluded(&self, name: &str) -> bool {
        name.starts_with('.') || self.excludes.iter().any(|pattern| name == pattern)
    }
}

/// Loads and merges every snapshot at `path`.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Snapshot, InputError> {
    let files = discover(path, options)?;
    let mut merged = Snapshot::default();

    for file in &files {
        let snapshot = read_snapshot(file)?;
        debug!(
            "{}: {} subjects, {} cards",
            file.display(),
            snapshot.subjects.len(),
            snapshot.cards.len()
        );
        merged.merge(snapshot);
    }

    info!(
        "Loaded {} snapshot files: {} subjects, {} cards",
        files.len(),
        merged.subjects.len(),
        merged.cards.len()
    );
    Ok(merged)
}

/// Lists the snapshot files at `path`, sorted for a stable merge order.
pub fn discover(path: &Path, options: &LoadOptions) -> Result<Vec<PathBuf>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !options.is_excluded(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry.map_err(|source| InputError::Walk {
            path: path.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let entry_path = entry.path();
        let is_json = entry_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) if metadata.len() > options.max_file_size => {
                warn!(
                    "Skipping {} ({} bytes exceeds limit)",
                    entry_path.display(),
                    metadata.len()
                );
            }
            _ => files.push(entry_path.to_path_buf()),
        }
    }

    if files.is_empty() {
        return Err(InputError::NoSnapshots(path.to_path_buf()));
    }

    Ok(files)
}

/// Reads and parses one snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SUBJECT_JSON: &str = r#"{
        "as_of": "2026-06-30T00:00:00Z",
        "subjects": [{
            "symbol": "AAPL",
            "growth": {"Q1 Revenue Growth": 0.20, "Q2 Revenue Growth": 0.10},
            "risk": {"Year 1 Debt/Equity": 1.0, "Beta": 1.5}
        }]
    }"#;

    const CARDS_JSON: &str = r#"{
        "as_of": "2026-07-01T00:00:00Z",
        "cards": {
            "contracts": {
                "records": [{
                    "agency": "NASA",
                    "recipient": "Acme",
                    "amount": 1000000.0,
                    "awarded_on": "2026-06-15",
                    "compliant": true
                }]
            }
        }
    }"#;

    #[test]
    fn test_read_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, SUBJECT_JSON).unwrap();

        let snapshot = load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(snapshot.subjects.len(), 1);
        assert_eq!(snapshot.subjects[0].requester, ANONYMOUS_REQUESTER);
        assert_eq!(snapshot.subjects[0].growth.len(), 2);
        assert!(snapshot.subjects[0].valuation.is_empty());
    }

    #[test]
    fn test_directory_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), SUBJECT_JSON).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.json"), CARDS_JSON).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a snapshot").unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden").join("c.json"), "{ broken").unwrap();

        let snapshot = load(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(snapshot.subjects.len(), 1);
        assert_eq!(snapshot.cards.len(), 1);
        assert_eq!(
            snapshot.as_of.map(|t| t.to_rfc3339()),
            Some("2026-07-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InputError::NoSnapshots(_)));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, InputError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
