//! Typed errors for loading input snapshots.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while locating or reading snapshot files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no .json snapshot files found under {}", .0.display())]
    NoSnapshots(PathBuf),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to walk {}: {}", .path.display(), .source)]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
