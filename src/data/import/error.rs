use std::path::PathBuf;

use thiserror::Error;

/// Every failure that aborts an import run.
///
/// Per-row problems are not errors: they end up in [`super::parser::SkipCounts`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of region {region} failed with status {status}")]
    HttpStatus {
        region: String,
        status: reqwest::StatusCode,
    },

    #[error("Could not decompress data for region {0}: {1}")]
    Decompress(String, #[source] std::io::Error),

    #[error("Could not open address store: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Address store query failed: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Could not access {}: {}", .0.display(), .1)]
    Store(PathBuf, #[source] std::io::Error),
}
