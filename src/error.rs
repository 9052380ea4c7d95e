//! Error types for tubemux

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tubemux operations
#[derive(Debug, Error)]
pub enum TubemuxError {
    #[error("Invalid video link: {0}")]
    InvalidUrl(String),

    #[error("No storage location set")]
    StorageNotSet,

    #[error("Storage location is not an existing directory: {0}")]
    StorageDir(PathBuf),

    #[error("No suitable media format found")]
    NoFormatFound,

    #[error("Metadata fetch failed: {0}")]
    Metadata(String),

    #[error("Download failed: {0}")]
    DownloadFailed(#[from] reqwest::Error),

    #[error("Muxer binary not found: {0}")]
    MuxerNotFound(PathBuf),

    #[error("Muxer exited abnormally (code {code:?})")]
    MuxExited { code: Option<i32> },

    #[error("Output file already exists: {0}")]
    FileExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl TubemuxError {
    /// Check if the error is a pre-flight validation failure (no I/O happened)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TubemuxError::InvalidUrl(_) | TubemuxError::StorageNotSet | TubemuxError::StorageDir(_)
        )
    }
}
