//! Validated download requests
//!
//! All pre-flight validation lives here so that an invalid submission is
//! rejected before any network traffic or filesystem access for the
//! download itself.

use crate::error::TubemuxError;
use crate::utils::url::is_video_url;
use std::path::PathBuf;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// Single audio stream at the fixed quality tier, saved as `.m4a`
    AudioOnly,
    /// Best audio + best video, muxed into a `.mkv` via the external muxer
    AudioVideoMuxed,
}

impl DownloadMode {
    /// File extension of the finished output
    pub fn extension(self) -> &'static str {
        match self {
            DownloadMode::AudioOnly => "m4a",
            DownloadMode::AudioVideoMuxed => "mkv",
        }
    }
}

/// Immutable, validated description of one download. Created when the user
/// submits the form, consumed exactly once.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub target_dir: PathBuf,
    pub mode: DownloadMode,
}

impl DownloadRequest {
    /// Validate and build a request.
    ///
    /// Fails with `StorageNotSet` when no directory is configured, with
    /// `InvalidUrl` when the link does not match the hosting service's URL
    /// grammar, and with `StorageDir` when the directory does not exist.
    /// None of these checks touch the network.
    pub fn new(
        url: impl Into<String>,
        target_dir: Option<PathBuf>,
        mode: DownloadMode,
    ) -> Result<Self, TubemuxError> {
        let target_dir = target_dir.ok_or(TubemuxError::StorageNotSet)?;

        let url = url.into();
        if !is_video_url(&url) {
            return Err(TubemuxError::InvalidUrl(url));
        }

        if !target_dir.is_dir() {
            return Err(TubemuxError::StorageDir(target_dir));
        }

        Ok(Self {
            url,
            target_dir,
            mode,
        })
    }

    /// Final output path for a given sanitized title
    pub fn output_path(&self, title: &str) -> PathBuf {
        self.target_dir
            .join(format!("{}.{}", title, self.mode.extension()))
    }
}
