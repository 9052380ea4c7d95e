//! Application context shared by all components
//!
//! Constructed once at startup and passed by `Arc`; there is no ambient
//! global state anywhere in the crate.

use std::path::PathBuf;

/// Process-wide configuration: where downloads go and which muxer binary
/// to spawn.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Target directory for finished downloads. `None` until the user picks
    /// one; requests are rejected while unset.
    pub storage_dir: Option<PathBuf>,
    /// Path of the external transcoding binary.
    pub ffmpeg_path: PathBuf,
    /// Application version, surfaced in the UI.
    pub version: &'static str,
}

impl AppContext {
    /// Build a context from an optional storage directory and muxer
    /// override. The muxer defaults to the `TUBEMUX_FFMPEG` environment
    /// variable, then to `ffmpeg` on the search path.
    pub fn new(storage_dir: Option<PathBuf>, ffmpeg_path: Option<PathBuf>) -> Self {
        let ffmpeg_path = ffmpeg_path
            .or_else(|| std::env::var_os("TUBEMUX_FFMPEG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        Self {
            storage_dir,
            ffmpeg_path,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
