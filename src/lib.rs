//! # tubemux - video download and mux pipeline
//!
//! Downloads a remote video's audio and/or video streams and produces a
//! single local media file. For the muxed mode the two streams are fetched
//! concurrently and piped into an ffmpeg child process over dedicated
//! descriptors while a status pipe feeds live progress back.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tubemux::{AppContext, Downloader, DownloadMode, DownloadRequest};
//! use tubemux::platform::InnertubeClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = Arc::new(AppContext::new(Some("./downloads".into()), None));
//!     let service = Arc::new(InnertubeClient::new(std::time::Duration::from_secs(30))?);
//!     let (downloader, _events) = Downloader::new(ctx.clone(), service);
//!
//!     let request = DownloadRequest::new(
//!         "https://www.youtube.com/watch?v=VIDEO_ID",
//!         ctx.storage_dir.clone(),
//!         DownloadMode::AudioVideoMuxed,
//!     )?;
//!     let path = downloader.start(request).await?;
//!     println!("Saved: {}", path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod mux;
pub mod platform;
pub mod sink;
pub mod utils;

// Re-export main types
pub use crate::core::{
    AppContext, DownloadEvent, DownloadMode, DownloadRequest, Downloader, ProgressSnapshot,
    ProgressTracker, StreamProgress, TotalBytes,
};
pub use error::TubemuxError;

/// Result type alias for tubemux operations
pub type Result<T> = std::result::Result<T, TubemuxError>;
