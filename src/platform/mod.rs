//! Hosting-service boundary
//!
//! The upstream video host is an opaque capability: validate a URL, fetch
//! basic metadata, open a byte stream for a selected track. Everything the
//! rest of the crate needs is behind [`HostingService`] so tests can swap in
//! a fake.

pub mod client;

pub use client::InnertubeClient;

use crate::core::tracker::TotalBytes;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};

/// Fixed itag used for the non-muxed audio-only download path (AAC 128k)
pub const DEFAULT_AUDIO_ITAG: u32 = 140;

/// Which track to open, and at which quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSelector {
    /// Best available audio-only format
    AudioHighest,
    /// Best available video-only format
    VideoHighest,
    /// A fixed audio quality tier by itag
    AudioTag(u32),
}

/// Which track a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Video,
}

/// Basic descriptive metadata for a video
#[derive(Debug, Clone)]
pub struct BasicInfo {
    pub title: String,
}

/// One in-flight network byte stream: lazy, finite, single-use.
/// Ownership moves from the opener to whichever pipeline stage consumes it.
pub struct MediaStream {
    pub kind: StreamKind,
    pub total: TotalBytes,
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl MediaStream {
    pub fn new(
        kind: StreamKind,
        total: TotalBytes,
        inner: BoxStream<'static, reqwest::Result<Bytes>>,
    ) -> Self {
        Self { kind, total, inner }
    }

    /// Next chunk of the body, or `None` once the stream ends
    pub async fn next_chunk(&mut self) -> Option<reqwest::Result<Bytes>> {
        self.inner.next().await
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("kind", &self.kind)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

/// The upstream video host, at its interface boundary
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Syntactic URL validation; never touches the network
    fn validate_url(&self, url: &str) -> bool;

    /// One bounded-latency metadata fetch. May fail; never retried.
    async fn fetch_basic_info(&self, url: &str) -> Result<BasicInfo>;

    /// Open a readable byte stream for the selected track
    async fn open_stream(&self, url: &str, selector: StreamSelector) -> Result<MediaStream>;
}
