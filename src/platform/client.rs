//! InnerTube-backed implementation of the hosting-service boundary
//!
//! Uses the ANDROID player client, which hands back direct media URLs, and
//! the public oEmbed endpoint for titles. No cipher or attestation handling;
//! formats without a direct URL are simply skipped.

use crate::core::tracker::TotalBytes;
use crate::error::TubemuxError;
use crate::platform::{BasicInfo, HostingService, MediaStream, StreamKind, StreamSelector};
use crate::utils::url::{extract_video_id, is_video_url};
use crate::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player?prettyPrint=false";
const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

const ANDROID_CLIENT_VERSION: &str = "20.10.38";
const ANDROID_USER_AGENT: &str =
    "com.google.android.youtube/20.10.38 (Linux; U; Android 11) gzip";

/// Hosting-service client speaking the InnerTube player API
pub struct InnertubeClient {
    http: reqwest::Client,
    player_endpoint: String,
    oembed_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingData {
    #[serde(default)]
    adaptive_formats: Vec<AdaptiveFormat>,
}

/// One adaptive (single-track) format as reported by the player response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFormat {
    pub itag: u32,
    pub url: Option<String>,
    pub mime_type: String,
    #[serde(default)]
    pub bitrate: u64,
    pub content_length: Option<String>,
}

impl AdaptiveFormat {
    fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Pick one format for the selector, preferring the highest bitrate.
/// A missing fixed tier falls back to the best audio-only format rather
/// than failing the download.
pub fn pick_format(
    formats: &[AdaptiveFormat],
    selector: StreamSelector,
) -> Option<&AdaptiveFormat> {
    let usable = formats.iter().filter(|f| f.url.is_some());
    match selector {
        StreamSelector::AudioHighest => usable
            .filter(|f| f.is_audio())
            .max_by_key(|f| f.bitrate),
        StreamSelector::VideoHighest => usable
            .filter(|f| f.is_video())
            .max_by_key(|f| f.bitrate),
        StreamSelector::AudioTag(tag) => {
            match formats.iter().find(|f| f.itag == tag && f.url.is_some()) {
                Some(f) => Some(f),
                None => {
                    warn!("itag {} unavailable, falling back to best audio", tag);
                    pick_format(formats, StreamSelector::AudioHighest)
                }
            }
        }
    }
}

impl InnertubeClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(ANDROID_USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            player_endpoint: PLAYER_ENDPOINT.to_string(),
            oembed_endpoint: OEMBED_ENDPOINT.to_string(),
        })
    }

    /// Override the upstream endpoints (tests point these at a local mock)
    #[doc(hidden)]
    pub fn with_endpoints(mut self, player: impl Into<String>, oembed: impl Into<String>) -> Self {
        self.player_endpoint = player.into();
        self.oembed_endpoint = oembed.into();
        self
    }

    async fn player_response(&self, video_id: &str) -> Result<PlayerResponse> {
        let request_body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": ANDROID_CLIENT_VERSION,
                    "androidSdkVersion": 30,
                    "osName": "Android",
                    "osVersion": "11",
                    "userAgent": ANDROID_USER_AGENT
                }
            },
            "videoId": video_id
        });

        debug!("Fetching player response for video ID: {}", video_id);

        let response = self
            .http
            .post(&self.player_endpoint)
            .header("X-YouTube-Client-Name", "3")
            .header("X-YouTube-Client-Version", ANDROID_CLIENT_VERSION)
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<PlayerResponse>().await?)
    }

    async fn resolve_format(
        &self,
        video_id: &str,
        selector: StreamSelector,
    ) -> Result<AdaptiveFormat> {
        let player = self.player_response(video_id).await?;
        let formats = player
            .streaming_data
            .map(|s| s.adaptive_formats)
            .unwrap_or_default();

        debug!("{} adaptive formats available", formats.len());

        pick_format(&formats, selector)
            .cloned()
            .ok_or(TubemuxError::NoFormatFound)
    }
}

#[async_trait]
impl HostingService for InnertubeClient {
    fn validate_url(&self, url: &str) -> bool {
        is_video_url(url)
    }

    async fn fetch_basic_info(&self, url: &str) -> Result<BasicInfo> {
        let response = self
            .http
            .get(&self.oembed_endpoint)
            .query(&[("url", url), ("format", "json")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TubemuxError::Metadata(format!(
                "oEmbed returned {}",
                response.status()
            )));
        }

        let info: OembedResponse = response
            .json()
            .await
            .map_err(|e| TubemuxError::Metadata(e.to_string()))?;

        Ok(BasicInfo { title: info.title })
    }

    async fn open_stream(&self, url: &str, selector: StreamSelector) -> Result<MediaStream> {
        let video_id = extract_video_id(url)?;
        let format = self.resolve_format(&video_id, selector).await?;

        let kind = match selector {
            StreamSelector::VideoHighest => StreamKind::Video,
            StreamSelector::AudioHighest | StreamSelector::AudioTag(_) => StreamKind::Audio,
        };

        // pick_format only returns formats that carry a direct URL
        let media_url = format
            .url
            .clone()
            .ok_or(TubemuxError::NoFormatFound)?;

        info!(
            "Opening {:?} stream, itag {} ({})",
            kind, format.itag, format.mime_type
        );

        let response = self.http.get(&media_url).send().await?.error_for_status()?;

        let total = TotalBytes::from_content_length(
            format
                .content_length
                .as_deref()
                .and_then(|s| s.parse::<u64>().ok())
                .or_else(|| response.content_length()),
        );

        Ok(MediaStream::new(kind, total, response.bytes_stream().boxed()))
    }
}
