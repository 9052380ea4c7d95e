//! URL utilities for validating video links and extracting video IDs

use crate::error::TubemuxError;
use url::Url;

/// Extract the video ID from the supported URL shapes
/// (`youtube.com/watch?v=`, `youtu.be/`, `youtube.com/shorts/`).
pub fn extract_video_id(url: &str) -> Result<String, TubemuxError> {
    let parsed = Url::parse(url)?;

    match parsed.host_str() {
        Some("youtu.be") => {
            let path = parsed.path().trim_start_matches('/');
            if path.is_empty() {
                return Err(TubemuxError::InvalidUrl("missing video ID".to_string()));
            }
            Ok(path.to_string())
        }
        Some("youtube.com") | Some("www.youtube.com") | Some("m.youtube.com") => {
            if parsed.path().starts_with("/watch") {
                parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
                    .ok_or_else(|| TubemuxError::InvalidUrl("missing v parameter".to_string()))
            } else if parsed.path().starts_with("/shorts/") {
                let video_id = parsed.path().trim_start_matches("/shorts/");
                if video_id.is_empty() {
                    return Err(TubemuxError::InvalidUrl(
                        "missing video ID in shorts path".to_string(),
                    ));
                }
                Ok(video_id.to_string())
            } else {
                Err(TubemuxError::InvalidUrl(
                    "unsupported video URL format".to_string(),
                ))
            }
        }
        _ => Err(TubemuxError::InvalidUrl(
            "not a supported video platform URL".to_string(),
        )),
    }
}

/// Check whether the string parses as a supported video URL.
/// Purely syntactic; no network traffic.
pub fn is_video_url(url: &str) -> bool {
    extract_video_id(url).is_ok()
}
