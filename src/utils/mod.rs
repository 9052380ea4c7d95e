//! Utility modules

pub mod filename;
pub mod url;

pub use filename::{fallback_title, sanitize_title};
pub use url::{extract_video_id, is_video_url};
