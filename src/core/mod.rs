//! Core download orchestration

pub mod context;
pub mod downloader;
pub mod events;
pub mod request;
pub mod tracker;

pub use context::AppContext;
pub use downloader::Downloader;
pub use events::{DownloadEvent, EventReceiver, EventSender};
pub use request::{DownloadMode, DownloadRequest};
pub use tracker::{ProgressSnapshot, ProgressTracker, StreamProgress, TotalBytes};
