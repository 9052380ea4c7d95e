//! Outbound events across the UI boundary

use crate::core::tracker::StreamProgress;
use crate::mux::status::MuxStatus;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything the core tells a UI layer about an active download
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    AudioProgress(StreamProgress),
    VideoProgress(StreamProgress),
    MuxProgress(MuxStatus),
    Completed { path: PathBuf },
    Failed { reason: String },
}

pub type EventReceiver = mpsc::UnboundedReceiver<DownloadEvent>;

/// Sender half of the event channel. A UI that has gone away is not an
/// error; sends to a closed channel are dropped silently.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<DownloadEvent>,
}

impl EventSender {
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: DownloadEvent) {
        let _ = self.tx.send(event);
    }

    pub fn audio_progress(&self, progress: StreamProgress) {
        self.emit(DownloadEvent::AudioProgress(progress));
    }

    pub fn video_progress(&self, progress: StreamProgress) {
        self.emit(DownloadEvent::VideoProgress(progress));
    }

    pub fn mux_progress(&self, status: MuxStatus) {
        self.emit(DownloadEvent::MuxProgress(status));
    }

    pub fn completed(&self, path: PathBuf) {
        self.emit(DownloadEvent::Completed { path });
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.emit(DownloadEvent::Failed {
            reason: reason.into(),
        });
    }
}
