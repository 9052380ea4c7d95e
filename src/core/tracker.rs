//! Shared progress aggregation
//!
//! One tracker per download, written by up to three concurrent producers
//! (audio pump, video pump, mux status reader) and read at any time by the
//! UI layer. No consistency is promised across fields; each field is guarded
//! independently and the last write wins.

use crate::mux::status::MuxStatus;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Declared size of a stream. Servers that send no content length yield
/// `Unknown`, which must behave like infinity, never like zero, so that a
/// byte counter alone can never look "complete".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalBytes {
    Known(u64),
    #[default]
    Unknown,
}

impl TotalBytes {
    /// Build from an optional content length
    pub fn from_content_length(len: Option<u64>) -> Self {
        match len {
            Some(n) => TotalBytes::Known(n),
            None => TotalBytes::Unknown,
        }
    }

    /// Completion fraction, if the total is known
    pub fn fraction(self, transferred: u64) -> Option<f64> {
        match self {
            TotalBytes::Known(total) if total > 0 => {
                Some((transferred as f64 / total as f64).min(1.0))
            }
            _ => None,
        }
    }

    /// Whether `transferred` bytes reach the declared total.
    /// Always false for `Unknown`.
    pub fn is_reached(self, transferred: u64) -> bool {
        match self {
            TotalBytes::Known(total) => transferred >= total,
            TotalBytes::Unknown => false,
        }
    }
}

impl std::fmt::Display for TotalBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TotalBytes::Known(n) => write!(f, "{}", format_bytes(*n)),
            TotalBytes::Unknown => write!(f, "?"),
        }
    }
}

/// Progress of one network stream
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamProgress {
    /// Cumulative bytes transferred, monotonically increasing
    pub transferred: u64,
    /// Declared total, or `Unknown`
    pub total: TotalBytes,
}

/// Point-in-time aggregate handed to the UI
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    pub audio: StreamProgress,
    pub video: StreamProgress,
    pub mux: MuxStatus,
    pub elapsed: Duration,
}

/// Shared, mutable aggregation point for the three producers
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    audio: RwLock<StreamProgress>,
    video: RwLock<StreamProgress>,
    mux: RwLock<MuxStatus>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            audio: RwLock::new(StreamProgress::default()),
            video: RwLock::new(StreamProgress::default()),
            mux: RwLock::new(MuxStatus::default()),
        }
    }

    pub fn set_audio(&self, progress: StreamProgress) {
        if let Ok(mut slot) = self.audio.write() {
            *slot = progress;
        }
    }

    pub fn set_video(&self, progress: StreamProgress) {
        if let Ok(mut slot) = self.video.write() {
            *slot = progress;
        }
    }

    /// Replace (not merge) the mux status with a freshly parsed batch
    pub fn set_mux(&self, status: MuxStatus) {
        if let Ok(mut slot) = self.mux.write() {
            *slot = status;
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            audio: self.audio.read().map(|g| *g).unwrap_or_default(),
            video: self.video.read().map(|g| *g).unwrap_or_default(),
            mux: self.mux.read().map(|g| g.clone()).unwrap_or_default(),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f64 / THRESHOLD.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_total_is_never_complete() {
        let total = TotalBytes::Unknown;
        assert!(!total.is_reached(0));
        assert!(!total.is_reached(u64::MAX));
        assert_eq!(total.fraction(1_000_000), None);
        assert_eq!(total.to_string(), "?");
    }

    #[test]
    fn test_known_total_completion() {
        let total = TotalBytes::Known(100);
        assert!(!total.is_reached(99));
        assert!(total.is_reached(100));
        assert_eq!(total.fraction(50), Some(0.5));
    }

    #[test]
    fn test_total_from_content_length() {
        assert_eq!(TotalBytes::from_content_length(Some(7)), TotalBytes::Known(7));
        assert_eq!(TotalBytes::from_content_length(None), TotalBytes::Unknown);
    }

    #[test]
    fn test_last_write_wins_per_field() {
        let tracker = ProgressTracker::new();
        tracker.set_audio(StreamProgress {
            transferred: 10,
            total: TotalBytes::Known(100),
        });
        tracker.set_audio(StreamProgress {
            transferred: 20,
            total: TotalBytes::Known(100),
        });
        let snap = tracker.snapshot();
        assert_eq!(snap.audio.transferred, 20);
        assert_eq!(snap.video.transferred, 0);
    }

    #[test]
    fn test_interleaved_updates_keep_fields_well_formed() {
        let tracker = Arc::new(ProgressTracker::new());
        let mut handles = Vec::new();

        for producer in 0..3u8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for i in 1..=500u64 {
                    match producer {
                        0 => tracker.set_audio(StreamProgress {
                            transferred: i,
                            total: TotalBytes::Known(500),
                        }),
                        1 => tracker.set_video(StreamProgress {
                            transferred: i * 2,
                            total: TotalBytes::Unknown,
                        }),
                        _ => tracker.set_mux(MuxStatus {
                            frame: Some(i),
                            ..MuxStatus::default()
                        }),
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let snap = tracker.snapshot();
        assert_eq!(snap.audio.transferred, 500);
        assert_eq!(snap.video.transferred, 1000);
        assert_eq!(snap.video.total, TotalBytes::Unknown);
        assert_eq!(snap.mux.frame, Some(500));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }
}
