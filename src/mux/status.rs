//! Parsing of the muxer's status pipe
//!
//! ffmpeg's `-progress` output is batches of `key=value` lines flushed
//! together. Each batch is a complete snapshot: a parsed batch replaces the
//! previous status rather than merging into it. Unknown keys are ignored and
//! missing keys stay `None`, never zero, so the UI cannot show false
//! progress.

/// Typed status record parsed from one batch of status lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MuxStatus {
    /// Frames written so far
    pub frame: Option<u64>,
    /// Current encode frame rate
    pub fps: Option<f64>,
    /// Encode speed multiplier, verbatim (e.g. "2.3x")
    pub speed: Option<String>,
    /// True once the muxer reported `progress=end`
    pub ended: bool,
}

impl MuxStatus {
    /// Parse one batch. Lines are split on the first `=`; a line without
    /// `=` (or an empty one) is skipped without aborting the batch.
    pub fn parse_batch(batch: &str) -> Self {
        let mut status = Self::default();
        for line in batch.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "frame" => status.frame = value.trim().parse().ok(),
                "fps" => status.fps = value.trim().parse().ok(),
                "speed" => status.speed = Some(value.trim().to_string()),
                "progress" => status.ended = value.trim() == "end",
                _ => {}
            }
        }
        status
    }
}

impl std::fmt::Display for MuxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frame {} | fps {} | speed {}",
            self.frame.map_or_else(|| "?".into(), |v| v.to_string()),
            self.fps.map_or_else(|| "?".into(), |v| format!("{:.0}", v)),
            self.speed.as_deref().unwrap_or("?"),
        )
    }
}

/// Accumulates raw reads from the status pipe and yields one status record
/// per batch of complete lines. A trailing partial line is carried into the
/// next read.
#[derive(Debug, Default)]
pub struct StatusLineBuffer {
    carry: String,
}

impl StatusLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw read. Returns the parsed record if the read completed
    /// at least one line.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<MuxStatus> {
        self.carry.push_str(&String::from_utf8_lossy(chunk));

        let upto = self.carry.rfind('\n')?;
        let batch: String = self.carry.drain(..=upto).collect();
        Some(MuxStatus::parse_batch(&batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_exact_fields() {
        let status = MuxStatus::parse_batch("frame=120\nspeed=2.3x\nfps=29\n");
        assert_eq!(status.frame, Some(120));
        assert_eq!(status.speed.as_deref(), Some("2.3x"));
        assert_eq!(status.fps, Some(29.0));
        assert!(!status.ended);
    }

    #[test]
    fn test_line_without_equals_is_skipped_not_fatal() {
        let status = MuxStatus::parse_batch("garbage line\nframe=7\n\nfps=25.0\n");
        assert_eq!(status.frame, Some(7));
        assert_eq!(status.fps, Some(25.0));
    }

    #[test]
    fn test_unknown_keys_ignored_missing_keys_stay_none() {
        let status = MuxStatus::parse_batch("bitrate=512.3kbits/s\nout_time=00:00:03.2\n");
        assert_eq!(status.frame, None);
        assert_eq!(status.fps, None);
        assert_eq!(status.speed, None);
    }

    #[test]
    fn test_batch_replaces_instead_of_merging() {
        let first = MuxStatus::parse_batch("frame=10\nspeed=1.0x\n");
        assert_eq!(first.speed.as_deref(), Some("1.0x"));

        // A later batch without `speed` must not inherit the old value
        let second = MuxStatus::parse_batch("frame=20\n");
        assert_eq!(second.frame, Some(20));
        assert_eq!(second.speed, None);
    }

    #[test]
    fn test_progress_end_marker() {
        let status = MuxStatus::parse_batch("frame=300\nprogress=end\n");
        assert!(status.ended);
        let status = MuxStatus::parse_batch("frame=300\nprogress=continue\n");
        assert!(!status.ended);
    }

    #[test]
    fn test_line_buffer_carries_partial_lines() {
        let mut buffer = StatusLineBuffer::new();

        // No complete line yet
        assert_eq!(buffer.feed(b"fra"), None);

        // Completes "frame=42", leaves "spe" in the carry
        let status = buffer.feed(b"me=42\nspe").unwrap();
        assert_eq!(status.frame, Some(42));

        let status = buffer.feed(b"ed=1.5x\n").unwrap();
        assert_eq!(status.speed.as_deref(), Some("1.5x"));
        assert_eq!(status.frame, None);
    }
}
