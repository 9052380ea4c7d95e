//! Muxer subprocess spawn and pipe wiring
//!
//! The external muxer is spawned with four descriptors beyond the standard
//! three: a status pipe it writes `key=value` batches to (fd 3), two input
//! pipes we feed the audio and video streams into (fds 4 and 5), and an
//! output pipe carrying the muxed container (fd 6). stderr is piped and
//! drained into the log for failure diagnosis.

use crate::core::events::EventSender;
use crate::core::tracker::{ProgressTracker, StreamProgress, TotalBytes};
use crate::error::TubemuxError;
use crate::mux::status::StatusLineBuffer;
use crate::platform::{MediaStream, StreamKind};
use crate::Result;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, warn};

const STATUS_FD: RawFd = 3;
const OUTPUT_FD: RawFd = 6;

/// Fixed transcoding profile. The argument vector must stay byte-identical
/// to keep the combined output compatible: informational logging suppressed,
/// frame rescaled to 320x240, H.265 video with encoder logging off, lossless
/// FLAC audio, Matroska container on the output pipe.
pub const FFMPEG_ARGS: [&str; 20] = [
    "-loglevel",
    "0",
    "-hide_banner",
    "-progress",
    "pipe:3",
    "-i",
    "pipe:4",
    "-i",
    "pipe:5",
    "-vf",
    "scale=320:240",
    "-c:v",
    "libx265",
    "-x265-params",
    "log-level=0",
    "-c:a",
    "flac",
    "-f",
    "matroska",
    "pipe:6",
];

/// Our ends of the five muxer pipes. Each endpoint is owned by exactly one
/// pump task; dropping a writer closes the corresponding input pipe.
#[derive(Debug)]
pub struct MuxEndpoints {
    /// Write end feeding the muxer's first input (audio)
    pub audio_in: File,
    /// Write end feeding the muxer's second input (video)
    pub video_in: File,
    /// Read end of the status pipe
    pub status_out: File,
    /// Read end of the muxed container pipe
    pub mux_out: File,
    /// The muxer's standard error
    pub stderr: ChildStderr,
}

/// A running muxer subprocess plus our pipe endpoints
#[derive(Debug)]
pub struct MuxPipeline {
    pub child: Child,
    pub io: MuxEndpoints,
}

/// Anonymous pipe as a pair of (read, write) owned descriptors
fn raw_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: fds points at a valid two-element array
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe(2) returned two freshly opened descriptors we now own
    let (rx, tx) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    // Both ends close on exec: the child only keeps the descriptors that
    // pre_exec re-creates on 3-6. An inherited write end of an input pipe
    // would keep the child from ever seeing EOF on it.
    for fd in [rx.as_raw_fd(), tx.as_raw_fd()] {
        // SAFETY: fd is open and owned by this function
        if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok((rx, tx))
}

/// Wrap our end of a pipe for async I/O
fn pipe_file(fd: OwnedFd) -> File {
    File::from_std(std::fs::File::from(fd))
}

impl MuxPipeline {
    /// Spawn the muxer with the fixed profile, mapping the child's pipe ends
    /// onto descriptors 3 through 6.
    pub fn spawn(ffmpeg_path: &Path) -> Result<MuxPipeline> {
        let (status_rx, status_tx) = raw_pipe()?;
        let (audio_rx, audio_tx) = raw_pipe()?;
        let (video_rx, video_tx) = raw_pipe()?;
        let (out_rx, out_tx) = raw_pipe()?;

        // Child-side ends, in target-descriptor order 3, 4, 5, 6
        let child_fds: [RawFd; 4] = [
            status_tx.as_raw_fd(),
            audio_rx.as_raw_fd(),
            video_rx.as_raw_fd(),
            out_tx.as_raw_fd(),
        ];

        let mut cmd = Command::new(ffmpeg_path);
        cmd.args(FFMPEG_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // SAFETY: the closure runs in the forked child before exec and only
        // makes async-signal-safe calls (fcntl, dup2).
        unsafe {
            cmd.pre_exec(move || {
                // Move every source above the target range first; a source
                // that happens to sit on 3-6 must not be clobbered by an
                // earlier dup2 in the sequence. The staging dups stay
                // close-on-exec; dup2 clears the flag on the 3-6 targets.
                let mut moved = [0 as RawFd; 4];
                for (slot, &fd) in moved.iter_mut().zip(child_fds.iter()) {
                    let dup = libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, OUTPUT_FD + 1);
                    if dup < 0 {
                        return Err(io::Error::last_os_error());
                    }
                    *slot = dup;
                }
                for (i, &src) in moved.iter().enumerate() {
                    if libc::dup2(src, STATUS_FD + i as RawFd) < 0 {
                        return Err(io::Error::last_os_error());
                    }
                }
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TubemuxError::MuxerNotFound(ffmpeg_path.to_path_buf())
            } else {
                TubemuxError::IoError(e)
            }
        })?;

        // Close the child's ends in this process so EOF propagates once the
        // child exits (and vice versa for our input pipes).
        drop(status_tx);
        drop(audio_rx);
        drop(video_rx);
        drop(out_tx);

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TubemuxError::Generic("muxer stderr pipe missing".into()))?;

        Ok(MuxPipeline {
            child,
            io: MuxEndpoints {
                audio_in: pipe_file(audio_tx),
                video_in: pipe_file(video_tx),
                status_out: pipe_file(status_rx),
                mux_out: pipe_file(out_rx),
                stderr,
            },
        })
    }
}

/// Forward all bytes of one stream into one input pipe, in order, updating
/// the matching tracker field and emitting a progress event per chunk.
/// Closes the pipe when the stream ends.
pub async fn pump_stream(
    mut stream: MediaStream,
    mut pipe: File,
    tracker: Arc<ProgressTracker>,
    events: EventSender,
) -> Result<u64> {
    let kind = stream.kind;
    let total = stream.total;
    let mut transferred = 0u64;

    while let Some(chunk) = stream.next_chunk().await {
        let chunk = chunk?;
        pipe.write_all(&chunk).await?;
        transferred += chunk.len() as u64;

        let progress = StreamProgress { transferred, total };
        match kind {
            StreamKind::Audio => {
                tracker.set_audio(progress);
                events.audio_progress(progress);
            }
            StreamKind::Video => {
                tracker.set_video(progress);
                events.video_progress(progress);
            }
        }
    }

    pipe.shutdown().await?;
    drop(pipe);

    if let TotalBytes::Known(declared) = total {
        if !total.is_reached(transferred) {
            warn!(
                "{:?} stream ended at {} of {} declared bytes",
                kind, transferred, declared
            );
        }
    }
    debug!("{:?} stream finished after {} bytes", kind, transferred);
    Ok(transferred)
}

/// Read the status pipe until EOF. Every read that completes at least one
/// line replaces the tracker's mux status with the freshly parsed record.
pub async fn read_status(
    mut status_out: File,
    tracker: Arc<ProgressTracker>,
    events: EventSender,
) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let mut lines = StatusLineBuffer::new();

    loop {
        let n = status_out.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if let Some(record) = lines.feed(&buf[..n]) {
            tracker.set_mux(record.clone());
            events.mux_progress(record);
        }
    }
    Ok(())
}

/// Drain the muxer's stderr into the log for failure diagnosis
pub async fn drain_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("muxer: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn fake_muxer(dir: &Path, body: &str) -> std::path::PathBuf {
        let script = dir.join("fake-muxer.sh");
        std::fs::write(&script, format!("#!/bin/sh\n{}", body)).unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();
        script
    }

    #[test]
    fn test_ffmpeg_argument_vector_is_fixed() {
        assert_eq!(
            FFMPEG_ARGS.join(" "),
            "-loglevel 0 -hide_banner -progress pipe:3 -i pipe:4 -i pipe:5 \
             -vf scale=320:240 -c:v libx265 -x265-params log-level=0 \
             -c:a flac -f matroska pipe:6"
        );
    }

    #[tokio::test]
    async fn test_raw_pipe_roundtrip() {
        let (rx, tx) = raw_pipe().unwrap();
        let mut writer = pipe_file(tx);
        let mut reader = pipe_file(rx);

        writer.write_all(b"abc").await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_pipe_ends_are_close_on_exec() {
        let (rx, tx) = raw_pipe().unwrap();
        for fd in [rx.as_raw_fd(), tx.as_raw_fd()] {
            // SAFETY: fd is open
            let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
            assert!(flags >= 0);
            assert_ne!(flags & libc::FD_CLOEXEC, 0);
        }
    }

    #[tokio::test]
    async fn test_child_sees_eof_when_input_writer_drops() {
        let dir = tempfile::tempdir().unwrap();
        let script = fake_muxer(dir.path(), "exec cat <&4 > /dev/null\n");

        let MuxPipeline { mut child, io } = MuxPipeline::spawn(&script).unwrap();
        let MuxEndpoints {
            mut audio_in,
            video_in,
            status_out,
            mux_out,
            stderr,
        } = io;

        audio_in.write_all(b"payload").await.unwrap();
        audio_in.shutdown().await.unwrap();
        drop(audio_in);
        drop(video_in);
        drop(status_out);
        drop(mux_out);
        drop(stderr);

        // With our pipe ends closed, the child's read of fd 4 must hit EOF
        let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .expect("child never saw EOF on its input pipe")
            .unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_reported() {
        let err = MuxPipeline::spawn(Path::new("/nonexistent/ffmpeg-binary")).unwrap_err();
        assert!(matches!(err, TubemuxError::MuxerNotFound(_)));
    }
}
