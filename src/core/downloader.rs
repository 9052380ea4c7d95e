//! Download orchestration
//!
//! One [`Downloader`] drives one download at a time: resolve the title and
//! open the network streams concurrently, then either save the single audio
//! stream directly or fan both streams into the external muxer and collect
//! its output. Exactly one terminal event (`Completed` or `Failed`) is
//! emitted per started download.

use crate::core::context::AppContext;
use crate::core::events::{EventReceiver, EventSender};
use crate::core::request::{DownloadMode, DownloadRequest};
use crate::core::tracker::{ProgressTracker, StreamProgress, TotalBytes};
use crate::error::TubemuxError;
use crate::mux::pipeline::{self, MuxEndpoints, MuxPipeline};
use crate::platform::{HostingService, MediaStream, StreamSelector, DEFAULT_AUDIO_ITAG};
use crate::sink::OutputSink;
use crate::utils::filename::{fallback_title, sanitize_title};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// Orchestrates one download against a hosting service and the external
/// muxer configured in the context.
pub struct Downloader {
    ctx: Arc<AppContext>,
    service: Arc<dyn HostingService>,
    tracker: Arc<ProgressTracker>,
    events: EventSender,
}

fn flatten_join<T>(res: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    match res {
        Ok(inner) => inner,
        Err(e) => Err(TubemuxError::Generic(format!("worker task failed: {}", e))),
    }
}

impl Downloader {
    /// Build a downloader and the receiving end of its event channel
    pub fn new(ctx: Arc<AppContext>, service: Arc<dyn HostingService>) -> (Self, EventReceiver) {
        let (events, rx) = EventSender::channel();
        let downloader = Self {
            ctx,
            service,
            tracker: Arc::new(ProgressTracker::new()),
            events,
        };
        (downloader, rx)
    }

    /// Shared progress state, readable at any time by a UI layer
    pub fn tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.tracker)
    }

    /// Run the download to completion, emitting exactly one terminal event
    pub async fn start(&self, request: DownloadRequest) -> Result<PathBuf> {
        info!("Starting {:?} download: {}", request.mode, request.url);
        let result = match request.mode {
            DownloadMode::AudioOnly => self.run_audio_only(&request).await,
            DownloadMode::AudioVideoMuxed => self.run_muxed(&request).await,
        };

        match result {
            Ok(path) => {
                info!("Download finished: {}", path.display());
                self.events.completed(path.clone());
                Ok(path)
            }
            Err(e) => {
                warn!("Download failed: {}", e);
                self.events.failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Title for the output file: the sanitized upstream title, or a numeric
    /// timestamp when metadata is unavailable. Never fails the download.
    async fn resolve_title(&self, url: &str) -> String {
        match self.service.fetch_basic_info(url).await {
            Ok(info) => {
                let title = sanitize_title(&info.title);
                if title.trim().is_empty() {
                    warn!("Upstream title empty after sanitizing, using timestamp");
                    fallback_title()
                } else {
                    title
                }
            }
            Err(e) => {
                warn!("Title lookup failed ({}), using timestamp", e);
                fallback_title()
            }
        }
    }

    async fn run_audio_only(&self, request: &DownloadRequest) -> Result<PathBuf> {
        let (title, stream) = tokio::join!(
            self.resolve_title(&request.url),
            self.service
                .open_stream(&request.url, StreamSelector::AudioTag(DEFAULT_AUDIO_ITAG)),
        );
        let mut stream = stream?;

        let output = request.output_path(&title);
        if tokio::fs::try_exists(&output).await? {
            return Err(TubemuxError::FileExists(output));
        }

        let mut sink = OutputSink::create(&output).await?;
        debug!("Saving audio stream to {}", sink.final_path().display());
        match self.save_stream(&mut stream, &mut sink).await {
            Ok(_) => sink.finish().await,
            Err(e) => {
                sink.discard().await;
                Err(e)
            }
        }
    }

    async fn save_stream(&self, stream: &mut MediaStream, sink: &mut OutputSink) -> Result<u64> {
        let total = stream.total;
        let mut transferred = 0u64;
        while let Some(chunk) = stream.next_chunk().await {
            let chunk = chunk?;
            sink.write_chunk(&chunk).await?;
            transferred += chunk.len() as u64;

            let progress = StreamProgress { transferred, total };
            self.tracker.set_audio(progress);
            self.events.audio_progress(progress);
        }

        if let TotalBytes::Known(declared) = total {
            if !total.is_reached(transferred) {
                warn!(
                    "Audio stream ended at {} of {} declared bytes",
                    transferred, declared
                );
            }
        }
        Ok(transferred)
    }

    async fn run_muxed(&self, request: &DownloadRequest) -> Result<PathBuf> {
        let (title, audio, video) = tokio::join!(
            self.resolve_title(&request.url),
            self.service
                .open_stream(&request.url, StreamSelector::AudioHighest),
            self.service
                .open_stream(&request.url, StreamSelector::VideoHighest),
        );
        let audio = audio?;
        let video = video?;

        let output = request.output_path(&title);
        if tokio::fs::try_exists(&output).await? {
            return Err(TubemuxError::FileExists(output));
        }

        let MuxPipeline { mut child, io } = MuxPipeline::spawn(&self.ctx.ffmpeg_path)?;
        let MuxEndpoints {
            audio_in,
            video_in,
            status_out,
            mux_out,
            stderr,
        } = io;

        let audio_task = tokio::spawn(pipeline::pump_stream(
            audio,
            audio_in,
            Arc::clone(&self.tracker),
            self.events.clone(),
        ));
        let video_task = tokio::spawn(pipeline::pump_stream(
            video,
            video_in,
            Arc::clone(&self.tracker),
            self.events.clone(),
        ));
        let status_task = tokio::spawn(pipeline::read_status(
            status_out,
            Arc::clone(&self.tracker),
            self.events.clone(),
        ));
        tokio::spawn(pipeline::drain_stderr(stderr));

        // The muxed container is collected here; EOF on the output pipe
        // means the child has closed its end.
        let mut sink = OutputSink::create(&output).await?;
        let copy_result = sink.copy_from(mux_out).await;

        let status = child.wait().await?;

        let audio_result = flatten_join(audio_task.await);
        let video_result = flatten_join(video_task.await);
        // A broken status pipe does not invalidate the output
        let _ = status_task.await;

        // A crashed muxer also breaks the pumps with EPIPE; report the exit,
        // not the secondary pipe errors.
        let failure = if status.success() {
            copy_result
                .err()
                .or(audio_result.err())
                .or(video_result.err())
        } else {
            Some(TubemuxError::MuxExited {
                code: status.code(),
            })
        };

        match failure {
            Some(e) => {
                sink.discard().await;
                Err(e)
            }
            None => sink.finish().await,
        }
    }
}
