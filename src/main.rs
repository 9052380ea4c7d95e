//! Main entry point for the tubemux CLI

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubemux::cli::args::{Args, VerbosityLevel};
use tubemux::cli::output::{render_events, OutputFormatter};
use tubemux::core::{AppContext, DownloadRequest, Downloader};
use tubemux::platform::InnertubeClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity_level())?;

    info!("Starting tubemux for URL: {}", args.url);

    let formatter = OutputFormatter::new(args.verbosity_level(), !args.no_progress);
    let ctx = Arc::new(AppContext::new(args.output.clone(), args.ffmpeg.clone()));

    // All pre-flight validation happens before any network traffic
    let request = match DownloadRequest::new(&args.url, ctx.storage_dir.clone(), args.mode()) {
        Ok(request) => request,
        Err(e) => {
            formatter.error(&e.to_string());
            std::process::exit(exit_code(&e));
        }
    };

    let service = Arc::new(InnertubeClient::new(args.timeout_duration())?);
    let (downloader, events) = Downloader::new(Arc::clone(&ctx), service);

    // The event stream drives the terminal display; the render loop returns
    // at the terminal event, not at channel close (the downloader keeps its
    // sender alive past completion).
    let ui = tokio::spawn(render_events(formatter, downloader.tracker(), events));

    let result = downloader.start(request).await;
    let _ = ui.await;

    if let Err(e) = result {
        std::process::exit(exit_code(&e));
    }
    Ok(())
}

/// Validation failures exit with a distinct code from runtime failures
fn exit_code(error: &tubemux::TubemuxError) -> i32 {
    if error.is_validation() {
        2
    } else {
        1
    }
}

/// Initialize logging system
fn init_logging(verbosity: VerbosityLevel) -> anyhow::Result<()> {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "debug",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    Ok(())
}
