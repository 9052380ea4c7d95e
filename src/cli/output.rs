//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::events::{DownloadEvent, EventReceiver};
use crate::core::tracker::{format_bytes, ProgressSnapshot, ProgressTracker, StreamProgress};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

fn stream_cell(progress: &StreamProgress) -> String {
    match progress.total.fraction(progress.transferred) {
        Some(fraction) => format!(
            "{}/{} ({:.0}%)",
            format_bytes(progress.transferred),
            progress.total,
            fraction * 100.0
        ),
        None => format!("{}/{}", format_bytes(progress.transferred), progress.total),
    }
}

/// Render one status line from a progress snapshot. Unknown totals render
/// as `?` with no percentage rather than a number.
pub fn status_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "audio {} | video {} | {}",
        stream_cell(&snapshot.audio),
        stream_cell(&snapshot.video),
        snapshot.mux,
    )
}

/// Drive the terminal display from the event stream. Progress events refresh
/// the status line from the tracker; the loop ends at the first terminal
/// event, whether or not the sending side is still alive.
pub async fn render_events(
    formatter: OutputFormatter,
    tracker: Arc<ProgressTracker>,
    mut events: EventReceiver,
) {
    while let Some(event) = events.recv().await {
        match event {
            DownloadEvent::Completed { path } => {
                formatter.finish("done");
                formatter.success(&format!("Saved to {}", path.display()));
                break;
            }
            DownloadEvent::Failed { reason } => {
                formatter.finish("failed");
                formatter.error(&reason);
                break;
            }
            _ => formatter.update(&tracker.snapshot()),
        }
    }
}

/// Terminal output for tubemux: a single spinner line for progress plus
/// colored one-off messages.
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a formatter; the progress line is shown only when enabled and
    /// not in quiet mode.
    pub fn new(verbosity: VerbosityLevel, show_progress: bool) -> Self {
        let bar = if show_progress && verbosity != VerbosityLevel::Quiet {
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap();
            let bar = ProgressBar::new_spinner();
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };

        Self { verbosity, bar }
    }

    /// Refresh the status line
    pub fn update(&self, snapshot: &ProgressSnapshot) {
        if let Some(bar) = &self.bar {
            bar.set_message(status_line(snapshot));
        }
    }

    /// Stop the spinner, leaving a final message
    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", message.green());
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("{}", message.yellow());
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
}
