//! Command line argument parsing

use crate::core::request::DownloadMode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// tubemux - Download a video as audio-only or as a compact muxed file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL
    pub url: String,

    /// Download only the audio track (fixed quality tier, saved as .m4a)
    #[arg(short = 'a', long)]
    pub audio_only: bool,

    /// Directory finished downloads are saved to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Path of the ffmpeg binary (defaults to $TUBEMUX_FFMPEG, then `ffmpeg`)
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Disable the progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Which download pipeline to run
    pub fn mode(&self) -> DownloadMode {
        if self.audio_only {
            DownloadMode::AudioOnly
        } else {
            DownloadMode::AudioVideoMuxed
        }
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            url: String::new(),
            audio_only: false,
            output: None,
            ffmpeg: None,
            timeout: humantime::Duration::from(Duration::from_secs(30)),
            no_progress: false,
            verbose: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_mode_selection() {
        let args = Args {
            audio_only: true,
            ..Default::default()
        };
        assert_eq!(args.mode(), DownloadMode::AudioOnly);

        let args = Args::default();
        assert_eq!(args.mode(), DownloadMode::AudioVideoMuxed);
    }

    #[test]
    fn test_args_verbosity_level() {
        let args = Args::default();
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);

        let args = Args {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Quiet);

        let args = Args {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);
    }

    #[test]
    fn test_args_timeout_duration() {
        let args = Args {
            timeout: humantime::Duration::from(Duration::from_secs(60)),
            ..Default::default()
        };
        assert_eq!(args.timeout_duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_args_parse_from_argv() {
        let args = Args::parse_from([
            "tubemux",
            "--audio-only",
            "--output",
            "/tmp/music",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        ]);
        assert!(args.audio_only);
        assert_eq!(args.output, Some(PathBuf::from("/tmp/music")));
        assert_eq!(args.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(args.timeout_duration(), Duration::from_secs(30));
    }
}
