//! Atomic output file handling
//!
//! Bytes land in a hidden-ish `.part` sibling first and only move to the
//! final name after a flush and fsync. A failed or aborted download leaves
//! no half-written file under the target name, and an existing target is
//! never silently overwritten.

use crate::error::TubemuxError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Write-side of one download: a temp file plus the final path it will be
/// renamed to on success.
pub struct OutputSink {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
}

fn temp_sibling(final_path: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    final_path.with_file_name(format!("{}.{:x}.part", name, nanos))
}

impl OutputSink {
    /// Open a fresh temp file next to `final_path`
    pub async fn create(final_path: &Path) -> Result<Self> {
        let temp_path = temp_sibling(final_path);
        debug!("Writing to temp file: {}", temp_path.display());
        let file = File::create(&temp_path).await?;

        Ok(Self {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
        })
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    pub async fn write_chunk(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes).await?;
        Ok(())
    }

    /// Drain `reader` to EOF into the temp file, returning the byte count
    pub async fn copy_from<R: AsyncRead + Unpin>(&mut self, mut reader: R) -> Result<u64> {
        let mut buf = vec![0u8; 64 * 1024];
        let mut written = 0u64;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.file.write_all(&buf[..n]).await?;
            written += n as u64;
        }
        Ok(written)
    }

    /// Flush, fsync and move the temp file to its final name. Fails with
    /// [`TubemuxError::FileExists`] if the target appeared in the meantime.
    pub async fn finish(mut self) -> Result<PathBuf> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        drop(self.file);

        if tokio::fs::try_exists(&self.final_path).await? {
            // Keep neither: the caller gets the error, the temp goes away
            let _ = tokio::fs::remove_file(&self.temp_path).await;
            return Err(TubemuxError::FileExists(self.final_path));
        }

        tokio::fs::rename(&self.temp_path, &self.final_path).await?;
        debug!("Finalized output: {}", self.final_path.display());
        Ok(self.final_path)
    }

    /// Drop the temp file without producing any output
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.temp_path).await {
            warn!(
                "Could not remove temp file {}: {}",
                self.temp_path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finish_renames_temp_to_final() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.m4a");

        let mut sink = OutputSink::create(&target).await.unwrap();
        sink.write_chunk(b"audio bytes").await.unwrap();
        let path = sink.finish().await.unwrap();

        assert_eq!(path, target);
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"audio bytes");

        // No .part leftovers
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["song.m4a"]);
    }

    #[tokio::test]
    async fn test_finish_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("video.mkv");
        tokio::fs::write(&target, b"precious").await.unwrap();

        let mut sink = OutputSink::create(&target).await.unwrap();
        sink.write_chunk(b"new data").await.unwrap();
        let err = sink.finish().await.unwrap_err();

        assert!(matches!(err, TubemuxError::FileExists(_)));
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"precious");
    }

    #[tokio::test]
    async fn test_discard_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("video.mkv");

        let mut sink = OutputSink::create(&target).await.unwrap();
        sink.write_chunk(b"partial").await.unwrap();
        sink.discard().await;

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_copy_from_drains_reader() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.mkv");

        let mut sink = OutputSink::create(&target).await.unwrap();
        let n = sink.copy_from(&b"streamed contents"[..]).await.unwrap();
        assert_eq!(n, 17);

        let path = sink.finish().await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"streamed contents");
    }
}
