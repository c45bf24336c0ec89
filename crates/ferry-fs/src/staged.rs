use std::path::{Path, PathBuf};

use ferry_stream::Sink;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, from_io};

/// A writable file handle usable as a [`Sink`].
pub struct FileSink {
    file:    File,
    path:    PathBuf,
    written: u64,
}

impl FileSink {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).await.map_err(|e| from_io(&path, e))?;
        Ok(Self {
            file,
            path,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn written(&self) -> u64 { self.written }

    /// Flush and force the contents to stable storage.
    pub async fn sync_all(&mut self) -> Result<()> {
        self.file.flush().await.map_err(|e| from_io(&self.path, e))?;
        self.file.sync_all().await.map_err(|e| from_io(&self.path, e))
    }
}

impl Sink for FileSink {
    async fn write(&mut self, buf: &[u8]) -> ferry_stream::Result<usize> {
        self.file.write_all(buf).await?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> ferry_stream::Result<()> {
        self.file.flush().await?;
        Ok(())
    }
}

/// An upload in progress: a hidden staging file that becomes the destination
/// only through [`StagedFile::commit`].
///
/// Dropping an uncommitted guard removes the staging file, so every failure
/// path leaves the destination untouched and no partial file behind.
pub struct StagedFile {
    sink:        FileSink,
    destination: PathBuf,
    committed:   bool,
}

impl StagedFile {
    pub(crate) async fn create(staging: PathBuf, destination: PathBuf) -> Result<Self> {
        let sink = FileSink::create(staging).await?;
        tracing::debug!(staging = %sink.path().display(), "staging file created");
        Ok(Self {
            sink,
            destination,
            committed: false,
        })
    }

    pub fn staging_path(&self) -> &Path { self.sink.path() }

    pub fn destination(&self) -> &Path { &self.destination }

    /// The sink that writes into the staging file.
    pub fn sink(&mut self) -> &mut FileSink { &mut self.sink }

    /// Sync the staging file and atomically rename it onto the destination,
    /// replacing any existing file.
    pub async fn commit(mut self) -> Result<PathBuf> {
        self.sink.sync_all().await?;
        tokio::fs::rename(self.sink.path(), &self.destination)
            .await
            .map_err(|e| from_io(&self.destination, e))?;
        self.committed = true;
        Ok(self.destination.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let staging = self.sink.path();
        tracing::warn!(staging = %staging.display(), "discarding staged upload");
        match std::fs::remove_file(staging) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(staging = %staging.display(), "staging file already gone");
            }
            Err(e) => {
                tracing::warn!(staging = %staging.display(), error = %e, "staging file left behind");
            }
        }
    }
}
