use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ferry_stream::{Chunk, Source};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{Error, Result, from_io};

/// An existing regular file inside the upload root, opened for reading.
#[derive(Debug)]
pub struct StoredFile {
    name:     String,
    path:     PathBuf,
    file:     File,
    len:      u64,
    modified: Option<SystemTime>,
}

impl StoredFile {
    pub(crate) async fn open(name: String, path: PathBuf) -> Result<Self> {
        let file = File::open(&path).await.map_err(|e| from_io(&path, e))?;
        let meta = file.metadata().await.map_err(|e| from_io(&path, e))?;
        if !meta.is_file() {
            return Err(Error::NotFound(path));
        }

        Ok(Self {
            name,
            path,
            file,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    /// The sanitized name the file was requested by.
    pub fn name(&self) -> &str { &self.name }

    pub fn path(&self) -> &Path { &self.path }

    pub fn len(&self) -> u64 { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn modified(&self) -> Option<SystemTime> { self.modified }

    /// Position the file at `start` and read from there to its end.
    pub async fn into_region(self, start: u64) -> Result<FileRegionSource> {
        FileRegionSource::open(self.file, self.path, start).await
    }
}

/// Reads a file from a starting offset to its end.
///
/// Pair with [`ferry_stream::LimitedSource`] to stop at the end of a range.
pub struct FileRegionSource {
    file: File,
    path: PathBuf,
    done: bool,
}

impl FileRegionSource {
    pub async fn open(mut file: File, path: PathBuf, start: u64) -> Result<Self> {
        if start > 0 {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|e| from_io(&path, e))?;
        }
        Ok(Self {
            file,
            path,
            done: false,
        })
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl Source for FileRegionSource {
    async fn read(&mut self, buf: &mut [u8]) -> ferry_stream::Result<Chunk> {
        if self.done {
            return Ok(Chunk::End);
        }
        if buf.is_empty() {
            return Ok(Chunk::Stall);
        }

        match self.file.read(buf).await? {
            0 => {
                self.done = true;
                Ok(Chunk::End)
            }
            n => Ok(Chunk::Data(n)),
        }
    }
}
