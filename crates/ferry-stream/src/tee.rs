//! Duplicating adapters: every byte also goes to a mirror sink.

use crate::error::{Result, StreamError};
use crate::sink::{Sink, write_all};
use crate::source::{Chunk, Source};

async fn mirror_all<M: Sink>(mirror: &mut M, buf: &[u8]) -> Result<()> {
    write_all(mirror, buf).await.map_err(|e| {
        tracing::warn!(error = %e, "mirror sink failed");
        StreamError::Mirror(Box::new(e))
    })
}

/// Copies every delivered byte into `mirror` before returning it.
///
/// A mirror fault, including a short write, fails the read with
/// [`StreamError::Mirror`].
pub struct TeeSource<S, M> {
    inner:  S,
    mirror: M,
}

impl<S, M> TeeSource<S, M> {
    pub fn new(inner: S, mirror: M) -> Self { Self { inner, mirror } }

    pub fn mirror(&self) -> &M { &self.mirror }

    pub fn into_parts(self) -> (S, M) { (self.inner, self.mirror) }
}

impl<S: Source, M: Sink> Source for TeeSource<S, M> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        let chunk = self.inner.read(buf).await?;
        if let Chunk::Data(n) = chunk {
            mirror_all(&mut self.mirror, &buf[..n]).await?;
        }
        Ok(chunk)
    }
}

/// Writes to `primary` first, then the same bytes to `mirror`.
pub struct TeeSink<P, M> {
    primary: P,
    mirror:  M,
}

impl<P, M> TeeSink<P, M> {
    pub fn new(primary: P, mirror: M) -> Self { Self { primary, mirror } }

    pub fn primary(&self) -> &P { &self.primary }

    pub fn mirror(&self) -> &M { &self.mirror }

    pub fn into_parts(self) -> (P, M) { (self.primary, self.mirror) }
}

impl<P: Sink, M: Sink> Sink for TeeSink<P, M> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let accepted = self.primary.write(buf).await?;
        mirror_all(&mut self.mirror, &buf[..accepted]).await?;
        Ok(accepted)
    }

    async fn flush(&mut self) -> Result<()> {
        self.primary.flush().await?;
        self.mirror.flush().await.map_err(|e| StreamError::Mirror(Box::new(e)))
    }
}
