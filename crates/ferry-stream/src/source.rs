//! The pull side of a transfer.

use std::future::Future;

use bytes::{Buf, Bytes};
use futures_util::{Stream, StreamExt};

use crate::copy::STALL_BACKOFF;
use crate::error::{Result, StreamError};

/// Outcome of a single [`Source::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk {
    /// `n > 0` bytes were written to the front of the caller's buffer.
    Data(usize),
    /// Nothing available right now; more may follow. Never means end-of-data.
    Stall,
    /// The source is exhausted. Every later call returns `End` again.
    End,
}

impl Chunk {
    /// Number of bytes carried by this chunk.
    pub fn len(&self) -> usize {
        match self {
            Chunk::Data(n) => *n,
            Chunk::Stall | Chunk::End => 0,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn is_end(&self) -> bool { matches!(self, Chunk::End) }
}

/// A capability producing bytes on demand.
///
/// Implementations fill at most `buf.len()` bytes per call. Faults are
/// reported as `Err` and are distinct from [`Chunk::End`]. A zero-length
/// buffer yields [`Chunk::Stall`] unless the source is already exhausted.
pub trait Source: Send {
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<Chunk>> + Send;
}

impl<S: Source + ?Sized> Source for &mut S {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> { (**self).read(buf).await }
}

impl Source for &[u8] {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        if self.is_empty() {
            return Ok(Chunk::End);
        }
        if buf.is_empty() {
            return Ok(Chunk::Stall);
        }

        let n = self.len().min(buf.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(Chunk::Data(n))
    }
}

/// Adapts a byte stream (an HTTP body, a multipart field) into a [`Source`].
///
/// Chunks larger than the caller's buffer are kept and handed out over
/// several reads. Empty chunks are skipped.
pub struct StreamSource<S> {
    inner:   S,
    pending: Bytes,
    done:    bool,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
            done: false,
        }
    }

    pub fn into_inner(self) -> S { self.inner }
}

impl<S, E> Source for StreamSource<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        while self.pending.is_empty() {
            if self.done {
                return Ok(Chunk::End);
            }
            match self.inner.next().await {
                Some(Ok(bytes)) => self.pending = bytes,
                Some(Err(e)) => return Err(StreamError::transport(e)),
                None => self.done = true,
            }
        }

        if buf.is_empty() {
            return Ok(Chunk::Stall);
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(Chunk::Data(n))
    }
}

/// Turn a [`Source`] back into a byte stream, reading `chunk_size` bytes at a time.
///
/// The stream yields a fault once and then terminates. Stalls are absorbed
/// with a short sleep so the consumer never sees an empty chunk.
pub fn into_stream<S>(
    source: S,
    chunk_size: usize,
) -> impl Stream<Item = Result<Bytes>> + Send + 'static
where
    S: Source + 'static,
{
    let buf = vec![0u8; chunk_size.max(1)];
    futures_util::stream::try_unfold((source, buf), |(mut source, mut buf)| async move {
        loop {
            match source.read(&mut buf).await {
                Ok(Chunk::Data(n)) => {
                    let bytes = Bytes::copy_from_slice(&buf[..n]);
                    return Ok(Some((bytes, (source, buf))));
                }
                Ok(Chunk::Stall) => tokio::time::sleep(STALL_BACKOFF).await,
                Ok(Chunk::End) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    })
}
