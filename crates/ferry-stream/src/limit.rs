//! Byte ceilings over a source.

use crate::error::{Result, StreamError};
use crate::source::{Chunk, Source};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ceiling {
    /// Stop at the limit as if the source had ended.
    Truncate,
    /// Stop at the limit, but fault if the source still had more.
    Fault,
}

/// Delivers at most `max_bytes` from `inner`.
///
/// [`LimitedSource::new`] truncates: once the limit is reached every read is
/// [`Chunk::End`] and `inner` is no longer touched. This serves an exact
/// range length.
///
/// [`LimitedSource::strict`] guards untrusted input: after the limit it peeks
/// `inner` for one more byte and reports [`StreamError::SizeLimitExceeded`]
/// if there is one, so oversized input is never silently cut short.
pub struct LimitedSource<S> {
    inner:     S,
    max_bytes: u64,
    delivered: u64,
    ceiling:   Ceiling,
    finished:  bool,
}

impl<S> LimitedSource<S> {
    pub fn new(inner: S, max_bytes: u64) -> Self {
        Self::with_ceiling(inner, max_bytes, Ceiling::Truncate)
    }

    pub fn strict(inner: S, max_bytes: u64) -> Self {
        Self::with_ceiling(inner, max_bytes, Ceiling::Fault)
    }

    fn with_ceiling(inner: S, max_bytes: u64, ceiling: Ceiling) -> Self {
        Self {
            inner,
            max_bytes,
            delivered: 0,
            ceiling,
            finished: false,
        }
    }

    pub fn delivered(&self) -> u64 { self.delivered }

    pub fn remaining(&self) -> u64 { self.max_bytes - self.delivered }

    pub fn into_inner(self) -> S { self.inner }
}

impl<S: Source> Source for LimitedSource<S> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        if self.finished {
            return Ok(Chunk::End);
        }

        let remaining = self.remaining();
        if remaining == 0 {
            return match self.ceiling {
                Ceiling::Truncate => {
                    self.finished = true;
                    Ok(Chunk::End)
                }
                Ceiling::Fault => self.peek_past_limit().await,
            };
        }

        let cap = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let chunk = self.inner.read(&mut buf[..cap]).await?;
        match chunk {
            Chunk::Data(n) => self.delivered += n as u64,
            Chunk::End => self.finished = true,
            Chunk::Stall => {}
        }
        Ok(chunk)
    }
}

impl<S: Source> LimitedSource<S> {
    async fn peek_past_limit(&mut self) -> Result<Chunk> {
        let mut extra = [0u8; 1];
        match self.inner.read(&mut extra).await? {
            Chunk::Data(_) => {
                tracing::debug!(limit = self.max_bytes, "input exceeds size ceiling");
                Err(StreamError::SizeLimitExceeded {
                    limit: self.max_bytes,
                })
            }
            Chunk::End => {
                self.finished = true;
                Ok(Chunk::End)
            }
            Chunk::Stall => Ok(Chunk::Stall),
        }
    }
}
