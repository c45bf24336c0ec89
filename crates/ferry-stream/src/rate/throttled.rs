//! Throttled source implementation for bandwidth limiting.
//!
//! Reads are capped to the whole tokens available in a [`TokenBucket`]; when
//! the bucket is empty the read sleeps until a small quantum has refilled.

use crate::error::Result;
use crate::rate::bandwidth::TokenBucket;
use crate::source::{Chunk, Source};

/// A source that delivers at most `bytes_per_second` on average.
///
/// The bucket holds one second of burst and starts full. Only bytes actually
/// delivered spend tokens; running out of tokens never ends the stream.
pub struct ThrottledSource<S> {
    inner:   S,
    limiter: Option<TokenBucket>,
}

impl<S> ThrottledSource<S> {
    pub fn new(inner: S, bytes_per_second: u64) -> Self {
        Self {
            inner,
            limiter: Some(TokenBucket::new(bytes_per_second, bytes_per_second)),
        }
    }

    /// A pass-through with no rate limit.
    pub fn unlimited(inner: S) -> Self { Self { inner, limiter: None } }

    /// Throttle when a rate is configured, pass through otherwise.
    pub fn with_limit(inner: S, bytes_per_second: Option<u64>) -> Self {
        match bytes_per_second {
            Some(rate) if rate > 0 => Self::new(inner, rate),
            _ => Self::unlimited(inner),
        }
    }

    pub fn is_limited(&self) -> bool { self.limiter.is_some() }

    pub fn into_inner(self) -> S { self.inner }
}

impl<S: Source> Source for ThrottledSource<S> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        let Some(bucket) = self.limiter.as_mut() else {
            return self.inner.read(buf).await;
        };
        if buf.is_empty() {
            return self.inner.read(buf).await;
        }

        let quantum = (bucket.refill_rate() / 100).max(1).min(buf.len() as u64);
        let allowed = loop {
            let available = bucket.available();
            if available > 0 {
                break available;
            }
            tokio::time::sleep(bucket.time_until(quantum)).await;
        };

        let cap = usize::try_from(allowed).map_or(buf.len(), |a| a.min(buf.len()));
        let chunk = self.inner.read(&mut buf[..cap]).await?;
        if let Chunk::Data(n) = chunk {
            bucket.consume(n as u64);
        }
        Ok(chunk)
    }
}
