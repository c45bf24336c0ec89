//! Progress observation for a single transfer.

use crate::error::Result;
use crate::source::{Chunk, Source};

/// Receives the cumulative byte count of a transfer.
///
/// Called exactly once per successful read, including reads that return
/// [`Chunk::Stall`] or [`Chunk::End`]. Never called for a faulted read.
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, cumulative: u64, total: Option<u64>);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64, Option<u64>) + Send,
{
    fn on_progress(&mut self, cumulative: u64, total: Option<u64>) { self(cumulative, total) }
}

/// Forwards reads unchanged while reporting progress to an observer.
pub struct ProgressSource<S, O> {
    inner:      S,
    observer:   O,
    total:      Option<u64>,
    cumulative: u64,
}

impl<S, O> ProgressSource<S, O> {
    pub fn new(inner: S, total: Option<u64>, observer: O) -> Self {
        Self {
            inner,
            observer,
            total,
            cumulative: 0,
        }
    }

    pub fn cumulative(&self) -> u64 { self.cumulative }

    pub fn observer(&self) -> &O { &self.observer }

    pub fn into_parts(self) -> (S, O) { (self.inner, self.observer) }
}

impl<S: Source, O: ProgressObserver> Source for ProgressSource<S, O> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        let chunk = self.inner.read(buf).await?;
        self.cumulative += chunk.len() as u64;
        self.observer.on_progress(self.cumulative, self.total);
        Ok(chunk)
    }
}
