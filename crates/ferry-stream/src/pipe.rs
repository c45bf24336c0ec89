//! A synchronous (rendezvous) pipe between two concurrent stages.
//!
//! The writer hands over one chunk at a time and its `write` completes only
//! once the reader has consumed the whole chunk, so memory in flight is
//! bounded to a single chunk and a slow reader slows the writer down.

use bytes::{Buf, Bytes};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, StreamError};
use crate::sink::Sink;
use crate::source::{Chunk, Source};

enum Message {
    Data(Bytes, oneshot::Sender<()>),
    End,
    Fault(StreamError),
}

/// Create a connected writer/reader pair.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel(1);
    let writer = PipeWriter { tx };
    let reader = PipeReader {
        rx,
        current: None,
        state: ReaderState::Open,
    };
    (writer, reader)
}

/// The producing end. Not cloneable: a pipe has exactly one writer.
///
/// Finish with [`PipeWriter::close`] or [`PipeWriter::close_with_error`].
/// Dropping the writer without either is seen by the reader as
/// [`StreamError::PipeAbandoned`], never as end-of-data.
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<Message>,
}

impl PipeWriter {
    /// Signal end-of-data once the reader has drained everything written.
    pub async fn close(self) -> Result<()> {
        self.tx
            .send(Message::End)
            .await
            .map_err(|_| StreamError::PipeClosed)
    }

    /// Signal a fault; the reader's next (or pending) read returns `err`.
    pub async fn close_with_error(self, err: StreamError) -> Result<()> {
        self.tx
            .send(Message::Fault(err))
            .await
            .map_err(|_| StreamError::PipeClosed)
    }

    /// Returns `true` if the reader has gone away.
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }
}

impl Sink for PipeWriter {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Message::Data(Bytes::copy_from_slice(buf), ack_tx))
            .await
            .map_err(|_| StreamError::PipeClosed)?;
        ack_rx.await.map_err(|_| StreamError::PipeClosed)?;
        Ok(buf.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Open,
    Ended,
    Faulted,
}

/// The consuming end. Not cloneable: a pipe has exactly one reader.
///
/// Dropping the reader makes pending and later writes fail with
/// [`StreamError::PipeClosed`].
pub struct PipeReader {
    rx:      mpsc::Receiver<Message>,
    current: Option<(Bytes, oneshot::Sender<()>)>,
    state:   ReaderState,
}

impl PipeReader {
    /// Wait for the next message. `Ok(false)` means the writer closed cleanly.
    async fn next_chunk(&mut self) -> Result<bool> {
        match self.rx.recv().await {
            Some(Message::Data(bytes, ack)) => {
                self.current = Some((bytes, ack));
                Ok(true)
            }
            Some(Message::End) => {
                self.state = ReaderState::Ended;
                Ok(false)
            }
            Some(Message::Fault(err)) => {
                self.state = ReaderState::Faulted;
                Err(err)
            }
            None => {
                self.state = ReaderState::Faulted;
                tracing::debug!("pipe writer dropped without closing");
                Err(StreamError::PipeAbandoned)
            }
        }
    }
}

impl Source for PipeReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        match self.state {
            ReaderState::Ended => return Ok(Chunk::End),
            ReaderState::Faulted => return Err(StreamError::PipeClosed),
            ReaderState::Open => {}
        }

        if self.current.is_none() && !self.next_chunk().await? {
            return Ok(Chunk::End);
        }
        if buf.is_empty() {
            return Ok(Chunk::Stall);
        }

        let Some((bytes, _)) = self.current.as_mut() else {
            return Ok(Chunk::Stall);
        };
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        bytes.advance(n);

        if bytes.is_empty()
            && let Some((_, ack)) = self.current.take()
        {
            let _ = ack.send(());
        }
        Ok(Chunk::Data(n))
    }
}
