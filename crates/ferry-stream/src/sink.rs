//! The push side of a transfer.

use std::future::Future;

use crate::error::{Result, StreamError};

/// A capability accepting bytes.
///
/// `write` returns how many bytes were accepted. Accepting fewer than offered
/// without returning `Err` breaks the contract; [`write_all`] turns that into
/// [`StreamError::ShortWrite`].
pub trait Sink: Send {
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    fn flush(&mut self) -> impl Future<Output = Result<()>> + Send { async { Ok(()) } }
}

impl<K: Sink + ?Sized> Sink for &mut K {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> { (**self).write(buf).await }

    async fn flush(&mut self) -> Result<()> { (**self).flush().await }
}

impl Sink for Vec<u8> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

/// Hand `buf` to `sink` and require that every byte is accepted.
pub async fn write_all<K: Sink>(sink: &mut K, buf: &[u8]) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }

    let accepted = sink.write(buf).await?;
    if accepted != buf.len() {
        return Err(StreamError::ShortWrite {
            offered: buf.len(),
            accepted,
        });
    }
    Ok(())
}
