//! On-the-fly gzip compression in front of another sink.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::Result;
use crate::sink::{Sink, write_all};

/// Compresses everything written and forwards the compressed bytes to `inner`.
///
/// [`Sink::flush`] performs a sync flush so downstream sees every byte
/// written so far. Call [`GzipSink::finish`] to write the gzip trailer and
/// get the inner sink back; dropping without finishing leaves a truncated
/// stream.
pub struct GzipSink<K> {
    encoder: GzEncoder<Vec<u8>>,
    inner:   K,
}

impl<K: Sink> GzipSink<K> {
    pub fn new(inner: K) -> Self { Self::with_level(inner, Compression::default()) }

    pub fn with_level(inner: K, level: Compression) -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), level),
            inner,
        }
    }

    async fn drain(&mut self) -> Result<()> {
        let compressed = std::mem::take(self.encoder.get_mut());
        write_all(&mut self.inner, &compressed).await
    }

    /// Give up on the stream and return `inner` without writing the trailer.
    pub fn into_inner(self) -> K { self.inner }

    /// Write the trailer, flush `inner` and return it.
    pub async fn finish(mut self) -> Result<K> {
        self.encoder.try_finish()?;
        self.drain().await?;
        self.inner.flush().await?;
        Ok(self.inner)
    }
}

impl<K: Sink> Sink for GzipSink<K> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.encoder.write_all(buf)?;
        self.drain().await?;
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<()> {
        self.encoder.flush()?;
        self.drain().await?;
        self.inner.flush().await
    }
}
