//! Composable byte sources and sinks for streaming transfers.
//!
//! A [`Source`] produces bytes on demand and a [`Sink`] accepts them. Adapters
//! wrap exactly one inner value and add one concern each:
//!
//! - [`LimitedSource`] - byte ceilings, truncating or strict
//! - [`ThrottledSource`] - token-bucket rate limiting
//! - [`ProgressSource`] - cumulative progress reporting
//! - [`TeeSource`] / [`TeeSink`] - duplication into a mirror sink
//! - [`GzipSink`] - on-the-fly compression
//!
//! [`pipe`] connects two concurrent stages with a rendezvous channel, and
//! [`copy`] drives bytes from a source to a sink using a buffer that is
//! usually checked out of a [`BufferPool`].
//!
//! # Example
//!
//! ```
//! use ferry_stream::{LimitedSource, ProgressSource, copy};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ferry_stream::Result<()> {
//! let data = b"hello world";
//! let mut seen = 0u64;
//! let mut src = ProgressSource::new(LimitedSource::new(&data[..], 5), Some(5), |n: u64, _: Option<u64>| seen = n);
//! let mut out = Vec::new();
//!
//! copy(&mut src, &mut out, &mut [0u8; 4]).await?;
//! drop(src);
//!
//! assert_eq!(out, b"hello");
//! assert_eq!(seen, 5);
//! # Ok(())
//! # }
//! ```

pub use self::copy::copy;
pub use self::error::{Result, StreamError};
pub use self::gzip::GzipSink;
pub use self::limit::LimitedSource;
pub use self::pipe::{PipeReader, PipeWriter, pipe};
pub use self::pool::{BufferPool, PooledBuffer};
pub use self::progress::{ProgressObserver, ProgressSource};
pub use self::rate::{ThrottledSource, TokenBucket};
pub use self::sink::{Sink, write_all};
pub use self::source::{Chunk, Source, StreamSource, into_stream};
pub use self::tee::{TeeSink, TeeSource};

mod copy;
mod error;
mod gzip;
mod limit;
mod pipe;
mod pool;
mod progress;
pub mod rate;
mod sink;
mod source;
mod tee;
