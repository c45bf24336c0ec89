//! Checksum verification for streamed transfers.
//!
//! A [`HashSink`] mirrors the bytes of a transfer (through a
//! [`ferry_stream::TeeSource`] or [`ferry_stream::TeeSink`]) into an
//! incremental [`Hasher`], so the digest is ready the moment the copy ends.
//!
//! # Example
//!
//! ```
//! use ferry_stream::{TeeSource, copy};
//! use ferry_verify::{HashSink, Sha256Hasher};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let data = b"hello world";
//! let mut src = TeeSource::new(&data[..], HashSink::new(Sha256Hasher::new()));
//! copy(&mut src, &mut Vec::<u8>::new(), &mut [0u8; 4]).await.unwrap();
//!
//! let (_, hash) = src.into_parts();
//! hash.finish(&Sha256Hasher::digest(b"hello world")).unwrap();
//! # }
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::Hasher;
pub use self::sink::HashSink;

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

mod error;
mod hasher;
mod sink;
