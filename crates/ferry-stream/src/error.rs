//! Error types for ferry-stream.

use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("size limit of {limit} bytes exceeded")]
    SizeLimitExceeded { limit: u64 },

    #[error("sink accepted {accepted} of {offered} bytes")]
    ShortWrite { offered: usize, accepted: usize },

    #[error("mirror sink failed: {0}")]
    Mirror(#[source] Box<StreamError>),

    #[error("pipe closed by the other end")]
    PipeClosed,

    #[error("pipe producer went away without closing")]
    PipeAbandoned,

    #[error("transfer canceled")]
    Canceled,

    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StreamError {
    /// Wrap any transport error (HTTP body, multipart framing) as an I/O fault.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StreamError::Io(io::Error::other(err))
    }

    /// Walk the mirror wrapping down to the fault that started it.
    pub fn root(&self) -> &StreamError {
        match self {
            StreamError::Mirror(inner) => inner.root(),
            other => other,
        }
    }

    /// Returns `true` if the fault came from a size ceiling, however deeply wrapped.
    pub fn is_size_limit(&self) -> bool {
        matches!(self.root(), StreamError::SizeLimitExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
