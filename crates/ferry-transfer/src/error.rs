//! Error types for ferry-transfer and their HTTP mapping.

use std::io;
use std::time::Duration;

use axum::Json;
use axum::http::header::{ACCEPT_RANGES, CONTENT_RANGE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use ferry_stream::StreamError;
use serde_json::json;
use thiserror::Error;

use crate::data::RangeSpec;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("missing query parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid query parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("range not satisfiable for content of {total} bytes")]
    UnsatisfiableRange { total: u64 },

    #[error("upload exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("multipart body has no `file` part")]
    MissingFilePart,

    #[error("invalid file name {0:?}")]
    InvalidFileName(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),

    #[error("transfer canceled")]
    Canceled,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("mirror failed: {0}")]
    Mirror(#[source] StreamError),

    #[error("stream error: {0}")]
    Stream(#[source] StreamError),
}

impl TransferError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::InvalidParameter { .. }
            | Self::Multipart(_)
            | Self::MissingFilePart
            | Self::InvalidFileName(_)
            | Self::ChecksumMismatch { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsatisfiableRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::SizeLimitExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Canceled | Self::Io(_) | Self::Mirror(_) | Self::Stream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::NotFound(_) => "not_found",
            Self::UnsatisfiableRange { .. } => "range_not_satisfiable",
            Self::SizeLimitExceeded { .. } => "payload_too_large",
            Self::Multipart(_) => "malformed_multipart",
            Self::MissingFilePart => "missing_file_part",
            Self::InvalidFileName(_) => "invalid_file_name",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
            Self::Timeout(_) => "timeout",
            Self::Canceled => "canceled",
            Self::Io(_) | Self::Mirror(_) | Self::Stream(_) => "internal",
        }
    }
}

impl From<StreamError> for TransferError {
    fn from(err: StreamError) -> Self {
        if let StreamError::SizeLimitExceeded { limit } = err.root() {
            return Self::SizeLimitExceeded { limit: *limit };
        }
        match err {
            StreamError::Timeout(after) => Self::Timeout(after),
            StreamError::Canceled => Self::Canceled,
            StreamError::Io(e) => Self::Io(e),
            mirror @ StreamError::Mirror(_) => Self::Mirror(mirror),
            other => Self::Stream(other),
        }
    }
}

impl From<ferry_fs::Error> for TransferError {
    fn from(err: ferry_fs::Error) -> Self {
        match err {
            ferry_fs::Error::InvalidName(name) => Self::InvalidFileName(name),
            // An escape is reported like a missing file so nothing outside the root is revealed.
            ferry_fs::Error::Escape { name, .. } => Self::NotFound(name),
            ferry_fs::Error::NotFound(path) => Self::NotFound(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            ),
            ferry_fs::Error::Io { source, .. } => Self::Io(source),
        }
    }
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }

        if let Self::UnsatisfiableRange { total } = self {
            let mut response = status.into_response();
            let headers = response.headers_mut();
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            if let Ok(value) = HeaderValue::from_str(&RangeSpec::unsatisfied(total)) {
                headers.insert(CONTENT_RANGE, value);
            }
            return response;
        }

        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
