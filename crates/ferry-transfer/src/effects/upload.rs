//! Streaming multipart upload receiver.
//!
//! The request body is capped by a strict limiter before multipart parsing,
//! the `file` part is streamed into a staged file while being hashed, and
//! the staged file is renamed into place only after everything succeeded.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use ferry_fs::sanitize_file_name;
use ferry_stream::{LimitedSource, ProgressSource, StreamError, StreamSource, TeeSink, copy, into_stream};
use ferry_verify::{HashSink, Sha256Hasher, VerificationError};
use serde::Deserialize;
use tokio::time::Instant;

use super::AppState;
use crate::data::{TransferKind, TransferSession, UploadReport};
use crate::error::{Result, TransferError};

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    /// Expected SHA-256 of the file, hex encoded.
    pub sha256: Option<String>,
}

impl UploadQuery {
    fn expected_digest(&self) -> Result<Option<Vec<u8>>> {
        let Some(raw) = self.sha256.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        match hex::decode(raw) {
            Ok(digest) if digest.len() == 32 => Ok(Some(digest)),
            _ => Err(TransferError::InvalidParameter {
                name:   "sha256",
                reason: "expected 64 hex characters".to_string(),
            }),
        }
    }
}

/// `POST /upload`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<UploadReport>)> {
    let config = state.config();
    let limit = config.max_upload_bytes;
    // One deadline for the whole receive, from the first body byte to the last.
    let deadline = Instant::now() + config.transfer_timeout;

    if let Some(declared) = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        && declared > limit
    {
        return Err(TransferError::SizeLimitExceeded { limit });
    }

    let expected = query.expected_digest()?;
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| TransferError::Multipart("missing Content-Type".to_string()))?;
    let boundary = multer::parse_boundary(content_type).map_err(|e| TransferError::Multipart(e.to_string()))?;

    let body = LimitedSource::strict(StreamSource::new(body.into_data_stream()), limit);
    let mut multipart = multer::Multipart::new(into_stream(body, config.chunk_size), boundary);

    let field = tokio::time::timeout_at(deadline, async {
        loop {
            match multipart.next_field().await.map_err(from_multer)? {
                Some(field) if field.name() == Some(FILE_FIELD) => return Ok(field),
                Some(field) => tracing::debug!(name = ?field.name(), "skipping multipart field"),
                None => return Err(TransferError::MissingFilePart),
            }
        }
    })
    .await
    .map_err(|_| TransferError::Timeout(config.transfer_timeout))??;

    let raw_name = field.file_name().unwrap_or_default().to_string();
    let name = sanitize_file_name(&raw_name)?;
    let mut staged = state.root().stage(&name).await?;

    let session = TransferSession::new(TransferKind::Upload, name.as_str(), None);
    let mut source = ProgressSource::new(StreamSource::new(field), None, session);
    let mut buf = state.pool().checkout();

    let copied = {
        let mut sink = TeeSink::new(staged.sink(), HashSink::new(Sha256Hasher::new()));
        let result = match tokio::time::timeout_at(deadline, copy(&mut source, &mut sink, &mut buf)).await {
            Ok(result) => result,
            Err(_) => Err(StreamError::Timeout(config.transfer_timeout)),
        };
        result.map(|bytes| (bytes, sink.into_parts().1))
    };
    drop(buf);

    // On any early return below the staged file is dropped and removed.
    let (bytes, hash) = copied.map_err(from_stream)?;
    let digest = match &expected {
        Some(expected) => hash.finish(expected).map_err(|e| match e {
            VerificationError::Mismatch { expected, actual } => TransferError::ChecksumMismatch {
                expected: hex::encode(expected),
                actual:   hex::encode(actual),
            },
            other => TransferError::InvalidParameter {
                name:   "sha256",
                reason: other.to_string(),
            },
        })?,
        None => hash.digest(),
    };

    let placed = staged.commit().await?;
    let (_, session) = source.into_parts();
    let report = session.report();
    let sha256 = hex::encode(digest);

    tracing::info!(
        id = %report.id,
        file = %name,
        path = %placed.display(),
        bytes,
        elapsed_ms = report.elapsed_ms,
        rate_bps = report.average_rate_bps as u64,
        sha256 = %sha256,
        "upload stored"
    );

    Ok((StatusCode::CREATED, Json(UploadReport {
        filename: name,
        bytes,
        sha256,
        elapsed_ms: report.elapsed_ms,
    })))
}

/// Recover the original fault from a multipart error.
///
/// The body limiter's faults travel through multer boxed as
/// [`multer::Error::StreamReadFailed`].
fn from_multer(err: multer::Error) -> TransferError {
    match err {
        multer::Error::StreamReadFailed(source) => match source.downcast::<StreamError>() {
            Ok(stream_err) => from_stream(*stream_err),
            Err(other) => TransferError::Multipart(other.to_string()),
        },
        other => TransferError::Multipart(other.to_string()),
    }
}

/// Like `TransferError::from`, but looks through multipart errors that were
/// wrapped as I/O faults by the field reader.
fn from_stream(err: StreamError) -> TransferError {
    match err {
        StreamError::Io(io) if io.get_ref().is_some_and(|inner| inner.is::<multer::Error>()) => {
            match io.into_inner().map(|inner| inner.downcast::<multer::Error>()) {
                Some(Ok(multer_err)) => from_multer(*multer_err),
                _ => TransferError::Multipart("unreadable multipart body".to_string()),
            }
        }
        other => other.into(),
    }
}
