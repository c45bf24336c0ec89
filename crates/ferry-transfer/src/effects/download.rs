//! Range-aware download responder.
//!
//! A producer task drives the file through the adapter chain into one end
//! of a pipe; the response body reads the other end.

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, IF_RANGE, LAST_MODIFIED, RANGE,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use ferry_fs::{FileRegionSource, StoredFile};
use ferry_stream::{
    GzipSink, LimitedSource, PipeWriter, ProgressSource, Sink, StreamError, TeeSource,
    ThrottledSource, copy, into_stream, pipe,
};
use ferry_verify::{HashSink, Sha256Hasher};
use serde::Deserialize;

use super::AppState;
use crate::core::{content_disposition, http_date, if_range_matches, parse_range, plan_response};
use crate::data::{ResponsePlan, TransferKind, TransferSession};
use crate::error::{Result, TransferError};

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    pub file: Option<String>,
    pub gzip: Option<String>,
}

impl DownloadQuery {
    fn wants_gzip(&self) -> bool {
        self.gzip
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }
}

/// `GET|HEAD /download` and `/range-download`.
pub async fn download(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    let file = query
        .file
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or(TransferError::MissingParameter("file"))?;

    let stored = state.root().open_existing(file).await?;
    let name = stored.name().to_string();
    let total = stored.len();

    let range = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_range)
        .filter(|_| validator_holds(&headers, &stored));
    let plan = plan_response(range, total);
    let Some((start, len)) = plan.window() else {
        return Err(TransferError::UnsatisfiableRange { total });
    };
    let gzip = query.wants_gzip() && !plan.is_partial();

    let mut response_headers = HeaderMap::new();
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    response_headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response_headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&name))
            .map_err(|_| TransferError::InvalidFileName(name.clone()))?,
    );
    if let Some(modified) = stored.modified()
        && let Ok(value) = HeaderValue::from_str(&http_date(modified))
    {
        response_headers.insert(LAST_MODIFIED, value);
    }
    if let ResponsePlan::Partial(spec) = plan
        && let Ok(value) = HeaderValue::from_str(&spec.content_range())
    {
        response_headers.insert(CONTENT_RANGE, value);
    }
    if gzip {
        response_headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    } else {
        response_headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }

    let status = if plan.is_partial() { StatusCode::PARTIAL_CONTENT } else { StatusCode::OK };
    tracing::debug!(file = %name, ?plan, gzip, method = %method, "download planned");

    if method == Method::HEAD {
        return Ok((status, response_headers).into_response());
    }

    let region = stored.into_region(start).await?;
    let session = TransferSession::new(TransferKind::Download, name, Some(len));
    let (writer, reader) = pipe();
    tokio::spawn(produce(Arc::clone(&state), region, len, gzip, session, writer));

    let body = Body::from_stream(into_stream(reader, state.config().chunk_size));
    Ok((status, response_headers, body).into_response())
}

/// `If-Range` lets a resuming client ask for the range only if the file is
/// unchanged; otherwise the whole file is sent. Only dates are validators
/// here, so any entity tag fails.
fn validator_holds(headers: &HeaderMap, stored: &StoredFile) -> bool {
    let Some(value) = headers.get(IF_RANGE) else {
        return true;
    };
    let holds = value
        .to_str()
        .is_ok_and(|v| if_range_matches(v, stored.modified()));
    if !holds {
        tracing::debug!(file = %stored.name(), if_range = ?value, "stale If-Range, serving full content");
    }
    holds
}

/// Where the producer writes: straight into the pipe or through gzip.
enum BodySink {
    Plain(PipeWriter),
    Gzip(GzipSink<PipeWriter>),
}

impl BodySink {
    async fn finish(self) -> ferry_stream::Result<PipeWriter> {
        match self {
            BodySink::Plain(writer) => Ok(writer),
            BodySink::Gzip(gz) => gz.finish().await,
        }
    }

    fn into_writer(self) -> PipeWriter {
        match self {
            BodySink::Plain(writer) => writer,
            BodySink::Gzip(gz) => gz.into_inner(),
        }
    }
}

impl Sink for BodySink {
    async fn write(&mut self, buf: &[u8]) -> ferry_stream::Result<usize> {
        match self {
            BodySink::Plain(writer) => writer.write(buf).await,
            BodySink::Gzip(gz) => gz.write(buf).await,
        }
    }

    async fn flush(&mut self) -> ferry_stream::Result<()> {
        match self {
            BodySink::Plain(writer) => writer.flush().await,
            BodySink::Gzip(gz) => gz.flush().await,
        }
    }
}

async fn produce(
    state: Arc<AppState>,
    region: FileRegionSource,
    len: u64,
    gzip: bool,
    session: TransferSession,
    writer: PipeWriter,
) {
    let config = state.config();
    let limit = config.transfer_timeout;
    let mut buf = state.pool().checkout();

    let throttled = ThrottledSource::with_limit(LimitedSource::new(region, len), config.rate_limit);
    let tee = TeeSource::new(throttled, HashSink::new(Sha256Hasher::new()));
    let mut source = ProgressSource::new(tee, Some(len), session);
    let mut sink = if gzip {
        BodySink::Gzip(GzipSink::new(writer))
    } else {
        BodySink::Plain(writer)
    };

    let copied = match tokio::time::timeout(limit, copy(&mut source, &mut sink, &mut buf)).await {
        // The file shrank under us; ending cleanly would pass off a truncated body as complete.
        Ok(Ok(n)) if n < len => Err(StreamError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("file ended after {n} of {len} bytes"),
        ))),
        Ok(result) => result,
        Err(_) => Err(StreamError::Timeout(limit)),
    };
    drop(buf);

    let (tee, session) = source.into_parts();
    let report = session.report();

    match copied {
        Ok(_) => {
            let closed = match sink.finish().await {
                Ok(writer) => writer.close().await,
                Err(e) => Err(e),
            };
            match closed {
                Ok(()) => {
                    let (_, hash) = tee.into_parts();
                    tracing::info!(
                        id = %report.id,
                        file = %report.file,
                        bytes = report.bytes,
                        elapsed_ms = report.elapsed_ms,
                        rate_bps = report.average_rate_bps as u64,
                        sha256 = %hash.hex_digest(),
                        gzip,
                        "download complete"
                    );
                }
                Err(e) => {
                    tracing::warn!(id = %report.id, file = %report.file, error = %e, "download not finished");
                }
            }
        }
        Err(StreamError::PipeClosed) => {
            tracing::debug!(id = %report.id, file = %report.file, bytes = report.bytes, "client went away");
        }
        Err(e) => {
            tracing::warn!(
                id = %report.id,
                file = %report.file,
                bytes = report.bytes,
                error = %e,
                "download aborted"
            );
            // The body stream yields this fault, so the response is cut off.
            let _ = sink.into_writer().close_with_error(e).await;
        }
    }
}
