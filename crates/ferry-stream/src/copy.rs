use std::io;
use std::time::Duration;

use crate::error::{Result, StreamError};
use crate::sink::{Sink, write_all};
use crate::source::{Chunk, Source};

/// Sleep applied when a source stalls, so the loop never spins.
pub(crate) const STALL_BACKOFF: Duration = Duration::from_millis(5);

/// Move bytes from `source` to `sink` in `buf`-sized chunks until end-of-data.
///
/// Returns the number of bytes moved. The sink is flushed before returning.
/// Any fault from either side aborts the copy and is returned unchanged.
pub async fn copy<S, K>(source: &mut S, sink: &mut K, buf: &mut [u8]) -> Result<u64>
where
    S: Source,
    K: Sink,
{
    if buf.is_empty() {
        return Err(StreamError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "copy buffer is empty",
        )));
    }

    let mut total = 0u64;
    loop {
        match source.read(buf).await? {
            Chunk::Data(n) => {
                write_all(sink, &buf[..n]).await?;
                total += n as u64;
            }
            Chunk::Stall => tokio::time::sleep(STALL_BACKOFF).await,
            Chunk::End => break,
        }
    }

    sink.flush().await?;
    Ok(total)
}
