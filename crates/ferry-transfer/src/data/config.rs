use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Runtime configuration of the transfer service.
///
/// # Examples
///
/// ```
/// use ferry_transfer::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::default()
///     .upload_root("/srv/ferry")
///     .max_upload_bytes(1024 * 1024)
///     .rate_limit(Some(64 * 1024))
///     .transfer_timeout(Duration::from_secs(30));
/// assert_eq!(config.chunk_size, 32 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Directory uploads are stored in and downloads served from.
    pub upload_root: PathBuf,

    /// Upload ceiling in bytes, multipart framing included.
    ///
    /// Default: 10 MiB
    pub max_upload_bytes: u64,

    /// Per-download rate limit in bytes per second; `None` is unlimited.
    pub rate_limit: Option<u64>,

    /// Size of each pooled transfer buffer and of each response body chunk.
    ///
    /// Default: 32 KiB
    pub chunk_size: usize,

    /// Upper bound on the duration of a single transfer.
    ///
    /// Default: 300s
    pub transfer_timeout: Duration,

    /// Maximum number of idle buffers kept in the pool.
    ///
    /// Default: 64
    pub pool_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host:             DEFAULT_HOST.to_string(),
            port:             DEFAULT_PORT,
            upload_root:      PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rate_limit:       None,
            chunk_size:       DEFAULT_CHUNK_SIZE,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            pool_size:        DEFAULT_POOL_SIZE,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn upload_root(mut self, upload_root: impl Into<PathBuf>) -> Self {
        self.upload_root = upload_root.into();
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// A rate of zero is treated as unlimited.
    #[must_use]
    pub fn rate_limit(mut self, rate_limit: Option<u64>) -> Self {
        self.rate_limit = rate_limit.filter(|&rate| rate > 0);
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn transfer_timeout(mut self, transfer_timeout: Duration) -> Self {
        self.transfer_timeout = transfer_timeout;
        self
    }

    #[must_use]
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// `host:port`, suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.chunk_size, 32 * 1024);
        assert_eq!(config.transfer_timeout, Duration::from_secs(300));
        assert_eq!(config.pool_size, 64);
        assert_eq!(config.rate_limit, None);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn zero_rate_is_unlimited() {
        assert_eq!(ServerConfig::default().rate_limit(Some(0)).rate_limit, None);
        assert_eq!(ServerConfig::default().rate_limit(Some(5)).rate_limit, Some(5));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = ServerConfig::default().host("0.0.0.0").port(9000);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
