use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ferry_transfer::ServerConfig;
use ferry_transfer::data::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_POOL_SIZE, DEFAULT_PORT,
    DEFAULT_TRANSFER_TIMEOUT,
};

#[derive(Parser, Debug)]
#[command(name = "ferry", version, about, long_about = None)]
pub(crate) struct Args {
    /// Listening host
    #[arg(long, env = "FERRY_HOST", default_value = DEFAULT_HOST)]
    pub(crate) host: String,

    /// Listening port
    #[arg(short, long, env = "FERRY_PORT", default_value_t = DEFAULT_PORT)]
    pub(crate) port: u16,

    /// Directory files are served from and uploaded into
    #[arg(short, long, env = "FERRY_UPLOAD_ROOT", default_value = "uploads")]
    pub(crate) root: PathBuf,

    /// Largest accepted upload request body, in bytes
    #[arg(long, env = "FERRY_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub(crate) max_upload_bytes: u64,

    /// Download bandwidth cap in bytes per second, 0 for unlimited
    #[arg(long, env = "FERRY_RATE_LIMIT", default_value_t = 0)]
    pub(crate) rate_limit: u64,

    /// Bytes moved per read
    #[arg(long, env = "FERRY_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub(crate) chunk_size: usize,

    /// Seconds a single transfer may take
    #[arg(long, env = "FERRY_TRANSFER_TIMEOUT_SECS", default_value_t = DEFAULT_TRANSFER_TIMEOUT.as_secs())]
    pub(crate) transfer_timeout_secs: u64,

    /// Idle transfer buffers kept for reuse
    #[arg(long, env = "FERRY_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pub(crate) pool_size: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig::default()
            .host(args.host)
            .port(args.port)
            .upload_root(args.root)
            .max_upload_bytes(args.max_upload_bytes)
            .rate_limit(Some(args.rate_limit))
            .chunk_size(args.chunk_size)
            .transfer_timeout(Duration::from_secs(args.transfer_timeout_secs))
            .pool_size(args.pool_size)
    }
}
