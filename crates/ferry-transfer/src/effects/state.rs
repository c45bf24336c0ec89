use std::sync::Arc;

use ferry_fs::UploadRoot;
use ferry_stream::BufferPool;

use crate::data::ServerConfig;
use crate::error::Result;

/// Read-only state shared by every request.
#[derive(Debug)]
pub struct AppState {
    config: ServerConfig,
    root:   UploadRoot,
    pool:   Arc<BufferPool>,
}

impl AppState {
    /// Open (and create if needed) the upload root and size the buffer pool.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let root = UploadRoot::open(&config.upload_root)?;
        let pool = BufferPool::new(config.chunk_size, config.pool_size);
        tracing::info!(
            root = %root.path().display(),
            max_upload_bytes = config.max_upload_bytes,
            rate_limit = ?config.rate_limit,
            chunk_size = config.chunk_size,
            "transfer state ready"
        );
        Ok(Self { config, root, pool })
    }

    pub fn config(&self) -> &ServerConfig { &self.config }

    pub fn root(&self) -> &UploadRoot { &self.root }

    pub fn pool(&self) -> &Arc<BufferPool> { &self.pool }
}
