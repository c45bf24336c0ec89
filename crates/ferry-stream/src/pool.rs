//! Reusable fixed-size transfer buffers.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

/// A shared pool of equally sized byte buffers.
///
/// Share it behind an [`Arc`]; every [`PooledBuffer`] returns its buffer on
/// drop, on success and fault paths alike. At most `max_pooled` idle buffers
/// are retained, the rest are freed.
#[derive(Debug)]
pub struct BufferPool {
    buffer_size: usize,
    max_pooled:  usize,
    idle:        Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new(buffer_size: usize, max_pooled: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer_size: buffer_size.max(1),
            max_pooled,
            idle: Mutex::new(Vec::with_capacity(max_pooled)),
        })
    }

    pub fn buffer_size(&self) -> usize { self.buffer_size }

    /// Number of idle buffers currently retained.
    pub fn idle(&self) -> usize { self.lock().len() }

    /// Take a buffer out of the pool, allocating one if none is idle.
    pub fn checkout(self: &Arc<Self>) -> PooledBuffer {
        let buf = self.lock().pop().unwrap_or_else(|| vec![0u8; self.buffer_size]);
        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    fn give_back(&self, buf: Vec<u8>) {
        let mut idle = self.lock();
        if idle.len() < self.max_pooled {
            idle.push(buf);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A buffer checked out of a [`BufferPool`]; derefs to `[u8]`.
#[derive(Debug)]
pub struct PooledBuffer {
    buf:  Vec<u8>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] { &self.buf }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] { &mut self.buf }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) { self.pool.give_back(std::mem::take(&mut self.buf)); }
}
