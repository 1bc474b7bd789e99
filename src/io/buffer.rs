use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use crate::{LockBenchError, Result};

/// Recycles chunk buffers between write/read invocations
#[derive(Clone)]
pub struct BufferPool {
    buffers: Arc<Mutex<VecDeque<Vec<u8>>>>,
    buffer_size: usize,
    max_buffers: usize,
}

impl BufferPool {
    /// Create a new buffer pool with specified buffer size and maximum count
    pub fn new(buffer_size: usize, max_buffers: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(LockBenchError::Config("Buffer size must be greater than 0".to_string()));
        }
        if max_buffers == 0 {
            return Err(LockBenchError::Config("Max buffers must be greater than 0".to_string()));
        }

        Ok(Self {
            buffers: Arc::new(Mutex::new(VecDeque::new())),
            buffer_size,
            max_buffers,
        })
    }

    /// Take a buffer from the pool, allocating if none is free.
    /// The buffer goes back to the pool when the guard drops.
    pub fn get(&self) -> Result<PooledBuffer> {
        let buffer = self
            .lock()?
            .pop_front()
            .unwrap_or_else(|| vec![0u8; self.buffer_size]);

        Ok(PooledBuffer {
            buffer: Some(buffer),
            pool: self.clone(),
        })
    }

    fn give_back(&self, buffer: Vec<u8>) -> Result<()> {
        if buffer.len() == self.buffer_size {
            let mut buffers = self.lock()?;
            if buffers.len() < self.max_buffers {
                buffers.push_back(buffer);
            }
        }
        Ok(())
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently parked in the pool
    pub fn pool_size(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<Vec<u8>>>> {
        self.buffers
            .lock()
            .map_err(|_| LockBenchError::Worker("Buffer pool lock poisoned".to_string()))
    }
}

/// RAII handle on a pooled buffer
pub struct PooledBuffer {
    buffer: Option<Vec<u8>>,
    pool: BufferPool,
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buffer.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            let _ = self.pool.give_back(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_pool_basic() {
        let pool = BufferPool::new(1024, 5).unwrap();

        let buffer = pool.get().unwrap();
        assert_eq!(buffer.len(), 1024);
        assert_eq!(pool.pool_size().unwrap(), 0);

        drop(buffer);
        assert_eq!(pool.pool_size().unwrap(), 1);

        let again = pool.get().unwrap();
        assert_eq!(again.len(), 1024);
        assert_eq!(pool.pool_size().unwrap(), 0);
    }

    #[test]
    fn test_buffer_pool_max_limit() {
        let pool = BufferPool::new(512, 2).unwrap();

        let held: Vec<_> = (0..3).map(|_| pool.get().unwrap()).collect();
        drop(held);

        assert_eq!(pool.pool_size().unwrap(), 2);
    }

    #[test]
    fn test_pooled_buffer_is_writable() {
        let pool = BufferPool::new(256, 3).unwrap();
        let mut pooled = pool.get().unwrap();
        pooled[0] = 42;
        pooled[255] = 7;
        assert_eq!(pooled[0], 42);
        assert_eq!(pooled[255], 7);
    }

    #[test]
    fn test_rejects_zero_sizes() {
        assert!(BufferPool::new(0, 1).is_err());
        assert!(BufferPool::new(1, 0).is_err());
    }
}
