use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

pub const DEFAULT_POOL_SLOTS: usize = 256;
const INITIAL_CAPACITY: usize = 512;
/// Buffers that grew past this are dropped instead of pooled, so one huge
/// reply does not pin its memory forever.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Bounded pool of reply buffers shared by every connection.
#[derive(Debug)]
pub struct BufferPool {
    buffers: ArrayQueue<BytesMut>,
}

impl BufferPool {
    pub fn new(slots: usize) -> Arc<Self> {
        Arc::new(Self {
            buffers: ArrayQueue::new(slots.max(1)),
        })
    }

    /// Takes a cleared buffer from the pool, or allocates one if it is
    /// empty. The buffer goes back when the guard drops.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .buffers
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(INITIAL_CAPACITY));
        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    /// Buffers currently idle in the pool.
    pub fn idle(&self) -> usize {
        self.buffers.len()
    }

    fn release(&self, mut buf: BytesMut) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        // Pool full: let this one go.
        let _ = self.buffers.push(buf);
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer {
    buf: BytesMut,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = BytesMut;

    fn deref(&self) -> &BytesMut {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_return_cleared() {
        let pool = BufferPool::new(4);
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"+OK\r\n");
        }
        assert_eq!(pool.idle(), 1);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 5);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn pool_is_bounded() {
        let pool = BufferPool::new(1);
        let a = pool.acquire();
        let b = pool.acquire();
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let pool = BufferPool::new(2);
        {
            let mut buf = pool.acquire();
            buf.reserve(MAX_RETAINED_CAPACITY * 2);
        }
        assert_eq!(pool.idle(), 0);
    }
}
