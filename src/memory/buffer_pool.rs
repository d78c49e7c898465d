//! # Row Buffer Pool
//!
//! Pool of reusable, zeroed byte buffers backing every column codec.
//!
//! ## Purpose
//!
//! A codec is created per block per column, filled once, read, and released.
//! Allocating fresh row storage for every block would dominate the cost of
//! small blocks, so codecs draw their storage from this pool and hand it back
//! when they are released.
//!
//! ## Usage
//!
//! ```rust
//! use colwire::memory::BufferPool;
//!
//! let pool = BufferPool::new(4);
//!
//! // Acquire a zeroed buffer of exactly 100 bytes
//! let mut buffer = pool.acquire(100);
//! assert_eq!(buffer.len(), 100);
//! buffer[0] = 7;
//!
//! // Buffer automatically returns to the pool when dropped
//! drop(buffer);
//! assert_eq!(pool.available(), 1);
//! ```
//!
//! ## Design
//!
//! Buffers are grouped into power-of-two size classes, one lock per class.
//! A request for `n` bytes is served from class `ceil(log2(n))`, so any
//! pooled buffer in that class has enough capacity. A returned buffer goes to
//! class `floor(log2(capacity))`. Each class retains at most a fixed number of
//! idle buffers; extra buffers are freed.
//!
//! The pool is `Send + Sync` and may be shared freely between threads and
//! codecs. Cloning a `BufferPool` shares the same free lists.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{BUFFER_POOL_SIZE_CLASSES, DEFAULT_BUFFER_POOL_RETAIN};

/// A pool of reusable zeroed byte buffers.
pub struct BufferPool {
    inner: Arc<BufferPoolInner>,
}

struct BufferPoolInner {
    classes: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SIZE_CLASSES],
    retain_per_class: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Counters describing pool effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub hits: usize,
    pub misses: usize,
    pub idle_buffers: usize,
}

fn class_for_request(len: usize) -> usize {
    if len <= 1 {
        0
    } else {
        (usize::BITS - (len - 1).leading_zeros()) as usize
    }
}

fn class_for_capacity(capacity: usize) -> usize {
    (usize::BITS - 1 - capacity.leading_zeros()) as usize
}

impl BufferPool {
    /// Create an empty pool that keeps at most `retain_per_class` idle buffers
    /// in each size class.
    pub fn new(retain_per_class: usize) -> Self {
        let classes: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SIZE_CLASSES] =
            std::array::from_fn(|_| Mutex::new(Vec::new()));

        Self {
            inner: Arc::new(BufferPoolInner {
                classes,
                retain_per_class,
                hits: AtomicUsize::new(0),
                misses: AtomicUsize::new(0),
            }),
        }
    }

    /// Acquire a zeroed buffer of exactly `len` bytes.
    ///
    /// Served from the matching size class when possible, otherwise freshly
    /// allocated. The buffer returns to the pool when dropped.
    pub fn acquire(&self, len: usize) -> PooledBuffer {
        if len == 0 {
            return PooledBuffer {
                buf: Vec::new(),
                pool: Arc::clone(&self.inner),
            };
        }

        let class = class_for_request(len);
        let reused = if class < BUFFER_POOL_SIZE_CLASSES {
            self.inner.classes[class].lock().pop()
        } else {
            None
        };

        let buf = match reused {
            Some(mut buf) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                buf.clear();
                buf.resize(len, 0);
                buf
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(len, class, "buffer pool miss");
                let capacity = if class < usize::BITS as usize - 1 {
                    1usize << class
                } else {
                    len
                };
                let mut buf = Vec::with_capacity(capacity.max(len));
                buf.resize(len, 0);
                buf
            }
        };

        PooledBuffer {
            buf,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Return a buffer to the pool. Equivalent to dropping it.
    pub fn release(&self, buffer: PooledBuffer) {
        drop(buffer);
    }

    /// Returns the number of idle buffers across all size classes.
    pub fn available(&self) -> usize {
        self.inner.classes.iter().map(|c| c.lock().len()).sum()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            idle_buffers: self.available(),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_RETAIN)
    }
}

impl Clone for BufferPool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("retain_per_class", &self.inner.retain_per_class)
            .field("stats", &self.stats())
            .finish()
    }
}

impl BufferPoolInner {
    fn recycle(&self, buf: Vec<u8>) {
        if buf.capacity() == 0 {
            return;
        }
        let class = class_for_capacity(buf.capacity());
        if class >= BUFFER_POOL_SIZE_CLASSES {
            return;
        }
        let mut idle = self.classes[class].lock();
        if idle.len() < self.retain_per_class {
            idle.push(buf);
        }
    }
}

/// A byte buffer that returns to its pool when dropped.
///
/// Dereferences to `[u8]` of the requested length.
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPoolInner>,
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl PooledBuffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Grow to at least `min_len` bytes, doubling the current length when
    /// that is larger. Existing bytes are preserved, new bytes are zero. The
    /// replaced allocation goes back to the pool.
    pub fn grow(&mut self, min_len: usize) {
        if min_len <= self.buf.len() {
            return;
        }
        let target = min_len.max(self.buf.len().saturating_mul(2));
        let pool = BufferPool {
            inner: Arc::clone(&self.pool),
        };
        let mut replacement = pool.acquire(target);
        replacement.buf[..self.buf.len()].copy_from_slice(&self.buf);
        std::mem::swap(&mut self.buf, &mut replacement.buf);
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.recycle(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_classes() {
        assert_eq!(class_for_request(1), 0);
        assert_eq!(class_for_request(2), 1);
        assert_eq!(class_for_request(3), 2);
        assert_eq!(class_for_request(1024), 10);
        assert_eq!(class_for_request(1025), 11);

        assert_eq!(class_for_capacity(1), 0);
        assert_eq!(class_for_capacity(1024), 10);
        assert_eq!(class_for_capacity(2047), 10);
    }

    #[test]
    fn test_pool_acquire_and_return() {
        let pool = BufferPool::new(4);
        assert_eq!(pool.available(), 0);

        let buf1 = pool.acquire(100);
        let buf2 = pool.acquire(100);
        assert_eq!(pool.available(), 0);

        drop(buf1);
        assert_eq!(pool.available(), 1);

        pool.release(buf2);
        assert_eq!(pool.available(), 2);

        let _buf3 = pool.acquire(120);
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.stats().hits, 1);
    }

    #[test]
    fn test_reused_buffer_is_zeroed() {
        let pool = BufferPool::new(4);

        let mut buf = pool.acquire(64);
        buf.fill(0xAB);
        drop(buf);

        let buf = pool.acquire(64);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_retention_is_bounded() {
        let pool = BufferPool::new(2);
        let bufs: Vec<_> = (0..5).map(|_| pool.acquire(10)).collect();
        drop(bufs);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_grow_preserves_prefix_and_doubles() {
        let pool = BufferPool::new(4);
        let mut buf = pool.acquire(8);
        buf[..3].copy_from_slice(&[1, 2, 3]);

        buf.grow(9);
        assert_eq!(buf.len(), 16);
        assert_eq!(&buf[..4], &[1, 2, 3, 0]);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_zero_length_buffers_are_not_pooled() {
        let pool = BufferPool::new(4);
        drop(pool.acquire(0));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_pool_clone_shares_buffers() {
        let pool1 = BufferPool::new(2);
        let pool2 = pool1.clone();

        drop(pool1.acquire(32));
        assert_eq!(pool2.available(), 1);
    }

    #[test]
    fn test_pool_is_shareable_across_threads() {
        let pool = BufferPool::new(8);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for len in 1..50 {
                        let buf = pool.acquire(len);
                        assert_eq!(buf.len(), len);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.available() > 0);
    }
}
