//! # Memory Management
//!
//! This module provides the storage primitives every column codec is built
//! on. The codecs themselves never allocate row storage directly; they ask
//! the shared [`BufferPool`] and give the buffers back when released.
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------+
//! |                       BufferPool                          |
//! |   size class 0  | size class 1 | ... | size class 47     |
//! |   [idle bufs]   | [idle bufs]  |     | [idle bufs]       |
//! +----------------------------------------------------------+
//!          ^ acquire(n) / drop                ^ grow()
//!          |                                  |
//! +-------------------+            +---------------------+
//! |   PooledBuffer    |            |     ByteArena       |
//! | fixed-width rows  |            | spans + data buffer |
//! +-------------------+            +---------------------+
//! ```
//!
//! ## Ownership
//!
//! A `PooledBuffer` is owned by exactly one codec. Dropping it returns the
//! allocation to its pool, so releasing a codec twice is impossible and
//! forgetting to release one only costs the pooling benefit, never a leak.
//!
//! ## Thread Safety
//!
//! The pool is shared between codecs that may live on different threads.
//! Each size class has its own `parking_lot::Mutex`; codecs themselves are
//! single-threaded.

mod arena;
mod buffer_pool;

pub use arena::ByteArena;
pub use buffer_pool::{BufferPool, PoolStats, PooledBuffer};
