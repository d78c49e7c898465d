//! # Variable-Length Row Arena
//!
//! `ByteArena` stores one byte run per row (String payloads, serialized
//! bitmaps) in a single pooled buffer. Rows are addressed by `(offset, len)`
//! spans rather than by nested vectors, so a column of a million short strings
//! costs one data allocation plus one span table.
//!
//! ## Layout
//!
//! ```text
//! spans:  [ (0,3) | (3,0) | (3,5) | ... ]
//! data:   [ a b c | h e l l o | ...free... ]
//!           ^row 0  ^row 2
//! ```
//!
//! ## Growth
//!
//! When an append does not fit, the data buffer is replaced through the pool
//! with one at least twice as large; previously written bytes are copied over
//! and the old buffer goes back to the pool. Appends are therefore amortized
//! O(1).
//!
//! Overwriting a row appends a new run and repoints the span; the old bytes
//! stay dead until the arena is cleared.

use super::{BufferPool, PooledBuffer};
use crate::config::ARENA_INITIAL_CAPACITY;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Span {
    offset: usize,
    len: usize,
}

#[derive(Debug)]
pub struct ByteArena {
    data: PooledBuffer,
    used: usize,
    spans: Vec<Span>,
}

impl ByteArena {
    /// Create an arena for `rows` rows, all initially empty.
    pub fn new(pool: &BufferPool, rows: usize) -> Self {
        Self {
            data: pool.acquire(ARENA_INITIAL_CAPACITY),
            used: 0,
            spans: vec![Span::default(); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.spans.len()
    }

    /// Total payload bytes currently referenced or dead in the arena.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn get(&self, row: usize) -> &[u8] {
        let span = self.spans[row];
        &self.data[span.offset..span.offset + span.len]
    }

    pub fn set(&mut self, row: usize, bytes: &[u8]) {
        let offset = self.reserve(bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.spans[row] = Span {
            offset,
            len: bytes.len(),
        };
    }

    /// Reserve `len` bytes for `row` and return them for the caller to fill,
    /// typically straight from a wire decoder.
    pub fn slot_mut(&mut self, row: usize, len: usize) -> &mut [u8] {
        let offset = self.reserve(len);
        self.spans[row] = Span { offset, len };
        &mut self.data[offset..offset + len]
    }

    pub fn clear(&mut self) {
        self.used = 0;
        self.spans.fill(Span::default());
    }

    fn reserve(&mut self, len: usize) -> usize {
        let offset = self.used;
        let end = offset + len;
        if end > self.data.len() {
            self.data.grow(end);
        }
        self.used = end;
        offset
    }
}
