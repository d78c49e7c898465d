//! # Fixed-Width Columns
//!
//! Every kind whose rows have one constant byte width shares the same
//! storage and batch logic:
//!
//! ```text
//! RowBuffer (rows × width bytes, pooled)
//! +--------+--------+--------+-----+
//! | row 0  | row 1  | row 2  | ... |      row i = [i·w, (i+1)·w)
//! +--------+--------+--------+-----+
//! ```
//!
//! The wire form is the buffer itself, so decode and encode are single
//! `read_exact`/`write_all` calls.
//!
//! A kind implements [`FixedKind`] to describe one row: its width, how text
//! and values are encoded into it, and how it is rendered back.

use std::fmt;

use eyre::Result;
use smallvec::{smallvec, SmallVec};

use super::{check_batch_len, ColumnCodec};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, FillResult};
use crate::memory::{BufferPool, PooledBuffer};
use crate::parsing::is_zero_literal;
use crate::types::{KindGuard, Value};

/// Flat pooled storage for `rows` rows of `width` bytes.
#[derive(Debug)]
pub struct RowBuffer {
    data: PooledBuffer,
    rows: usize,
    width: usize,
}

impl RowBuffer {
    /// # Panics
    ///
    /// If `rows * width` overflows `usize`. Sizes taken from the wire are
    /// checked with [`WireDecoder::check_available`] before they get here.
    pub fn new(pool: &BufferPool, rows: usize, width: usize) -> Self {
        let Some(bytes) = rows.checked_mul(width) else {
            panic!("{} rows of {} bytes overflow a row buffer", rows, width);
        };
        Self {
            data: pool.acquire(bytes),
            rows,
            width,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, row: usize) -> &[u8] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        &mut self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        decoder.read_exact(&mut self.data)
    }

    pub fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        encoder.write_all(&self.data)
    }
}

/// Row-level behavior of a fixed-width kind.
pub trait FixedKind: Send + fmt::Debug {
    /// Per-batch text parsing state (e.g. a sniffed date layout).
    type TextState: Default;

    /// Kind name used in error messages.
    fn name(&self) -> &'static str;

    fn width(&self) -> usize;

    fn write_zero(&self, out: &mut [u8]) {
        out.fill(0);
    }

    fn parse_text(&self, text: &str, state: &mut Self::TextState, out: &mut [u8]) -> Result<()>;

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()>;

    fn decode_value(&self, row: &[u8]) -> Value;

    fn render(&self, row: &[u8]) -> String;

    /// Whether the kind's literals are quoted inside containers.
    fn quoted(&self) -> bool {
        false
    }

    /// Text kinds store `NULL` as the literal string, not the zero value.
    fn verbatim_text(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FixedColumn<K: FixedKind> {
    kind: K,
    rows: RowBuffer,
}

impl<K: FixedKind> FixedColumn<K> {
    pub fn new(pool: &BufferPool, rows: usize, kind: K) -> Self {
        let width = kind.width();
        let mut column = Self {
            rows: RowBuffer::new(pool, rows, width),
            kind,
        };
        column.reset();
        column
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Raw stored bytes of `row`.
    pub fn raw_row(&self, row: usize) -> &[u8] {
        self.rows.row(row)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.rows.as_bytes()
    }

    /// Write the zero value into every row. Kinds whose zero is not all-zero
    /// bytes (enums) need this; for the rest it is a no-op on a fresh buffer.
    fn reset(&mut self) {
        let rows = self.rows.rows();
        for row in 0..rows {
            self.kind.write_zero(self.rows.row_mut(row));
        }
    }

    fn scratch(&self) -> SmallVec<[u8; 32]> {
        smallvec![0u8; self.kind.width()]
    }
}

impl<K: FixedKind> ColumnCodec for FixedColumn<K> {
    fn row_count(&self) -> usize {
        self.rows.rows()
    }

    fn wire_row_bytes(&self) -> usize {
        self.kind.width()
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.rows.read_from(decoder)
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        self.rows.write_to(encoder)
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.row_count())?;
        let mut state = K::TextState::default();
        let mut scratch = self.scratch();
        for (row, text) in texts.iter().enumerate() {
            let parsed = if !self.kind.verbatim_text() && is_zero_literal(text) {
                self.kind.write_zero(&mut scratch);
                Ok(())
            } else {
                self.kind.parse_text(text, &mut state, &mut scratch)
            };
            if let Err(e) = parsed {
                return Err(BatchError::at_row(row, e));
            }
            self.rows.row_mut(row).copy_from_slice(&scratch);
        }
        Ok(texts.len())
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        let mut guard = KindGuard::new();
        let mut scratch = self.scratch();
        for (row, value) in values.iter().enumerate() {
            let encoded = if value.is_null() {
                self.kind.write_zero(&mut scratch);
                Ok(())
            } else {
                self.kind.encode_value(value, &mut guard, &mut scratch)
            };
            if let Err(e) = encoded {
                return Err(BatchError::at_row(row, e));
            }
            self.rows.row_mut(row).copy_from_slice(&scratch);
        }
        Ok(values.len())
    }

    fn value(&self, row: usize) -> Value {
        self.kind.decode_value(self.rows.row(row))
    }

    fn text(&self, row: usize) -> String {
        self.kind.render(self.rows.row(row))
    }

    fn nested_text(&self, row: usize) -> String {
        let text = self.text(row);
        if self.kind.quoted() {
            crate::parsing::quote(&text)
        } else {
            text
        }
    }

    fn zero_value(&self) -> Value {
        let mut scratch = self.scratch();
        self.kind.write_zero(&mut scratch);
        self.kind.decode_value(&scratch)
    }

    fn zero_text(&self) -> String {
        let mut scratch = self.scratch();
        self.kind.write_zero(&mut scratch);
        self.kind.render(&scratch)
    }

    fn nested_zero_text(&self) -> String {
        let text = self.zero_text();
        if self.kind.quoted() {
            crate::parsing::quote(&text)
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_buffer_layout() {
        let pool = BufferPool::new(2);
        let mut rows = RowBuffer::new(&pool, 3, 4);
        assert_eq!(rows.rows(), 3);
        assert_eq!(rows.as_bytes().len(), 12);

        rows.row_mut(1).copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(rows.row(0), &[0, 0, 0, 0]);
        assert_eq!(rows.row(1), &[1, 2, 3, 4]);
        assert_eq!(&rows.as_bytes()[4..8], &[1, 2, 3, 4]);
    }

    #[test]
    fn row_buffer_wire_is_verbatim() {
        let pool = BufferPool::new(2);
        let mut rows = RowBuffer::new(&pool, 2, 2);
        let mut dec = crate::encoding::SliceDecoder::new(&[1, 2, 3, 4]);
        rows.read_from(&mut dec).unwrap();

        let mut out = Vec::new();
        rows.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }
}
