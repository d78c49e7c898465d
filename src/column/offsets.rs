//! # Offset Tables
//!
//! `Array` and `Map` columns flatten their rows into element columns and
//! keep one cumulative end offset per row:
//!
//! ```text
//! rows:     [1, 2]   []   [3, 4, 5]
//! ends:       2      2        5          (u64 little-endian on the wire)
//! row i spans elements [end(i-1), end(i)), with end(-1) = 0
//! ```
//!
//! Ends are non-decreasing; decoded tables that violate this are rejected.
//! Mapping a flat element index back to its row is a binary search over the
//! ends.

use std::ops::Range;

use eyre::{bail, Result};

use super::RowBuffer;
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::CodecError;
use crate::memory::BufferPool;

#[derive(Debug)]
pub struct OffsetTable {
    ends: RowBuffer,
}

impl OffsetTable {
    pub fn new(pool: &BufferPool, rows: usize) -> Self {
        Self {
            ends: RowBuffer::new(pool, rows, 8),
        }
    }

    pub fn rows(&self) -> usize {
        self.ends.rows()
    }

    /// Cumulative element count after `row`.
    pub fn end(&self, row: usize) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.ends.row(row));
        u64::from_le_bytes(buf)
    }

    pub fn start(&self, row: usize) -> u64 {
        if row == 0 {
            0
        } else {
            self.end(row - 1)
        }
    }

    pub fn range(&self, row: usize) -> Range<usize> {
        self.start(row) as usize..self.end(row) as usize
    }

    /// Total elements across all rows.
    pub fn total(&self) -> u64 {
        match self.rows() {
            0 => 0,
            n => self.end(n - 1),
        }
    }

    /// Install `ends` for the leading rows; the remaining rows become empty.
    pub fn commit(&mut self, ends: &[u64]) {
        let last = ends.last().copied().unwrap_or(0);
        for row in 0..self.rows() {
            let end = ends.get(row).copied().unwrap_or(last);
            self.ends.row_mut(row).copy_from_slice(&end.to_le_bytes());
        }
    }

    /// Keep rows before `row`; it and every later row become empty.
    pub fn truncate(&mut self, row: usize) {
        let start = self.start(row).to_le_bytes();
        for r in row..self.rows() {
            self.ends.row_mut(r).copy_from_slice(&start);
        }
    }

    /// Row owning flat element `index`.
    pub fn row_of(&self, index: u64) -> usize {
        let (mut lo, mut hi) = (0, self.rows());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.end(mid) <= index {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    pub fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.ends.read_from(decoder)?;
        let mut previous = 0;
        for row in 0..self.rows() {
            let end = self.end(row);
            if end < previous {
                bail!(CodecError::shape(format!(
                    "offset {} at row {} is below previous offset {}",
                    end, row, previous
                )));
            }
            previous = end;
        }
        Ok(())
    }

    pub fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        self.ends.write_to(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SliceDecoder;

    fn table(ends: &[u64]) -> OffsetTable {
        let mut t = OffsetTable::new(&BufferPool::new(2), ends.len());
        t.commit(ends);
        t
    }

    #[test]
    fn ranges_follow_ends() {
        let t = table(&[2, 2, 5]);
        assert_eq!(t.range(0), 0..2);
        assert_eq!(t.range(1), 2..2);
        assert_eq!(t.range(2), 2..5);
        assert_eq!(t.total(), 5);
    }

    #[test]
    fn row_of_skips_empty_rows() {
        let t = table(&[2, 2, 5]);
        assert_eq!(t.row_of(0), 0);
        assert_eq!(t.row_of(1), 0);
        assert_eq!(t.row_of(2), 2);
        assert_eq!(t.row_of(4), 2);
    }

    #[test]
    fn short_commit_and_truncate() {
        let mut t = OffsetTable::new(&BufferPool::new(2), 4);
        t.commit(&[1, 3]);
        assert_eq!(t.range(3), 3..3);
        t.truncate(1);
        assert_eq!(t.total(), 1);
        assert_eq!(t.range(1), 1..1);
    }

    #[test]
    fn decode_rejects_decreasing_offsets() {
        let mut bytes = Vec::new();
        for end in [3u64, 1] {
            bytes.extend_from_slice(&end.to_le_bytes());
        }
        let mut t = OffsetTable::new(&BufferPool::new(2), 2);
        assert!(t.read_from(&mut SliceDecoder::new(&bytes)).is_err());

        let mut out = Vec::new();
        table(&[1, 4]).write_to(&mut out).unwrap();
        let mut t = OffsetTable::new(&BufferPool::new(2), 2);
        t.read_from(&mut SliceDecoder::new(&out)).unwrap();
        assert_eq!(t.range(1), 1..4);
    }
}
