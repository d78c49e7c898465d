//! # Nullable Columns
//!
//! `Nullable(T)` pairs a one-byte null mask with a full-height inner column.
//! Null rows still occupy a slot in the inner column, holding its zero value.
//!
//! ```text
//! input:  "1"   "NULL"   "3"
//! mask:    0      1       0        (1 = null)
//! inner:   1      0       3
//! wire:   [mask bytes][inner column]
//! ```
//!
//! Every spelling in `NULL_LITERALS` (including the display glyph) is null.
//! A top-level null renders as `ᴺᵁᴸᴸ`; inside a container it renders as
//! `NULL` so the container literal reads back.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use eyre::Result;

use super::{check_batch_len, ColumnCodec, RowBuffer};
use crate::config::NULL_DISPLAY;
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::FillResult;
use crate::parsing::is_null_literal;
use crate::types::{CodecContext, ColumnBlueprint, Value};

#[derive(Debug)]
pub struct NullableColumn {
    mask: RowBuffer,
    inner: Box<dyn ColumnCodec>,
    blueprint: ColumnBlueprint,
    ctx: CodecContext,
}

impl NullableColumn {
    pub fn new(rows: usize, inner: &ColumnBlueprint, ctx: &CodecContext) -> Self {
        let mut column = Self {
            mask: RowBuffer::new(&ctx.pool, rows, 1),
            inner: inner.instantiate(rows, ctx),
            blueprint: inner.clone(),
            ctx: ctx.clone(),
        };
        column.mask_all();
        column
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.mask.row(row)[0] != 0
    }

    pub fn inner(&self) -> &dyn ColumnCodec {
        self.inner.as_ref()
    }

    fn mask_all(&mut self) {
        for row in 0..self.mask.rows() {
            self.mask.row_mut(row)[0] = 1;
        }
    }

    /// Start a fill: every row null over a fresh inner column.
    fn reset(&mut self) {
        self.inner = self.blueprint.instantiate(self.mask.rows(), &self.ctx);
        self.mask_all();
    }

    fn apply_mask(&mut self, nulls: &[bool], result: &FillResult) {
        let committed = match result {
            Ok(n) => *n,
            Err(e) => e.committed,
        };
        for (row, &null) in nulls.iter().enumerate().take(committed) {
            self.mask.row_mut(row)[0] = u8::from(null);
        }
    }
}

impl ColumnCodec for NullableColumn {
    fn row_count(&self) -> usize {
        self.mask.rows()
    }

    fn wire_row_bytes(&self) -> usize {
        self.inner.wire_row_bytes().saturating_add(1)
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.mask.read_from(decoder)?;
        self.inner.read_from(decoder)
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        self.mask.write_to(encoder)?;
        self.inner.write_to(encoder)
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.row_count())?;
        self.reset();
        let bump = Bump::new();
        let mut nulls = BumpVec::with_capacity_in(texts.len(), &bump);
        let mut payloads = BumpVec::with_capacity_in(texts.len(), &bump);
        for &text in texts {
            let null = is_null_literal(text);
            nulls.push(null);
            payloads.push(if null { "" } else { text });
        }
        let result = self.inner.fill_from_texts(&payloads);
        self.apply_mask(&nulls, &result);
        result
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        self.reset();
        let nulls: Vec<bool> = values.iter().map(Value::is_null).collect();
        let result = self.inner.fill_from_values(values);
        self.apply_mask(&nulls, &result);
        result
    }

    fn value(&self, row: usize) -> Value {
        if self.is_null(row) {
            Value::Null
        } else {
            self.inner.value(row)
        }
    }

    fn text(&self, row: usize) -> String {
        if self.is_null(row) {
            NULL_DISPLAY.to_string()
        } else {
            self.inner.text(row)
        }
    }

    fn nested_text(&self, row: usize) -> String {
        if self.is_null(row) {
            "NULL".to_string()
        } else {
            self.inner.nested_text(row)
        }
    }

    fn zero_value(&self) -> Value {
        Value::Null
    }

    fn zero_text(&self) -> String {
        NULL_DISPLAY.to_string()
    }

    fn nested_zero_text(&self) -> String {
        "NULL".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SliceDecoder;
    use crate::error::ErrorKind;

    fn column(inner: &str, rows: usize) -> NullableColumn {
        NullableColumn::new(rows, &inner.parse().unwrap(), &CodecContext::default())
    }

    #[test]
    fn mask_then_inner_on_the_wire() {
        let mut col = column("Int8", 3);
        col.fill_from_texts(&["1", "NULL", "3"]).unwrap();
        assert_eq!(col.text(1), "ᴺᵁᴸᴸ");
        assert_eq!(col.value(1), Value::Null);
        assert_eq!(col.value(2), Value::Int8(3));

        let mut out = Vec::new();
        col.write_to(&mut out).unwrap();
        assert_eq!(out, vec![0, 1, 0, 1, 0, 3]);

        let mut copy = column("Int8", 3);
        copy.read_from(&mut SliceDecoder::new(&out)).unwrap();
        assert!(copy.is_null(1));
        assert_eq!(copy.text(2), "3");
    }

    #[test]
    fn null_spellings() {
        let mut col = column("String", 5);
        col.fill_from_texts(&["null", "\\N", "ᴺᵁᴸᴸ", "'NULL'", ""]).unwrap();
        assert!(col.is_null(0) && col.is_null(1) && col.is_null(2));
        assert!(!col.is_null(3));
        assert_eq!(col.text(3), "NULL");
        assert!(!col.is_null(4));
        assert_eq!(col.text(4), "");
    }

    #[test]
    fn failure_keeps_committed_mask() {
        let mut col = column("UInt8", 4);
        let err = col.fill_from_texts(&["NULL", "7", "x", "NULL"]).unwrap_err();
        assert_eq!((err.committed, err.row), (2, 2));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));
        assert!(col.is_null(0));
        assert_eq!(col.text(1), "7");
        assert!(col.is_null(2));
    }

    #[test]
    fn values_and_nested_text() {
        let mut col = column("String", 2);
        col.fill_from_values(&[Value::Null, Value::from("a")]).unwrap();
        assert_eq!(col.nested_text(0), "NULL");
        assert_eq!(col.nested_text(1), "'a'");
        assert_eq!(col.zero_value(), Value::Null);
    }
}
