//! # Array Columns
//!
//! `Array(T)` keeps an [`OffsetTable`] plus one element codec holding every
//! row's elements back to back.
//!
//! ## Two-Pass Fills
//!
//! ```text
//! texts:    "[1, 2]"   "[]"   "[3, 4, 5]"
//! pass 1:   split rows into a flat element list and cumulative ends
//!           flat = [1, 2, 3, 4, 5]   ends = [2, 2, 5]
//! pass 2:   fill a fresh element codec with `flat`
//! ```
//!
//! If element `k` fails, its row is found by binary search over the ends,
//! and the element codec is rebuilt from the elements of the rows before it,
//! so exactly those rows are committed. A row that fails to split in pass 1
//! commits every earlier row.
//!
//! A fill replaces the whole column: rows at or past `committed` read as
//! empty arrays.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use eyre::{Result, WrapErr};

use super::{check_batch_len, join_rendered, ColumnCodec, OffsetTable};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::parsing::{is_zero_literal, split_fields, strip_brackets, Fields};
use crate::types::{CodecContext, ColumnBlueprint, Value};

/// Split one array literal into its element texts.
pub(super) fn array_items(text: &str) -> Result<Fields<'_>> {
    if is_zero_literal(text) {
        return Ok(Fields::new());
    }
    split_fields(strip_brackets(text, '[', ']')?, b',')
}

/// Fill a fresh element codec from `flat`, whose rows are described by
/// `offsets`. On an element failure the offsets are truncated to the rows
/// before the failing one and the codec is rebuilt from their elements.
pub(super) fn fill_elements<T>(
    blueprint: &ColumnBlueprint,
    ctx: &CodecContext,
    offsets: &mut OffsetTable,
    flat: &[T],
    fill: impl Fn(&mut dyn ColumnCodec, &[T]) -> FillResult,
) -> (Box<dyn ColumnCodec>, Option<BatchError>) {
    let mut codec = blueprint.instantiate(flat.len(), ctx);
    let err = match fill(codec.as_mut(), flat) {
        Ok(_) => return (codec, None),
        Err(err) => err,
    };

    let row = offsets.row_of(err.row as u64);
    let element = err.row as u64 - offsets.start(row);
    tracing::trace!(row, element, "element fill stopped");
    offsets.truncate(row);
    let prefix = offsets.total() as usize;
    let err = err.remap(row, row, format!("element {} of row {}", element, row));

    let mut codec = blueprint.instantiate(prefix, ctx);
    if let Err(again) = fill(codec.as_mut(), &flat[..prefix]) {
        offsets.truncate(0);
        let reason = format!("refilling elements before row {}", row);
        return (blueprint.instantiate(0, ctx), Some(again.remap(0, row, reason)));
    }
    (codec, Some(err))
}

/// Decode an element codec sized by `offsets`. Each element takes at least
/// `row_bytes` on the wire.
pub(super) fn read_elements(
    blueprint: &ColumnBlueprint,
    ctx: &CodecContext,
    offsets: &OffsetTable,
    row_bytes: usize,
    decoder: &mut dyn WireDecoder,
) -> Result<Box<dyn ColumnCodec>> {
    let total = decoder
        .check_available(offsets.total(), row_bytes)
        .wrap_err_with(|| format!("{} container elements", offsets.total()))?;
    let mut codec = blueprint.instantiate(total, ctx);
    codec.read_from(decoder)?;
    Ok(codec)
}

pub(super) fn finish(len: usize, failure: Option<BatchError>) -> FillResult {
    match failure {
        Some(err) => Err(err),
        None => Ok(len),
    }
}

#[derive(Debug)]
pub struct ArrayColumn {
    offsets: OffsetTable,
    elements: Box<dyn ColumnCodec>,
    element: ColumnBlueprint,
    ctx: CodecContext,
}

impl ArrayColumn {
    pub fn new(rows: usize, element: ColumnBlueprint, ctx: CodecContext) -> Self {
        Self {
            offsets: OffsetTable::new(&ctx.pool, rows),
            elements: element.instantiate(0, &ctx),
            element,
            ctx,
        }
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn elements(&self) -> &dyn ColumnCodec {
        self.elements.as_ref()
    }
}

impl ColumnCodec for ArrayColumn {
    fn row_count(&self) -> usize {
        self.offsets.rows()
    }

    fn wire_row_bytes(&self) -> usize {
        8
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.offsets.read_from(decoder)?;
        let row_bytes = self.elements.wire_row_bytes();
        self.elements = read_elements(&self.element, &self.ctx, &self.offsets, row_bytes, decoder)?;
        Ok(())
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        self.offsets.write_to(encoder)?;
        self.elements.write_to(encoder)
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.row_count())?;
        let bump = Bump::new();
        let mut flat = BumpVec::new_in(&bump);
        let mut ends = BumpVec::with_capacity_in(texts.len(), &bump);
        let mut failure = None;
        for (row, &text) in texts.iter().enumerate() {
            match array_items(text) {
                Ok(items) => {
                    flat.extend(items);
                    ends.push(flat.len() as u64);
                }
                Err(e) => {
                    failure = Some(BatchError::at_row(row, e));
                    break;
                }
            }
        }

        self.offsets.commit(&ends);
        let (elements, element_failure) = fill_elements(
            &self.element,
            &self.ctx,
            &mut self.offsets,
            &flat[..],
            |codec, items| codec.fill_from_texts(items),
        );
        self.elements = elements;
        finish(texts.len(), element_failure.or(failure))
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        let mut flat = Vec::new();
        let mut ends = Vec::with_capacity(values.len());
        let mut failure = None;
        for (row, value) in values.iter().enumerate() {
            match value {
                Value::Null => {}
                Value::Array(items) => flat.extend(items.iter().cloned()),
                other => {
                    let err = CodecError::mismatch("Array", other.kind().to_string());
                    failure = Some(BatchError::at_row(row, eyre::Report::new(err)));
                    break;
                }
            }
            ends.push(flat.len() as u64);
        }

        self.offsets.commit(&ends);
        let (elements, element_failure) = fill_elements(
            &self.element,
            &self.ctx,
            &mut self.offsets,
            &flat[..],
            |codec, items| codec.fill_from_values(items),
        );
        self.elements = elements;
        finish(values.len(), element_failure.or(failure))
    }

    fn value(&self, row: usize) -> Value {
        Value::Array(
            self.offsets
                .range(row)
                .map(|i| self.elements.value(i))
                .collect(),
        )
    }

    fn text(&self, row: usize) -> String {
        join_rendered(
            '[',
            ']',
            self.offsets.range(row).map(|i| self.elements.nested_text(i)),
        )
    }

    fn zero_value(&self) -> Value {
        Value::Array(Vec::new())
    }

    fn zero_text(&self) -> String {
        "[]".to_string()
    }
}
