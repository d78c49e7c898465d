//! # Map Columns
//!
//! `Map(K, V)` is an array of key/value pairs stored as two parallel element
//! codecs sharing one [`OffsetTable`]:
//!
//! ```text
//! texts:    "{'a': 1, 'b': 2}"   "{}"   "{'c': 3}"
//! ends:            2               2        3
//! keys:     'a' 'b' 'c'
//! values:    1   2   3
//! ```
//!
//! Keys are filled first; values are then filled for the rows whose keys
//! all succeeded. A value failure truncates the rows again and the keys are
//! rebuilt to match, so both element codecs always hold `ends.total()` rows.
//! Duplicate keys within a row are kept in order.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use eyre::{bail, Result};

use super::array::{fill_elements, finish, read_elements};
use super::{check_batch_len, join_rendered, ColumnCodec, OffsetTable};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::parsing::{is_zero_literal, split_fields, strip_brackets, Fields};
use crate::types::{CodecContext, ColumnBlueprint, Value};

fn map_entries(text: &str) -> Result<Fields<'_>> {
    if is_zero_literal(text) {
        return Ok(Fields::new());
    }
    split_fields(strip_brackets(text, '{', '}')?, b',')
}

fn split_entry(entry: &str) -> Result<(&str, &str)> {
    let parts = split_fields(entry, b':')?;
    match parts.as_slice() {
        [key, value] => Ok((*key, *value)),
        _ => bail!(CodecError::shape(format!(
            "expected 'key: value', found '{}'",
            entry
        ))),
    }
}

#[derive(Debug)]
pub struct MapColumn {
    offsets: OffsetTable,
    keys: Box<dyn ColumnCodec>,
    values: Box<dyn ColumnCodec>,
    key: ColumnBlueprint,
    value: ColumnBlueprint,
    ctx: CodecContext,
}

impl MapColumn {
    pub fn new(rows: usize, key: ColumnBlueprint, value: ColumnBlueprint, ctx: CodecContext) -> Self {
        Self {
            offsets: OffsetTable::new(&ctx.pool, rows),
            keys: key.instantiate(0, &ctx),
            values: value.instantiate(0, &ctx),
            key,
            value,
            ctx,
        }
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn keys(&self) -> &dyn ColumnCodec {
        self.keys.as_ref()
    }

    pub fn values(&self) -> &dyn ColumnCodec {
        self.values.as_ref()
    }

    /// Fill keys then values from flattened pairs already committed to the
    /// offsets.
    fn install<T>(
        &mut self,
        flat_keys: &[T],
        flat_values: &[T],
        fill: impl Fn(&mut dyn ColumnCodec, &[T]) -> FillResult + Copy,
    ) -> Option<BatchError> {
        let (keys, key_failure) =
            fill_elements(&self.key, &self.ctx, &mut self.offsets, flat_keys, fill);
        self.keys = keys;

        let total = self.offsets.total() as usize;
        let (values, value_failure) = fill_elements(
            &self.value,
            &self.ctx,
            &mut self.offsets,
            &flat_values[..total],
            fill,
        );
        self.values = values;

        let Some(value_failure) = value_failure else {
            return key_failure;
        };
        let total = self.offsets.total() as usize;
        let mut keys = self.key.instantiate(total, &self.ctx);
        if let Err(again) = fill(keys.as_mut(), &flat_keys[..total]) {
            self.offsets.truncate(0);
            self.keys = self.key.instantiate(0, &self.ctx);
            self.values = self.value.instantiate(0, &self.ctx);
            let row = value_failure.row;
            return Some(again.remap(0, row, format!("refilling keys before row {}", row)));
        }
        self.keys = keys;
        Some(value_failure)
    }
}

impl ColumnCodec for MapColumn {
    fn row_count(&self) -> usize {
        self.offsets.rows()
    }

    fn wire_row_bytes(&self) -> usize {
        8
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.offsets.read_from(decoder)?;
        let (key_bytes, value_bytes) = (self.keys.wire_row_bytes(), self.values.wire_row_bytes());
        self.keys = read_elements(&self.key, &self.ctx, &self.offsets, key_bytes, decoder)?;
        self.values = read_elements(&self.value, &self.ctx, &self.offsets, value_bytes, decoder)?;
        Ok(())
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        self.offsets.write_to(encoder)?;
        self.keys.write_to(encoder)?;
        self.values.write_to(encoder)
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.row_count())?;
        let bump = Bump::new();
        let mut flat_keys = BumpVec::new_in(&bump);
        let mut flat_values = BumpVec::new_in(&bump);
        let mut ends = BumpVec::with_capacity_in(texts.len(), &bump);
        let mut failure = None;
        'rows: for (row, &text) in texts.iter().enumerate() {
            let entries = match map_entries(text) {
                Ok(entries) => entries,
                Err(e) => {
                    failure = Some(BatchError::at_row(row, e));
                    break;
                }
            };
            let mark = flat_keys.len();
            for entry in entries {
                match split_entry(entry) {
                    Ok((key, value)) => {
                        flat_keys.push(key);
                        flat_values.push(value);
                    }
                    Err(e) => {
                        flat_keys.truncate(mark);
                        flat_values.truncate(mark);
                        failure = Some(BatchError::at_row(row, e));
                        break 'rows;
                    }
                }
            }
            ends.push(flat_keys.len() as u64);
        }

        self.offsets.commit(&ends);
        let element_failure = self.install(&flat_keys[..], &flat_values[..], |codec, items| {
            codec.fill_from_texts(items)
        });
        finish(texts.len(), element_failure.or(failure))
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        let mut flat_keys = Vec::new();
        let mut flat_values = Vec::new();
        let mut ends = Vec::with_capacity(values.len());
        let mut failure = None;
        for (row, value) in values.iter().enumerate() {
            match value {
                Value::Null => {}
                Value::Map(pairs) => {
                    for (k, v) in pairs {
                        flat_keys.push(k.clone());
                        flat_values.push(v.clone());
                    }
                }
                other => {
                    let err = CodecError::mismatch("Map", other.kind().to_string());
                    failure = Some(BatchError::at_row(row, eyre::Report::new(err)));
                    break;
                }
            }
            ends.push(flat_keys.len() as u64);
        }

        self.offsets.commit(&ends);
        let element_failure = self.install(&flat_keys[..], &flat_values[..], |codec, items| {
            codec.fill_from_values(items)
        });
        finish(values.len(), element_failure.or(failure))
    }

    fn value(&self, row: usize) -> Value {
        Value::Map(
            self.offsets
                .range(row)
                .map(|i| (self.keys.value(i), self.values.value(i)))
                .collect(),
        )
    }

    fn text(&self, row: usize) -> String {
        join_rendered(
            '{',
            '}',
            self.offsets.range(row).map(|i| {
                format!("{}: {}", self.keys.nested_text(i), self.values.nested_text(i))
            }),
        )
    }

    fn zero_value(&self) -> Value {
        Value::Map(Vec::new())
    }

    fn zero_text(&self) -> String {
        "{}".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SliceDecoder;
    use crate::error::ErrorKind;

    fn column(key: &str, value: &str, rows: usize) -> MapColumn {
        MapColumn::new(
            rows,
            key.parse().unwrap(),
            value.parse().unwrap(),
            CodecContext::default(),
        )
    }

    #[test]
    fn pairs_share_offsets() {
        let mut col = column("String", "UInt8", 3);
        col.fill_from_texts(&["{'a': 1, 'b': 2}", "{}", "{'c': 3}"])
            .unwrap();
        assert_eq!(col.offsets().total(), 3);
        assert_eq!(col.keys().row_count(), 3);
        assert_eq!(col.values().row_count(), 3);
        assert_eq!(col.text(0), "{'a': 1, 'b': 2}");
        assert_eq!(col.text(1), "{}");
        assert_eq!(
            col.value(2),
            Value::Map(vec![(Value::Text("c".into()), Value::UInt8(3))])
        );
    }

    #[test]
    fn value_failure_rebuilds_keys() {
        let mut col = column("String", "UInt8", 3);
        let err = col
            .fill_from_texts(&["{'a': 1}", "{'b': 2, 'c': 999}", "{'d': 4}"])
            .unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));
        assert_eq!(col.keys().row_count(), 1);
        assert_eq!(col.values().row_count(), 1);
        assert_eq!(col.text(0), "{'a': 1}");
        assert_eq!(col.text(1), "{}");
    }

    #[test]
    fn key_failure() {
        let mut col = column("UInt8", "String", 2);
        let err = col.fill_from_texts(&["{1: 'x'}", "{x: 'y'}"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));
        assert_eq!(col.text(0), "{1: 'x'}");
    }

    #[test]
    fn malformed_entry() {
        let mut col = column("String", "String", 2);
        let err = col.fill_from_texts(&["{'a': 'b'}", "{'a'}"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Shape));
        assert_eq!(col.offsets().total(), 1);
    }

    #[test]
    fn quoted_colons_are_not_separators() {
        let mut col = column("String", "DateTime", 1);
        col.fill_from_texts(&["{'t': '2024-01-15 10:30:00'}"]).unwrap();
        assert_eq!(col.text(0), "{'t': '2024-01-15 10:30:00'}");
    }

    #[test]
    fn values_and_wire() {
        let mut col = column("String", "Int32", 2);
        col.fill_from_values(&[
            Value::Map(vec![(Value::from("k"), Value::Int32(-1))]),
            Value::Null,
        ])
        .unwrap();
        let mut out = Vec::new();
        col.write_to(&mut out).unwrap();

        let mut copy = column("String", "Int32", 2);
        copy.read_from(&mut SliceDecoder::new(&out)).unwrap();
        assert_eq!(copy.text(0), "{'k': -1}");
        assert_eq!(copy.value(1), Value::Map(vec![]));
    }
}
