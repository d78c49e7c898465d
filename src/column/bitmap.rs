//! `BitMap64`: each row is a set of `u64` stored as a serialized
//! [`RoaringTreemap`] (the high 32 bits select a roaring bitmap of the low
//! 32 bits). On the wire each row is a varint length followed by the
//! serialized treemap. Text is a bracketed list, `[1, 5, 1000000]`.

use eyre::{bail, Result, WrapErr};
use roaring::RoaringTreemap;

use super::int::convert_int;
use super::{check_batch_len, join_rendered, ColumnCodec};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::memory::{BufferPool, ByteArena};
use crate::parsing::{is_zero_literal, split_fields, strip_brackets};
use crate::types::Value;

fn parse_bitmap(text: &str) -> Result<RoaringTreemap> {
    let mut bitmap = RoaringTreemap::new();
    if is_zero_literal(text) {
        return Ok(bitmap);
    }
    for field in split_fields(strip_brackets(text, '[', ']')?, b',')? {
        match field.parse::<u64>() {
            Ok(v) => {
                bitmap.insert(v);
            }
            Err(_) => bail!(CodecError::parse("BitMap64", field)),
        }
    }
    Ok(bitmap)
}

fn value_bitmap(value: &Value) -> Result<RoaringTreemap> {
    match value {
        Value::Null => Ok(RoaringTreemap::new()),
        Value::Bitmap(bitmap) => Ok(bitmap.clone()),
        Value::Array(items) => {
            let mut bitmap = RoaringTreemap::new();
            for item in items {
                bitmap.insert(convert_int::<u64>(item)?);
            }
            Ok(bitmap)
        }
        other => bail!(CodecError::mismatch("BitMap64", other.kind().to_string())),
    }
}

#[derive(Debug)]
pub struct BitmapColumn {
    arena: ByteArena,
}

impl BitmapColumn {
    pub fn new(pool: &BufferPool, rows: usize) -> Self {
        let mut column = Self {
            arena: ByteArena::new(pool, rows),
        };
        let empty = RoaringTreemap::new();
        for row in 0..rows {
            // Writing into a Vec cannot fail.
            let _ = column.store(row, &empty);
        }
        column
    }

    pub fn bitmap(&self, row: usize) -> RoaringTreemap {
        RoaringTreemap::deserialize_from(self.arena.get(row)).unwrap_or_default()
    }

    fn store(&mut self, row: usize, bitmap: &RoaringTreemap) -> Result<()> {
        let mut bytes = Vec::with_capacity(bitmap.serialized_size());
        bitmap
            .serialize_into(&mut bytes)
            .wrap_err("serializing BitMap64 row")?;
        self.arena.set(row, &bytes);
        Ok(())
    }
}

impl ColumnCodec for BitmapColumn {
    fn row_count(&self) -> usize {
        self.arena.rows()
    }

    fn wire_row_bytes(&self) -> usize {
        1
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        self.arena.clear();
        for row in 0..self.arena.rows() {
            let len = decoder.read_uvarint()?;
            let len = decoder
                .check_available(len, 1)
                .wrap_err_with(|| format!("bitmap length at row {}", row))?;
            let slot = self.arena.slot_mut(row, len);
            decoder.read_exact(slot)?;
            if RoaringTreemap::deserialize_from(&*slot).is_err() {
                bail!(CodecError::shape(format!("corrupt BitMap64 payload at row {}", row)));
            }
        }
        Ok(())
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        for row in 0..self.arena.rows() {
            encoder.write_string(self.arena.get(row))?;
        }
        Ok(())
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.row_count())?;
        self.arena.clear();
        for (row, text) in texts.iter().enumerate() {
            parse_bitmap(text)
                .and_then(|bitmap| self.store(row, &bitmap))
                .map_err(|e| BatchError::at_row(row, e))?;
        }
        Ok(texts.len())
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        self.arena.clear();
        for (row, value) in values.iter().enumerate() {
            value_bitmap(value)
                .and_then(|bitmap| self.store(row, &bitmap))
                .map_err(|e| BatchError::at_row(row, e))?;
        }
        Ok(values.len())
    }

    fn value(&self, row: usize) -> Value {
        Value::Bitmap(self.bitmap(row))
    }

    fn text(&self, row: usize) -> String {
        join_rendered('[', ']', self.bitmap(row).iter().map(|v| v.to_string()))
    }

    fn zero_value(&self) -> Value {
        Value::Bitmap(RoaringTreemap::new())
    }

    fn zero_text(&self) -> String {
        "[]".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SliceDecoder;
    use crate::error::ErrorKind;

    fn column(rows: usize) -> BitmapColumn {
        BitmapColumn::new(&BufferPool::new(2), rows)
    }

    #[test]
    fn text_is_sorted_and_deduplicated() {
        let mut col = column(2);
        col.fill_from_texts(&["[5, 1, 5, 4294967296]", "[]"]).unwrap();
        assert_eq!(col.text(0), "[1, 5, 4294967296]");
        assert_eq!(col.text(1), "[]");
        assert_eq!(col.bitmap(0).len(), 3);
    }

    #[test]
    fn rejects_negative_and_fractional() {
        let mut col = column(3);
        let err = col.fill_from_texts(&["[1]", "[-1]"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));
        assert!(col.fill_from_texts(&["[1.5]"]).is_err());
        assert!(col.fill_from_texts(&["1, 2"]).is_err());
    }

    #[test]
    fn refill_does_not_grow_arena() {
        let mut col = column(1);
        col.fill_from_texts(&["[1, 2, 3]"]).unwrap();
        let used = col.arena.used_bytes();
        col.fill_from_texts(&["[1, 2, 3]"]).unwrap();
        assert_eq!(col.arena.used_bytes(), used);
    }

    #[test]
    fn oversized_payload_length_is_rejected() {
        let mut wire = Vec::new();
        wire.write_uvarint(1 << 40).unwrap();
        let mut col = column(1);
        assert!(col.read_from(&mut SliceDecoder::new(&wire)).is_err());
    }

    #[test]
    fn wire_roundtrip() {
        let mut col = column(2);
        col.fill_from_values(&[
            Value::Array(vec![Value::UInt64(3), Value::UInt8(9)]),
            Value::Bitmap(RoaringTreemap::from_iter([u64::MAX])),
        ])
        .unwrap();
        let mut out = Vec::new();
        col.write_to(&mut out).unwrap();

        let mut copy = column(2);
        copy.read_from(&mut SliceDecoder::new(&out)).unwrap();
        assert_eq!(copy.text(0), "[3, 9]");
        assert_eq!(copy.value(1), Value::Bitmap(RoaringTreemap::from_iter([u64::MAX])));
    }

    #[test]
    fn corrupt_payload_is_rejected() {
        let mut col = column(1);
        let err = col
            .read_from(&mut SliceDecoder::new(&[3, 0xFF, 0xFF, 0xFF]))
            .unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }
}
