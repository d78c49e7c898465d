//! # String Columns
//!
//! Rows are arbitrary byte strings kept in a [`ByteArena`]. On the wire each
//! row is a varint length followed by the bytes.
//!
//! Text input loses one symmetric quote layer; quoted input also has its
//! backslash escapes resolved, so nested output (`'it\'s'`) reads back as
//! the original. Unquoted text is stored verbatim, including `NULL`.

use eyre::{Result, WrapErr};

use super::{check_batch_len, ColumnCodec};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::memory::{BufferPool, ByteArena};
use crate::parsing::{quote, string_payload};
use crate::types::Value;

#[derive(Debug)]
pub struct StringColumn {
    arena: ByteArena,
}

impl StringColumn {
    pub fn new(pool: &BufferPool, rows: usize) -> Self {
        Self {
            arena: ByteArena::new(pool, rows),
        }
    }

    pub fn bytes(&self, row: usize) -> &[u8] {
        self.arena.get(row)
    }
}

impl ColumnCodec for StringColumn {
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
                .wrap_err_with(|| format!("string length at row {}", row))?;
            decoder.read_exact(self.arena.slot_mut(row, len))?;
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
            self.arena.set(row, string_payload(text).as_bytes());
        }
        Ok(texts.len())
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.row_count())?;
        self.arena.clear();
        for (row, value) in values.iter().enumerate() {
            match value {
                Value::Null => self.arena.set(row, b""),
                other => match other.as_bytes() {
                    Some(bytes) => self.arena.set(row, bytes),
                    None => {
                        return Err(BatchError::at_row(
                            row,
                            eyre::Report::new(CodecError::mismatch(
                                "String",
                                other.kind().to_string(),
                            )),
                        ))
                    }
                },
            }
        }
        Ok(values.len())
    }

    fn value(&self, row: usize) -> Value {
        let bytes = self.arena.get(row);
        match std::str::from_utf8(bytes) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::Bytes(bytes.to_vec()),
        }
    }

    fn text(&self, row: usize) -> String {
        String::from_utf8_lossy(self.arena.get(row)).into_owned()
    }

    fn nested_text(&self, row: usize) -> String {
        quote(&self.text(row))
    }

    fn zero_value(&self) -> Value {
        Value::Text(String::new())
    }

    fn zero_text(&self) -> String {
        String::new()
    }

    fn nested_zero_text(&self) -> String {
        "''".to_string()
    }
}
