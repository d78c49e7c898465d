//! # LowCardinality Columns
//!
//! `LowCardinality(T)` and `LowCardinality(Nullable(T))` store each distinct
//! value once in a keys codec of kind `T` and one dictionary index per row.
//!
//! ## Wire Layout
//!
//! ```text
//! +---------------------------+  0
//! | version          u64 LE   |  always 1 (shared dictionaries)
//! | index type|flags u64 LE   |  low byte: 0=u8 1=u16 2=u32 3=u64
//! | key count        u64 LE   |
//! +---------------------------+  24
//! | keys codec wire bytes     |
//! +---------------------------+
//! | row count        u64 LE   |
//! | packed indices            |  row count × index width
//! +---------------------------+
//! ```
//!
//! The index width is the narrowest that addresses every key: up to 256
//! keys use `u8`, up to 65536 use `u16`, anything larger `u32`. Decoding
//! also accepts `u64` indices.
//!
//! ## Building the Dictionary
//!
//! 1. Assign each distinct input a dense slot in first-occurrence order.
//! 2. Fill the keys codec with one value per slot.
//! 3. Merge slots whose stored values compare equal (`1` and `01` both
//!    store 1) so the dictionary holds every distinct value exactly once.
//! 4. Write the remapped slot of each row.
//!
//! Nullable dictionaries reserve slot 0 for null; its key row holds the
//! zero value of `T`. Rows past the committed prefix of a fill take slot 0
//! (nullable) or the zero value (otherwise).

use eyre::{bail, ensure, Result, WrapErr};
use hashbrown::HashMap;
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use super::array::finish;
use super::{check_batch_len, ColumnCodec, RowBuffer};
use crate::config::{
    LC_HEADER_SIZE, LC_INDEX_TYPE_MASK, LC_INDEX_U16, LC_INDEX_U32, LC_INDEX_U64, LC_INDEX_U8,
    LC_SHARED_DICTIONARIES_WITH_ADDITIONAL_KEYS, LC_UINT16_INDEX_LIMIT, LC_UINT8_INDEX_LIMIT,
    LC_UPDATE_ALL, NULL_DISPLAY,
};
use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::parsing::is_null_literal;
use crate::types::{CodecContext, ColumnBlueprint, DictKey, Value};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct DictionaryHeader {
    version: U64,
    index_flags: U64,
    key_count: U64,
}

const _: () = assert!(std::mem::size_of::<DictionaryHeader>() == LC_HEADER_SIZE);

impl DictionaryHeader {
    pub fn new(index_type: u64, key_count: u64) -> Self {
        Self {
            version: U64::new(LC_SHARED_DICTIONARIES_WITH_ADDITIONAL_KEYS),
            index_flags: U64::new(index_type | LC_UPDATE_ALL),
            key_count: U64::new(key_count),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= LC_HEADER_SIZE,
            "buffer too small for DictionaryHeader: {} < {}",
            bytes.len(),
            LC_HEADER_SIZE
        );
        let header = Self::ref_from_bytes(&bytes[..LC_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse DictionaryHeader: {:?}", e))?;
        if header.version() != LC_SHARED_DICTIONARIES_WITH_ADDITIONAL_KEYS {
            bail!(CodecError::shape(format!(
                "unsupported LowCardinality version {}",
                header.version()
            )));
        }
        Ok(header)
    }

    zerocopy_accessors! {
        version: u64,
        index_flags: u64,
        key_count: u64,
    }

    pub fn index_type(&self) -> u64 {
        self.index_flags() & LC_INDEX_TYPE_MASK
    }
}

/// Narrowest index type addressing `keys` dictionary entries.
pub fn index_type_for(keys: usize) -> u64 {
    if keys <= LC_UINT8_INDEX_LIMIT {
        LC_INDEX_U8
    } else if keys <= LC_UINT16_INDEX_LIMIT {
        LC_INDEX_U16
    } else {
        LC_INDEX_U32
    }
}

/// Bytes per packed index.
pub fn index_width(index_type: u64) -> Result<usize> {
    let width = match index_type {
        LC_INDEX_U8 => 1,
        LC_INDEX_U16 => 2,
        LC_INDEX_U32 => 4,
        LC_INDEX_U64 => 8,
        other => bail!(CodecError::shape(format!(
            "unknown LowCardinality index type {}",
            other
        ))),
    };
    Ok(width)
}

/// Dense slot assignment over borrowed values, in first-occurrence order.
struct DictionaryBuilder<'a> {
    slots: HashMap<DictKey<'a>, u32>,
    keys: Vec<&'a Value>,
    first_rows: Vec<usize>,
    indices: Vec<u32>,
    nullable: bool,
}

/// Stands in for the null slot and for padding rows. A null key is stored as
/// the key kind's zero and takes no part in the batch's value inference.
static NULL_KEY: Value = Value::Null;

impl<'a> DictionaryBuilder<'a> {
    fn new(nullable: bool) -> Self {
        let mut builder = Self {
            slots: HashMap::new(),
            keys: Vec::new(),
            first_rows: Vec::new(),
            indices: Vec::new(),
            nullable,
        };
        if nullable {
            builder.keys.push(&NULL_KEY);
            builder.first_rows.push(0);
        }
        builder
    }

    fn reserved(&self) -> usize {
        usize::from(self.nullable)
    }

    fn push(&mut self, value: &'a Value) {
        if self.nullable && value.is_null() {
            self.indices.push(0);
            return;
        }
        let row = self.indices.len();
        let next = self.keys.len() as u32;
        let keys = &mut self.keys;
        let first_rows = &mut self.first_rows;
        let slot = *self.slots.entry(DictKey(value)).or_insert_with(|| {
            keys.push(value);
            first_rows.push(row);
            next
        });
        self.indices.push(slot);
    }

    fn pad(&mut self, rows: usize) {
        while self.indices.len() < rows {
            if self.nullable {
                self.indices.push(0);
            } else {
                self.push(&NULL_KEY);
            }
        }
    }

    /// Forget `row` and every later row, with the keys they introduced.
    fn truncate(&mut self, row: usize) {
        let keep = self
            .first_rows
            .partition_point(|&first| first < row)
            .max(self.reserved());
        self.keys.truncate(keep);
        self.first_rows.truncate(keep);
        self.slots.retain(|_, slot| (*slot as usize) < keep);
        self.indices.truncate(row);
    }

    fn key_values(&self) -> Vec<Value> {
        self.keys.iter().map(|&v| v.clone()).collect()
    }
}

#[derive(Debug)]
pub struct LowCardinalityColumn {
    rows: usize,
    nullable: bool,
    key: ColumnBlueprint,
    ctx: CodecContext,
    keys: Box<dyn ColumnCodec>,
    indices: RowBuffer,
}

impl LowCardinalityColumn {
    pub fn new(rows: usize, inner: ColumnBlueprint, ctx: CodecContext) -> Self {
        let (nullable, key) = match inner {
            ColumnBlueprint::Nullable(key) => (true, *key),
            key => (false, key),
        };
        Self {
            rows,
            nullable,
            keys: key.instantiate(1, &ctx),
            indices: RowBuffer::new(&ctx.pool, rows, 4),
            key,
            ctx,
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Number of dictionary entries, including the null slot if any.
    pub fn dictionary_len(&self) -> usize {
        self.keys.row_count()
    }

    pub fn keys(&self) -> &dyn ColumnCodec {
        self.keys.as_ref()
    }

    /// Dictionary slot of `row`.
    pub fn index(&self, row: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.indices.row(row));
        u32::from_le_bytes(buf)
    }

    fn null_at(&self, row: usize) -> Option<usize> {
        let slot = self.index(row) as usize;
        if self.nullable && slot == 0 {
            None
        } else {
            Some(slot)
        }
    }

    fn reset(&mut self) {
        self.keys = self.key.instantiate(1, &self.ctx);
        self.indices = RowBuffer::new(&self.ctx.pool, self.rows, 4);
    }

    /// Fill the keys codec from `builder`, compact it and write the indices.
    fn install(
        &mut self,
        mut builder: DictionaryBuilder<'_>,
        mut failure: Option<BatchError>,
        len: usize,
    ) -> FillResult {
        builder.pad(self.rows);
        let mut values = builder.key_values();
        let mut keys = self.key.instantiate(values.len(), &self.ctx);
        if let Err(err) = keys.fill_from_values(&values) {
            let row = builder.first_rows[err.row];
            builder.truncate(row);
            builder.pad(self.rows);
            failure = Some(err.remap(row, row, format!("dictionary key for row {}", row)));

            values = builder.key_values();
            keys = self.key.instantiate(values.len(), &self.ctx);
            if let Err(again) = keys.fill_from_values(&values) {
                self.reset();
                return Err(again.remap(0, row, "rebuilding dictionary".to_string()));
            }
        }

        let (keys, remap) = self.compact(keys, builder.reserved());
        let mut indices = RowBuffer::new(&self.ctx.pool, self.rows, 4);
        for (row, &slot) in builder.indices.iter().enumerate() {
            indices
                .row_mut(row)
                .copy_from_slice(&remap[slot as usize].to_le_bytes());
        }
        tracing::debug!(
            rows = self.rows,
            slots = remap.len(),
            keys = keys.row_count(),
            nullable = self.nullable,
            "built LowCardinality dictionary"
        );
        self.keys = keys;
        self.indices = indices;
        finish(len, failure)
    }

    /// Merge slots whose stored values are equal. Returns the keys codec to
    /// keep and each old slot's new slot.
    fn compact(
        &self,
        keys: Box<dyn ColumnCodec>,
        reserved: usize,
    ) -> (Box<dyn ColumnCodec>, Vec<u32>) {
        let decoded: Vec<Value> = (0..keys.row_count()).map(|i| keys.value(i)).collect();
        let mut seen: HashMap<DictKey<'_>, u32> = HashMap::new();
        let mut unique: Vec<usize> = Vec::with_capacity(decoded.len());
        let mut remap = Vec::with_capacity(decoded.len());
        for (i, value) in decoded.iter().enumerate() {
            if i < reserved {
                remap.push(unique.len() as u32);
                unique.push(i);
                continue;
            }
            let next = unique.len() as u32;
            let slot = *seen.entry(DictKey(value)).or_insert_with(|| {
                unique.push(i);
                next
            });
            remap.push(slot);
        }
        if unique.len() == decoded.len() {
            return (keys, remap);
        }

        let merged: Vec<Value> = unique.iter().map(|&i| decoded[i].clone()).collect();
        let mut compacted = self.key.instantiate(merged.len(), &self.ctx);
        match compacted.fill_from_values(&merged) {
            Ok(_) => (compacted, remap),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    keys = decoded.len(),
                    "keeping uncompacted LowCardinality dictionary"
                );
                let identity = (0..decoded.len() as u32).collect();
                (keys, identity)
            }
        }
    }
}

impl ColumnCodec for LowCardinalityColumn {
    fn row_count(&self) -> usize {
        self.rows
    }

    /// Narrowest index; the dictionary header is per block.
    fn wire_row_bytes(&self) -> usize {
        1
    }

    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()> {
        let mut raw = [0u8; LC_HEADER_SIZE];
        decoder
            .read_exact(&mut raw)
            .wrap_err("reading LowCardinality header")?;
        let header = DictionaryHeader::from_bytes(&raw)?;
        let width = index_width(header.index_type())?;
        let key_count = decoder
            .check_available(header.key_count(), self.keys.wire_row_bytes())
            .wrap_err_with(|| format!("{} dictionary keys", header.key_count()))?;

        let mut keys = self.key.instantiate(key_count, &self.ctx);
        keys.read_from(decoder)?;

        let rows = decoder.read_u64_le()?;
        if rows != self.rows as u64 {
            bail!(CodecError::shape(format!(
                "LowCardinality block has {} rows, column expects {}",
                rows, self.rows
            )));
        }

        let packed_len = decoder.check_available(rows, width)? * width;
        let mut packed = vec![0u8; packed_len];
        decoder.read_exact(&mut packed)?;
        let mut indices = RowBuffer::new(&self.ctx.pool, self.rows, 4);
        for (row, chunk) in packed.chunks_exact(width).enumerate() {
            let mut buf = [0u8; 8];
            buf[..width].copy_from_slice(chunk);
            let index = u64::from_le_bytes(buf);
            if index >= key_count as u64 {
                bail!(CodecError::shape(format!(
                    "index {} at row {} is outside a dictionary of {} keys",
                    index, row, key_count
                )));
            }
            let index = u32::try_from(index).wrap_err_with(|| format!("index {} too large", index))?;
            indices.row_mut(row).copy_from_slice(&index.to_le_bytes());
        }

        self.keys = keys;
        self.indices = indices;
        Ok(())
    }

    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()> {
        let key_count = self.keys.row_count();
        let index_type = index_type_for(key_count);
        let width = index_width(index_type)?;
        let header = DictionaryHeader::new(index_type, key_count as u64);
        encoder.write_all(header.as_bytes())?;
        self.keys.write_to(encoder)?;
        encoder.write_u64_le(self.rows as u64)?;

        let mut packed = Vec::with_capacity(self.rows * width);
        for row in 0..self.rows {
            packed.extend_from_slice(&u64::from(self.index(row)).to_le_bytes()[..width]);
        }
        encoder.write_all(&packed)
    }

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult {
        check_batch_len(texts.len(), self.rows)?;
        let mut distinct: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<&str> = Vec::new();
        let mut first_rows: Vec<usize> = Vec::new();
        let mut row_slots: Vec<Option<usize>> = Vec::with_capacity(texts.len());
        for (row, &text) in texts.iter().enumerate() {
            if self.nullable && is_null_literal(text) {
                row_slots.push(None);
                continue;
            }
            let slot = *distinct.entry(text).or_insert_with(|| {
                unique.push(text);
                first_rows.push(row);
                unique.len() - 1
            });
            row_slots.push(Some(slot));
        }

        let mut parsed = self.key.instantiate(unique.len(), &self.ctx);
        let (limit, parsed_count, failure) = match parsed.fill_from_texts(&unique) {
            Ok(_) => (texts.len(), unique.len(), None),
            Err(err) => {
                let row = first_rows[err.row];
                let count = err.row;
                (row, count, Some(err.remap(row, row, format!("dictionary key for row {}", row))))
            }
        };
        let values: Vec<Value> = (0..parsed_count).map(|i| parsed.value(i)).collect();

        let mut builder = DictionaryBuilder::new(self.nullable);
        for slot in &row_slots[..limit] {
            match slot {
                Some(i) => builder.push(&values[*i]),
                None => builder.push(&NULL_KEY),
            }
        }
        self.install(builder, failure, texts.len())
    }

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult {
        check_batch_len(values.len(), self.rows)?;
        let mut builder = DictionaryBuilder::new(self.nullable);
        for value in values {
            builder.push(value);
        }
        self.install(builder, None, values.len())
    }

    fn value(&self, row: usize) -> Value {
        match self.null_at(row) {
            Some(slot) => self.keys.value(slot),
            None => Value::Null,
        }
    }

    fn text(&self, row: usize) -> String {
        match self.null_at(row) {
            Some(slot) => self.keys.text(slot),
            None => NULL_DISPLAY.to_string(),
        }
    }

    fn nested_text(&self, row: usize) -> String {
        match self.null_at(row) {
            Some(slot) => self.keys.nested_text(slot),
            None => "NULL".to_string(),
        }
    }

    fn zero_value(&self) -> Value {
        if self.nullable {
            Value::Null
        } else {
            self.keys.zero_value()
        }
    }

    fn zero_text(&self) -> String {
        if self.nullable {
            NULL_DISPLAY.to_string()
        } else {
            self.keys.zero_text()
        }
    }

    fn nested_zero_text(&self) -> String {
        if self.nullable {
            "NULL".to_string()
        } else {
            self.keys.nested_zero_text()
        }
    }
}
