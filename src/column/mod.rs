//! # Column Codecs
//!
//! One codec per column kind, all behind the object-safe [`ColumnCodec`]
//! trait. A codec is created for a fixed number of rows, filled once (from
//! the wire, from text, or from values), read many times, and released.
//!
//! ## Architecture
//!
//! ```text
//!                       ColumnCodec (dyn)
//!                             │
//!        ┌────────────────────┼───────────────────────────┐
//!        │                    │                           │
//! FixedColumn<K>        StringColumn / BitmapColumn    containers
//!   RowBuffer             ByteArena                   Array / Map (OffsetTable)
//!   K: FixedKind                                      Tuple / Nullable
//!   (ints, floats, decimals,                          LowCardinality
//!    dates, UUID, IP, enums, ...)
//! ```
//!
//! Fixed-width kinds only describe how one row is parsed, encoded and
//! rendered ([`FixedKind`]); [`FixedColumn`] supplies storage, wire I/O and
//! the batch-fill loop for all of them.
//!
//! ## Batch Fills
//!
//! `fill_from_texts`/`fill_from_values` accept at most `row_count()` inputs
//! and write rows from the start. Each row is encoded into scratch space and
//! only copied into the column once it is complete, so a failing row never
//! leaves partial bytes behind. On failure the [`BatchError`] reports how
//! many leading rows were committed and which input row failed.
//!
//! ## Text Forms
//!
//! `text(row)` renders a row for display. Inside containers, `nested_text`
//! is used instead: kinds whose literals need quoting (strings, dates, UUIDs,
//! addresses, enum names) are single-quoted there so the container text
//! parses back.
//!
//! ```text
//! String text:        it's
//! String nested_text: 'it\'s'
//! Array(String):      ['it\'s', 'b']
//! ```
//!
//! ## Lifecycle
//!
//! `release(self: Box<Self>)` consumes the codec and returns its buffers to
//! the pool. Dropping a codec does the same, so a codec cannot be used after
//! release or released twice.

mod address;
mod array;
mod bitmap;
mod boolean;
mod date;
mod decimal;
mod enums;
mod fixed;
mod fixed_string;
mod float;
mod int;
mod low_cardinality;
mod map;
mod nullable;
mod offsets;
mod string;
mod time;
mod tuple;
mod wide;

use std::fmt;

use eyre::Result;

use crate::encoding::{WireDecoder, WireEncoder};
use crate::error::{BatchError, CodecError, FillResult};
use crate::types::Value;

pub use address::{Ipv4Kind, Ipv6Kind, UuidKind};
pub use array::ArrayColumn;
pub use bitmap::BitmapColumn;
pub use boolean::BoolKind;
pub use date::{Date32Kind, DateKind, DateTime64Kind, DateTimeKind};
pub use decimal::DecimalKind;
pub use enums::EnumKind;
pub use fixed::{FixedColumn, FixedKind, RowBuffer};
pub use fixed_string::FixedStringKind;
pub use float::FloatKind;
pub use int::{IntKind, NativeInt};
pub use low_cardinality::{index_type_for, index_width, DictionaryHeader, LowCardinalityColumn};
pub use map::MapColumn;
pub use nullable::NullableColumn;
pub use offsets::OffsetTable;
pub use string::StringColumn;
pub use time::TimeKind;
pub use tuple::TupleColumn;
pub use wide::WideIntKind;

/// Capability set shared by every column kind.
pub trait ColumnCodec: Send + fmt::Debug {
    /// Rows this codec was created for.
    fn row_count(&self) -> usize;

    /// Fewest bytes one row occupies on the wire. Counts read off the wire
    /// are checked against it before a codec is sized for them.
    fn wire_row_bytes(&self) -> usize;

    /// Replace the contents with `row_count()` rows read from the wire.
    fn read_from(&mut self, decoder: &mut dyn WireDecoder) -> Result<()>;

    /// Write all rows in wire format.
    fn write_to(&self, encoder: &mut dyn WireEncoder) -> Result<()>;

    fn fill_from_texts(&mut self, texts: &[&str]) -> FillResult;

    fn fill_from_values(&mut self, values: &[Value]) -> FillResult;

    fn value(&self, row: usize) -> Value;

    fn text(&self, row: usize) -> String;

    /// Text of `row` as an element of a container literal.
    fn nested_text(&self, row: usize) -> String {
        self.text(row)
    }

    fn zero_value(&self) -> Value;

    fn zero_text(&self) -> String;

    /// Zero text as an element of a container literal.
    fn nested_zero_text(&self) -> String {
        self.zero_text()
    }

    /// Return buffers to the pool. Equivalent to dropping the codec.
    fn release(self: Box<Self>) {}
}

/// Reject batches longer than the column.
pub(crate) fn check_batch_len(len: usize, rows: usize) -> Result<(), BatchError> {
    if len > rows {
        return Err(BatchError::new(
            0,
            rows,
            eyre::Report::new(CodecError::shape(format!(
                "{} input rows exceed column capacity of {}",
                len, rows
            ))),
        ));
    }
    Ok(())
}

/// Join rendered elements as `open a, b, c close`.
pub(crate) fn join_rendered(
    open: char,
    close: char,
    items: impl Iterator<Item = String>,
) -> String {
    let mut out = String::new();
    out.push(open);
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&item);
    }
    out.push(close);
    out
}
