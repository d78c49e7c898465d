//! # Column Blueprints
//!
//! A `ColumnBlueprint` is a parsed descriptor: a cloneable value that stamps
//! out ready-to-fill codecs. Parsing happens once per distinct descriptor;
//! instantiation is a cheap allocation per block.
//!
//! ```text
//! "Array(Nullable(UInt8))" ──parse──> Array(Nullable(UInt8)) ──instantiate(rows)──> codec
//!                                            │
//!                                            └── Display ──> "Array(Nullable(UInt8))"
//! ```
//!
//! ## Codec Context
//!
//! Instantiation needs two pieces of shared state, bundled in
//! [`CodecContext`]: the buffer pool rows are drawn from and the time zone
//! used by `DateTime`/`DateTime64` columns whose descriptor names none.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono_tz::Tz;

use super::descriptor::parse_descriptor;
use super::enum_table::EnumTable;
use crate::column::{
    ArrayColumn, BitmapColumn, BoolKind, ColumnCodec, Date32Kind, DateKind, DateTime64Kind,
    DateTimeKind, DecimalKind, EnumKind, FixedColumn, FixedStringKind, FloatKind, IntKind,
    Ipv4Kind, Ipv6Kind, LowCardinalityColumn, MapColumn, NullableColumn, StringColumn, TimeKind,
    TupleColumn, UuidKind, WideIntKind,
};
use crate::memory::BufferPool;
use crate::parsing::quote;

/// Shared state every codec of a factory is created with.
#[derive(Debug, Clone)]
pub struct CodecContext {
    pub pool: BufferPool,
    pub time_zone: Tz,
}

impl Default for CodecContext {
    fn default() -> Self {
        Self {
            pool: BufferPool::default(),
            time_zone: Tz::UTC,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnBlueprint {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Bool,
    String,
    FixedString(usize),
    Uuid,
    Ipv4,
    Ipv6,
    Date,
    Date32,
    DateTime(Option<Tz>),
    DateTime64 { precision: u8, time_zone: Option<Tz> },
    Time { scale: u8 },
    Decimal { precision: u8, scale: u8 },
    Enum(Arc<EnumTable>),
    Array(Box<ColumnBlueprint>),
    Map(Box<ColumnBlueprint>, Box<ColumnBlueprint>),
    Tuple(Vec<ColumnBlueprint>),
    Nullable(Box<ColumnBlueprint>),
    LowCardinality(Box<ColumnBlueprint>),
    BitMap64,
}

impl ColumnBlueprint {
    /// Allocate a codec for `rows` rows.
    pub fn instantiate(&self, rows: usize, ctx: &CodecContext) -> Box<dyn ColumnCodec> {
        let pool = &ctx.pool;
        match self {
            ColumnBlueprint::Int8 => Box::new(FixedColumn::new(pool, rows, IntKind::<i8>::new())),
            ColumnBlueprint::Int16 => Box::new(FixedColumn::new(pool, rows, IntKind::<i16>::new())),
            ColumnBlueprint::Int32 => Box::new(FixedColumn::new(pool, rows, IntKind::<i32>::new())),
            ColumnBlueprint::Int64 => Box::new(FixedColumn::new(pool, rows, IntKind::<i64>::new())),
            ColumnBlueprint::Int128 => {
                Box::new(FixedColumn::new(pool, rows, IntKind::<i128>::new()))
            }
            ColumnBlueprint::Int256 => Box::new(FixedColumn::new(pool, rows, WideIntKind::signed())),
            ColumnBlueprint::UInt8 => Box::new(FixedColumn::new(pool, rows, IntKind::<u8>::new())),
            ColumnBlueprint::UInt16 => {
                Box::new(FixedColumn::new(pool, rows, IntKind::<u16>::new()))
            }
            ColumnBlueprint::UInt32 => {
                Box::new(FixedColumn::new(pool, rows, IntKind::<u32>::new()))
            }
            ColumnBlueprint::UInt64 => {
                Box::new(FixedColumn::new(pool, rows, IntKind::<u64>::new()))
            }
            ColumnBlueprint::UInt128 => {
                Box::new(FixedColumn::new(pool, rows, IntKind::<u128>::new()))
            }
            ColumnBlueprint::UInt256 => {
                Box::new(FixedColumn::new(pool, rows, WideIntKind::unsigned()))
            }
            ColumnBlueprint::Float32 => {
                Box::new(FixedColumn::new(pool, rows, FloatKind::<f32>::new()))
            }
            ColumnBlueprint::Float64 => {
                Box::new(FixedColumn::new(pool, rows, FloatKind::<f64>::new()))
            }
            ColumnBlueprint::Bool => Box::new(FixedColumn::new(pool, rows, BoolKind)),
            ColumnBlueprint::String => Box::new(StringColumn::new(pool, rows)),
            ColumnBlueprint::FixedString(len) => {
                Box::new(FixedColumn::new(pool, rows, FixedStringKind::new(*len)))
            }
            ColumnBlueprint::Uuid => Box::new(FixedColumn::new(pool, rows, UuidKind)),
            ColumnBlueprint::Ipv4 => Box::new(FixedColumn::new(pool, rows, Ipv4Kind)),
            ColumnBlueprint::Ipv6 => Box::new(FixedColumn::new(pool, rows, Ipv6Kind)),
            ColumnBlueprint::Date => Box::new(FixedColumn::new(pool, rows, DateKind)),
            ColumnBlueprint::Date32 => Box::new(FixedColumn::new(pool, rows, Date32Kind)),
            ColumnBlueprint::DateTime(tz) => Box::new(FixedColumn::new(
                pool,
                rows,
                DateTimeKind::new(tz.unwrap_or(ctx.time_zone)),
            )),
            ColumnBlueprint::DateTime64 {
                precision,
                time_zone,
            } => Box::new(FixedColumn::new(
                pool,
                rows,
                DateTime64Kind::new(*precision, time_zone.unwrap_or(ctx.time_zone)),
            )),
            ColumnBlueprint::Time { scale } => {
                Box::new(FixedColumn::new(pool, rows, TimeKind::new(*scale)))
            }
            ColumnBlueprint::Decimal { precision, scale } => Box::new(FixedColumn::new(
                pool,
                rows,
                DecimalKind::new(*precision, *scale),
            )),
            ColumnBlueprint::Enum(table) => {
                Box::new(FixedColumn::new(pool, rows, EnumKind::new(Arc::clone(table))))
            }
            ColumnBlueprint::Array(inner) => {
                Box::new(ArrayColumn::new(rows, inner.as_ref().clone(), ctx.clone()))
            }
            ColumnBlueprint::Map(key, value) => Box::new(MapColumn::new(
                rows,
                key.as_ref().clone(),
                value.as_ref().clone(),
                ctx.clone(),
            )),
            ColumnBlueprint::Tuple(elements) => Box::new(TupleColumn::new(rows, elements, ctx)),
            ColumnBlueprint::Nullable(inner) => Box::new(NullableColumn::new(rows, inner, ctx)),
            ColumnBlueprint::LowCardinality(inner) => Box::new(LowCardinalityColumn::new(
                rows,
                inner.as_ref().clone(),
                ctx.clone(),
            )),
            ColumnBlueprint::BitMap64 => Box::new(BitmapColumn::new(pool, rows)),
        }
    }

    /// Types a LowCardinality dictionary may hold.
    pub fn is_dictionary_key(&self) -> bool {
        !matches!(
            self,
            ColumnBlueprint::Array(_)
                | ColumnBlueprint::Map(..)
                | ColumnBlueprint::Tuple(_)
                | ColumnBlueprint::Nullable(_)
                | ColumnBlueprint::LowCardinality(_)
                | ColumnBlueprint::BitMap64
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ColumnBlueprint::Array(_)
                | ColumnBlueprint::Map(..)
                | ColumnBlueprint::Tuple(_)
                | ColumnBlueprint::Nullable(_)
                | ColumnBlueprint::LowCardinality(_)
        )
    }
}

impl FromStr for ColumnBlueprint {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_descriptor(s)
    }
}

impl fmt::Display for ColumnBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnBlueprint::Int8 => f.write_str("Int8"),
            ColumnBlueprint::Int16 => f.write_str("Int16"),
            ColumnBlueprint::Int32 => f.write_str("Int32"),
            ColumnBlueprint::Int64 => f.write_str("Int64"),
            ColumnBlueprint::Int128 => f.write_str("Int128"),
            ColumnBlueprint::Int256 => f.write_str("Int256"),
            ColumnBlueprint::UInt8 => f.write_str("UInt8"),
            ColumnBlueprint::UInt16 => f.write_str("UInt16"),
            ColumnBlueprint::UInt32 => f.write_str("UInt32"),
            ColumnBlueprint::UInt64 => f.write_str("UInt64"),
            ColumnBlueprint::UInt128 => f.write_str("UInt128"),
            ColumnBlueprint::UInt256 => f.write_str("UInt256"),
            ColumnBlueprint::Float32 => f.write_str("Float32"),
            ColumnBlueprint::Float64 => f.write_str("Float64"),
            ColumnBlueprint::Bool => f.write_str("Bool"),
            ColumnBlueprint::String => f.write_str("String"),
            ColumnBlueprint::FixedString(len) => write!(f, "FixedString({})", len),
            ColumnBlueprint::Uuid => f.write_str("UUID"),
            ColumnBlueprint::Ipv4 => f.write_str("IPv4"),
            ColumnBlueprint::Ipv6 => f.write_str("IPv6"),
            ColumnBlueprint::Date => f.write_str("Date"),
            ColumnBlueprint::Date32 => f.write_str("Date32"),
            ColumnBlueprint::DateTime(None) => f.write_str("DateTime"),
            ColumnBlueprint::DateTime(Some(tz)) => write!(f, "DateTime({})", quote(tz.name())),
            ColumnBlueprint::DateTime64 {
                precision,
                time_zone: None,
            } => write!(f, "DateTime64({})", precision),
            ColumnBlueprint::DateTime64 {
                precision,
                time_zone: Some(tz),
            } => write!(f, "DateTime64({}, {})", precision, quote(tz.name())),
            ColumnBlueprint::Time { scale } => write!(f, "Time({})", scale),
            ColumnBlueprint::Decimal { precision, scale } => {
                write!(f, "Decimal({}, {})", precision, scale)
            }
            ColumnBlueprint::Enum(table) => {
                write!(f, "{}(", table.width().name())?;
                for (i, (name, value)) in table.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", quote(name), value)?;
                }
                f.write_str(")")
            }
            ColumnBlueprint::Array(inner) => write!(f, "Array({})", inner),
            ColumnBlueprint::Map(key, value) => write!(f, "Map({}, {})", key, value),
            ColumnBlueprint::Tuple(elements) => {
                f.write_str("Tuple(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str(")")
            }
            ColumnBlueprint::Nullable(inner) => write!(f, "Nullable({})", inner),
            ColumnBlueprint::LowCardinality(inner) => write!(f, "LowCardinality({})", inner),
            ColumnBlueprint::BitMap64 => f.write_str("BitMap64"),
        }
    }
}
