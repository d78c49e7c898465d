//! # Column Type System
//!
//! Descriptors, blueprints, enum tables and native values.
//!
//! ## Module Structure
//!
//! - `descriptor`: descriptor grammar and [`DescriptorError`]
//! - `blueprint`: [`ColumnBlueprint`] and the [`CodecContext`] it instantiates with
//! - `enum_table`: name/value tables for `Enum8`/`Enum16`
//! - `value`: the closed [`Value`] model and batch width inference
//!
//! ## Key Types
//!
//! | Type              | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `ColumnBlueprint` | Parsed descriptor, instantiates codecs         |
//! | `CodecContext`    | Buffer pool and default time zone              |
//! | `EnumTable`       | Bidirectional enum mapping, shared via `Arc`   |
//! | `Value`           | Native value accepted and returned by codecs   |
//! | `KindGuard`       | Locks a batch to its first value's variant     |
//!
//! ## Usage
//!
//! ```rust
//! use colwire::types::{CodecContext, ColumnBlueprint};
//!
//! let blueprint: ColumnBlueprint = "Array(Nullable(UInt8))".parse().unwrap();
//! let ctx = CodecContext::default();
//! let a = blueprint.instantiate(10, &ctx);
//! let b = blueprint.instantiate(20, &ctx);
//! assert_eq!((a.row_count(), b.row_count()), (10, 20));
//! ```

mod blueprint;
mod descriptor;
mod enum_table;
mod value;

pub use blueprint::{CodecContext, ColumnBlueprint};
pub use descriptor::{parse_descriptor, DescriptorError};
pub use enum_table::{EnumTable, EnumWidth};
pub use value::{DictKey, Integer, KindGuard, Value, ValueKind};
