//! # colwire - Columnar Native-Protocol Codecs
//!
//! colwire converts column data between three representations:
//!
//! - **Wire bytes** in the native columnar format of an analytical database
//! - **Text literals** as typed by a user or printed by a client
//! - **Native values** ([`Value`]) for programmatic access
//!
//! It covers the type descriptor grammar, one codec per column kind, the
//! offset-based encoding of `Array`/`Map`, dictionary (`LowCardinality`) and
//! bitmap (`BitMap64`) compression, and the text tokenizer they share.
//!
//! ## Quick Start
//!
//! ```rust
//! use colwire::{ColumnFactory, SliceDecoder, Value};
//!
//! let factory = ColumnFactory::default();
//!
//! let mut codec = factory.create("Nullable(Int8)", 3).unwrap();
//! codec.fill_from_texts(&["1", "NULL", "3"]).unwrap();
//! assert_eq!(codec.text(1), "ᴺᵁᴸᴸ");
//!
//! let mut wire = Vec::new();
//! codec.write_to(&mut wire).unwrap();
//!
//! let mut decoded = factory.create("Nullable(Int8)", 3).unwrap();
//! decoded.read_from(&mut SliceDecoder::new(&wire)).unwrap();
//! assert_eq!(decoded.value(2), Value::Int8(3));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   ColumnFactory (descriptor cache)   │
//! ├─────────────────────────────────────┤
//! │  Descriptor Parser → ColumnBlueprint │
//! ├──────────────────┬──────────────────┤
//! │  Scalar Codecs   │ Container Codecs │
//! │  FixedColumn<K>  │ Array Map Tuple  │
//! │  String BitMap64 │ Nullable LowCard │
//! ├──────────────────┴──────────────────┤
//! │ Tokenizer │ Wide ints & Decimals    │
//! ├─────────────────────────────────────┤
//! │  Wire Encoder/Decoder │ Buffer Pool │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Ingestion runs text or values → codec → wire bytes; projection runs wire
//! bytes → codec → text or values. A codec is created per block and per
//! column with a fixed row count, filled once, read any number of times and
//! released.
//!
//! ## Module Overview
//!
//! - [`factory`]: `ColumnFactory` and its builder
//! - [`types`]: descriptors, blueprints, enum tables, native values
//! - [`column`]: the `ColumnCodec` trait and every codec
//! - [`numeric`]: 256-bit integers and decimal scaling
//! - [`parsing`]: tokenizer, literal and temporal text helpers
//! - [`encoding`]: varints and the wire encoder/decoder traits
//! - [`memory`]: buffer pool and byte arena
//! - [`error`]: `CodecError`, `BatchError`, `FillResult`
//! - [`config`]: protocol and tuning constants

#[macro_use]
mod macros;

pub mod column;
pub mod config;
pub mod encoding;
pub mod error;
pub mod factory;
pub mod memory;
pub mod numeric;
pub mod parsing;
pub mod types;

pub use column::ColumnCodec;
pub use encoding::{SliceDecoder, StreamDecoder, StreamEncoder, WireDecoder, WireEncoder};
pub use error::{BatchError, CodecError, ErrorKind, FillResult};
pub use factory::{ColumnFactory, ColumnFactoryBuilder};
pub use types::{CodecContext, ColumnBlueprint, DescriptorError, Value, ValueKind};
