//! # Encoding Module
//!
//! This module provides the primitive byte-level contracts consumed by every
//! column codec:
//!
//! - **Varint encoding**: unsigned LEB128 used for string and bitmap lengths
//! - **Wire contracts**: `WireDecoder` / `WireEncoder` with slice, vector and
//!   `std::io` implementations

pub mod varint;
pub mod wire;

pub use varint::{decode_uvarint, encode_uvarint, uvarint_len};
pub use wire::{SliceDecoder, StreamDecoder, StreamEncoder, WireDecoder, WireEncoder};
