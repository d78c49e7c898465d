//! # Unsigned LEB128 Varints
//!
//! The native block protocol prefixes every variable-length payload (String
//! rows, BitMap64 rows) with an unsigned LEB128 varint. This module provides
//! the slice-level primitives; [`super::wire`] builds the decoder/encoder
//! contracts on top of them.
//!
//! ## Encoding Format
//!
//! Seven payload bits per byte, least significant group first. The high bit
//! of each byte is a continuation flag.
//!
//! | Value Range               | Bytes |
//! |---------------------------|-------|
//! | 0 - 127                   | 1     |
//! | 128 - 16383               | 2     |
//! | 16384 - 2097151           | 3     |
//! | 2097152 - 268435455       | 4     |
//! | ...                       | ...   |
//! | 2^63 - u64::MAX           | 10    |
//!
//! ## Boundary Values
//!
//! - 127: Maximum 1-byte value
//! - 128: Minimum 2-byte value
//! - 16383: Maximum 2-byte value
//! - 16384: Minimum 3-byte value
//! - u64::MAX: 10 bytes, final byte is 0x01
//!
//! ## Usage Example
//!
//! ```rust
//! use colwire::encoding::varint::{decode_uvarint, encode_uvarint, uvarint_len};
//!
//! let mut buf = [0u8; 10];
//! let written = encode_uvarint(300, &mut buf);
//! assert_eq!(written, 2);
//! assert_eq!(uvarint_len(300), 2);
//!
//! let (value, read) = decode_uvarint(&buf).unwrap();
//! assert_eq!(value, 300);
//! assert_eq!(read, 2);
//! ```
//!
//! ## Error Handling
//!
//! `decode_uvarint` returns `eyre::Result` with descriptive messages:
//! - Empty buffer: "empty buffer for varint decode"
//! - Truncated encoding: "truncated varint after N bytes"
//! - Overlong encoding: "varint overflows u64"

use eyre::{bail, ensure, Result};

/// Maximum encoded length of a u64.
pub const MAX_UVARINT_LEN: usize = 10;

pub fn uvarint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

pub fn encode_uvarint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

pub fn decode_uvarint(buf: &[u8]) -> Result<(u64, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for varint decode");

    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate().take(MAX_UVARINT_LEN) {
        if i == MAX_UVARINT_LEN - 1 && byte > 1 {
            bail!("varint overflows u64");
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }

    if buf.len() >= MAX_UVARINT_LEN {
        bail!("varint overflows u64");
    }
    bail!("truncated varint after {} bytes", buf.len())
}
