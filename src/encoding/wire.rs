//! # Primitive Wire Decoder and Encoder
//!
//! Codecs never touch sockets. They consume two narrow contracts from the
//! transport layer:
//!
//! | Contract      | Operations                                             |
//! |---------------|--------------------------------------------------------|
//! | `WireDecoder` | `read_exact`, `read_uvarint`, `read_string`            |
//! | `WireEncoder` | `write_all`, `write_uvarint`, `write_string`           |
//!
//! Strings are varint-length-prefixed byte runs; they are not required to be
//! UTF-8.
//!
//! Lengths and counts read off the wire are checked with
//! [`WireDecoder::check_available`] before anything is allocated for them. A
//! slice decoder bounds them by the bytes left in the block; a stream decoder
//! by `MAX_BLOCK_BYTES`.
//!
//! ## Provided Implementations
//!
//! - [`SliceDecoder`]: reads from a borrowed byte slice (tests, buffered blocks)
//! - [`StreamDecoder`]: adapts any `std::io::Read`
//! - `Vec<u8>`: the simplest encoder, appends to the vector
//! - [`StreamEncoder`]: adapts any `std::io::Write`
//!
//! ## Usage
//!
//! ```rust
//! use colwire::encoding::{SliceDecoder, WireDecoder, WireEncoder};
//!
//! let mut out = Vec::new();
//! out.write_string(b"hello").unwrap();
//! out.write_uvarint(300).unwrap();
//!
//! let mut dec = SliceDecoder::new(&out);
//! assert_eq!(dec.read_string().unwrap(), b"hello");
//! assert_eq!(dec.read_uvarint().unwrap(), 300);
//! assert!(dec.is_exhausted());
//! ```

use std::io::{Read, Write};

use eyre::{bail, ensure, Result, WrapErr};

use super::varint::{decode_uvarint, encode_uvarint, MAX_UVARINT_LEN};
use crate::config::MAX_BLOCK_BYTES;
use crate::error::CodecError;

pub trait WireDecoder {
    /// Fills `buf` completely or fails.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    fn read_uvarint(&mut self) -> Result<u64>;

    /// Bytes left in the block, when the decoder knows.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }

    /// Accept `count` wire items of at least `unit` bytes each only if they
    /// can still be read.
    fn check_available(&self, count: u64, unit: usize) -> Result<usize> {
        let limit = self.remaining_hint().unwrap_or(MAX_BLOCK_BYTES);
        let accepted = usize::try_from(count).ok().filter(|n| {
            n.checked_mul(unit.max(1))
                .is_some_and(|bytes| bytes <= limit)
        });
        match accepted {
            Some(n) => Ok(n),
            None => bail!(CodecError::shape(format!(
                "{} items of {} bytes exceed the {} bytes available",
                count, unit, limit
            ))),
        }
    }

    fn read_string(&mut self) -> Result<Vec<u8>> {
        let len = self.read_uvarint()?;
        let len = self.check_available(len, 1).wrap_err("reading string")?;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_u64_le(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

pub trait WireEncoder {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    fn write_uvarint(&mut self, value: u64) -> Result<()> {
        let mut buf = [0u8; MAX_UVARINT_LEN];
        let len = encode_uvarint(value, &mut buf);
        self.write_all(&buf[..len])
    }

    fn write_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_uvarint(bytes.len() as u64)?;
        self.write_all(bytes)
    }

    fn write_u64_le(&mut self, value: u64) -> Result<()> {
        self.write_all(&value.to_le_bytes())
    }
}

/// Decoder over an in-memory block.
#[derive(Debug, Clone)]
pub struct SliceDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

impl WireDecoder for SliceDecoder<'_> {
    fn remaining_hint(&self) -> Option<usize> {
        Some(self.remaining())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        ensure!(
            buf.len() <= self.remaining(),
            "unexpected end of block: need {} bytes at offset {}, {} remain",
            buf.len(),
            self.pos,
            self.remaining()
        );
        buf.copy_from_slice(&self.data[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();
        Ok(())
    }

    fn read_uvarint(&mut self) -> Result<u64> {
        let (value, len) = decode_uvarint(&self.data[self.pos..])
            .wrap_err_with(|| format!("invalid varint at offset {}", self.pos))?;
        self.pos += len;
        Ok(value)
    }
}

/// Decoder over any byte stream.
#[derive(Debug)]
pub struct StreamDecoder<R> {
    inner: R,
}

impl<R: Read> StreamDecoder<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> WireDecoder for StreamDecoder<R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner
            .read_exact(buf)
            .wrap_err_with(|| format!("failed to read {} bytes from stream", buf.len()))
    }

    fn read_uvarint(&mut self) -> Result<u64> {
        let mut buf = [0u8; MAX_UVARINT_LEN];
        for i in 0..MAX_UVARINT_LEN {
            self.read_exact(&mut buf[i..i + 1])?;
            if buf[i] & 0x80 == 0 {
                let (value, _) = decode_uvarint(&buf[..=i])?;
                return Ok(value);
            }
        }
        let (value, _) = decode_uvarint(&buf)?;
        Ok(value)
    }
}

impl WireEncoder for Vec<u8> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Encoder over any byte sink.
#[derive(Debug)]
pub struct StreamEncoder<W> {
    inner: W,
}

impl<W: Write> StreamEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> WireEncoder for StreamEncoder<W> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .wrap_err_with(|| format!("failed to write {} bytes to stream", bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_decoder_reads_exact_bytes() {
        let data = [1u8, 2, 3, 4];
        let mut dec = SliceDecoder::new(&data);

        let mut buf = [0u8; 3];
        dec.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(dec.remaining(), 1);
    }

    #[test]
    fn slice_decoder_short_read_fails_without_advancing() {
        let data = [1u8, 2];
        let mut dec = SliceDecoder::new(&data);

        let mut buf = [0u8; 3];
        assert!(dec.read_exact(&mut buf).is_err());
        assert_eq!(dec.position(), 0);
    }

    #[test]
    fn string_roundtrip_through_vec_encoder() {
        let mut out = Vec::new();
        out.write_string(b"").unwrap();
        out.write_string(&[0xFF, 0x00, 0x41]).unwrap();

        let mut dec = SliceDecoder::new(&out);
        assert_eq!(dec.read_string().unwrap(), Vec::<u8>::new());
        assert_eq!(dec.read_string().unwrap(), vec![0xFF, 0x00, 0x41]);
        assert!(dec.is_exhausted());
    }

    #[test]
    fn oversized_string_length_is_rejected_before_allocating() {
        let mut out = Vec::new();
        out.write_uvarint(u64::MAX).unwrap();
        out.extend_from_slice(b"abc");

        let mut dec = SliceDecoder::new(&out);
        assert!(dec.read_string().is_err());
    }

    #[test]
    fn available_bytes_bound_item_counts() {
        let data = [0u8; 16];
        let dec = SliceDecoder::new(&data);
        assert_eq!(dec.check_available(2, 8).unwrap(), 2);
        assert!(dec.check_available(3, 8).is_err());
        assert!(dec.check_available(u64::MAX, 1).is_err());
        assert!(dec.check_available(u64::MAX / 2, 4).is_err());

        let stream = StreamDecoder::new(std::io::Cursor::new(Vec::new()));
        assert!(stream.check_available(1 << 20, 8).is_ok());
        assert!(stream.check_available(u64::MAX, 1).is_err());
    }

    #[test]
    fn stream_decoder_reads_varint_byte_by_byte() {
        let mut out = Vec::new();
        out.write_uvarint(u64::MAX).unwrap();
        out.write_uvarint(5).unwrap();

        let mut dec = StreamDecoder::new(std::io::Cursor::new(out));
        assert_eq!(dec.read_uvarint().unwrap(), u64::MAX);
        assert_eq!(dec.read_uvarint().unwrap(), 5);
        assert!(dec.read_uvarint().is_err());
    }

    #[test]
    fn stream_encoder_writes_through() {
        let mut enc = StreamEncoder::new(Vec::new());
        enc.write_u64_le(0x0102).unwrap();
        assert_eq!(enc.into_inner(), vec![2, 1, 0, 0, 0, 0, 0, 0]);
    }
}
