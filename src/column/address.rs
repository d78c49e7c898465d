//! # UUID and IP Address Columns
//!
//! | Kind   | Row bytes                                                    |
//! |--------|--------------------------------------------------------------|
//! | `UUID` | two `u64` halves, each little-endian (bytes 0..8 reversed,   |
//! |        | then bytes 8..16 reversed)                                   |
//! | `IPv4` | `u32` little-endian of the numeric address                   |
//! | `IPv6` | 16 octets in network order                                   |
//!
//! All three accept their native `Value` variant or text, and render in the
//! canonical textual form.

use std::net::{Ipv4Addr, Ipv6Addr};

use eyre::{bail, Result};
use uuid::Uuid;

use super::FixedKind;
use crate::error::CodecError;
use crate::parsing::{parse_uuid, unquote};
use crate::types::{KindGuard, Value, ValueKind};

fn text_payload<'a>(value: &'a Value, column: &'static str) -> Result<&'a str> {
    match value {
        Value::Text(s) => Ok(s),
        other => bail!(CodecError::mismatch(column, other.kind().to_string())),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKind;

impl UuidKind {
    fn store(uuid: &Uuid, out: &mut [u8]) {
        let bytes = uuid.as_bytes();
        for (half, chunk) in out.chunks_exact_mut(8).enumerate() {
            for (i, b) in chunk.iter_mut().enumerate() {
                *b = bytes[half * 8 + 7 - i];
            }
        }
    }

    fn load(row: &[u8]) -> Uuid {
        let mut bytes = [0u8; 16];
        for (half, chunk) in row.chunks_exact(8).enumerate() {
            for (i, b) in chunk.iter().enumerate() {
                bytes[half * 8 + 7 - i] = *b;
            }
        }
        Uuid::from_bytes(bytes)
    }
}

impl FixedKind for UuidKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "UUID"
    }

    fn width(&self) -> usize {
        16
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        Self::store(&parse_uuid(text)?, out);
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "UUID", |k| matches!(k, ValueKind::Uuid | ValueKind::Text))?;
        let uuid = match value {
            Value::Uuid(u) => *u,
            other => parse_uuid(text_payload(other, "UUID")?)?,
        };
        Self::store(&uuid, out);
        Ok(())
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Uuid(Self::load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        Self::load(row).hyphenated().to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv4Kind;

impl Ipv4Kind {
    fn parse(text: &str) -> Result<Ipv4Addr> {
        match unquote(text.trim()).parse() {
            Ok(addr) => Ok(addr),
            Err(_) => bail!(CodecError::parse("IPv4", text)),
        }
    }

    fn load(row: &[u8]) -> Ipv4Addr {
        Ipv4Addr::from(u32::from_le_bytes([row[0], row[1], row[2], row[3]]))
    }
}

impl FixedKind for Ipv4Kind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "IPv4"
    }

    fn width(&self) -> usize {
        4
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(&u32::from(Self::parse(text)?).to_le_bytes());
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "IPv4", |k| matches!(k, ValueKind::Ipv4 | ValueKind::Text))?;
        let addr = match value {
            Value::Ipv4(a) => *a,
            other => Self::parse(text_payload(other, "IPv4")?)?,
        };
        out.copy_from_slice(&u32::from(addr).to_le_bytes());
        Ok(())
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Ipv4(Self::load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        Self::load(row).to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ipv6Kind;

impl Ipv6Kind {
    /// IPv6 text, or IPv4 text mapped to `::ffff:a.b.c.d`.
    fn parse(text: &str) -> Result<Ipv6Addr> {
        let t = unquote(text.trim());
        if let Ok(addr) = t.parse::<Ipv6Addr>() {
            return Ok(addr);
        }
        match t.parse::<Ipv4Addr>() {
            Ok(v4) => Ok(v4.to_ipv6_mapped()),
            Err(_) => bail!(CodecError::parse("IPv6", text)),
        }
    }

    fn load(row: &[u8]) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(row);
        Ipv6Addr::from(octets)
    }
}

impl FixedKind for Ipv6Kind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "IPv6"
    }

    fn width(&self) -> usize {
        16
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(&Self::parse(text)?.octets());
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "IPv6", |k| {
            matches!(k, ValueKind::Ipv6 | ValueKind::Ipv4 | ValueKind::Text)
        })?;
        let addr = match value {
            Value::Ipv6(a) => *a,
            Value::Ipv4(a) => a.to_ipv6_mapped(),
            other => Self::parse(text_payload(other, "IPv6")?)?,
        };
        out.copy_from_slice(&addr.octets());
        Ok(())
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Ipv6(Self::load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        Self::load(row).to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}
