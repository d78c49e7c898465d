//! # 256-bit Integer Columns
//!
//! `Int256` and `UInt256` rows are 32-byte little-endian two's-complement
//! integers. Values travel as `Value::BigInt`; any integer value is accepted
//! and range-checked.

use std::str::FromStr;

use eyre::{bail, Result};
use num_bigint::BigInt;

use super::FixedKind;
use crate::error::CodecError;
use crate::numeric::{read_twos_complement, write_twos_complement};
use crate::parsing::unquote;
use crate::types::{KindGuard, Value, ValueKind};

const WIDTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct WideIntKind {
    signed: bool,
}

impl WideIntKind {
    pub fn signed() -> Self {
        Self { signed: true }
    }

    pub fn unsigned() -> Self {
        Self { signed: false }
    }
}

impl FixedKind for WideIntKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        if self.signed {
            "Int256"
        } else {
            "UInt256"
        }
    }

    fn width(&self) -> usize {
        WIDTH
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        let t = unquote(text.trim());
        let t = t.strip_prefix('+').unwrap_or(t);
        let value = match BigInt::from_str(t) {
            Ok(v) => v,
            Err(_) => bail!(CodecError::parse(self.name(), text)),
        };
        write_twos_complement(&value, out, self.signed)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, self.name(), |k| {
            k.is_native_integer() || k == ValueKind::BigInt
        })?;
        match value.to_bigint() {
            Some(v) => write_twos_complement(&v, out, self.signed),
            None => bail!(CodecError::mismatch(self.name(), value.kind().to_string())),
        }
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::BigInt(read_twos_complement(row, self.signed))
    }

    fn render(&self, row: &[u8]) -> String {
        read_twos_complement(row, self.signed).to_string()
    }
}
