//! # Decimal Columns
//!
//! `Decimal(P, S)` rows hold `value * 10^S` as a two's-complement integer of
//! 4, 8, 16 or 32 bytes depending on `P`. Extra fractional digits are
//! truncated toward zero; more than `P` significant digits after scaling is
//! an overflow.
//!
//! Accepted values: `Value::Decimal`, native integers and `Value::BigInt`
//! (integers are whole numbers, scaled by `10^S`).

use eyre::{bail, Result};
use num_bigint::BigInt;

use super::FixedKind;
use crate::error::CodecError;
use crate::numeric::{
    check_precision, decimal_width, format_decimal, from_big_decimal, from_integer,
    parse_decimal, read_twos_complement, to_big_decimal, write_twos_complement,
};
use crate::types::{KindGuard, Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalKind {
    precision: u8,
    scale: u8,
}

impl DecimalKind {
    pub fn new(precision: u8, scale: u8) -> Self {
        Self { precision, scale }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Range-check and store an unscaled integer.
    pub(crate) fn store(&self, unscaled: &BigInt, out: &mut [u8]) -> Result<()> {
        check_precision(unscaled, self.precision, self.scale)?;
        write_twos_complement(unscaled, out, true)
    }

    pub(crate) fn unscaled(&self, row: &[u8]) -> BigInt {
        read_twos_complement(row, true)
    }

    pub(crate) fn parse_unscaled(&self, text: &str) -> Result<BigInt> {
        parse_decimal(text, self.scale)
    }

    pub(crate) fn value_unscaled(&self, value: &Value) -> Result<BigInt> {
        match value {
            Value::Decimal(d) => from_big_decimal(d, self.scale),
            other => match other.to_bigint() {
                Some(int) => Ok(from_integer(int, self.scale)),
                None => bail!(CodecError::mismatch(
                    format!("Decimal({}, {})", self.precision, self.scale),
                    other.kind().to_string()
                )),
            },
        }
    }
}

impl FixedKind for DecimalKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "Decimal"
    }

    fn width(&self) -> usize {
        decimal_width(self.precision)
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        let unscaled = self.parse_unscaled(text)?;
        self.store(&unscaled, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "Decimal", |k| {
            k == ValueKind::Decimal || k == ValueKind::BigInt || k.is_native_integer()
        })?;
        let unscaled = self.value_unscaled(value)?;
        self.store(&unscaled, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Decimal(to_big_decimal(self.unscaled(row), self.scale))
    }

    fn render(&self, row: &[u8]) -> String {
        format_decimal(&self.unscaled(row), self.scale)
    }
}
