//! # Fixed-Point Decimal Arithmetic
//!
//! A `Decimal(P, S)` row stores the integer `value * 10^S` in a two's-complement
//! row whose width follows from `P`:
//!
//! | Precision | Width    |
//! |-----------|----------|
//! | 1..=9     | 4 bytes  |
//! | 10..=18   | 8 bytes  |
//! | 19..=38   | 16 bytes |
//! | 39..=76   | 32 bytes |
//!
//! ## Scale Reduction
//!
//! Input with more fractional digits than `S` is truncated toward zero:
//! `123.456` into `Decimal(5, 2)` stores `12345`, `-123.456` stores `-12345`.
//!
//! ## Range
//!
//! After scaling, the unscaled integer must have at most `P` digits. A value
//! that passes the precision check always fits the row width, because every
//! width holds all `P`-digit integers of its precision band.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use eyre::{bail, Result};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::config::{
    DECIMAL128_MAX_PRECISION, DECIMAL256_MAX_PRECISION, DECIMAL32_MAX_PRECISION,
    DECIMAL64_MAX_PRECISION,
};
use crate::error::CodecError;

/// Row width in bytes for a decimal of `precision` digits.
pub fn decimal_width(precision: u8) -> usize {
    if precision <= DECIMAL32_MAX_PRECISION {
        4
    } else if precision <= DECIMAL64_MAX_PRECISION {
        8
    } else if precision <= DECIMAL128_MAX_PRECISION {
        16
    } else {
        32
    }
}

pub fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exp as usize)
}

fn digit_count(value: &BigInt) -> u64 {
    if value.is_zero() {
        1
    } else {
        value.magnitude().to_string().len() as u64
    }
}

/// Convert `unscaled * 10^-exponent` to an integer at `scale`, truncating
/// extra fractional digits toward zero.
pub fn rescale(unscaled: BigInt, exponent: i64, scale: u8) -> Result<BigInt> {
    let diff = i64::from(scale) - exponent;
    if diff >= 0 {
        if unscaled.is_zero() {
            return Ok(unscaled);
        }
        if diff > i64::from(DECIMAL256_MAX_PRECISION) {
            bail!(CodecError::overflow(format!(
                "{}e{} exceeds any decimal precision",
                unscaled, -exponent
            )));
        }
        Ok(unscaled * pow10(diff as u32))
    } else {
        let shift = diff.unsigned_abs();
        if shift > digit_count(&unscaled) {
            return Ok(BigInt::zero());
        }
        Ok(unscaled / pow10(shift as u32))
    }
}

/// Parse decimal text (`-12.5`, `1e3`, `'7'`) into an unscaled integer.
pub fn parse_decimal(text: &str, scale: u8) -> Result<BigInt> {
    let t = crate::parsing::unquote(text.trim());
    let parsed = match BigDecimal::from_str(t) {
        Ok(d) => d,
        Err(_) => bail!(CodecError::parse("Decimal", text)),
    };
    let (unscaled, exponent) = parsed.as_bigint_and_exponent();
    rescale(unscaled, exponent, scale)
}

/// Unscaled integer for a ready-made decimal value.
pub fn from_big_decimal(value: &BigDecimal, scale: u8) -> Result<BigInt> {
    let (unscaled, exponent) = value.as_bigint_and_exponent();
    rescale(unscaled, exponent, scale)
}

/// Unscaled integer for a whole number.
pub fn from_integer(value: BigInt, scale: u8) -> BigInt {
    value * pow10(u32::from(scale))
}

/// Reject unscaled values with more than `precision` digits.
pub fn check_precision(unscaled: &BigInt, precision: u8, scale: u8) -> Result<()> {
    if unscaled.abs() >= pow10(u32::from(precision)) {
        bail!(CodecError::overflow(format!(
            "{} has {} digits, Decimal({}, {}) allows {}",
            format_decimal(unscaled, scale),
            digit_count(unscaled),
            precision,
            scale,
            precision
        )));
    }
    Ok(())
}

/// Render an unscaled integer with exactly `scale` fractional digits.
pub fn format_decimal(unscaled: &BigInt, scale: u8) -> String {
    let digits = unscaled.magnitude().to_string();
    let scale = usize::from(scale);
    let mut out = String::with_capacity(digits.len() + scale + 3);
    if unscaled.is_negative() {
        out.push('-');
    }
    if scale == 0 {
        out.push_str(&digits);
        return out;
    }
    if digits.len() <= scale {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take(scale - digits.len()));
        out.push_str(&digits);
    } else {
        let (int, frac) = digits.split_at(digits.len() - scale);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn to_big_decimal(unscaled: BigInt, scale: u8) -> BigDecimal {
    BigDecimal::new(unscaled, i64::from(scale))
}
