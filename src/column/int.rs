//! # Native Integer Columns
//!
//! `Int8`…`Int128` and `UInt8`…`UInt128`, stored little-endian at their
//! native width.
//!
//! Values must be native integers. The first non-null value of a batch fixes
//! the accepted variant; every value is range-checked into the column type,
//! so `UInt8` accepts `Int64(200)` but not `Int64(300)` or `Int64(-1)`.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use eyre::{bail, Result};
use num_bigint::BigInt;

use super::FixedKind;
use crate::error::CodecError;
use crate::macros::impl_native_int;
use crate::parsing::unquote;
use crate::types::{Integer, KindGuard, Value};

/// Primitive integer backing an integer column.
pub trait NativeInt:
    Copy + Send + Sync + fmt::Debug + fmt::Display + FromStr + TryFrom<i128> + TryFrom<u128> + 'static
{
    const NAME: &'static str;
    const WIDTH: usize;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le(self, out: &mut [u8]);

    fn into_value(self) -> Value;
}

impl_native_int! {
    i8 => "Int8", Int8;
    i16 => "Int16", Int16;
    i32 => "Int32", Int32;
    i64 => "Int64", Int64;
    i128 => "Int128", Int128;
    u8 => "UInt8", UInt8;
    u16 => "UInt16", UInt16;
    u32 => "UInt32", UInt32;
    u64 => "UInt64", UInt64;
    u128 => "UInt128", UInt128;
}

/// Parse integer text, telling malformed text apart from out-of-range text.
pub(crate) fn parse_int_text<T: NativeInt>(text: &str) -> Result<T> {
    let t = unquote(text.trim());
    let t = t.strip_prefix('+').unwrap_or(t);
    match t.parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) if t.parse::<BigInt>().is_ok() => bail!(CodecError::overflow(format!(
            "{} is out of range for {}",
            t,
            T::NAME
        ))),
        Err(_) => bail!(CodecError::parse(T::NAME, text)),
    }
}

/// Range-check a native integer value into `T`.
pub(crate) fn convert_int<T: NativeInt>(value: &Value) -> Result<T> {
    let converted = match value.integer() {
        Some(Integer::Signed(v)) => T::try_from(v).ok(),
        Some(Integer::Unsigned(v)) => T::try_from(v).ok(),
        None => bail!(CodecError::mismatch(T::NAME, value.kind().to_string())),
    };
    match converted {
        Some(v) => Ok(v),
        None => bail!(CodecError::overflow(format!(
            "{:?} is out of range for {}",
            value,
            T::NAME
        ))),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntKind<T>(PhantomData<T>);

impl<T: NativeInt> IntKind<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: NativeInt> FixedKind for IntKind<T> {
    type TextState = ();

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn width(&self) -> usize {
        T::WIDTH
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        parse_int_text::<T>(text)?.write_le(out);
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, T::NAME, |k| k.is_native_integer())?;
        convert_int::<T>(value)?.write_le(out);
        Ok(())
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        T::read_le(row).into_value()
    }

    fn render(&self, row: &[u8]) -> String {
        T::read_le(row).to_string()
    }
}
