//! # Floating-Point Columns
//!
//! `Float32`/`Float64`, IEEE 754 little-endian. Text accepts the usual
//! decimal and exponent forms plus `inf`, `-inf` and `nan` in any case.
//! Values must be floats; a batch is locked to the first float width seen.

use std::fmt;
use std::marker::PhantomData;

use eyre::{bail, Result};

use super::FixedKind;
use crate::error::CodecError;
use crate::parsing::unquote;
use crate::types::{KindGuard, Value};

pub trait NativeFloat: Copy + Send + fmt::Debug + fmt::Display + 'static {
    const NAME: &'static str;
    const WIDTH: usize;

    fn parse(text: &str) -> Option<Self>;

    fn from_value(value: &Value) -> Option<Self>;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le(self, out: &mut [u8]);

    fn into_value(self) -> Value;
}

impl NativeFloat for f32 {
    const NAME: &'static str = "Float32";
    const WIDTH: usize = 4;

    fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Float32(v) => Some(v),
            Value::Float64(v) => Some(v as f32),
            _ => None,
        }
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(bytes);
        f32::from_le_bytes(buf)
    }

    fn write_le(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }

    fn into_value(self) -> Value {
        Value::Float32(self)
    }
}

impl NativeFloat for f64 {
    const NAME: &'static str = "Float64";
    const WIDTH: usize = 8;

    fn parse(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match *value {
            Value::Float32(v) => Some(f64::from(v)),
            Value::Float64(v) => Some(v),
            _ => None,
        }
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        f64::from_le_bytes(buf)
    }

    fn write_le(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }

    fn into_value(self) -> Value {
        Value::Float64(self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatKind<T>(PhantomData<T>);

impl<T: NativeFloat> FloatKind<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: NativeFloat> FixedKind for FloatKind<T> {
    type TextState = ();

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn width(&self) -> usize {
        T::WIDTH
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        let t = unquote(text.trim());
        match T::parse(t) {
            Some(v) => {
                v.write_le(out);
                Ok(())
            }
            None => bail!(CodecError::parse(T::NAME, text)),
        }
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, T::NAME, |k| k.is_float())?;
        match T::from_value(value) {
            Some(v) => {
                v.write_le(out);
                Ok(())
            }
            None => bail!(CodecError::mismatch(T::NAME, value.kind().to_string())),
        }
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        T::read_le(row).into_value()
    }

    fn render(&self, row: &[u8]) -> String {
        T::read_le(row).to_string()
    }
}
