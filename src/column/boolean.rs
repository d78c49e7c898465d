//! `Bool` columns: one byte per row, 0 or 1.

use eyre::{bail, Result};

use super::FixedKind;
use crate::error::CodecError;
use crate::parsing::parse_bool;
use crate::types::{KindGuard, Value, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolKind;

impl FixedKind for BoolKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "Bool"
    }

    fn width(&self) -> usize {
        1
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        out[0] = u8::from(parse_bool(text)?);
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "Bool", |k| k == ValueKind::Bool)?;
        match value {
            Value::Bool(b) => {
                out[0] = u8::from(*b);
                Ok(())
            }
            other => bail!(CodecError::mismatch("Bool", other.kind().to_string())),
        }
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Bool(row[0] != 0)
    }

    fn render(&self, row: &[u8]) -> String {
        if row[0] != 0 { "true" } else { "false" }.to_string()
    }
}
