//! `FixedString(N)`: exactly `N` bytes per row, zero-padded on the right.
//! Rendering drops the trailing zero bytes.

use eyre::{bail, Result};

use super::FixedKind;
use crate::error::CodecError;
use crate::parsing::string_payload;
use crate::types::{KindGuard, Value};

#[derive(Debug, Clone, Copy)]
pub struct FixedStringKind {
    len: usize,
}

impl FixedStringKind {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    fn store(&self, bytes: &[u8], out: &mut [u8]) -> Result<()> {
        if bytes.len() > self.len {
            bail!(CodecError::overflow(format!(
                "{} bytes do not fit FixedString({})",
                bytes.len(),
                self.len
            )));
        }
        out[..bytes.len()].copy_from_slice(bytes);
        out[bytes.len()..].fill(0);
        Ok(())
    }

    fn trimmed<'a>(&self, row: &'a [u8]) -> &'a [u8] {
        let end = row.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &row[..end]
    }
}

impl FixedKind for FixedStringKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "FixedString"
    }

    fn width(&self) -> usize {
        self.len
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        self.store(string_payload(text).as_bytes(), out)
    }

    /// Text and bytes may mix within a batch.
    fn encode_value(&self, value: &Value, _guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        match value.as_bytes() {
            Some(bytes) => self.store(bytes, out),
            None => bail!(CodecError::mismatch("FixedString", value.kind().to_string())),
        }
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        let bytes = self.trimmed(row);
        match std::str::from_utf8(bytes) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::Bytes(bytes.to_vec()),
        }
    }

    fn render(&self, row: &[u8]) -> String {
        String::from_utf8_lossy(self.trimmed(row)).into_owned()
    }

    fn quoted(&self) -> bool {
        true
    }

    fn verbatim_text(&self) -> bool {
        true
    }
}
