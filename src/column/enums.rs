//! # Enum Columns
//!
//! `Enum8`/`Enum16` rows store the entry's signed value (`i8` or `i16`).
//! Text may name an entry or give its number; values may be `Text` names
//! or native integers. Either way the entry must exist in the table.
//!
//! Empty and null input take the first declared entry, not the number 0,
//! which may not be a member.

use std::sync::Arc;

use eyre::{bail, Result};

use super::int::convert_int;
use super::FixedKind;
use crate::error::CodecError;
use crate::parsing::string_payload;
use crate::types::{EnumTable, EnumWidth, KindGuard, Value, ValueKind};

#[derive(Debug, Clone)]
pub struct EnumKind {
    table: Arc<EnumTable>,
}

impl EnumKind {
    pub fn new(table: Arc<EnumTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &EnumTable {
        &self.table
    }

    fn store(&self, value: i16, out: &mut [u8]) {
        match self.table.width() {
            EnumWidth::Bits8 => out[0] = value as i8 as u8,
            EnumWidth::Bits16 => out.copy_from_slice(&value.to_le_bytes()),
        }
    }

    fn load(&self, row: &[u8]) -> i16 {
        match self.table.width() {
            EnumWidth::Bits8 => i16::from(row[0] as i8),
            EnumWidth::Bits16 => i16::from_le_bytes([row[0], row[1]]),
        }
    }

    fn member(&self, value: i16, input: &str) -> Result<i16> {
        if self.table.contains_value(value) {
            Ok(value)
        } else {
            bail!(CodecError::parse(self.table.width().name(), input))
        }
    }

    fn lookup_name(&self, name: &str) -> Result<i16> {
        match self.table.value_of(name) {
            Some(v) => Ok(v),
            None => bail!(CodecError::parse(self.table.width().name(), name)),
        }
    }
}

impl FixedKind for EnumKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        self.table.width().name()
    }

    fn width(&self) -> usize {
        self.table.width().bytes()
    }

    fn write_zero(&self, out: &mut [u8]) {
        self.store(self.table.default_value(), out);
    }

    fn parse_text(&self, text: &str, _state: &mut (), out: &mut [u8]) -> Result<()> {
        let payload = string_payload(text.trim());
        let value = match self.table.value_of(&payload) {
            Some(v) => v,
            None => match payload.parse::<i16>() {
                Ok(v) => self.member(v, text)?,
                Err(_) => bail!(CodecError::parse(self.table.width().name(), text)),
            },
        };
        self.store(value, out);
        Ok(())
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, self.name(), |k| {
            k == ValueKind::Text || k.is_native_integer()
        })?;
        let entry = match value {
            Value::Text(name) => self.lookup_name(name)?,
            other => {
                let v = convert_int::<i16>(other)?;
                self.member(v, &v.to_string())?
            }
        };
        self.store(entry, out);
        Ok(())
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        let v = self.load(row);
        match self.table.name_of(v) {
            Some(name) => Value::Text(name.to_string()),
            None => Value::Int16(v),
        }
    }

    fn render(&self, row: &[u8]) -> String {
        let v = self.load(row);
        match self.table.name_of(v) {
            Some(name) => name.to_string(),
            None => v.to_string(),
        }
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnCodec, FixedColumn};
    use crate::error::ErrorKind;
    use crate::memory::BufferPool;

    fn column(args: &str, width: EnumWidth, rows: usize) -> FixedColumn<EnumKind> {
        let table = Arc::new(EnumTable::parse(args, width).unwrap());
        FixedColumn::new(&BufferPool::new(2), rows, EnumKind::new(table))
    }

    #[test]
    fn names_and_numbers() {
        let mut col = column("'a' = 1, 'b' = -2", EnumWidth::Bits8, 3);
        col.fill_from_texts(&["a", "'b'", "-2"]).unwrap();
        assert_eq!(col.as_bytes(), &[1, 0xFE, 0xFE]);
        assert_eq!(col.text(1), "b");
        assert_eq!(col.nested_text(0), "'a'");
        assert_eq!(col.value(2), Value::Text("b".into()));
    }

    #[test]
    fn zero_is_first_entry() {
        let col = column("'x' = 5, 'y' = 6", EnumWidth::Bits16, 2);
        assert_eq!(col.raw_row(0), &5i16.to_le_bytes());
        assert_eq!(col.zero_text(), "x");
        assert_eq!(col.text(1), "x");
    }

    #[test]
    fn unknown_members_fail() {
        let mut col = column("'a' = 1", EnumWidth::Bits8, 2);
        let err = col.fill_from_texts(&["a", "c"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));
        assert!(col.fill_from_texts(&["2"]).is_err());
        assert!(col.fill_from_values(&[Value::Int8(3)]).is_err());
    }

    #[test]
    fn values() {
        let mut col = column("'a' = 1, 'b' = 300", EnumWidth::Bits16, 2);
        col.fill_from_values(&[Value::Text("b".into()), Value::Text("a".into())])
            .unwrap();
        assert_eq!(col.raw_row(0), &300i16.to_le_bytes());
        col.fill_from_values(&[Value::Int64(1)]).unwrap();
        assert_eq!(col.text(0), "a");
    }
}
