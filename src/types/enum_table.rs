//! # Enum Tables
//!
//! Bidirectional name/value mapping for `Enum8` and `Enum16` columns, built
//! once from the descriptor and shared read-only (`Arc<EnumTable>`) by every
//! codec stamped from the same blueprint.
//!
//! ```text
//! Enum8('a' = 1, 'b' = 2, 'c')      'c' takes the next value, 3
//! ```
//!
//! Names and values must both be unique, and values must fit the declared
//! width (`i8` or `i16`).

use hashbrown::HashMap;

use eyre::{bail, Result};

use super::DescriptorError;
use crate::parsing::{split_fields, string_payload, strip_quotes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumWidth {
    Bits8,
    Bits16,
}

impl EnumWidth {
    pub fn bytes(self) -> usize {
        match self {
            EnumWidth::Bits8 => 1,
            EnumWidth::Bits16 => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnumWidth::Bits8 => "Enum8",
            EnumWidth::Bits16 => "Enum16",
        }
    }

    fn contains(self, value: i64) -> bool {
        match self {
            EnumWidth::Bits8 => i8::try_from(value).is_ok(),
            EnumWidth::Bits16 => i16::try_from(value).is_ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumTable {
    width: EnumWidth,
    entries: Vec<(String, i16)>,
    by_name: HashMap<String, i16>,
    by_value: HashMap<i16, usize>,
}

impl PartialEq for EnumTable {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.entries == other.entries
    }
}

impl Eq for EnumTable {}

impl EnumTable {
    /// Build from the argument list of an `Enum8(...)`/`Enum16(...)`
    /// descriptor.
    pub fn parse(args: &str, width: EnumWidth) -> Result<Self> {
        let fields = split_fields(args, b',')?;
        if fields.is_empty() {
            bail!(DescriptorError::new(args, "enum needs at least one entry"));
        }

        let mut entries = Vec::with_capacity(fields.len());
        let mut next: i64 = 1;
        for field in fields {
            let (name, value) = match split_fields(field, b'=')?.as_slice() {
                [name] => (*name, None),
                [name, value] => (*name, Some(*value)),
                _ => bail!(DescriptorError::new(field, "expected 'name' = value")),
            };
            if !strip_quotes(name).1 {
                bail!(DescriptorError::new(field, "enum name must be quoted"));
            }
            let value = match value {
                Some(text) => match text.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => bail!(DescriptorError::new(text, "malformed enum value")),
                },
                None => next,
            };
            next = value + 1;
            entries.push((string_payload(name).into_owned(), value));
        }
        Self::from_entries(entries, width)
    }

    pub fn from_entries(entries: Vec<(String, i64)>, width: EnumWidth) -> Result<Self> {
        let mut table = Self {
            width,
            entries: Vec::with_capacity(entries.len()),
            by_name: HashMap::with_capacity(entries.len()),
            by_value: HashMap::with_capacity(entries.len()),
        };
        for (name, value) in entries {
            if !width.contains(value) {
                bail!(DescriptorError::new(
                    format!("'{}' = {}", name, value),
                    format!("value out of range for {}", width.name())
                ));
            }
            let value = value as i16;
            if table.by_name.contains_key(&name) {
                bail!(DescriptorError::new(name, "duplicate enum name"));
            }
            if table.by_value.contains_key(&value) {
                bail!(DescriptorError::new(
                    format!("'{}' = {}", name, value),
                    "duplicate enum value"
                ));
            }
            table.by_value.insert(value, table.entries.len());
            table.by_name.insert(name.clone(), value);
            table.entries.push((name, value));
        }
        Ok(table)
    }

    pub fn width(&self) -> EnumWidth {
        self.width
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, i16)] {
        &self.entries
    }

    pub fn value_of(&self, name: &str) -> Option<i16> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, value: i16) -> Option<&str> {
        self.by_value
            .get(&value)
            .map(|&idx| self.entries[idx].0.as_str())
    }

    pub fn contains_value(&self, value: i16) -> bool {
        self.by_value.contains_key(&value)
    }

    /// Value written for empty and null input: the first declared entry.
    pub fn default_value(&self) -> i16 {
        self.entries.first().map_or(0, |(_, v)| *v)
    }
}
