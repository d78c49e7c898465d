//! # Native Values
//!
//! `Value` is the closed set of in-memory values a codec accepts from
//! `fill_from_values` and returns from `value(row)`.
//!
//! ## Variants
//!
//! | Group      | Variants                                                   |
//! |------------|------------------------------------------------------------|
//! | absent     | `Null`                                                     |
//! | integers   | `Int8`…`Int128`, `UInt8`…`UInt128`, `BigInt` (256-bit)     |
//! | floats     | `Float32`, `Float64`                                       |
//! | fixed-point| `Decimal`                                                  |
//! | text       | `Text`, `Bytes`                                            |
//! | temporal   | `Date`, `DateTime` (zoned), `Time` (since midnight)        |
//! | addresses  | `Uuid`, `Ipv4`, `Ipv6`                                     |
//! | containers | `Array`, `Map` (ordered pairs), `Tuple`, `Bitmap`          |
//!
//! ## Batch Width Inference
//!
//! Integer and float columns lock the accepted variant to the first non-null
//! value of a batch ([`KindGuard`]). A column seeded with `Int16` rejects a
//! later `Int8` in the same batch rather than silently widening it.
//!
//! ## Hashing
//!
//! Dictionary encoding needs values as hash keys. [`DictKey`] hashes floats by
//! their bit pattern and compares them the same way, so `NaN` deduplicates.

use std::hash::{Hash, Hasher};
use std::net::{Ipv4Addr, Ipv6Addr};

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, TimeDelta};
use chrono_tz::Tz;
use eyre::{bail, Result};
use num_bigint::BigInt;
use roaring::RoaringTreemap;
use uuid::Uuid;

use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    BigInt(BigInt),
    Float32(f32),
    Float64(f64),
    Decimal(BigDecimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(DateTime<Tz>),
    Time(TimeDelta),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    Bitmap(RoaringTreemap),
}

/// Payload-free mirror of [`Value`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    BigInt,
    Float32,
    Float64,
    Decimal,
    Text,
    Bytes,
    Date,
    DateTime,
    Time,
    Uuid,
    Ipv4,
    Ipv6,
    Array,
    Map,
    Tuple,
    Bitmap,
}

impl ValueKind {
    pub fn is_native_integer(self) -> bool {
        matches!(
            self,
            ValueKind::Int8
                | ValueKind::Int16
                | ValueKind::Int32
                | ValueKind::Int64
                | ValueKind::Int128
                | ValueKind::UInt8
                | ValueKind::UInt16
                | ValueKind::UInt32
                | ValueKind::UInt64
                | ValueKind::UInt128
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ValueKind::Float32 | ValueKind::Float64)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// An integer payload widened without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    Signed(i128),
    Unsigned(u128),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int8(_) => ValueKind::Int8,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Int128(_) => ValueKind::Int128,
            Value::UInt8(_) => ValueKind::UInt8,
            Value::UInt16(_) => ValueKind::UInt16,
            Value::UInt32(_) => ValueKind::UInt32,
            Value::UInt64(_) => ValueKind::UInt64,
            Value::UInt128(_) => ValueKind::UInt128,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::Float32(_) => ValueKind::Float32,
            Value::Float64(_) => ValueKind::Float64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Time(_) => ValueKind::Time,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Ipv4(_) => ValueKind::Ipv4,
            Value::Ipv6(_) => ValueKind::Ipv6,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Bitmap(_) => ValueKind::Bitmap,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Native integer payload, if this is one of the fixed-width integer
    /// variants.
    pub fn integer(&self) -> Option<Integer> {
        let int = match *self {
            Value::Int8(v) => Integer::Signed(v.into()),
            Value::Int16(v) => Integer::Signed(v.into()),
            Value::Int32(v) => Integer::Signed(v.into()),
            Value::Int64(v) => Integer::Signed(v.into()),
            Value::Int128(v) => Integer::Signed(v),
            Value::UInt8(v) => Integer::Unsigned(v.into()),
            Value::UInt16(v) => Integer::Unsigned(v.into()),
            Value::UInt32(v) => Integer::Unsigned(v.into()),
            Value::UInt64(v) => Integer::Unsigned(v.into()),
            Value::UInt128(v) => Integer::Unsigned(v),
            _ => return None,
        };
        Some(int)
    }

    /// Any integer variant, including `BigInt`, as an arbitrary-precision
    /// integer.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Value::BigInt(v) => Some(v.clone()),
            other => other.integer().map(|int| match int {
                Integer::Signed(v) => BigInt::from(v),
                Integer::Unsigned(v) => BigInt::from(v),
            }),
        }
    }

    /// Text or raw bytes payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Text(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Feed this value into `hasher`, hashing floats by bit pattern.
    pub fn hash_to<H: Hasher>(&self, hasher: &mut H) {
        std::mem::discriminant(self).hash(hasher);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(hasher),
            Value::Int8(v) => v.hash(hasher),
            Value::Int16(v) => v.hash(hasher),
            Value::Int32(v) => v.hash(hasher),
            Value::Int64(v) => v.hash(hasher),
            Value::Int128(v) => v.hash(hasher),
            Value::UInt8(v) => v.hash(hasher),
            Value::UInt16(v) => v.hash(hasher),
            Value::UInt32(v) => v.hash(hasher),
            Value::UInt64(v) => v.hash(hasher),
            Value::UInt128(v) => v.hash(hasher),
            Value::BigInt(v) => v.hash(hasher),
            Value::Float32(v) => v.to_bits().hash(hasher),
            Value::Float64(v) => v.to_bits().hash(hasher),
            Value::Decimal(v) => v.hash(hasher),
            Value::Text(v) => v.hash(hasher),
            Value::Bytes(v) => v.hash(hasher),
            Value::Date(v) => v.hash(hasher),
            Value::DateTime(v) => v.timestamp_nanos_opt().hash(hasher),
            Value::Time(v) => v.hash(hasher),
            Value::Uuid(v) => v.hash(hasher),
            Value::Ipv4(v) => v.hash(hasher),
            Value::Ipv6(v) => v.hash(hasher),
            Value::Array(items) | Value::Tuple(items) => {
                items.len().hash(hasher);
                for item in items {
                    item.hash_to(hasher);
                }
            }
            Value::Map(pairs) => {
                pairs.len().hash(hasher);
                for (k, v) in pairs {
                    k.hash_to(hasher);
                    v.hash_to(hasher);
                }
            }
            Value::Bitmap(bitmap) => {
                bitmap.len().hash(hasher);
                for v in bitmap.iter() {
                    v.hash(hasher);
                }
            }
        }
    }

    /// Equality with floats compared by bit pattern.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Array(a), Value::Array(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.same_as(kb) && va.same_as(vb))
            }
            (a, b) => a == b,
        }
    }
}

/// Borrowed hash-map key over a [`Value`].
#[derive(Debug, Clone, Copy)]
pub struct DictKey<'a>(pub &'a Value);

impl Hash for DictKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_to(state);
    }
}

impl PartialEq for DictKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_as(other.0)
    }
}

impl Eq for DictKey<'_> {}

/// Locks the accepted variant of a batch to its first non-null value.
#[derive(Debug, Default, Clone)]
pub struct KindGuard {
    locked: Option<ValueKind>,
}

impl KindGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locked(&self) -> Option<ValueKind> {
        self.locked
    }

    /// Admit `value` into the batch. The first admitted value must satisfy
    /// `accepts`; later values must share its variant exactly.
    pub fn admit(
        &mut self,
        value: &Value,
        column: &str,
        accepts: impl Fn(ValueKind) -> bool,
    ) -> Result<()> {
        let kind = value.kind();
        match self.locked {
            None => {
                if !accepts(kind) {
                    bail!(CodecError::mismatch(column, kind.to_string()));
                }
                self.locked = Some(kind);
            }
            Some(locked) if locked == kind => {}
            Some(locked) => bail!(CodecError::mismatch(
                format!("{} (batch seeded with {})", column, locked),
                kind.to_string()
            )),
        }
        Ok(())
    }
}

macro_rules! impl_value_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    i128 => Int128,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    u128 => UInt128,
    f32 => Float32,
    f64 => Float64,
    BigInt => BigInt,
    BigDecimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    DateTime<Tz> => DateTime,
    TimeDelta => Time,
    Uuid => Uuid,
    Ipv4Addr => Ipv4,
    Ipv6Addr => Ipv6,
    RoaringTreemap => Bitmap,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    #[test]
    fn integer_widening_is_lossless() {
        assert_eq!(Value::Int8(-3).integer(), Some(Integer::Signed(-3)));
        assert_eq!(
            Value::UInt128(u128::MAX).integer(),
            Some(Integer::Unsigned(u128::MAX))
        );
        assert_eq!(Value::Float64(1.0).integer(), None);
        assert_eq!(Value::UInt64(7).to_bigint(), Some(BigInt::from(7)));
    }

    #[test]
    fn guard_locks_first_non_null_kind() {
        let mut guard = KindGuard::new();
        let ints = |k: ValueKind| k.is_native_integer();

        guard.admit(&Value::Int16(1), "Int32", ints).unwrap();
        guard.admit(&Value::Int16(2), "Int32", ints).unwrap();
        let err = guard.admit(&Value::Int8(3), "Int32", ints).unwrap_err();
        assert!(err.to_string().contains("Int16"));
        assert_eq!(guard.locked(), Some(ValueKind::Int16));
    }

    #[test]
    fn guard_rejects_unaccepted_seed() {
        let mut guard = KindGuard::new();
        assert!(guard
            .admit(&Value::Text("1".into()), "Int8", |k| k.is_native_integer())
            .is_err());
        assert_eq!(guard.locked(), None);
    }

    #[test]
    fn dict_keys_dedupe_nan_and_nested() {
        let nan = Value::Float64(f64::NAN);
        let arr_a = Value::Array(vec![Value::Int8(1), Value::Float32(f32::NAN)]);
        let arr_b = Value::Array(vec![Value::Int8(1), Value::Float32(f32::NAN)]);

        let mut map: HashMap<DictKey<'_>, usize> = HashMap::new();
        map.insert(DictKey(&nan), 0);
        map.insert(DictKey(&arr_a), 1);
        assert_eq!(map.get(&DictKey(&Value::Float64(f64::NAN))), Some(&0));
        assert_eq!(map.get(&DictKey(&arr_b)), Some(&1));
        assert_eq!(map.get(&DictKey(&Value::Float64(0.0))), None);
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(5u8), Value::UInt8(5));
        assert_eq!(Value::from("x"), Value::Text("x".into()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(2i64)), Value::Int64(2));
    }
}
