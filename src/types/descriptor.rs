//! # Type Descriptor Parser
//!
//! Turns descriptor text such as `Array(Nullable(Decimal(18, 4)))` into a
//! [`ColumnBlueprint`]. Parsing is recursive: a container's argument list is
//! split with the tokenizer and each argument parsed as its own descriptor.
//!
//! ## Grammar
//!
//! ```text
//! descriptor := name | name '(' args ')'
//! args       := arg (',' arg)*        split at depth 0, outside quotes
//! arg        := descriptor | ident ' ' descriptor
//! ```
//!
//! ## Supported Names
//!
//! | Name                                   | Arguments                        |
//! |----------------------------------------|----------------------------------|
//! | `Int8`…`Int256`, `UInt8`…`UInt256`     | none                             |
//! | `Float32`, `Float64`, `Bool`/`Boolean` | none                             |
//! | `String`, `UUID`, `IPv4`, `IPv6`       | none                             |
//! | `Date`, `Date32`                       | none                             |
//! | `DateTime`                             | optional `'zone'`                |
//! | `DateTime64`                           | precision, optional `'zone'`     |
//! | `Time`                                 | optional scale                   |
//! | `Decimal`                              | optional precision, scale        |
//! | `Decimal32/64/128/256`                 | scale                            |
//! | `FixedString`                          | byte length                      |
//! | `Enum8`, `Enum16`                      | `'name' = value` list            |
//! | `Array`, `Nullable`, `LowCardinality`  | one descriptor                   |
//! | `Map`                                  | key and value descriptors        |
//! | `Tuple`                                | one or more descriptors          |
//! | `AggregateFunction`, `SimpleAggregateFunction` | function, descriptor     |
//! | `BitMap64`                             | none                             |
//!
//! A named element (`a Int32`, as in `Tuple(a Int32, b String)`) is accepted
//! by retrying the parse after the first space. Aggregate-function
//! descriptors contribute only their second argument.
//!
//! Any failure, at any depth, fails the whole parse with a
//! [`DescriptorError`] naming the fragment that could not be parsed.

use std::fmt;
use std::sync::Arc;

use chrono_tz::Tz;
use eyre::{bail, Result};

use super::blueprint::ColumnBlueprint;
use super::enum_table::{EnumTable, EnumWidth};
use crate::config::{
    DECIMAL128_MAX_PRECISION, DECIMAL256_MAX_PRECISION, DECIMAL32_MAX_PRECISION,
    DECIMAL64_MAX_PRECISION, DEFAULT_DATETIME64_PRECISION, DEFAULT_DECIMAL_PRECISION,
    MAX_DATETIME64_PRECISION,
};
use crate::parsing::{split_fields, strip_quotes, Fields};

/// A descriptor fragment that could not be turned into a column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorError {
    pub fragment: String,
    pub reason: String,
}

impl DescriptorError {
    pub fn new(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid column type '{}': {}",
            self.fragment, self.reason
        )
    }
}

impl std::error::Error for DescriptorError {}

/// Parse a complete descriptor.
pub fn parse_descriptor(text: &str) -> Result<ColumnBlueprint> {
    let t = text.trim();
    if t.is_empty() {
        bail!(DescriptorError::new(text, "empty type name"));
    }

    let Some(open) = t.find('(') else {
        return parse_simple(t);
    };
    let Some(args) = t[open + 1..].strip_suffix(')') else {
        bail!(DescriptorError::new(t, "missing closing ')'"));
    };
    let name = t[..open].trim();

    let blueprint = match name {
        "Array" => ColumnBlueprint::Array(Box::new(parse_single_child(t, args)?)),
        "Nullable" => ColumnBlueprint::Nullable(Box::new(parse_single_child(t, args)?)),
        "LowCardinality" => parse_low_cardinality(t, args)?,
        "Map" => {
            let children = parse_children(t, args)?;
            let [key, value]: [ColumnBlueprint; 2] = match children.try_into() {
                Ok(pair) => pair,
                Err(_) => bail!(DescriptorError::new(t, "Map takes exactly two types")),
            };
            ColumnBlueprint::Map(Box::new(key), Box::new(value))
        }
        "Tuple" => {
            let children = parse_children(t, args)?;
            if children.is_empty() {
                bail!(DescriptorError::new(t, "Tuple needs at least one element"));
            }
            ColumnBlueprint::Tuple(children)
        }
        "AggregateFunction" | "SimpleAggregateFunction" => {
            let fields = split_args(t, args)?;
            if fields.len() != 2 {
                bail!(DescriptorError::new(
                    t,
                    format!("{} takes exactly two arguments, got {}", name, fields.len())
                ));
            }
            parse_child(fields[1])?
        }
        "FixedString" => {
            let len = parse_number::<usize>(t, args.trim())?;
            if len == 0 {
                bail!(DescriptorError::new(t, "FixedString length must be positive"));
            }
            ColumnBlueprint::FixedString(len)
        }
        "Enum8" => ColumnBlueprint::Enum(Arc::new(EnumTable::parse(args, EnumWidth::Bits8)?)),
        "Enum16" => ColumnBlueprint::Enum(Arc::new(EnumTable::parse(args, EnumWidth::Bits16)?)),
        "Decimal" => parse_decimal(t, args)?,
        "Decimal32" => decimal_alias(t, args, DECIMAL32_MAX_PRECISION)?,
        "Decimal64" => decimal_alias(t, args, DECIMAL64_MAX_PRECISION)?,
        "Decimal128" => decimal_alias(t, args, DECIMAL128_MAX_PRECISION)?,
        "Decimal256" => decimal_alias(t, args, DECIMAL256_MAX_PRECISION)?,
        "DateTime" => {
            let fields = split_args(t, args)?;
            match fields.as_slice() {
                [] => ColumnBlueprint::DateTime(None),
                [zone] => ColumnBlueprint::DateTime(Some(parse_time_zone(t, zone)?)),
                _ => bail!(DescriptorError::new(t, "DateTime takes at most a time zone")),
            }
        }
        "DateTime64" => {
            let fields = split_args(t, args)?;
            let (precision, time_zone) = match fields.as_slice() {
                [p] => (parse_number::<u8>(t, p)?, None),
                [p, zone] => (parse_number::<u8>(t, p)?, Some(parse_time_zone(t, zone)?)),
                _ => bail!(DescriptorError::new(
                    t,
                    "DateTime64 takes a precision and an optional time zone"
                )),
            };
            if precision > MAX_DATETIME64_PRECISION {
                bail!(DescriptorError::new(
                    t,
                    format!("precision must be at most {}", MAX_DATETIME64_PRECISION)
                ));
            }
            ColumnBlueprint::DateTime64 {
                precision,
                time_zone,
            }
        }
        "Time" => {
            let scale = if args.trim().is_empty() {
                0
            } else {
                parse_number::<u8>(t, args.trim())?
            };
            if scale > MAX_DATETIME64_PRECISION {
                bail!(DescriptorError::new(
                    t,
                    format!("scale must be at most {}", MAX_DATETIME64_PRECISION)
                ));
            }
            ColumnBlueprint::Time { scale }
        }
        _ => bail!(DescriptorError::new(t, "unsupported type")),
    };
    Ok(blueprint)
}

fn parse_simple(name: &str) -> Result<ColumnBlueprint> {
    let blueprint = match name {
        "Int8" => ColumnBlueprint::Int8,
        "Int16" => ColumnBlueprint::Int16,
        "Int32" => ColumnBlueprint::Int32,
        "Int64" => ColumnBlueprint::Int64,
        "Int128" => ColumnBlueprint::Int128,
        "Int256" => ColumnBlueprint::Int256,
        "UInt8" => ColumnBlueprint::UInt8,
        "UInt16" => ColumnBlueprint::UInt16,
        "UInt32" => ColumnBlueprint::UInt32,
        "UInt64" => ColumnBlueprint::UInt64,
        "UInt128" => ColumnBlueprint::UInt128,
        "UInt256" => ColumnBlueprint::UInt256,
        "Float32" => ColumnBlueprint::Float32,
        "Float64" => ColumnBlueprint::Float64,
        "Bool" | "Boolean" => ColumnBlueprint::Bool,
        "String" => ColumnBlueprint::String,
        "UUID" => ColumnBlueprint::Uuid,
        "IPv4" => ColumnBlueprint::Ipv4,
        "IPv6" => ColumnBlueprint::Ipv6,
        "Date" => ColumnBlueprint::Date,
        "Date32" => ColumnBlueprint::Date32,
        "DateTime" => ColumnBlueprint::DateTime(None),
        "DateTime64" => ColumnBlueprint::DateTime64 {
            precision: DEFAULT_DATETIME64_PRECISION,
            time_zone: None,
        },
        "Time" => ColumnBlueprint::Time { scale: 0 },
        "Decimal" => ColumnBlueprint::Decimal {
            precision: DEFAULT_DECIMAL_PRECISION,
            scale: 0,
        },
        "BitMap64" | "Bitmap64" => ColumnBlueprint::BitMap64,
        _ => bail!(DescriptorError::new(name, "unsupported type")),
    };
    Ok(blueprint)
}

/// Parse a child argument, retrying without a leading element name.
fn parse_child(arg: &str) -> Result<ColumnBlueprint> {
    let arg = arg.trim();
    match parse_descriptor(arg) {
        Ok(blueprint) => Ok(blueprint),
        Err(first) => match arg.split_once(' ') {
            Some((_, rest)) if !rest.trim().is_empty() => parse_descriptor(rest).map_err(|_| first),
            _ => Err(first),
        },
    }
}

/// Split an argument list, reporting bracket and quote errors against the
/// whole descriptor.
fn split_args<'a>(whole: &str, args: &'a str) -> Result<Fields<'a>> {
    match split_fields(args, b',') {
        Ok(fields) => Ok(fields),
        Err(e) => bail!(DescriptorError::new(whole, e.to_string())),
    }
}

fn parse_children(whole: &str, args: &str) -> Result<Vec<ColumnBlueprint>> {
    let fields = split_args(whole, args)?;
    let mut children = Vec::with_capacity(fields.len());
    for field in fields {
        if field.is_empty() {
            bail!(DescriptorError::new(whole, "empty type argument"));
        }
        children.push(parse_child(field)?);
    }
    Ok(children)
}

fn parse_single_child(whole: &str, args: &str) -> Result<ColumnBlueprint> {
    let mut children = parse_children(whole, args)?;
    if children.len() != 1 {
        bail!(DescriptorError::new(whole, "expected exactly one type argument"));
    }
    Ok(children.remove(0))
}

fn parse_low_cardinality(whole: &str, args: &str) -> Result<ColumnBlueprint> {
    let inner = parse_single_child(whole, args)?;
    let keys = match &inner {
        ColumnBlueprint::Nullable(keys) => keys.as_ref(),
        other => other,
    };
    if !keys.is_dictionary_key() {
        bail!(DescriptorError::new(
            whole,
            "LowCardinality requires a scalar or Nullable scalar type"
        ));
    }
    Ok(ColumnBlueprint::LowCardinality(Box::new(inner)))
}

fn parse_number<T: std::str::FromStr>(whole: &str, text: &str) -> Result<T> {
    match text.trim().parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => bail!(DescriptorError::new(
            whole,
            format!("malformed numeric argument '{}'", text.trim())
        )),
    }
}

fn parse_time_zone(whole: &str, text: &str) -> Result<Tz> {
    let (name, quoted) = strip_quotes(text.trim());
    if !quoted {
        bail!(DescriptorError::new(whole, "time zone must be quoted"));
    }
    match name.parse::<Tz>() {
        Ok(tz) => Ok(tz),
        Err(_) => bail!(DescriptorError::new(
            whole,
            format!("unknown time zone '{}'", name)
        )),
    }
}

fn decimal_blueprint(whole: &str, precision: u8, scale: u8) -> Result<ColumnBlueprint> {
    if precision == 0 || precision > DECIMAL256_MAX_PRECISION {
        bail!(DescriptorError::new(
            whole,
            format!("precision must be in 1..={}", DECIMAL256_MAX_PRECISION)
        ));
    }
    if scale > precision {
        bail!(DescriptorError::new(whole, "scale exceeds precision"));
    }
    Ok(ColumnBlueprint::Decimal { precision, scale })
}

fn parse_decimal(whole: &str, args: &str) -> Result<ColumnBlueprint> {
    let fields = split_args(whole, args)?;
    let (precision, scale) = match fields.as_slice() {
        [] => (DEFAULT_DECIMAL_PRECISION, 0),
        [p] => (parse_number::<u8>(whole, p)?, 0),
        [p, s] => (parse_number::<u8>(whole, p)?, parse_number::<u8>(whole, s)?),
        _ => bail!(DescriptorError::new(
            whole,
            "Decimal takes a precision and a scale"
        )),
    };
    decimal_blueprint(whole, precision, scale)
}

fn decimal_alias(whole: &str, args: &str, precision: u8) -> Result<ColumnBlueprint> {
    let scale = parse_number::<u8>(whole, args)?;
    decimal_blueprint(whole, precision, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ColumnBlueprint {
        parse_descriptor(text).unwrap()
    }

    fn fragment(text: &str) -> String {
        let err = parse_descriptor(text).unwrap_err();
        err.downcast_ref::<DescriptorError>()
            .map(|e| e.fragment.clone())
            .unwrap_or_else(|| panic!("not a descriptor error: {err:#}"))
    }

    #[test]
    fn simple_names() {
        assert_eq!(parse("UInt8"), ColumnBlueprint::UInt8);
        assert_eq!(parse(" Boolean "), ColumnBlueprint::Bool);
        assert_eq!(parse("IPv6"), ColumnBlueprint::Ipv6);
        assert_eq!(
            parse("Decimal"),
            ColumnBlueprint::Decimal {
                precision: 10,
                scale: 0
            }
        );
    }

    #[test]
    fn nested_containers() {
        assert_eq!(
            parse("Array(Map(String, UInt8))"),
            ColumnBlueprint::Array(Box::new(ColumnBlueprint::Map(
                Box::new(ColumnBlueprint::String),
                Box::new(ColumnBlueprint::UInt8)
            )))
        );
        assert_eq!(
            parse("Tuple(Array(Int8), Nullable(String))"),
            ColumnBlueprint::Tuple(vec![
                ColumnBlueprint::Array(Box::new(ColumnBlueprint::Int8)),
                ColumnBlueprint::Nullable(Box::new(ColumnBlueprint::String)),
            ])
        );
    }

    #[test]
    fn named_elements_are_stripped() {
        assert_eq!(
            parse("Tuple(a Int32, b String)"),
            ColumnBlueprint::Tuple(vec![ColumnBlueprint::Int32, ColumnBlueprint::String])
        );
        assert_eq!(
            parse("Array(a Int32)"),
            ColumnBlueprint::Array(Box::new(ColumnBlueprint::Int32))
        );
    }

    #[test]
    fn decimals() {
        assert_eq!(
            parse("Decimal(38, 10)"),
            ColumnBlueprint::Decimal {
                precision: 38,
                scale: 10
            }
        );
        assert_eq!(
            parse("Decimal(5)"),
            ColumnBlueprint::Decimal {
                precision: 5,
                scale: 0
            }
        );
        assert_eq!(
            parse("Decimal64(4)"),
            ColumnBlueprint::Decimal {
                precision: 18,
                scale: 4
            }
        );
        assert!(parse_descriptor("Decimal(77, 2)").is_err());
        assert!(parse_descriptor("Decimal(0)").is_err());
        assert!(parse_descriptor("Decimal(5, 6)").is_err());
        assert!(parse_descriptor("Decimal(x, 2)").is_err());
    }

    #[test]
    fn temporal_arguments() {
        assert_eq!(
            parse("DateTime('Europe/Berlin')"),
            ColumnBlueprint::DateTime(Some(chrono_tz::Europe::Berlin))
        );
        assert_eq!(
            parse("DateTime64(6, 'UTC')"),
            ColumnBlueprint::DateTime64 {
                precision: 6,
                time_zone: Some(Tz::UTC)
            }
        );
        assert_eq!(parse("Time(3)"), ColumnBlueprint::Time { scale: 3 });
        assert!(parse_descriptor("DateTime('Mars/Olympus')").is_err());
        assert!(parse_descriptor("DateTime64(10)").is_err());
        assert!(parse_descriptor("DateTime(UTC)").is_err());
    }

    #[test]
    fn aggregate_functions_use_second_argument() {
        assert_eq!(
            parse("SimpleAggregateFunction(sum, UInt64)"),
            ColumnBlueprint::UInt64
        );
        assert_eq!(
            parse("AggregateFunction(anyIf(x, y), Array(UInt8))"),
            ColumnBlueprint::Array(Box::new(ColumnBlueprint::UInt8))
        );
        assert!(parse_descriptor("AggregateFunction(sum)").is_err());
        assert!(parse_descriptor("AggregateFunction(sum, UInt8, UInt8)").is_err());
    }

    #[test]
    fn enums() {
        let ColumnBlueprint::Enum(table) = parse("Enum8('a' = 1, 'b' = 2)") else {
            panic!("expected enum");
        };
        assert_eq!(table.value_of("b"), Some(2));
        assert!(parse_descriptor("Enum8('a' = one)").is_err());
    }

    #[test]
    fn low_cardinality_keys_must_be_scalar() {
        assert!(parse_descriptor("LowCardinality(String)").is_ok());
        assert!(parse_descriptor("LowCardinality(Nullable(String))").is_ok());
        assert!(parse_descriptor("LowCardinality(Array(String))").is_err());
    }

    #[test]
    fn errors_name_the_fragment() {
        assert_eq!(fragment("Array(Strin)"), "Strin");
        assert_eq!(fragment("Map(String)"), "Map(String)");
        assert_eq!(fragment("Nope"), "Nope");
        assert_eq!(fragment("Tuple()"), "Tuple()");
        assert_eq!(fragment("Array(UInt8"), "Array(UInt8");
        assert_eq!(fragment("FixedString(0)"), "FixedString(0)");
    }

    #[test]
    fn nested_failure_fails_whole_parse() {
        assert!(parse_descriptor("Array(Map(String, Tuple(UInt8, Bogus)))").is_err());
        assert_eq!(fragment("Tuple(UInt8, 'x)"), "Tuple(UInt8, 'x)");
    }
}
