//! # Big-Integer and Decimal Arithmetic
//!
//! Conversions between arbitrary-precision values (`num_bigint::BigInt`,
//! `bigdecimal::BigDecimal`) and fixed-width two's-complement rows.
//!
//! - `wide`: two's-complement encode/decode and range checks
//! - `decimal`: precision-to-width breakpoints, scaling, precision checks and
//!   rendering

pub mod decimal;
pub mod wide;

pub use decimal::{
    check_precision, decimal_width, format_decimal, from_big_decimal, from_integer,
    parse_decimal, pow10, rescale, to_big_decimal,
};
pub use wide::{fits, read_twos_complement, write_twos_complement};
