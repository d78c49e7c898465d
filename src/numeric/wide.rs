//! # Wide Two's-Complement Integers
//!
//! Rows wider than any native integer (256-bit integers, Decimal256) are
//! stored as `width`-byte two's-complement little-endian integers and
//! converted to and from `num_bigint::BigInt` here.
//!
//! ## Encoding
//!
//! ```text
//! value >= 0:  magnitude bytes, little-endian, zero-extended to width
//! value <  0:  !(magnitude) + 1 over the full width
//! ```
//!
//! Decoding mirrors this: if the top bit of the last byte is set and the
//! row is signed, invert, add one, and negate.
//!
//! Narrower decimal widths (4, 8, 16 bytes) use the same routines so every
//! decimal row shares one code path.

use eyre::{bail, Result};
use num_bigint::{BigInt, BigUint, Sign};

use crate::error::CodecError;

/// Does `value` fit in `bytes` bytes of (un)signed two's complement?
pub fn fits(value: &BigInt, bytes: usize, signed: bool) -> bool {
    let bits = bytes as u64 * 8;
    let magnitude = value.magnitude();
    match (value.sign(), signed) {
        (Sign::Minus, false) => false,
        (Sign::Minus, true) => {
            magnitude.bits() < bits
                || (magnitude.bits() == bits && magnitude.trailing_zeros() == Some(bits - 1))
        }
        (_, true) => magnitude.bits() < bits,
        (_, false) => magnitude.bits() <= bits,
    }
}

fn negate_in_place(bytes: &mut [u8]) {
    let mut carry = true;
    for byte in bytes.iter_mut() {
        let inverted = !*byte;
        let (sum, overflow) = inverted.overflowing_add(u8::from(carry));
        *byte = sum;
        carry = overflow;
    }
}

/// Write `value` into `out` as little-endian two's complement.
pub fn write_twos_complement(value: &BigInt, out: &mut [u8], signed: bool) -> Result<()> {
    if !fits(value, out.len(), signed) {
        bail!(CodecError::overflow(format!(
            "{} does not fit in {} {} bits",
            value,
            if signed { "signed" } else { "unsigned" },
            out.len() * 8
        )));
    }
    let magnitude = value.magnitude().to_bytes_le();
    out.fill(0);
    out[..magnitude.len()].copy_from_slice(&magnitude);
    if value.sign() == Sign::Minus {
        negate_in_place(out);
    }
    Ok(())
}

/// Read a little-endian two's-complement integer.
pub fn read_twos_complement(bytes: &[u8], signed: bool) -> BigInt {
    let negative = signed && bytes.last().is_some_and(|b| b & 0x80 != 0);
    if !negative {
        return BigInt::from_biguint(Sign::Plus, BigUint::from_bytes_le(bytes));
    }
    let mut magnitude = bytes.to_vec();
    negate_in_place(&mut magnitude);
    BigInt::from_biguint(Sign::Minus, BigUint::from_bytes_le(&magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};

    fn roundtrip(value: BigInt, width: usize, signed: bool) -> BigInt {
        let mut buf = vec![0u8; width];
        write_twos_complement(&value, &mut buf, signed).unwrap();
        read_twos_complement(&buf, signed)
    }

    #[test]
    fn matches_native_layout() {
        for v in [0i64, 1, -1, 127, -128, i64::MAX, i64::MIN] {
            let mut buf = [0u8; 8];
            write_twos_complement(&BigInt::from(v), &mut buf, true).unwrap();
            assert_eq!(buf, v.to_le_bytes(), "{v}");
        }
        let mut buf = [0u8; 16];
        write_twos_complement(&BigInt::from(i128::MIN), &mut buf, true).unwrap();
        assert_eq!(buf, i128::MIN.to_le_bytes());
    }

    #[test]
    fn wide_values_survive() {
        let max_i256: BigInt = (BigInt::one() << 255usize) - 1;
        let min_i256 = -(BigInt::one() << 255usize);
        let max_u256: BigInt = (BigInt::one() << 256usize) - 1;

        assert_eq!(roundtrip(max_i256.clone(), 32, true), max_i256);
        assert_eq!(roundtrip(min_i256.clone(), 32, true), min_i256);
        assert_eq!(roundtrip(max_u256.clone(), 32, false), max_u256);
        assert_eq!(roundtrip(BigInt::from(-5), 32, true), BigInt::from(-5));
        assert_eq!(roundtrip(BigInt::zero(), 32, true), BigInt::zero());
    }

    #[test]
    fn rejects_out_of_range() {
        let mut buf = [0u8; 32];
        assert!(write_twos_complement(&(BigInt::one() << 255), &mut buf, true).is_err());
        assert!(write_twos_complement(&(-(BigInt::one() << 255usize) - 1), &mut buf, true).is_err());
        assert!(write_twos_complement(&(BigInt::one() << 256), &mut buf, false).is_err());
        assert!(write_twos_complement(&BigInt::from(-1), &mut buf, false).is_err());
    }

    #[test]
    fn failed_write_leaves_buffer_untouched() {
        let mut buf = [7u8; 4];
        assert!(write_twos_complement(&BigInt::from(i64::MAX), &mut buf, true).is_err());
        assert_eq!(buf, [7u8; 4]);
    }
}
