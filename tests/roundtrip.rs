//! # Wire Round-Trip Tests
//!
//! Every supported kind is filled from text, written to the wire, read into
//! a fresh codec and rendered again. The rendering must match the canonical
//! form, and re-encoding the decoded codec must reproduce the same bytes.

use colwire::{ColumnFactory, SliceDecoder};

fn roundtrip(factory: &ColumnFactory, descriptor: &str, input: &[&str], expected: &[&str]) {
    let mut codec = factory.create(descriptor, input.len()).unwrap();
    let committed = codec
        .fill_from_texts(input)
        .unwrap_or_else(|e| panic!("{}: fill failed: {}", descriptor, e));
    assert_eq!(committed, input.len(), "{}", descriptor);

    let mut wire = Vec::new();
    codec.write_to(&mut wire).unwrap();

    let mut decoded = factory.create(descriptor, input.len()).unwrap();
    let mut decoder = SliceDecoder::new(&wire);
    decoded
        .read_from(&mut decoder)
        .unwrap_or_else(|e| panic!("{}: decode failed: {}", descriptor, e));
    assert_eq!(decoder.remaining(), 0, "{}: trailing bytes", descriptor);

    let texts: Vec<String> = (0..input.len()).map(|row| decoded.text(row)).collect();
    assert_eq!(texts, expected, "{}", descriptor);

    let mut again = Vec::new();
    decoded.write_to(&mut again).unwrap();
    assert_eq!(again, wire, "{}: re-encoding differs", descriptor);

    codec.release();
    decoded.release();
}

mod scalars {
    use super::*;

    #[test]
    fn integers() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Int8", &["-128", "127", "0"], &["-128", "127", "0"]);
        roundtrip(&factory, "UInt16", &["65535", "+7"], &["65535", "7"]);
        roundtrip(&factory, "Int32", &["-2147483648"], &["-2147483648"]);
        roundtrip(
            &factory,
            "UInt64",
            &["18446744073709551615", "0"],
            &["18446744073709551615", "0"],
        );
        roundtrip(
            &factory,
            "Int128",
            &["-170141183460469231731687303715884105728"],
            &["-170141183460469231731687303715884105728"],
        );
        roundtrip(
            &factory,
            "UInt128",
            &["340282366920938463463374607431768211455"],
            &["340282366920938463463374607431768211455"],
        );
    }

    #[test]
    fn wide_integers() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Int256", &["-1", "42"], &["-1", "42"]);
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        roundtrip(&factory, "UInt256", &[max, "0"], &[max, "0"]);
    }

    #[test]
    fn floats() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Float32", &["1.5", "-0.25"], &["1.5", "-0.25"]);
        roundtrip(&factory, "Float64", &["2e3", "-inf"], &["2000", "-inf"]);
    }

    #[test]
    fn decimals() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Decimal(9, 2)", &["1.5", "-0.05"], &["1.50", "-0.05"]);
        roundtrip(&factory, "Decimal(10, 3)", &["3.14159", "-2"], &["3.141", "-2.000"]);
        roundtrip(&factory, "Decimal(38, 0)", &["12345"], &["12345"]);
        roundtrip(&factory, "Decimal(76, 2)", &["-1.5"], &["-1.50"]);
    }

    #[test]
    fn booleans() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Bool", &["true", "false"], &["true", "false"]);
    }

    #[test]
    fn temporal() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Date", &["2024-01-15", ""], &["2024-01-15", "1970-01-01"]);
        roundtrip(&factory, "Date32", &["1969-12-31"], &["1969-12-31"]);
        roundtrip(
            &factory,
            "DateTime('UTC')",
            &["2024-01-15 10:30:00"],
            &["2024-01-15 10:30:00"],
        );
        roundtrip(
            &factory,
            "DateTime64(3, 'UTC')",
            &["2024-01-15 10:30:00.250"],
            &["2024-01-15 10:30:00.250"],
        );
        roundtrip(&factory, "Time(3)", &["01:02:03.5"], &["01:02:03.500"]);
    }

    #[test]
    fn addresses_and_identifiers() {
        let factory = ColumnFactory::default();
        let id = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        roundtrip(&factory, "UUID", &[id], &[id]);
        roundtrip(&factory, "IPv4", &["192.168.0.1"], &["192.168.0.1"]);
        roundtrip(&factory, "IPv6", &["2001:db8::1", "::1"], &["2001:db8::1", "::1"]);
    }

    #[test]
    fn enums() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Enum8('a' = 1, 'b' = 2)", &["b", "a"], &["b", "a"]);
        roundtrip(&factory, "Enum16('x' = 1000)", &["x"], &["x"]);
    }

    #[test]
    fn strings() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "String", &["plain", "'quoted'", ""], &["plain", "quoted", ""]);
        roundtrip(&factory, "FixedString(4)", &["ab", "wxyz"], &["ab", "wxyz"]);
    }

    #[test]
    fn bitmaps() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "BitMap64", &["[3, 1, 3]", "[]"], &["[1, 3]", "[]"]);
    }

    #[test]
    fn aggregate_function_wrappers() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "SimpleAggregateFunction(sum, UInt64)", &["7"], &["7"]);
    }
}

mod containers {
    use super::*;

    #[test]
    fn arrays() {
        let factory = ColumnFactory::default();
        roundtrip(
            &factory,
            "Array(String)",
            &["['a', 'b']", "[]"],
            &["['a', 'b']", "[]"],
        );
        roundtrip(
            &factory,
            "Array(Array(UInt8))",
            &["[[1], [2, 3]]", "[]"],
            &["[[1], [2, 3]]", "[]"],
        );
    }

    #[test]
    fn maps() {
        let factory = ColumnFactory::default();
        roundtrip(
            &factory,
            "Map(String, Array(UInt8))",
            &["{'k': [1, 2]}", "{}"],
            &["{'k': [1, 2]}", "{}"],
        );
    }

    #[test]
    fn tuples() {
        let factory = ColumnFactory::default();
        roundtrip(
            &factory,
            "Tuple(UInt8, Nullable(String))",
            &["(1, NULL)", "(2, 'x')"],
            &["(1, NULL)", "(2, 'x')"],
        );
    }

    #[test]
    fn nullables() {
        let factory = ColumnFactory::default();
        roundtrip(&factory, "Nullable(Float64)", &["NULL", "1.5"], &["ᴺᵁᴸᴸ", "1.5"]);
        roundtrip(
            &factory,
            "Array(Nullable(Int8))",
            &["[1, NULL]"],
            &["[1, NULL]"],
        );
    }

    #[test]
    fn low_cardinality() {
        let factory = ColumnFactory::default();
        roundtrip(
            &factory,
            "LowCardinality(String)",
            &["x", "y", "x"],
            &["x", "y", "x"],
        );
        roundtrip(
            &factory,
            "LowCardinality(Nullable(String))",
            &["x", "NULL"],
            &["x", "ᴺᵁᴸᴸ"],
        );
    }
}
