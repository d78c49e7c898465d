//! Fuzz testing for wire decoding.
//!
//! Every codec must reject malformed wire bytes with an error rather than
//! panicking, and anything it accepts must re-encode without error.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use colwire::{ColumnFactory, SliceDecoder};

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzKind {
    UInt8,
    Int64,
    Int256,
    Float64,
    Decimal128,
    DateTime64,
    Uuid,
    Ipv6,
    Enum8,
    String,
    FixedString,
    BitMap64,
    ArrayString,
    MapStringUInt8,
    TupleUInt8String,
    NullableInt32,
    LowCardinalityString,
    LowCardinalityNullableString,
}

impl FuzzKind {
    fn descriptor(self) -> &'static str {
        match self {
            FuzzKind::UInt8 => "UInt8",
            FuzzKind::Int64 => "Int64",
            FuzzKind::Int256 => "Int256",
            FuzzKind::Float64 => "Float64",
            FuzzKind::Decimal128 => "Decimal(38, 4)",
            FuzzKind::DateTime64 => "DateTime64(3, 'UTC')",
            FuzzKind::Uuid => "UUID",
            FuzzKind::Ipv6 => "IPv6",
            FuzzKind::Enum8 => "Enum8('a' = 1, 'b' = 2)",
            FuzzKind::String => "String",
            FuzzKind::FixedString => "FixedString(3)",
            FuzzKind::BitMap64 => "BitMap64",
            FuzzKind::ArrayString => "Array(String)",
            FuzzKind::MapStringUInt8 => "Map(String, UInt8)",
            FuzzKind::TupleUInt8String => "Tuple(UInt8, String)",
            FuzzKind::NullableInt32 => "Nullable(Int32)",
            FuzzKind::LowCardinalityString => "LowCardinality(String)",
            FuzzKind::LowCardinalityNullableString => "LowCardinality(Nullable(String))",
        }
    }
}

#[derive(Debug, Arbitrary)]
struct WireInput {
    kind: FuzzKind,
    rows: u8,
    data: Vec<u8>,
}

fuzz_target!(|input: WireInput| {
    let factory = ColumnFactory::default();
    let rows = usize::from(input.rows);
    let Ok(mut codec) = factory.create(input.kind.descriptor(), rows) else {
        return;
    };

    if codec.read_from(&mut SliceDecoder::new(&input.data)).is_ok() {
        for row in 0..rows {
            let _ = codec.text(row);
            let _ = codec.value(row);
        }
        let mut out = Vec::new();
        codec.write_to(&mut out).expect("decoded column must re-encode");
    }
    codec.release();
});
