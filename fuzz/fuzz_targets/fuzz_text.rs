//! Fuzz testing for text ingestion.
//!
//! Arbitrary literals are fed to container codecs. A failed batch must
//! report a committed count no larger than the failing row, and the codec
//! must stay readable afterwards.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use colwire::ColumnFactory;

const DESCRIPTORS: &[&str] = &[
    "Array(Nullable(UInt8))",
    "Map(String, Array(Int16))",
    "Tuple(UInt8, String, Date)",
    "LowCardinality(Nullable(String))",
    "Decimal(9, 3)",
    "DateTime('UTC')",
];

#[derive(Debug, Arbitrary)]
struct TextInput {
    descriptor: u8,
    texts: Vec<String>,
}

fuzz_target!(|input: TextInput| {
    if input.texts.len() > 256 {
        return;
    }
    let descriptor = DESCRIPTORS[usize::from(input.descriptor) % DESCRIPTORS.len()];
    let factory = ColumnFactory::default();
    let Ok(mut codec) = factory.create(descriptor, input.texts.len()) else {
        return;
    };

    let texts: Vec<&str> = input.texts.iter().map(String::as_str).collect();
    match codec.fill_from_texts(&texts) {
        Ok(committed) => assert_eq!(committed, texts.len()),
        Err(err) => assert!(err.committed <= err.row),
    }
    for row in 0..texts.len() {
        let _ = codec.text(row);
    }
    let mut out = Vec::new();
    codec.write_to(&mut out).expect("filled column must encode");
    codec.release();
});
