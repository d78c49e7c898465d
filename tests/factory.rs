//! # Factory Tests
//!
//! Descriptor handling, builder options, blueprint reuse across threads and
//! the stream adapters.

use std::sync::Arc;
use std::thread;

use colwire::memory::BufferPool;
use colwire::{
    ColumnBlueprint, ColumnFactory, DescriptorError, StreamDecoder, StreamEncoder, Value,
};

fn descriptor_error(factory: &ColumnFactory, descriptor: &str) -> DescriptorError {
    let err = factory.create(descriptor, 1).unwrap_err();
    err.chain()
        .find_map(|e| e.downcast_ref::<DescriptorError>())
        .cloned()
        .unwrap_or_else(|| panic!("{}: no DescriptorError in {:?}", descriptor, err))
}

mod descriptors {
    use super::*;

    #[test]
    fn unsupported_kinds_are_fatal() {
        let factory = ColumnFactory::default();
        assert_eq!(descriptor_error(&factory, "JSON").fragment, "JSON");
        assert_eq!(descriptor_error(&factory, "Array(Strng)").fragment, "Strng");
        descriptor_error(&factory, "Decimal(77, 2)");
        descriptor_error(&factory, "Map(String)");
        descriptor_error(&factory, "LowCardinality(Array(String))");
    }

    #[test]
    fn aliases_resolve_to_canonical_kinds() {
        let factory = ColumnFactory::default();
        let cases = [
            ("Boolean", "Bool"),
            ("Decimal32(2)", "Decimal(9, 2)"),
            ("Decimal256(10)", "Decimal(76, 10)"),
            ("DateTime64", "DateTime64(3)"),
            ("SimpleAggregateFunction(max, Nullable(String))", "Nullable(String)"),
        ];
        for (alias, canonical) in cases {
            assert_eq!(factory.blueprint(alias).unwrap().to_string(), canonical, "{}", alias);
        }
    }

    #[test]
    fn oversized_row_counts_are_errors() {
        let factory = ColumnFactory::default();
        assert!(factory.create("FixedString(16)", usize::MAX / 2).is_err());
        assert!(factory.create("Array(Int64)", usize::MAX).is_err());
    }

    #[test]
    fn canonical_rendering_parses_back() {
        let descriptor = "Map(String, Tuple(Enum8('a' = 1), Array(LowCardinality(Nullable(String)))))";
        let blueprint: ColumnBlueprint = descriptor.parse().unwrap();
        let again: ColumnBlueprint = blueprint.to_string().parse().unwrap();
        assert_eq!(blueprint, again);
    }
}

mod builder {
    use super::*;

    #[test]
    fn default_zone_applies_to_unzoned_columns() {
        let factory = ColumnFactory::builder()
            .default_time_zone(chrono_tz::America::New_York)
            .build();
        let mut codec = factory.create("DateTime64(0)", 1).unwrap();
        codec.fill_from_texts(&["0"]).unwrap();
        assert_eq!(codec.text(0), "1969-12-31 19:00:00");
    }

    #[test]
    fn pool_is_shared_between_factories() {
        let pool = BufferPool::new(4);
        let a = ColumnFactory::builder().buffer_pool(pool.clone()).build();
        let b = ColumnFactory::builder().buffer_pool(pool.clone()).build();

        let codec = a.create("UInt32", 256).unwrap();
        codec.release();
        let before = pool.stats();

        let codec = b.create("UInt32", 256).unwrap();
        assert_eq!(pool.stats().hits, before.hits + 1);
        codec.release();
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn factory_is_shared_across_threads() {
        let factory = Arc::new(ColumnFactory::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let factory = Arc::clone(&factory);
                thread::spawn(move || {
                    let mut codec = factory.create("Array(Int64)", 1).unwrap();
                    let text = format!("[{}, {}]", i, -i);
                    codec.fill_from_texts(&[text.as_str()]).unwrap();
                    let mut wire = Vec::new();
                    codec.write_to(&mut wire).unwrap();
                    codec.release();
                    wire
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let wire = handle.join().unwrap();
            assert_eq!(wire.len(), 8 + 16, "thread {}", i);
        }
        assert_eq!(factory.cached_blueprints(), Some(1));
    }
}

mod streams {
    use super::*;

    #[test]
    fn stream_adapters_carry_several_columns() {
        let factory = ColumnFactory::default();
        let mut ids = factory.create("UInt16", 2).unwrap();
        ids.fill_from_texts(&["1", "2"]).unwrap();
        let mut names = factory.create("Nullable(String)", 2).unwrap();
        names.fill_from_texts(&["alice", "NULL"]).unwrap();

        let mut encoder = StreamEncoder::new(Vec::new());
        ids.write_to(&mut encoder).unwrap();
        names.write_to(&mut encoder).unwrap();
        let bytes = encoder.into_inner();

        let mut decoder = StreamDecoder::new(bytes.as_slice());
        let mut ids_copy = factory.create("UInt16", 2).unwrap();
        let mut names_copy = factory.create("Nullable(String)", 2).unwrap();
        ids_copy.read_from(&mut decoder).unwrap();
        names_copy.read_from(&mut decoder).unwrap();

        assert_eq!(ids_copy.value(1), Value::UInt16(2));
        assert_eq!(names_copy.value(0), Value::Text("alice".into()));
        assert_eq!(names_copy.value(1), Value::Null);
    }
}
