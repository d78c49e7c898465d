//! # Container Codec Tests
//!
//! Nested kinds through the factory: value ingestion, deep nesting, and how
//! element failures are reported against outer rows.

use colwire::{ColumnCodec, ColumnFactory, ErrorKind, SliceDecoder, Value};

fn create(descriptor: &str, rows: usize) -> Box<dyn ColumnCodec> {
    ColumnFactory::default().create(descriptor, rows).unwrap()
}

fn reencoded(codec: &dyn ColumnCodec, descriptor: &str) -> Box<dyn ColumnCodec> {
    let mut wire = Vec::new();
    codec.write_to(&mut wire).unwrap();
    let mut copy = create(descriptor, codec.row_count());
    copy.read_from(&mut SliceDecoder::new(&wire)).unwrap();
    copy
}

mod values {
    use super::*;

    #[test]
    fn array_values() {
        let mut codec = create("Array(Int32)", 2);
        codec
            .fill_from_values(&[Value::Array(vec![Value::Int32(1), Value::Int32(-2)]), Value::Null])
            .unwrap();
        assert_eq!(
            codec.value(0),
            Value::Array(vec![Value::Int32(1), Value::Int32(-2)])
        );
        assert_eq!(codec.value(1), Value::Array(vec![]));
        assert_eq!(codec.text(0), "[1, -2]");
        assert_eq!(codec.text(1), "[]");
    }

    #[test]
    fn map_values() {
        let mut codec = create("Map(String, UInt16)", 2);
        codec
            .fill_from_values(&[
                Value::Map(vec![
                    (Value::from("a"), Value::UInt16(1)),
                    (Value::from("b"), Value::UInt16(2)),
                ]),
                Value::Map(vec![]),
            ])
            .unwrap();
        assert_eq!(codec.text(0), "{'a': 1, 'b': 2}");
        assert_eq!(codec.text(1), "{}");

        let copy = reencoded(codec.as_ref(), "Map(String, UInt16)");
        assert_eq!(
            copy.value(0),
            Value::Map(vec![
                (Value::Text("a".into()), Value::UInt16(1)),
                (Value::Text("b".into()), Value::UInt16(2)),
            ])
        );
    }

    #[test]
    fn tuple_values_with_nulls() {
        let mut codec = create("Tuple(String, Nullable(Float64))", 1);
        codec
            .fill_from_values(&[Value::Tuple(vec![Value::from("x"), Value::Null])])
            .unwrap();
        assert_eq!(codec.text(0), "('x', NULL)");
        assert_eq!(
            codec.value(0),
            Value::Tuple(vec![Value::Text("x".into()), Value::Null])
        );
    }

    #[test]
    fn nullable_dictionary_infers_from_first_value() {
        let mut codec = create("LowCardinality(Nullable(Int64))", 3);
        codec
            .fill_from_values(&[Value::Int32(5), Value::Null, Value::Int32(-1)])
            .unwrap();
        assert_eq!(codec.value(0), Value::Int64(5));
        assert_eq!(codec.value(1), Value::Null);
        assert_eq!(codec.value(2), Value::Int64(-1));

        let copy = reencoded(codec.as_ref(), "LowCardinality(Nullable(Int64))");
        assert_eq!(copy.text(0), "5");
        assert_eq!(copy.value(1), Value::Null);
    }

    #[test]
    fn short_dictionary_batch_pads_without_inference() {
        let mut codec = create("LowCardinality(UInt32)", 3);
        assert_eq!(codec.fill_from_values(&[Value::UInt8(7)]).unwrap(), 1);
        assert_eq!(codec.value(0), Value::UInt32(7));
        assert_eq!(codec.value(2), Value::UInt32(0));
    }

    #[test]
    fn value_shape_mismatch() {
        let mut codec = create("Array(UInt8)", 2);
        let err = codec
            .fill_from_values(&[Value::Array(vec![]), Value::UInt8(1)])
            .unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::TypeMismatch));
    }
}

mod nesting {
    use super::*;

    #[test]
    fn deep_nesting_round_trips() {
        let descriptor = "Array(Map(String, Tuple(UInt8, Array(String))))";
        let mut codec = create(descriptor, 2);
        codec
            .fill_from_texts(&["[{'k': (1, ['a', 'b'])}, {}]", "[]"])
            .unwrap();
        let copy = reencoded(codec.as_ref(), descriptor);
        assert_eq!(copy.text(0), "[{'k': (1, ['a', 'b'])}, {}]");
        assert_eq!(copy.text(1), "[]");
    }

    #[test]
    fn nullable_elements_inside_arrays() {
        let mut codec = create("Array(Nullable(UInt8))", 2);
        codec.fill_from_texts(&["[1, NULL, 3]", "[NULL]"]).unwrap();
        assert_eq!(codec.text(0), "[1, NULL, 3]");
        assert_eq!(
            codec.value(1),
            Value::Array(vec![Value::Null])
        );
    }

    #[test]
    fn low_cardinality_inside_arrays() {
        let descriptor = "Array(LowCardinality(String))";
        let mut codec = create(descriptor, 2);
        codec.fill_from_texts(&["['a', 'b', 'a']", "['b']"]).unwrap();
        let copy = reencoded(codec.as_ref(), descriptor);
        assert_eq!(copy.text(0), "['a', 'b', 'a']");
        assert_eq!(copy.text(1), "['b']");
    }

    #[test]
    fn separators_inside_quotes_are_literal() {
        let mut codec = create("Map(String, String)", 1);
        codec.fill_from_texts(&["{'a:b': 'c, d'}"]).unwrap();
        assert_eq!(codec.text(0), "{'a:b': 'c, d'}");
    }
}

mod failures {
    use super::*;

    #[test]
    fn map_value_failure_rolls_back_keys() {
        let mut codec = create("Map(String, UInt8)", 2);
        let err = codec.fill_from_texts(&["{'a': 1}", "{'b': 300}"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));
        assert_eq!(codec.text(0), "{'a': 1}");
        assert_eq!(codec.text(1), "{}");
    }

    #[test]
    fn low_cardinality_failure_commits_prefix() {
        let mut codec = create("LowCardinality(UInt8)", 3);
        let err = codec.fill_from_texts(&["1", "2", "x"]).unwrap_err();
        assert_eq!((err.committed, err.row), (2, 2));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));
        assert_eq!(codec.text(0), "1");
        assert_eq!(codec.text(1), "2");
    }

    #[test]
    fn tuple_failure_in_last_position_keeps_prefix() {
        let mut codec = create("Tuple(UInt8, UInt8)", 2);
        let err = codec.fill_from_texts(&["(1, 2)", "(3, x)"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(codec.text(0), "(1, 2)");
    }

    #[test]
    fn tuple_failure_in_earlier_position_commits_nothing() {
        let mut codec = create("Tuple(UInt8, UInt8)", 2);
        let err = codec.fill_from_texts(&["(1, 2)", "(x, 3)"]).unwrap_err();
        assert_eq!(err.committed, 0);
        assert_eq!(err.row, 1);
    }

    #[test]
    fn unbalanced_brackets_are_shape_errors() {
        let mut codec = create("Array(UInt8)", 1);
        let err = codec.fill_from_texts(&["[1, 2"]).unwrap_err();
        assert_eq!(err.committed, 0);
        assert_eq!(err.kind(), Some(ErrorKind::Shape));
    }

    #[test]
    fn huge_string_length_is_rejected() {
        let mut wire = vec![0xFF; 9];
        wire.extend_from_slice(&[0x01, b'a']);
        let mut codec = create("String", 1);
        assert!(codec.read_from(&mut SliceDecoder::new(&wire)).is_err());
    }

    #[test]
    fn huge_element_count_is_rejected() {
        let wire = (u64::MAX / 2).to_le_bytes();
        for descriptor in ["Array(UInt64)", "Map(String, UInt8)", "Array(Array(String))"] {
            let mut codec = create(descriptor, 1);
            assert!(
                codec.read_from(&mut SliceDecoder::new(&wire)).is_err(),
                "{}",
                descriptor
            );
        }
    }

    #[test]
    fn element_count_past_block_end_is_rejected() {
        let mut wire = 4u64.to_le_bytes().to_vec();
        wire.extend_from_slice(&[1, 2, 3]);
        let mut codec = create("Array(UInt8)", 1);
        assert!(codec.read_from(&mut SliceDecoder::new(&wire)).is_err());
    }

    #[test]
    fn huge_dictionary_key_count_is_rejected() {
        let mut codec = create("LowCardinality(String)", 1);
        codec.fill_from_texts(&["a"]).unwrap();
        let mut wire = Vec::new();
        codec.write_to(&mut wire).unwrap();
        wire[16..24].copy_from_slice(&(u64::MAX / 2).to_le_bytes());

        let mut copy = create("LowCardinality(String)", 1);
        assert!(copy.read_from(&mut SliceDecoder::new(&wire)).is_err());
    }

    #[test]
    fn truncated_wire_is_rejected() {
        let mut codec = create("Array(String)", 1);
        codec.fill_from_texts(&["['abc']"]).unwrap();
        let mut wire = Vec::new();
        codec.write_to(&mut wire).unwrap();
        wire.pop();

        let mut copy = create("Array(String)", 1);
        assert!(copy.read_from(&mut SliceDecoder::new(&wire)).is_err());
    }
}
