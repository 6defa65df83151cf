//! Message fixtures shared by unit tests

use crate::Message;

/// Nested message used by `Sample`
#[derive(Debug, Default, Clone, PartialEq, Message)]
pub struct Child {
    #[proto(field = 1, kind = "int32")]
    pub id: i32,

    #[proto(field = 2, kind = "string")]
    pub name: Option<String>,
}

/// Three fields spread far enough apart to dispatch by lookup
#[derive(Debug, Default, Clone, PartialEq, Message)]
pub struct Sparse {
    #[proto(field = 1, kind = "int32")]
    pub first: i32,

    #[proto(field = 2, kind = "bool")]
    pub second: bool,

    #[proto(field = 100, kind = "string")]
    pub last: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Message)]
pub struct Empty {}

/// Reachable only by offset
#[derive(Debug, Default, Clone, PartialEq, Message)]
#[proto(name = "Ledger", access = "offset")]
pub struct OffsetOnly {
    #[proto(field = 1, kind = "sfixed64")]
    pub balance: i64,

    #[proto(field = 2, kind = "string")]
    pub owner: Option<String>,

    #[proto(field = 3, kind = "message", access = "both")]
    pub child: Option<Box<Child>>,

    #[proto(field = 4, kind = "uint32", packed)]
    pub history: Option<Vec<u32>>,

    pub cached_total: i64,
}

/// Declares one struct per code shape with a field for every field type
macro_rules! sample_messages {
    ($($field:ident: $ty:ty => ($($attr:tt)*)),* $(,)?) => {
        /// One field of every field type, numbered by tag + 1
        #[derive(Debug, Default, Clone, PartialEq, Message)]
        pub struct Sample {
            $(
                #[proto($($attr)*)]
                pub $field: $ty,
            )*
        }

        /// `Sample` with inline generated code
        #[derive(Debug, Default, Clone, PartialEq, Message)]
        #[proto(shape = "inline")]
        pub struct InlineSample {
            $(
                #[proto($($attr)*)]
                pub $field: $ty,
            )*
        }

        impl From<&Sample> for InlineSample {
            fn from(sample: &Sample) -> Self {
                Self {
                    $($field: sample.$field.clone(),)*
                }
            }
        }
    };
}

sample_messages! {
    double: f64 => (field = 1, kind = "double"),
    float: f32 => (field = 2, kind = "float"),
    int32: i32 => (field = 3, kind = "int32"),
    uint32: u32 => (field = 4, kind = "uint32"),
    sint32: i32 => (field = 5, kind = "sint32"),
    fixed32: u32 => (field = 6, kind = "fixed32"),
    sfixed32: i32 => (field = 7, kind = "sfixed32"),
    int64: i64 => (field = 8, kind = "int64"),
    uint64: u64 => (field = 9, kind = "uint64"),
    sint64: i64 => (field = 10, kind = "sint64"),
    fixed64: u64 => (field = 11, kind = "fixed64"),
    sfixed64: i64 => (field = 12, kind = "sfixed64"),
    boolean: bool => (field = 13, kind = "bool"),
    enumeration: i32 => (field = 14, kind = "enum"),
    string: Option<String> => (field = 15, kind = "string"),
    bytes: Option<Vec<u8>> => (field = 16, kind = "bytes"),
    child: Option<Box<Child>> => (field = 17, kind = "message"),

    repeated_double: Option<Vec<f64>> => (field = 18, kind = "double", repeated),
    repeated_float: Option<Vec<f32>> => (field = 19, kind = "float", repeated),
    repeated_int32: Option<Vec<i32>> => (field = 20, kind = "int32", repeated),
    repeated_uint32: Option<Vec<u32>> => (field = 21, kind = "uint32", repeated),
    repeated_sint32: Option<Vec<i32>> => (field = 22, kind = "sint32", repeated),
    repeated_fixed32: Option<Vec<u32>> => (field = 23, kind = "fixed32", repeated),
    repeated_sfixed32: Option<Vec<i32>> => (field = 24, kind = "sfixed32", repeated),
    repeated_int64: Option<Vec<i64>> => (field = 25, kind = "int64", repeated),
    repeated_uint64: Option<Vec<u64>> => (field = 26, kind = "uint64", repeated),
    repeated_sint64: Option<Vec<i64>> => (field = 27, kind = "sint64", repeated),
    repeated_fixed64: Option<Vec<u64>> => (field = 28, kind = "fixed64", repeated),
    repeated_sfixed64: Option<Vec<i64>> => (field = 29, kind = "sfixed64", repeated),
    repeated_bool: Option<Vec<bool>> => (field = 30, kind = "bool", repeated),
    repeated_enum: Option<Vec<i32>> => (field = 31, kind = "enum", repeated),
    repeated_string: Option<Vec<String>> => (field = 32, kind = "string", repeated),
    repeated_bytes: Option<Vec<Vec<u8>>> => (field = 33, kind = "bytes", repeated),
    repeated_child: Option<Vec<Child>> => (field = 34, kind = "message", repeated),

    packed_double: Option<Vec<f64>> => (field = 35, kind = "double", packed),
    packed_float: Option<Vec<f32>> => (field = 36, kind = "float", packed),
    packed_int32: Option<Vec<i32>> => (field = 37, kind = "int32", packed),
    packed_uint32: Option<Vec<u32>> => (field = 38, kind = "uint32", packed),
    packed_sint32: Option<Vec<i32>> => (field = 39, kind = "sint32", packed),
    packed_fixed32: Option<Vec<u32>> => (field = 40, kind = "fixed32", packed),
    packed_sfixed32: Option<Vec<i32>> => (field = 41, kind = "sfixed32", packed),
    packed_int64: Option<Vec<i64>> => (field = 42, kind = "int64", packed),
    packed_uint64: Option<Vec<u64>> => (field = 43, kind = "uint64", packed),
    packed_sint64: Option<Vec<i64>> => (field = 44, kind = "sint64", packed),
    packed_fixed64: Option<Vec<u64>> => (field = 45, kind = "fixed64", packed),
    packed_sfixed64: Option<Vec<i64>> => (field = 46, kind = "sfixed64", packed),
    packed_bool: Option<Vec<bool>> => (field = 47, kind = "bool", packed),
    packed_enum: Option<Vec<i32>> => (field = 48, kind = "enum", packed),
}

/// A `Sample` with a non-default value in every field
pub fn full_sample() -> Sample {
    Sample {
        double: 1.5,
        float: -2.25,
        int32: -7,
        uint32: 7,
        sint32: -70,
        fixed32: 700,
        sfixed32: -7000,
        int64: -1 << 40,
        uint64: 1 << 40,
        sint64: -(1 << 50),
        fixed64: u64::MAX,
        sfixed64: i64::MIN,
        boolean: true,
        enumeration: 3,
        string: Some("hello".to_string()),
        bytes: Some(vec![0, 1, 2, 255]),
        child: Some(Box::new(Child {
            id: 11,
            name: Some("nested".to_string()),
        })),

        repeated_double: Some(vec![0.5, 0.0, -0.5]),
        repeated_float: Some(vec![1.0, 2.0]),
        repeated_int32: Some(vec![-1, 0, 1]),
        repeated_uint32: Some(vec![1, 2, 3]),
        repeated_sint32: Some(vec![-3, 3]),
        repeated_fixed32: Some(vec![9]),
        repeated_sfixed32: Some(vec![-9]),
        repeated_int64: Some(vec![i64::MAX]),
        repeated_uint64: Some(vec![0, u64::MAX]),
        repeated_sint64: Some(vec![-5]),
        repeated_fixed64: Some(vec![5]),
        repeated_sfixed64: Some(vec![-55]),
        repeated_bool: Some(vec![true, false, true]),
        repeated_enum: Some(vec![0, 1, 2]),
        repeated_string: Some(vec!["a".to_string(), String::new(), "c".to_string()]),
        repeated_bytes: Some(vec![vec![1], Vec::new()]),
        repeated_child: Some(vec![
            Child {
                id: 1,
                name: None,
            },
            Child::default(),
            Child {
                id: 3,
                name: Some("third".to_string()),
            },
        ]),

        packed_double: Some(vec![3.25, -3.25]),
        packed_float: Some(vec![0.125]),
        packed_int32: Some(vec![i32::MIN, i32::MAX]),
        packed_uint32: Some(vec![0, 1]),
        packed_sint32: Some(vec![-2, 2]),
        packed_fixed32: Some(vec![u32::MAX]),
        packed_sfixed32: Some(vec![-1]),
        packed_int64: Some(vec![-64, 64]),
        packed_uint64: Some(vec![64]),
        packed_sint64: Some(vec![i64::MIN]),
        packed_fixed64: Some(vec![8, 16]),
        packed_sfixed64: Some(vec![-8]),
        packed_bool: Some(vec![false, true]),
        packed_enum: Some(vec![4, 5]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessPolicy, AccessStrategy};
    use crate::config::{CodeShape, SchemaConfig, Strategy};
    use crate::schema::{create_schema, RuntimeSchema, Schema, SpecializedSchema};
    use crate::tape::TapeWriter;
    use crate::{FieldType, SchemaError};

    fn configs() -> Vec<SchemaConfig> {
        let mut configs = Vec::new();
        for strategy in [Strategy::Generic, Strategy::Compiled] {
            for code_shape in [CodeShape::Compact, CodeShape::Inline] {
                for prefer_offset_access in [false, true] {
                    configs.push(SchemaConfig {
                        strategy,
                        code_shape,
                        prefer_offset_access,
                        ..SchemaConfig::default()
                    });
                }
            }
        }
        configs
    }

    #[test]
    fn test_derived_descriptor() {
        let descriptor = Sample::descriptor().unwrap();
        assert_eq!(descriptor.name(), "Sample");
        assert_eq!(descriptor.len(), FieldType::ALL.len());

        for (field, field_type) in descriptor.fields().iter().zip(FieldType::ALL) {
            assert_eq!(field.field_type, field_type);
            assert_eq!(field.number, field_type.tag() as u32 + 1);
        }

        let renamed = OffsetOnly::descriptor().unwrap();
        assert_eq!(renamed.name(), "Ledger");
        assert_eq!(renamed.len(), 4);
    }

    #[test]
    fn test_every_engine_agrees() {
        let original = full_sample();

        let mut expected = TapeWriter::new();
        SpecializedSchema::<Sample>::new()
            .write_to(&original, &mut expected)
            .unwrap();

        for config in configs() {
            let schema = create_schema(Sample::descriptor().unwrap(), &config).unwrap();

            let mut tape = TapeWriter::new();
            schema.write_to(&original, &mut tape).unwrap();
            assert_eq!(tape.events(), expected.events(), "{config:?}");

            let mut decoded = Sample::default();
            schema
                .merge_from(&mut decoded, &mut tape.into_reader())
                .unwrap();
            assert_eq!(decoded, original, "{config:?}");
        }
    }

    #[test]
    fn test_offset_only_round_trip() {
        let original = OffsetOnly {
            balance: -250,
            owner: Some("treasury".to_string()),
            child: Some(Box::new(Child {
                id: 2,
                name: None,
            })),
            history: Some(vec![1, 10, 100]),
            cached_total: 99,
        };

        for config in configs() {
            let schema = create_schema(OffsetOnly::descriptor().unwrap(), &config).unwrap();
            let mut tape = TapeWriter::new();
            schema.write_to(&original, &mut tape).unwrap();

            let mut decoded = OffsetOnly::default();
            schema
                .merge_from(&mut decoded, &mut tape.into_reader())
                .unwrap();
            assert_eq!(decoded.balance, original.balance);
            assert_eq!(decoded.owner, original.owner);
            assert_eq!(decoded.child, original.child);
            assert_eq!(decoded.history, original.history);
            assert_eq!(decoded.cached_total, 0);
        }
    }

    #[test]
    fn test_offset_fallback_strategy() {
        let schema = RuntimeSchema::new(
            OffsetOnly::descriptor().unwrap(),
            &AccessPolicy::default(),
        )
        .unwrap();
        let strategies: Vec<_> = schema
            .table()
            .records()
            .iter()
            .map(|record| record.slot.strategy())
            .collect();
        assert_eq!(
            strategies,
            vec![
                AccessStrategy::Offset,
                AccessStrategy::Offset,
                AccessStrategy::Direct,
                AccessStrategy::Offset,
            ]
        );
    }

    #[test]
    fn test_offset_disabled_denies_access() {
        let config = SchemaConfig {
            offset_access: false,
            ..SchemaConfig::default()
        };
        let err = create_schema(OffsetOnly::descriptor().unwrap(), &config)
            .err()
            .unwrap();
        match err {
            SchemaError::AccessDenied { message, field } => {
                assert_eq!(message, "Ledger");
                assert_eq!(field, "balance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
