//! Field type taxonomy
//!
//! Every field a schema can serialize is classified by a [`FieldType`]: one of
//! 17 [`ScalarKind`]s in singular or repeated form, plus a packed-repeated form
//! for the 14 kinds that can be packed.
//!
//! # Tag Layout
//!
//! ```text
//! ┌──────────────────┬──────────────────┬──────────────────┐
//! │  singular 0..17  │  repeated 17..34 │  packed 34..48   │
//! └──────────────────┴──────────────────┴──────────────────┘
//!   tag = kind          tag = 17 + kind    tag = 34 + kind
//! ```
//!
//! The packable kinds are ordered first in [`ScalarKind`], so the packed block
//! stays contiguous.

use std::fmt;

/// Number of scalar kinds
pub const SCALAR_KIND_COUNT: usize = 17;

/// Number of scalar kinds that may be packed
pub const PACKABLE_KIND_COUNT: usize = 14;

/// Number of field types (singular + repeated + packed)
pub const FIELD_TYPE_COUNT: usize = SCALAR_KIND_COUNT * 2 + PACKABLE_KIND_COUNT;

/// Wire category of an encoded field entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireCategory {
    Varint,
    Fixed32,
    Fixed64,
    LengthDelimited,
}

/// The scalar kind of a field, independent of cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ScalarKind {
    Double = 0,
    Float = 1,
    Int32 = 2,
    UInt32 = 3,
    SInt32 = 4,
    Fixed32 = 5,
    SFixed32 = 6,
    Int64 = 7,
    UInt64 = 8,
    SInt64 = 9,
    Fixed64 = 10,
    SFixed64 = 11,
    Bool = 12,
    Enum = 13,
    String = 14,
    Bytes = 15,
    Message = 16,
}

impl ScalarKind {
    /// All scalar kinds in tag order
    pub const ALL: [ScalarKind; SCALAR_KIND_COUNT] = [
        ScalarKind::Double,
        ScalarKind::Float,
        ScalarKind::Int32,
        ScalarKind::UInt32,
        ScalarKind::SInt32,
        ScalarKind::Fixed32,
        ScalarKind::SFixed32,
        ScalarKind::Int64,
        ScalarKind::UInt64,
        ScalarKind::SInt64,
        ScalarKind::Fixed64,
        ScalarKind::SFixed64,
        ScalarKind::Bool,
        ScalarKind::Enum,
        ScalarKind::String,
        ScalarKind::Bytes,
        ScalarKind::Message,
    ];

    /// Protobuf-style name of the kind (e.g. `"sint64"`)
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Double => "double",
            ScalarKind::Float => "float",
            ScalarKind::Int32 => "int32",
            ScalarKind::UInt32 => "uint32",
            ScalarKind::SInt32 => "sint32",
            ScalarKind::Fixed32 => "fixed32",
            ScalarKind::SFixed32 => "sfixed32",
            ScalarKind::Int64 => "int64",
            ScalarKind::UInt64 => "uint64",
            ScalarKind::SInt64 => "sint64",
            ScalarKind::Fixed64 => "fixed64",
            ScalarKind::SFixed64 => "sfixed64",
            ScalarKind::Bool => "bool",
            ScalarKind::Enum => "enum",
            ScalarKind::String => "string",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Message => "message",
        }
    }

    /// Look up a kind by its protobuf-style name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Rust type used to store a single value of this kind
    ///
    /// Enums are stored as their raw `i32` value. Messages have no fixed
    /// storage type; `"message"` is returned for them.
    pub const fn rust_type(self) -> &'static str {
        match self {
            ScalarKind::Double => "f64",
            ScalarKind::Float => "f32",
            ScalarKind::Int32 | ScalarKind::SInt32 | ScalarKind::SFixed32 | ScalarKind::Enum => {
                "i32"
            }
            ScalarKind::UInt32 | ScalarKind::Fixed32 => "u32",
            ScalarKind::Int64 | ScalarKind::SInt64 | ScalarKind::SFixed64 => "i64",
            ScalarKind::UInt64 | ScalarKind::Fixed64 => "u64",
            ScalarKind::Bool => "bool",
            ScalarKind::String => "String",
            ScalarKind::Bytes => "Vec<u8>",
            ScalarKind::Message => "message",
        }
    }

    /// Wire category of one value of this kind
    pub const fn wire_category(self) -> WireCategory {
        match self {
            ScalarKind::Double | ScalarKind::Fixed64 | ScalarKind::SFixed64 => {
                WireCategory::Fixed64
            }
            ScalarKind::Float | ScalarKind::Fixed32 | ScalarKind::SFixed32 => {
                WireCategory::Fixed32
            }
            ScalarKind::String | ScalarKind::Bytes | ScalarKind::Message => {
                WireCategory::LengthDelimited
            }
            _ => WireCategory::Varint,
        }
    }

    /// Whether repeated values of this kind may use the packed encoding
    pub const fn is_packable(self) -> bool {
        (self as u8 as usize) < PACKABLE_KIND_COUNT
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a raw tag does not name a [`FieldType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type tag: {0}")]
pub struct UnknownFieldType(pub u8);

/// Classification of a message field
///
/// A closed set of 48 variants. Values are plain `Copy` data shared by every
/// descriptor that uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    Double = 0,
    Float = 1,
    Int32 = 2,
    UInt32 = 3,
    SInt32 = 4,
    Fixed32 = 5,
    SFixed32 = 6,
    Int64 = 7,
    UInt64 = 8,
    SInt64 = 9,
    Fixed64 = 10,
    SFixed64 = 11,
    Bool = 12,
    Enum = 13,
    String = 14,
    Bytes = 15,
    Message = 16,

    RepeatedDouble = 17,
    RepeatedFloat = 18,
    RepeatedInt32 = 19,
    RepeatedUInt32 = 20,
    RepeatedSInt32 = 21,
    RepeatedFixed32 = 22,
    RepeatedSFixed32 = 23,
    RepeatedInt64 = 24,
    RepeatedUInt64 = 25,
    RepeatedSInt64 = 26,
    RepeatedFixed64 = 27,
    RepeatedSFixed64 = 28,
    RepeatedBool = 29,
    RepeatedEnum = 30,
    RepeatedString = 31,
    RepeatedBytes = 32,
    RepeatedMessage = 33,

    PackedDouble = 34,
    PackedFloat = 35,
    PackedInt32 = 36,
    PackedUInt32 = 37,
    PackedSInt32 = 38,
    PackedFixed32 = 39,
    PackedSFixed32 = 40,
    PackedInt64 = 41,
    PackedUInt64 = 42,
    PackedSInt64 = 43,
    PackedFixed64 = 44,
    PackedSFixed64 = 45,
    PackedBool = 46,
    PackedEnum = 47,
}

const REPEATED_BASE: u8 = SCALAR_KIND_COUNT as u8;
const PACKED_BASE: u8 = (SCALAR_KIND_COUNT * 2) as u8;

impl FieldType {
    /// All field types in tag order
    pub const ALL: [FieldType; FIELD_TYPE_COUNT] = [
        FieldType::Double,
        FieldType::Float,
        FieldType::Int32,
        FieldType::UInt32,
        FieldType::SInt32,
        FieldType::Fixed32,
        FieldType::SFixed32,
        FieldType::Int64,
        FieldType::UInt64,
        FieldType::SInt64,
        FieldType::Fixed64,
        FieldType::SFixed64,
        FieldType::Bool,
        FieldType::Enum,
        FieldType::String,
        FieldType::Bytes,
        FieldType::Message,
        FieldType::RepeatedDouble,
        FieldType::RepeatedFloat,
        FieldType::RepeatedInt32,
        FieldType::RepeatedUInt32,
        FieldType::RepeatedSInt32,
        FieldType::RepeatedFixed32,
        FieldType::RepeatedSFixed32,
        FieldType::RepeatedInt64,
        FieldType::RepeatedUInt64,
        FieldType::RepeatedSInt64,
        FieldType::RepeatedFixed64,
        FieldType::RepeatedSFixed64,
        FieldType::RepeatedBool,
        FieldType::RepeatedEnum,
        FieldType::RepeatedString,
        FieldType::RepeatedBytes,
        FieldType::RepeatedMessage,
        FieldType::PackedDouble,
        FieldType::PackedFloat,
        FieldType::PackedInt32,
        FieldType::PackedUInt32,
        FieldType::PackedSInt32,
        FieldType::PackedFixed32,
        FieldType::PackedSFixed32,
        FieldType::PackedInt64,
        FieldType::PackedUInt64,
        FieldType::PackedSInt64,
        FieldType::PackedFixed64,
        FieldType::PackedSFixed64,
        FieldType::PackedBool,
        FieldType::PackedEnum,
    ];

    /// Singular field of the given kind
    pub const fn singular(kind: ScalarKind) -> Self {
        Self::ALL[kind as usize]
    }

    /// Non-packed repeated field of the given kind
    pub const fn repeated(kind: ScalarKind) -> Self {
        Self::ALL[REPEATED_BASE as usize + kind as usize]
    }

    /// Packed repeated field of the given kind, if the kind is packable
    pub const fn packed(kind: ScalarKind) -> Option<Self> {
        if kind.is_packable() {
            Some(Self::ALL[PACKED_BASE as usize + kind as usize])
        } else {
            None
        }
    }

    /// Stable numeric tag of this field type
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Scalar kind of the values held by this field
    pub const fn scalar(self) -> ScalarKind {
        let tag = self as u8;
        let index = if tag >= PACKED_BASE {
            tag - PACKED_BASE
        } else if tag >= REPEATED_BASE {
            tag - REPEATED_BASE
        } else {
            tag
        };
        ScalarKind::ALL[index as usize]
    }

    /// Whether the field holds a list of values
    #[inline]
    pub const fn is_list(self) -> bool {
        self as u8 >= REPEATED_BASE
    }

    /// Whether the list is written as one length-delimited block
    #[inline]
    pub const fn is_packed(self) -> bool {
        self as u8 >= PACKED_BASE
    }

    /// Wire category of one entry written for this field
    pub const fn wire_category(self) -> WireCategory {
        if self.is_packed() {
            WireCategory::LengthDelimited
        } else {
            self.scalar().wire_category()
        }
    }
}

impl TryFrom<u8> for FieldType {
    type Error = UnknownFieldType;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(tag as usize)
            .copied()
            .ok_or(UnknownFieldType(tag))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_packed() {
            write!(f, "packed {}", self.scalar())
        } else if self.is_list() {
            write!(f, "repeated {}", self.scalar())
        } else {
            write!(f, "{}", self.scalar())
        }
    }
}
