//! Field storage kinds
//!
//! Every field type is stored in exactly one Rust representation:
//!
//! ```text
//! double            f64           repeated/packed double    Option<Vec<f64>>
//! float             f32           repeated/packed float     Option<Vec<f32>>
//! int32 sint32
//! sfixed32 enum     i32           ...                       Option<Vec<i32>>
//! uint32 fixed32    u32                                     Option<Vec<u32>>
//! int64 sint64
//! sfixed64          i64                                     Option<Vec<i64>>
//! uint64 fixed64    u64                                     Option<Vec<u64>>
//! bool              bool                                    Option<Vec<bool>>
//! string            Option<String>    repeated string       Option<Vec<String>>
//! bytes             Option<Vec<u8>>   repeated bytes        Option<Vec<Vec<u8>>>
//! message           Option<Box<N>>    repeated message      Option<Vec<N>>
//! ```
//!
//! A [`Storage`] holds the access candidates for a field as declared; a
//! [`Slot`] holds the single accessor chosen when the schema is built.

use protoschema_sdk::{FieldType, ScalarKind};

use super::nested::{MessageField, PendingMessage};
use crate::access::{Access, AccessPolicy, AccessStrategy, Candidates};
use crate::error::SchemaResult;

macro_rules! define_storage {
    ($($variant:ident($ty:ty) => $name:literal,)*) => {
        /// Rust representation of a field, without the accessor
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StorageKind {
            $($variant,)*
            Message,
            MessageList,
        }

        impl StorageKind {
            /// Rust type of the storage, for diagnostics
            pub const fn name(self) -> &'static str {
                match self {
                    $(StorageKind::$variant => $name,)*
                    StorageKind::Message => "Option<Box<message>>",
                    StorageKind::MessageList => "Option<Vec<message>>",
                }
            }
        }

        /// Declared storage of a field: its access candidates
        pub enum Storage<M> {
            $($variant(Candidates<M, $ty>),)*
            Message(Box<dyn PendingMessage<M>>),
            MessageList(Box<dyn PendingMessage<M>>),
        }

        /// Resolved storage of a field: the accessor the schema uses
        pub enum Slot<M> {
            $($variant(Access<M, $ty>),)*
            Message(Box<dyn MessageField<M>>),
            MessageList(Box<dyn MessageField<M>>),
        }

        $(
            impl<M> From<Candidates<M, $ty>> for Storage<M> {
                fn from(candidates: Candidates<M, $ty>) -> Self {
                    Storage::$variant(candidates)
                }
            }
        )*

        impl<M> Storage<M> {
            /// Storage kind of this field
            pub fn kind(&self) -> StorageKind {
                match self {
                    $(Storage::$variant(_) => StorageKind::$variant,)*
                    Storage::Message(_) => StorageKind::Message,
                    Storage::MessageList(_) => StorageKind::MessageList,
                }
            }

            /// Pick the accessor for this field
            pub fn resolve(
                self,
                policy: &AccessPolicy,
                message: &'static str,
                field: &'static str,
            ) -> SchemaResult<Slot<M>> {
                Ok(match self {
                    $(Storage::$variant(candidates) => {
                        Slot::$variant(candidates.resolve(policy, message, field)?)
                    })*
                    Storage::Message(pending) => {
                        Slot::Message(pending.resolve(policy, message, field)?)
                    }
                    Storage::MessageList(pending) => {
                        Slot::MessageList(pending.resolve(policy, message, field)?)
                    }
                })
            }
        }

        impl<M> Slot<M> {
            /// Storage kind of this field
            pub fn kind(&self) -> StorageKind {
                match self {
                    $(Slot::$variant(_) => StorageKind::$variant,)*
                    Slot::Message(_) => StorageKind::Message,
                    Slot::MessageList(_) => StorageKind::MessageList,
                }
            }

            /// Access strategy chosen for this field
            pub fn strategy(&self) -> AccessStrategy {
                match self {
                    $(Slot::$variant(access) => access.strategy(),)*
                    Slot::Message(field) | Slot::MessageList(field) => field.strategy(),
                }
            }
        }
    };
}

define_storage! {
    F64(f64) => "f64",
    F32(f32) => "f32",
    I32(i32) => "i32",
    U32(u32) => "u32",
    I64(i64) => "i64",
    U64(u64) => "u64",
    Bool(bool) => "bool",
    Str(Option<String>) => "Option<String>",
    Bytes(Option<Vec<u8>>) => "Option<Vec<u8>>",
    F64List(Option<Vec<f64>>) => "Option<Vec<f64>>",
    F32List(Option<Vec<f32>>) => "Option<Vec<f32>>",
    I32List(Option<Vec<i32>>) => "Option<Vec<i32>>",
    U32List(Option<Vec<u32>>) => "Option<Vec<u32>>",
    I64List(Option<Vec<i64>>) => "Option<Vec<i64>>",
    U64List(Option<Vec<u64>>) => "Option<Vec<u64>>",
    BoolList(Option<Vec<bool>>) => "Option<Vec<bool>>",
    StrList(Option<Vec<String>>) => "Option<Vec<String>>",
    BytesList(Option<Vec<Vec<u8>>>) => "Option<Vec<Vec<u8>>>",
}

impl StorageKind {
    /// The storage kind a field type requires
    pub const fn for_field_type(field_type: FieldType) -> Self {
        let singular = match field_type.scalar() {
            ScalarKind::Double => StorageKind::F64,
            ScalarKind::Float => StorageKind::F32,
            ScalarKind::Int32 | ScalarKind::SInt32 | ScalarKind::SFixed32 | ScalarKind::Enum => {
                StorageKind::I32
            }
            ScalarKind::UInt32 | ScalarKind::Fixed32 => StorageKind::U32,
            ScalarKind::Int64 | ScalarKind::SInt64 | ScalarKind::SFixed64 => StorageKind::I64,
            ScalarKind::UInt64 | ScalarKind::Fixed64 => StorageKind::U64,
            ScalarKind::Bool => StorageKind::Bool,
            ScalarKind::String => StorageKind::Str,
            ScalarKind::Bytes => StorageKind::Bytes,
            ScalarKind::Message => StorageKind::Message,
        };

        if field_type.is_list() {
            singular.list()
        } else {
            singular
        }
    }

    /// List storage holding elements of this kind
    const fn list(self) -> Self {
        match self {
            StorageKind::F64 => StorageKind::F64List,
            StorageKind::F32 => StorageKind::F32List,
            StorageKind::I32 => StorageKind::I32List,
            StorageKind::U32 => StorageKind::U32List,
            StorageKind::I64 => StorageKind::I64List,
            StorageKind::U64 => StorageKind::U64List,
            StorageKind::Bool => StorageKind::BoolList,
            StorageKind::Str => StorageKind::StrList,
            StorageKind::Bytes => StorageKind::BytesList,
            StorageKind::Message => StorageKind::MessageList,
            list => list,
        }
    }

    /// Whether a field of `field_type` can live in this storage
    pub fn accepts(self, field_type: FieldType) -> bool {
        Self::for_field_type(field_type) == self
    }

    /// Field types this storage can hold, in tag order
    pub fn field_types(self) -> impl Iterator<Item = FieldType> {
        FieldType::ALL
            .into_iter()
            .filter(move |field_type| self.accepts(*field_type))
    }
}

/// Invoke `$callback!` with the table of field types that share one code path
///
/// Each `numeric` row is `(FieldType variant, scalar slot, list slot,
/// reader/writer method stem, Rust type)`; every numeric kind is packable.
/// `objects` rows have the same shape for string and bytes. Message fields
/// are not listed; each caller handles them through
/// [`MessageField`](super::nested::MessageField).
macro_rules! with_field_types {
    ($callback:ident) => {
        $callback! {
            numeric: [
                (Double, F64, F64List, double, f64),
                (Float, F32, F32List, float, f32),
                (Int32, I32, I32List, int32, i32),
                (UInt32, U32, U32List, uint32, u32),
                (SInt32, I32, I32List, sint32, i32),
                (Fixed32, U32, U32List, fixed32, u32),
                (SFixed32, I32, I32List, sfixed32, i32),
                (Int64, I64, I64List, int64, i64),
                (UInt64, U64, U64List, uint64, u64),
                (SInt64, I64, I64List, sint64, i64),
                (Fixed64, U64, U64List, fixed64, u64),
                (SFixed64, I64, I64List, sfixed64, i64),
                (Bool, Bool, BoolList, bool, bool),
                (Enum, I32, I32List, enum, i32),
            ],
            objects: [
                (String, Str, StrList, string, String),
                (Bytes, Bytes, BytesList, bytes, Vec<u8>),
            ],
        }
    };
}

pub(crate) use with_field_types;
