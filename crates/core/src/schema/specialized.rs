//! Specialized schemas
//!
//! `#[derive(Message)]` emits a dedicated `write_fields` / `merge_fields` pair
//! for a message type. [`SpecializedSchema`] wraps that pair behind the
//! [`Schema`] trait, so callers cannot tell it apart from a runtime schema.
//!
//! # Code Shapes
//!
//! - [`CodeShape::Compact`]: each field is one call into [`emit`]
//! - [`CodeShape::Inline`]: the default check and the reader/writer call are
//!   expanded in place for each field
//!
//! ```ignore
//! #[derive(Default, Message)]
//! #[proto(shape = "inline")]
//! struct Point {
//!     #[proto(field = 1, kind = "sint32")]
//!     x: i32,
//!     #[proto(field = 2, kind = "sint32")]
//!     y: i32,
//! }
//!
//! let schema = SpecializedSchema::<Point>::new();
//! ```

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use protoschema_sdk::{Reader, WireError, Writer};

use super::{Message, Schema};
use crate::config::CodeShape;

/// A message type with generated serialization code
pub trait Specialized: Message {
    /// Message name, the same one the descriptor carries
    const MESSAGE_NAME: &'static str;

    /// Shape of the generated code
    const CODE_SHAPE: CodeShape;

    /// Write every non-default field
    fn write_fields(&self, writer: &mut dyn Writer) -> Result<(), WireError>;

    /// Merge fields from the reader until it is done
    fn merge_fields(&mut self, reader: &mut dyn Reader) -> Result<(), WireError>;
}

/// Schema backed by a type's generated code
pub struct SpecializedSchema<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M: Specialized> SpecializedSchema<M> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Shape of the generated code
    pub const fn shape(&self) -> CodeShape {
        M::CODE_SHAPE
    }
}

impl<M: Specialized> Default for SpecializedSchema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for SpecializedSchema<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SpecializedSchema")
            .field(&type_name::<M>())
            .finish()
    }
}

impl<M: Specialized> Schema<M> for SpecializedSchema<M> {
    fn message_name(&self) -> &'static str {
        M::MESSAGE_NAME
    }

    #[inline]
    fn write_to(&self, message: &M, writer: &mut dyn Writer) -> Result<(), WireError> {
        message.write_fields(writer)
    }

    #[inline]
    fn merge_from(&self, message: &mut M, reader: &mut dyn Reader) -> Result<(), WireError> {
        message.merge_fields(reader)
    }
}

/// Shared per-field routines called by compact generated code
///
/// Every `write_*` applies the default elision rules itself; every `merge_*`
/// consumes exactly one field entry from the reader.
pub mod emit {
    use paste::paste;
    use protoschema_sdk::{Reader, WireError, Writer};

    use super::Specialized;
    use crate::schema::is_default;
    use crate::schema::storage::with_field_types;

    macro_rules! emit_helpers {
        (
            numeric: [$(($ft:ident, $slot:ident, $list:ident, $method:ident, $ty:ty)),* $(,)?],
            objects: [$(($oft:ident, $oslot:ident, $olist:ident, $omethod:ident, $oty:ty)),* $(,)?] $(,)?
        ) => {
            paste! {
                $(
                    #[inline]
                    pub fn [<write_ $method>](
                        writer: &mut dyn Writer,
                        number: u32,
                        value: $ty,
                    ) -> Result<(), WireError> {
                        if is_default(&value) {
                            return Ok(());
                        }
                        writer.[<write_ $method>](number, value)
                    }

                    #[inline]
                    pub fn [<write_ $method _list>](
                        writer: &mut dyn Writer,
                        number: u32,
                        values: &Option<Vec<$ty>>,
                        packed: bool,
                    ) -> Result<(), WireError> {
                        match values {
                            Some(values) if !values.is_empty() => {
                                writer.[<write_ $method _list>](number, values, packed)
                            }
                            _ => Ok(()),
                        }
                    }

                    #[inline]
                    pub fn [<merge_ $method>](
                        reader: &mut dyn Reader,
                        target: &mut $ty,
                    ) -> Result<(), WireError> {
                        *target = reader.[<read_ $method>]()?;
                        Ok(())
                    }

                    #[inline]
                    pub fn [<merge_ $method _list>](
                        reader: &mut dyn Reader,
                        target: &mut Option<Vec<$ty>>,
                        packed: bool,
                    ) -> Result<(), WireError> {
                        reader.[<read_ $method _list>](target.get_or_insert_with(Vec::new), packed)
                    }
                )*
                $(
                    #[inline]
                    pub fn [<write_ $omethod>](
                        writer: &mut dyn Writer,
                        number: u32,
                        value: &Option<$oty>,
                    ) -> Result<(), WireError> {
                        match value {
                            Some(value) => writer.[<write_ $omethod>](number, value),
                            None => Ok(()),
                        }
                    }

                    #[inline]
                    pub fn [<write_ $omethod _list>](
                        writer: &mut dyn Writer,
                        number: u32,
                        values: &Option<Vec<$oty>>,
                    ) -> Result<(), WireError> {
                        match values {
                            Some(values) if !values.is_empty() => {
                                writer.[<write_ $omethod _list>](number, values)
                            }
                            _ => Ok(()),
                        }
                    }

                    #[inline]
                    pub fn [<merge_ $omethod>](
                        reader: &mut dyn Reader,
                        target: &mut Option<$oty>,
                    ) -> Result<(), WireError> {
                        *target = Some(reader.[<read_ $omethod>]()?);
                        Ok(())
                    }

                    #[inline]
                    pub fn [<merge_ $omethod _list>](
                        reader: &mut dyn Reader,
                        target: &mut Option<Vec<$oty>>,
                    ) -> Result<(), WireError> {
                        reader.[<read_ $omethod _list>](target.get_or_insert_with(Vec::new))
                    }
                )*
            }
        };
    }

    with_field_types!(emit_helpers);

    /// Write a singular nested message if present
    pub fn write_message<N: Specialized>(
        writer: &mut dyn Writer,
        number: u32,
        value: &Option<Box<N>>,
    ) -> Result<(), WireError> {
        match value {
            Some(child) => writer.write_message(number, &mut |w: &mut dyn Writer| {
                child.write_fields(w)
            }),
            None => Ok(()),
        }
    }

    /// Write one nested message entry per element
    pub fn write_message_list<N: Specialized>(
        writer: &mut dyn Writer,
        number: u32,
        values: &Option<Vec<N>>,
    ) -> Result<(), WireError> {
        for item in values.iter().flatten() {
            writer.write_message(number, &mut |w: &mut dyn Writer| item.write_fields(w))?;
        }
        Ok(())
    }

    /// Merge a nested message into the existing value, creating it if absent
    pub fn merge_message<N: Specialized>(
        reader: &mut dyn Reader,
        target: &mut Option<Box<N>>,
    ) -> Result<(), WireError> {
        let child = target.get_or_insert_with(Box::default);
        reader.read_message(&mut |r: &mut dyn Reader| child.merge_fields(r))
    }

    /// Merge one nested message occurrence as a new element
    pub fn merge_message_list<N: Specialized>(
        reader: &mut dyn Reader,
        target: &mut Option<Vec<N>>,
    ) -> Result<(), WireError> {
        let mut item = N::default();
        reader.read_message(&mut |r: &mut dyn Reader| item.merge_fields(r))?;
        target.get_or_insert_with(Vec::new).push(item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessPolicy;
    use crate::schema::RuntimeSchema;
    use crate::tape::{TapeWriter, WireEvent, WireValue};
    use crate::testing::{full_sample, InlineSample, OffsetOnly, Sample, Sparse};

    #[test]
    fn test_emit_elides_defaults() {
        let mut tape = TapeWriter::new();
        emit::write_double(&mut tape, 1, 0.0).unwrap();
        emit::write_bool(&mut tape, 2, false).unwrap();
        emit::write_string(&mut tape, 3, &None).unwrap();
        emit::write_int64_list(&mut tape, 4, &Some(Vec::new()), true).unwrap();
        emit::write_bytes_list(&mut tape, 5, &None).unwrap();
        assert!(tape.events().is_empty());

        emit::write_enum(&mut tape, 6, 2).unwrap();
        emit::write_string(&mut tape, 7, &Some(String::new())).unwrap();
        assert_eq!(
            tape.events(),
            &[
                WireEvent::Field {
                    number: 6,
                    value: WireValue::Enum(2)
                },
                WireEvent::Field {
                    number: 7,
                    value: WireValue::String(String::new())
                },
            ]
        );
    }

    #[test]
    fn test_message_name_matches_descriptor() {
        let generated = SpecializedSchema::<OffsetOnly>::new();
        assert_eq!(generated.message_name(), "Ledger");
        assert_eq!(
            generated.message_name(),
            OffsetOnly::descriptor().unwrap().name()
        );
        assert_eq!(SpecializedSchema::<Sparse>::new().message_name(), "Sparse");
    }

    #[test]
    fn test_specialized_round_trip() {
        let schema = SpecializedSchema::<Sample>::new();
        assert_eq!(schema.shape(), CodeShape::Compact);

        let original = full_sample();
        let mut tape = TapeWriter::new();
        schema.write_to(&original, &mut tape).unwrap();

        let mut decoded = Sample::default();
        schema.merge_from(&mut decoded, &mut tape.into_reader()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_specialized_matches_runtime_calls() {
        let runtime =
            RuntimeSchema::new(Sample::descriptor().unwrap(), &AccessPolicy::default()).unwrap();
        let original = full_sample();

        let mut expected = TapeWriter::new();
        runtime.write_to(&original, &mut expected).unwrap();

        let mut compact = TapeWriter::new();
        SpecializedSchema::<Sample>::new()
            .write_to(&original, &mut compact)
            .unwrap();
        assert_eq!(compact.events(), expected.events());

        let inline_message = InlineSample::from(&original);
        let mut inline = TapeWriter::new();
        SpecializedSchema::<InlineSample>::new()
            .write_to(&inline_message, &mut inline)
            .unwrap();
        assert_eq!(SpecializedSchema::<InlineSample>::new().shape(), CodeShape::Inline);
        assert_eq!(inline.events(), expected.events());
    }

    #[test]
    fn test_specialized_lookup_dispatch_skips_unknown() {
        let mut tape = TapeWriter::new();
        tape.push(WireEvent::Field {
            number: 3,
            value: WireValue::Int32(1),
        });
        tape.push(WireEvent::Field {
            number: 100,
            value: WireValue::String("last".to_string()),
        });
        tape.push(WireEvent::Field {
            number: 2,
            value: WireValue::Bool(true),
        });

        let mut decoded = Sparse::default();
        SpecializedSchema::<Sparse>::new()
            .merge_from(&mut decoded, &mut tape.into_reader())
            .unwrap();
        assert_eq!(decoded.first, 0);
        assert!(decoded.second);
        assert_eq!(decoded.last.as_deref(), Some("last"));
    }
}
