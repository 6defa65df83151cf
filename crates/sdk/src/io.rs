//! Field-oriented reader and writer contracts
//!
//! Schemas never touch encoded bytes. They drive a [`Writer`] with one typed
//! call per emitted field and pull typed values out of a [`Reader`]. How values
//! are laid out on the wire (varints, zig-zag, length prefixes) is up to the
//! implementation.
//!
//! # Nested Messages
//!
//! Nested messages are framed by the implementation: the schema hands over a
//! callback that writes (or merges) the nested fields against the reader or
//! writer it is given.
//!
//! ```ignore
//! writer.write_message(4, &mut |w| child_schema.write_to(child, w))?;
//! reader.read_message(&mut |r| child_schema.merge_from(child, r))?;
//! ```
//!
//! # Lists
//!
//! List writes carry a `packed` flag. A non-packed list is written as one field
//! entry per element; a packed list as a single length-delimited entry. List
//! reads append into the target and must accept either encoding.

use crate::error::WireError;

/// Field number returned by [`Reader::field_number`] at the end of input
/// (or at the end of the current nested message)
pub const READ_DONE: u32 = 0;

/// Highest field number a message may declare
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Callback writing the fields of a nested message
pub type WriteBody<'a> = dyn FnMut(&mut dyn Writer) -> Result<(), WireError> + 'a;

/// Callback merging the fields of a nested message
pub type MergeBody<'a> = dyn FnMut(&mut dyn Reader) -> Result<(), WireError> + 'a;

/// Consumer of typed field values, driven by a schema's `write_to`
pub trait Writer {
    fn write_double(&mut self, field_number: u32, value: f64) -> Result<(), WireError>;
    fn write_float(&mut self, field_number: u32, value: f32) -> Result<(), WireError>;
    fn write_int32(&mut self, field_number: u32, value: i32) -> Result<(), WireError>;
    fn write_uint32(&mut self, field_number: u32, value: u32) -> Result<(), WireError>;
    fn write_sint32(&mut self, field_number: u32, value: i32) -> Result<(), WireError>;
    fn write_fixed32(&mut self, field_number: u32, value: u32) -> Result<(), WireError>;
    fn write_sfixed32(&mut self, field_number: u32, value: i32) -> Result<(), WireError>;
    fn write_int64(&mut self, field_number: u32, value: i64) -> Result<(), WireError>;
    fn write_uint64(&mut self, field_number: u32, value: u64) -> Result<(), WireError>;
    fn write_sint64(&mut self, field_number: u32, value: i64) -> Result<(), WireError>;
    fn write_fixed64(&mut self, field_number: u32, value: u64) -> Result<(), WireError>;
    fn write_sfixed64(&mut self, field_number: u32, value: i64) -> Result<(), WireError>;
    fn write_bool(&mut self, field_number: u32, value: bool) -> Result<(), WireError>;
    fn write_enum(&mut self, field_number: u32, value: i32) -> Result<(), WireError>;
    fn write_string(&mut self, field_number: u32, value: &str) -> Result<(), WireError>;
    fn write_bytes(&mut self, field_number: u32, value: &[u8]) -> Result<(), WireError>;

    /// Write a nested message; `body` writes its fields
    fn write_message(
        &mut self,
        field_number: u32,
        body: &mut WriteBody<'_>,
    ) -> Result<(), WireError>;

    fn write_double_list(&mut self, field_number: u32, values: &[f64], packed: bool) -> Result<(), WireError>;
    fn write_float_list(&mut self, field_number: u32, values: &[f32], packed: bool) -> Result<(), WireError>;
    fn write_int32_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<(), WireError>;
    fn write_uint32_list(&mut self, field_number: u32, values: &[u32], packed: bool) -> Result<(), WireError>;
    fn write_sint32_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<(), WireError>;
    fn write_fixed32_list(&mut self, field_number: u32, values: &[u32], packed: bool) -> Result<(), WireError>;
    fn write_sfixed32_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<(), WireError>;
    fn write_int64_list(&mut self, field_number: u32, values: &[i64], packed: bool) -> Result<(), WireError>;
    fn write_uint64_list(&mut self, field_number: u32, values: &[u64], packed: bool) -> Result<(), WireError>;
    fn write_sint64_list(&mut self, field_number: u32, values: &[i64], packed: bool) -> Result<(), WireError>;
    fn write_fixed64_list(&mut self, field_number: u32, values: &[u64], packed: bool) -> Result<(), WireError>;
    fn write_sfixed64_list(&mut self, field_number: u32, values: &[i64], packed: bool) -> Result<(), WireError>;
    fn write_bool_list(&mut self, field_number: u32, values: &[bool], packed: bool) -> Result<(), WireError>;
    fn write_enum_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<(), WireError>;

    /// Write one entry per string
    fn write_string_list(&mut self, field_number: u32, values: &[String]) -> Result<(), WireError>;

    /// Write one entry per byte string
    fn write_bytes_list(&mut self, field_number: u32, values: &[Vec<u8>]) -> Result<(), WireError>;
}

/// Source of typed field values, consumed by a schema's `merge_from`
pub trait Reader {
    /// Number of the next field, or [`READ_DONE`] when no field remains
    ///
    /// Does not consume the field; a typed read or [`Reader::skip_field`] must
    /// follow.
    fn field_number(&mut self) -> Result<u32, WireError>;

    /// Skip the current field
    ///
    /// Returns `false` when the input (or the current nested message) is
    /// exhausted after the skip.
    fn skip_field(&mut self) -> Result<bool, WireError>;

    fn read_double(&mut self) -> Result<f64, WireError>;
    fn read_float(&mut self) -> Result<f32, WireError>;
    fn read_int32(&mut self) -> Result<i32, WireError>;
    fn read_uint32(&mut self) -> Result<u32, WireError>;
    fn read_sint32(&mut self) -> Result<i32, WireError>;
    fn read_fixed32(&mut self) -> Result<u32, WireError>;
    fn read_sfixed32(&mut self) -> Result<i32, WireError>;
    fn read_int64(&mut self) -> Result<i64, WireError>;
    fn read_uint64(&mut self) -> Result<u64, WireError>;
    fn read_sint64(&mut self) -> Result<i64, WireError>;
    fn read_fixed64(&mut self) -> Result<u64, WireError>;
    fn read_sfixed64(&mut self) -> Result<i64, WireError>;
    fn read_bool(&mut self) -> Result<bool, WireError>;
    fn read_enum(&mut self) -> Result<i32, WireError>;
    fn read_string(&mut self) -> Result<String, WireError>;
    fn read_bytes(&mut self) -> Result<Vec<u8>, WireError>;

    /// Enter a nested message and let `merge` consume its fields
    ///
    /// Inside `merge`, [`Reader::field_number`] returns [`READ_DONE`] at the end
    /// of the nested message.
    fn read_message(&mut self, merge: &mut MergeBody<'_>) -> Result<(), WireError>;

    fn read_double_list(&mut self, target: &mut Vec<f64>, packed: bool) -> Result<(), WireError>;
    fn read_float_list(&mut self, target: &mut Vec<f32>, packed: bool) -> Result<(), WireError>;
    fn read_int32_list(&mut self, target: &mut Vec<i32>, packed: bool) -> Result<(), WireError>;
    fn read_uint32_list(&mut self, target: &mut Vec<u32>, packed: bool) -> Result<(), WireError>;
    fn read_sint32_list(&mut self, target: &mut Vec<i32>, packed: bool) -> Result<(), WireError>;
    fn read_fixed32_list(&mut self, target: &mut Vec<u32>, packed: bool) -> Result<(), WireError>;
    fn read_sfixed32_list(&mut self, target: &mut Vec<i32>, packed: bool) -> Result<(), WireError>;
    fn read_int64_list(&mut self, target: &mut Vec<i64>, packed: bool) -> Result<(), WireError>;
    fn read_uint64_list(&mut self, target: &mut Vec<u64>, packed: bool) -> Result<(), WireError>;
    fn read_sint64_list(&mut self, target: &mut Vec<i64>, packed: bool) -> Result<(), WireError>;
    fn read_fixed64_list(&mut self, target: &mut Vec<u64>, packed: bool) -> Result<(), WireError>;
    fn read_sfixed64_list(&mut self, target: &mut Vec<i64>, packed: bool) -> Result<(), WireError>;
    fn read_bool_list(&mut self, target: &mut Vec<bool>, packed: bool) -> Result<(), WireError>;
    fn read_enum_list(&mut self, target: &mut Vec<i32>, packed: bool) -> Result<(), WireError>;

    /// Append the current string entry to `target`
    fn read_string_list(&mut self, target: &mut Vec<String>) -> Result<(), WireError>;

    /// Append the current byte-string entry to `target`
    fn read_bytes_list(&mut self, target: &mut Vec<Vec<u8>>) -> Result<(), WireError>;
}
