//! protoschema Proc Macros
//!
//! This crate provides `#[derive(Message)]`, which generates both the field
//! descriptor used by the runtime and compiled schemas and a specialized
//! serializer for the type.
//!
//! # Example
//!
//! ```ignore
//! use protoschema_core::Message;
//!
//! #[derive(Debug, Default, Message)]
//! #[proto(name = "Person", shape = "inline")]
//! pub struct Person {
//!     #[proto(field = 1, kind = "int32")]
//!     id: i32,
//!
//!     #[proto(field = 2, kind = "string")]
//!     name: Option<String>,
//!
//!     #[proto(field = 3, kind = "message")]
//!     address: Option<Box<Address>>,
//!
//!     #[proto(field = 4, kind = "sint32", packed)]
//!     scores: Option<Vec<i32>>,
//!
//!     // Not serialized
//!     cache: u64,
//! }
//! ```
//!
//! # Attributes
//!
//! ## Struct Attributes
//!
//! - `#[proto(name = "Name")]` - Message name (default: the struct name).
//! - `#[proto(shape = "compact")]` - Generated code calls shared helpers per
//!   field (default). `"inline"` expands each field in place.
//! - `#[proto(access = "direct")]` - Field access offered to the schema:
//!   `"direct"` (default), `"offset"` or `"both"`.
//!
//! ## Field Attributes
//!
//! - `#[proto(field = N)]` - **Required** on serialized fields. Fields with no
//!   `#[proto]` attribute at all are skipped.
//! - `#[proto(kind = "int32")]` - **Required.** Scalar kind: `double`, `float`,
//!   `int32`, `uint32`, `sint32`, `fixed32`, `sfixed32`, `int64`, `uint64`,
//!   `sint64`, `fixed64`, `sfixed64`, `bool`, `enum`, `string`, `bytes`,
//!   `message`.
//! - `#[proto(repeated)]` - Non-packed repeated field.
//! - `#[proto(packed)]` - Packed repeated field (numeric kinds only). Not
//!   combined with `repeated`.
//! - `#[proto(access = "offset")]` - Override the struct-level access.
//!
//! # Storage
//!
//! | Field                  | Rust type           |
//! |------------------------|---------------------|
//! | numeric / bool / enum  | `T` (`i32` for enum)|
//! | string / bytes         | `Option<String>` / `Option<Vec<u8>>` |
//! | message                | `Option<Box<N>>`    |
//! | repeated / packed      | `Option<Vec<T>>`    |
//! | repeated message       | `Option<Vec<N>>`    |

mod message;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for schema-driven messages
///
/// Field numbers must be declared in increasing order. Duplicates, missing
/// numbers, unknown kinds and packed non-numeric fields are compile errors.
///
/// # Generated Code
///
/// - `impl Message` - descriptor listing every `#[proto(field = ..)]` field,
///   and `specialized_schema` returning the generated code
/// - `impl Specialized` - `write_fields` / `merge_fields` for the type, with
///   the merge dispatch shaped by the same cost model the runtime schemas use
#[proc_macro_derive(Message, attributes(proto))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    message::derive_message(input).into()
}
