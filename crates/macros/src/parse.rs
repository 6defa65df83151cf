//! Attribute parsing for the Message derive macro

use darling::{FromDeriveInput, FromField};
use syn::{DeriveInput, Generics, Ident, Type};

/// Parsed #[proto(...)] attributes on the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(proto), supports(struct_named))]
pub struct MessageArgs {
    /// Struct identifier
    pub ident: Ident,

    /// Struct generics (rejected during generation)
    pub generics: Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), ProtoFieldArgs>,

    /// Message name, defaults to the struct name
    #[darling(default)]
    pub name: Option<String>,

    /// Code shape of the generated serializer: "compact" or "inline"
    #[darling(default)]
    pub shape: Option<String>,

    /// Default field access: "direct", "offset" or "both"
    #[darling(default)]
    pub access: Option<String>,
}

/// Parsed #[proto(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(proto))]
pub struct ProtoFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// Field number. Fields without any proto attribute are not serialized.
    #[darling(default)]
    pub field: Option<u32>,

    /// Scalar kind name ("int32", "string", "message", ...)
    #[darling(default)]
    pub kind: Option<String>,

    /// Non-packed repeated field
    #[darling(default)]
    pub repeated: bool,

    /// Packed repeated field
    #[darling(default)]
    pub packed: bool,

    /// Overrides the struct-level access for this field
    #[darling(default)]
    pub access: Option<String>,
}

impl ProtoFieldArgs {
    /// Whether the field carries any `#[proto(...)]` setting
    pub fn is_proto_field(&self) -> bool {
        self.field.is_some()
            || self.kind.is_some()
            || self.repeated
            || self.packed
            || self.access.is_some()
    }
}

/// Parse a DeriveInput into MessageArgs
pub fn parse_message(input: &DeriveInput) -> darling::Result<MessageArgs> {
    MessageArgs::from_derive_input(input)
}
