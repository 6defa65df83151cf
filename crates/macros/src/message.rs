//! Message derive macro implementation
//!
//! Generates two impls for a struct:
//!
//! - `Message`: a descriptor built through `MessageDescriptor::builder`, used
//!   by the runtime and compiled schemas
//! - `Specialized`: straight-line `write_fields` and a `merge_fields` loop
//!   dispatching on the field number
//!
//! ```text
//! #[proto(field = 3, kind = "sint32", packed)]     scores: Option<Vec<i32>>
//!
//! descriptor:  .field(3, "scores", FieldType::PackedSInt32, direct!(M, scores))
//! compact:     emit::write_sint32_list(writer, 3, &self.scores, true)?;
//! inline:      if let Some(values) = &self.scores { if !values.is_empty() { ... } }
//! ```

use proc_macro2::{Literal, TokenStream};
use protoschema_sdk::{DispatchShape, FieldType, ScalarKind};
use quote::{format_ident, quote};
use syn::{DeriveInput, GenericArgument, Ident, PathArguments, Type};

use crate::parse::{parse_message, MessageArgs, ProtoFieldArgs};

/// Shape of the generated serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Compact,
    Inline,
}

/// How the descriptor reaches a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessKind {
    Direct,
    Offset,
    Both,
}

impl AccessKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "direct" => Some(AccessKind::Direct),
            "offset" => Some(AccessKind::Offset),
            "both" => Some(AccessKind::Both),
            _ => None,
        }
    }
}

/// A field after attribute validation
struct FieldPlan<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    number: u32,
    kind: ScalarKind,
    field_type: FieldType,
    access: AccessKind,
    /// Element type of a repeated message field
    element: Option<&'a Type>,
}

impl FieldPlan<'_> {
    fn is_list(&self) -> bool {
        self.field_type.is_list()
    }

    fn number_lit(&self) -> Literal {
        Literal::u32_unsuffixed(self.number)
    }

    fn method(&self, prefix: &str) -> Ident {
        if self.is_list() {
            format_ident!("{}_{}_list", prefix, self.kind.name())
        } else {
            format_ident!("{}_{}", prefix, self.kind.name())
        }
    }
}

/// Generate the Message and Specialized implementations
pub fn derive_message(input: DeriveInput) -> TokenStream {
    match parse_message(&input) {
        Ok(args) => generate_impl(args).unwrap_or_else(syn::Error::into_compile_error),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: MessageArgs) -> syn::Result<TokenStream> {
    let struct_name = &args.ident;

    if !args.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &args.generics,
            "Message cannot be derived for generic structs",
        ));
    }

    let message_name = args.name.clone().unwrap_or_else(|| struct_name.to_string());

    let shape = match args.shape.as_deref() {
        None | Some("compact") => Shape::Compact,
        Some("inline") => Shape::Inline,
        Some(other) => {
            return Err(syn::Error::new_spanned(
                struct_name,
                format!("unknown shape `{}`, expected \"compact\" or \"inline\"", other),
            ))
        }
    };

    let default_access = match args.access.as_deref() {
        None => AccessKind::Direct,
        Some(value) => AccessKind::parse(value).ok_or_else(|| {
            syn::Error::new_spanned(
                struct_name,
                format!(
                    "unknown access `{}`, expected \"direct\", \"offset\" or \"both\"",
                    value
                ),
            )
        })?,
    };

    let fields = match &args.data {
        darling::ast::Data::Struct(fields) => &fields.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Message can only be derived for structs",
            ))
        }
    };

    let mut plans = Vec::new();
    for field in fields.iter().filter(|f| f.is_proto_field()) {
        let plan = plan_field(field, default_access)?;
        if let Some(previous) = plans.last().map(|p: &FieldPlan| p.number) {
            if plan.number <= previous {
                let problem = if plan.number == previous {
                    "duplicate field number"
                } else {
                    "field numbers must be declared in increasing order"
                };
                return Err(syn::Error::new_spanned(
                    plan.ident,
                    format!("{} {} (previous {})", problem, plan.number, previous),
                ));
            }
        }
        plans.push(plan);
    }

    let descriptor = generate_descriptor(struct_name, &message_name, &plans);
    let specialized = generate_specialized(struct_name, &message_name, shape, &plans);

    Ok(quote! {
        #descriptor
        #specialized
    })
}

fn plan_field(field: &ProtoFieldArgs, default_access: AccessKind) -> syn::Result<FieldPlan<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(&field.ty, "Message fields must be named"))?;

    let number = field.field.ok_or_else(|| {
        syn::Error::new_spanned(ident, "missing `field` number for proto field")
    })?;
    if number == 0 || number > protoschema_sdk::MAX_FIELD_NUMBER {
        return Err(syn::Error::new_spanned(
            ident,
            format!(
                "field number {} is outside 1..={}",
                number,
                protoschema_sdk::MAX_FIELD_NUMBER
            ),
        ));
    }

    let kind_name = field
        .kind
        .as_deref()
        .ok_or_else(|| syn::Error::new_spanned(ident, "missing `kind` for proto field"))?;
    let kind = ScalarKind::from_name(kind_name).ok_or_else(|| {
        syn::Error::new_spanned(ident, format!("unknown field kind `{}`", kind_name))
    })?;

    if field.packed && field.repeated {
        return Err(syn::Error::new_spanned(
            ident,
            "`repeated` and `packed` are exclusive; `packed` already implies a list",
        ));
    }

    let field_type = if field.packed {
        FieldType::packed(kind).ok_or_else(|| {
            syn::Error::new_spanned(ident, format!("`{}` fields cannot be packed", kind))
        })?
    } else if field.repeated {
        FieldType::repeated(kind)
    } else {
        FieldType::singular(kind)
    };

    let access = match field.access.as_deref() {
        None => default_access,
        Some(value) => AccessKind::parse(value).ok_or_else(|| {
            syn::Error::new_spanned(ident, format!("unknown access `{}`", value))
        })?,
    };

    let element = if field_type == FieldType::RepeatedMessage {
        let element = generic_arg(&field.ty, "Option")
            .and_then(|inner| generic_arg(inner, "Vec"))
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "repeated message fields must be stored as Option<Vec<T>>",
                )
            })?;
        Some(element)
    } else {
        None
    };

    Ok(FieldPlan {
        ident,
        ty: &field.ty,
        number,
        kind,
        field_type,
        access,
        element,
    })
}

/// Single generic argument of `Outer<T>`, matched on the last path segment
///
/// Types passed through a `macro_rules!` `$ty:ty` fragment arrive wrapped in
/// an invisible group.
fn generic_arg<'a>(ty: &'a Type, outer: &str) -> Option<&'a Type> {
    let type_path = match ty {
        Type::Path(type_path) => type_path,
        Type::Group(group) => return generic_arg(&group.elem, outer),
        Type::Paren(paren) => return generic_arg(&paren.elem, outer),
        _ => return None,
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != outer {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn generate_descriptor(struct_name: &Ident, message_name: &str, plans: &[FieldPlan]) -> TokenStream {
    let fields = plans.iter().map(|plan| {
        let number = plan.number_lit();
        let name = plan.ident.to_string();
        let ident = plan.ident;
        let ty = plan.ty;

        let storage = match plan.access {
            AccessKind::Direct => quote! { ::protoschema_core::direct!(#struct_name, #ident) },
            AccessKind::Offset => {
                quote! { ::protoschema_core::offset!(#struct_name, #ident: #ty) }
            }
            AccessKind::Both => quote! { ::protoschema_core::access!(#struct_name, #ident: #ty) },
        };

        match plan.field_type {
            FieldType::Message => quote! { .message(#number, #name, #storage) },
            FieldType::RepeatedMessage => quote! { .message_list(#number, #name, #storage) },
            field_type => {
                let variant = format_ident!("{}", format!("{:?}", field_type));
                quote! {
                    .field(#number, #name, ::protoschema_core::sdk::FieldType::#variant, #storage)
                }
            }
        }
    });

    quote! {
        impl ::protoschema_core::schema::Message for #struct_name {
            fn descriptor() -> ::protoschema_core::SchemaResult<
                ::protoschema_core::schema::MessageDescriptor<Self>,
            > {
                ::protoschema_core::schema::MessageDescriptor::<#struct_name>::builder(#message_name)
                    #(#fields)*
                    .build()
            }

            fn specialized_schema() -> ::core::option::Option<
                ::std::sync::Arc<dyn ::protoschema_core::schema::Schema<Self>>,
            > {
                let schema: ::std::sync::Arc<dyn ::protoschema_core::schema::Schema<Self>> =
                    ::std::sync::Arc::new(
                        ::protoschema_core::schema::SpecializedSchema::<#struct_name>::new(),
                    );
                ::core::option::Option::Some(schema)
            }
        }
    }
}

fn generate_specialized(
    struct_name: &Ident,
    message_name: &str,
    shape: Shape,
    plans: &[FieldPlan],
) -> TokenStream {
    let code_shape = match shape {
        Shape::Compact => quote! { ::protoschema_core::config::CodeShape::Compact },
        Shape::Inline => quote! { ::protoschema_core::config::CodeShape::Inline },
    };

    let writes: Vec<_> = plans
        .iter()
        .map(|plan| match shape {
            Shape::Compact => compact_write(plan),
            Shape::Inline => inline_write(plan),
        })
        .collect();

    let arms: Vec<(u32, TokenStream)> = plans
        .iter()
        .map(|plan| {
            let body = match shape {
                Shape::Compact => compact_merge(plan),
                Shape::Inline => inline_merge(plan),
            };
            (plan.number, body)
        })
        .collect();

    let unused_writer = if plans.is_empty() {
        quote! { let _ = writer; }
    } else {
        quote! {}
    };

    let dispatch = generate_dispatch(&arms);

    quote! {
        impl ::protoschema_core::schema::Specialized for #struct_name {
            const MESSAGE_NAME: &'static str = #message_name;
            const CODE_SHAPE: ::protoschema_core::config::CodeShape = #code_shape;

            fn write_fields(
                &self,
                writer: &mut dyn ::protoschema_core::sdk::Writer,
            ) -> ::core::result::Result<(), ::protoschema_core::sdk::WireError> {
                #unused_writer
                #(#writes)*
                ::core::result::Result::Ok(())
            }

            fn merge_fields(
                &mut self,
                reader: &mut dyn ::protoschema_core::sdk::Reader,
            ) -> ::core::result::Result<(), ::protoschema_core::sdk::WireError> {
                loop {
                    let number = reader.field_number()?;
                    if number == ::protoschema_core::sdk::READ_DONE {
                        return ::core::result::Result::Ok(());
                    }
                    #dispatch
                }
            }
        }
    }
}

fn compact_write(plan: &FieldPlan) -> TokenStream {
    let ident = plan.ident;
    let number = plan.number_lit();
    let emit = quote! { ::protoschema_core::schema::specialized::emit };

    match plan.field_type {
        FieldType::Message => quote! { #emit::write_message(writer, #number, &self.#ident)?; },
        FieldType::RepeatedMessage => {
            quote! { #emit::write_message_list(writer, #number, &self.#ident)?; }
        }
        _ => {
            let method = plan.method("write");
            match (plan.kind, plan.is_list()) {
                (ScalarKind::String | ScalarKind::Bytes, _) => {
                    quote! { #emit::#method(writer, #number, &self.#ident)?; }
                }
                (_, true) => {
                    let packed = plan.field_type.is_packed();
                    quote! { #emit::#method(writer, #number, &self.#ident, #packed)?; }
                }
                (_, false) => quote! { #emit::#method(writer, #number, self.#ident)?; },
            }
        }
    }
}

fn compact_merge(plan: &FieldPlan) -> TokenStream {
    let ident = plan.ident;
    let emit = quote! { ::protoschema_core::schema::specialized::emit };

    match plan.field_type {
        FieldType::Message => quote! { #emit::merge_message(reader, &mut self.#ident)?; },
        FieldType::RepeatedMessage => {
            quote! { #emit::merge_message_list(reader, &mut self.#ident)?; }
        }
        _ => {
            let method = plan.method("merge");
            match (plan.kind, plan.is_list()) {
                (ScalarKind::String | ScalarKind::Bytes, _) | (_, false) => {
                    quote! { #emit::#method(reader, &mut self.#ident)?; }
                }
                (_, true) => {
                    let packed = plan.field_type.is_packed();
                    quote! { #emit::#method(reader, &mut self.#ident, #packed)?; }
                }
            }
        }
    }
}

fn inline_write(plan: &FieldPlan) -> TokenStream {
    let ident = plan.ident;
    let number = plan.number_lit();
    let specialized = quote! { ::protoschema_core::schema::Specialized };
    let writer_trait = quote! { ::protoschema_core::sdk::Writer };

    match plan.field_type {
        FieldType::Message => quote! {
            if let ::core::option::Option::Some(child) = &self.#ident {
                writer.write_message(#number, &mut |w: &mut dyn #writer_trait| {
                    #specialized::write_fields(&**child, w)
                })?;
            }
        },
        FieldType::RepeatedMessage => quote! {
            if let ::core::option::Option::Some(items) = &self.#ident {
                for item in items {
                    writer.write_message(#number, &mut |w: &mut dyn #writer_trait| {
                        #specialized::write_fields(item, w)
                    })?;
                }
            }
        },
        _ => {
            let method = plan.method("write");
            match (plan.kind, plan.is_list()) {
                (ScalarKind::String | ScalarKind::Bytes, false) => quote! {
                    if let ::core::option::Option::Some(value) = &self.#ident {
                        writer.#method(#number, value)?;
                    }
                },
                (ScalarKind::String | ScalarKind::Bytes, true) => quote! {
                    if let ::core::option::Option::Some(values) = &self.#ident {
                        if !values.is_empty() {
                            writer.#method(#number, values)?;
                        }
                    }
                },
                (_, true) => {
                    let packed = plan.field_type.is_packed();
                    quote! {
                        if let ::core::option::Option::Some(values) = &self.#ident {
                            if !values.is_empty() {
                                writer.#method(#number, values, #packed)?;
                            }
                        }
                    }
                }
                (_, false) => quote! {
                    if !::protoschema_core::schema::is_default(&self.#ident) {
                        writer.#method(#number, self.#ident)?;
                    }
                },
            }
        }
    }
}

fn inline_merge(plan: &FieldPlan) -> TokenStream {
    let ident = plan.ident;
    let specialized = quote! { ::protoschema_core::schema::Specialized };
    let reader_trait = quote! { ::protoschema_core::sdk::Reader };

    match plan.field_type {
        FieldType::Message => quote! {
            let child = self.#ident.get_or_insert_with(::core::default::Default::default);
            reader.read_message(&mut |r: &mut dyn #reader_trait| {
                #specialized::merge_fields(&mut **child, r)
            })?;
        },
        FieldType::RepeatedMessage => {
            let element = plan.element;
            quote! {
                let mut item = <#element as ::core::default::Default>::default();
                reader.read_message(&mut |r: &mut dyn #reader_trait| {
                    #specialized::merge_fields(&mut item, r)
                })?;
                self.#ident.get_or_insert_with(::std::vec::Vec::new).push(item);
            }
        }
        _ => {
            let method = plan.method("read");
            match (plan.kind, plan.is_list()) {
                (ScalarKind::String | ScalarKind::Bytes, false) => quote! {
                    self.#ident = ::core::option::Option::Some(reader.#method()?);
                },
                (ScalarKind::String | ScalarKind::Bytes, true) => quote! {
                    reader.#method(self.#ident.get_or_insert_with(::std::vec::Vec::new))?;
                },
                (_, true) => {
                    let packed = plan.field_type.is_packed();
                    quote! {
                        reader.#method(self.#ident.get_or_insert_with(::std::vec::Vec::new), #packed)?;
                    }
                }
                (_, false) => quote! {
                    self.#ident = reader.#method()?;
                },
            }
        }
    }
}

/// Field-number dispatch for the merge loop
///
/// Uses a match on `number - low` when the cost model picks a table, and a
/// binary compare tree otherwise. Unknown numbers are skipped.
fn generate_dispatch(arms: &[(u32, TokenStream)]) -> TokenStream {
    let skip = quote! {
        if !reader.skip_field()? {
            return ::core::result::Result::Ok(());
        }
    };

    let (low, high) = match (arms.first(), arms.last()) {
        (Some((low, _)), Some((high, _))) => (*low, *high),
        _ => return skip,
    };

    match DispatchShape::select(low, high, arms.len()) {
        DispatchShape::Table => {
            let low_lit = Literal::u32_unsuffixed(low);
            let cases = arms.iter().map(|(number, body)| {
                let index = Literal::u32_unsuffixed(number - low);
                quote! { #index => { #body } }
            });
            quote! {
                match number.wrapping_sub(#low_lit) {
                    #(#cases)*
                    _ => { #skip }
                }
            }
        }
        DispatchShape::Lookup => compare_tree(arms, &skip),
    }
}

fn compare_tree(arms: &[(u32, TokenStream)], skip: &TokenStream) -> TokenStream {
    if arms.len() <= 2 {
        let checks = arms.iter().map(|(number, body)| {
            let number = Literal::u32_unsuffixed(*number);
            quote! { if number == #number { #body } else }
        });
        return quote! { #(#checks)* { #skip } };
    }

    let (left, right) = arms.split_at(arms.len() / 2);
    let pivot = Literal::u32_unsuffixed(right[0].0);
    let left = compare_tree(left, skip);
    let right = compare_tree(right, skip);
    quote! {
        if number < #pivot { #left } else { #right }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn arms(numbers: &[u32]) -> Vec<(u32, TokenStream)> {
        numbers.iter().map(|n| (*n, quote! { hit(#n); })).collect()
    }

    #[test]
    fn test_dense_numbers_use_table_match() {
        let tokens = generate_dispatch(&arms(&[1, 2, 3, 4, 5])).to_string();
        assert!(tokens.contains("wrapping_sub"));
    }

    #[test]
    fn test_sparse_numbers_use_compare_tree() {
        let tokens = generate_dispatch(&arms(&[1, 2, 100])).to_string();
        assert!(!tokens.contains("wrapping_sub"));
        assert!(tokens.contains("number < 2"));
        assert!(tokens.contains("number == 100"));
    }

    #[test]
    fn test_empty_message_only_skips() {
        let tokens = generate_dispatch(&[]).to_string();
        assert!(tokens.contains("skip_field"));
        assert!(!tokens.contains("number =="));
    }

    #[test]
    fn test_unsorted_numbers_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Pair {
                #[proto(field = 2, kind = "int32")]
                a: i32,
                #[proto(field = 1, kind = "int32")]
                b: i32,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("compile_error"));
        assert!(tokens.contains("increasing order"));
    }

    #[test]
    fn test_packed_string_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Names {
                #[proto(field = 1, kind = "string", packed)]
                names: Option<Vec<String>>,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("cannot be packed"));
    }

    #[test]
    fn test_repeated_and_packed_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Counts {
                #[proto(field = 1, kind = "int32", repeated, packed)]
                counts: Option<Vec<i32>>,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("compile_error"));
        assert!(tokens.contains("exclusive"));
        assert!(!tokens.contains("PackedInt32"));
    }

    #[test]
    fn test_kind_without_number_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Partial {
                #[proto(kind = "int32")]
                value: i32,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("compile_error"));
        assert!(tokens.contains("missing `field` number"));
    }

    #[test]
    fn test_grouped_repeated_message_type() {
        // `$ty:ty` fragments from macro_rules! arrive as invisible groups
        let grouped = Type::Group(syn::TypeGroup {
            group_token: Default::default(),
            elem: Box::new(parse_quote!(Option<Vec<Child>>)),
        });
        let element = generic_arg(&grouped, "Option").and_then(|inner| generic_arg(inner, "Vec"));
        assert_eq!(quote!(#element).to_string(), "Child");

        let mut input: DeriveInput = parse_quote! {
            struct Tree {
                #[proto(field = 1, kind = "message", repeated)]
                children: Option<Vec<Child>>,
            }
        };
        if let syn::Data::Struct(data) = &mut input.data {
            for field in data.fields.iter_mut() {
                field.ty = grouped.clone();
            }
        }
        let tokens = derive_message(input).to_string();
        assert!(!tokens.contains("compile_error"));
        assert!(tokens.contains("message_list"));
    }

    #[test]
    fn test_singular_field_type_variant() {
        let input: DeriveInput = parse_quote! {
            struct Reading {
                #[proto(field = 1, kind = "sfixed64")]
                value: i64,
                #[proto(field = 2, kind = "enum", repeated)]
                states: Option<Vec<i32>>,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("FieldType :: SFixed64"));
        assert!(tokens.contains("FieldType :: RepeatedEnum"));
    }

    #[test]
    fn test_generated_name_matches_descriptor() {
        let input: DeriveInput = parse_quote! {
            #[proto(name = "Ledger")]
            struct Account {
                #[proto(field = 1, kind = "int64")]
                balance: i64,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("MESSAGE_NAME"));
        // Once for the descriptor, once for the generated code
        assert_eq!(tokens.matches("\"Ledger\"").count(), 2);
        assert!(tokens.contains("fn specialized_schema"));
    }

    #[test]
    fn test_field_types_follow_attributes() {
        let input: DeriveInput = parse_quote! {
            #[proto(name = "Scores", shape = "inline")]
            struct Scores {
                #[proto(field = 1, kind = "sint32", packed)]
                values: Option<Vec<i32>>,
                #[proto(field = 2, kind = "message", repeated)]
                children: Option<Vec<Child>>,
                cache: u64,
            }
        };
        let tokens = derive_message(input).to_string();
        assert!(tokens.contains("PackedSInt32"));
        assert!(tokens.contains("message_list"));
        assert!(tokens.contains("\"Scores\""));
        assert!(tokens.contains("CodeShape :: Inline"));
        assert!(!tokens.contains("cache"));
    }
}
