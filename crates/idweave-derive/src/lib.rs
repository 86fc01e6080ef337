//! Idweave Derive Macros: the `Describable` capability
//!
//! Components opt into identity inference by implementing
//! `idweave::Describable`. This crate derives that implementation from
//! attributes instead of hand-written accessor methods.
//!
//! # Example
//!
//! ```ignore
//! use idweave::Describable;
//!
//! #[derive(Describable)]
//! #[describe(element_type = "Button")]
//! struct SaveButton {
//!     #[describe(text)]
//!     title: String,
//!     #[describe(label)]
//!     hint: Option<String>,
//! }
//! ```
//!
//! # Attributes
//!
//! Container:
//!
//! - `#[describe(name = "...")]` - explicit name
//! - `#[describe(element_type = "...")]` - element type (defaults to the type name)
//! - `#[describe(skip)]` - opt the type out of decoration
//!
//! Field (`String`, `&str` or `Option` of either):
//!
//! - `#[describe(name)]`, `#[describe(text)]`, `#[describe(label)]`,
//!   `#[describe(identifier)]`

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Index, LitStr, Member};

const ATTR: &str = "describe";

/// Derive macro for `idweave::Describable`.
///
/// See the crate docs for the accepted attributes.
#[proc_macro_derive(Describable, attributes(describe))]
pub fn derive_describable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let container = ContainerAttrs::parse(&input.attrs)?;
    let fields = FieldRoles::parse(&input.data)?;

    let element_type = container
        .element_type
        .clone()
        .unwrap_or_else(|| ident.to_string());

    let explicit_name = match (&fields.name, &container.name) {
        (Some(member), _) => field_signal(member),
        (None, Some(name)) => quote! { ::core::option::Option::Some(::std::string::String::from(#name)) },
        (None, None) => quote! { ::core::option::Option::None },
    };
    let text = optional_field_signal(fields.text.as_ref());
    let label = optional_field_signal(fields.label.as_ref());
    let identifier = optional_field_signal(fields.identifier.as_ref());
    let skip = container.skip;

    Ok(quote! {
        impl #impl_generics ::idweave::decorate::Describable for #ident #ty_generics #where_clause {
            fn explicit_name(&self) -> ::core::option::Option<::std::string::String> {
                #explicit_name
            }

            fn element_type(&self) -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::String::from(#element_type))
            }

            fn text_content(&self) -> ::core::option::Option<::std::string::String> {
                #text
            }

            fn accessibility_label(&self) -> ::core::option::Option<::std::string::String> {
                #label
            }

            fn skips_decoration(&self) -> bool {
                #skip
            }

            fn manual_identifier(&self) -> ::core::option::Option<::std::string::String> {
                #identifier
            }
        }
    })
}

fn field_signal(member: &Member) -> TokenStream2 {
    quote! { ::idweave::decorate::DescribeField::describe_field(&self.#member) }
}

fn optional_field_signal(member: Option<&Member>) -> TokenStream2 {
    member.map_or_else(|| quote! { ::core::option::Option::None }, field_signal)
}

// ============================================================================
// Attribute Parsing
// ============================================================================

/// Container-level `#[describe(...)]` values
#[derive(Debug, Default)]
struct ContainerAttrs {
    name: Option<String>,
    element_type: Option<String>,
    skip: bool,
}

impl ContainerAttrs {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    parsed.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("element_type") {
                    parsed.element_type = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                } else {
                    return Err(meta.error("expected `name`, `element_type` or `skip`"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }
}

/// Which field supplies which signal
#[derive(Debug, Default)]
struct FieldRoles {
    name: Option<Member>,
    text: Option<Member>,
    label: Option<Member>,
    identifier: Option<Member>,
}

impl FieldRoles {
    fn parse(data: &Data) -> syn::Result<Self> {
        let mut roles = Self::default();
        let Data::Struct(data_struct) = data else {
            return Ok(roles);
        };
        let members: Vec<(Member, &[Attribute])> = match &data_struct.fields {
            Fields::Named(fields) => fields
                .named
                .iter()
                .filter_map(|f| f.ident.clone().map(|i| (Member::Named(i), f.attrs.as_slice())))
                .collect(),
            Fields::Unnamed(fields) => fields
                .unnamed
                .iter()
                .enumerate()
                .map(|(i, f)| (Member::Unnamed(Index::from(i)), f.attrs.as_slice()))
                .collect(),
            Fields::Unit => Vec::new(),
        };

        for (member, attrs) in members {
            for attr in attrs.iter().filter(|attr| attr.path().is_ident(ATTR)) {
                attr.parse_nested_meta(|meta| {
                    let slot = if meta.path.is_ident("name") {
                        &mut roles.name
                    } else if meta.path.is_ident("text") {
                        &mut roles.text
                    } else if meta.path.is_ident("label") {
                        &mut roles.label
                    } else if meta.path.is_ident("identifier") {
                        &mut roles.identifier
                    } else {
                        return Err(meta.error("expected `name`, `text`, `label` or `identifier`"));
                    };
                    if slot.is_some() {
                        return Err(meta.error("signal is already supplied by another field"));
                    }
                    *slot = Some(member.clone());
                    Ok(())
                })?;
            }
        }
        Ok(roles)
    }
}
