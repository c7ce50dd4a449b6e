//! # Packfold Derive Macros
//!
//! This crate provides the procedural macros for `packfold`. It automates the
//! implementation of `Archivable`: the field descriptor, by-name field reads and
//! by-name field assignment.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr, Meta, PathArguments, Type,
    parse_macro_input,
};

/// Derives `packfold::Archivable` for a struct with named fields.
///
/// Field attributes:
/// * `#[archive]` persists the field under its own name.
/// * `#[archive(rename = "...")]` persists it under another name.
/// * `#[archive(base)]` marks the (single) embedded base record whose persistable
///   fields are inherited and follow the own fields.
///
/// Struct attribute: `#[archive(name = "...")]` sets the stable type name
/// (defaults to the struct name).
///
/// `Option<T>` fields are nullable: `None` is stored as absent.
#[proc_macro_derive(Archivable, attributes(archive))]
pub fn derive_archivable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Internal Data Structures ---
struct Persisted {
    ident: syn::Ident,
    name: String,
    ty: Type,
    /// `Some(T)` for `Option<T>` fields.
    inner: Option<Type>,
}

struct Base {
    ident: syn::Ident,
    ty: Type,
}

enum FieldRole {
    Skip,
    Persist { rename: Option<String> },
    Base,
}

fn expand(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Archivable does not support generic types",
        ));
    }

    let named = match &input.data {
        Data::Struct(ds) => match &ds.fields {
            Fields::Named(named) => named,
            _ => {
                return Err(syn::Error::new(
                    name.span(),
                    "Archivable only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "Archivable only supports structs",
            ));
        }
    };

    let type_name = parse_type_name(&input.attrs)?.unwrap_or_else(|| name.to_string());

    let mut persisted: Vec<Persisted> = Vec::new();
    let mut base: Option<Base> = None;

    for field in &named.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        match parse_field_role(&field.attrs)? {
            FieldRole::Skip => {}
            FieldRole::Base => {
                if base.is_some() {
                    return Err(syn::Error::new(
                        ident.span(),
                        "only one #[archive(base)] field is allowed",
                    ));
                }
                if option_inner(&field.ty).is_some() {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "an #[archive(base)] field cannot be an Option",
                    ));
                }
                base = Some(Base {
                    ident,
                    ty: field.ty.clone(),
                });
            }
            FieldRole::Persist { rename } => {
                let stored = rename.unwrap_or_else(|| ident.to_string());
                if persisted.iter().any(|p| p.name == stored) {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("duplicate archived field name `{stored}`"),
                    ));
                }
                persisted.push(Persisted {
                    ident,
                    name: stored,
                    inner: option_inner(&field.ty).cloned(),
                    ty: field.ty.clone(),
                });
            }
        }
    }

    let impl_descriptor = generate_descriptor(&persisted, base.as_ref());
    let impl_read = generate_field_value(&persisted, base.as_ref());
    let impl_write = generate_set_field(&persisted, base.as_ref());

    Ok(quote! {
        impl ::packfold::Archivable for #name {
            const TYPE_NAME: &'static str = #type_name;

            #impl_descriptor
            #impl_read
            #impl_write
        }
    })
}

/// Parses the struct-level `#[archive(name = "...")]`.
fn parse_type_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut type_name = None;
    for attr in attrs {
        if attr.path().is_ident("archive") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let s: LitStr = meta.value()?.parse()?;
                    type_name = Some(s.value());
                    return Ok(());
                }
                Err(meta.error("Unknown archive attribute key on a struct. Supported: name"))
            })?;
        }
    }
    Ok(type_name)
}

/// Parses field-level `#[archive]`, `#[archive(rename = "...")]`, `#[archive(base)]`.
fn parse_field_role(attrs: &[Attribute]) -> syn::Result<FieldRole> {
    let mut role = FieldRole::Skip;
    for attr in attrs {
        if !attr.path().is_ident("archive") {
            continue;
        }
        if let Meta::Path(_) = attr.meta {
            role = FieldRole::Persist { rename: None };
            continue;
        }

        let mut rename = None;
        let mut is_base = false;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("base") {
                is_base = true;
                return Ok(());
            }
            if meta.path.is_ident("rename") {
                let s: LitStr = meta.value()?.parse()?;
                rename = Some(s.value());
                return Ok(());
            }
            Err(meta.error("Unknown archive attribute key. Supported: base, rename"))
        })?;

        if is_base && rename.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "#[archive(base)] cannot be combined with rename",
            ));
        }
        role = if is_base {
            FieldRole::Base
        } else {
            FieldRole::Persist { rename }
        };
    }
    Ok(role)
}

/// Returns `T` if `ty` is spelled `Option<T>` (or a path ending in `Option<T>`).
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

// --- Generator: descriptor ---

fn generate_descriptor(persisted: &[Persisted], base: Option<&Base>) -> proc_macro2::TokenStream {
    let fields = persisted.iter().map(|p| {
        let name = &p.name;
        match &p.inner {
            Some(inner) => quote! {
                .field(::packfold::FieldDescriptor::new::<#inner>(#name, true))
            },
            None => {
                let ty = &p.ty;
                quote! {
                    .field(::packfold::FieldDescriptor::new::<#ty>(#name, false))
                }
            }
        }
    });

    let with_base = base.map(|b| {
        let ty = &b.ty;
        quote! { .with_base::<#ty>() }
    });

    quote! {
        fn descriptor() -> ::packfold::TypeDescriptor {
            ::packfold::TypeDescriptor::new::<Self>(<Self as ::packfold::Archivable>::TYPE_NAME)
                #(#fields)*
                #with_base
        }
    }
}

// --- Generator: field_value ---

fn generate_field_value(
    persisted: &[Persisted],
    base: Option<&Base>,
) -> proc_macro2::TokenStream {
    let arms = persisted.iter().map(|p| {
        let name = &p.name;
        let ident = &p.ident;
        if p.inner.is_some() {
            quote! { #name => ::core::option::Option::Some(
                ::packfold::FieldValue::from_option(self.#ident.as_ref())
            ), }
        } else {
            quote! { #name => ::core::option::Option::Some(
                ::packfold::FieldValue::of(&self.#ident)
            ), }
        }
    });

    let fallback = match base {
        Some(b) => {
            let ident = &b.ident;
            quote! { _ => ::packfold::Archivable::field_value(&self.#ident, name), }
        }
        None => quote! { _ => ::core::option::Option::None, },
    };

    quote! {
        fn field_value(&self, name: &str) -> ::core::option::Option<::packfold::FieldValue<'_>> {
            match name {
                #(#arms)*
                #fallback
            }
        }
    }
}

// --- Generator: set_field ---

fn generate_set_field(persisted: &[Persisted], base: Option<&Base>) -> proc_macro2::TokenStream {
    let arms = persisted.iter().map(|p| {
        let name = &p.name;
        let ident = &p.ident;
        match &p.inner {
            Some(inner) => quote! {
                #name => {
                    self.#ident = ::core::option::Option::Some(
                        ::packfold::rt::assign::<#inner>(value, Self::TYPE_NAME, name)?
                    );
                    ::core::result::Result::Ok(())
                }
            },
            None => {
                let ty = &p.ty;
                quote! {
                    #name => {
                        self.#ident = ::packfold::rt::assign::<#ty>(value, Self::TYPE_NAME, name)?;
                        ::core::result::Result::Ok(())
                    }
                }
            }
        }
    });

    let fallback = match base {
        Some(b) => {
            let ident = &b.ident;
            quote! { _ => ::packfold::Archivable::set_field(&mut self.#ident, name, value), }
        }
        None => quote! {
            _ => ::core::result::Result::Err(::packfold::rt::unknown_field(Self::TYPE_NAME, name)),
        },
    };

    quote! {
        #[allow(unused_variables)]
        fn set_field(
            &mut self,
            name: &str,
            value: ::std::boxed::Box<dyn ::core::any::Any>,
        ) -> ::packfold::Result<()> {
            match name {
                #(#arms)*
                #fallback
            }
        }
    }
}
