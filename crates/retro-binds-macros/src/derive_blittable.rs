//! Implementation of the `#[derive(Blittable)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use retro_binds_codegen::attrs::{BlittableAttrs, ReprAttrs};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

pub fn derive_blittable_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_blittable_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_blittable_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "blittable types cannot be generic",
        ));
    }

    let attrs = BlittableAttrs::from_attrs(&input.attrs)?;
    let repr = ReprAttrs::from_attrs(&input.attrs)?;

    let field_checks = match &input.data {
        Data::Struct(data) => {
            if !repr.c {
                return Err(syn::Error::new_spanned(
                    name,
                    format!("blittable struct `{name}` must be #[repr(C)]"),
                ));
            }
            let Fields::Named(fields) = &data.fields else {
                return Err(syn::Error::new_spanned(
                    &data.fields,
                    "blittable structs must have named fields",
                ));
            };
            let types = fields.named.iter().map(|f| &f.ty);
            quote! { #(::retro_binds_core::assert_blittable::<#types>();)* }
        }
        Data::Enum(data) => {
            if repr.enum_repr().is_none() {
                return Err(syn::Error::new_spanned(
                    name,
                    format!("blittable enum `{name}` needs an integer #[repr(..)] or #[repr(C)]"),
                ));
            }
            if let Some(variant) = data.variants.iter().find(|v| !matches!(v.fields, Fields::Unit)) {
                return Err(syn::Error::new_spanned(
                    variant,
                    "blittable enums must be fieldless",
                ));
            }
            TokenStream2::new()
        }
        Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "unions cannot be blittable",
            ));
        }
    };

    let native_name = attrs.name.unwrap_or_else(|| name.to_string());
    let native_module = match &attrs.module {
        Some(module) => quote! { ::core::option::Option::Some(#module) },
        None => quote! { ::core::option::Option::None },
    };

    Ok(quote! {
        // SAFETY: layout checked above: repr(C) with blittable fields, or a
        // fieldless enum with an integer repr.
        unsafe impl ::retro_binds_core::Blittable for #name {
            const NATIVE_NAME: &'static str = #native_name;
            const NATIVE_MODULE: ::core::option::Option<&'static str> = #native_module;
        }

        const _: () = {
            #field_checks
        };
    })
}
