//! Implementation of the `#[bind_export]` attribute macro.
//!
//! The trait is re-emitted unchanged apart from the `#[native]` and
//! `#[native_return]` helper attributes, which are validated and dropped.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use retro_binds_codegen::attrs::{ExportAttrs, NativeAttrs, is_helper_attr};
use syn::{FnArg, ItemTrait, Pat, TraitItem, TraitItemFn, parse_macro_input};

pub fn bind_export_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match ExportAttrs::parse_args(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let mut input = parse_macro_input!(item as ItemTrait);

    match bind_export_inner(&attrs, &mut input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn bind_export_inner(attrs: &ExportAttrs, input: &mut ItemTrait) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "exported traits cannot be generic",
        ));
    }

    let mut errors: Option<syn::Error> = None;
    let mut push = |err: syn::Error| match &mut errors {
        Some(existing) => existing.combine(err),
        None => errors = Some(err),
    };

    for item in &mut input.items {
        match item {
            TraitItem::Fn(func) => {
                if let Err(err) = check_method(func) {
                    push(err);
                }
                strip_helpers(func);
            }
            other => push(syn::Error::new_spanned(
                other,
                "exported traits may only contain methods",
            )),
        }
    }

    if let Some(err) = errors {
        return Err(err);
    }

    let subject_check = attrs.subject.as_ref().map(|subject| {
        quote! {
            const _: () = ::retro_binds_core::assert_blittable::<#subject>();
        }
    });

    Ok(quote! {
        #input
        #subject_check
    })
}

fn check_method(func: &TraitItemFn) -> syn::Result<()> {
    let sig = &func.sig;

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "exported methods cannot be generic",
        ));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(asyncness, "exported methods cannot be async"));
    }
    if let Some(body) = &func.default {
        return Err(syn::Error::new_spanned(
            body,
            "exported methods are implemented natively and cannot have a body",
        ));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "exported methods must take `&self`",
            ));
        }
    }

    NativeAttrs::from_attrs(&func.attrs, "native_return")?;
    for arg in sig.inputs.iter().skip(1) {
        let FnArg::Typed(arg) = arg else { continue };
        if !matches!(arg.pat.as_ref(), Pat::Ident(_)) {
            return Err(syn::Error::new_spanned(
                &arg.pat,
                "exported parameters must be plain identifiers",
            ));
        }
        NativeAttrs::from_attrs(&arg.attrs, "native")?;
    }

    Ok(())
}

fn strip_helpers(func: &mut TraitItemFn) {
    func.attrs.retain(|a| !is_helper_attr(a));
    for arg in &mut func.sig.inputs {
        if let FnArg::Typed(arg) = arg {
            arg.attrs.retain(|a| !is_helper_attr(a));
        }
    }
}
