//! Binding attribute parsing.
//!
//! Shared by the source scanner and the proc macros so both accept exactly the
//! same annotation surface:
//!
//! - `#[blittable(name = "retro::Color", module = "retro.core")]` on a type
//!   deriving `Blittable`
//! - `#[bind_export(namespace = "retro", kind = "struct", subject = Transform)]`
//!   on a trait
//! - `#[native(name = "retro::EntityId", module = "retro.entity", by_ref, is_const)]`
//!   on a parameter, `#[native_return(...)]` on a method
//!
//! Unknown keys are errors.

use proc_macro2::TokenStream;
use retro_binds_core::{ExportKind, NativeOverride, PrimitiveKind};
use syn::meta::ParseNestedMeta;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Attribute, LitStr, Path, Token};

/// Attribute names consumed by `#[bind_export]` and stripped from its output.
pub const HELPER_ATTRS: [&str; 2] = ["native", "native_return"];

/// Whether `attr` is `#[name]` or `#[some::path::name]`.
pub fn is_attr(attr: &Attribute, name: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == name)
}

pub fn is_helper_attr(attr: &Attribute) -> bool {
    HELPER_ATTRS.iter().any(|name| is_attr(attr, name))
}

/// Whether the attributes contain `#[derive(.., name, ..)]`.
pub fn has_derive(attrs: &[Attribute], name: &str) -> syn::Result<bool> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let paths = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
        if paths
            .iter()
            .any(|p| p.segments.last().is_some_and(|s| s.ident == name))
        {
            return Ok(true);
        }
    }
    Ok(false)
}

fn unknown_key(meta: &ParseNestedMeta<'_>, attr: &str) -> syn::Error {
    meta.error(format!(
        "unknown {attr} attribute: {}",
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    ))
}

/// Parsed `#[blittable(...)]` attributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlittableAttrs {
    /// Native type name (default: the Rust type name).
    pub name: Option<String>,
    /// Native module declaring the type.
    pub module: Option<String>,
}

impl BlittableAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("blittable")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("module") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.module = Some(value.value());
                } else {
                    return Err(unknown_key(&meta, "blittable"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// Parsed `#[bind_export(...)]` arguments.
#[derive(Debug, Default, Clone)]
pub struct ExportAttrs {
    /// Native namespace override.
    pub namespace: Option<String>,
    pub kind: ExportKind,
    /// Type whose mapping supplies the native namespace.
    pub subject: Option<Path>,
}

impl ExportAttrs {
    /// Parse the argument tokens of the attribute macro.
    pub fn parse_args(tokens: TokenStream) -> syn::Result<Self> {
        let mut result = Self::default();
        let parser = syn::meta::parser(|meta| result.parse_meta(meta));
        parser.parse2(tokens)?;
        Ok(result)
    }

    /// Parse a `#[bind_export]` attribute found on a trait.
    pub fn from_attr(attr: &Attribute) -> syn::Result<Self> {
        let mut result = Self::default();
        if matches!(attr.meta, syn::Meta::Path(_)) {
            return Ok(result);
        }
        attr.parse_nested_meta(|meta| result.parse_meta(meta))?;
        Ok(result)
    }

    /// Final segment of the subject path.
    pub fn subject_name(&self) -> Option<String> {
        self.subject
            .as_ref()
            .and_then(|p| p.segments.last())
            .map(|s| s.ident.to_string())
    }

    fn parse_meta(&mut self, meta: ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("namespace") {
            let value: LitStr = meta.value()?.parse()?;
            self.namespace = Some(value.value());
        } else if meta.path.is_ident("kind") {
            let value: LitStr = meta.value()?.parse()?;
            self.kind = ExportKind::parse(&value.value()).ok_or_else(|| {
                syn::Error::new(
                    value.span(),
                    "kind must be one of \"class\", \"struct\", \"record\"",
                )
            })?;
        } else if meta.path.is_ident("subject") {
            self.subject = Some(meta.value()?.parse()?);
        } else {
            return Err(unknown_key(&meta, "bind_export"));
        }
        Ok(())
    }
}

/// Parsed `#[native(...)]` / `#[native_return(...)]` attributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NativeAttrs {
    pub name: Option<String>,
    pub module: Option<String>,
    pub by_ref: bool,
    pub is_const: bool,
}

impl NativeAttrs {
    /// Parse every `#[<attr_name>(...)]` in `attrs`. Returns `None` when there
    /// is none.
    pub fn from_attrs(attrs: &[Attribute], attr_name: &str) -> syn::Result<Option<Self>> {
        let mut result: Option<Self> = None;

        for attr in attrs.iter().filter(|a| is_attr(a, attr_name)) {
            let entry = result.get_or_insert_with(Self::default);
            if matches!(attr.meta, syn::Meta::Path(_)) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    entry.name = Some(value.value());
                } else if meta.path.is_ident("module") {
                    let value: LitStr = meta.value()?.parse()?;
                    entry.module = Some(value.value());
                } else if meta.path.is_ident("by_ref") {
                    entry.by_ref = true;
                } else if meta.path.is_ident("is_const") {
                    entry.is_const = true;
                } else {
                    return Err(unknown_key(&meta, attr_name));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }

    pub fn into_override(self) -> NativeOverride {
        NativeOverride {
            name: self.name,
            module: self.module,
            by_ref: self.by_ref,
            is_const: self.is_const,
        }
    }
}

/// The layout-relevant parts of `#[repr(...)]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReprAttrs {
    pub c: bool,
    pub int: Option<PrimitiveKind>,
}

impl ReprAttrs {
    /// Parse every `#[repr(...)]`. `packed`, `align` and `transparent` are
    /// rejected because the native side cannot mirror them.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("C") {
                    result.c = true;
                    return Ok(());
                }
                let ident = meta
                    .path
                    .get_ident()
                    .map(|i| i.to_string())
                    .unwrap_or_default();
                match PrimitiveKind::from_rust_name(&ident) {
                    Some(kind) if kind.is_integer() => {
                        result.int = Some(kind);
                        Ok(())
                    }
                    _ => Err(meta.error(format!(
                        "repr({ident}) is not supported for blittable types"
                    ))),
                }
            })?;
        }

        Ok(result)
    }

    /// Backing integer of a fieldless enum. `repr(C)` alone means C `int`.
    pub fn enum_repr(&self) -> Option<PrimitiveKind> {
        self.int
            .or(self.c.then_some(PrimitiveKind::Int32))
    }
}
