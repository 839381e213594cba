//! Source scanner.
//!
//! Parses Rust source files with `syn` and extracts the declarations the
//! generator works from: blittable types (items deriving `Blittable`) and
//! exported traits (items annotated with `#[bind_export]`). Inline modules are
//! followed; everything else is ignored.

use std::path::Path;

use proc_macro2::Span as SynSpan;
use retro_binds_core::{
    BindsError, BlittableField, BlittableShape, BlittableType, ExportDecl, Location, ManagedType,
    MethodDecl, ParamDecl, Span,
};
use syn::spanned::Spanned;
use syn::{Fields, FnArg, Item, ItemEnum, ItemStruct, ItemTrait, Pat, ReturnType, TraitItem, Type};

use crate::GenerateError;
use crate::attrs::{BlittableAttrs, ExportAttrs, NativeAttrs, ReprAttrs, has_derive, is_attr};

/// One Rust source file to scan.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path used in diagnostics.
    pub path: String,
    /// Module path of the file inside its crate, e.g. `interop::math`.
    pub module_path: String,
    pub contents: String,
}

impl SourceFile {
    pub fn new(
        path: impl Into<String>,
        module_path: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            module_path: module_path.into(),
            contents: contents.into(),
        }
    }
}

/// Declarations found in a set of files, in source order.
#[derive(Debug, Default, Clone)]
pub struct ScanResult {
    pub blittables: Vec<BlittableType>,
    pub exports: Vec<ExportDecl>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.blittables.is_empty() && self.exports.is_empty()
    }
}

/// Module path of a source file relative to its crate's `src` directory.
///
/// `interop/math.rs` -> `interop::math`, `interop/mod.rs` -> `interop`,
/// `lib.rs` -> ``.
pub fn module_path_for(relative: &Path) -> String {
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect();

    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last);
        if !matches!(stem, "mod" | "lib" | "main") {
            segments.push(stem.to_string());
        }
    }

    segments.join("::")
}

/// Scan files, collecting every declaration error.
pub fn scan_sources(sources: &[SourceFile]) -> Result<ScanResult, GenerateError> {
    let mut result = ScanResult::default();
    let mut errors = Vec::new();

    for source in sources {
        let file = syn::parse_file(&source.contents).map_err(|err| {
            let start = err.span().start();
            GenerateError::Syntax {
                path: source.path.clone(),
                line: start.line,
                column: start.column + 1,
                message: err.to_string(),
            }
        })?;

        let mut scanner = Scanner {
            file: &source.path,
            result: &mut result,
            errors: &mut errors,
        };
        scanner.scan_items(&file.items, &source.module_path);
        log::debug!("scanned {}", source.path);
    }

    if !errors.is_empty() {
        return Err(GenerateError::Declarations(errors));
    }
    Ok(result)
}

struct Scanner<'a> {
    file: &'a str,
    result: &'a mut ScanResult,
    errors: &'a mut Vec<BindsError>,
}

impl Scanner<'_> {
    fn location(&self, span: SynSpan) -> Location {
        let start = span.start();
        let end = span.end();
        let len = if end.line == start.line {
            end.column.saturating_sub(start.column)
        } else {
            0
        };
        Location::new(
            self.file,
            Span::new(start.line as u32, start.column as u32 + 1, len as u32),
        )
    }

    fn invalid(&mut self, span: SynSpan, message: impl Into<String>) {
        let location = self.location(span);
        self.errors.push(BindsError::InvalidDeclaration {
            message: message.into(),
            location,
        });
    }

    fn syn_error(&mut self, err: syn::Error) {
        for err in err {
            self.invalid(err.span(), err.to_string());
        }
    }

    fn scan_items(&mut self, items: &[Item], module_path: &str) {
        for item in items {
            match item {
                Item::Struct(item) => self.scan_struct(item, module_path),
                Item::Enum(item) => self.scan_enum(item, module_path),
                Item::Trait(item) => self.scan_trait(item, module_path),
                Item::Mod(item) => {
                    if let Some((_, items)) = &item.content {
                        let nested = if module_path.is_empty() {
                            item.ident.to_string()
                        } else {
                            format!("{module_path}::{}", item.ident)
                        };
                        self.scan_items(items, &nested);
                    }
                }
                _ => {}
            }
        }
    }

    /// Common checks for a blittable item. Returns its attributes when the
    /// item derives `Blittable`.
    fn blittable_header(
        &mut self,
        attrs: &[syn::Attribute],
        generics: &syn::Generics,
        ident: &syn::Ident,
    ) -> Option<(BlittableAttrs, ReprAttrs)> {
        match has_derive(attrs, "Blittable") {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => {
                self.syn_error(err);
                return None;
            }
        }

        if !generics.params.is_empty() {
            self.invalid(
                generics.span(),
                format!("blittable type `{ident}` cannot be generic"),
            );
            return None;
        }

        let parsed = BlittableAttrs::from_attrs(attrs)
            .and_then(|b| ReprAttrs::from_attrs(attrs).map(|r| (b, r)));
        match parsed {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.syn_error(err);
                None
            }
        }
    }

    fn register(
        &mut self,
        ident: &syn::Ident,
        attrs: BlittableAttrs,
        shape: BlittableShape,
        module_path: &str,
    ) {
        let native_name = attrs.name.unwrap_or_else(|| ident.to_string());
        let mut ty = BlittableType::new(ident.to_string(), native_name, shape, self.location(ident.span()))
            .with_managed_namespace(module_path);
        if let Some(module) = attrs.module {
            ty = ty.with_module(module);
        }
        self.result.blittables.push(ty);
    }

    fn scan_struct(&mut self, item: &ItemStruct, module_path: &str) {
        let Some((attrs, repr)) = self.blittable_header(&item.attrs, &item.generics, &item.ident)
        else {
            return;
        };

        if !repr.c {
            self.invalid(
                item.ident.span(),
                format!("blittable struct `{}` must be #[repr(C)]", item.ident),
            );
            return;
        }

        let Fields::Named(named) = &item.fields else {
            self.invalid(
                item.ident.span(),
                format!("blittable struct `{}` must have named fields", item.ident),
            );
            return;
        };

        let mut fields = Vec::with_capacity(named.named.len());
        for field in &named.named {
            let Some(ident) = &field.ident else { continue };
            match self.managed_type(&field.ty) {
                Some(ty) => fields.push(BlittableField::new(
                    ident.to_string(),
                    ty,
                    self.location(ident.span()),
                )),
                None => return,
            }
        }

        self.register(&item.ident, attrs, BlittableShape::Struct { fields }, module_path);
    }

    fn scan_enum(&mut self, item: &ItemEnum, module_path: &str) {
        let Some((attrs, repr)) = self.blittable_header(&item.attrs, &item.generics, &item.ident)
        else {
            return;
        };

        let Some(repr) = repr.enum_repr() else {
            self.invalid(
                item.ident.span(),
                format!(
                    "blittable enum `{}` needs an integer #[repr(..)] or #[repr(C)]",
                    item.ident
                ),
            );
            return;
        };

        let mut variants = Vec::with_capacity(item.variants.len());
        for variant in &item.variants {
            if !matches!(variant.fields, Fields::Unit) {
                self.invalid(
                    variant.ident.span(),
                    format!(
                        "variant `{}::{}` carries data; blittable enums must be fieldless",
                        item.ident, variant.ident
                    ),
                );
                return;
            }
            variants.push(variant.ident.to_string());
        }

        self.register(&item.ident, attrs, BlittableShape::Enum { repr, variants }, module_path);
    }

    fn scan_trait(&mut self, item: &ItemTrait, module_path: &str) {
        let Some(attr) = item.attrs.iter().find(|a| is_attr(a, "bind_export")) else {
            return;
        };

        let export = match ExportAttrs::from_attr(attr) {
            Ok(export) => export,
            Err(err) => {
                self.syn_error(err);
                return;
            }
        };

        if !item.generics.params.is_empty() {
            self.invalid(
                item.generics.span(),
                format!("exported trait `{}` cannot be generic", item.ident),
            );
            return;
        }

        let mut decl = ExportDecl::new(
            item.ident.to_string(),
            module_path,
            self.location(item.ident.span()),
        )
        .with_kind(export.kind);
        if let Some(namespace) = &export.namespace {
            decl = decl.with_native_namespace(namespace);
        }
        if let Some(subject) = export.subject_name() {
            decl = decl.with_subject(subject);
        }

        for trait_item in &item.items {
            let TraitItem::Fn(func) = trait_item else {
                self.invalid(
                    trait_item.span(),
                    format!("exported trait `{}` may only contain methods", item.ident),
                );
                continue;
            };
            if let Some(method) = self.scan_method(&item.ident, func) {
                decl.methods.push(method);
            }
        }

        self.result.exports.push(decl);
    }

    fn scan_method(&mut self, owner: &syn::Ident, func: &syn::TraitItemFn) -> Option<MethodDecl> {
        let sig = &func.sig;
        let name = &sig.ident;

        if !sig.generics.params.is_empty() || sig.asyncness.is_some() || sig.variadic.is_some() {
            self.invalid(
                name.span(),
                format!("`{owner}::{name}` must be a plain, non-generic method"),
            );
            return None;
        }
        if func.default.is_some() {
            self.invalid(
                name.span(),
                format!("`{owner}::{name}` is implemented natively and cannot have a body"),
            );
            return None;
        }

        let receiver_ok = matches!(
            sig.inputs.first(),
            Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none()
        );
        if !receiver_ok {
            self.invalid(name.span(), format!("`{owner}::{name}` must take `&self`"));
            return None;
        }

        let mut method = MethodDecl::new(name.to_string(), self.location(name.span()));

        match NativeAttrs::from_attrs(&func.attrs, "native_return") {
            Ok(native) => method.native_return = native.map(NativeAttrs::into_override),
            Err(err) => {
                self.syn_error(err);
                return None;
            }
        }

        for arg in sig.inputs.iter().skip(1) {
            let FnArg::Typed(arg) = arg else { continue };
            let Pat::Ident(pat) = arg.pat.as_ref() else {
                self.invalid(
                    arg.pat.span(),
                    format!("parameters of `{owner}::{name}` must be plain identifiers"),
                );
                return None;
            };

            let ty = self.managed_type(&arg.ty)?;
            let mut param = ParamDecl::new(pat.ident.to_string(), ty, self.location(pat.ident.span()));
            match NativeAttrs::from_attrs(&arg.attrs, "native") {
                Ok(native) => param.native = native.map(NativeAttrs::into_override),
                Err(err) => {
                    self.syn_error(err);
                    return None;
                }
            }
            method.params.push(param);
        }

        if let ReturnType::Type(_, ty) = &sig.output {
            method.ret = self.managed_type(ty)?;
        }

        Some(method)
    }

    /// Convert a `syn` type to a managed type, reporting unsupported syntax.
    fn managed_type(&mut self, ty: &Type) -> Option<ManagedType> {
        match ty {
            Type::Path(path) if path.qself.is_none() => {
                if path
                    .path
                    .segments
                    .iter()
                    .any(|s| !matches!(s.arguments, syn::PathArguments::None))
                {
                    self.invalid(ty.span(), "generic types cannot cross the boundary");
                    return None;
                }
                let mut rendered = String::new();
                if path.path.leading_colon.is_some() {
                    rendered.push_str("::");
                }
                let segments: Vec<String> =
                    path.path.segments.iter().map(|s| s.ident.to_string()).collect();
                rendered.push_str(&segments.join("::"));
                Some(ManagedType::Path(rendered))
            }
            Type::Reference(reference) => {
                if reference.lifetime.is_some() {
                    self.invalid(ty.span(), "references in exports cannot name a lifetime");
                    return None;
                }
                let inner = self.managed_type(&reference.elem)?;
                Some(ManagedType::reference(inner, reference.mutability.is_some()))
            }
            Type::Ptr(ptr) => {
                let inner = self.managed_type(&ptr.elem)?;
                Some(ManagedType::pointer(inner, ptr.mutability.is_some()))
            }
            Type::Tuple(tuple) if tuple.elems.is_empty() => Some(ManagedType::Unit),
            Type::Paren(paren) => self.managed_type(&paren.elem),
            _ => {
                self.invalid(ty.span(), "unsupported type syntax in a binding declaration");
                None
            }
        }
    }
}
