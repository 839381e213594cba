//! Managed (Rust) call-stub emitter.
//!
//! For an exported trait `MathModule` this renders a `MathModuleBinds` struct
//! that implements the trait by forwarding every method to its native export:
//!
//! ```text
//! MathModuleBinds
//!   __registry: Arc<BindingRegistry>
//!   __site_add: CallSite("MathModule", "Add", ADD_BLOCK_SIZE)
//!
//! impl MathModule for MathModuleBinds
//!   fn add(&self, a, b) -> i32
//!     resolve once (panic with module/function on failure)
//!     cast to unsafe extern "C" fn(i32, i32) -> i32, call
//! ```
//!
//! Block sizes are `size_of` expressions over the managed types, checked at
//! compile time against the sizes the model computed for the configured
//! pointer width. Blittable types used by the class get `size_of`/`offset_of`
//! assertions against the same layouts the native stub asserts.

use std::fmt::{self, Write};

use retro_binds_core::{ExportedClass, ExportedMethod, ManagedType, Passing, TypeMap};

use super::{banner, counts_return, native_function_path, native_type_in};
use crate::GeneratorConfig;

/// Everything the managed emitter needs besides the class.
pub struct ManagedContext<'a> {
    pub types: &'a TypeMap,
    pub config: &'a GeneratorConfig,
}

impl ManagedContext<'_> {
    fn runtime(&self) -> &str {
        &self.config.runtime_path
    }

    /// Absolute path of a scanned module path.
    fn module_item(&self, namespace: &str, item: &str) -> String {
        let root = &self.config.crate_path;
        match (root.is_empty(), namespace.is_empty()) {
            (true, true) => item.to_string(),
            (true, false) => format!("{namespace}::{item}"),
            (false, true) => format!("{root}::{item}"),
            (false, false) => format!("{root}::{namespace}::{item}"),
        }
    }

    /// Render a managed type so it resolves from the generated file.
    pub fn rust_type(&self, ty: &ManagedType, class: &ExportedClass) -> String {
        match ty {
            ManagedType::Unit => "()".to_string(),
            ManagedType::Path(_) if ty.is_opaque() => "::core::ffi::c_void".to_string(),
            ManagedType::Path(path) => {
                if ty.as_primitive().is_some() {
                    return path.clone();
                }
                if let Some(mapped) = ty.ident().and_then(|id| self.types.get(id)) {
                    return self.module_item(&mapped.managed_namespace, &mapped.managed);
                }
                let absolute = ["::", "crate::", "std::", "core::", "alloc::"];
                if absolute.iter().any(|prefix| path.starts_with(prefix)) {
                    path.clone()
                } else {
                    self.module_item(&class.managed_namespace, path)
                }
            }
            ManagedType::Ref { mutable, inner } => {
                let inner = self.rust_type(inner, class);
                if *mutable {
                    format!("&mut {inner}")
                } else {
                    format!("&{inner}")
                }
            }
            ManagedType::Ptr { mutable, inner } => {
                let inner = self.rust_type(inner, class);
                if *mutable {
                    format!("*mut {inner}")
                } else {
                    format!("*const {inner}")
                }
            }
        }
    }

    /// The type a position has in the `extern "C"` signature. References
    /// become raw pointers.
    fn ffi_type(&self, ty: &ManagedType, class: &ExportedClass) -> String {
        match ty {
            ManagedType::Ref { mutable, inner } => {
                let inner = self.rust_type(inner, class);
                if *mutable {
                    format!("*mut {inner}")
                } else {
                    format!("*const {inner}")
                }
            }
            _ => self.rust_type(ty, class),
        }
    }

    fn slot_size(&self, ty: &ManagedType, passing: Passing, class: &ExportedClass) -> String {
        match passing {
            Passing::Value => format!("::core::mem::size_of::<{}>()", self.rust_type(ty, class)),
            Passing::Reference | Passing::Pointer => {
                "::core::mem::size_of::<*const ()>()".to_string()
            }
        }
    }

    fn block_size_expr(&self, method: &ExportedMethod, class: &ExportedClass) -> String {
        let mut terms: Vec<String> = method
            .params
            .iter()
            .map(|p| self.slot_size(&p.managed, p.passing, class))
            .collect();
        if counts_return(self.config) && !method.ret.is_void() {
            let passing = if method.ret.managed.is_indirect() {
                Passing::Pointer
            } else {
                Passing::Value
            };
            terms.push(self.slot_size(&method.ret.managed, passing, class));
        }
        if terms.is_empty() {
            "0".to_string()
        } else {
            terms.join(" + ")
        }
    }
}

/// Field holding the call site of `method`. Prefixed so no trait method
/// name can collide with it or with the registry field.
fn site_field(method: &ExportedMethod) -> String {
    format!("__site_{}", method.name)
}

fn block_const(method: &ExportedMethod) -> String {
    format!("{}_BLOCK_SIZE", method.name.to_uppercase())
}

/// Native signature used in doc comments, e.g.
/// `int32 retro::math_module::add(int32 a, int32 b)`.
pub fn native_signature(class: &ExportedClass, method: &ExportedMethod) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| p.native.render_declarator(&p.name))
        .collect();
    format!(
        "{} {}({})",
        native_type_in(&method.ret.native, ""),
        native_function_path(class, &method.native_name),
        params.join(", ")
    )
}

/// Render the managed stub file for `class`.
pub fn write_managed_stub<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    ctx: &ManagedContext<'_>,
) -> fmt::Result {
    let binds = format!("{}Binds", class.name);
    let runtime = ctx.runtime();
    let registry_ty = format!("::std::sync::Arc<{runtime}::BindingRegistry>");

    writeln!(out, "{}", banner(Some(&class.qualified_name())))?;
    writeln!(out)?;

    // Struct
    writeln!(
        out,
        "/// Managed call stubs for the native `{}` exports.",
        class.module_name()
    )?;
    writeln!(out, "pub struct {binds} {{")?;
    writeln!(out, "    __registry: {registry_ty},")?;
    for method in &class.methods {
        writeln!(out, "    {}: {runtime}::CallSite,", site_field(method))?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    // Inherent impl
    writeln!(out, "impl {binds} {{")?;
    writeln!(out, "    /// Registry module name.")?;
    writeln!(
        out,
        "    pub const MODULE: &'static str = \"{}\";",
        class.module_name()
    )?;
    for method in &class.methods {
        writeln!(out)?;
        writeln!(out, "    /// Parameter block of `{}`.", method.export_name)?;
        writeln!(
            out,
            "    pub const {}: usize = {};",
            block_const(method),
            ctx.block_size_expr(method, class)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "    pub fn new(registry: {registry_ty}) -> Self {{")?;
    writeln!(out, "        Self {{")?;
    writeln!(out, "            __registry: registry,")?;
    for method in &class.methods {
        writeln!(
            out,
            "            {}: {runtime}::CallSite::new(Self::MODULE, \"{}\", Self::{}),",
            site_field(method),
            method.export_name,
            block_const(method)
        )?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    /// Resolve every export now instead of on first call.")?;
    writeln!(
        out,
        "    pub fn resolve_all(&self) -> ::core::result::Result<(), {runtime}::BindError> {{"
    )?;
    for method in &class.methods {
        writeln!(
            out,
            "        self.{}.get_or_resolve(&self.__registry)?;",
            site_field(method)
        )?;
    }
    writeln!(out, "        ::core::result::Result::Ok(())")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;
    writeln!(out, "    /// Call sites in declaration order.")?;
    writeln!(
        out,
        "    pub fn call_sites(&self) -> [&{runtime}::CallSite; {}] {{",
        class.methods.len()
    )?;
    let sites: Vec<String> = class
        .methods
        .iter()
        .map(|m| format!("&self.{}", site_field(m)))
        .collect();
    writeln!(out, "        [{}]", sites.join(", "))?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    // Trait impl
    let trait_path = ctx.module_item(&class.managed_namespace, &class.name);
    writeln!(out, "impl {trait_path} for {binds} {{")?;
    for (i, method) in class.methods.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        write_method(out, class, method, ctx)?;
    }
    writeln!(out, "}}")?;

    write_assertions(out, class, ctx)
}

fn write_method<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    method: &ExportedMethod,
    ctx: &ManagedContext<'_>,
) -> fmt::Result {
    let params: Vec<String> = std::iter::once("&self".to_string())
        .chain(
            method
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, ctx.rust_type(&p.managed, class))),
        )
        .collect();
    let ffi_params: Vec<String> = method
        .params
        .iter()
        .map(|p| ctx.ffi_type(&p.managed, class))
        .collect();
    let args: Vec<String> = method
        .params
        .iter()
        .map(|p| match &p.managed {
            ManagedType::Ref { mutable: false, .. } => format!("::core::ptr::from_ref({})", p.name),
            ManagedType::Ref { mutable: true, .. } => format!("::core::ptr::from_mut({})", p.name),
            _ => p.name.clone(),
        })
        .collect();
    let ret = if method.ret.is_void() {
        String::new()
    } else {
        format!(" -> {}", ctx.rust_type(&method.ret.managed, class))
    };

    writeln!(out, "    /// Native: `{}`", native_signature(class, method))?;
    writeln!(out, "    fn {}({}){ret} {{", method.name, params.join(", "))?;
    writeln!(
        out,
        "        let __bound = match self.{}.get_or_resolve(&self.__registry) {{",
        site_field(method)
    )?;
    writeln!(out, "            ::core::result::Result::Ok(bound) => bound,")?;
    writeln!(
        out,
        "            ::core::result::Result::Err(err) => panic!(\"{{err}}\"),"
    )?;
    writeln!(out, "        }};")?;
    writeln!(
        out,
        "        // SAFETY: the host resolved this export for the same parameter block."
    )?;
    writeln!(out, "        unsafe {{")?;
    writeln!(
        out,
        "            let __f: unsafe extern \"C\" fn({}){ret} = __bound.as_fn();",
        ffi_params.join(", ")
    )?;
    writeln!(out, "            __f({})", args.join(", "))?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")
}

fn write_assertions<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    ctx: &ManagedContext<'_>,
) -> fmt::Result {
    let binds = format!("{}Binds", class.name);
    let bits = ctx.config.pointer_width * 8;

    if !class.used_types.is_empty() {
        writeln!(out)?;
        writeln!(out, "const _: () = {{")?;
        for name in &class.used_types {
            let Some(mapped) = ctx.types.get(name) else { continue };
            let path = ctx.module_item(&mapped.managed_namespace, &mapped.managed);
            writeln!(out, "    {}::assert_blittable::<{path}>();", ctx.runtime())?;
        }
        writeln!(out, "}};")?;
    }

    writeln!(out)?;
    writeln!(out, "#[cfg(target_pointer_width = \"{bits}\")]")?;
    writeln!(out, "const _: () = {{")?;
    for method in &class.methods {
        writeln!(
            out,
            "    assert!({binds}::{} == {});",
            block_const(method),
            method.block_size
        )?;
    }
    for name in &class.used_types {
        let (Some(mapped), Some(layout)) = (ctx.types.get(name), ctx.types.layout_of(name)) else {
            continue;
        };
        let path = ctx.module_item(&mapped.managed_namespace, &mapped.managed);
        writeln!(
            out,
            "    assert!(::core::mem::size_of::<{path}>() == {});",
            layout.size()
        )?;
        for field in &layout.fields {
            writeln!(
                out,
                "    assert!(::core::mem::offset_of!({path}, {}) == {});",
                field.name, field.offset
            )?;
        }
    }
    writeln!(out, "}};")
}
