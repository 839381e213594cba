//! Run-level artifacts: the native registration unit, the native index
//! partition and the managed index module.
//!
//! `registration.cpp` hands every export to the engine's `BindsManager` with
//! the parameter-block size spelled as a `sizeof` expression, so the size the
//! host validates against is the one its own compiler computes.

use std::fmt::{self, Write};

use retro_binds_core::{ExportKind, ExportedClass, ExportedMethod, Passing};

use super::{
    SCRIPTING_MODULE, banner, counts_return, managed_file_name, native_file_name,
    native_function_path, native_sizeof,
};
use crate::GeneratorConfig;

/// Name of the registration function declared by the index partition.
pub const REGISTER_FUNCTION: &str = "register_script_binds";

fn index_partition(config: &GeneratorConfig) -> String {
    config
        .fragment_prefix
        .clone()
        .unwrap_or_else(|| "index".to_string())
}

fn registration_partition(config: &GeneratorConfig) -> String {
    config.fragment_name("registration")
}

/// `sizeof(int32) + sizeof(int32)`, or `0` for an empty block.
pub fn block_size_expr(method: &ExportedMethod, config: &GeneratorConfig) -> String {
    let ns = config.generated_namespace.as_str();
    let mut terms: Vec<String> = method
        .params
        .iter()
        .map(|p| native_sizeof(&p.native, p.passing, ns))
        .collect();
    if counts_return(config) && !method.ret.is_void() {
        let passing = if method.ret.native.is_indirect() {
            Passing::Pointer
        } else {
            Passing::Value
        };
        terms.push(native_sizeof(&method.ret.native, passing, ns));
    }
    if terms.is_empty() {
        "0".to_string()
    } else {
        terms.join(" + ")
    }
}

/// Render `registration.cpp`.
pub fn write_registration<W: Write>(
    out: &mut W,
    classes: &[ExportedClass],
    config: &GeneratorConfig,
) -> fmt::Result {
    writeln!(out, "{}", banner(None))?;

    let headers: Vec<String> = classes
        .iter()
        .filter(|c| c.kind == ExportKind::Record)
        .map(native_file_name)
        .collect();
    if !headers.is_empty() {
        writeln!(out, "module;")?;
        writeln!(out)?;
        for header in &headers {
            writeln!(out, "#include \"{header}\"")?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "module {}:{};",
        config.module_name,
        registration_partition(config)
    )?;
    writeln!(out)?;
    writeln!(out, "import :{};", index_partition(config))?;
    let mut imports: Vec<String> = classes
        .iter()
        .flat_map(|c| c.imports.iter().cloned())
        .filter(|m| *m != config.module_name)
        .collect();
    if config.module_name != SCRIPTING_MODULE {
        imports.push(SCRIPTING_MODULE.to_string());
    }
    imports.sort();
    imports.dedup();
    for import in &imports {
        writeln!(out, "import {import};")?;
    }
    writeln!(out)?;

    let ns = config.generated_namespace.as_str();
    let (open, indent) = if ns.is_empty() {
        (false, "")
    } else {
        writeln!(out, "namespace {ns}")?;
        writeln!(out, "{{")?;
        (true, "    ")
    };

    writeln!(out, "{indent}void {REGISTER_FUNCTION}()")?;
    writeln!(out, "{indent}{{")?;
    for (i, class) in classes.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let local = format!("{}_name", class.snake_name());
        writeln!(
            out,
            "{indent}    const Name {local} = u\"{}\";",
            class.module_name()
        )?;
        for method in &class.methods {
            writeln!(
                out,
                "{indent}    BindsManager::register_exported_function({local}, ExportedFunction(u\"{}\", &{}, {}));",
                method.export_name,
                native_function_path(class, &method.native_name),
                block_size_expr(method, config)
            )?;
        }
    }
    writeln!(out, "{indent}}}")?;

    if open {
        writeln!(out, "}}")?;
    }
    Ok(())
}

/// Render `index.ixx`, the partition re-exporting every module fragment.
pub fn write_native_index<W: Write>(
    out: &mut W,
    classes: &[ExportedClass],
    config: &GeneratorConfig,
) -> fmt::Result {
    writeln!(out, "{}", banner(None))?;
    writeln!(
        out,
        "export module {}:{};",
        config.module_name,
        index_partition(config)
    )?;
    writeln!(out)?;

    let mut wrote_any = false;
    for class in classes {
        if class.kind == ExportKind::Record {
            continue;
        }
        writeln!(
            out,
            "export import :{};",
            config.fragment_name(&class.snake_name())
        )?;
        wrote_any = true;
    }
    if wrote_any {
        writeln!(out)?;
    }

    let ns = config.generated_namespace.as_str();
    if ns.is_empty() {
        writeln!(out, "export void {REGISTER_FUNCTION}();")
    } else {
        writeln!(out, "export namespace {ns}")?;
        writeln!(out, "{{")?;
        writeln!(out, "    void {REGISTER_FUNCTION}();")?;
        writeln!(out, "}}")
    }
}

/// Render `bindings.rs`, the managed module `include!`-ing every stub.
pub fn write_managed_index<W: Write>(out: &mut W, classes: &[ExportedClass]) -> fmt::Result {
    writeln!(out, "{}", banner(None))?;
    for class in classes {
        writeln!(out)?;
        let snake = class.snake_name();
        writeln!(out, "pub mod {snake} {{")?;
        writeln!(
            out,
            "    include!(\"{}\");",
            managed_file_name(class)
        )?;
        writeln!(out, "}}")?;
        writeln!(out, "pub use {snake}::{}Binds;", class.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_binds_core::{
        ExportDecl, ExportResolver, Location, ManagedType, MethodDecl, ParamDecl, TypeMapBuilder,
    };

    fn classes(config: &GeneratorConfig) -> Vec<ExportedClass> {
        let loc = Location::synthetic;
        let types = TypeMapBuilder::new(config.target()).build().unwrap();
        let decls = vec![
            ExportDecl::new("MathModule", "interop::math", loc())
                .with_native_namespace("retro")
                .method(
                    MethodDecl::new("add", loc())
                        .param(ParamDecl::new("a", ManagedType::path("i32"), loc()))
                        .param(ParamDecl::new("b", ManagedType::path("i32"), loc()))
                        .returns(ManagedType::path("i32")),
                ),
            ExportDecl::new("LogExporter", "interop::log", loc())
                .with_native_namespace("retro")
                .with_kind(ExportKind::Record)
                .method(MethodDecl::new("flush", loc())),
        ];
        ExportResolver::new(&types, config.return_slot_policy())
            .resolve_all(&decls)
            .unwrap()
    }

    #[test]
    fn registration_unit() {
        let config = GeneratorConfig::default();
        let mut out = String::new();
        write_registration(&mut out, &classes(&config), &config).unwrap();
        let expected = "\
// Generated by retro-binds. Do not edit.
module;

#include \"log_exporter.h\"

module retro.scripting:registration;

import :index;

namespace retro
{
    void register_script_binds()
    {
        const Name math_module_name = u\"MathModule\";
        BindsManager::register_exported_function(math_module_name, ExportedFunction(u\"Add\", &retro::math_module::add, sizeof(int32) + sizeof(int32)));

        const Name log_exporter_name = u\"LogExporter\";
        BindsManager::register_exported_function(log_exporter_name, ExportedFunction(u\"Flush\", &retro::log_exporter_flush, 0));
    }
}
";
        assert_eq!(out, expected);
    }

    #[test]
    fn return_slot_is_counted_when_configured() {
        let config = GeneratorConfig {
            include_return_slot: true,
            ..GeneratorConfig::default()
        };
        let mut out = String::new();
        write_registration(&mut out, &classes(&config), &config).unwrap();
        assert!(out.contains("sizeof(int32) + sizeof(int32) + sizeof(int32)"));
    }

    #[test]
    fn index_skips_headers() {
        let config = GeneratorConfig {
            module_name: "retro.interop".into(),
            fragment_prefix: Some("binds".into()),
            ..GeneratorConfig::default()
        };
        let mut out = String::new();
        write_native_index(&mut out, &classes(&config), &config).unwrap();
        assert_eq!(
            out,
            "// Generated by retro-binds. Do not edit.\n\
             export module retro.interop:binds;\n\
             \n\
             export import :binds.math_module;\n\
             \n\
             export namespace retro\n\
             {\n    void register_script_binds();\n}\n"
        );

        let mut reg = String::new();
        write_registration(&mut reg, &classes(&config), &config).unwrap();
        assert!(reg.contains("module retro.interop:binds.registration;"));
        assert!(reg.contains("import :binds;\nimport retro.scripting;\n"));
    }

    #[test]
    fn managed_index_includes_every_stub() {
        let config = GeneratorConfig::default();
        let mut out = String::new();
        write_managed_index(&mut out, &classes(&config)).unwrap();
        assert!(out.contains(
            "pub mod math_module {\n    include!(\"math_module.rs\");\n}\npub use math_module::MathModuleBinds;"
        ));
        assert!(out.contains("pub use log_exporter::LogExporterBinds;"));
    }
}
