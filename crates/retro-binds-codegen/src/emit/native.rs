//! Native (C++) declaration emitter.
//!
//! One stub per exported class. The `kind` of the export picks the template:
//!
//! ```text
//! class   math_module.ixx   export module retro.scripting:math_module;
//!                           export namespace retro::math_module { int32 add(int32 a, int32 b); }
//! struct  math_module.ixx   export module retro.scripting:math_module;
//!                           export namespace retro { int32 math_module_add(int32 a, int32 b); }
//! record  math_module.h     #pragma once
//!                           namespace retro { extern "C" { int32 math_module_add(int32 a, int32 b); } }
//! ```
//!
//! Every variant ends with `static_assert`s on the size and field offsets of
//! the blittable types the class uses, computed from the same layouts the
//! managed stub asserts.

use std::fmt::{self, Write};

use retro_binds_core::{ExportKind, ExportedClass, ExportedMethod, TypeMap};

use super::{banner, fragment_imports, function_namespace, native_function_name, native_type_in};
use crate::GeneratorConfig;

const INDENT: &str = "    ";

/// Render the native stub for `class`.
pub fn write_native_stub<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    types: &TypeMap,
    config: &GeneratorConfig,
) -> fmt::Result {
    writeln!(out, "{}", banner(Some(&class.qualified_name())))?;
    match class.kind {
        ExportKind::Class | ExportKind::Struct => write_module_interface(out, class, config)?,
        ExportKind::Record => write_header(out, class, config)?,
    }
    write_layout_asserts(out, class, types)
}

fn write_module_interface<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    config: &GeneratorConfig,
) -> fmt::Result {
    writeln!(out, "module;")?;
    writeln!(out)?;
    writeln!(out, "#include <cstddef>")?;
    writeln!(out)?;
    writeln!(
        out,
        "export module {}:{};",
        config.module_name,
        config.fragment_name(&class.snake_name())
    )?;

    let imports = fragment_imports(class, config);
    if !imports.is_empty() {
        writeln!(out)?;
        for import in &imports {
            writeln!(out, "import {import};")?;
        }
    }

    writeln!(out)?;
    let ns = function_namespace(class);
    if ns.is_empty() {
        writeln!(out, "export")?;
    } else {
        writeln!(out, "export namespace {ns}")?;
    }
    writeln!(out, "{{")?;
    write_declarations(out, class, INDENT)?;
    writeln!(out, "}}")
}

fn write_header<W: Write>(
    out: &mut W,
    class: &ExportedClass,
    config: &GeneratorConfig,
) -> fmt::Result {
    writeln!(out, "#pragma once")?;
    writeln!(out)?;
    writeln!(out, "#include <cstddef>")?;

    let imports = fragment_imports(class, config);
    if !imports.is_empty() {
        writeln!(out)?;
        writeln!(out, "// Requires modules: {}", imports.join(", "))?;
    }

    writeln!(out)?;
    let ns = function_namespace(class);
    let inner = if ns.is_empty() {
        String::from(INDENT)
    } else {
        writeln!(out, "namespace {ns}")?;
        writeln!(out, "{{")?;
        format!("{INDENT}{INDENT}")
    };
    let outer = &inner[INDENT.len()..];
    writeln!(out, "{outer}extern \"C\"")?;
    writeln!(out, "{outer}{{")?;
    write_declarations(out, class, &inner)?;
    writeln!(out, "{outer}}}")?;
    if !ns.is_empty() {
        writeln!(out, "}}")?;
    }
    Ok(())
}

/// One declaration per method, in declaration order.
fn write_declarations<W: Write>(out: &mut W, class: &ExportedClass, indent: &str) -> fmt::Result {
    for method in &class.methods {
        writeln!(out, "{indent}{};", declaration(class, method))?;
    }
    Ok(())
}

/// `int32 add(int32 a, int32 b)`, types written relative to the class
/// namespace.
pub fn declaration(class: &ExportedClass, method: &ExportedMethod) -> String {
    let ns = class.native_namespace();
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{} {}", native_type_in(&p.native, ns), p.name))
        .collect();
    format!(
        "{} {}({})",
        native_type_in(&method.ret.native, ns),
        native_function_name(class, &method.native_name),
        params.join(", ")
    )
}

fn write_layout_asserts<W: Write>(out: &mut W, class: &ExportedClass, types: &TypeMap) -> fmt::Result {
    let mut wrote_any = false;
    for name in &class.used_types {
        let (Some(mapped), Some(layout)) = (types.get(name), types.layout_of(name)) else {
            continue;
        };
        if !wrote_any {
            writeln!(out)?;
            wrote_any = true;
        }
        let native = &mapped.native_name;
        writeln!(
            out,
            "static_assert(sizeof({native}) == {}, \"{native} does not match the managed layout\");",
            layout.size()
        )?;
        for field in &layout.fields {
            writeln!(
                out,
                "static_assert(offsetof({native}, {}) == {}, \"{native}::{} is misplaced\");",
                field.name, field.offset, field.name
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_binds_core::{
        BlittableField, BlittableShape, BlittableType, ExportDecl, ExportResolver, Location,
        ManagedType, MethodDecl, ParamDecl, TypeMapBuilder,
    };

    fn types() -> TypeMap {
        let loc = Location::synthetic;
        let mut builder = TypeMapBuilder::default();
        builder
            .register(
                BlittableType::new(
                    "Color",
                    "retro::Color",
                    BlittableShape::Struct {
                        fields: ["r", "g", "b", "a"]
                            .into_iter()
                            .map(|f| BlittableField::new(f, ManagedType::path("f32"), loc()))
                            .collect(),
                    },
                    loc(),
                )
                .with_module("retro.core"),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn painter(kind: ExportKind) -> ExportDecl {
        let loc = Location::synthetic;
        ExportDecl::new("Painter", "interop::paint", loc())
            .with_kind(kind)
            .with_subject("Color")
            .method(
                MethodDecl::new("fill", loc())
                    .param(ParamDecl::new("color", ManagedType::path("Color"), loc()))
                    .param(ParamDecl::new(
                        "out",
                        ManagedType::reference(ManagedType::path("Color"), true),
                        loc(),
                    ))
                    .returns(ManagedType::path("bool")),
            )
    }

    fn render(kind: ExportKind, config: &GeneratorConfig) -> String {
        let types = types();
        let class = ExportResolver::new(&types, config.return_slot_policy())
            .resolve(&painter(kind))
            .unwrap();
        let mut out = String::new();
        write_native_stub(&mut out, &class, &types, config).unwrap();
        out
    }

    #[test]
    fn class_kind_uses_nested_namespace() {
        let out = render(ExportKind::Class, &GeneratorConfig::default());
        let expected = "\
// Generated by retro-binds from interop::paint::Painter. Do not edit.
module;

#include <cstddef>

export module retro.scripting:painter;

import retro.core;

export namespace retro::painter
{
    bool fill(Color color, Color& out);
}

static_assert(sizeof(retro::Color) == 16, \"retro::Color does not match the managed layout\");
static_assert(offsetof(retro::Color, r) == 0, \"retro::Color::r is misplaced\");
static_assert(offsetof(retro::Color, g) == 4, \"retro::Color::g is misplaced\");
static_assert(offsetof(retro::Color, b) == 8, \"retro::Color::b is misplaced\");
static_assert(offsetof(retro::Color, a) == 12, \"retro::Color::a is misplaced\");
";
        assert_eq!(out, expected);
    }

    #[test]
    fn struct_kind_uses_flat_names() {
        let config = GeneratorConfig {
            module_name: "retro.interop".into(),
            fragment_prefix: Some("binds".into()),
            ..GeneratorConfig::default()
        };
        let out = render(ExportKind::Struct, &config);
        assert!(out.contains("export module retro.interop:binds.painter;"));
        assert!(out.contains("import retro.core;\nimport retro.scripting;\n"));
        assert!(out.contains("export namespace retro\n{\n    bool painter_fill(Color color, Color& out);\n}"));
    }

    #[test]
    fn record_kind_is_a_c_header() {
        let out = render(ExportKind::Record, &GeneratorConfig::default());
        assert!(out.contains("#pragma once"));
        assert!(!out.contains("export module"));
        assert!(out.contains("// Requires modules: retro.core"));
        assert!(out.contains(
            "namespace retro\n{\n    extern \"C\"\n    {\n        bool painter_fill(Color color, Color& out);\n    }\n}\n"
        ));
        assert!(out.contains("static_assert(sizeof(retro::Color) == 16"));
    }
}
