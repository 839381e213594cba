//! Template set.
//!
//! Each emitter is a `write_*` function over `fmt::Write` rendering one
//! artifact from the resolved model. Emitters never reorder parameters and
//! never consult anything but their arguments, so output is a pure function of
//! the model and the config.

pub mod managed;
pub mod native;
pub mod registration;

use retro_binds_core::{ExportKind, ExportedClass, NativeType, Passing, ReturnSlotPolicy};

use crate::GeneratorConfig;

/// Module that owns `BindsManager`; fragments of other modules import it.
pub const SCRIPTING_MODULE: &str = "retro.scripting";

/// First line of every generated file, in the file's comment syntax.
pub(crate) fn banner(source: Option<&str>) -> String {
    match source {
        Some(source) => format!("// Generated by retro-binds from {source}. Do not edit."),
        None => "// Generated by retro-binds. Do not edit.".to_string(),
    }
}

/// Strip `namespace::` from a native name written inside `namespace`.
pub(crate) fn relative_to(name: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        return name.to_string();
    }
    name.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix("::"))
        .unwrap_or(name)
        .to_string()
}

/// Render a native type as seen from inside `namespace`.
pub(crate) fn native_type_in(ty: &NativeType, namespace: &str) -> String {
    let base = relative_to(ty.base(), namespace);
    let mut rendered = String::new();
    if ty.is_const() {
        rendered.push_str("const ");
    }
    rendered.push_str(&base);
    match ty.indirection() {
        retro_binds_core::Indirection::Value => {}
        retro_binds_core::Indirection::Pointer => rendered.push('*'),
        retro_binds_core::Indirection::Reference => rendered.push('&'),
    }
    rendered
}

/// Native slot size expression of one position, as seen from `namespace`.
pub(crate) fn native_sizeof(ty: &NativeType, passing: Passing, namespace: &str) -> String {
    match passing {
        Passing::Value => format!("sizeof({})", relative_to(ty.base(), namespace)),
        Passing::Reference | Passing::Pointer => "sizeof(void*)".to_string(),
    }
}

/// Name of the native function implementing `method` of `class`, without
/// namespace.
pub(crate) fn native_function_name(class: &ExportedClass, method_native: &str) -> String {
    match class.kind {
        ExportKind::Class => method_native.to_string(),
        ExportKind::Struct | ExportKind::Record => {
            format!("{}_{}", class.snake_name(), method_native)
        }
    }
}

/// Namespace that directly contains the class's native functions.
pub(crate) fn function_namespace(class: &ExportedClass) -> String {
    let ns = class.native_namespace();
    match class.kind {
        ExportKind::Class if ns.is_empty() => class.snake_name(),
        ExportKind::Class => format!("{ns}::{}", class.snake_name()),
        ExportKind::Struct | ExportKind::Record => ns.to_string(),
    }
}

/// Fully qualified native function, e.g. `retro::math_module::add`.
pub(crate) fn native_function_path(class: &ExportedClass, method_native: &str) -> String {
    let ns = function_namespace(class);
    let name = native_function_name(class, method_native);
    if ns.is_empty() {
        name
    } else {
        format!("{ns}::{name}")
    }
}

/// File name of the native stub for `class`.
pub fn native_file_name(class: &ExportedClass) -> String {
    match class.kind {
        ExportKind::Record => format!("{}.h", class.snake_name()),
        ExportKind::Class | ExportKind::Struct => format!("{}.ixx", class.snake_name()),
    }
}

/// File name of the managed stub for `class`.
pub fn managed_file_name(class: &ExportedClass) -> String {
    format!("{}.rs", class.snake_name())
}

/// Imports of a fragment: the class imports, plus the scripting module when
/// generating into another module. Sorted and de-duplicated.
pub(crate) fn fragment_imports(class: &ExportedClass, config: &GeneratorConfig) -> Vec<String> {
    let mut imports: Vec<String> = class
        .imports
        .iter()
        .filter(|m| **m != config.module_name)
        .cloned()
        .collect();
    if config.module_name != SCRIPTING_MODULE {
        imports.push(SCRIPTING_MODULE.to_string());
    }
    imports.sort();
    imports.dedup();
    imports
}

/// Whether the return slot is part of the block size under `config`.
pub(crate) fn counts_return(config: &GeneratorConfig) -> bool {
    config.return_slot_policy() == ReturnSlotPolicy::Included
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_binds_core::Location;

    fn class(kind: ExportKind, namespace: &str) -> ExportedClass {
        ExportedClass {
            name: "MathModule".into(),
            managed_namespace: namespace.into(),
            native_namespace_override: None,
            mapped_namespace: None,
            kind,
            methods: Vec::new(),
            imports: vec!["retro.core".into()],
            used_types: Vec::new(),
            location: Location::synthetic(),
        }
    }

    #[test]
    fn relative_names() {
        assert_eq!(relative_to("retro::Color", "retro"), "Color");
        assert_eq!(relative_to("retro::Color", "retro::math"), "retro::Color");
        assert_eq!(relative_to("retronaut::Ship", "retro"), "retronaut::Ship");
        assert_eq!(relative_to("int32", ""), "int32");
    }

    #[test]
    fn native_types_inside_namespace() {
        let ty = NativeType::reference("retro::Transform").with_const(true);
        assert_eq!(native_type_in(&ty, "retro"), "const Transform&");
        assert_eq!(native_type_in(&ty, "game"), "const retro::Transform&");
        assert_eq!(native_sizeof(&ty, Passing::Reference, "retro"), "sizeof(void*)");
        assert_eq!(
            native_sizeof(&NativeType::value("retro::Color"), Passing::Value, "retro"),
            "sizeof(Color)"
        );
    }

    #[test]
    fn function_paths_by_kind() {
        let c = class(ExportKind::Class, "retro");
        assert_eq!(native_function_path(&c, "add"), "retro::math_module::add");
        assert_eq!(native_file_name(&c), "math_module.ixx");

        let s = class(ExportKind::Struct, "retro");
        assert_eq!(native_function_path(&s, "add"), "retro::math_module_add");

        let r = class(ExportKind::Record, "");
        assert_eq!(native_function_path(&r, "add"), "math_module_add");
        assert_eq!(native_file_name(&r), "math_module.h");
        assert_eq!(managed_file_name(&r), "math_module.rs");
    }

    #[test]
    fn scripting_module_is_imported_from_other_modules() {
        let c = class(ExportKind::Class, "retro");
        let mut config = GeneratorConfig::default();
        assert_eq!(fragment_imports(&c, &config), vec!["retro.core"]);

        config.module_name = "retro.interop".into();
        assert_eq!(
            fragment_imports(&c, &config),
            vec!["retro.core", "retro.scripting"]
        );
    }
}
