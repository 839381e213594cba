//! The resolved export declaration model.
//!
//! An [`ExportedClass`] is the single source of truth both generated stubs are
//! rendered from. Parameter order is ABI-significant: emitters must walk
//! `params` in order and never sort or filter them.

use std::fmt;

use crate::naming::to_snake_case;
use crate::{Location, ManagedType, NativeType};

/// Structural classification of an export. Selects the native template
/// variant; the ABI contract is identical across kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportKind {
    /// Functions in a nested `ns::<snake>` namespace.
    #[default]
    Class,
    /// Flat `<snake>_<fn>` functions in the namespace.
    Struct,
    /// `extern "C"` declarations in a plain C header.
    Record,
}

impl ExportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(ExportKind::Class),
            "struct" => Some(ExportKind::Struct),
            "record" => Some(ExportKind::Record),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ExportKind::Class => "class",
            ExportKind::Struct => "struct",
            ExportKind::Record => "record",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an argument is marshaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Passing {
    /// Copied into the parameter block.
    Value,
    /// Passed as an opaque address, native `T&`.
    Reference,
    /// Passed as an opaque address, native `T*`.
    Pointer,
}

/// A resolved parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub managed: ManagedType,
    pub native: NativeType,
    pub passing: Passing,
    /// Slot size in the parameter block.
    pub size: usize,
}

impl Parameter {
    pub fn is_reference(&self) -> bool {
        self.passing != Passing::Value
    }

    pub fn is_const(&self) -> bool {
        self.native.is_const()
    }

    /// Rendered native type, e.g. `const retro::Transform&`.
    pub fn native_type_name(&self) -> String {
        self.native.render()
    }
}

/// A resolved return slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSlot {
    pub managed: ManagedType,
    pub native: NativeType,
    /// Zero for `void`.
    pub size: usize,
}

impl ReturnSlot {
    pub fn void() -> Self {
        Self {
            managed: ManagedType::Unit,
            native: NativeType::void(),
            size: 0,
        }
    }

    pub fn is_void(&self) -> bool {
        self.managed.is_unit()
    }
}

/// A resolved method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedMethod {
    /// Rust name, as declared.
    pub name: String,
    /// Registry function key (`GetEntityTransformOffset`).
    pub export_name: String,
    /// Native function name (`get_entity_transform_offset`).
    pub native_name: String,
    pub params: Vec<Parameter>,
    pub ret: ReturnSlot,
    /// Expected parameter-block size passed at resolution time.
    pub block_size: usize,
    pub location: Location,
}

/// A resolved exported class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedClass {
    pub name: String,
    pub managed_namespace: String,
    /// Explicit override from the declaration.
    pub native_namespace_override: Option<String>,
    /// Namespace taken from the subject type's mapping.
    pub mapped_namespace: Option<String>,
    pub kind: ExportKind,
    pub methods: Vec<ExportedMethod>,
    /// Sorted, de-duplicated native modules the native stub imports.
    pub imports: Vec<String>,
    /// Managed names of blittable types used by value or by reference, in
    /// first-use order.
    pub used_types: Vec<String>,
    pub location: Location,
}

impl ExportedClass {
    /// Native namespace: override, then the subject mapping, then the managed
    /// namespace verbatim.
    pub fn native_namespace(&self) -> &str {
        self.native_namespace_override
            .as_deref()
            .or(self.mapped_namespace.as_deref())
            .unwrap_or(&self.managed_namespace)
    }

    /// Module key used for registry lookups.
    pub fn module_name(&self) -> &str {
        &self.name
    }

    pub fn snake_name(&self) -> String {
        to_snake_case(&self.name)
    }

    /// `interop::math::MathModule`
    pub fn qualified_name(&self) -> String {
        if self.managed_namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.managed_namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class() -> ExportedClass {
        ExportedClass {
            name: "EntityExporter".into(),
            managed_namespace: "interop::entity".into(),
            native_namespace_override: None,
            mapped_namespace: None,
            kind: ExportKind::Class,
            methods: Vec::new(),
            imports: Vec::new(),
            used_types: Vec::new(),
            location: Location::synthetic(),
        }
    }

    #[test]
    fn namespace_precedence() {
        let mut c = class();
        assert_eq!(c.native_namespace(), "interop::entity");

        c.mapped_namespace = Some("retro".into());
        assert_eq!(c.native_namespace(), "retro");

        c.native_namespace_override = Some("retro::scripting".into());
        assert_eq!(c.native_namespace(), "retro::scripting");
    }

    #[test]
    fn names() {
        let c = class();
        assert_eq!(c.snake_name(), "entity_exporter");
        assert_eq!(c.module_name(), "EntityExporter");
        assert_eq!(c.qualified_name(), "interop::entity::EntityExporter");
    }

    #[test]
    fn kind_parse() {
        assert_eq!(ExportKind::parse("record"), Some(ExportKind::Record));
        assert_eq!(ExportKind::parse("enum"), None);
        assert_eq!(ExportKind::Struct.to_string(), "struct");
    }
}
