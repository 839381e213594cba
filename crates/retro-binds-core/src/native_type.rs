//! Native-side type descriptors used when rendering declarations.

use std::fmt;

/// How a value crosses the boundary on the native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indirection {
    /// Copied byte-for-byte.
    Value,
    /// `T*`
    Pointer,
    /// `T&`
    Reference,
}

/// Native type descriptor: a base name plus indirection and const-ness.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NativeType {
    base: String,
    indirection: Indirection,
    is_const: bool,
}

impl NativeType {
    pub fn value(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            indirection: Indirection::Value,
            is_const: false,
        }
    }

    pub fn pointer(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            indirection: Indirection::Pointer,
            is_const: false,
        }
    }

    pub fn reference(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            indirection: Indirection::Reference,
            is_const: false,
        }
    }

    pub fn void() -> Self {
        Self::value("void")
    }

    /// Const-qualify an indirect type. By-value types stay unqualified.
    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const && self.indirection != Indirection::Value;
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn indirection(&self) -> Indirection {
        self.indirection
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn is_void(&self) -> bool {
        self.indirection == Indirection::Value && self.base == "void"
    }

    pub fn is_indirect(&self) -> bool {
        self.indirection != Indirection::Value
    }

    /// Full spelling, e.g. `const retro::Transform&`.
    pub fn render(&self) -> String {
        let const_prefix = if self.is_const { "const " } else { "" };
        let suffix = match self.indirection {
            Indirection::Value => "",
            Indirection::Pointer => "*",
            Indirection::Reference => "&",
        };
        format!("{const_prefix}{}{suffix}", self.base)
    }

    /// Spelling with a declarator name, e.g. `const retro::Transform& transform`.
    pub fn render_declarator(&self, name: &str) -> String {
        format!("{} {name}", self.render())
    }

    /// The slot size expression used by generated native registration code.
    ///
    /// References and pointers occupy a pointer slot; `sizeof(T&)` would
    /// report the referent's size instead.
    pub fn sizeof_expr(&self) -> String {
        match self.indirection {
            Indirection::Value => format!("sizeof({})", self.base),
            Indirection::Pointer | Indirection::Reference => "sizeof(void*)".to_string(),
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_values() {
        assert_eq!(NativeType::value("int32").render(), "int32");
        assert_eq!(NativeType::void().render(), "void");
        assert!(NativeType::void().is_void());
    }

    #[test]
    fn renders_indirections() {
        let ty = NativeType::reference("retro::Transform").with_const(true);
        assert_eq!(ty.render(), "const retro::Transform&");
        assert_eq!(ty.render_declarator("transform"), "const retro::Transform& transform");

        let ty = NativeType::pointer("void");
        assert_eq!(ty.render(), "void*");
        assert!(!ty.is_void());
    }

    #[test]
    fn const_is_dropped_for_values() {
        let ty = NativeType::value("int32").with_const(true);
        assert!(!ty.is_const());
        assert_eq!(ty.render(), "int32");
    }

    #[test]
    fn sizeof_uses_pointer_slot_for_indirect() {
        assert_eq!(NativeType::value("retro::Color").sizeof_expr(), "sizeof(retro::Color)");
        assert_eq!(
            NativeType::reference("retro::Transform").with_const(true).sizeof_expr(),
            "sizeof(void*)"
        );
    }
}
