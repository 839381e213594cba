//! Managed-side type descriptors as written in declarations.

use std::fmt;

use crate::PrimitiveKind;

/// A Rust type appearing in an exported signature or a blittable field.
///
/// Paths are kept as written (`math::Transform`); lookups use the final
/// segment, see [`ManagedType::ident`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManagedType {
    /// `()` or an omitted return type.
    Unit,
    /// A named type such as `i32`, `Transform` or `core::ffi::c_void`.
    Path(String),
    /// `&T` / `&mut T`.
    Ref { mutable: bool, inner: Box<ManagedType> },
    /// `*const T` / `*mut T`.
    Ptr { mutable: bool, inner: Box<ManagedType> },
}

impl ManagedType {
    pub fn path(path: impl Into<String>) -> Self {
        ManagedType::Path(path.into())
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        ManagedType::Path(kind.rust_name().to_string())
    }

    pub fn reference(inner: ManagedType, mutable: bool) -> Self {
        ManagedType::Ref {
            mutable,
            inner: Box::new(inner),
        }
    }

    pub fn pointer(inner: ManagedType, mutable: bool) -> Self {
        ManagedType::Ptr {
            mutable,
            inner: Box::new(inner),
        }
    }

    /// Final path segment, for named types only.
    pub fn ident(&self) -> Option<&str> {
        match self {
            ManagedType::Path(path) => Some(path.rsplit("::").next().unwrap_or(path)),
            _ => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, ManagedType::Unit)
    }

    /// `c_void`, only meaningful behind a pointer.
    pub fn is_opaque(&self) -> bool {
        self.ident() == Some("c_void")
    }

    /// The primitive kind of a named type, if it is one.
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            ManagedType::Path(path) => PrimitiveKind::from_rust_name(path),
            _ => None,
        }
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self, ManagedType::Ref { .. } | ManagedType::Ptr { .. })
    }
}

impl fmt::Display for ManagedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedType::Unit => write!(f, "()"),
            ManagedType::Path(_) if self.is_opaque() => write!(f, "::core::ffi::c_void"),
            ManagedType::Path(path) => write!(f, "{path}"),
            ManagedType::Ref { mutable, inner } => {
                if *mutable {
                    write!(f, "&mut {inner}")
                } else {
                    write!(f, "&{inner}")
                }
            }
            ManagedType::Ptr { mutable, inner } => {
                if *mutable {
                    write!(f, "*mut {inner}")
                } else {
                    write!(f, "*const {inner}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_uses_last_segment() {
        assert_eq!(ManagedType::path("math::Transform").ident(), Some("Transform"));
        assert_eq!(ManagedType::path("i32").ident(), Some("i32"));
        assert_eq!(ManagedType::Unit.ident(), None);
    }

    #[test]
    fn display_renders_rust_syntax() {
        let ty = ManagedType::reference(ManagedType::path("Transform"), false);
        assert_eq!(ty.to_string(), "&Transform");

        let ty = ManagedType::pointer(ManagedType::path("std::ffi::c_void"), true);
        assert_eq!(ty.to_string(), "*mut ::core::ffi::c_void");

        let ty = ManagedType::reference(ManagedType::path("EntityId"), true);
        assert_eq!(ty.to_string(), "&mut EntityId");
    }

    #[test]
    fn primitive_detection() {
        assert_eq!(ManagedType::path("f32").as_primitive(), Some(PrimitiveKind::Float));
        assert_eq!(ManagedType::path("Color").as_primitive(), None);
        assert!(ManagedType::path("c_void").is_opaque());
    }
}
