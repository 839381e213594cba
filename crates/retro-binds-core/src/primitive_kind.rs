//! Primitive type kinds that map directly between Rust and the native engine.

use std::fmt;

use crate::{Layout, TargetLayout};

/// Built-in numeric and boolean types with a fixed native counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Isize,
    Usize,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 13] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Int8,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Uint8,
        PrimitiveKind::Uint16,
        PrimitiveKind::Uint32,
        PrimitiveKind::Uint64,
        PrimitiveKind::Isize,
        PrimitiveKind::Usize,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Look up a primitive by its Rust spelling (`i32`, `f32`, ...).
    pub fn from_rust_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PrimitiveKind::Bool,
            "i8" => PrimitiveKind::Int8,
            "i16" => PrimitiveKind::Int16,
            "i32" => PrimitiveKind::Int32,
            "i64" => PrimitiveKind::Int64,
            "u8" => PrimitiveKind::Uint8,
            "u16" => PrimitiveKind::Uint16,
            "u32" => PrimitiveKind::Uint32,
            "u64" => PrimitiveKind::Uint64,
            "isize" => PrimitiveKind::Isize,
            "usize" => PrimitiveKind::Usize,
            "f32" => PrimitiveKind::Float,
            "f64" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// The Rust spelling of this primitive.
    pub const fn rust_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "i8",
            PrimitiveKind::Int16 => "i16",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Uint8 => "u8",
            PrimitiveKind::Uint16 => "u16",
            PrimitiveKind::Uint32 => "u32",
            PrimitiveKind::Uint64 => "u64",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::Float => "f32",
            PrimitiveKind::Double => "f64",
        }
    }

    /// The engine-side type name.
    pub const fn native_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint8 => "uint8",
            PrimitiveKind::Uint16 => "uint16",
            PrimitiveKind::Uint32 => "uint32",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Isize => "isize",
            PrimitiveKind::Usize => "usize",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Size in bytes on the given target.
    pub const fn size(self, target: &TargetLayout) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Int8 | PrimitiveKind::Uint8 => 1,
            PrimitiveKind::Int16 | PrimitiveKind::Uint16 => 2,
            PrimitiveKind::Int32 | PrimitiveKind::Uint32 | PrimitiveKind::Float => 4,
            PrimitiveKind::Int64 | PrimitiveKind::Uint64 | PrimitiveKind::Double => 8,
            PrimitiveKind::Isize | PrimitiveKind::Usize => target.pointer_size,
        }
    }

    /// Alignment on the given target. Equals the size except for 8-byte
    /// scalars, which follow [`TargetLayout::wide_align`].
    pub const fn align(self, target: &TargetLayout) -> usize {
        let size = self.size(target);
        if size == 8 && target.wide_align < 8 {
            target.wide_align
        } else {
            size
        }
    }

    pub const fn layout(self, target: &TargetLayout) -> Layout {
        Layout::new(self.size(target), self.align(target))
    }

    /// Whether this kind may back a fieldless enum's `repr`.
    pub const fn is_integer(self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Bool | PrimitiveKind::Float | PrimitiveKind::Double
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rust_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_rust_name(kind.rust_name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_rust_name("String"), None);
    }

    #[test]
    fn native_names() {
        assert_eq!(PrimitiveKind::Int32.native_name(), "int32");
        assert_eq!(PrimitiveKind::Float.native_name(), "float");
        assert_eq!(PrimitiveKind::Uint64.native_name(), "uint64");
    }

    #[test]
    fn pointer_sized_follow_target() {
        let narrow = TargetLayout::with_pointer_size(4);
        assert_eq!(PrimitiveKind::Usize.size(&narrow), 4);
        assert_eq!(PrimitiveKind::Usize.size(&TargetLayout::default()), 8);
        assert_eq!(PrimitiveKind::Double.size(&narrow), 8);
    }

    #[test]
    fn wide_scalars_follow_target_alignment() {
        let i686 = TargetLayout {
            pointer_size: 4,
            wide_align: 4,
        };
        assert_eq!(PrimitiveKind::Double.layout(&i686), Layout::new(8, 4));
        assert_eq!(PrimitiveKind::Uint64.align(&i686), 4);
        assert_eq!(PrimitiveKind::Int32.align(&i686), 4);
        assert_eq!(PrimitiveKind::Int16.align(&i686), 2);
        assert_eq!(PrimitiveKind::Double.layout(&TargetLayout::default()), Layout::new(8, 8));
    }

    #[test]
    fn enum_repr_candidates() {
        assert!(PrimitiveKind::Uint8.is_integer());
        assert!(!PrimitiveKind::Float.is_integer());
        assert!(!PrimitiveKind::Bool.is_integer());
    }
}
