//! The `Blittable` marker trait.
//!
//! Implemented for primitives here and for user structs/enums by
//! `#[derive(Blittable)]`. Generated managed stubs use it to assert at compile
//! time that every by-value argument is safe to copy across the boundary.

/// A value type whose in-memory layout is identical on both sides of the
/// boundary.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` (or a primitive integer `repr` for
/// fieldless enums) and contain only other `Blittable` types by value. No
/// references, pointers or heap-owning fields.
pub unsafe trait Blittable: Copy + 'static {
    /// The native spelling of this type, e.g. `retro::Color`.
    const NATIVE_NAME: &'static str;

    /// Native module that declares this type, when it is not a built-in.
    const NATIVE_MODULE: Option<&'static str> = None;

    /// Size in bytes, as seen by the managed side.
    const SIZE: usize = core::mem::size_of::<Self>();
}

macro_rules! impl_primitive_blittable {
    ($($ty:ty => $native:literal),* $(,)?) => {
        $(
            unsafe impl Blittable for $ty {
                const NATIVE_NAME: &'static str = $native;
            }
        )*
    };
}

impl_primitive_blittable! {
    bool => "bool",
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
    isize => "isize",
    usize => "usize",
    f32 => "float",
    f64 => "double",
}

/// Compile-time check that `T` is blittable. Used by derived impls and stubs.
pub const fn assert_blittable<T: Blittable>() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveKind;

    fn native_name_of<T: Blittable>() -> &'static str {
        T::NATIVE_NAME
    }

    #[test]
    fn primitive_names_match_primitive_kind() {
        assert_eq!(native_name_of::<i32>(), PrimitiveKind::Int32.native_name());
        assert_eq!(native_name_of::<f32>(), PrimitiveKind::Float.native_name());
        assert_eq!(native_name_of::<u64>(), PrimitiveKind::Uint64.native_name());
        assert_eq!(native_name_of::<bool>(), PrimitiveKind::Bool.native_name());
    }

    #[test]
    fn sizes_default_to_size_of() {
        assert_eq!(<f64 as Blittable>::SIZE, 8);
        assert_eq!(<u16 as Blittable>::SIZE, 2);
        assert_eq!(<i8 as Blittable>::NATIVE_MODULE, None);
    }
}
