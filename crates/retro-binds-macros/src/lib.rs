//! Retro Binds Proc Macros
//!
//! Compile-time half of the binding annotations. The build-time generator
//! reads the same annotations from source; these macros make the compiler
//! reject what the generator would reject and keep helper attributes from
//! reaching rustc.
//!
//! # Macros
//!
//! - `#[derive(Blittable)]` - Mark a `#[repr(C)]` value type as safe to copy
//!   across the boundary
//! - `#[bind_export]` - Declare a trait whose methods are implemented natively
//!
//! # Example
//!
//! ```ignore
//! use retro_binds::{Blittable, bind_export};
//!
//! #[derive(Clone, Copy, Blittable)]
//! #[repr(C)]
//! #[blittable(name = "retro::Color", module = "retro.core")]
//! pub struct Color {
//!     pub r: f32,
//!     pub g: f32,
//!     pub b: f32,
//!     pub a: f32,
//! }
//!
//! #[bind_export(namespace = "retro")]
//! pub trait Painter {
//!     fn fill(&self, color: Color, #[native(is_const)] target: &Color) -> bool;
//! }
//! ```

use proc_macro::TokenStream;

mod bind_export;
mod derive_blittable;

/// Derive the `Blittable` marker for a value type.
///
/// Structs must be `#[repr(C)]` with named fields, every field itself
/// blittable. Enums must be fieldless with an integer `repr` (or
/// `#[repr(C)]`, treated as `i32`). Generic types are rejected.
///
/// # Attributes
///
/// - `#[blittable(name = "...")]` - Native type name (default: the Rust name)
/// - `#[blittable(module = "...")]` - Native module declaring the type
#[proc_macro_derive(Blittable, attributes(blittable))]
pub fn derive_blittable(input: TokenStream) -> TokenStream {
    derive_blittable::derive_blittable_impl(input)
}

/// Declare a trait as a set of native exports.
///
/// Every method must take `&self`, have no body and no generics. Parameters
/// may carry `#[native(...)]` and methods `#[native_return(...)]`; both are
/// validated and removed.
///
/// # Arguments
///
/// - `namespace = "..."` - Native namespace override
/// - `kind = "class" | "struct" | "record"` - Native template (default `class`)
/// - `subject = Type` - Blittable type whose native namespace the export uses
///
/// # Example
///
/// ```ignore
/// #[bind_export(kind = "struct", subject = Transform)]
/// pub trait EntityExporter {
///     fn get_transform(&self, entity: u64, out: &mut Transform) -> bool;
/// }
/// ```
#[proc_macro_attribute]
pub fn bind_export(attr: TokenStream, item: TokenStream) -> TokenStream {
    bind_export::bind_export_impl(attr, item)
}
