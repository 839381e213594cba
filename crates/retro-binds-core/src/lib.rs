//! Core data model for the Retro native binding bridge.
//!
//! This crate holds everything both halves of the bridge agree on at build
//! time:
//!
//! - [`TypeMap`]: the type mapping table (managed value type -> native name,
//!   module and C layout), built through [`TypeMapBuilder`].
//! - [`ExportDecl`] and friends: unresolved declarations produced by the
//!   annotation scanner.
//! - [`ExportedClass`]: the resolved export declaration model, produced by
//!   [`ExportResolver`], that the code generator renders both stubs from.
//! - [`Blittable`]: the marker trait implemented by `#[derive(Blittable)]`.
//!
//! # Example
//!
//! ```
//! use retro_binds_core::*;
//!
//! let types = TypeMapBuilder::new(TargetLayout::default()).build().unwrap();
//! let decl = ExportDecl::new("MathModule", "interop::math", Location::synthetic()).method(
//!     MethodDecl::new("add", Location::synthetic())
//!         .param(ParamDecl::new("a", ManagedType::path("i32"), Location::synthetic()))
//!         .param(ParamDecl::new("b", ManagedType::path("i32"), Location::synthetic()))
//!         .returns(ManagedType::path("i32")),
//! );
//!
//! let mut resolver = ExportResolver::new(&types, ReturnSlotPolicy::Excluded);
//! let class = resolver.resolve(&decl).unwrap();
//! assert_eq!(class.methods[0].export_name, "Add");
//! assert_eq!(class.methods[0].block_size, 8);
//! ```

mod blittable;
mod error;
mod layout;
mod managed_type;
mod model;
pub mod naming;
mod native_type;
mod primitive_kind;
mod resolver;
mod span;
mod type_map;
mod unresolved;

pub use blittable::{Blittable, assert_blittable};
pub use error::{BindsError, BindsResult};
pub use layout::{FieldLayout, Layout, ReturnSlotPolicy, StructLayout, TargetLayout, align_up};
pub use managed_type::ManagedType;
pub use model::{ExportKind, ExportedClass, ExportedMethod, Parameter, Passing, ReturnSlot};
pub use native_type::{Indirection, NativeType};
pub use primitive_kind::PrimitiveKind;
pub use resolver::{ExportResolver, RESERVED_METHOD_NAMES};
pub use span::{Location, Span};
pub use type_map::{BlittableField, BlittableShape, BlittableType, TypeMap, TypeMapBuilder};
pub use unresolved::{ExportDecl, MethodDecl, NativeOverride, ParamDecl};
