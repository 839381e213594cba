//! Retro Binds
//!
//! A native binding bridge between Rust scripting code and the Retro engine
//! host. Interop surfaces are declared once, as annotated Rust traits and
//! value types; a build-time generator turns them into managed call stubs and
//! matching C++ declarations so both sides agree on every signature and every
//! parameter-block size.
//!
//! ```text
//!  #[derive(Blittable)] types ─┐
//!  #[bind_export] traits ──────┴─► retro-binds-codegen (build.rs)
//!                                        │
//!                 ┌──────────────────────┼─────────────────────────┐
//!                 ▼                      ▼                         ▼
//!        managed stubs (*.rs)    native stubs (*.ixx, *.h)   registration.cpp
//!                 │                                                │
//!                 ▼                                                ▼
//!        CallSite ─► BindingRegistry ─► host callback ◄── BindsManager
//! ```
//!
//! This crate re-exports the pieces scripting code touches directly: the
//! annotation macros, the [`Blittable`] marker and the runtime registry.
//! Generated code refers to `::retro_binds_core` and `::retro_binds_runtime`
//! by absolute path, so crates using the macros depend on both as well.
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
//!     fn fill(&self, color: Color) -> bool;
//! }
//! ```

pub use retro_binds_core::{Blittable, assert_blittable};
pub use retro_binds_macros::{Blittable, bind_export};
pub use retro_binds_runtime::{
    BindError, BindResult, BindingRegistry, BoundFunction, CallSite, ExportTable,
    ExportTableBuilder, ExportedFunction, HostCallbackTable, HostResolveFn,
};

/// Host-facing helpers: callback signature and UTF-16 name decoding.
pub mod host {
    pub use retro_binds_runtime::host::*;
}

pub mod prelude {
    pub use crate::{BindError, BindingRegistry, Blittable, CallSite, bind_export};
}
