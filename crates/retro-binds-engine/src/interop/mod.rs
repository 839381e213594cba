//! Managed declarations of the engine interop surface.
//!
//! Everything under this module is scanned by the build script; the traits
//! here are implemented by the generated `*Binds` types in [`crate::binds`].

pub mod entity;
pub mod logging;
pub mod math;
pub mod types;
