//! Runtime half of the Retro native binding bridge.
//!
//! The native host delivers a [`HostCallbackTable`] once at startup; the
//! process bootstrap installs it into a [`BindingRegistry`] and hands the
//! registry (behind an `Arc`) to generated binding stubs. Each generated
//! method owns a [`CallSite`] that resolves its native function on first use,
//! passing the parameter-block size it was generated with, and caches the
//! resulting [`BoundFunction`] forever.
//!
//! ```text
//! native host ──HostCallbackTable──► BindingRegistry::initialize   (once)
//!                                          │
//! generated stub ─► CallSite::get_or_resolve(&registry)
//!                        │  first call only
//!                        ▼
//!              registry.resolve("MathModule", "Add", 8)
//!                        │  host validates the size, null on mismatch
//!                        ▼
//!                  BoundFunction ─► as_fn::<extern "C" fn(i32, i32) -> i32>()
//! ```
//!
//! [`ExportTable`] implements the host side for Rust hosts.

mod bound;
mod call_site;
mod error;
mod export_table;
pub mod host;
mod registry;

pub use bound::BoundFunction;
pub use call_site::CallSite;
pub use error::{BindError, BindResult};
pub use export_table::{ExportTable, ExportTableBuilder, ExportedFunction};
pub use host::{HostCallbackTable, HostResolveFn};
pub use registry::BindingRegistry;

pub use retro_binds_core::{Blittable, assert_blittable};
