//! Engine interop layer.
//!
//! The declarations in [`interop`] are scanned at build time; the generated
//! managed stubs land in [`binds`] and the matching native declarations in
//! [`native_dir`]. [`host`] provides a Rust stand-in for the native engine so
//! the whole bridge can run in-process.
//!
//! ```no_run
//! use retro_binds_engine::interop::math::MathModule;
//!
//! let bindings = retro_binds_engine::bootstrap().unwrap();
//! assert_eq!(bindings.math.add(2, 3), 5);
//! ```

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use retro_binds_runtime::{BindError, BindingRegistry};

pub mod binds;
pub mod host;
pub mod interop;

pub use binds::ScriptBindings;

/// Directory holding the generated native stubs, `registration.cpp` and
/// `index.ixx`.
pub fn native_dir() -> &'static Path {
    Path::new(concat!(env!("OUT_DIR"), "/native"))
}

static REGISTRY: OnceCell<Arc<BindingRegistry>> = OnceCell::new();

/// The process-wide registry, initialized from the stand-in host on first
/// use.
pub fn registry() -> Result<Arc<BindingRegistry>, BindError> {
    REGISTRY
        .get_or_try_init(|| {
            let table = host::export_table()
                .map_err(|mut errors| {
                    for err in &errors {
                        log::error!("invalid host export: {err}");
                    }
                    // build() only fails with at least one error
                    errors.remove(0)
                })?
                .install()?;
            let registry = BindingRegistry::new();
            registry.initialize(table)?;
            Ok(Arc::new(registry))
        })
        .cloned()
}

/// Install the stand-in host and resolve every binding eagerly.
pub fn bootstrap() -> Result<ScriptBindings, BindError> {
    let bindings = ScriptBindings::new(registry()?);
    bindings.resolve_all()?;
    Ok(bindings)
}
