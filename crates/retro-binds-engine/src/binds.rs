//! Generated managed call stubs, one `*Binds` type per exported trait.

use std::sync::Arc;

use retro_binds_runtime::{BindError, BindingRegistry};

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

/// Every generated stub, sharing one registry.
pub struct ScriptBindings {
    pub math: MathModuleBinds,
    pub entity: EntityExporterBinds,
    pub log: LogExporterBinds,
}

impl ScriptBindings {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self {
            math: MathModuleBinds::new(Arc::clone(&registry)),
            entity: EntityExporterBinds::new(Arc::clone(&registry)),
            log: LogExporterBinds::new(registry),
        }
    }

    /// Resolve every export up front so a mismatched host fails at startup
    /// instead of on first call.
    pub fn resolve_all(&self) -> Result<(), BindError> {
        self.math.resolve_all()?;
        self.entity.resolve_all()?;
        self.log.resolve_all()
    }
}
