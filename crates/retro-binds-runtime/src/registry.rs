//! The binding registry.
//!
//! One registry per process, created by the bootstrap path and shared with
//! generated call sites through an `Arc`. Its only state is the host callback
//! table slot:
//!
//! ```text
//! BindingRegistry::new()      slot empty, every resolve -> NotInitialized
//!        │
//!        ▼ initialize(table)  written exactly once
//! slot = table                 resolve -> host lookup, read-only from here
//!        │
//!        ▼ initialize(table)  AlreadyInitialized, slot untouched
//! ```
//!
//! After initialization the registry is read-only, so concurrent resolution
//! needs no locking beyond the once-cell itself.

use std::ptr::NonNull;

use once_cell::sync::OnceCell;

use crate::{BindError, BindResult, BoundFunction, HostCallbackTable};

#[derive(Debug, Default)]
pub struct BindingRegistry {
    host: OnceCell<HostCallbackTable>,
}

impl BindingRegistry {
    pub const fn new() -> Self {
        Self {
            host: OnceCell::new(),
        }
    }

    /// Install the host callback table.
    ///
    /// # Errors
    ///
    /// Any call after the first fails with `AlreadyInitialized`, even with an
    /// identical table. Callers treat this as fatal.
    pub fn initialize(&self, table: HostCallbackTable) -> BindResult<()> {
        self.host.set(table).map_err(|_| {
            log::error!("binding registry initialized twice");
            BindError::AlreadyInitialized
        })?;
        log::info!("binding registry initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.host.get().is_some()
    }

    /// Resolve `function` in `module`, expecting a parameter block of
    /// `block_size` bytes.
    ///
    /// The host validates the size against its own export; any mismatch or
    /// miss comes back as `NotFound`. Nothing is cached here; see
    /// [`CallSite`](crate::CallSite) for the per-call-site cache.
    pub fn resolve(
        &self,
        module: &str,
        function: &str,
        block_size: usize,
    ) -> BindResult<BoundFunction> {
        let host = self.host.get().ok_or_else(|| BindError::NotInitialized {
            module: module.to_string(),
            function: function.to_string(),
        })?;

        let size = i32::try_from(block_size).map_err(|_| BindError::BlockTooLarge {
            module: module.to_string(),
            function: function.to_string(),
            block_size,
        })?;

        let ptr = host.lookup(module, function, size);
        match NonNull::new(ptr) {
            Some(ptr) => {
                log::debug!("resolved {module}::{function} ({block_size} bytes) at {ptr:p}");
                Ok(BoundFunction::new(ptr, module, function, block_size))
            }
            None => {
                log::error!("failed to resolve {module}::{function} ({block_size} bytes)");
                Err(BindError::NotFound {
                    module: module.to_string(),
                    function: function.to_string(),
                    block_size,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::decode_utf16;
    use std::ffi::c_void;

    extern "C" fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    unsafe extern "C" fn math_host(
        module: *const u16,
        module_len: i32,
        function: *const u16,
        function_len: i32,
        block_size: i32,
    ) -> *mut c_void {
        let module = unsafe { decode_utf16(module, module_len) };
        let function = unsafe { decode_utf16(function, function_len) };
        match (module.as_deref(), function.as_deref(), block_size) {
            (Some("MathModule"), Some("Add"), 8) => add as *const () as *mut c_void,
            _ => std::ptr::null_mut(),
        }
    }

    unsafe extern "C" fn other_host(
        _: *const u16,
        _: i32,
        _: *const u16,
        _: i32,
        _: i32,
    ) -> *mut c_void {
        std::ptr::null_mut()
    }

    #[test]
    fn resolve_before_initialize_fails() {
        let registry = BindingRegistry::new();
        assert!(!registry.is_initialized());
        assert_eq!(
            registry.resolve("MathModule", "Add", 8).unwrap_err(),
            BindError::NotInitialized {
                module: "MathModule".into(),
                function: "Add".into()
            }
        );
    }

    #[test]
    fn second_initialize_fails_even_with_same_table() {
        let registry = BindingRegistry::new();
        registry.initialize(HostCallbackTable::new(math_host)).unwrap();
        assert_eq!(
            registry.initialize(HostCallbackTable::new(math_host)),
            Err(BindError::AlreadyInitialized)
        );
        assert_eq!(
            registry.initialize(HostCallbackTable::new(other_host)),
            Err(BindError::AlreadyInitialized)
        );
        // First table is still in effect.
        assert!(registry.resolve("MathModule", "Add", 8).is_ok());
    }

    #[test]
    fn resolve_matching_size_succeeds() {
        let registry = BindingRegistry::new();
        registry.initialize(HostCallbackTable::new(math_host)).unwrap();

        let bound = registry.resolve("MathModule", "Add", 8).unwrap();
        let f: extern "C" fn(i32, i32) -> i32 = unsafe { bound.as_fn() };
        assert_eq!(f(40, 2), 42);
    }

    #[test]
    fn resolve_mismatched_size_fails() {
        let registry = BindingRegistry::new();
        registry.initialize(HostCallbackTable::new(math_host)).unwrap();

        let err = registry.resolve("MathModule", "Add", 12).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to find bound function Add in MathModule (expected parameter block of 12 bytes)"
        );
        assert!(registry.resolve("MathModule", "Sub", 8).is_err());
    }

    #[test]
    fn oversized_block_is_rejected_before_the_host() {
        let registry = BindingRegistry::new();
        registry.initialize(HostCallbackTable::new(math_host)).unwrap();
        let err = registry
            .resolve("MathModule", "Add", i32::MAX as usize + 1)
            .unwrap_err();
        assert!(matches!(err, BindError::BlockTooLarge { .. }));
    }
}
