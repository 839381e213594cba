//! Per-call-site resolution cache.

use once_cell::sync::OnceCell;

use crate::{BindResult, BindingRegistry, BoundFunction};

/// The lazily resolved target of one generated call site.
///
/// The first successful resolution is cached for the life of the site and
/// never invalidated. Concurrent first callers block on the same resolution
/// and observe the same handle. A failed resolution is not cached, so every
/// later call reports the failure again.
#[derive(Debug)]
pub struct CallSite {
    module: &'static str,
    function: &'static str,
    block_size: usize,
    bound: OnceCell<BoundFunction>,
}

impl CallSite {
    pub const fn new(module: &'static str, function: &'static str, block_size: usize) -> Self {
        Self {
            module,
            function,
            block_size,
            bound: OnceCell::new(),
        }
    }

    /// Return the cached handle, resolving it through `registry` on first use.
    pub fn get_or_resolve(&self, registry: &BindingRegistry) -> BindResult<&BoundFunction> {
        self.bound
            .get_or_try_init(|| registry.resolve(self.module, self.function, self.block_size))
    }

    pub fn get(&self) -> Option<&BoundFunction> {
        self.bound.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.bound.get().is_some()
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindError, HostCallbackTable};
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static LOOKUPS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn tick() {}

    unsafe extern "C" fn counting_host(
        _: *const u16,
        _: i32,
        _: *const u16,
        _: i32,
        block_size: i32,
    ) -> *mut c_void {
        LOOKUPS.fetch_add(1, Ordering::SeqCst);
        if block_size == 0 {
            tick as *const () as *mut c_void
        } else {
            std::ptr::null_mut()
        }
    }

    #[test]
    fn success_is_cached_and_failure_is_not() {
        let registry = BindingRegistry::new();
        registry.initialize(HostCallbackTable::new(counting_host)).unwrap();
        let before = LOOKUPS.load(Ordering::SeqCst);

        let good = CallSite::new("Engine", "Tick", 0);
        assert!(!good.is_resolved());
        let first = good.get_or_resolve(&registry).unwrap().as_ptr();
        let second = good.get_or_resolve(&registry).unwrap().as_ptr();
        assert_eq!(first, second);
        assert!(good.is_resolved());

        let bad = CallSite::new("Engine", "Tick", 4);
        assert!(matches!(
            bad.get_or_resolve(&registry),
            Err(BindError::NotFound { block_size: 4, .. })
        ));
        assert!(bad.get_or_resolve(&registry).is_err());
        assert!(!bad.is_resolved());

        // One lookup for the cached site, two for the failing one.
        assert_eq!(LOOKUPS.load(Ordering::SeqCst) - before, 3);
    }

    #[test]
    fn accessors() {
        let site = CallSite::new("MathModule", "Add", 8);
        assert_eq!(site.module(), "MathModule");
        assert_eq!(site.function(), "Add");
        assert_eq!(site.block_size(), 8);
        assert!(site.get().is_none());
    }
}
