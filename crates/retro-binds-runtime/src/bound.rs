//! Validated native function handles.

use std::ffi::c_void;
use std::ptr::NonNull;

/// A function pointer the host resolved for a specific module, function and
/// parameter-block size.
///
/// The pointer is non-null and never re-resolved. Handles are immutable and
/// may be shared and invoked from any thread; the callee's own thread safety
/// is the native implementation's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFunction {
    ptr: NonNull<c_void>,
    module: String,
    function: String,
    block_size: usize,
}

// SAFETY: the pointer is a code address, never dereferenced as data.
unsafe impl Send for BoundFunction {}
unsafe impl Sync for BoundFunction {}

impl BoundFunction {
    pub(crate) fn new(
        ptr: NonNull<c_void>,
        module: impl Into<String>,
        function: impl Into<String>,
        block_size: usize,
    ) -> Self {
        Self {
            ptr,
            module: module.into(),
            function: function.into(),
            block_size,
        }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr.as_ptr()
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    /// The parameter-block size this handle was validated against.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Reinterpret the address as a concrete function-pointer type.
    ///
    /// # Safety
    ///
    /// `F` must be an `extern "C"` function pointer type whose signature
    /// matches the native export, argument for argument.
    pub unsafe fn as_fn<F: Copy>(&self) -> F {
        const {
            assert!(
                size_of::<F>() == size_of::<*const c_void>(),
                "F must be a function pointer"
            )
        };
        let raw = self.ptr.as_ptr().cast_const();
        // SAFETY: sizes match and the caller guarantees F is the export's type.
        unsafe { std::mem::transmute_copy::<*const c_void, F>(&raw) }
    }
}
