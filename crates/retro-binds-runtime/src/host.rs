//! The host callback table.
//!
//! The native host hands managed code a single resolution entry point:
//!
//! ```text
//! (module: *const u16, module_len: i32,
//!  function: *const u16, function_len: i32,
//!  block_size: i32) -> *mut c_void        // null on miss or size mismatch
//! ```
//!
//! Names are UTF-16 code units with explicit lengths, not NUL-terminated.

use std::ffi::c_void;
use std::fmt;

/// Signature of the host's resolution entry point.
pub type HostResolveFn =
    unsafe extern "C" fn(*const u16, i32, *const u16, i32, i32) -> *mut c_void;

/// The callback table delivered once by the native host.
#[derive(Clone, Copy)]
pub struct HostCallbackTable {
    resolve: HostResolveFn,
}

impl HostCallbackTable {
    pub const fn new(resolve: HostResolveFn) -> Self {
        Self { resolve }
    }

    /// Build a table from the opaque pointer the host passes at startup.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be the address of a function with the [`HostResolveFn`]
    /// signature that stays valid for the life of the process.
    pub unsafe fn from_raw(ptr: *const c_void) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: non-null and, per the contract above, a HostResolveFn.
        let resolve = unsafe { std::mem::transmute::<*const c_void, HostResolveFn>(ptr) };
        Some(Self { resolve })
    }

    /// Ask the host for an export. Returns null when the host has no export
    /// with that name and parameter-block size.
    pub(crate) fn lookup(&self, module: &str, function: &str, block_size: i32) -> *mut c_void {
        let module: Vec<u16> = module.encode_utf16().collect();
        let function: Vec<u16> = function.encode_utf16().collect();

        let (Ok(module_len), Ok(function_len)) =
            (i32::try_from(module.len()), i32::try_from(function.len()))
        else {
            return std::ptr::null_mut();
        };

        // SAFETY: both buffers outlive the call and lengths match their
        // contents; the host contract forbids retaining the pointers.
        unsafe {
            (self.resolve)(
                module.as_ptr(),
                module_len,
                function.as_ptr(),
                function_len,
                block_size,
            )
        }
    }
}

impl fmt::Debug for HostCallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallbackTable")
            .field("resolve", &(self.resolve as *const c_void))
            .finish()
    }
}

/// Decode a length-prefixed UTF-16 name received from the other side.
///
/// Returns `None` for null pointers, negative lengths or invalid UTF-16.
///
/// # Safety
///
/// If non-null, `ptr` must be valid for reads of `len` `u16` values.
pub unsafe fn decode_utf16(ptr: *const u16, len: i32) -> Option<String> {
    let len = usize::try_from(len).ok()?;
    if ptr.is_null() {
        return (len == 0).then(String::new);
    }
    // SAFETY: caller guarantees `len` readable code units at `ptr`.
    let units = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf16(units).ok()
}
