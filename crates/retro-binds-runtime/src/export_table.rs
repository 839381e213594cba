//! Native-host export table.
//!
//! The host side of the bridge: the engine registers each implemented export
//! under its module with the parameter-block size of its real signature, then
//! installs the table to obtain the [`HostCallbackTable`] it hands to managed
//! code. Lookups validate the requested size against the registered one, so a
//! stub generated from a different declaration resolves to null.
//!
//! Hosts written in Rust (tests, tools, the engine stand-in) use this
//! directly. A C++ host implements the same contract in its own build.

use std::ffi::c_void;
use std::ptr::NonNull;

use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::Xxh64;

use crate::host::decode_utf16;
use crate::{BindError, BindResult, HostCallbackTable};

/// One function the host exports.
#[derive(Debug, Clone, Copy)]
pub struct ExportedFunction {
    pub name: &'static str,
    pub ptr: *const c_void,
    pub block_size: usize,
}

impl ExportedFunction {
    pub const fn new(name: &'static str, ptr: *const c_void, block_size: usize) -> Self {
        Self {
            name,
            ptr,
            block_size,
        }
    }
}

#[derive(Debug)]
struct Entry {
    module: String,
    function: String,
    ptr: NonNull<c_void>,
    block_size: usize,
}

/// Hash a `(module, function)` pair into a lookup key.
fn export_key(module: &str, function: &str) -> u64 {
    let mut hasher = Xxh64::new(0);
    hasher.update(module.as_bytes());
    hasher.update(&[0]);
    hasher.update(function.as_bytes());
    hasher.digest()
}

/// Mutable registration phase of an export table.
#[derive(Debug, Default)]
pub struct ExportTableBuilder {
    entries: Vec<Entry>,
    errors: Vec<BindError>,
}

impl ExportTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every function of `module`.
    pub fn module(&mut self, module: &str, functions: &[ExportedFunction]) -> &mut Self {
        for function in functions {
            self.register(module, *function);
        }
        self
    }

    pub fn register(&mut self, module: &str, function: ExportedFunction) -> &mut Self {
        let Some(ptr) = NonNull::new(function.ptr.cast_mut()) else {
            self.errors.push(BindError::NullHostExport {
                module: module.to_string(),
                function: function.name.to_string(),
            });
            return self;
        };

        self.entries.push(Entry {
            module: module.to_string(),
            function: function.name.to_string(),
            ptr,
            block_size: function.block_size,
        });
        self
    }

    /// Freeze the table.
    ///
    /// # Errors
    ///
    /// Null addresses and `(module, function)` pairs registered more than once
    /// are all reported together. Two exports with the same name are rejected
    /// even when their sizes differ.
    pub fn build(self) -> Result<ExportTable, Vec<BindError>> {
        let mut errors = self.errors;
        let mut buckets: FxHashMap<u64, Vec<Entry>> = FxHashMap::default();

        for entry in self.entries {
            let bucket = buckets
                .entry(export_key(&entry.module, &entry.function))
                .or_default();
            if bucket
                .iter()
                .any(|e| e.module == entry.module && e.function == entry.function)
            {
                errors.push(BindError::DuplicateHostExport {
                    module: entry.module,
                    function: entry.function,
                });
                continue;
            }
            bucket.push(entry);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ExportTable { buckets })
    }
}

/// Immutable export table.
#[derive(Debug)]
pub struct ExportTable {
    buckets: FxHashMap<u64, Vec<Entry>>,
}

// SAFETY: entries hold code addresses that are never dereferenced as data.
unsafe impl Send for ExportTable {}
unsafe impl Sync for ExportTable {}

static INSTALLED: OnceCell<ExportTable> = OnceCell::new();

impl ExportTable {
    pub fn builder() -> ExportTableBuilder {
        ExportTableBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Find an export whose registered parameter-block size equals
    /// `block_size`.
    pub fn lookup(&self, module: &str, function: &str, block_size: usize) -> Option<NonNull<c_void>> {
        let entry = self
            .buckets
            .get(&export_key(module, function))?
            .iter()
            .find(|e| e.module == module && e.function == function);

        match entry {
            Some(entry) if entry.block_size == block_size => Some(entry.ptr),
            Some(entry) => {
                log::warn!(
                    "export {module}::{function} requested with {block_size} bytes, host provides {}",
                    entry.block_size
                );
                None
            }
            None => {
                log::warn!("export {module}::{function} is not registered");
                None
            }
        }
    }

    /// Make this table the process-wide host export table and return the
    /// callback table for the binding registry.
    ///
    /// # Errors
    ///
    /// `HostAlreadyInstalled` if a table was installed before.
    pub fn install(self) -> BindResult<HostCallbackTable> {
        let count = self.len();
        INSTALLED
            .set(self)
            .map_err(|_| BindError::HostAlreadyInstalled)?;
        log::info!("installed native export table with {count} exports");
        Ok(HostCallbackTable::new(installed_resolve))
    }

    /// The installed table, if any.
    pub fn installed() -> Option<&'static ExportTable> {
        INSTALLED.get()
    }
}

/// C entry point handed to managed code through [`HostCallbackTable`].
unsafe extern "C" fn installed_resolve(
    module: *const u16,
    module_len: i32,
    function: *const u16,
    function_len: i32,
    block_size: i32,
) -> *mut c_void {
    // SAFETY: the managed side passes buffers of the stated lengths.
    let decoded = unsafe {
        (
            decode_utf16(module, module_len),
            decode_utf16(function, function_len),
        )
    };
    let (Some(module), Some(function)) = decoded else {
        return std::ptr::null_mut();
    };
    let (Some(table), Ok(block_size)) = (INSTALLED.get(), usize::try_from(block_size)) else {
        return std::ptr::null_mut();
    };

    table
        .lookup(&module, &function, block_size)
        .map_or(std::ptr::null_mut(), NonNull::as_ptr)
}
