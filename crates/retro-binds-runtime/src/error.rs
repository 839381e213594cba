//! Runtime binding errors.
//!
//! None of these are recoverable at the call site: a missing or mismatched
//! export cannot appear without rebuilding the native host.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// `initialize` was called a second time.
    #[error("binding registry is already initialized")]
    AlreadyInitialized,

    /// A resolution was attempted before the host delivered its callback table.
    #[error("binding registry is not initialized (resolving {function} in {module})")]
    NotInitialized { module: String, function: String },

    /// The host returned null: the export is missing or its parameter block
    /// differs from the expected size.
    #[error(
        "Failed to find bound function {function} in {module} (expected parameter block of {block_size} bytes)"
    )]
    NotFound {
        module: String,
        function: String,
        block_size: usize,
    },

    /// The expected size does not fit the host callback's `i32` argument.
    #[error("parameter block of {block_size} bytes for {module}::{function} exceeds the host limit")]
    BlockTooLarge {
        module: String,
        function: String,
        block_size: usize,
    },

    /// The host export table registered the same module/function pair twice.
    #[error("native export {function} in {module} is registered more than once")]
    DuplicateHostExport { module: String, function: String },

    /// The host export table was given a null function pointer.
    #[error("native export {function} in {module} has a null address")]
    NullHostExport { module: String, function: String },

    /// A host export table is already installed in this process.
    #[error("a native export table is already installed")]
    HostAlreadyInstalled,
}

pub type BindResult<T> = Result<T, BindError>;
