//! Build-time binding code generator.
//!
//! Scans Rust sources for `#[derive(Blittable)]` types and `#[bind_export]`
//! traits, resolves them into the export declaration model and renders, from
//! that single model, the managed call stubs and the native declarations
//! that must agree with them.
//!
//! # Usage from a build script
//!
//! ```no_run
//! use std::path::Path;
//! use retro_binds_codegen::{CONFIG_FILE_NAME, Generator, GeneratorConfig};
//!
//! # fn main() -> Result<(), retro_binds_codegen::GenerateError> {
//! let config = GeneratorConfig::load_or_default(Path::new(CONFIG_FILE_NAME))?;
//! let output = Generator::new(config).generate_dir(Path::new("src"), Path::new("src/interop"))?;
//! output.write(Path::new("target/binds"), Path::new("native/generated"))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Artifacts
//!
//! | file                | side    | contents                                   |
//! |---------------------|---------|--------------------------------------------|
//! | `<snake>.rs`        | managed | `<Name>Binds` implementing the trait        |
//! | `bindings.rs`       | managed | one module per stub                         |
//! | `<snake>.ixx`/`.h`  | native  | declarations, layout `static_assert`s       |
//! | `registration.cpp`  | native  | `register_exported_function` per method     |
//! | `index.ixx`         | native  | re-exports every fragment                   |

pub mod attrs;
mod config;
pub mod emit;
mod error;
mod generator;
pub mod scan;

pub use config::{CONFIG_FILE_NAME, GeneratorConfig};
pub use error::GenerateError;
pub use generator::{
    GeneratedClass, GeneratedFile, GeneratedOutput, Generator, MANAGED_INDEX, NATIVE_INDEX,
    REGISTRATION_FILE, collect_sources,
};
pub use scan::{ScanResult, SourceFile, scan_sources};
