//! Generator orchestration.
//!
//! ```text
//! sources ──scan──► ScanResult ──build_types──► TypeMap
//!                        │                         │
//!                        └──────resolve────────────┴──► [ExportedClass]
//!                                                            │
//!                   managed stubs, native stubs, index files ◄┘
//! ```
//!
//! Each phase collects every error it finds before failing, so one run
//! reports all invalid declarations. Output ordering follows source order
//! (files sorted by path, items in file order), which makes the generated
//! text a pure function of the inputs.

use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};

use retro_binds_core::{
    BindsError, BlittableType, ExportDecl, ExportResolver, ExportedClass, TypeMap, TypeMapBuilder,
};
use rustc_hash::FxHashMap;

use crate::emit::managed::{ManagedContext, write_managed_stub};
use crate::emit::native::write_native_stub;
use crate::emit::registration::{write_managed_index, write_native_index, write_registration};
use crate::emit::{managed_file_name, native_file_name};
use crate::scan::{ScanResult, SourceFile, module_path_for, scan_sources};
use crate::{GenerateError, GeneratorConfig};

/// Managed index module name.
pub const MANAGED_INDEX: &str = "bindings.rs";
/// Native registration unit name.
pub const REGISTRATION_FILE: &str = "registration.cpp";
/// Native index partition name.
pub const NATIVE_INDEX: &str = "index.ixx";

/// One rendered file, named relative to its output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

impl GeneratedFile {
    fn new(name: impl Into<String>, contents: String) -> Self {
        Self {
            name: name.into(),
            contents,
        }
    }
}

/// Both stubs rendered from one resolved class.
#[derive(Debug, Clone)]
pub struct GeneratedClass {
    pub class: ExportedClass,
    pub managed: GeneratedFile,
    pub native: GeneratedFile,
}

/// Everything one generator run produces.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    pub types: TypeMap,
    pub classes: Vec<GeneratedClass>,
    pub managed_index: GeneratedFile,
    pub registration: GeneratedFile,
    pub native_index: GeneratedFile,
}

impl GeneratedOutput {
    /// Managed files: one stub per class, then the index.
    pub fn managed_files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.classes
            .iter()
            .map(|c| &c.managed)
            .chain(std::iter::once(&self.managed_index))
    }

    /// Native files: one stub per class, then registration and index.
    pub fn native_files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.classes
            .iter()
            .map(|c| &c.native)
            .chain([&self.registration, &self.native_index])
    }

    pub fn class(&self, name: &str) -> Option<&GeneratedClass> {
        self.classes.iter().find(|c| c.class.name == name)
    }

    /// Write managed and native files, creating the directories. Files whose
    /// contents are unchanged are left alone. Returns how many were written.
    pub fn write(&self, managed_dir: &Path, native_dir: &Path) -> Result<usize, GenerateError> {
        let mut written = 0;
        for (dir, files) in [
            (managed_dir, self.managed_files().collect::<Vec<_>>()),
            (native_dir, self.native_files().collect::<Vec<_>>()),
        ] {
            fs::create_dir_all(dir).map_err(|source| GenerateError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            for file in files {
                if write_if_changed(&dir.join(&file.name), &file.contents)? {
                    written += 1;
                }
            }
        }
        log::info!(
            "wrote {written} binding files ({} exports)",
            self.classes.len()
        );
        Ok(written)
    }
}

fn write_if_changed(path: &Path, contents: &str) -> Result<bool, GenerateError> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == contents {
            log::debug!("{} is up to date", path.display());
            return Ok(false);
        }
    }
    fs::write(path, contents).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Drives one generation run.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Build the type mapping table from scanned blittable types.
    pub fn build_types(&self, blittables: &[BlittableType]) -> Result<TypeMap, GenerateError> {
        let mut builder = TypeMapBuilder::new(self.config.target());
        let mut errors = Vec::new();
        for ty in blittables {
            if let Err(err) = builder.register(ty.clone()) {
                errors.push(err);
            }
        }
        match builder.build() {
            Ok(types) if errors.is_empty() => Ok(types),
            Ok(_) => Err(GenerateError::Declarations(errors)),
            Err(mut build_errors) => {
                errors.append(&mut build_errors);
                Err(GenerateError::Declarations(errors))
            }
        }
    }

    /// Resolve export declarations against `types`.
    pub fn resolve(
        &self,
        exports: &[ExportDecl],
        types: &TypeMap,
    ) -> Result<Vec<ExportedClass>, GenerateError> {
        let mut resolver = ExportResolver::new(types, self.config.return_slot_policy());
        let classes = resolver.resolve_all(exports)?;
        self.check_file_names(&classes)?;
        Ok(classes)
    }

    /// Exports in different modules may share a trait name, but they would
    /// share a registry module name and stub file too.
    fn check_file_names(&self, classes: &[ExportedClass]) -> Result<(), GenerateError> {
        let mut seen: FxHashMap<String, &ExportedClass> = FxHashMap::default();
        let mut errors = Vec::new();
        for class in classes {
            match seen.entry(class.snake_name()) {
                Entry::Occupied(first) => errors.push(BindsError::DuplicateExport {
                    name: class.name.clone(),
                    first: first.get().location.clone(),
                    location: class.location.clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(class);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::Declarations(errors))
        }
    }

    /// Render both stubs of one class.
    pub fn generate_class(
        &self,
        class: &ExportedClass,
        types: &TypeMap,
    ) -> Result<GeneratedClass, GenerateError> {
        let mut managed = String::new();
        let ctx = ManagedContext {
            types,
            config: &self.config,
        };
        write_managed_stub(&mut managed, class, &ctx)?;

        let mut native = String::new();
        write_native_stub(&mut native, class, types, &self.config)?;

        log::debug!(
            "generated {} ({} methods, kind {})",
            class.qualified_name(),
            class.methods.len(),
            class.kind
        );

        Ok(GeneratedClass {
            class: class.clone(),
            managed: GeneratedFile::new(managed_file_name(class), managed),
            native: GeneratedFile::new(native_file_name(class), native),
        })
    }

    /// Run every phase over already scanned declarations.
    pub fn generate(&self, scan: &ScanResult) -> Result<GeneratedOutput, GenerateError> {
        let types = self.build_types(&scan.blittables)?;
        let classes = self.resolve(&scan.exports, &types)?;

        let mut managed_index = String::new();
        write_managed_index(&mut managed_index, &classes)?;
        let mut registration = String::new();
        write_registration(&mut registration, &classes, &self.config)?;
        let mut native_index = String::new();
        write_native_index(&mut native_index, &classes, &self.config)?;

        let generated = classes
            .iter()
            .map(|class| self.generate_class(class, &types))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GeneratedOutput {
            types,
            classes: generated,
            managed_index: GeneratedFile::new(MANAGED_INDEX, managed_index),
            registration: GeneratedFile::new(REGISTRATION_FILE, registration),
            native_index: GeneratedFile::new(NATIVE_INDEX, native_index),
        })
    }

    /// Scan and generate in-memory sources.
    pub fn generate_sources(&self, sources: &[SourceFile]) -> Result<GeneratedOutput, GenerateError> {
        let scan = scan_sources(sources)?;
        log::info!(
            "found {} blittable types and {} exports in {} files",
            scan.blittables.len(),
            scan.exports.len(),
            sources.len()
        );
        self.generate(&scan)
    }

    /// Scan every `.rs` file under `dir`. Module paths are derived relative to
    /// `src_root`, the crate's `src` directory.
    pub fn generate_dir(&self, src_root: &Path, dir: &Path) -> Result<GeneratedOutput, GenerateError> {
        let sources = collect_sources(src_root, dir)?;
        self.generate_sources(&sources)
    }
}

/// Load every `.rs` file under `dir`, sorted by path.
pub fn collect_sources(src_root: &Path, dir: &Path) -> Result<Vec<SourceFile>, GenerateError> {
    let mut paths = Vec::new();
    walk(dir, &mut paths)?;
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let contents = fs::read_to_string(&path).map_err(|source| GenerateError::Io {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(src_root).unwrap_or(&path);
            let display = relative
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/");
            Ok(SourceFile::new(display, module_path_for(relative), contents))
        })
        .collect()
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), GenerateError> {
    let io_err = |source: std::io::Error| GenerateError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATH: &str = r#"
        #[bind_export(namespace = "retro")]
        pub trait MathModule {
            fn add(&self, a: i32, b: i32) -> i32;
        }
    "#;

    #[test]
    fn generates_every_artifact() {
        let output = Generator::default()
            .generate_sources(&[SourceFile::new("interop/math.rs", "interop::math", MATH)])
            .unwrap();

        let names: Vec<_> = output.managed_files().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["math_module.rs", "bindings.rs"]);
        let names: Vec<_> = output.native_files().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["math_module.ixx", "registration.cpp", "index.ixx"]);

        let math = output.class("MathModule").unwrap();
        assert_eq!(math.class.methods[0].block_size, 8);
    }

    #[test]
    fn same_trait_name_in_two_modules_is_rejected() {
        let err = Generator::default()
            .generate_sources(&[
                SourceFile::new("a.rs", "a", MATH),
                SourceFile::new("b.rs", "b", MATH),
            ])
            .unwrap_err();
        assert!(matches!(
            err.declarations(),
            [BindsError::DuplicateExport { name, .. }] if name == "MathModule"
        ));
    }

    #[test]
    fn conflicting_registrations_are_collected() {
        let source = r#"
            #[derive(Clone, Copy, Blittable)]
            #[repr(C)]
            #[blittable(name = "retro::Color")]
            pub struct Color { pub r: f32 }
        "#;
        let other = r#"
            #[derive(Clone, Copy, Blittable)]
            #[repr(C)]
            #[blittable(name = "game::Color")]
            pub struct Color { pub r: f32 }
        "#;
        let err = Generator::default()
            .generate_sources(&[
                SourceFile::new("a.rs", "a", source),
                SourceFile::new("b.rs", "b", other),
            ])
            .unwrap_err();
        assert!(matches!(
            err.declarations(),
            [BindsError::ConflictingMapping { .. }]
        ));
    }

    #[test]
    fn write_skips_unchanged_files() {
        let output = Generator::default()
            .generate_sources(&[SourceFile::new("math.rs", "math", MATH)])
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let managed = dir.path().join("managed");
        let native = dir.path().join("native");

        assert_eq!(output.write(&managed, &native).unwrap(), 5);
        assert_eq!(output.write(&managed, &native).unwrap(), 0);
        assert!(native.join("registration.cpp").exists());
    }

    #[test]
    fn directories_are_scanned_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path();
        fs::create_dir_all(src.join("interop")).unwrap();
        fs::write(src.join("interop/mod.rs"), "pub mod math;\n").unwrap();
        fs::write(src.join("interop/math.rs"), MATH).unwrap();
        fs::write(src.join("interop/notes.txt"), "ignored").unwrap();

        let sources = collect_sources(src, &src.join("interop")).unwrap();
        let paths: Vec<_> = sources.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["interop/math.rs", "interop/mod.rs"]);
        assert_eq!(sources[0].module_path, "interop::math");
        assert_eq!(sources[1].module_path, "interop");
    }
}
