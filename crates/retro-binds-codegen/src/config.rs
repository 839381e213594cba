//! Generator configuration, loaded from `retro-binds.toml`.

use std::path::Path;

use retro_binds_core::{ReturnSlotPolicy, TargetLayout};
use serde::{Deserialize, Serialize};

use crate::GenerateError;

/// Default file name looked up next to the crate being generated for.
pub const CONFIG_FILE_NAME: &str = "retro-binds.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Native module interface every fragment belongs to.
    pub module_name: String,

    /// Prefix for module partition names (`prefix.entity_exporter`).
    pub fragment_prefix: Option<String>,

    /// Native namespace of the registration function. Type names in this
    /// namespace are written unqualified inside it.
    pub generated_namespace: String,

    /// Path of the runtime crate as seen from generated managed code.
    pub runtime_path: String,

    /// Path prefix under which scanned module paths are reachable from the
    /// generated managed code.
    pub crate_path: String,

    /// Count the return slot towards the parameter-block size.
    pub include_return_slot: bool,

    /// Pointer width of the target, in bytes.
    pub pointer_width: usize,

    /// Alignment of `i64`/`u64`/`f64` on the target, in bytes.
    pub wide_scalar_align: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_name: "retro.scripting".to_string(),
            fragment_prefix: None,
            generated_namespace: "retro".to_string(),
            runtime_path: "::retro_binds_runtime".to_string(),
            crate_path: "crate".to_string(),
            include_return_slot: false,
            pointer_width: 8,
            wide_scalar_align: 8,
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, GenerateError> {
        let config: GeneratorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, GenerateError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded generator config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn return_slot_policy(&self) -> ReturnSlotPolicy {
        if self.include_return_slot {
            ReturnSlotPolicy::Included
        } else {
            ReturnSlotPolicy::Excluded
        }
    }

    pub fn target(&self) -> TargetLayout {
        TargetLayout {
            pointer_size: self.pointer_width,
            wide_align: self.wide_scalar_align,
        }
    }

    /// Adopt the layout of a cargo target, as described by the
    /// `CARGO_CFG_TARGET_*` values a build script receives.
    pub fn set_cargo_target(&mut self, pointer_width_bits: usize, arch: &str, os: &str) {
        self.pointer_width = pointer_width_bits / 8;
        self.wide_scalar_align = if arch == "x86" && os != "windows" { 4 } else { 8 };
    }

    /// Partition name of an exporter fragment.
    pub fn fragment_name(&self, snake: &str) -> String {
        match &self.fragment_prefix {
            Some(prefix) => format!("{prefix}.{snake}"),
            None => snake.to_string(),
        }
    }

    fn validate(&self) -> Result<(), GenerateError> {
        if !matches!(self.pointer_width, 4 | 8) {
            return Err(GenerateError::Config(format!(
                "pointer_width must be 4 or 8, got {}",
                self.pointer_width
            )));
        }
        if !matches!(self.wide_scalar_align, 4 | 8) {
            return Err(GenerateError::Config(format!(
                "wide_scalar_align must be 4 or 8, got {}",
                self.wide_scalar_align
            )));
        }
        if self.module_name.is_empty() {
            return Err(GenerateError::Config("module_name must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_layout() {
        let config = GeneratorConfig::default();
        assert_eq!(config.module_name, "retro.scripting");
        assert_eq!(config.generated_namespace, "retro");
        assert_eq!(config.return_slot_policy(), ReturnSlotPolicy::Excluded);
        assert_eq!(config.target().pointer_size, 8);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            module_name = "retro.interop"
            fragment_prefix = "binds"
            include_return_slot = true
            "#,
        )
        .unwrap();
        assert_eq!(config.module_name, "retro.interop");
        assert_eq!(config.generated_namespace, "retro");
        assert_eq!(config.fragment_name("math_module"), "binds.math_module");
        assert_eq!(config.return_slot_policy(), ReturnSlotPolicy::Included);
    }

    #[test]
    fn unknown_keys_and_bad_widths_fail() {
        assert!(GeneratorConfig::from_toml_str("modul_name = \"x\"").is_err());
        assert!(matches!(
            GeneratorConfig::from_toml_str("pointer_width = 2"),
            Err(GenerateError::Config(_))
        ));
    }

    #[test]
    fn cargo_targets_select_wide_alignment() {
        let mut config = GeneratorConfig::default();
        config.set_cargo_target(32, "x86", "linux");
        assert_eq!(config.target(), TargetLayout { pointer_size: 4, wide_align: 4 });

        config.set_cargo_target(32, "x86", "windows");
        assert_eq!(config.target().wide_align, 8);

        config.set_cargo_target(64, "x86_64", "linux");
        assert_eq!(config.target(), TargetLayout::default());

        assert!(matches!(
            GeneratorConfig::from_toml_str("wide_scalar_align = 2"),
            Err(GenerateError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::load_or_default(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }
}
