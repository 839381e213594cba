use retro_binds_macros::bind_export;

use super::types::LogLevel;

/// Engine log sink, declared as plain C functions.
#[bind_export(namespace = "retro", kind = "record")]
pub trait LogExporter {
    fn write(&self, level: LogLevel, #[native(name = "char16_t")] text: *const u16, len: i32);

    fn set_min_level(&self, level: LogLevel);
}
