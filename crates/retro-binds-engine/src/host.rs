//! Rust stand-in for the native engine.
//!
//! Implements every export declared under [`crate::interop`] as a plain
//! `extern "C"` function and registers it with the parameter-block size of
//! its own signature. Sizes are computed here from the host's signatures, not
//! read from the generated stubs, the same way the C++ registration unit
//! spells them as `sizeof` expressions.

use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use retro_binds_runtime::host::decode_utf16;
use retro_binds_runtime::{BindError, ExportTable, ExportedFunction};

use crate::interop::types::{Color, EntityId, LogLevel, Transform};

const PTR: usize = size_of::<*const c_void>();

fn addr(f: *const ()) -> *const c_void {
    f.cast()
}

/// Build the export table of every stand-in function.
pub fn export_table() -> Result<ExportTable, Vec<BindError>> {
    let mut builder = ExportTable::builder();
    builder
        .module(
            "MathModule",
            &[
                ExportedFunction::new("Add", addr(math_add as *const ()), 2 * size_of::<i32>()),
                ExportedFunction::new("Lerp", addr(math_lerp as *const ()), 3 * size_of::<f32>()),
                ExportedFunction::new("Sum", addr(math_sum as *const ()), PTR + size_of::<i32>()),
            ],
        )
        .module(
            "EntityExporter",
            &[
                ExportedFunction::new(
                    "Spawn",
                    addr(entity_spawn as *const ()),
                    size_of::<Transform>(),
                ),
                ExportedFunction::new(
                    "Despawn",
                    addr(entity_despawn as *const ()),
                    size_of::<EntityId>(),
                ),
                ExportedFunction::new(
                    "GetTransform",
                    addr(entity_get_transform as *const ()),
                    size_of::<EntityId>() + PTR,
                ),
                ExportedFunction::new(
                    "Translate",
                    addr(entity_translate as *const ()),
                    size_of::<EntityId>() + PTR,
                ),
                ExportedFunction::new(
                    "SetTint",
                    addr(entity_set_tint as *const ()),
                    size_of::<EntityId>() + size_of::<Color>(),
                ),
                ExportedFunction::new("Tint", addr(entity_tint as *const ()), size_of::<EntityId>()),
            ],
        )
        .module(
            "LogExporter",
            &[
                ExportedFunction::new(
                    "Write",
                    addr(log_write as *const ()),
                    size_of::<LogLevel>() + PTR + size_of::<i32>(),
                ),
                ExportedFunction::new(
                    "SetMinLevel",
                    addr(log_set_min_level as *const ()),
                    size_of::<LogLevel>(),
                ),
            ],
        );
    builder.build()
}

// Math

extern "C" fn math_add(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

extern "C" fn math_lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

unsafe extern "C" fn math_sum(values: *const i32, count: i32) -> i64 {
    let Ok(len) = usize::try_from(count) else {
        return 0;
    };
    if values.is_null() || len == 0 {
        return 0;
    }
    // SAFETY: the caller passes `count` readable values.
    let values = unsafe { std::slice::from_raw_parts(values, len) };
    values.iter().map(|&v| i64::from(v)).sum()
}

// Entities

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
    transform: Transform,
    tint: Color,
}

#[derive(Debug, Default)]
struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl World {
    fn spawn(&mut self, transform: Transform) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            slot.transform = transform;
            slot.tint = Color::WHITE;
            return EntityId {
                index,
                generation: slot.generation,
            };
        }

        let Ok(index) = u32::try_from(self.slots.len()) else {
            return EntityId::INVALID;
        };
        self.slots.push(Slot {
            generation: 0,
            alive: true,
            transform,
            tint: Color::WHITE,
        });
        EntityId {
            index,
            generation: 0,
        }
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.alive && slot.generation == id.generation)
    }

    fn despawn(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.get_mut(id) else {
            return false;
        };
        slot.alive = false;
        self.free.push(id.index);
        true
    }
}

static WORLD: Lazy<Mutex<World>> = Lazy::new(Mutex::default);

fn world() -> MutexGuard<'static, World> {
    WORLD.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Number of live entities.
pub fn entity_count() -> usize {
    world().slots.iter().filter(|s| s.alive).count()
}

extern "C" fn entity_spawn(transform: Transform) -> EntityId {
    world().spawn(transform)
}

extern "C" fn entity_despawn(entity: EntityId) -> bool {
    world().despawn(entity)
}

unsafe extern "C" fn entity_get_transform(entity: EntityId, out: *mut Transform) -> bool {
    if out.is_null() {
        return false;
    }
    let Some(transform) = world().get_mut(entity).map(|slot| slot.transform) else {
        return false;
    };
    // SAFETY: non-null and points at a caller-owned Transform.
    unsafe { out.write(transform) };
    true
}

unsafe extern "C" fn entity_translate(entity: EntityId, delta: *const Transform) {
    // SAFETY: null or a valid Transform borrowed for the call.
    let Some(delta) = (unsafe { delta.as_ref() }) else {
        return;
    };
    if let Some(slot) = world().get_mut(entity) {
        slot.transform.x += delta.x;
        slot.transform.y += delta.y;
        slot.transform.rotation += delta.rotation;
    }
}

extern "C" fn entity_set_tint(entity: EntityId, color: Color) {
    if let Some(slot) = world().get_mut(entity) {
        slot.tint = color;
    }
}

extern "C" fn entity_tint(entity: EntityId) -> Color {
    world()
        .get_mut(entity)
        .map_or(Color::rgba(0.0, 0.0, 0.0, 0.0), |slot| slot.tint)
}

// Logging

#[derive(Debug)]
struct LogSink {
    min_level: LogLevel,
    records: Vec<(LogLevel, String)>,
}

static LOG_SINK: Lazy<Mutex<LogSink>> = Lazy::new(|| {
    Mutex::new(LogSink {
        min_level: LogLevel::Info,
        records: Vec::new(),
    })
});

fn sink() -> MutexGuard<'static, LogSink> {
    LOG_SINK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drain the messages the engine log accepted so far.
pub fn take_log_records() -> Vec<(LogLevel, String)> {
    std::mem::take(&mut sink().records)
}

unsafe extern "C" fn log_write(level: LogLevel, text: *const u16, len: i32) {
    // SAFETY: the caller passes `len` UTF-16 code units at `text`.
    let Some(text) = (unsafe { decode_utf16(text, len) }) else {
        log::warn!("dropped engine log message with invalid UTF-16");
        return;
    };
    let mut sink = sink();
    if level < sink.min_level {
        return;
    }
    match level {
        LogLevel::Trace => log::trace!(target: "retro", "{text}"),
        LogLevel::Debug => log::debug!(target: "retro", "{text}"),
        LogLevel::Info => log::info!(target: "retro", "{text}"),
        LogLevel::Warn => log::warn!(target: "retro", "{text}"),
        LogLevel::Error => log::error!(target: "retro", "{text}"),
    }
    sink.records.push((level, text));
}

extern "C" fn log_set_min_level(level: LogLevel) {
    sink().min_level = level;
}
