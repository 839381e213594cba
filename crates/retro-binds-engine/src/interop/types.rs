//! Value types shared with the engine.

use retro_binds_macros::Blittable;

#[derive(Debug, Clone, Copy, PartialEq, Blittable)]
#[repr(C)]
#[blittable(name = "retro::Color", module = "retro.core")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// 2D placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Blittable)]
#[repr(C)]
#[blittable(name = "retro::Transform", module = "retro.core")]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Blittable)]
#[repr(C)]
#[blittable(name = "retro::EntityId", module = "retro.entity")]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub const INVALID: EntityId = EntityId {
        index: u32::MAX,
        generation: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Blittable)]
#[repr(u8)]
#[blittable(name = "retro::LogLevel", module = "retro.logging")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
