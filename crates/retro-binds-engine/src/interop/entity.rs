//! Entity access. Functions live in `retro::entity_exporter`, taking their
//! namespace from `Transform`'s native mapping.

use retro_binds_macros::bind_export;

use super::types::{Color, EntityId, Transform};

#[bind_export(kind = "class", subject = Transform)]
pub trait EntityExporter {
    fn spawn(&self, transform: Transform) -> EntityId;

    fn despawn(&self, entity: EntityId) -> bool;

    /// Writes the entity's transform into `out`; false for stale ids.
    fn get_transform(&self, entity: EntityId, out: &mut Transform) -> bool;

    fn translate(&self, entity: EntityId, #[native(is_const)] delta: &Transform);

    fn set_tint(&self, entity: EntityId, color: Color);

    fn tint(&self, entity: EntityId) -> Color;
}
