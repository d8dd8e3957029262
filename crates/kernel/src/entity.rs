use glam::Vec3;
use scenecore_common::{EntityId, ObjectType, TextureHandle};

/// Color forced onto an entity that touches a `"Death"` trigger.
pub const DEATH_COLOR: Vec3 = Vec3::new(0.8, 0.0, 0.0);

/// Trigger tag that paints overlapping entities with [`DEATH_COLOR`].
pub const DEATH_TRIGGER: &str = "Death";

/// One placed object in the scene.
///
/// `size` is the full extent on each axis; bounds use half of it. Trigger
/// listeners are not stored here, they live in the scene's registry keyed
/// by [`EntityId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub object_type: ObjectType,
    pub position: Vec3,
    pub size: Vec3,
    /// Y-axis rotation in degrees.
    pub rotation_y: f32,
    pub color: Vec3,
    pub has_physics: bool,
    pub velocity: Vec3,
    pub trigger_type: String,
    pub texture: Option<TextureHandle>,
    pub selected: bool,
}

impl Entity {
    /// A unit-sized, white, static entity at the origin.
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            id: EntityId::new(),
            object_type,
            position: Vec3::ZERO,
            size: Vec3::ONE,
            rotation_y: 0.0,
            color: Vec3::ONE,
            has_physics: false,
            velocity: Vec3::ZERO,
            trigger_type: String::new(),
            texture: None,
            selected: false,
        }
    }

    /// A trigger volume carrying the given tag.
    pub fn trigger(trigger_type: impl Into<String>) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            ..Self::new(ObjectType::Trigger)
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Negative components are clamped to zero.
    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size.max(Vec3::ZERO);
        self
    }

    pub fn with_rotation_y(mut self, degrees: f32) -> Self {
        self.rotation_y = degrees;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn with_physics(mut self, velocity: Vec3) -> Self {
        self.has_physics = true;
        self.velocity = velocity;
        self
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn is_trigger(&self) -> bool {
        self.object_type.is_trigger()
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Whether this is a trigger whose tag is `"Death"`, ignoring case.
    pub fn is_death_trigger(&self) -> bool {
        self.is_trigger() && self.trigger_type.eq_ignore_ascii_case(DEATH_TRIGGER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let e = Entity::new(ObjectType::Box);
        assert_eq!(e.size, Vec3::ONE);
        assert!(!e.has_physics);
        assert!(e.texture.is_none());
        assert!(!e.is_trigger());
    }

    #[test]
    fn negative_size_is_clamped() {
        let e = Entity::new(ObjectType::Box).with_size(Vec3::new(-1.0, 2.0, -0.5));
        assert_eq!(e.size, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn death_tag_ignores_case() {
        assert!(Entity::trigger("death").is_death_trigger());
        assert!(Entity::trigger("DEATH").is_death_trigger());
        assert!(!Entity::trigger("Checkpoint").is_death_trigger());

        // Only trigger entities can be death triggers.
        let mut not_trigger = Entity::new(ObjectType::Box);
        not_trigger.trigger_type = "Death".into();
        assert!(!not_trigger.is_death_trigger());
    }
}
