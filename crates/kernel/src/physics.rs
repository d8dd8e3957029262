use crate::entity::Entity;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Simulation constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Vertical acceleration in units/s².
    pub gravity: f32,
    /// Height of the static floor plane.
    pub floor_y: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            floor_y: 0.0,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn of(entity: &Entity) -> Self {
        Self::from_center_size(entity.position, entity.size)
    }

    /// Touching faces count as overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x >= other.min.x
            && self.min.x <= other.max.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
            && self.max.z >= other.min.z
            && self.min.z <= other.max.z
    }
}

/// AABB overlap between two entities. Symmetric in its arguments.
pub fn is_colliding(a: &Entity, b: &Entity) -> bool {
    Aabb::of(a).overlaps(&Aabb::of(b))
}

/// One explicit Euler step with the floor clamp. No-op for static entities.
pub fn integrate(entity: &mut Entity, config: &SimConfig, dt: f32) {
    if !entity.has_physics {
        return;
    }
    entity.velocity.y += config.gravity * dt;
    entity.position += entity.velocity * dt;

    let rest_y = config.floor_y + entity.size.y * 0.5;
    if entity.position.y < rest_y {
        entity.position.y = rest_y;
        entity.velocity.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecore_common::ObjectType;

    fn cube_at(x: f32) -> Entity {
        Entity::new(ObjectType::Box).with_position(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn overlapping_boxes_collide() {
        assert!(is_colliding(&cube_at(0.0), &cube_at(0.5)));
        assert!(!is_colliding(&cube_at(0.0), &cube_at(2.0)));
    }

    #[test]
    fn touching_faces_collide() {
        assert!(is_colliding(&cube_at(0.0), &cube_at(1.0)));
        assert!(!is_colliding(&cube_at(0.0), &cube_at(1.0001)));
    }

    #[test]
    fn collision_is_symmetric() {
        let samples = [
            cube_at(0.0),
            cube_at(0.5),
            cube_at(2.0),
            Entity::new(ObjectType::Trigger)
                .with_position(Vec3::new(1.0, 1.0, 0.0))
                .with_size(Vec3::new(3.0, 0.5, 1.0)),
            Entity::new(ObjectType::Sphere)
                .with_position(Vec3::new(-0.4, 0.2, 0.3))
                .with_size(Vec3::ZERO),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(is_colliding(a, b), is_colliding(b, a));
            }
        }
    }

    #[test]
    fn separated_on_one_axis_is_enough() {
        let a = cube_at(0.0);
        let b = Entity::new(ObjectType::Box).with_position(Vec3::new(0.0, 0.0, 5.0));
        assert!(!is_colliding(&a, &b));
    }

    #[test]
    fn static_entities_do_not_move() {
        let mut e = cube_at(0.0).with_position(Vec3::new(0.0, 10.0, 0.0));
        integrate(&mut e, &SimConfig::default(), 0.1);
        assert_eq!(e.position.y, 10.0);
    }

    #[test]
    fn gravity_accelerates_downward() {
        let config = SimConfig::default();
        let mut e = Entity::new(ObjectType::Box)
            .with_position(Vec3::new(0.0, 10.0, 0.0))
            .with_physics(Vec3::ZERO);
        integrate(&mut e, &config, 0.1);
        assert!((e.velocity.y - (-0.981)).abs() < 1e-5);
        assert!((e.position.y - (10.0 - 0.0981)).abs() < 1e-5);
    }

    #[test]
    fn horizontal_velocity_is_kept() {
        let mut e = Entity::new(ObjectType::Box)
            .with_position(Vec3::new(0.0, 0.5, 0.0))
            .with_physics(Vec3::new(2.0, 0.0, -1.0));
        integrate(&mut e, &SimConfig::default(), 0.5);
        assert_eq!(e.position.x, 1.0);
        assert_eq!(e.position.z, -0.5);
        assert_eq!(e.velocity.x, 2.0);
    }

    #[test]
    fn large_step_cannot_tunnel_below_floor() {
        let config = SimConfig {
            gravity: -9.81,
            floor_y: -2.0,
        };
        let mut e = Entity::new(ObjectType::Sphere)
            .with_position(Vec3::new(0.0, 3.0, 0.0))
            .with_size(Vec3::splat(2.0))
            .with_physics(Vec3::new(0.0, -100.0, 0.0));
        integrate(&mut e, &config, 1.0);
        assert_eq!(e.position.y, -1.0);
        assert_eq!(e.velocity.y, 0.0);
    }

    #[test]
    fn config_fields_default_when_missing() {
        let config: SimConfig = serde_json::from_str(r#"{ "floor_y": 3.0 }"#).unwrap();
        assert_eq!(config.floor_y, 3.0);
        assert_eq!(config.gravity, -9.81);
    }
}
