use crate::camera::{CameraRig, LightRig};
use crate::mesh::{MeshKind, mesh_kind_for};
use glam::{Mat3, Mat4, Quat, Vec3};
use scenecore_common::{EntityId, ObjectType, TextureHandle};
use scenecore_kernel::{Entity, Scene};

/// Object-to-world transform: scale, then rotate about Y, then translate.
///
/// Column-vector form of the row-vector composition
/// `scale(size) * rotateY(angle) * translate(position)`.
pub fn model_matrix(entity: &Entity) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        entity.size,
        Quat::from_rotation_y(entity.rotation_y.to_radians()),
        entity.position,
    )
}

/// Inverse-transpose of the model's upper 3x3, for transforming normals.
/// A collapsed axis (zero size) yields identity instead of NaNs.
pub fn normal_matrix(model: &Mat4) -> Mat3 {
    let m = Mat3::from_mat4(*model);
    if m.determinant().abs() <= 1e-12 {
        return Mat3::IDENTITY;
    }
    m.inverse().transpose()
}

/// Rotation-only view for the skybox, which must appear infinitely far away.
pub fn skybox_view(view: &Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(*view))
}

/// One mesh draw, shared by the shadow and camera passes.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub id: EntityId,
    pub object_type: ObjectType,
    pub mesh: MeshKind,
    pub model: Mat4,
    pub normal_matrix: Mat3,
    pub color: Vec3,
    pub texture: Option<TextureHandle>,
}

/// Everything a backend needs to draw one frame, derived from the scene
/// without mutating it.
#[derive(Debug, Clone)]
pub struct FramePlan {
    /// Output size, each clamped to at least one pixel.
    pub width: u32,
    pub height: u32,
    pub light_space: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub skybox_view_projection: Mat4,
    pub camera_position: Vec3,
    pub light_position: Vec3,
    /// Drawable entities in scene order.
    pub draws: Vec<DrawItem>,
    /// Entities whose type has no mesh.
    pub skipped: Vec<EntityId>,
}

impl FramePlan {
    pub fn build(
        scene: &Scene,
        camera: &CameraRig,
        light: &LightRig,
        width: u32,
        height: u32,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(width, height);

        let mut draws = Vec::with_capacity(scene.entity_count());
        let mut skipped = Vec::new();
        for entity in scene.entities() {
            let Some(mesh) = mesh_kind_for(entity.object_type) else {
                skipped.push(entity.id);
                continue;
            };
            let model = model_matrix(entity);
            draws.push(DrawItem {
                id: entity.id,
                object_type: entity.object_type,
                mesh,
                model,
                normal_matrix: normal_matrix(&model),
                color: entity.color,
                texture: entity.texture,
            });
        }

        Self {
            width,
            height,
            light_space: light.light_space(),
            view,
            projection,
            view_projection: projection * view,
            skybox_view_projection: projection * skybox_view(&view),
            camera_position: camera.position,
            light_position: light.position,
            draws,
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::box_mesh;
    use scenecore_kernel::Aabb;

    fn world_bounds(model: &Mat4) -> (Vec3, Vec3) {
        let (lo, hi) = box_mesh().bounds();
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for corner in [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ] {
            let p = model.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    #[test]
    fn model_matrix_agrees_with_collision_bounds() {
        let entity = Entity::new(ObjectType::Box)
            .with_position(Vec3::new(3.0, 1.5, -2.0))
            .with_size(Vec3::new(2.0, 3.0, 0.5));
        let (min, max) = world_bounds(&model_matrix(&entity));
        let aabb = Aabb::of(&entity);
        assert!((min - aabb.min).abs().max_element() < 1e-6);
        assert!((max - aabb.max).abs().max_element() < 1e-6);
    }

    #[test]
    fn rotation_is_about_y_in_degrees() {
        let entity = Entity::new(ObjectType::Box)
            .with_size(Vec3::new(4.0, 1.0, 1.0))
            .with_rotation_y(90.0);
        let (min, max) = world_bounds(&model_matrix(&entity));
        assert!((max.z - 2.0).abs() < 1e-5);
        assert!((max.x - 0.5).abs() < 1e-5);
        assert!((min.y + 0.5).abs() < 1e-5);
    }

    #[test]
    fn scale_applies_before_translation() {
        let entity = Entity::new(ObjectType::Box)
            .with_position(Vec3::new(10.0, 0.0, 0.0))
            .with_size(Vec3::splat(2.0));
        let p = model_matrix(&entity).transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(p, Vec3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let entity = Entity::new(ObjectType::Box).with_size(Vec3::new(4.0, 1.0, 1.0));
        let n = normal_matrix(&model_matrix(&entity)) * Vec3::new(1.0, 1.0, 0.0);
        // A 45° slope stretched along X gets a steeper normal.
        assert!(n.y > n.x);
    }

    #[test]
    fn flat_entity_has_identity_normal_matrix() {
        let entity = Entity::new(ObjectType::Triangle).with_size(Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(normal_matrix(&model_matrix(&entity)), Mat3::IDENTITY);
    }

    #[test]
    fn skybox_view_drops_translation() {
        let cam = CameraRig::default();
        let view = cam.view_matrix();
        let sky = skybox_view(&view);
        assert_eq!(sky.w_axis, glam::Vec4::W);
        let dir = Vec3::new(0.3, -0.2, 0.9);
        assert!((sky.transform_vector3(dir) - view.transform_vector3(dir)).length() < 1e-6);
    }

    #[test]
    fn plan_skips_entities_without_mesh() {
        let mut scene = Scene::new();
        let cube = scene.add_object(Entity::new(ObjectType::Box));
        let spawn = scene.add_object(Entity::new(ObjectType::PlayerSpawn));
        let trigger = scene.add_object(Entity::trigger("Death"));
        let ball = scene.add_object(Entity::new(ObjectType::Sphere));
        let circle = scene.add_object(Entity::new(ObjectType::Circle));

        let plan = FramePlan::build(&scene, &CameraRig::default(), &LightRig::default(), 640, 480);
        let drawn: Vec<EntityId> = plan.draws.iter().map(|d| d.id).collect();
        assert_eq!(drawn, vec![cube, ball]);
        assert_eq!(plan.skipped, vec![spawn, trigger, circle]);
        assert_eq!(plan.draws[1].mesh, MeshKind::Sphere);
    }

    #[test]
    fn plan_clamps_zero_size_output() {
        let scene = Scene::new();
        let plan = FramePlan::build(&scene, &CameraRig::default(), &LightRig::default(), 0, 0);
        assert_eq!((plan.width, plan.height), (1, 1));
        assert!(plan.view_projection.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn plan_carries_color_and_texture() {
        let mut scene = Scene::new();
        scene.add_object(
            Entity::new(ObjectType::Triangle)
                .with_color(Vec3::new(0.2, 0.4, 0.6))
                .with_texture(TextureHandle(3)),
        );
        let plan = FramePlan::build(&scene, &CameraRig::default(), &LightRig::default(), 10, 10);
        assert_eq!(plan.draws[0].color, Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(plan.draws[0].texture, Some(TextureHandle(3)));
    }
}
