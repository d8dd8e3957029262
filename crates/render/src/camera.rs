use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Viewer camera: perspective projection looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 16.0),
            target: Vec3::ZERO,
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraRig {
    /// Width over height, with both clamped to at least one pixel.
    pub fn aspect(width: u32, height: u32) -> f32 {
        width.max(1) as f32 / height.max(1) as f32
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.target)
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            Self::aspect(width, height),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        self.projection_matrix(width, height) * self.view_matrix()
    }
}

/// The single shadow-casting light. Lit like a point for shading, projected
/// orthographically for the shadow map like a directional light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightRig {
    pub position: Vec3,
    pub target: Vec3,
    /// Half width and height of the orthographic shadow volume.
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(8.0, 16.0, 8.0),
            target: Vec3::ZERO,
            half_extent: 20.0,
            near: 1.0,
            far: 50.0,
        }
    }
}

impl LightRig {
    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.position, self.target)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let e = self.half_extent;
        Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far)
    }

    /// World space to the light's clip space.
    pub fn light_space(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Right-handed look-at with +Y up. Falls back to +Z up when looking
/// straight along Y, where +Y would make the basis degenerate.
fn look_at(eye: Vec3, target: Vec3) -> Mat4 {
    let dir = (target - eye).normalize_or_zero();
    let up = if dir.cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_at_rh(eye, target, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_finite(m: &Mat4) -> bool {
        m.to_cols_array().iter().all(|v| v.is_finite())
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        assert_eq!(CameraRig::aspect(800, 0), 800.0);
        assert_eq!(CameraRig::aspect(0, 0), 1.0);
        let cam = CameraRig::default();
        assert!(is_finite(&cam.projection_matrix(1280, 0)));
    }

    #[test]
    fn target_projects_to_screen_center() {
        let cam = CameraRig::default();
        let clip = cam.view_projection(1280, 720) * cam.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn light_space_keeps_origin_inside_shadow_volume() {
        let light = LightRig::default();
        let p = light.light_space() * Vec3::ZERO.extend(1.0);
        assert_eq!(p.w, 1.0);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn light_straight_above_is_not_degenerate() {
        let light = LightRig {
            position: Vec3::new(0.0, 20.0, 0.0),
            ..LightRig::default()
        };
        assert!(is_finite(&light.light_space()));
    }

    #[test]
    fn closer_to_light_means_smaller_depth() {
        let light = LightRig::default();
        let toward_light = light.position.normalize() * 5.0;
        let near = light.light_space() * toward_light.extend(1.0);
        let far = light.light_space() * (-toward_light).extend(1.0);
        assert!(near.z < far.z);
    }
}
