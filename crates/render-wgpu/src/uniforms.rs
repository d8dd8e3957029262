use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use scenecore_render::{DrawItem, FramePlan};

/// Per-frame uniforms, bound at group 0 by every pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_space: [[f32; 4]; 4],
    skybox_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_pos: [f32; 4],
}

impl FrameUniforms {
    pub(crate) fn from_plan(plan: &FramePlan) -> Self {
        Self {
            view_proj: plan.view_projection.to_cols_array_2d(),
            light_space: plan.light_space.to_cols_array_2d(),
            skybox_view_proj: plan.skybox_view_projection.to_cols_array_2d(),
            camera_pos: plan.camera_position.extend(1.0).to_array(),
            light_pos: plan.light_position.extend(1.0).to_array(),
        }
    }
}

/// Per-object uniforms, one dynamic-offset slot per draw.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ObjectUniforms {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
    /// x: 1.0 when the draw samples a texture.
    params: [f32; 4],
}

impl ObjectUniforms {
    pub(crate) fn new(item: &DrawItem, textured: bool) -> Self {
        Self {
            model: item.model.to_cols_array_2d(),
            normal: Mat4::from_mat3(item.normal_matrix).to_cols_array_2d(),
            color: item.color.extend(1.0).to_array(),
            params: [if textured { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

/// Distance between object slots: the uniform size rounded up to the
/// device's dynamic offset alignment.
pub(crate) fn object_slot_stride(alignment: u32) -> u64 {
    let size = std::mem::size_of::<ObjectUniforms>() as u64;
    let alignment = u64::from(alignment.max(1));
    size.div_ceil(alignment) * alignment
}

/// Lay out object uniforms at `stride` intervals. Entries past `capacity`
/// are dropped; the second value is how many.
pub(crate) fn pack_objects(
    objects: &[ObjectUniforms],
    stride: u64,
    capacity: usize,
) -> (Vec<u8>, usize) {
    let kept = objects.len().min(capacity);
    let mut bytes = vec![0u8; kept * stride as usize];
    for (i, object) in objects.iter().take(kept).enumerate() {
        let start = i * stride as usize;
        let src = bytemuck::bytes_of(object);
        bytes[start..start + src.len()].copy_from_slice(src);
    }
    (bytes, objects.len() - kept)
}
