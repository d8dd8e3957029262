use crate::engine::GpuContext;
use crate::error::{RenderError, gpu_scoped, scoped};
use crate::geometry::GeometryCache;
use crate::programs::{DEPTH_FORMAT, ShaderPrograms};
use crate::shadow::ShadowTarget;
use crate::texture::TextureRegistry;
use crate::uniforms::{FrameUniforms, ObjectUniforms, object_slot_stride, pack_objects};
use scenecore_common::TextureHandle;
use scenecore_render::{FramePlan, MeshKind, RenderConfig};
use std::num::NonZeroU64;

/// Most objects drawn in one frame; the rest are dropped with a warning.
pub const MAX_OBJECTS: usize = 4096;

/// Where the renderer is within a frame. Passes run in declaration order;
/// the skybox is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    ShadowPass,
    CameraPass,
    Skybox,
}

impl FramePhase {
    pub fn can_advance_to(self, next: FramePhase) -> bool {
        use FramePhase::*;
        matches!(
            (self, next),
            (Idle, ShadowPass)
                | (ShadowPass, CameraPass)
                | (CameraPass, Skybox)
                | (CameraPass, Idle)
                | (Skybox, Idle)
        )
    }

    fn advance(self, next: FramePhase) -> FramePhase {
        debug_assert!(
            self.can_advance_to(next),
            "bad frame phase transition {self:?} -> {next:?}"
        );
        tracing::trace!("frame phase {self:?} -> {next:?}");
        next
    }
}

/// Counts from one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub dropped: usize,
    pub skybox: bool,
}

struct DepthTarget {
    width: u32,
    height: u32,
    view: wgpu::TextureView,
}

/// Two-pass shadow-mapped renderer with an optional skybox.
pub struct WgpuRenderer {
    programs: ShaderPrograms,
    geometry: GeometryCache,
    shadow: ShadowTarget,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    depth: Option<DepthTarget>,
    clear_color: wgpu::Color,
    skybox: Option<TextureHandle>,
    frames: u64,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        config: &RenderConfig,
    ) -> Result<Self, RenderError> {
        let programs = ShaderPrograms::compile(device, surface_format)?;
        let geometry = GeometryCache::build(device, config.sphere_stacks, config.sphere_sectors)?;
        let shadow = ShadowTarget::new(device, &programs.layouts, config.shadow_resolution)?;

        let object_stride =
            object_slot_stride(device.limits().min_uniform_buffer_offset_alignment);
        let (frame_buffer, frame_bind_group, object_buffer, object_bind_group) =
            gpu_scoped(device, "uniform_buffers", || {
                let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("frame_uniform_buffer"),
                    size: std::mem::size_of::<FrameUniforms>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("frame_bind_group"),
                    layout: &programs.layouts.frame,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: frame_buffer.as_entire_binding(),
                    }],
                });
                let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("object_uniform_buffer"),
                    size: object_stride * MAX_OBJECTS as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("object_bind_group"),
                    layout: &programs.layouts.object,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &object_buffer,
                            offset: 0,
                            size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
                        }),
                    }],
                });
                (frame_buffer, frame_bind_group, object_buffer, object_bind_group)
            })?;

        let [r, g, b, a] = config.clear_color.map(f64::from);
        tracing::info!(
            "renderer ready: shadow map {}, object stride {object_stride}",
            shadow.resolution()
        );
        Ok(Self {
            programs,
            geometry,
            shadow,
            frame_buffer,
            frame_bind_group,
            object_buffer,
            object_bind_group,
            object_stride,
            depth: None,
            clear_color: wgpu::Color { r, g, b, a },
            skybox: None,
            frames: 0,
        })
    }

    pub fn programs(&self) -> &ShaderPrograms {
        &self.programs
    }

    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    pub fn shadow(&self) -> &ShadowTarget {
        &self.shadow
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn skybox(&self) -> Option<TextureHandle> {
        self.skybox
    }

    /// Select the skybox cubemap. The handle must name a loaded cubemap.
    pub fn set_skybox(
        &mut self,
        textures: &TextureRegistry,
        handle: TextureHandle,
    ) -> Result<(), RenderError> {
        textures.cube_bind_group(handle)?;
        self.skybox = Some(handle);
        Ok(())
    }

    pub fn clear_skybox(&mut self) {
        self.skybox = None;
    }

    /// Recreate the camera-pass depth buffer if the output size changed.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let (width, height) =
            depth_extent(width, height, device.limits().max_texture_dimension_2d)?;
        if matches!(&self.depth, Some(d) if d.width == width && d.height == height) {
            return Ok(());
        }
        let view = scoped(device, wgpu::ErrorFilter::Validation, || {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("camera_depth_texture"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: DEPTH_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        })
        .map_err(|log| RenderError::IncompleteRenderTarget {
            label: "camera_depth_texture".into(),
            log,
        })?;
        tracing::debug!("camera depth buffer {width}x{height}");
        self.depth = Some(DepthTarget {
            width,
            height,
            view,
        });
        Ok(())
    }

    /// Draw one frame into `target`, which must be `plan.width` by
    /// `plan.height` in the surface format the programs were compiled for.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        target: &wgpu::TextureView,
        textures: &TextureRegistry,
        plan: &FramePlan,
    ) -> Result<FrameStats, RenderError> {
        self.resize(&gpu.device, plan.width, plan.height)?;
        let Some(depth) = &self.depth else {
            return Ok(FrameStats::default());
        };

        gpu.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_plan(plan)),
        );

        let mut objects = Vec::with_capacity(plan.draws.len());
        let mut texture_groups = Vec::with_capacity(plan.draws.len());
        for item in &plan.draws {
            let (group, textured) = textures.flat_bind_group(item.texture);
            objects.push(ObjectUniforms::new(item, textured));
            texture_groups.push(group);
        }
        let (bytes, dropped) = pack_objects(&objects, self.object_stride, MAX_OBJECTS);
        if dropped > 0 {
            tracing::warn!("{dropped} objects over the {MAX_OBJECTS} limit were not drawn");
        }
        if !bytes.is_empty() {
            gpu.queue.write_buffer(&self.object_buffer, 0, &bytes);
        }
        let draws = &plan.draws[..plan.draws.len() - dropped];
        let offset = |i: usize| (i as u64 * self.object_stride) as u32;

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let mut phase = FramePhase::Idle.advance(FramePhase::ShadowPass);
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.shadow.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            let size = self.shadow.resolution() as f32;
            pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
            pass.set_pipeline(&self.programs.depth);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, item) in draws.iter().enumerate() {
                pass.set_bind_group(1, &self.object_bind_group, &[offset(i)]);
                self.geometry.get(item.mesh).draw(&mut pass);
            }
        }

        phase = phase.advance(FramePhase::CameraPass);
        let mut skybox_drawn = false;
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("camera_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_viewport(0.0, 0.0, plan.width as f32, plan.height as f32, 0.0, 1.0);
            pass.set_pipeline(&self.programs.lit);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(2, self.shadow.bind_group(), &[]);
            for (i, item) in draws.iter().enumerate() {
                pass.set_bind_group(1, &self.object_bind_group, &[offset(i)]);
                pass.set_bind_group(3, texture_groups[i], &[]);
                self.geometry.get(item.mesh).draw(&mut pass);
            }

            if let Some(handle) = self.skybox {
                match textures.cube_bind_group(handle) {
                    Ok(cube) => {
                        phase = phase.advance(FramePhase::Skybox);
                        pass.set_pipeline(&self.programs.skybox);
                        pass.set_bind_group(0, &self.frame_bind_group, &[]);
                        pass.set_bind_group(1, cube, &[]);
                        self.geometry.get(MeshKind::Box).draw(&mut pass);
                        skybox_drawn = true;
                    }
                    Err(err) => tracing::warn!("skybox skipped: {err}"),
                }
            }
        }
        phase.advance(FramePhase::Idle);

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.frames += 1;
        Ok(FrameStats {
            drawn: draws.len(),
            dropped,
            skybox: skybox_drawn,
        })
    }
}

/// Output extent for the camera depth buffer: at least 1x1, at most the
/// device's 2D texture limit.
fn depth_extent(width: u32, height: u32, max_dimension: u32) -> Result<(u32, u32), RenderError> {
    let (width, height) = (width.max(1), height.max(1));
    if width > max_dimension || height > max_dimension {
        return Err(RenderError::IncompleteRenderTarget {
            label: "camera_depth_texture".into(),
            log: format!("{width}x{height} exceeds the device limit of {max_dimension}"),
        });
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_extent_clamps_empty_output() {
        assert_eq!(depth_extent(0, 0, 8192).unwrap(), (1, 1));
        assert_eq!(depth_extent(1280, 720, 8192).unwrap(), (1280, 720));
    }

    #[test]
    fn depth_extent_over_device_limit_is_incomplete() {
        assert!(matches!(
            depth_extent(9000, 720, 8192),
            Err(RenderError::IncompleteRenderTarget { .. })
        ));
    }

    #[test]
    fn phases_run_in_order() {
        use FramePhase::*;
        assert!(Idle.can_advance_to(ShadowPass));
        assert!(ShadowPass.can_advance_to(CameraPass));
        assert!(CameraPass.can_advance_to(Skybox));
        assert!(Skybox.can_advance_to(Idle));
    }

    #[test]
    fn skybox_is_optional() {
        assert!(FramePhase::CameraPass.can_advance_to(FramePhase::Idle));
    }

    #[test]
    fn phases_cannot_be_skipped_or_reversed() {
        use FramePhase::*;
        assert!(!Idle.can_advance_to(CameraPass));
        assert!(!Idle.can_advance_to(Skybox));
        assert!(!ShadowPass.can_advance_to(Skybox));
        assert!(!CameraPass.can_advance_to(ShadowPass));
        assert!(!Skybox.can_advance_to(CameraPass));
        assert!(!ShadowPass.can_advance_to(Idle));
    }
}
