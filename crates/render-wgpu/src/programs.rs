use crate::error::{RenderError, scoped};
use crate::geometry::vertex_layout;
use crate::shaders;
use crate::uniforms::{FrameUniforms, ObjectUniforms};
use std::num::NonZeroU64;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Bind group layouts shared by the pipelines and the resources bound to them.
pub struct BindLayouts {
    /// Group 0: frame uniforms.
    pub frame: wgpu::BindGroupLayout,
    /// Group 1: per-object uniforms, dynamic offset.
    pub object: wgpu::BindGroupLayout,
    /// Group 2 of the lit pipeline: shadow depth texture and comparison sampler.
    pub shadow: wgpu::BindGroupLayout,
    /// Group 3 of the lit pipeline: albedo texture and sampler.
    pub texture: wgpu::BindGroupLayout,
    /// Group 1 of the skybox pipeline: cube texture and sampler.
    pub cube: wgpu::BindGroupLayout,
}

impl BindLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |dynamic: bool, size: usize| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: NonZeroU64::new(size as u64),
            },
            count: None,
        };
        let sampled = |view_dimension: wgpu::TextureViewDimension,
                       sample_type: wgpu::TextureSampleType,
                       sampler_type: wgpu::SamplerBindingType| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type,
                        view_dimension,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(sampler_type),
                    count: None,
                },
            ]
        };

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(false, std::mem::size_of::<FrameUniforms>())],
        });
        let object = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[uniform_entry(true, std::mem::size_of::<ObjectUniforms>())],
        });
        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &sampled(
                wgpu::TextureViewDimension::D2,
                wgpu::TextureSampleType::Depth,
                wgpu::SamplerBindingType::Comparison,
            ),
        });
        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &sampled(
                wgpu::TextureViewDimension::D2,
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::SamplerBindingType::Filtering,
            ),
        });
        let cube = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cube_bind_group_layout"),
            entries: &sampled(
                wgpu::TextureViewDimension::Cube,
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::SamplerBindingType::Filtering,
            ),
        });

        Self {
            frame,
            object,
            shadow,
            texture,
            cube,
        }
    }
}

/// The depth, lit and skybox pipelines.
pub struct ShaderPrograms {
    pub layouts: BindLayouts,
    pub depth: wgpu::RenderPipeline,
    pub lit: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
}

impl ShaderPrograms {
    /// Compile every program. The first failure is returned with the
    /// device's diagnostic text.
    pub fn compile(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let layouts = BindLayouts::new(device);

        let depth = compile_program(device, "depth", || {
            build_depth_pipeline(device, &layouts)
        })?;
        let lit = compile_program(device, "lit", || {
            build_lit_pipeline(device, &layouts, surface_format)
        })?;
        let skybox = compile_program(device, "skybox", || {
            build_skybox_pipeline(device, &layouts, surface_format)
        })?;

        tracing::info!("shader programs compiled for {surface_format:?}");
        Ok(Self {
            layouts,
            depth,
            lit,
            skybox,
        })
    }
}

fn compile_program(
    device: &wgpu::Device,
    label: &str,
    build: impl FnOnce() -> wgpu::RenderPipeline,
) -> Result<wgpu::RenderPipeline, RenderError> {
    scoped(device, wgpu::ErrorFilter::Validation, build).map_err(|log| {
        tracing::error!("shader program '{label}' failed: {log}");
        RenderError::ShaderCompile {
            label: label.to_string(),
            log,
        }
    })
}

fn shader_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

fn color_target(format: wgpu::TextureFormat) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

fn build_depth_pipeline(device: &wgpu::Device, layouts: &BindLayouts) -> wgpu::RenderPipeline {
    let module = shader_module(device, "depth_shader", shaders::DEPTH_SHADER);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("depth_pipeline_layout"),
        bind_group_layouts: &[&layouts.frame, &layouts.object],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("depth_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_depth"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            // Back faces write the depth; limits shadow acne.
            cull_mode: Some(wgpu::Face::Front),
            ..Default::default()
        },
        depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn build_lit_pipeline(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = shader_module(device, "lit_shader", shaders::LIT_SHADER);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("lit_pipeline_layout"),
        bind_group_layouts: &[
            &layouts.frame,
            &layouts.object,
            &layouts.shadow,
            &layouts.texture,
        ],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("lit_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &color_target(surface_format),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn build_skybox_pipeline(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = shader_module(device, "skybox_shader", shaders::SKYBOX_SHADER);
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("skybox_pipeline_layout"),
        bind_group_layouts: &[&layouts.frame, &layouts.cube],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("skybox_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_sky"),
            compilation_options: Default::default(),
            buffers: &[vertex_layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_sky"),
            compilation_options: Default::default(),
            targets: &color_target(surface_format),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        // Far-plane fragments must pass against a cleared depth of 1.0.
        depth_stencil: Some(depth_state(false, wgpu::CompareFunction::LessEqual)),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
