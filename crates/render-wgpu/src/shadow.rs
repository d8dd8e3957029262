use crate::error::{RenderError, scoped};
use crate::programs::{BindLayouts, DEPTH_FORMAT};

/// Square depth texture rendered from the light and sampled by the lit pass.
pub struct ShadowTarget {
    resolution: u32,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

impl ShadowTarget {
    pub fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        let max = device.limits().max_texture_dimension_2d;
        if resolution == 0 || resolution > max {
            return Err(RenderError::IncompleteRenderTarget {
                label: "shadow_map".into(),
                log: format!("resolution {resolution} outside 1..={max}"),
            });
        }

        let address_mode = border_address_mode(device.features());
        let (view, bind_group) = scoped(device, wgpu::ErrorFilter::Validation, || {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("shadow_map"),
                size: wgpu::Extent3d {
                    width: resolution,
                    height: resolution,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&Default::default());
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("shadow_sampler"),
                address_mode_u: address_mode,
                address_mode_v: address_mode,
                address_mode_w: address_mode,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::FilterMode::Nearest,
                compare: Some(wgpu::CompareFunction::LessEqual),
                border_color: (address_mode == wgpu::AddressMode::ClampToBorder)
                    .then_some(wgpu::SamplerBorderColor::OpaqueWhite),
                ..Default::default()
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("shadow_bind_group"),
                layout: &layouts.shadow,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });
            (view, bind_group)
        })
        .map_err(|log| RenderError::IncompleteRenderTarget {
            label: "shadow_map".into(),
            log,
        })?;

        tracing::debug!("shadow target {resolution}x{resolution} ({address_mode:?})");
        Ok(Self {
            resolution,
            view,
            bind_group,
        })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Depth attachment for the shadow pass.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Group 2 of the lit pipeline.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Outside the map reads as "lit": a white border where supported, otherwise
/// edge clamping backed by the shader's frustum test.
pub(crate) fn border_address_mode(features: wgpu::Features) -> wgpu::AddressMode {
    if features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER) {
        wgpu::AddressMode::ClampToBorder
    } else {
        wgpu::AddressMode::ClampToEdge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_mode_depends_on_feature() {
        assert_eq!(
            border_address_mode(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER),
            wgpu::AddressMode::ClampToBorder
        );
        assert_eq!(
            border_address_mode(wgpu::Features::empty()),
            wgpu::AddressMode::ClampToEdge
        );
    }
}
