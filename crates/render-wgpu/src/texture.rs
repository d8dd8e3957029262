use crate::error::{RenderError, check_image, gpu_scoped};
use crate::programs::BindLayouts;
use scenecore_assets::{
    CUBEMAP_FACES, DecodedImage, ImageDecoder, ImageFileDecoder, load_cubemap_faces,
};
use scenecore_common::TextureHandle;
use std::path::Path;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Whether a texture is a flat 2D image or a six-face cubemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Flat,
    Cube,
}

struct TextureEntry {
    width: u32,
    height: u32,
    bind_group: wgpu::BindGroup,
}

/// GPU textures addressed by dense [`TextureHandle`]s, in load order.
///
/// Every upload runs inside an error scope; a texture the device rejects is
/// an error and never gets a handle.
pub struct TextureRegistry {
    /// Parallel to `entries`, indexed by handle.
    kinds: Vec<TextureKind>,
    entries: Vec<TextureEntry>,
    /// 1x1 white, bound for untextured draws.
    fallback: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    decoder: Box<dyn ImageDecoder>,
}

impl TextureRegistry {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
    ) -> Result<Self, RenderError> {
        Self::with_decoder(device, queue, layouts, Box::new(ImageFileDecoder))
    }

    pub fn with_decoder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        decoder: Box<dyn ImageDecoder>,
    ) -> Result<Self, RenderError> {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = DecodedImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        };
        let fallback = upload_flat(device, queue, layouts, &sampler, &white, "white_texture")?;
        Ok(Self {
            kinds: Vec::new(),
            entries: Vec::new(),
            fallback,
            sampler,
            decoder,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self, handle: TextureHandle) -> Option<TextureKind> {
        self.kinds.get(handle.0 as usize).copied()
    }

    /// Pixel size of a loaded texture. Cubemaps report one face.
    pub fn size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.entries
            .get(handle.0 as usize)
            .map(|e| (e.width, e.height))
    }

    /// Decode an image file and upload it as a flat texture.
    pub fn load_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        path: impl AsRef<Path>,
    ) -> Result<TextureHandle, RenderError> {
        let path = path.as_ref();
        let image = self.decoder.decode(path)?;
        let handle = self.insert_image(device, queue, layouts, &image)?;
        tracing::info!(
            "loaded texture {} ({}x{}) as {handle:?}",
            path.display(),
            image.width,
            image.height
        );
        Ok(handle)
    }

    /// Upload already-decoded pixels as a flat texture.
    pub fn insert_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        image: &DecodedImage,
    ) -> Result<TextureHandle, RenderError> {
        let handle = self.next_handle();
        let label = format!("texture_{}", handle.0);
        let bind_group = upload_flat(device, queue, layouts, &self.sampler, image, &label)?;
        self.push(
            TextureKind::Flat,
            TextureEntry {
                width: image.width,
                height: image.height,
                bind_group,
            },
        );
        Ok(handle)
    }

    /// Decode six faces (`+X, -X, +Y, -Y, +Z, -Z`) and upload a cubemap.
    pub fn load_cubemap<P: AsRef<Path>>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        paths: &[P],
    ) -> Result<TextureHandle, RenderError> {
        let cube = load_cubemap_faces(self.decoder.as_ref(), paths)?;
        let handle = self.next_handle();
        let label = format!("cubemap_{}", handle.0);
        let max_dimension = device.limits().max_texture_dimension_2d;
        for face in &cube.faces {
            check_image(&label, face.width, face.height, face.rgba.len(), max_dimension)?;
        }

        let bind_group = gpu_scoped(device, &label, || {
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width: cube.size,
                    height: cube.size,
                    depth_or_array_layers: CUBEMAP_FACES as u32,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            for (layer, face) in cube.faces.iter().enumerate() {
                write_layer(queue, &texture, face, layer as u32);
            }
            let view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("cubemap_view"),
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            });
            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("cubemap_sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            });
            sampled_bind_group(device, &layouts.cube, &view, &sampler, &label)
        })?;
        self.push(
            TextureKind::Cube,
            TextureEntry {
                width: cube.size,
                height: cube.size,
                bind_group,
            },
        );
        tracing::info!("loaded cubemap {}x{} as {handle:?}", cube.size, cube.size);
        Ok(handle)
    }

    /// Bind group for a lit draw and whether it is a real texture. Unknown
    /// handles and cubemaps fall back to white.
    pub fn flat_bind_group(&self, handle: Option<TextureHandle>) -> (&wgpu::BindGroup, bool) {
        match flat_slot(&self.kinds, handle) {
            Some(slot) => (&self.entries[slot].bind_group, true),
            None => (&self.fallback, false),
        }
    }

    /// Bind group of a cubemap, for the skybox.
    pub fn cube_bind_group(&self, handle: TextureHandle) -> Result<&wgpu::BindGroup, RenderError> {
        let slot = cube_slot(&self.kinds, handle)?;
        Ok(&self.entries[slot].bind_group)
    }

    fn push(&mut self, kind: TextureKind, entry: TextureEntry) {
        self.kinds.push(kind);
        self.entries.push(entry);
    }

    fn next_handle(&self) -> TextureHandle {
        TextureHandle(self.entries.len() as u32)
    }
}

/// Slot of a flat texture usable by a lit draw, if `handle` names one.
fn flat_slot(kinds: &[TextureKind], handle: Option<TextureHandle>) -> Option<usize> {
    let slot = handle?.0 as usize;
    (kinds.get(slot) == Some(&TextureKind::Flat)).then_some(slot)
}

/// Slot of the cubemap `handle` names.
fn cube_slot(kinds: &[TextureKind], handle: TextureHandle) -> Result<usize, RenderError> {
    let slot = handle.0 as usize;
    match kinds.get(slot) {
        Some(TextureKind::Cube) => Ok(slot),
        Some(TextureKind::Flat) => Err(RenderError::NotACubemap(handle)),
        None => Err(RenderError::UnknownTexture(handle)),
    }
}

fn upload_flat(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layouts: &BindLayouts,
    sampler: &wgpu::Sampler,
    image: &DecodedImage,
    label: &str,
) -> Result<wgpu::BindGroup, RenderError> {
    check_image(
        label,
        image.width,
        image.height,
        image.rgba.len(),
        device.limits().max_texture_dimension_2d,
    )?;
    gpu_scoped(device, label, || {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, image, 0);
        let view = texture.create_view(&Default::default());
        sampled_bind_group(device, &layouts.texture, &view, sampler, label)
    })
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, image: &DecodedImage, layer: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.row_bytes()),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}

fn sampled_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
