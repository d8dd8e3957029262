use crate::error::{RenderError, scoped};
use scenecore_render::{MeshData, MeshKind, Vertex, build_mesh};
use wgpu::util::DeviceExt;

/// One uploaded mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, kind: MeshKind, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{kind:?}_vertex_buffer")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{kind:?}_index_buffer")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    /// Bind buffers and issue one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Vertex layout shared by every pipeline: position, normal, uv.
pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Uploaded box, triangle and sphere meshes, built once at initialization.
pub struct GeometryCache {
    cube: GpuMesh,
    triangle: GpuMesh,
    sphere: GpuMesh,
}

impl GeometryCache {
    pub fn build(device: &wgpu::Device, stacks: u32, sectors: u32) -> Result<Self, RenderError> {
        let upload = |kind| GpuMesh::upload(device, kind, &build_mesh(kind, stacks, sectors));
        let (cube, triangle, sphere) = scoped(device, wgpu::ErrorFilter::OutOfMemory, || {
            (
                upload(MeshKind::Box),
                upload(MeshKind::Triangle),
                upload(MeshKind::Sphere),
            )
        })
        .map_err(|log| RenderError::Gpu {
            label: "geometry".into(),
            log,
        })?;
        tracing::debug!(
            "geometry cache built: box={} triangle={} sphere={} indices",
            cube.index_count,
            triangle.index_count,
            sphere.index_count
        );
        Ok(Self {
            cube,
            triangle,
            sphere,
        })
    }

    pub fn get(&self, kind: MeshKind) -> &GpuMesh {
        match kind {
            MeshKind::Box => &self.cube,
            MeshKind::Triangle => &self.triangle,
            MeshKind::Sphere => &self.sphere,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_vertex() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 32);
        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = layout
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }
}
