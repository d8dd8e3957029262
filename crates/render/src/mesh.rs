//! Procedural meshes for the fixed shape catalog.
//!
//! All shapes are unit-sized and centered at the origin so that an entity's
//! `size` is its world-space extent. Front faces wind counter-clockwise.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use scenecore_common::ObjectType;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Interleaved vertex: position, normal, texcoord.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Shapes with a cached mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshKind {
    Box,
    Triangle,
    Sphere,
}

impl MeshKind {
    pub const ALL: [MeshKind; 3] = [MeshKind::Box, MeshKind::Triangle, MeshKind::Sphere];
}

/// Which cached mesh draws an object type. `None` means invisible.
pub fn mesh_kind_for(object_type: ObjectType) -> Option<MeshKind> {
    match object_type {
        ObjectType::Box => Some(MeshKind::Box),
        ObjectType::Triangle => Some(MeshKind::Triangle),
        ObjectType::Sphere => Some(MeshKind::Sphere),
        ObjectType::PlayerSpawn | ObjectType::Trigger | ObjectType::Circle => None,
    }
}

/// CPU-side vertex and index data, ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Min and max corner of the vertex positions.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize].position),
                Vec3::from(self.vertices[tri[1] as usize].position),
                Vec3::from(self.vertices[tri[2] as usize].position),
            ]
        })
    }
}

/// Upper bound on sphere stacks and sectors; keeps vertex indices well
/// inside `u32`.
pub const MAX_SPHERE_DETAIL: u32 = 512;

/// Build the mesh for a shape. Sphere detail comes from `stacks`/`sectors`.
pub fn build_mesh(kind: MeshKind, stacks: u32, sectors: u32) -> MeshData {
    match kind {
        MeshKind::Box => box_mesh(),
        MeshKind::Triangle => triangle_mesh(),
        MeshKind::Sphere => sphere_mesh(stacks, sectors),
    }
}

/// Unit cube: 6 faces, 4 vertices and 2 triangles each, outward normals.
pub fn box_mesh() -> MeshData {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut mesh = MeshData::default();
    for (normal, corners) in faces {
        let base = mesh.vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            mesh.vertices.push(Vertex::new(*corner, normal, uv));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// Isosceles triangle in the XY plane facing +Z.
pub fn triangle_mesh() -> MeshData {
    let n = [0.0, 0.0, 1.0];
    MeshData {
        vertices: vec![
            Vertex::new([-0.5, -0.5, 0.0], n, [0.0, 1.0]),
            Vertex::new([0.5, -0.5, 0.0], n, [1.0, 1.0]),
            Vertex::new([0.0, 0.5, 0.0], n, [0.5, 0.0]),
        ],
        indices: vec![0, 1, 2],
    }
}

/// UV-sphere of unit diameter with its poles on the Y axis.
///
/// Produces `(stacks + 1) * (sectors + 1)` vertices. The first and last
/// stack bands each contribute one triangle per sector instead of two, so
/// there are `2 * sectors * (stacks - 1)` triangles and none are degenerate.
///
/// `stacks` is clamped to `2..=MAX_SPHERE_DETAIL` and `sectors` to
/// `3..=MAX_SPHERE_DETAIL`.
pub fn sphere_mesh(stacks: u32, sectors: u32) -> MeshData {
    let (requested_stacks, requested_sectors) = (stacks, sectors);
    let stacks = stacks.clamp(2, MAX_SPHERE_DETAIL);
    let sectors = sectors.clamp(3, MAX_SPHERE_DETAIL);
    if requested_stacks > stacks || requested_sectors > sectors {
        tracing::warn!(
            "sphere detail {requested_stacks}x{requested_sectors} clamped to {stacks}x{sectors}"
        );
    }
    let radius = 0.5_f32;

    let (stacks_n, sectors_n) = (stacks as usize, sectors as usize);
    let mut mesh = MeshData {
        vertices: Vec::with_capacity((stacks_n + 1) * (sectors_n + 1)),
        indices: Vec::with_capacity(6 * sectors_n * (stacks_n - 1)),
    };

    for i in 0..=stacks {
        let stack_angle = FRAC_PI_2 - i as f32 * PI / stacks as f32;
        let ring = radius * stack_angle.cos();
        let y = radius * stack_angle.sin();
        for j in 0..=sectors {
            let sector_angle = j as f32 * TAU / sectors as f32;
            let position = Vec3::new(ring * sector_angle.cos(), y, ring * sector_angle.sin());
            let normal = position.normalize_or_zero();
            mesh.vertices.push(Vertex::new(
                position.to_array(),
                normal.to_array(),
                [j as f32 / sectors as f32, i as f32 / stacks as f32],
            ));
        }
    }

    for i in 0..stacks {
        let k1 = i * (sectors + 1);
        let k2 = k1 + sectors + 1;
        for j in 0..sectors {
            let (a, b) = (k1 + j, k2 + j);
            if i != 0 {
                mesh.indices.extend_from_slice(&[a, a + 1, b]);
            }
            if i != stacks - 1 {
                mesh.indices.extend_from_slice(&[a + 1, b + 1, b]);
            }
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward_and_solid(mesh: &MeshData) {
        for [a, b, c] in mesh.triangles() {
            let n = (b - a).cross(c - a);
            assert!(n.length() > 0.0, "degenerate triangle {a} {b} {c}");
            let centroid = (a + b + c) / 3.0;
            assert!(n.dot(centroid) > 0.0, "inward-facing triangle {a} {b} {c}");
        }
    }

    #[test]
    fn box_has_six_faces() {
        let mesh = box_mesh();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.bounds(), (Vec3::splat(-0.5), Vec3::splat(0.5)));
        assert_outward_and_solid(&mesh);
    }

    #[test]
    fn box_normals_match_faces() {
        let mesh = box_mesh();
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            // The normal axis is the one where the vertex sits on the face plane.
            assert!((p.dot(n) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn triangle_faces_positive_z() {
        let mesh = triangle_mesh();
        assert_eq!(mesh.triangle_count(), 1);
        let [a, b, c] = mesh.triangles().next().unwrap();
        let n = (b - a).cross(c - a).normalize();
        assert_eq!(n, Vec3::Z);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn sphere_counts() {
        for (stacks, sectors) in [(16, 16), (24, 32), (2, 3)] {
            let mesh = sphere_mesh(stacks, sectors);
            assert_eq!(mesh.vertices.len(), ((stacks + 1) * (sectors + 1)) as usize);
            assert_eq!(
                mesh.indices.len(),
                (3 * 2 * sectors * (stacks - 1)) as usize
            );
        }
    }

    #[test]
    fn sphere_triangles_are_outward_and_not_degenerate() {
        assert_outward_and_solid(&sphere_mesh(16, 16));
        assert_outward_and_solid(&sphere_mesh(5, 7));
    }

    #[test]
    fn sphere_normals_are_unit_positions() {
        let mesh = sphere_mesh(12, 18);
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!((p.length() - 0.5).abs() < 1e-5);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!((p * 2.0 - n).length() < 1e-5);
        }
    }

    #[test]
    fn sphere_stack_angles_run_pole_to_pole() {
        let mesh = sphere_mesh(8, 8);
        assert!((mesh.vertices[0].position[1] - 0.5).abs() < 1e-6);
        let last = mesh.vertices.last().unwrap();
        assert!((last.position[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn sphere_detail_is_clamped() {
        let mesh = sphere_mesh(0, 1);
        assert_eq!(mesh.vertices.len(), 3 * 4);
        assert_outward_and_solid(&mesh);
    }

    #[test]
    fn huge_sphere_detail_is_capped() {
        let mesh = sphere_mesh(70_000, 70_000);
        let n = MAX_SPHERE_DETAIL as usize;
        assert_eq!(mesh.vertices.len(), (n + 1) * (n + 1));
        assert_eq!(mesh.indices.len(), 6 * n * (n - 1));
        let max_index = mesh.indices.iter().copied().max().unwrap() as usize;
        assert!(max_index < mesh.vertices.len());
    }

    #[test]
    fn only_drawable_types_have_meshes() {
        assert_eq!(mesh_kind_for(ObjectType::Box), Some(MeshKind::Box));
        assert_eq!(mesh_kind_for(ObjectType::Sphere), Some(MeshKind::Sphere));
        assert_eq!(mesh_kind_for(ObjectType::Triangle), Some(MeshKind::Triangle));
        assert_eq!(mesh_kind_for(ObjectType::PlayerSpawn), None);
        assert_eq!(mesh_kind_for(ObjectType::Trigger), None);
        assert_eq!(mesh_kind_for(ObjectType::Circle), None);
    }
}
