//! Collects immediate-mode submissions into indexed triangle batches that a
//! GPU backend can upload directly.

use asset::{
    Material, Topology,
    mesh::{Normal, Position, TexCoord},
};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::Rasterizer;

/// Vertex: position + normal + uv, tightly packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// One draw call worth of triangles sharing texture/material state.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub textured: bool,
    pub material: Option<Material>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Batch {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn material_name(&self) -> Option<&str> {
        self.material.as_ref().map(|m| m.name.as_str())
    }
}

#[derive(Debug)]
pub struct BatchRasterizer {
    batches: Vec<Batch>,
    transforms: Vec<Mat4>,
    textured: bool,
    material: Option<Material>,
    open: Option<Topology>,
    corners: Vec<Vertex>,
    uv: TexCoord,
    normal: Normal,
}

impl Default for BatchRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRasterizer {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            transforms: Vec::new(),
            textured: false,
            material: None,
            open: None,
            corners: Vec::with_capacity(64),
            uv: [0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
        }
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Hand the finished batches over, leaving the builder empty.
    pub fn take_batches(&mut self) -> Vec<Batch> {
        std::mem::take(&mut self.batches)
    }

    pub fn draw_calls(&self) -> usize {
        self.batches.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.batches.iter().map(Batch::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.batches.iter().map(|b| b.vertices.len()).sum()
    }

    fn current_transform(&self) -> Mat4 {
        self.transforms.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Last batch if it has the same state, otherwise a fresh one.
    fn target_batch(&mut self) -> &mut Batch {
        let material_name = self.material.as_ref().map(|m| m.name.as_str());
        let reuse = self
            .batches
            .last()
            .is_some_and(|b| b.textured == self.textured && b.material_name() == material_name);
        if !reuse {
            self.batches.push(Batch {
                textured: self.textured,
                material: self.material.clone(),
                ..Batch::default()
            });
        }
        let last = self.batches.len() - 1;
        &mut self.batches[last]
    }
}

impl Rasterizer for BatchRasterizer {
    fn enable_texturing(&mut self) {
        self.textured = true;
        self.material = None;
    }

    fn disable_texturing(&mut self) {
        self.textured = false;
        self.material = None;
    }

    fn apply_material(&mut self, material: &Material) {
        self.material = Some(material.clone());
    }

    fn begin(&mut self, topology: Topology) {
        if let Some(open) = self.open {
            log::warn!("begin({:?}) while a {:?} batch is open; ignoring", topology, open);
            return;
        }
        self.open = Some(topology);
        self.corners.clear();
    }

    fn tex_coord(&mut self, uv: TexCoord) {
        self.uv = uv;
    }

    fn normal(&mut self, normal: Normal) {
        self.normal = normal;
    }

    fn vertex(&mut self, position: Position) {
        if self.open.is_none() {
            log::warn!("vertex outside begin/end ignored");
            return;
        }
        let m = self.current_transform();
        let normal_matrix = Mat3::from_mat4(m).inverse().transpose();
        let pos = m.transform_point3(Vec3::from(position));
        let normal = (normal_matrix * Vec3::from(self.normal)).normalize_or_zero();
        self.corners.push(Vertex {
            pos: pos.to_array(),
            normal: normal.to_array(),
            uv: self.uv,
        });
    }

    fn end(&mut self) {
        let Some(topology) = self.open.take() else {
            log::warn!("end without begin ignored");
            return;
        };

        let per_face = topology.vertex_count();
        let mut corners = std::mem::take(&mut self.corners);
        let leftover = corners.len() % per_face;
        if leftover != 0 {
            log::warn!("dropping {} trailing corner(s) of an incomplete {:?}", leftover, topology);
        }
        if corners.len() < per_face {
            corners.clear();
            self.corners = corners;
            return;
        }

        let batch = self.target_batch();
        for face in corners.chunks_exact(per_face) {
            let base = batch.vertices.len() as u32;
            batch.vertices.extend_from_slice(face);
            let local: &[u32] = match topology {
                Topology::Triangle => &[0, 1, 2],
                Topology::Quad => &[0, 1, 2, 0, 2, 3],
            };
            batch.indices.extend(local.iter().map(|i| base + i));
        }

        corners.clear();
        self.corners = corners;
    }

    fn push_transform(&mut self, transform: Mat4) {
        let combined = self.current_transform() * transform;
        self.transforms.push(combined);
    }

    fn pop_transform(&mut self) {
        if self.transforms.pop().is_none() {
            log::warn!("pop_transform on an empty stack");
        }
    }
}
