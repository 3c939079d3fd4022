//! Renderer: walks a loaded model and submits primitives to a [`Rasterizer`].
//!
//! The traversal only decides *what* is emitted and in which order; turning
//! the calls into pixels is up to the backend behind the trait.

use asset::{Face, Material, Model, Topology, mesh::{Normal, Position, TexCoord}};
use glam::Mat4;

pub mod batch;
pub mod recorder;
pub mod scene;

pub use batch::{Batch, BatchRasterizer, Vertex};
pub use recorder::{CommandRecorder, DrawCommand};
pub use scene::{Entity, Placement, Scene};

/// Immediate-mode primitive sink.
///
/// Attribute calls set the current texcoord/normal; `vertex` emits a corner
/// using that state. Corners are only valid between `begin` and `end`.
pub trait Rasterizer {
    fn enable_texturing(&mut self);
    fn disable_texturing(&mut self);
    fn apply_material(&mut self, material: &Material);
    fn begin(&mut self, topology: Topology);
    fn tex_coord(&mut self, uv: TexCoord);
    fn normal(&mut self, normal: Normal);
    fn vertex(&mut self, position: Position);
    fn end(&mut self);

    /// Multiply the current model transform; paired with `pop_transform`.
    fn push_transform(&mut self, _transform: Mat4) {}
    fn pop_transform(&mut self) {}
}

/// Per-draw texture toggle; not stored in the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureMode {
    #[default]
    Shown,
    Hidden,
}

impl TextureMode {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            TextureMode::Shown
        } else {
            TextureMode::Hidden
        }
    }

    #[inline]
    pub fn is_shown(self) -> bool {
        self == TextureMode::Shown
    }
}

/// Emit `model` group by group, in declaration order.
///
/// Each group is submitted as one batch per run of equal topology, so a
/// uniform group is exactly one `begin`/`end` pair. Empty groups emit
/// nothing.
pub fn render_model<R: Rasterizer + ?Sized>(model: &Model, textures: TextureMode, rasterizer: &mut R) {
    let textured = textures.is_shown() && model.has_texcoords();

    for group in model.groups() {
        if group.faces.is_empty() {
            continue;
        }

        if textured {
            rasterizer.enable_texturing();
            if let Some(material) = group.material.as_deref() {
                rasterizer.apply_material(material);
            }
        }

        for run in group.faces.chunk_by(|a, b| a.topology() == b.topology()) {
            rasterizer.begin(run[0].topology());
            for face in run {
                emit_face(model, face, rasterizer);
            }
            rasterizer.end();
        }

        if textured {
            rasterizer.disable_texturing();
        }
    }
}

/// Corners in order: texcoord, then normal, then position.
fn emit_face<R: Rasterizer + ?Sized>(model: &Model, face: &Face, rasterizer: &mut R) {
    let geo = model.geometry();
    let (with_uv, with_normal) = (model.has_texcoords(), model.has_normals());

    for corner in face.vertices() {
        // Indices were validated against the pools when the model was built.
        if with_uv {
            if let Some(t) = corner.texcoord {
                rasterizer.tex_coord(geo.texcoords[t as usize]);
            }
        }
        if with_normal {
            if let Some(n) = corner.normal {
                rasterizer.normal(geo.normals[n as usize]);
            }
        }
        rasterizer.vertex(geo.positions[corner.position as usize]);
    }
}
