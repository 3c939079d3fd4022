//! CPU-side model representation produced by the OBJ loader.
//!
//! A [`Model`] owns three attribute pools and an ordered list of
//! [`FaceGroup`]s whose faces reference the pools by zero-based index.
//! Models are immutable once built and shared as [`ModelHandle`].

use std::sync::Arc;

use crate::material::Material;

pub type Position = [f32; 3];
pub type Normal = [f32; 3];
pub type TexCoord = [f32; 2];

/// Shared, read-only reference to a loaded model.
pub type ModelHandle = Arc<Model>;

/// Append-only attribute pools, indexed from 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryStore {
    pub positions: Vec<Position>,
    pub normals: Vec<Normal>,
    pub texcoords: Vec<TexCoord>,
}

impl GeometryStore {
    #[inline]
    pub fn position(&self, index: u32) -> Option<Position> {
        self.positions.get(index as usize).copied()
    }

    #[inline]
    pub fn normal(&self, index: u32) -> Option<Normal> {
        self.normals.get(index as usize).copied()
    }

    #[inline]
    pub fn texcoord(&self, index: u32) -> Option<TexCoord> {
        self.texcoords.get(index as usize).copied()
    }
}

/// Per-vertex index layout of every face line in a file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceGrammar {
    /// `f v v v`
    #[default]
    PositionOnly,
    /// `f v/t v/t v/t`
    PositionTexture,
    /// `f v//n v//n v//n`
    PositionNormal,
    /// `f v/t/n v/t/n v/t/n`
    PositionTextureNormal,
}

impl FaceGrammar {
    pub fn from_flags(has_texcoords: bool, has_normals: bool) -> Self {
        match (has_texcoords, has_normals) {
            (false, false) => FaceGrammar::PositionOnly,
            (true, false) => FaceGrammar::PositionTexture,
            (false, true) => FaceGrammar::PositionNormal,
            (true, true) => FaceGrammar::PositionTextureNormal,
        }
    }

    #[inline]
    pub fn has_texcoords(self) -> bool {
        matches!(
            self,
            FaceGrammar::PositionTexture | FaceGrammar::PositionTextureNormal
        )
    }

    #[inline]
    pub fn has_normals(self) -> bool {
        matches!(
            self,
            FaceGrammar::PositionNormal | FaceGrammar::PositionTextureNormal
        )
    }

    /// Shape of a single vertex token, for diagnostics.
    pub fn pattern(self) -> &'static str {
        match self {
            FaceGrammar::PositionOnly => "v",
            FaceGrammar::PositionTexture => "v/t",
            FaceGrammar::PositionNormal => "v//n",
            FaceGrammar::PositionTextureNormal => "v/t/n",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Triangle,
    Quad,
}

impl Topology {
    #[inline]
    pub fn vertex_count(self) -> usize {
        match self {
            Topology::Triangle => 3,
            Topology::Quad => 4,
        }
    }

    pub fn from_vertex_count(count: usize) -> Option<Self> {
        match count {
            3 => Some(Topology::Triangle),
            4 => Some(Topology::Quad),
            _ => None,
        }
    }
}

/// Zero-based attribute indices of one face corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexRef {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

/// A triangle or quad. Unused trailing slots of `refs` are default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    topology: Topology,
    refs: [VertexRef; 4],
}

impl Face {
    /// Builds a face from 3 or 4 corners; any other count yields `None`.
    pub fn new(corners: &[VertexRef]) -> Option<Self> {
        let topology = Topology::from_vertex_count(corners.len())?;
        let mut refs = [VertexRef::default(); 4];
        refs[..corners.len()].copy_from_slice(corners);
        Some(Self { topology, refs })
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn is_quad(&self) -> bool {
        self.topology == Topology::Quad
    }

    #[inline]
    pub fn vertices(&self) -> &[VertexRef] {
        &self.refs[..self.topology.vertex_count()]
    }

    pub fn position_indices(&self) -> Vec<u32> {
        self.vertices().iter().map(|r| r.position).collect()
    }

    /// `None` when the face carries no texture coordinates.
    pub fn texcoord_indices(&self) -> Option<Vec<u32>> {
        self.vertices().iter().map(|r| r.texcoord).collect()
    }

    /// `None` when the face carries no normals.
    pub fn normal_indices(&self) -> Option<Vec<u32>> {
        self.vertices().iter().map(|r| r.normal).collect()
    }
}

/// Named, ordered run of faces bound to at most one material.
#[derive(Clone, Debug, Default)]
pub struct FaceGroup {
    pub name: String,
    pub material: Option<Arc<Material>>,
    pub faces: Vec<Face>,
}

impl FaceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: None,
            faces: Vec::new(),
        }
    }

    /// Topology of the first face; `None` for an empty group.
    pub fn topology(&self) -> Option<Topology> {
        self.faces.first().map(Face::topology)
    }

    /// `true` if every face shares the first face's topology.
    pub fn is_uniform(&self) -> bool {
        match self.topology() {
            Some(t) => self.faces.iter().all(|f| f.topology() == t),
            None => true,
        }
    }

    pub fn material_name(&self) -> Option<&str> {
        self.material.as_deref().map(|m| m.name.as_str())
    }
}

/// A fully parsed model. Built only by the loader; never mutated afterwards.
#[derive(Clone, Debug)]
pub struct Model {
    source: String,
    geometry: GeometryStore,
    groups: Vec<FaceGroup>,
    grammar: FaceGrammar,
}

impl Model {
    pub(crate) fn from_parts(
        source: String,
        geometry: GeometryStore,
        groups: Vec<FaceGroup>,
        grammar: FaceGrammar,
    ) -> Self {
        Self {
            source,
            geometry,
            groups,
            grammar,
        }
    }

    /// Path (or label) the model was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    #[inline]
    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    /// First group with the given name.
    pub fn group(&self, name: &str) -> Option<&FaceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    #[inline]
    pub fn grammar(&self) -> FaceGrammar {
        self.grammar
    }

    #[inline]
    pub fn has_texcoords(&self) -> bool {
        self.grammar.has_texcoords()
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        self.grammar.has_normals()
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.groups.iter().flat_map(|g| g.faces.iter())
    }

    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|g| g.faces.len()).sum()
    }

    /// Triangles after splitting quads in two.
    pub fn triangle_count(&self) -> usize {
        self.faces()
            .map(|f| match f.topology() {
                Topology::Triangle => 1,
                Topology::Quad => 2,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(p: u32) -> VertexRef {
        VertexRef {
            position: p,
            ..VertexRef::default()
        }
    }

    #[test]
    fn face_arity() {
        assert!(Face::new(&[corner(0), corner(1)]).is_none());
        assert!(Face::new(&[corner(0); 5]).is_none());

        let tri = Face::new(&[corner(0), corner(1), corner(2)]).unwrap();
        assert_eq!(tri.topology(), Topology::Triangle);
        assert_eq!(tri.position_indices(), vec![0, 1, 2]);
        assert_eq!(tri.texcoord_indices(), None);

        let quad = Face::new(&[corner(0), corner(1), corner(2), corner(3)]).unwrap();
        assert!(quad.is_quad());
        assert_eq!(quad.vertices().len(), 4);
    }

    #[test]
    fn grammar_flags_round_trip() {
        for (t, n) in [(false, false), (true, false), (false, true), (true, true)] {
            let g = FaceGrammar::from_flags(t, n);
            assert_eq!((g.has_texcoords(), g.has_normals()), (t, n));
        }
        assert_eq!(FaceGrammar::PositionNormal.pattern(), "v//n");
    }

    #[test]
    fn group_uniformity() {
        let mut group = FaceGroup::new("hull");
        assert!(group.is_uniform());
        assert_eq!(group.topology(), None);

        group.faces.push(Face::new(&[corner(0), corner(1), corner(2)]).unwrap());
        group
            .faces
            .push(Face::new(&[corner(0), corner(1), corner(2), corner(3)]).unwrap());
        assert_eq!(group.topology(), Some(Topology::Triangle));
        assert!(!group.is_uniform());
    }
}
