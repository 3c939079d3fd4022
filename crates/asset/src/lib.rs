//! Model assets: OBJ parsing, material libraries, textures and the model cache.

pub mod cache;
pub mod error;
mod lines;
pub mod material;
pub mod mesh;
pub mod obj;
pub mod texture;

pub use cache::{ModelCache, SharedModelCache};
pub use error::{Attribute, LoadError, LoadResult};
pub use material::{Material, MaterialLoader, MtlLoader};
pub use mesh::{Face, FaceGrammar, FaceGroup, GeometryStore, Model, ModelHandle, Topology, VertexRef};
pub use obj::{load_obj_from_path, load_obj_from_reader, load_obj_from_str};
pub use texture::TextureData;
