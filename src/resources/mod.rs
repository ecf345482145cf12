//! Mesh and material descriptions consumed by the queueing layer.

pub mod material;
pub mod mesh;

pub use material::{Material, ShaderFlags, Technique};
pub use mesh::{DrawOperation, Mesh, SubMesh};
