pub mod blade;
pub mod geometry;
pub mod stem;
pub mod tessellation;

pub use blade::BladeMeshBuilder;
pub use geometry::{Aabb, Mesh, Vertex};
pub use stem::{PathPoint, StemMesh, StemMeshBuilder};
pub use tessellation::allocate_samples;
