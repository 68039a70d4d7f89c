//! Core primitive types for rendering
//!
//! Mesh records, procedural generators and the camera.

pub mod camera;
pub mod mesh;
pub mod sphere;

// Re-export commonly used types
pub use camera::Camera;
pub use mesh::{validate_mesh, MeshError, MeshRecord, MeshSource};
pub use sphere::{
    generate_sphere, ring_vertex_index, ColorOptions, SphereMeshGenerator, SphereOptions,
    UvOptions,
};
