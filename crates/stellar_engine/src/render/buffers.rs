//! GPU buffer sets for mesh records
//!
//! One buffer per attribute array plus the element buffer. Uploads go
//! through `bytemuck` so the attribute arrays are handed over as raw bytes
//! without copying into an interleaved layout.

use super::api::{BufferHandle, RenderBackend};
use super::primitives::mesh::{validate_mesh, MeshSource};
use super::{RenderError, RenderResult};

/// Buffers backing one uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBufferSet {
    /// Position attribute buffer (3 floats per vertex)
    pub position: BufferHandle,
    /// Normal attribute buffer (3 floats per vertex)
    pub normal: BufferHandle,
    /// Texture coordinate attribute buffer (2 floats per vertex)
    pub tex_coord: BufferHandle,
    /// Element buffer (`u32` indices)
    pub index: BufferHandle,
    /// Indices drawn per draw call
    pub index_count: u32,
    /// Vertices in the attribute buffers
    pub vertex_count: u32,
}

impl GpuBufferSet {
    /// Validate `mesh` and upload its attribute and index arrays.
    ///
    /// # Errors
    /// `RenderError::Mesh` for a mesh that breaks the shape contract,
    /// `RenderError::InvalidParameter` for counts that do not fit 32 bits,
    /// or whatever the backend reports while creating buffers.
    pub fn upload(backend: &mut dyn RenderBackend, mesh: &dyn MeshSource) -> RenderResult<Self> {
        validate_mesh(mesh)?;

        let index_count = u32::try_from(mesh.indices().len())
            .map_err(|_| RenderError::InvalidParameter("index count exceeds u32".to_string()))?;
        let vertex_count = u32::try_from(mesh.vertex_count())
            .map_err(|_| RenderError::InvalidParameter("vertex count exceeds u32".to_string()))?;

        let position = backend.create_vertex_buffer(bytemuck::cast_slice(mesh.positions()))?;
        let normal = backend.create_vertex_buffer(bytemuck::cast_slice(mesh.normals()))?;
        let tex_coord = backend.create_vertex_buffer(bytemuck::cast_slice(mesh.uvs()))?;
        let index = backend.create_index_buffer(mesh.indices())?;

        log::debug!(
            "Uploaded mesh: {} vertices, {} indices (buffers {:?}, {:?}, {:?}, {:?})",
            vertex_count,
            index_count,
            position,
            normal,
            tex_coord,
            index
        );

        Ok(Self {
            position,
            normal,
            tex_coord,
            index,
            index_count,
            vertex_count,
        })
    }

    /// Triangles drawn per draw call
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::headless::HeadlessBackend;
    use crate::render::primitives::sphere::generate_sphere;

    #[test]
    fn test_upload_creates_four_buffers() {
        let mut backend = HeadlessBackend::new(640, 480);
        let mesh = generate_sphere(1.0, 4).expect("valid sphere");
        let buffers = GpuBufferSet::upload(&mut backend, &mesh).expect("upload succeeds");

        assert_eq!(buffers.vertex_count, 14);
        assert_eq!(buffers.index_count, 72);
        assert_eq!(buffers.triangle_count(), 24);
        assert_eq!(backend.buffer_len_bytes(buffers.position), Some(14 * 12));
        assert_eq!(backend.buffer_len_bytes(buffers.tex_coord), Some(14 * 8));
        assert_eq!(backend.buffer_len_bytes(buffers.index), Some(72 * 4));
    }

    struct BrokenMesh;

    impl MeshSource for BrokenMesh {
        fn positions(&self) -> &[[f32; 3]] {
            &[[0.0; 3]; 3]
        }
        fn normals(&self) -> &[[f32; 3]] {
            &[]
        }
        fn uvs(&self) -> &[[f32; 2]] {
            &[[0.0; 2]; 3]
        }
        fn indices(&self) -> &[u32] {
            &[0, 1, 2]
        }
    }

    #[test]
    fn test_inconsistent_mesh_rejected_before_upload() {
        let mut backend = HeadlessBackend::new(640, 480);
        let result = GpuBufferSet::upload(&mut backend, &BrokenMesh);

        assert!(matches!(result, Err(RenderError::Mesh(_))));
        assert_eq!(backend.buffer_count(), 0);
    }
}
