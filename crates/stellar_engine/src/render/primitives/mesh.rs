//! Mesh records for procedurally generated geometry
//!
//! A [`MeshRecord`] holds separate attribute arrays (positions, normals,
//! texture coordinates, optional colours) plus a triangle index list. The
//! arrays are laid out exactly as they are uploaded: one attribute buffer per
//! array, indexed drawing over `u32` indices.
//!
//! The renderer never asks for a sphere specifically. Anything implementing
//! [`MeshSource`] can be uploaded and drawn, so other procedural generators
//! can be substituted.

use thiserror::Error;

/// Errors produced while generating or validating mesh data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Generator input outside its domain (radius, resolution, band counts)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Mesh has no vertices or no indices
    #[error("Mesh is empty: {0}")]
    EmptyMesh(String),

    /// Per-vertex arrays disagree on the vertex count
    #[error("Attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeCountMismatch {
        /// Attribute name
        attribute: &'static str,
        /// Entries expected (the position count)
        expected: usize,
        /// Entries found
        actual: usize,
    },

    /// Index list references a vertex that does not exist
    #[error("Index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Position within the index list
        position: usize,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// Index count is not a multiple of three
    #[error("Index count {0} is not a whole number of triangles")]
    IncompleteTriangle(usize),
}

/// Shape every mesh consumer accepts
///
/// Positions, normals and texture coordinates are parallel arrays with one
/// entry per vertex; indices come in counter-clockwise triples.
pub trait MeshSource {
    /// Vertex positions
    fn positions(&self) -> &[[f32; 3]];

    /// Unit vertex normals, parallel to `positions`
    fn normals(&self) -> &[[f32; 3]];

    /// Texture coordinates, parallel to `positions`
    fn uvs(&self) -> &[[f32; 2]];

    /// Triangle corner indices
    fn indices(&self) -> &[u32];

    /// Optional RGBA colours, parallel to `positions`
    fn colors(&self) -> Option<&[[f32; 4]]> {
        None
    }

    /// Number of vertices
    fn vertex_count(&self) -> usize {
        self.positions().len()
    }

    /// Number of triangles
    fn triangle_count(&self) -> usize {
        self.indices().len() / 3
    }
}

/// Check that a mesh satisfies the consumer contract.
///
/// Rejects empty meshes, attribute arrays of differing length, dangling
/// indices and index lists that do not form whole triangles.
pub fn validate_mesh(mesh: &dyn MeshSource) -> Result<(), MeshError> {
    let vertex_count = mesh.positions().len();
    if vertex_count == 0 {
        return Err(MeshError::EmptyMesh("no vertex positions".to_string()));
    }
    if mesh.indices().is_empty() {
        return Err(MeshError::EmptyMesh("no indices".to_string()));
    }

    let check = |attribute: &'static str, actual: usize| {
        if actual == vertex_count {
            Ok(())
        } else {
            Err(MeshError::AttributeCountMismatch { attribute, expected: vertex_count, actual })
        }
    };
    check("normals", mesh.normals().len())?;
    check("uvs", mesh.uvs().len())?;
    if let Some(colors) = mesh.colors() {
        check("colors", colors.len())?;
    }

    let index_count = mesh.indices().len();
    if index_count % 3 != 0 {
        return Err(MeshError::IncompleteTriangle(index_count));
    }

    for (position, &index) in mesh.indices().iter().enumerate() {
        if index as usize >= vertex_count {
            return Err(MeshError::IndexOutOfRange { index, position, vertex_count });
        }
    }

    Ok(())
}

/// Immutable mesh data produced by a generator
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    colors: Option<Vec<[f32; 4]>>,
}

impl MeshRecord {
    /// Assemble a record from its attribute arrays, validating the shape
    pub fn new(
        positions: Vec<[f32; 3]>,
        indices: Vec<u32>,
        normals: Vec<[f32; 3]>,
        uvs: Vec<[f32; 2]>,
        colors: Option<Vec<[f32; 4]>>,
    ) -> Result<Self, MeshError> {
        let record = Self { positions, indices, normals, uvs, colors };
        validate_mesh(&record)?;
        Ok(record)
    }

    /// Attach per-vertex colours
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Result<Self, MeshError> {
        if colors.len() != self.positions.len() {
            return Err(MeshError::AttributeCountMismatch {
                attribute: "colors",
                expected: self.positions.len(),
                actual: colors.len(),
            });
        }
        self.colors = Some(colors);
        Ok(self)
    }

    /// Re-check the shape contract
    pub fn validate(&self) -> Result<(), MeshError> {
        validate_mesh(self)
    }

    /// Maximum index value, if any
    pub fn max_index(&self) -> Option<u32> {
        self.indices.iter().copied().max()
    }
}

impl MeshSource for MeshRecord {
    fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn colors(&self) -> Option<&[[f32; 4]]> {
        self.colors.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshRecord {
        MeshRecord::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
            vec![[0.0, 0.0, 1.0]; 3],
            vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            None,
        )
        .expect("triangle is valid")
    }

    #[test]
    fn test_valid_triangle() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.max_index(), Some(2));
        assert!(mesh.colors().is_none());
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let result = MeshRecord::new(Vec::new(), Vec::new(), Vec::new(), Vec::new(), None);
        assert!(matches!(result, Err(MeshError::EmptyMesh(_))));

        let no_indices = MeshRecord::new(
            vec![[0.0; 3]],
            Vec::new(),
            vec![[0.0, 0.0, 1.0]],
            vec![[0.0; 2]],
            None,
        );
        assert!(matches!(no_indices, Err(MeshError::EmptyMesh(_))));
    }

    #[test]
    fn test_attribute_mismatch_rejected() {
        let result = MeshRecord::new(
            vec![[0.0; 3]; 3],
            vec![0, 1, 2],
            vec![[0.0, 0.0, 1.0]; 2],
            vec![[0.0; 2]; 3],
            None,
        );
        assert_eq!(
            result,
            Err(MeshError::AttributeCountMismatch { attribute: "normals", expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_dangling_index_rejected() {
        let result = MeshRecord::new(
            vec![[0.0; 3]; 3],
            vec![0, 1, 3],
            vec![[0.0, 0.0, 1.0]; 3],
            vec![[0.0; 2]; 3],
            None,
        );
        assert_eq!(
            result,
            Err(MeshError::IndexOutOfRange { index: 3, position: 2, vertex_count: 3 })
        );
    }

    #[test]
    fn test_partial_triangle_rejected() {
        let result = MeshRecord::new(
            vec![[0.0; 3]; 3],
            vec![0, 1],
            vec![[0.0, 0.0, 1.0]; 3],
            vec![[0.0; 2]; 3],
            None,
        );
        assert_eq!(result, Err(MeshError::IncompleteTriangle(2)));
    }

    #[test]
    fn test_with_colors_checks_length() {
        assert!(triangle().with_colors(vec![[1.0; 4]; 2]).is_err());
        let colored = triangle().with_colors(vec![[1.0; 4]; 3]).expect("length matches");
        assert_eq!(colored.colors().map(<[[f32; 4]]>::len), Some(3));
    }
}
