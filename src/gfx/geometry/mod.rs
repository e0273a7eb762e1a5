//! # Procedural Geometry Generation
//!
//! This module provides functions to generate common 3D primitive shapes procedurally,
//! eliminating the need for external model files for basic shapes.
//!
//! ## Supported Primitives
//!
//! - **Cube**: Unit cube with normals and texture coordinates, indexed
//! - **Textured Cube**: Unit cube with positions and texture coordinates, not indexed
//! - **Colored Quad**: Unit quad with per-vertex colors
//! - **Sphere**: UV sphere with configurable resolution
//! - **Plane**: Flat ground plane with configurable size and subdivisions
//!
//! ## Usage
//!
//! ```rust
//! use thistle::gfx::geometry::{generate_cube, generate_sphere, generate_plane};
//!
//! // Generate a unit cube
//! let cube = generate_cube();
//!
//! // Generate a sphere with 32 segments
//! let sphere = generate_sphere(32, 16);
//!
//! // Generate a 10x10 plane with 4 subdivisions
//! let plane = generate_plane(10.0, 10.0, 4, 4);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::mesh::MeshDescription;
use crate::gfx::resources::vertex_layout::{position_normal_uv_layout, position_uv_layout};
use crate::gl::Winding;

/// Separate attribute streams of a generated shape
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves position, normal and texture coordinates (3 + 3 + 2)
    /// into an indexed mesh description
    pub fn into_mesh_description(self, winding: Winding) -> MeshDescription {
        let mut interleaved = Vec::with_capacity(self.vertices.len() * 8);
        for (i, position) in self.vertices.iter().enumerate() {
            let normal = self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
            let uv = self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]);
            interleaved.extend_from_slice(position);
            interleaved.extend_from_slice(&normal);
            interleaved.extend_from_slice(&uv);
        }

        MeshDescription::new(interleaved, self.indices, position_normal_uv_layout())
            .with_winding(winding)
    }

    /// Expands the index list into position and texture coordinates
    /// (3 + 2) drawn without indices
    pub fn into_unindexed_position_uv(self, winding: Winding) -> MeshDescription {
        let mut expanded = Vec::with_capacity(self.indices.len() * 5);
        for &index in &self.indices {
            let i = index as usize;
            let uv = self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]);
            expanded.extend_from_slice(&self.vertices[i]);
            expanded.extend_from_slice(&uv);
        }

        MeshDescription::new(expanded, Vec::new(), position_uv_layout()).with_winding(winding)
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GeometryData {
        GeometryData {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_interleaving_order() {
        let mesh = triangle().into_mesh_description(Winding::CounterClockwise);
        assert_eq!(mesh.stride(), 8);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(
            &mesh.vertices[8..16],
            &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]
        );
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_unindexed_expansion() {
        let mesh = triangle().into_unindexed_position_uv(Winding::Clockwise);
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.winding, Winding::Clockwise);
        assert_eq!(&mesh.vertices[10..15], &[0.0, 1.0, 0.0, 0.0, 1.0]);
    }
}
