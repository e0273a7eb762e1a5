//! # Meshes
//!
//! A [`MeshDescription`] is the CPU-side form of a mesh: interleaved vertex
//! floats, optional triangle indices, the attribute layout describing the
//! interleaving, the triangle winding and optional texture files. A
//! [`MeshResource`] is the same mesh uploaded to the GPU.

pub mod mesh_resource;

use std::path::PathBuf;

use crate::error::{RenderError, Result};
use crate::gfx::resources::vertex_layout::{validate_layout, VertexAttributeDescriptor};
use crate::gl::Winding;

pub use mesh_resource::{MeshResource, MeshTextures};

/// CPU-side mesh ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDescription {
    /// Interleaved vertex data
    pub vertices: Vec<f32>,
    /// Triangle indices; empty for non-indexed drawing
    pub indices: Vec<u32>,
    pub attributes: Vec<VertexAttributeDescriptor>,
    pub winding: Winding,
    pub diffuse_texture: Option<PathBuf>,
    pub specular_texture: Option<PathBuf>,
}

impl MeshDescription {
    pub fn new(
        vertices: Vec<f32>,
        indices: Vec<u32>,
        attributes: Vec<VertexAttributeDescriptor>,
    ) -> Self {
        Self {
            vertices,
            indices,
            attributes,
            winding: Winding::CounterClockwise,
            diffuse_texture: None,
            specular_texture: None,
        }
    }

    pub fn with_winding(mut self, winding: Winding) -> Self {
        self.winding = winding;
        self
    }

    pub fn with_diffuse_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.diffuse_texture = Some(path.into());
        self
    }

    pub fn with_specular_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.specular_texture = Some(path.into());
        self
    }

    /// Elements per vertex shared by all attributes
    pub fn stride(&self) -> usize {
        self.attributes.first().map_or(0, |a| a.stride)
    }

    /// Number of vertices in the interleaved data
    pub fn vertex_count(&self) -> usize {
        match self.stride() {
            0 => 0,
            stride => self.vertices.len() / stride,
        }
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Checks the layout, vertex data length and index range
    pub fn validate(&self) -> Result<()> {
        let stride = validate_layout(&self.attributes)?;
        if self.vertices.is_empty() {
            return Err(RenderError::InvalidMesh("mesh has no vertices".to_string()));
        }
        if self.vertices.len() % stride != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "{} vertex floats is not a multiple of the stride {}",
                self.vertices.len(),
                stride
            )));
        }
        let vertex_count = self.vertices.len() / stride;
        if let Some(index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(RenderError::InvalidMesh(format!(
                "index {index} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::vertex_layout::position_uv_layout;

    fn quad() -> MeshDescription {
        let vertices = vec![
            -0.5, -0.5, 0.0, 0.0, 0.0, //
            0.5, -0.5, 0.0, 1.0, 0.0, //
            0.5, 0.5, 0.0, 1.0, 1.0, //
            -0.5, 0.5, 0.0, 0.0, 1.0,
        ];
        MeshDescription::new(vertices, vec![0, 1, 2, 2, 3, 0], position_uv_layout())
    }

    #[test]
    fn test_vertex_count_from_stride() {
        let mesh = quad();
        assert_eq!(mesh.stride(), 5);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.is_indexed());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_ragged_vertex_data_is_rejected() {
        let mut mesh = quad();
        mesh.vertices.pop();
        assert!(matches!(mesh.validate(), Err(RenderError::InvalidMesh(_))));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut mesh = quad();
        mesh.indices.push(4);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let mesh = quad()
            .with_winding(Winding::Clockwise)
            .with_diffuse_texture("crate.png");
        assert_eq!(mesh.winding, Winding::Clockwise);
        assert_eq!(mesh.diffuse_texture, Some(PathBuf::from("crate.png")));
        assert!(mesh.specular_texture.is_none());
    }
}
