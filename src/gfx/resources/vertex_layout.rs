//! Vertex attribute descriptors
//!
//! A descriptor says where one per-vertex field lives inside an interleaved
//! vertex buffer. Strides and offsets are counted in elements, not bytes;
//! the byte values handed to the graphics API are derived from the scalar
//! type.

use std::fmt;

use crate::error::{RenderError, Result};
use crate::gl::ScalarType;

/// Meaning of a vertex attribute, which fixes its shader input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    /// `layout (location = 0)`
    Position,
    /// `layout (location = 1)`
    Normal,
    /// `layout (location = 2)`
    TexCoords,
    /// `layout (location = 3)`
    Color,
    /// Caller-chosen location
    Custom(u32),
}

impl AttributeSemantic {
    /// Attribute slot the shader reads this semantic from
    pub fn slot(self) -> u32 {
        match self {
            AttributeSemantic::Position => 0,
            AttributeSemantic::Normal => 1,
            AttributeSemantic::TexCoords => 2,
            AttributeSemantic::Color => 3,
            AttributeSemantic::Custom(slot) => slot,
        }
    }
}

impl fmt::Display for AttributeSemantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSemantic::Position => write!(f, "position"),
            AttributeSemantic::Normal => write!(f, "normal"),
            AttributeSemantic::TexCoords => write!(f, "texcoords"),
            AttributeSemantic::Color => write!(f, "color"),
            AttributeSemantic::Custom(slot) => write!(f, "custom({slot})"),
        }
    }
}

/// Location of one attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeDescriptor {
    /// Components per vertex (1 to 4)
    pub element_count: usize,
    pub scalar: ScalarType,
    /// Elements per vertex
    pub stride: usize,
    /// Elements before this attribute within a vertex
    pub offset: usize,
    pub semantic: AttributeSemantic,
}

impl VertexAttributeDescriptor {
    /// Float attribute descriptor
    pub const fn float(
        semantic: AttributeSemantic,
        element_count: usize,
        stride: usize,
        offset: usize,
    ) -> Self {
        Self {
            element_count,
            scalar: ScalarType::Float,
            stride,
            offset,
            semantic,
        }
    }

    pub fn slot(&self) -> u32 {
        self.semantic.slot()
    }

    /// Distance between consecutive vertices in bytes
    pub fn byte_stride(&self) -> usize {
        self.stride * self.scalar.size_in_bytes()
    }

    /// Start of this attribute within a vertex in bytes
    pub fn byte_offset(&self) -> usize {
        self.offset * self.scalar.size_in_bytes()
    }

    /// Checks `offset + element_count <= stride` and a sane component count
    pub fn validate(&self) -> Result<()> {
        let fits = self.offset + self.element_count <= self.stride;
        if !fits || !(1..=4).contains(&self.element_count) {
            return Err(RenderError::InvalidAttributeLayout {
                semantic: self.semantic.to_string(),
                offset: self.offset,
                element_count: self.element_count,
                stride: self.stride,
            });
        }
        Ok(())
    }
}

/// Validates a full layout and returns its shared stride in elements
///
/// Every descriptor must fit its stride, all descriptors must agree on
/// the stride, and the summed extents may not exceed it.
pub fn validate_layout(descriptors: &[VertexAttributeDescriptor]) -> Result<usize> {
    let first = descriptors
        .first()
        .ok_or_else(|| RenderError::InvalidMesh("mesh has no vertex attributes".to_string()))?;

    for descriptor in descriptors {
        descriptor.validate()?;
        if descriptor.stride != first.stride {
            return Err(RenderError::InvalidMesh(format!(
                "attribute {} has stride {} but {} has stride {}",
                descriptor.semantic, descriptor.stride, first.semantic, first.stride
            )));
        }
    }

    let extent: usize = descriptors.iter().map(|d| d.element_count).sum();
    if extent > first.stride {
        return Err(RenderError::InvalidMesh(format!(
            "attributes span {} elements but the stride is {}",
            extent, first.stride
        )));
    }

    Ok(first.stride)
}

/// Position, normal and texture coordinates interleaved as 3 + 3 + 2 floats
pub fn position_normal_uv_layout() -> Vec<VertexAttributeDescriptor> {
    vec![
        VertexAttributeDescriptor::float(AttributeSemantic::Position, 3, 8, 0),
        VertexAttributeDescriptor::float(AttributeSemantic::Normal, 3, 8, 3),
        VertexAttributeDescriptor::float(AttributeSemantic::TexCoords, 2, 8, 6),
    ]
}

/// Position and texture coordinates interleaved as 3 + 2 floats
pub fn position_uv_layout() -> Vec<VertexAttributeDescriptor> {
    vec![
        VertexAttributeDescriptor::float(AttributeSemantic::Position, 3, 5, 0),
        VertexAttributeDescriptor::float(AttributeSemantic::TexCoords, 2, 5, 3),
    ]
}

/// Position and color interleaved as 3 + 3 floats
pub fn position_color_layout() -> Vec<VertexAttributeDescriptor> {
    vec![
        VertexAttributeDescriptor::float(AttributeSemantic::Position, 3, 6, 0),
        VertexAttributeDescriptor::float(AttributeSemantic::Color, 3, 6, 3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_stride_and_offset() {
        let layout = position_normal_uv_layout();
        for descriptor in &layout {
            assert!(descriptor.offset + descriptor.element_count <= descriptor.stride);
            assert_eq!(descriptor.byte_stride(), descriptor.stride * 4);
        }
        assert_eq!(layout[1].byte_offset(), 12);
        assert_eq!(layout[2].byte_offset(), 24);
    }

    #[test]
    fn test_semantic_slots() {
        assert_eq!(AttributeSemantic::Position.slot(), 0);
        assert_eq!(AttributeSemantic::Normal.slot(), 1);
        assert_eq!(AttributeSemantic::TexCoords.slot(), 2);
        assert_eq!(AttributeSemantic::Color.slot(), 3);
        assert_eq!(AttributeSemantic::Custom(7).slot(), 7);
    }

    #[test]
    fn test_descriptor_past_stride_is_rejected() {
        let descriptor = VertexAttributeDescriptor::float(AttributeSemantic::Normal, 3, 5, 3);
        assert!(matches!(
            descriptor.validate(),
            Err(RenderError::InvalidAttributeLayout { offset: 3, .. })
        ));
    }

    #[test]
    fn test_layout_with_mixed_strides_is_rejected() {
        let layout = vec![
            VertexAttributeDescriptor::float(AttributeSemantic::Position, 3, 8, 0),
            VertexAttributeDescriptor::float(AttributeSemantic::TexCoords, 2, 5, 3),
        ];
        assert!(matches!(validate_layout(&layout), Err(RenderError::InvalidMesh(_))));
    }

    #[test]
    fn test_overlapping_extent_is_rejected() {
        let layout = vec![
            VertexAttributeDescriptor::float(AttributeSemantic::Position, 3, 4, 0),
            VertexAttributeDescriptor::float(AttributeSemantic::Color, 3, 4, 1),
        ];
        assert!(validate_layout(&layout).is_err());
    }

    #[test]
    fn test_empty_layout_is_rejected() {
        assert!(validate_layout(&[]).is_err());
        assert_eq!(validate_layout(&position_uv_layout()).unwrap(), 5);
    }
}
