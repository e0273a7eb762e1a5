//! # Scene Module
//!
//! Scene objects couple a mesh, a shader program and a transform. The
//! [`Scene`] draws them in insertion order through a shared camera.
//!
//! ## Key Components
//!
//! - [`Scene`] - Ordered object container with add/remove by [`ObjectId`]
//! - [`SceneObject`] - One drawable with attributes and an optional behavior
//! - [`ObjectAttribute`] - Writes shading uniforms before a draw
//! - [`TransformationBehavior`] - Overrides the transform each frame
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use thistle::gfx::scene::{LitByEmissive, RotationOnXY, SceneObject};
//! # fn build(mesh: Rc<thistle::gfx::mesh::MeshResource>,
//! #          shader: Rc<thistle::gfx::resources::ShaderProgram>) -> thistle::Result<()> {
//! let cube = SceneObject::new(mesh, shader)?
//!     .with_attribute(LitByEmissive::new(cgmath::Vector3::new(1.2, 1.0, 2.0)))
//!     .with_behavior(RotationOnXY::default());
//! # Ok(())
//! # }
//! ```

pub mod attributes;
pub mod behaviors;
pub mod object;
pub mod scene;

// Re-export main types
pub use attributes::{
    ColoredByLight, LitByEmissive, ObjectAttribute, PulsatingBlue, SimpleMaterial,
    SpecularWithTextureMaterial,
};
pub use behaviors::{Orbit, RotationOnXY, TransformationBehavior};
pub use object::{build_model_matrix, DrawContext, SceneObject, TransformResult, REQUIRED_UNIFORMS};
pub use scene::{ObjectId, Scene};
