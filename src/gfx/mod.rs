//! # Graphics Module
//!
//! Everything between the backend and the frame loop.
//!
//! - **Resources** ([`resources`]) - Buffers, vertex arrays, textures and
//!   shader programs, each owning one native handle
//! - **Meshes** ([`mesh`]) - CPU mesh descriptions and their uploaded form
//! - **Geometry** ([`geometry`]) - Procedural primitives
//! - **Camera** ([`camera`]) - Fly camera and its keyboard/pointer controller
//! - **Scene** ([`scene`]) - Scene objects, attributes, behaviors and the
//!   scene container

pub mod camera;
pub mod geometry;
pub mod mesh;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::Camera;
pub use scene::{Scene, SceneObject};
