// src/gfx/resources/mod.rs
//! GPU resource wrappers
//!
//! Buffers, vertex arrays, textures and shader programs. Each wrapper owns
//! exactly one native handle, performs its full setup in the constructor
//! and deletes the handle once when dropped.

pub mod buffer;
pub mod shader;
pub mod texture;
pub mod vertex_array;
pub mod vertex_layout;

// Re-export main types
pub use buffer::GpuBuffer;
pub use shader::ShaderProgram;
pub use texture::{Texture, TextureOptions};
pub use vertex_array::VertexArray;
pub use vertex_layout::{validate_layout, AttributeSemantic, VertexAttributeDescriptor};
