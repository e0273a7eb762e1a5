//! Thistle 3D Renderer
//!
//! A small OpenGL scene renderer built on glow, glutin and winit. GPU
//! objects are owned by resource wrappers, drawables are composed from
//! attributes and behaviors, and a frame orchestrator drives the scene.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod gfx;
pub mod gl;
pub mod input;
pub mod logging;
pub mod prelude;
pub mod render;

// Re-export main types for convenience
pub use app::GlApp;
pub use error::{RenderError, Result};
pub use render::RenderOrchestrator;
