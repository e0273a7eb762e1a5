//! # Thistle Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use thistle::prelude::*;
//!
//! fn main() -> Result<()> {
//!     init_logging(LoggingConfig::default());
//!     let orchestrator = RenderOrchestrator::new(|_gl: &Gl, camera| -> Result<Scene> {
//!         Ok(Scene::new(camera))
//!     });
//!     GlApp::new(WindowConfig::default(), orchestrator).run()
//! }
//! ```

// Application and configuration
pub use crate::app::GlApp;
pub use crate::config::{CameraConfig, RenderConfig, VendorOverride, WindowConfig};
pub use crate::error::{RenderError, Result};
pub use crate::logging::{init_logging, LoggingConfig};

// Backend
pub use crate::gl::{Gl, GlBackend, Winding};

// Resources and meshes
pub use crate::assets::{load_obj, upload_meshes, TextureCache};
pub use crate::gfx::camera::{Camera, CameraController};
pub use crate::gfx::geometry::{generate_cube, generate_plane, generate_sphere};
pub use crate::gfx::mesh::{MeshDescription, MeshResource, MeshTextures};
pub use crate::gfx::resources::{ShaderProgram, Texture, TextureOptions};

// Scene graph
pub use crate::gfx::scene::{
    ColoredByLight, LitByEmissive, ObjectAttribute, ObjectId, Orbit, PulsatingBlue,
    RotationOnXY, Scene, SceneObject, SimpleMaterial, SpecularWithTextureMaterial,
    TransformResult, TransformationBehavior,
};

// Frame lifecycle
pub use crate::render::{FrameHandler, FrameHost, RenderOrchestrator};

// Common math types
pub use cgmath::{Deg, Point3, Quaternion, Rotation3, Vector3};
