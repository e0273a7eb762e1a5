//! # Render Module
//!
//! Frame lifecycle plumbing: the [`FrameHost`]/[`FrameHandler`] pair that
//! separates window management from rendering, the [`RenderOrchestrator`]
//! that draws a scene each frame, and the global render state it applies
//! at load.

pub mod host;
pub mod orchestrator;
pub mod state;

pub use host::{FrameHandler, FrameHost, HeadlessHost};
pub use orchestrator::{RenderOrchestrator, SceneLoader};
pub use state::{apply_render_config, DriverInfo};
