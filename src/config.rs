//! # Configuration
//!
//! Plain configuration structs with sensible defaults and `with_*` builder
//! methods. Nothing here touches the graphics API; the values are applied by
//! the window runner, the render configurator and the camera.
//!
//! ```rust
//! use thistle::config::{RenderConfig, WindowConfig};
//! use thistle::gl::DepthFunc;
//!
//! let window = WindowConfig::default()
//!     .with_title("Lit scene")
//!     .with_size(1280, 720);
//! let render = RenderConfig::default()
//!     .with_clear_color([0.1, 0.1, 0.1, 1.0])
//!     .with_depth_func(DepthFunc::LessOrEqual);
//! ```

use cgmath::{Point3, Vector3};

use crate::gl::DepthFunc;

/// Window creation settings
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical blank when presenting
    pub vsync: bool,
    /// Bits of depth buffer requested from the display
    pub depth_bits: u8,
    /// Request a debug context so driver messages are produced
    pub debug_context: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "thistle".to_string(),
            width: 1200,
            height: 800,
            vsync: true,
            depth_bits: 24,
            debug_context: false,
        }
    }
}

impl WindowConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_debug_context(mut self, debug: bool) -> Self {
        self.debug_context = debug;
        self
    }
}

/// Driver-specific state applied when the vendor string matches
///
/// Some drivers have been observed to need a different depth function or
/// explicit face culling. These are opt-in and never applied by default.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorOverride {
    /// Substring matched against the vendor string
    pub vendor_contains: String,
    pub depth_func: Option<DepthFunc>,
    pub enable_face_culling: bool,
}

impl VendorOverride {
    pub fn new(vendor_contains: impl Into<String>) -> Self {
        Self {
            vendor_contains: vendor_contains.into(),
            depth_func: None,
            enable_face_culling: false,
        }
    }

    pub fn with_depth_func(mut self, func: DepthFunc) -> Self {
        self.depth_func = Some(func);
        self
    }

    pub fn with_face_culling(mut self) -> Self {
        self.enable_face_culling = true;
        self
    }

    pub fn matches(&self, vendor: &str) -> bool {
        vendor.contains(&self.vendor_contains)
    }
}

/// Global render state applied once at load
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    /// Cull back faces; meshes pick their front face per draw
    pub face_culling: bool,
    /// Rasterize polygon outlines only
    pub wireframe: bool,
    /// Run program validation before every draw
    pub validate_programs: bool,
    /// Route driver debug messages to the log and label native objects
    pub debug_output: bool,
    pub vendor_overrides: Vec<VendorOverride>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.5, 0.5, 0.5, 1.0],
            depth_test: true,
            depth_func: DepthFunc::Less,
            face_culling: true,
            wireframe: false,
            validate_programs: false,
            debug_output: false,
            vendor_overrides: Vec::new(),
        }
    }
}

impl RenderConfig {
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_depth_func(mut self, func: DepthFunc) -> Self {
        self.depth_func = func;
        self
    }

    pub fn with_face_culling(mut self, enabled: bool) -> Self {
        self.face_culling = enabled;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_program_validation(mut self, validate: bool) -> Self {
        self.validate_programs = validate;
        self
    }

    pub fn with_debug_output(mut self, enabled: bool) -> Self {
        self.debug_output = enabled;
        self
    }

    pub fn with_vendor_override(mut self, vendor_override: VendorOverride) -> Self {
        self.vendor_overrides.push(vendor_override);
        self
    }

    /// Whether back faces are culled on a driver reporting `vendor`
    ///
    /// A matching override can turn culling on but never off.
    pub fn face_culling_for(&self, vendor: &str) -> bool {
        self.face_culling
            || self
                .vendor_overrides
                .iter()
                .any(|o| o.enable_face_culling && o.matches(vendor))
    }
}

/// Initial camera placement and control tuning
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub position: Point3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Degrees; -90 looks down -Z
    pub yaw: f32,
    /// Degrees
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of rotation per pointer unit
    pub sensitivity: f32,
    /// World units per second
    pub move_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 3.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            min_zoom: 1.0,
            max_zoom: 45.0,
            near: 0.1,
            far: 100.0,
            sensitivity: 0.1,
            move_speed: 0.75,
        }
    }
}

impl CameraConfig {
    pub fn with_position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults() {
        let config = RenderConfig::default();
        assert!(config.depth_test);
        assert_eq!(config.depth_func, DepthFunc::Less);
        assert!(!config.wireframe);
        assert!(config.vendor_overrides.is_empty());
    }

    #[test]
    fn test_vendor_override_matching() {
        let nvidia = VendorOverride::new("NVIDIA").with_depth_func(DepthFunc::Greater);
        assert!(nvidia.matches("NVIDIA Corporation"));
        assert!(!nvidia.matches("AMD"));
        assert_eq!(nvidia.depth_func, Some(DepthFunc::Greater));
    }

    #[test]
    fn test_face_culling_for_vendor() {
        let config = RenderConfig::default()
            .with_face_culling(false)
            .with_vendor_override(VendorOverride::new("AMD").with_face_culling())
            .with_vendor_override(VendorOverride::new("Intel").with_depth_func(DepthFunc::LessOrEqual));
        assert!(config.face_culling_for("AMD Radeon"));
        assert!(!config.face_culling_for("Intel"));
        assert!(!config.face_culling_for("NVIDIA Corporation"));
        assert!(RenderConfig::default().face_culling_for("anything"));
        assert!(!RenderConfig::default().debug_output);
    }

    #[test]
    fn test_camera_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.position, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(config.yaw, -90.0);
        assert_eq!(config.zoom, 45.0);
        assert_eq!(config.sensitivity, 0.1);
    }

    #[test]
    fn test_builders_chain() {
        let window = WindowConfig::default()
            .with_title("demo")
            .with_size(640, 480)
            .with_debug_context(true);
        assert_eq!(window.title, "demo");
        assert!(window.debug_context);
        assert_eq!((window.width, window.height), (640, 480));

        let render = RenderConfig::default()
            .with_wireframe(true)
            .with_vendor_override(VendorOverride::new("AMD").with_face_culling());
        assert!(render.wireframe);
        assert!(render.vendor_overrides[0].enable_face_culling);
    }
}
