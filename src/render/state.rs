//! Global render state applied once after the context is created

use log::{info, warn};

use crate::config::RenderConfig;
use crate::error::Result;
use crate::gl::{ensure_call_succeeded, Capability, Face, GlBackend, PolygonMode};

/// Strings identifying the driver behind the context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

impl DriverInfo {
    pub fn query(gl: &dyn GlBackend) -> Self {
        Self {
            vendor: gl.vendor(),
            renderer: gl.renderer(),
            version: gl.version(),
        }
    }
}

impl std::fmt::Display for DriverInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} / {}", self.vendor, self.renderer, self.version)
    }
}

/// Applies depth testing, culling, polygon mode, clear color, debug output
/// and any vendor override matching `driver`
///
/// Overrides are applied in order after the base settings, so a later
/// matching override wins. Culling follows
/// [`RenderConfig::face_culling_for`].
pub fn apply_render_config(
    gl: &dyn GlBackend,
    config: &RenderConfig,
    driver: &DriverInfo,
) -> Result<()> {
    if config.depth_test {
        gl.enable(Capability::DepthTest);
        gl.depth_func(config.depth_func);
    } else {
        gl.disable(Capability::DepthTest);
    }

    if config.face_culling_for(&driver.vendor) {
        gl.enable(Capability::CullFace);
    } else {
        gl.disable(Capability::CullFace);
    }

    let mode = if config.wireframe {
        PolygonMode::Line
    } else {
        PolygonMode::Fill
    };
    gl.polygon_mode(Face::FrontAndBack, mode);

    let [r, g, b, a] = config.clear_color;
    gl.clear_color(r, g, b, a);

    for vendor_override in config
        .vendor_overrides
        .iter()
        .filter(|o| o.matches(&driver.vendor))
    {
        info!(
            "Applying render overrides for vendor '{}'",
            vendor_override.vendor_contains
        );
        if let Some(func) = vendor_override.depth_func {
            gl.depth_func(func);
        }
    }

    if config.debug_output {
        if gl.set_debug_output(true) {
            info!("Driver debug output enabled");
        } else {
            warn!("Debug output requested but the context has no debug support");
        }
    }

    ensure_call_succeeded(gl, "render state setup")
}
