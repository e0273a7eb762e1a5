use cgmath::*;

use crate::config::CameraConfig;

/// Pitch is kept inside this range so the view never flips over the poles
pub const PITCH_LIMIT: f32 = 89.0;

/// First-person camera in a Y-up world
///
/// Orientation is stored as yaw and pitch in degrees; the front vector is
/// derived from them whenever they change. Zoom is the vertical field of
/// view in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    pub znear: f32,
    pub zfar: f32,
    aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.position,
            front: config.front.normalize(),
            up: config.up.normalize(),
            yaw: config.yaw,
            pitch: config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            zoom: config.zoom.clamp(config.min_zoom, config.max_zoom),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            znear: config.near,
            zfar: config.far,
            aspect: 1.0,
        }
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    /// Unit vector pointing to the camera's right
    pub fn right(&self) -> Vector3<f32> {
        self.front.cross(self.up).normalize()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    /// Updates the aspect ratio from a framebuffer size
    ///
    /// A zero-sized framebuffer (minimized window) keeps the previous ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    /// Turns the camera by the given yaw and pitch deltas in degrees
    ///
    /// Pitch is clamped to ±[`PITCH_LIMIT`] and the front vector is
    /// recomputed from the new angles.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_front();
    }

    /// Narrows the field of view for positive scroll, clamped to the
    /// configured zoom range
    pub fn scroll_zoom(&mut self, delta: f32) {
        self.zoom = (self.zoom - delta).clamp(self.min_zoom, self.max_zoom);
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.position += offset;
    }

    /// Right-handed look-at from the position along the front vector
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection using the zoom as vertical field of view
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        perspective(Deg(self.zoom), self.aspect, self.znear, self.zfar)
    }

    fn update_front(&mut self) {
        let yaw = Deg(self.yaw);
        let pitch = Deg(self.pitch);
        let direction = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = direction.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_default_orientation() {
        let camera = Camera::default();
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.front(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.up(), Vector3::unit_y());
        assert_eq!(camera.zoom(), 45.0);
        assert!((camera.right() - Vector3::unit_x()).magnitude() < EPSILON);
    }

    #[test]
    fn test_view_matrix_looks_along_front() {
        let camera = Camera::default();
        let expected = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(0.0, 0.0, 2.0),
            Vector3::unit_y(),
        );
        assert_eq!(camera.view_matrix(), expected);

        // The origin lands three units in front of the eye
        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.z + 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_projection_uses_aspect_and_zoom() {
        let mut camera = Camera::default();
        camera.set_viewport(800, 600);
        let expected = perspective(Deg(45.0), 800.0 / 600.0, 0.1, 100.0);
        assert_eq!(camera.projection_matrix(), expected);
    }

    #[test]
    fn test_zero_viewport_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_viewport(1600, 800);
        camera.set_viewport(0, 800);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 500.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
        assert!((camera.front().magnitude() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_rotate_recomputes_front() {
        let mut camera = Camera::default();
        camera.rotate(90.0, 0.0);
        // Yaw 0 looks down +X
        assert!((camera.front() - Vector3::unit_x()).magnitude() < EPSILON);
    }

    #[test]
    fn test_scroll_zoom_clamps() {
        let mut camera = Camera::default();
        camera.scroll_zoom(10.0);
        assert_eq!(camera.zoom(), 35.0);
        camera.scroll_zoom(-100.0);
        assert_eq!(camera.zoom(), 45.0);
        camera.scroll_zoom(100.0);
        assert_eq!(camera.zoom(), 1.0);
    }
}
