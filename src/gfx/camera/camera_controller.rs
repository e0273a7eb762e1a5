use log::trace;
use winit::keyboard::KeyCode;

use super::fly_camera::Camera;
use crate::config::CameraConfig;
use crate::input::{KeyboardState, PointerEvent};

/// Drives a [`Camera`] from held keys and pointer events
///
/// W/S move along the front vector, A/D strafe, Space and left Control
/// move along the up vector. Pointer motion turns the camera and the
/// wheel zooms.
#[derive(Debug, Clone)]
pub struct CameraController {
    pub sensitivity: f32,
    pub move_speed: f32,
    last_pointer: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new(sensitivity: f32, move_speed: f32) -> Self {
        Self {
            sensitivity,
            move_speed,
            last_pointer: None,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.sensitivity, config.move_speed)
    }

    /// Moves the camera for every held movement key
    ///
    /// # Arguments
    /// * `delta_time` - Seconds since the previous update
    /// * `keys` - Current keyboard state
    /// * `camera` - Camera to move
    pub fn update(&self, delta_time: f32, keys: &dyn KeyboardState, camera: &mut Camera) {
        let step = self.move_speed * delta_time;
        let front = camera.front();
        let right = camera.right();
        let up = camera.up();

        if keys.is_pressed(KeyCode::KeyW) {
            camera.translate(front * step);
        }
        if keys.is_pressed(KeyCode::KeyS) {
            camera.translate(-front * step);
        }
        if keys.is_pressed(KeyCode::KeyA) {
            camera.translate(-right * step);
        }
        if keys.is_pressed(KeyCode::KeyD) {
            camera.translate(right * step);
        }
        if keys.is_pressed(KeyCode::Space) {
            camera.translate(up * step);
        }
        if keys.is_pressed(KeyCode::ControlLeft) {
            camera.translate(-up * step);
        }
    }

    pub fn process_pointer_event(&mut self, event: &PointerEvent, camera: &mut Camera) {
        match *event {
            PointerEvent::Moved { x, y } => self.pointer_moved(x, y, camera),
            PointerEvent::Scrolled { delta } => camera.scroll_zoom(delta),
            PointerEvent::FocusLost => self.reset_pointer(),
        }
    }

    /// Turns the camera by the pointer offset since the previous position
    ///
    /// The first position after construction or a reset only records the
    /// baseline so the view does not jump.
    pub fn pointer_moved(&mut self, x: f64, y: f64, camera: &mut Camera) {
        let Some((last_x, last_y)) = self.last_pointer.replace((x, y)) else {
            return;
        };

        let dx = (x - last_x) as f32 * self.sensitivity;
        // Window y grows downwards
        let dy = (y - last_y) as f32 * self.sensitivity;
        camera.rotate(dx, -dy);
        trace!(
            "Camera yaw {:.1}, pitch {:.1}",
            camera.yaw(),
            camera.pitch()
        );
    }

    /// Forgets the pointer baseline
    pub fn reset_pointer(&mut self) {
        self.last_pointer = None;
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use cgmath::{InnerSpace, Point3, Vector3};

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_first_move_sets_baseline() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();

        controller.pointer_moved(400.0, 300.0, &mut camera);
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.front(), Vector3::new(0.0, 0.0, -1.0));

        controller.pointer_moved(410.0, 290.0, &mut camera);
        assert!((camera.yaw() - -89.0).abs() < EPSILON);
        assert!((camera.pitch() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_focus_loss_resets_baseline() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();

        controller.process_pointer_event(&PointerEvent::Moved { x: 0.0, y: 0.0 }, &mut camera);
        controller.process_pointer_event(&PointerEvent::FocusLost, &mut camera);
        controller.process_pointer_event(
            &PointerEvent::Moved {
                x: 500.0,
                y: 500.0,
            },
            &mut camera,
        );
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn test_scroll_changes_zoom() {
        let mut controller = CameraController::default();
        let mut camera = Camera::default();
        controller.process_pointer_event(&PointerEvent::Scrolled { delta: 5.0 }, &mut camera);
        assert_eq!(camera.zoom(), 40.0);
    }

    #[test]
    fn test_keys_move_camera() {
        let controller = CameraController::new(0.1, 2.0);
        let mut camera = Camera::default();
        let mut keys = InputState::new();

        keys.press(KeyCode::KeyW);
        controller.update(0.5, &keys, &mut camera);
        assert!((camera.position - Point3::new(0.0, 0.0, 2.0)).magnitude() < EPSILON);

        keys.release(KeyCode::KeyW);
        keys.press(KeyCode::KeyD);
        keys.press(KeyCode::Space);
        controller.update(0.5, &keys, &mut camera);
        assert!((camera.position - Point3::new(1.0, 1.0, 2.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_no_keys_no_motion() {
        let controller = CameraController::default();
        let mut camera = Camera::default();
        controller.update(1.0, &InputState::new(), &mut camera);
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 3.0));
    }
}
