//! # Transformation Behaviors
//!
//! A behavior computes an object's transform for the current frame from the
//! frame times and the object's stored transform. The stored transform is
//! never modified, so removing a behavior puts the object back where it was.

use cgmath::*;

use super::object::{SceneObject, TransformResult};

/// Per-frame transform override
pub trait TransformationBehavior {
    fn run(&self, delta_time: f64, absolute_time: f64, object: &SceneObject) -> TransformResult;
}

impl<F> TransformationBehavior for F
where
    F: Fn(f64, f64, &SceneObject) -> TransformResult,
{
    fn run(&self, delta_time: f64, absolute_time: f64, object: &SceneObject) -> TransformResult {
        self(delta_time, absolute_time, object)
    }
}

/// Tumbles the object about X and Y at the same rate
///
/// The angle is `absolute_time * degrees_per_second`; the X rotation is
/// applied first, then the Y rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationOnXY {
    pub degrees_per_second: f32,
}

impl Default for RotationOnXY {
    fn default() -> Self {
        Self {
            degrees_per_second: 100.0,
        }
    }
}

impl RotationOnXY {
    pub fn rotation_at(&self, absolute_time: f64) -> Quaternion<f32> {
        let angle = Deg((absolute_time * self.degrees_per_second as f64) as f32);
        Quaternion::from_angle_y(angle) * Quaternion::from_angle_x(angle)
    }
}

impl TransformationBehavior for RotationOnXY {
    fn run(&self, _: f64, absolute_time: f64, object: &SceneObject) -> TransformResult {
        TransformResult::new(
            object.position(),
            object.scale(),
            self.rotation_at(absolute_time),
        )
    }
}

/// Circles the object around `center` in the XZ plane
///
/// The stored position is ignored; scale and rotation are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub center: Vector3<f32>,
    pub radius: f32,
    pub degrees_per_second: f32,
}

impl Orbit {
    pub fn new(center: Vector3<f32>, radius: f32, degrees_per_second: f32) -> Self {
        Self {
            center,
            radius,
            degrees_per_second,
        }
    }

    pub fn position_at(&self, absolute_time: f64) -> Vector3<f32> {
        let angle: Rad<f32> = Deg((absolute_time * self.degrees_per_second as f64) as f32).into();
        self.center + Vector3::new(angle.cos(), 0.0, angle.sin()) * self.radius
    }
}

impl TransformationBehavior for Orbit {
    fn run(&self, _: f64, absolute_time: f64, object: &SceneObject) -> TransformResult {
        TransformResult::new(
            self.position_at(absolute_time),
            object.scale(),
            object.rotation(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::object::tests::{cube_object, headless};

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rotation_on_xy_at_zero_is_identity() {
        let rotation = RotationOnXY::default().rotation_at(0.0);
        assert!((rotation - Quaternion::one()).magnitude() < EPSILON);
    }

    #[test]
    fn test_rotation_on_xy_applies_x_then_y() {
        // 0.9 s at 100 deg/s is 90 degrees about each axis
        let rotation = RotationOnXY::default().rotation_at(0.9);
        // +Y turns to +Z about X, then +Z turns to +X about Y
        let rotated = rotation.rotate_vector(Vector3::unit_y());
        assert!((rotated - Vector3::unit_x()).magnitude() < 1e-4);
    }

    #[test]
    fn test_rotation_keeps_stored_transform() {
        let (_backend, gl) = headless();
        let object = cube_object(&gl)
            .with_transform(Vector3::new(1.0, 0.0, 0.0), 3.0, Quaternion::one())
            .unwrap()
            .with_behavior(RotationOnXY::default());

        let result = object.resolve_transform(0.016, 0.45);
        assert_eq!(result.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(result.scale, 3.0);
        assert_eq!(object.rotation(), Quaternion::one());
        assert!((result.rotation.magnitude() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_orbit_position() {
        let orbit = Orbit::new(Vector3::new(0.0, 1.0, 0.0), 2.0, 90.0);
        assert!((orbit.position_at(0.0) - Vector3::new(2.0, 1.0, 0.0)).magnitude() < EPSILON);
        assert!((orbit.position_at(1.0) - Vector3::new(0.0, 1.0, 2.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_closure_behavior() {
        let (_backend, gl) = headless();
        let object = cube_object(&gl).with_behavior(|_: f64, t: f64, o: &SceneObject| {
            TransformResult::new(Vector3::new(t as f32, 0.0, 0.0), o.scale(), o.rotation())
        });

        assert_eq!(
            object.resolve_transform(0.0, 4.0).position,
            Vector3::new(4.0, 0.0, 0.0)
        );
    }
}
