use std::rc::Rc;

use cgmath::*;
use log::trace;

use super::attributes::ObjectAttribute;
use super::behaviors::TransformationBehavior;
use crate::error::{RenderError, Result};
use crate::gfx::camera::Camera;
use crate::gfx::mesh::MeshResource;
use crate::gfx::resources::ShaderProgram;

/// Uniforms every scene object shader must declare
pub const REQUIRED_UNIFORMS: [&str; 3] = ["uModel", "uView", "uProjection"];

/// Per-frame values handed to attributes and behaviors
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    /// Seconds since the previous frame
    pub delta_time: f64,
    /// Seconds since the frame loop started
    pub absolute_time: f64,
    pub camera: &'a Camera,
    /// Run program validation before drawing
    pub validate_program: bool,
    /// Cull back faces using each mesh's winding
    pub face_culling: bool,
}

/// Position, uniform scale and rotation of an object for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformResult {
    pub position: Vector3<f32>,
    pub scale: f32,
    pub rotation: Quaternion<f32>,
}

impl TransformResult {
    pub fn new(position: Vector3<f32>, scale: f32, rotation: Quaternion<f32>) -> Self {
        Self {
            position,
            scale,
            rotation,
        }
    }

    /// The object's stored transform, unchanged
    pub fn identity(object: &SceneObject) -> Self {
        Self::new(object.position, object.scale, object.rotation)
    }

    pub fn validate(&self) -> Result<()> {
        validate_position(self.position)?;
        validate_scale(self.scale)?;
        validate_rotation(self.rotation)
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        build_model_matrix(self.position, self.scale, self.rotation)
    }
}

/// `translate(position) * scale(scale) * rotate(rotation)`
///
/// Rotation and scale happen about the local origin before the object is
/// moved into place.
pub fn build_model_matrix(
    position: Vector3<f32>,
    scale: f32,
    rotation: Quaternion<f32>,
) -> Matrix4<f32> {
    Matrix4::from_translation(position) * Matrix4::from_scale(scale) * Matrix4::from(rotation)
}

fn validate_position(position: Vector3<f32>) -> Result<()> {
    if position.x.is_finite() && position.y.is_finite() && position.z.is_finite() {
        Ok(())
    } else {
        Err(RenderError::InvalidTransform(format!(
            "position {:?} is not finite",
            position
        )))
    }
}

fn validate_scale(scale: f32) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(RenderError::InvalidTransform(format!(
            "scale {} must be finite and greater than zero",
            scale
        )))
    }
}

fn validate_rotation(rotation: Quaternion<f32>) -> Result<()> {
    let magnitude = rotation.magnitude();
    if magnitude.is_finite() && magnitude > f32::EPSILON {
        Ok(())
    } else {
        Err(RenderError::InvalidTransform(format!(
            "rotation {:?} is not a usable quaternion",
            rotation
        )))
    }
}

/// A mesh drawn with a shader program at a transform
///
/// Attributes write extra uniforms before each draw, in the order they were
/// attached. A transformation behavior, if present, replaces the stored
/// transform every frame without modifying it.
pub struct SceneObject {
    position: Vector3<f32>,
    scale: f32,
    rotation: Quaternion<f32>,

    // Declaration order is release order
    shader: Rc<ShaderProgram>,
    mesh: Rc<MeshResource>,

    attributes: Vec<Box<dyn ObjectAttribute>>,
    behavior: Option<Box<dyn TransformationBehavior>>,
}

impl SceneObject {
    /// Couples `mesh` and `shader` at the origin with unit scale
    ///
    /// Fails with [`RenderError::MissingRequiredUniforms`] if the shader
    /// lacks any of [`REQUIRED_UNIFORMS`].
    pub fn new(mesh: Rc<MeshResource>, shader: Rc<ShaderProgram>) -> Result<Self> {
        let missing = shader.missing_uniforms(&REQUIRED_UNIFORMS);
        if !missing.is_empty() {
            return Err(RenderError::MissingRequiredUniforms { missing });
        }

        Ok(Self {
            position: Vector3::zero(),
            scale: 1.0,
            rotation: Quaternion::one(),
            shader,
            mesh,
            attributes: Vec::new(),
            behavior: None,
        })
    }

    pub fn with_attribute(mut self, attribute: impl ObjectAttribute + 'static) -> Self {
        self.add_attribute(Box::new(attribute));
        self
    }

    pub fn with_behavior(mut self, behavior: impl TransformationBehavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn with_transform(
        mut self,
        position: Vector3<f32>,
        scale: f32,
        rotation: Quaternion<f32>,
    ) -> Result<Self> {
        self.set_position(position)?;
        self.set_scale(scale)?;
        self.set_rotation(rotation)?;
        Ok(self)
    }

    pub fn add_attribute(&mut self, attribute: Box<dyn ObjectAttribute>) {
        self.attributes.push(attribute);
    }

    pub fn set_behavior(&mut self, behavior: Option<Box<dyn TransformationBehavior>>) {
        self.behavior = behavior;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> Quaternion<f32> {
        self.rotation
    }

    pub fn set_position(&mut self, position: Vector3<f32>) -> Result<()> {
        validate_position(position)?;
        self.position = position;
        Ok(())
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<()> {
        validate_scale(scale)?;
        self.scale = scale;
        Ok(())
    }

    /// Stores `rotation` normalized
    pub fn set_rotation(&mut self, rotation: Quaternion<f32>) -> Result<()> {
        validate_rotation(rotation)?;
        self.rotation = rotation.normalize();
        Ok(())
    }

    pub fn mesh(&self) -> &MeshResource {
        &self.mesh
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// The transform used for a draw at the given times
    pub fn resolve_transform(&self, delta_time: f64, absolute_time: f64) -> TransformResult {
        match &self.behavior {
            Some(behavior) => behavior.run(delta_time, absolute_time, self),
            None => TransformResult::identity(self),
        }
    }

    /// Draws the object and leaves no mesh, texture or program bound
    ///
    /// Binding state is restored even when an attribute or the draw fails.
    pub fn draw(&mut self, context: &DrawContext<'_>) -> Result<()> {
        if context.face_culling {
            self.mesh.apply_face_culling();
        }
        self.mesh.bind();
        self.shader.use_program();
        if let Some(texture) = self.mesh.diffuse_texture() {
            texture.bind(0);
        }
        if let Some(texture) = self.mesh.specular_texture() {
            texture.bind(1);
        }

        let result = self.draw_bound(context);

        self.mesh.unbind();
        if let Some(texture) = self.mesh.specular_texture() {
            texture.unbind(1);
        }
        if let Some(texture) = self.mesh.diffuse_texture() {
            texture.unbind(0);
        }
        self.shader.unuse();

        result
    }

    fn draw_bound(&mut self, context: &DrawContext<'_>) -> Result<()> {
        for attribute in self.attributes.iter_mut() {
            attribute.write_uniforms(&self.shader, context)?;
        }

        let transform = self.resolve_transform(context.delta_time, context.absolute_time);
        transform.validate()?;

        self.shader.set_uniform("uModel", transform.model_matrix())?;
        self.shader
            .set_uniform("uView", context.camera.view_matrix())?;
        self.shader
            .set_uniform("uProjection", context.camera.projection_matrix())?;

        if context.validate_program {
            self.shader.validate();
        }

        trace!(
            "Drawing object at {:?} with scale {}",
            transform.position,
            transform.scale
        );
        self.mesh.draw()
    }

    /// Releases the object's references to its shader and mesh
    pub fn dispose(self) {}
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("position", &self.position)
            .field("scale", &self.scale)
            .field("rotation", &self.rotation)
            .field("mesh", &self.mesh)
            .field("shader", &self.shader)
            .field("attributes", &self.attributes.len())
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::mesh::MeshTextures;
    use crate::gfx::resources::{Texture, TextureOptions};
    use crate::gl::{Deleted, DrawKind, Gl, HeadlessBackend, UniformValue, Winding};
    use rand::Rng;

    pub(crate) const OBJECT_VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
uniform mat4 uModel;
uniform mat4 uView;
uniform mat4 uProjection;
void main() { gl_Position = uProjection * uView * uModel * vec4(aPos, 1.0); }
";
    pub(crate) const OBJECT_FRAGMENT: &str = "#version 330 core
out vec4 FragColor;
uniform float uBlue;
void main() { FragColor = vec4(0.0, 0.0, uBlue, 1.0); }
";

    pub(crate) fn headless() -> (Rc<HeadlessBackend>, Gl) {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        (backend, gl)
    }

    pub(crate) fn cube_object(gl: &Gl) -> SceneObject {
        let mesh = Rc::new(MeshResource::new(gl, &generate_cube(), MeshTextures::default()).unwrap());
        let shader = Rc::new(
            ShaderProgram::from_sources(gl, "object.vert", OBJECT_VERTEX, "object.frag", OBJECT_FRAGMENT)
                .unwrap(),
        );
        SceneObject::new(mesh, shader).unwrap()
    }

    fn context(camera: &Camera) -> DrawContext<'_> {
        DrawContext {
            delta_time: 0.016,
            absolute_time: 1.0,
            camera,
            validate_program: false,
            face_culling: true,
        }
    }

    fn matrix_of(value: &UniformValue) -> Matrix4<f32> {
        match value {
            UniformValue::Mat4(m) => Matrix4::new(
                m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8], m[9], m[10], m[11], m[12],
                m[13], m[14], m[15],
            ),
            other => panic!("expected a matrix, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_uniforms() {
        let (backend, gl) = headless();
        let mesh = Rc::new(MeshResource::new(&gl, &generate_cube(), MeshTextures::default()).unwrap());
        let fragment = "#version 330 core\nout vec4 c;\nvoid main() { c = vec4(1.0); }\n";
        let vertex = "#version 330 core\nuniform mat4 uModel;\nvoid main() { gl_Position = uModel * vec4(0.0); }\n";
        let shader = Rc::new(ShaderProgram::from_sources(&gl, "v", vertex, "f", fragment).unwrap());

        match SceneObject::new(mesh, shader) {
            Err(RenderError::MissingRequiredUniforms { missing }) => {
                assert_eq!(missing, vec!["uView".to_string(), "uProjection".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(backend.draw_calls().is_empty());
    }

    #[test]
    fn test_draw_uploads_matrices_and_restores_bindings() {
        let (backend, gl) = headless();
        let mut object = cube_object(&gl)
            .with_transform(Vector3::new(1.0, 2.0, 3.0), 2.0, Quaternion::one())
            .unwrap();
        let camera = Camera::default();

        object.draw(&context(&camera)).unwrap();

        let calls = backend.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, DrawKind::Elements { count: 36 });
        assert_eq!(calls[0].front_face, Winding::CounterClockwise);
        assert!(calls[0].face_culling);

        let model = matrix_of(&calls[0].uniforms["uModel"]);
        assert_eq!(model, build_model_matrix(Vector3::new(1.0, 2.0, 3.0), 2.0, Quaternion::one()));
        assert_eq!(
            calls[0].uniforms["uView"],
            UniformValue::from(camera.view_matrix())
        );
        assert!(backend.binding_state().is_neutral());
    }

    #[test]
    fn test_textures_bound_on_units_during_draw() {
        let (backend, gl) = headless();
        let diffuse =
            Rc::new(Texture::from_raw(&gl, 1, 1, &[255; 4], TextureOptions::default()).unwrap());
        let specular =
            Rc::new(Texture::from_raw(&gl, 1, 1, &[0; 4], TextureOptions::default()).unwrap());
        let textures = MeshTextures {
            diffuse: Some(diffuse.clone()),
            specular: Some(specular.clone()),
        };
        let mesh = Rc::new(MeshResource::new(&gl, &generate_cube(), textures).unwrap());
        let shader = Rc::new(
            ShaderProgram::from_sources(&gl, "v", OBJECT_VERTEX, "f", OBJECT_FRAGMENT).unwrap(),
        );
        let mut object = SceneObject::new(mesh, shader).unwrap();
        let camera = Camera::default();

        object.draw(&context(&camera)).unwrap();

        let call = &backend.draw_calls()[0];
        assert_eq!(call.textures.get(&0), Some(&diffuse.handle()));
        assert_eq!(call.textures.get(&1), Some(&specular.handle()));
        let state = backend.binding_state();
        assert!(state.is_neutral());
        assert_eq!(state.active_unit, 0);
    }

    #[test]
    fn test_clockwise_mesh_sets_front_face() {
        let (backend, gl) = headless();
        let description = generate_cube().with_winding(Winding::Clockwise);
        let mesh = Rc::new(MeshResource::new(&gl, &description, MeshTextures::default()).unwrap());
        let shader = Rc::new(
            ShaderProgram::from_sources(&gl, "v", OBJECT_VERTEX, "f", OBJECT_FRAGMENT).unwrap(),
        );
        let mut object = SceneObject::new(mesh, shader).unwrap();
        let camera = Camera::default();

        object.draw(&context(&camera)).unwrap();

        assert_eq!(backend.draw_calls()[0].front_face, Winding::Clockwise);
        assert!(backend.fixed_function_state().face_culling);
    }

    #[test]
    fn test_culling_off_leaves_capability_alone() {
        let (backend, gl) = headless();
        let mut object = cube_object(&gl);
        let camera = Camera::default();
        let context = DrawContext {
            face_culling: false,
            ..context(&camera)
        };

        object.draw(&context).unwrap();

        assert!(!backend.draw_calls()[0].face_culling);
        assert!(!backend.fixed_function_state().face_culling);
    }

    #[test]
    fn test_validation_runs_before_draw_when_requested() {
        let (backend, gl) = headless();
        let mut object = cube_object(&gl);
        let program = object.shader().handle();
        let camera = Camera::default();

        object.draw(&context(&camera)).unwrap();
        assert_eq!(backend.draw_calls()[0].validations, 0);

        let validating = DrawContext {
            validate_program: true,
            ..context(&camera)
        };
        object.draw(&validating).unwrap();
        assert_eq!(backend.draw_calls()[1].validations, 1);
        assert_eq!(backend.validation_count(program), 1);
    }

    #[test]
    fn test_attribute_error_restores_bindings() {
        let (backend, gl) = headless();
        let mut object = cube_object(&gl).with_attribute(
            |shader: &ShaderProgram, _: &DrawContext<'_>| shader.set_uniform("uMissing", 1.0f32),
        );
        let camera = Camera::default();

        let result = object.draw(&context(&camera));

        assert!(matches!(result, Err(RenderError::UnknownUniform { .. })));
        assert!(backend.binding_state().is_neutral());
        assert!(backend.draw_calls().is_empty());
    }

    #[test]
    fn test_invalid_transform_rejected() {
        let (_backend, gl) = headless();
        let mut object = cube_object(&gl);

        assert!(matches!(
            object.set_scale(0.0),
            Err(RenderError::InvalidTransform(_))
        ));
        assert!(object.set_scale(-1.0).is_err());
        assert!(object.set_scale(f32::NAN).is_err());
        assert!(object
            .set_position(Vector3::new(f32::INFINITY, 0.0, 0.0))
            .is_err());
        assert!(object
            .set_rotation(Quaternion::new(0.0, 0.0, 0.0, 0.0))
            .is_err());

        assert_eq!(object.scale(), 1.0);
        assert_eq!(object.position(), Vector3::zero());
    }

    #[test]
    fn test_model_matrix_decomposes() {
        let matrix = build_model_matrix(Vector3::new(1.0, 2.0, 3.0), 2.0, Quaternion::one());
        assert_eq!(matrix.w.truncate(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(matrix.x.truncate().magnitude(), 2.0);
        assert_eq!(matrix.y.truncate().magnitude(), 2.0);
        assert_eq!(matrix.z.truncate().magnitude(), 2.0);
    }

    #[test]
    fn test_model_matrix_random_round_trip() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let position = Vector3::new(
                rng.random_range(-50.0..50.0f32),
                rng.random_range(-50.0..50.0f32),
                rng.random_range(-50.0..50.0f32),
            );
            let scale = rng.random_range(0.1..10.0f32);
            let axis = Vector3::new(
                rng.random_range(-1.0..1.0f32),
                rng.random_range(-1.0..1.0f32),
                rng.random_range(0.1..1.0f32),
            )
            .normalize();
            let rotation = Quaternion::from_axis_angle(axis, Deg(rng.random_range(0.0..360.0f32)));

            let matrix = build_model_matrix(position, scale, rotation);
            let translation = matrix.w.truncate();
            assert!((translation - position).magnitude() < 1e-4);
            for column in [matrix.x, matrix.y, matrix.z] {
                assert!((column.truncate().magnitude() - scale).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_dispose_releases_shared_resources_last() {
        let (backend, gl) = headless();
        let object = cube_object(&gl);
        let program = object.shader().handle();

        object.dispose();

        assert!(backend.live_handles().is_empty());
        assert_eq!(backend.invalid_deletes(), 0);
        assert!(backend
            .deletions()
            .contains(&Deleted::Program(program)));
    }
}
