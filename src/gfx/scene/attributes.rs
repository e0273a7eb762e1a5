//! # Object Attributes
//!
//! Attributes write shading uniforms for one scene object right before it
//! is drawn. They run in attachment order while the object's program is in
//! use, so a later attribute may overwrite a uniform set by an earlier one.

use std::f64::consts::PI;

use cgmath::{EuclideanSpace, Vector3};

use super::object::DrawContext;
use crate::error::Result;
use crate::gfx::resources::ShaderProgram;

/// Writes extra uniforms for one object before its draw
pub trait ObjectAttribute {
    fn write_uniforms(&mut self, shader: &ShaderProgram, context: &DrawContext<'_>)
        -> Result<()>;
}

impl<F> ObjectAttribute for F
where
    F: FnMut(&ShaderProgram, &DrawContext<'_>) -> Result<()>,
{
    fn write_uniforms(
        &mut self,
        shader: &ShaderProgram,
        context: &DrawContext<'_>,
    ) -> Result<()> {
        self(shader, context)
    }
}

/// Constant-color Phong material in the `material` struct uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleMaterial {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for SimpleMaterial {
    fn default() -> Self {
        Self {
            ambient: Vector3::new(1.0, 0.5, 0.31),
            diffuse: Vector3::new(1.0, 0.5, 0.31),
            specular: Vector3::new(0.5, 0.5, 0.5),
            shininess: 32.0,
        }
    }
}

impl ObjectAttribute for SimpleMaterial {
    fn write_uniforms(&mut self, shader: &ShaderProgram, _: &DrawContext<'_>) -> Result<()> {
        shader.set_uniform("material.ambient", self.ambient)?;
        shader.set_uniform("material.diffuse", self.diffuse)?;
        shader.set_uniform("material.specular", self.specular)?;
        shader.set_uniform("material.shininess", self.shininess)
    }
}

/// Material sampling the mesh's diffuse map on unit 0 and specular map on
/// unit 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularWithTextureMaterial {
    pub shininess: f32,
}

impl Default for SpecularWithTextureMaterial {
    fn default() -> Self {
        Self { shininess: 32.0 }
    }
}

impl ObjectAttribute for SpecularWithTextureMaterial {
    fn write_uniforms(&mut self, shader: &ShaderProgram, _: &DrawContext<'_>) -> Result<()> {
        shader.set_sampler("material.diffuse", 0)?;
        shader.set_sampler("material.specular", 1)?;
        shader.set_uniform("material.shininess", self.shininess)
    }
}

/// Point light in the `light` struct uniform plus the viewer position in
/// `cameraPos`
///
/// Diffuse intensity is half the light color and ambient a fifth of that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LitByEmissive {
    pub light_position: Vector3<f32>,
    pub light_color: Vector3<f32>,
}

impl LitByEmissive {
    pub fn new(light_position: Vector3<f32>) -> Self {
        Self {
            light_position,
            light_color: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_color(mut self, color: Vector3<f32>) -> Self {
        self.light_color = color;
        self
    }

    pub fn diffuse(&self) -> Vector3<f32> {
        self.light_color * 0.5
    }

    pub fn ambient(&self) -> Vector3<f32> {
        self.diffuse() * 0.2
    }
}

impl ObjectAttribute for LitByEmissive {
    fn write_uniforms(&mut self, shader: &ShaderProgram, context: &DrawContext<'_>) -> Result<()> {
        shader.set_uniform("cameraPos", context.camera.position.to_vec())?;
        shader.set_uniform("light.position", self.light_position)?;
        shader.set_uniform("light.ambient", self.ambient())?;
        shader.set_uniform("light.diffuse", self.diffuse())?;
        shader.set_uniform("light.specular", Vector3::new(1.0f32, 1.0, 1.0))
    }
}

/// Flat object color lit by a single light: `objectColor`, `lightColor`
/// and `lightPos`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColoredByLight {
    pub object_color: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub light_position: Vector3<f32>,
}

impl ColoredByLight {
    pub fn new(light_position: Vector3<f32>) -> Self {
        Self {
            object_color: Vector3::new(1.0, 0.5, 0.31),
            light_color: Vector3::new(1.0, 1.0, 1.0),
            light_position,
        }
    }
}

impl ObjectAttribute for ColoredByLight {
    fn write_uniforms(&mut self, shader: &ShaderProgram, _: &DrawContext<'_>) -> Result<()> {
        shader.set_uniform("objectColor", self.object_color)?;
        shader.set_uniform("lightColor", self.light_color)?;
        shader.set_uniform("lightPos", self.light_position)
    }
}

/// Drives `uBlue` from 0 up to 1 and back once per second
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulsatingBlue;

impl PulsatingBlue {
    pub fn intensity(absolute_time: f64) -> f32 {
        (absolute_time.fract() * PI).sin() as f32
    }
}

impl ObjectAttribute for PulsatingBlue {
    fn write_uniforms(&mut self, shader: &ShaderProgram, context: &DrawContext<'_>) -> Result<()> {
        shader.set_uniform("uBlue", Self::intensity(context.absolute_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::gfx::camera::Camera;
    use crate::gl::{Gl, HeadlessBackend, UniformValue};
    use std::rc::Rc;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
void main() { gl_Position = vec4(aPos, 1.0); }
";
    const LIT_FRAGMENT: &str = "#version 330 core
struct Material {
    sampler2D diffuse;
    sampler2D specular;
    float shininess;
};
struct Light {
    vec3 position;
    vec3 ambient;
    vec3 diffuse;
    vec3 specular;
};
uniform Material material;
uniform Light light;
uniform vec3 cameraPos;
uniform float uBlue;
out vec4 FragColor;
void main() { FragColor = vec4(material.shininess); }
";

    fn lit_program() -> (Rc<HeadlessBackend>, ShaderProgram) {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let program = ShaderProgram::from_sources(&gl, "v", VERTEX, "lit.frag", LIT_FRAGMENT)
            .unwrap();
        program.use_program();
        (backend, program)
    }

    fn context(camera: &Camera, absolute_time: f64) -> DrawContext<'_> {
        DrawContext {
            delta_time: 0.0,
            absolute_time,
            camera,
            validate_program: false,
            face_culling: true,
        }
    }

    #[test]
    fn test_texture_material_points_at_units() {
        let (backend, program) = lit_program();
        let camera = Camera::default();

        SpecularWithTextureMaterial::default()
            .write_uniforms(&program, &context(&camera, 0.0))
            .unwrap();

        let handle = program.handle();
        assert_eq!(
            backend.uniform_value(handle, "material.diffuse"),
            Some(UniformValue::Int(0))
        );
        assert_eq!(
            backend.uniform_value(handle, "material.specular"),
            Some(UniformValue::Int(1))
        );
        assert_eq!(
            backend.uniform_value(handle, "material.shininess"),
            Some(UniformValue::Float(32.0))
        );
    }

    #[test]
    fn test_lit_by_emissive_writes_light_and_camera() {
        let (backend, program) = lit_program();
        let camera = Camera::default();

        LitByEmissive::new(Vector3::new(1.2, 1.0, 2.0))
            .write_uniforms(&program, &context(&camera, 0.0))
            .unwrap();

        let handle = program.handle();
        assert_eq!(
            backend.uniform_value(handle, "cameraPos"),
            Some(UniformValue::Vec3([0.0, 0.0, 3.0]))
        );
        assert_eq!(
            backend.uniform_value(handle, "light.diffuse"),
            Some(UniformValue::Vec3([0.5, 0.5, 0.5]))
        );
        assert_eq!(
            backend.uniform_value(handle, "light.specular"),
            Some(UniformValue::Vec3([1.0, 1.0, 1.0]))
        );
        assert!(backend.uniform_value(handle, "light.ambient").is_some());
    }

    #[test]
    fn test_simple_material_needs_vector_members() {
        let (_backend, program) = lit_program();
        let camera = Camera::default();

        // The lit shader has no material.ambient
        match SimpleMaterial::default().write_uniforms(&program, &context(&camera, 0.0)) {
            Err(RenderError::UnknownUniform { uniform, .. }) => {
                assert_eq!(uniform, "material.ambient")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_pulsating_blue_follows_time() {
        assert_eq!(PulsatingBlue::intensity(0.0), 0.0);
        assert!((PulsatingBlue::intensity(0.5) - 1.0).abs() < 1e-6);
        assert!((PulsatingBlue::intensity(3.5) - 1.0).abs() < 1e-6);

        let (backend, program) = lit_program();
        let camera = Camera::default();
        PulsatingBlue
            .write_uniforms(&program, &context(&camera, 0.5))
            .unwrap();
        assert!(matches!(
            backend.uniform_value(program.handle(), "uBlue"),
            Some(UniformValue::Float(v)) if (v - 1.0).abs() < 1e-6
        ));
    }

    #[test]
    fn test_closure_attribute() {
        let (backend, program) = lit_program();
        let camera = Camera::default();
        let mut calls = 0;

        {
            let mut attribute = |shader: &ShaderProgram, _: &DrawContext<'_>| {
                calls += 1;
                shader.set_uniform("uBlue", 0.25f32)
            };
            attribute
                .write_uniforms(&program, &context(&camera, 0.0))
                .unwrap();
        }

        assert_eq!(calls, 1);
        assert_eq!(
            backend.uniform_value(program.handle(), "uBlue"),
            Some(UniformValue::Float(0.25))
        );
    }
}
