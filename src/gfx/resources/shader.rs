//! # Shader Programs
//!
//! A [`ShaderProgram`] is built from one vertex and one fragment stage.
//! Compile and link failures surface the driver's log verbatim together
//! with the file names involved. Stage objects only live until the program
//! is linked.
//!
//! Uniform locations are resolved lazily and cached per name. Writing to a
//! uniform the linked program does not expose is an error.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use log::{debug, trace, warn};

use crate::error::{RenderError, Result};
use crate::gl::{
    ensure_call_succeeded, label_object, Gl, ObjectName, ProgramHandle, ShaderHandle,
    ShaderStage, UniformLocation, UniformValue,
};

/// A compiled stage, deleted when dropped
struct StageObject {
    gl: Gl,
    handle: ShaderHandle,
}

impl StageObject {
    fn compile(gl: &Gl, stage: ShaderStage, name: &str, source: &str) -> Result<Self> {
        let handle = gl
            .create_shader(stage)
            .map_err(|reason| RenderError::ResourceCreation {
                resource: "shader",
                reason,
            })?;
        let object = Self {
            gl: gl.clone(),
            handle,
        };

        gl.shader_source(handle, source);
        gl.compile_shader(handle);
        if !gl.shader_compile_status(handle) {
            return Err(RenderError::ShaderCompile {
                stage,
                file: name.to_string(),
                log: gl.shader_info_log(handle),
            });
        }
        ensure_call_succeeded(gl.as_ref(), "glCompileShader")?;
        label_object(gl.as_ref(), ObjectName::Shader(handle), name)?;
        trace!("Compiled {} shader '{}'", stage, name);
        Ok(object)
    }
}

impl Drop for StageObject {
    fn drop(&mut self) {
        self.gl.delete_shader(self.handle);
    }
}

/// Owns one linked native program
pub struct ShaderProgram {
    gl: Gl,
    handle: ProgramHandle,
    vertex_name: String,
    fragment_name: String,
    uniform_cache: RefCell<HashMap<String, UniformLocation>>,
}

impl ShaderProgram {
    /// Reads, compiles and links a vertex and a fragment stage from disk
    pub fn from_files(
        gl: &Gl,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let vertex_source = std::fs::read_to_string(vertex_path)
            .map_err(|e| RenderError::from_io(e, vertex_path))?;
        let fragment_source = std::fs::read_to_string(fragment_path)
            .map_err(|e| RenderError::from_io(e, fragment_path))?;

        Self::from_sources(
            gl,
            &display_name(vertex_path),
            &vertex_source,
            &display_name(fragment_path),
            &fragment_source,
        )
    }

    /// Compiles and links in-memory sources
    ///
    /// # Arguments
    /// * `gl` - Backend to build on
    /// * `vertex_name` - Name reported for the vertex stage in errors
    /// * `vertex_source` - GLSL source of the vertex stage
    /// * `fragment_name` - Name reported for the fragment stage in errors
    /// * `fragment_source` - GLSL source of the fragment stage
    pub fn from_sources(
        gl: &Gl,
        vertex_name: &str,
        vertex_source: &str,
        fragment_name: &str,
        fragment_source: &str,
    ) -> Result<Self> {
        let vertex = StageObject::compile(gl, ShaderStage::Vertex, vertex_name, vertex_source)?;
        let fragment =
            StageObject::compile(gl, ShaderStage::Fragment, fragment_name, fragment_source)?;

        let handle = gl
            .create_program()
            .map_err(|reason| RenderError::ResourceCreation {
                resource: "program",
                reason,
            })?;
        let program = Self {
            gl: gl.clone(),
            handle,
            vertex_name: vertex_name.to_string(),
            fragment_name: fragment_name.to_string(),
            uniform_cache: RefCell::new(HashMap::new()),
        };

        gl.attach_shader(handle, vertex.handle);
        gl.attach_shader(handle, fragment.handle);
        gl.link_program(handle);
        let linked = gl.program_link_status(handle);
        let log = if linked {
            String::new()
        } else {
            gl.program_info_log(handle)
        };

        // Stage objects are not needed past this point either way
        gl.detach_shader(handle, vertex.handle);
        gl.detach_shader(handle, fragment.handle);

        if !linked {
            return Err(RenderError::ProgramLink {
                vertex: vertex_name.to_string(),
                fragment: fragment_name.to_string(),
                log,
            });
        }
        ensure_call_succeeded(gl.as_ref(), "glLinkProgram")?;
        label_object(
            gl.as_ref(),
            ObjectName::Program(handle),
            &format!("{vertex_name} + {fragment_name}"),
        )?;

        debug!(
            "Linked program {} ({}, {})",
            handle.raw(),
            vertex_name,
            fragment_name
        );
        Ok(program)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn vertex_name(&self) -> &str {
        &self.vertex_name
    }

    pub fn fragment_name(&self) -> &str {
        &self.fragment_name
    }

    /// Makes this the program in use
    pub fn use_program(&self) {
        self.gl.use_program(Some(self.handle));
    }

    /// Clears the program in use
    pub fn unuse(&self) {
        self.gl.use_program(None);
    }

    /// Resolves `name`, consulting the cache first
    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation> {
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return Ok(*location);
        }

        let location = self
            .gl
            .uniform_location(self.handle, name)
            .ok_or_else(|| RenderError::UnknownUniform {
                uniform: name.to_string(),
                vertex: self.vertex_name.clone(),
                fragment: self.fragment_name.clone(),
            })?;
        trace!("Program {}: '{}' -> {:?}", self.handle.raw(), name, location);
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_string(), location);
        Ok(location)
    }

    /// Whether the linked program exposes `name`
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniform_location(name).is_ok()
    }

    /// Names from `required` this program does not expose
    pub fn missing_uniforms(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_uniform(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Writes `value` to uniform `name`
    ///
    /// The program must be in use.
    pub fn set_uniform<V: Into<UniformValue>>(&self, name: &str, value: V) -> Result<()> {
        let location = self.uniform_location(name)?;
        self.gl.set_uniform(location, value.into());
        ensure_call_succeeded(self.gl.as_ref(), "glUniform")
    }

    /// Points sampler uniform `name` at texture unit `unit`
    pub fn set_sampler(&self, name: &str, unit: u32) -> Result<()> {
        self.set_uniform(name, unit as i32)
    }

    /// Runs the driver's program validation and logs a failure
    pub fn validate(&self) -> bool {
        let valid = self.gl.validate_program(self.handle);
        if !valid {
            warn!(
                "Program {} ({}, {}) failed validation: {}",
                self.handle.raw(),
                self.vertex_name,
                self.fragment_name,
                self.gl.program_info_log(self.handle)
            );
        }
        valid
    }

    /// Deletes the native program
    pub fn dispose(self) {}
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        debug!("Deleting program {}", self.handle.raw());
        self.gl.delete_program(self.handle);
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("vertex_name", &self.vertex_name)
            .field("fragment_name", &self.fragment_name)
            .finish()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessBackend;
    use std::rc::Rc;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
uniform mat4 uModel;
uniform mat4 uView;
uniform mat4 uProjection;
void main() { gl_Position = uProjection * uView * uModel * vec4(aPos, 1.0); }
";

    const FRAGMENT: &str = "#version 330 core
uniform vec3 uColor;
out vec4 FragColor;
void main() { FragColor = vec4(uColor, 1.0); }
";

    fn headless() -> (Rc<HeadlessBackend>, Gl) {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        (backend, gl)
    }

    #[test]
    fn test_link_deletes_stage_objects() {
        let (backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();

        let live = backend.live_handles();
        assert_eq!(live.programs, 1);
        assert_eq!(live.shaders, 0);
        assert_eq!(program.vertex_name(), "mvp.vert");
    }

    #[test]
    fn test_compile_error_names_stage_and_file() {
        let (backend, gl) = headless();
        let result =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "broken.frag", "out vec4 c;");
        match result {
            Err(RenderError::ShaderCompile { stage, file, log }) => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(file, "broken.frag");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(backend.live_handles().is_empty());
    }

    #[test]
    fn test_unknown_uniform_names_sources() {
        let (_backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();
        program.use_program();

        match program.set_uniform("uColour", 1.0f32) {
            Err(RenderError::UnknownUniform {
                uniform,
                vertex,
                fragment,
            }) => {
                assert_eq!(uniform, "uColour");
                assert_eq!(vertex, "mvp.vert");
                assert_eq!(fragment, "color.frag");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_set_uniform_writes_value() {
        let (backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();
        program.use_program();
        program.set_uniform("uColor", [0.5f32, 0.25, 1.0]).unwrap();

        assert_eq!(
            backend.uniform_value(program.handle(), "uColor"),
            Some(UniformValue::Vec3([0.5, 0.25, 1.0]))
        );
        // Second lookup hits the cache
        assert!(program.uniform_location("uColor").is_ok());
        assert_eq!(program.uniform_cache.borrow().len(), 1);
    }

    #[test]
    fn test_missing_uniforms_reports_absent_names() {
        let (_backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();
        assert!(program
            .missing_uniforms(&["uModel", "uView", "uProjection"])
            .is_empty());
        assert_eq!(program.missing_uniforms(&["uModel", "uTime"]), vec!["uTime"]);
    }

    #[test]
    fn test_from_files_reads_sources() {
        let (_backend, gl) = headless();
        let dir = tempfile::tempdir().unwrap();
        let vertex_path = dir.path().join("mvp.vert");
        let fragment_path = dir.path().join("color.frag");
        std::fs::write(&vertex_path, VERTEX).unwrap();
        std::fs::write(&fragment_path, FRAGMENT).unwrap();

        let program = ShaderProgram::from_files(&gl, &vertex_path, &fragment_path).unwrap();
        assert_eq!(program.fragment_name(), "color.frag");
        assert!(program.has_uniform("uColor"));
    }

    #[test]
    fn test_from_files_missing_source() {
        let (_backend, gl) = headless();
        let result = ShaderProgram::from_files(&gl, "nowhere/a.vert", "nowhere/b.frag");
        assert!(matches!(result, Err(RenderError::ResourceNotFound { .. })));
    }

    #[test]
    fn test_validate_linked_program() {
        let (backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();
        assert!(program.validate());
        assert_eq!(backend.validation_count(program.handle()), 1);
    }

    #[test]
    fn test_program_labeled_with_stage_names() {
        let (backend, gl) = headless();
        let program =
            ShaderProgram::from_sources(&gl, "mvp.vert", VERTEX, "color.frag", FRAGMENT).unwrap();
        assert_eq!(
            backend
                .label_of(ObjectName::Program(program.handle()))
                .as_deref(),
            Some("mvp.vert + color.frag")
        );
    }
}
