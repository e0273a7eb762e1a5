//! # Graphics API Backend
//!
//! Every native graphics call made by the renderer goes through the
//! [`GlBackend`] trait. The trait mirrors the subset of OpenGL 3.3 core the
//! renderer needs and keeps the API's global binding model visible: buffers
//! are bound per target, the element buffer binding lives inside the bound
//! vertex array, textures are bound per unit, and uniforms are written to the
//! program currently in use.
//!
//! ## Backends
//!
//! - [`GlowBackend`] drives a real context through `glow`.
//! - [`HeadlessBackend`] emulates the binding state machine in memory. It
//!   records draw calls, uniform writes and live handles so the resource
//!   layer can be exercised without a display.
//!
//! ## Error checking
//!
//! Calls that can fail are followed by [`ensure_call_succeeded`], which polls
//! the backend's error flag and turns a raised code into
//! [`RenderError::NativeCall`].
//!
//! ## Debugging
//!
//! Contexts with debug support accept object labels, applied through
//! [`label_object`], and deliver driver messages once
//! [`set_debug_output`](GlBackend::set_debug_output) is on.

pub mod glow_backend;
pub mod headless;

use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use cgmath::{Matrix4, Vector3, Vector4};

use crate::error::{RenderError, Result};

pub use glow_backend::GlowBackend;
pub use headless::{
    BindingState, Deleted, DrawCall, DrawKind, FixedFunctionState, HeadlessBackend, LiveHandles,
};

/// Shared handle to the active backend
pub type Gl = Rc<dyn GlBackend>;

pub const INVALID_ENUM: u32 = 0x0500;
pub const INVALID_VALUE: u32 = 0x0501;
pub const INVALID_OPERATION: u32 = 0x0502;
pub const OUT_OF_MEMORY: u32 = 0x0505;
pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;

/// Human readable name of a GL error code
pub fn error_code_name(code: u32) -> &'static str {
    match code {
        INVALID_ENUM => "GL_INVALID_ENUM",
        INVALID_VALUE => "GL_INVALID_VALUE",
        INVALID_OPERATION => "GL_INVALID_OPERATION",
        OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "unknown GL error",
    }
}

/// Polls the backend error flag after `call` and fails if a code was raised
pub fn ensure_call_succeeded(gl: &dyn GlBackend, call: &'static str) -> Result<()> {
    match gl.get_error() {
        None => Ok(()),
        Some(code) => {
            log::error!("{call} raised {} (0x{code:04X})", error_code_name(code));
            Err(RenderError::NativeCall { call, code })
        }
    }
}

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw native name of the object
            pub fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

handle_type!(
    /// Native buffer object name
    BufferHandle
);
handle_type!(
    /// Native vertex array object name
    VertexArrayHandle
);
handle_type!(
    /// Native texture object name
    TextureHandle
);
handle_type!(
    /// Native shader stage object name
    ShaderHandle
);
handle_type!(
    /// Native program object name
    ProgramHandle
);

/// A native object that can carry a debug label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectName {
    Buffer(BufferHandle),
    VertexArray(VertexArrayHandle),
    Texture(TextureHandle),
    Shader(ShaderHandle),
    Program(ProgramHandle),
}

impl ObjectName {
    pub fn raw(self) -> u32 {
        match self {
            ObjectName::Buffer(h) => h.raw(),
            ObjectName::VertexArray(h) => h.raw(),
            ObjectName::Texture(h) => h.raw(),
            ObjectName::Shader(h) => h.raw(),
            ObjectName::Program(h) => h.raw(),
        }
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ObjectName::Buffer(_) => "buffer",
            ObjectName::VertexArray(_) => "vertex array",
            ObjectName::Texture(_) => "texture",
            ObjectName::Shader(_) => "shader",
            ObjectName::Program(_) => "program",
        };
        write!(f, "{} #{}", kind, self.raw())
    }
}

/// Attaches `label` to `object` for debuggers and driver messages
///
/// Labels longer than the driver accepts are cut at a character boundary.
/// Does nothing on contexts without label support.
pub fn label_object(gl: &dyn GlBackend, object: ObjectName, label: &str) -> Result<()> {
    let max_length = gl.max_label_length();
    if max_length == 0 {
        return Ok(());
    }
    let label = truncate_label(label, max_length - 1);
    gl.object_label(object, label);
    ensure_call_succeeded(gl, "glObjectLabel")?;
    log::debug!("Labeled {object} as '{label}'");
    Ok(())
}

fn truncate_label(label: &str, max_bytes: usize) -> &str {
    if label.len() <= max_bytes {
        return label;
    }
    let mut end = max_bytes;
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    &label[..end]
}

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Binding target of a buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex data (`GL_ARRAY_BUFFER`)
    Vertex,
    /// Triangle indices (`GL_ELEMENT_ARRAY_BUFFER`)
    Index,
}

impl fmt::Display for BufferTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferTarget::Vertex => write!(f, "vertex"),
            BufferTarget::Index => write!(f, "index"),
        }
    }
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Scalar component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Float,
    Int,
    UnsignedInt,
    UnsignedByte,
}

impl ScalarType {
    /// Size of one element in bytes
    pub fn size_in_bytes(self) -> usize {
        match self {
            ScalarType::Float | ScalarType::Int | ScalarType::UnsignedInt => 4,
            ScalarType::UnsignedByte => 1,
        }
    }
}

/// Server-side capability toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Vertex ordering that marks a triangle as front facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Winding {
    Clockwise,
    #[default]
    CounterClockwise,
}

/// Polygon face selector for culling and polygon mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

/// Rasterization mode for polygons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

/// One sampling parameter of the bound 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    WrapS(TextureWrap),
    WrapT(TextureWrap),
    MinFilter(TextureFilter),
    MagFilter(TextureFilter),
    BaseLevel(i32),
    MaxLevel(i32),
}

/// Value written to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        UniformValue::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        UniformValue::Vec4(value.into())
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        let columns: [[f32; 4]; 4] = value.into();
        let mut flat = [0.0; 16];
        for (i, column) in columns.iter().enumerate() {
            flat[i * 4..i * 4 + 4].copy_from_slice(column);
        }
        UniformValue::Mat4(flat)
    }
}

/// The subset of OpenGL the renderer drives
///
/// Methods take `&self`: the underlying API is a single-threaded state
/// machine, and implementors keep any bookkeeping behind interior
/// mutability. Creation calls return `Err` with the driver's reason when no
/// object could be allocated; all other failures are reported through
/// [`get_error`](GlBackend::get_error).
pub trait GlBackend {
    // Buffers
    fn create_buffer(&self) -> std::result::Result<BufferHandle, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Uploads `data` to the buffer bound at `target` with static usage
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferHandle);

    // Vertex arrays
    fn create_vertex_array(&self) -> std::result::Result<VertexArrayHandle, String>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Byte `stride` and byte `offset` into the bound vertex buffer
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        scalar: ScalarType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    // Textures
    fn create_texture(&self) -> std::result::Result<TextureHandle, String>;
    /// Selects texture unit `unit` (0-based)
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<TextureHandle>);
    /// Allocates RGBA8 storage for level 0 of the bound texture
    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: Option<&[u8]>);
    /// Writes an RGBA8 region of level 0 of the bound texture
    fn tex_sub_image_rgba8(&self, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]);
    fn tex_parameter(&self, parameter: TextureParameter);
    fn generate_mipmap(&self);
    fn delete_texture(&self, texture: TextureHandle);

    // Shader stages
    fn create_shader(&self, stage: ShaderStage) -> std::result::Result<ShaderHandle, String>;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    // Programs
    fn create_program(&self) -> std::result::Result<ProgramHandle, String>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    /// Checks whether `program` can execute in the current state
    fn validate_program(&self, program: ProgramHandle) -> bool;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn delete_program(&self, program: ProgramHandle);
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    /// Writes to the program currently in use
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    // Fixed-function state
    fn enable(&self, capability: Capability);
    fn disable(&self, capability: Capability);
    fn depth_func(&self, func: DepthFunc);
    fn front_face(&self, winding: Winding);
    fn cull_face(&self, face: Face);
    fn polygon_mode(&self, face: Face, mode: PolygonMode);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&self, color: bool, depth: bool);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    // Drawing, triangles only
    fn draw_arrays(&self, first: i32, count: i32);
    /// Draws `count` `u32` indices from the bound element buffer
    fn draw_elements(&self, count: i32);

    // Queries
    /// Pops the oldest pending error code, if any
    fn get_error(&self) -> Option<u32>;
    fn vendor(&self) -> String;
    fn renderer(&self) -> String;
    fn version(&self) -> String;

    // Debugging
    /// Longest accepted object label including the terminator, 0 when
    /// labels are unsupported
    fn max_label_length(&self) -> usize;
    fn object_label(&self, object: ObjectName, label: &str);
    /// Starts or stops delivery of driver debug messages
    ///
    /// Returns false when the context has no debug support.
    fn set_debug_output(&self, enabled: bool) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn test_ensure_call_succeeded_reports_code() {
        let gl = HeadlessBackend::new();
        assert!(ensure_call_succeeded(&gl, "glClear").is_ok());

        gl.inject_error(INVALID_VALUE);
        match ensure_call_succeeded(&gl, "glClear") {
            Err(RenderError::NativeCall { call, code }) => {
                assert_eq!(call, "glClear");
                assert_eq!(code, INVALID_VALUE);
            }
            other => panic!("expected native call error, got {other:?}"),
        }

        // The error flag is cleared once read
        assert!(ensure_call_succeeded(&gl, "glClear").is_ok());
    }

    #[test]
    fn test_matrix_uniform_is_column_major() {
        let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        match UniformValue::from(m) {
            UniformValue::Mat4(flat) => {
                assert_eq!(&flat[12..15], &[1.0, 2.0, 3.0]);
                assert_eq!(flat[15], 1.0);
            }
            other => panic!("unexpected value {other:?}"),
        }

        assert_eq!(
            UniformValue::from(Matrix4::<f32>::identity()),
            UniformValue::Mat4([
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0
            ])
        );
    }

    #[test]
    fn test_scalar_sizes() {
        assert_eq!(ScalarType::Float.size_in_bytes(), 4);
        assert_eq!(ScalarType::UnsignedInt.size_in_bytes(), 4);
        assert_eq!(ScalarType::UnsignedByte.size_in_bytes(), 1);
    }

    #[test]
    fn test_label_object_records_label() {
        let gl = HeadlessBackend::new();
        let buffer = gl.create_buffer().unwrap();
        label_object(&gl, ObjectName::Buffer(buffer), "mesh vertices").unwrap();
        assert_eq!(
            gl.label_of(ObjectName::Buffer(buffer)).as_deref(),
            Some("mesh vertices")
        );
        assert_eq!(ObjectName::Buffer(buffer).to_string(), format!("buffer #{}", buffer.raw()));
    }

    #[test]
    fn test_long_label_truncated_below_limit() {
        let gl = HeadlessBackend::new().with_max_label_length(6);
        let texture = gl.create_texture().unwrap();
        label_object(&gl, ObjectName::Texture(texture), "textures/brick.png").unwrap();
        assert_eq!(gl.label_of(ObjectName::Texture(texture)).as_deref(), Some("textu"));

        // Never splits a multi-byte character
        assert_eq!(truncate_label("aéb", 2), "a");
    }

    #[test]
    fn test_label_skipped_without_support() {
        let gl = HeadlessBackend::new().with_max_label_length(0);
        let program = gl.create_program().unwrap();
        label_object(&gl, ObjectName::Program(program), "unused").unwrap();
        assert!(gl.label_of(ObjectName::Program(program)).is_none());
    }

    #[test]
    fn test_label_error_surfaces() {
        let gl = HeadlessBackend::new();
        let shader = gl.create_shader(ShaderStage::Vertex).unwrap();
        gl.inject_error(INVALID_VALUE);
        assert!(matches!(
            label_object(&gl, ObjectName::Shader(shader), "cube.vert"),
            Err(RenderError::NativeCall { call: "glObjectLabel", .. })
        ));
    }

    #[test]
    fn test_error_code_names() {
        assert_eq!(error_code_name(INVALID_OPERATION), "GL_INVALID_OPERATION");
        assert_eq!(error_code_name(0x1234), "unknown GL error");
    }
}
