//! OpenGL 3.3 core backend over `glow`

use glow::HasContext;
use log::{debug, Level};

use super::{
    BufferHandle, BufferTarget, Capability, DepthFunc, Face, GlBackend, ObjectName, PolygonMode,
    ProgramHandle, ScalarType, ShaderHandle, ShaderStage, TextureFilter, TextureHandle,
    TextureParameter, TextureWrap, UniformLocation, UniformValue, VertexArrayHandle, Winding,
};

/// [`GlBackend`] backed by a live `glow` context
///
/// The context must be current on the calling thread for as long as the
/// backend is used.
///
/// On contexts with debug support a message callback forwarding to `log`
/// is installed at construction. Delivery stays off until
/// [`set_debug_output`](GlBackend::set_debug_output) turns it on.
pub struct GlowBackend {
    gl: glow::Context,
    debug_supported: bool,
    max_label_length: usize,
}

impl GlowBackend {
    pub fn new(mut gl: glow::Context) -> Self {
        let debug_supported = gl.supports_debug();
        let mut max_label_length = 0;
        if debug_supported {
            unsafe {
                gl.debug_message_callback(log_debug_message);
                gl.disable(glow::DEBUG_OUTPUT);
                max_label_length = gl.get_parameter_i32(glow::MAX_LABEL_LENGTH).max(0) as usize;
            }
        }
        debug!(
            "Debug support: {} (max label length {})",
            debug_supported, max_label_length
        );
        Self {
            gl,
            debug_supported,
            max_label_length,
        }
    }

    /// Loads GL entry points through `loader`
    ///
    /// # Safety
    ///
    /// A context must be current and `loader` must return valid function
    /// pointers for it.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&std::ffi::CStr) -> *const std::ffi::c_void,
    {
        Self::new(glow::Context::from_loader_function_cstr(loader))
    }

    /// Underlying `glow` context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

/// Log level for a `GL_DEBUG_SEVERITY_*` value
fn debug_level(severity: u32) -> Level {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => Level::Error,
        glow::DEBUG_SEVERITY_MEDIUM => Level::Warn,
        glow::DEBUG_SEVERITY_LOW => Level::Info,
        _ => Level::Debug,
    }
}

fn debug_type_name(kind: u32) -> &'static str {
    match kind {
        glow::DEBUG_TYPE_ERROR => "error",
        glow::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated behavior",
        glow::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined behavior",
        glow::DEBUG_TYPE_PORTABILITY => "portability",
        glow::DEBUG_TYPE_PERFORMANCE => "performance",
        _ => "other",
    }
}

fn log_debug_message(_source: u32, kind: u32, id: u32, severity: u32, message: &str) {
    log::log!(
        target: "thistle::gl",
        debug_level(severity),
        "Driver {} message {}: {}",
        debug_type_name(kind),
        id,
        message
    );
}

fn object_identifier(object: ObjectName) -> u32 {
    match object {
        ObjectName::Buffer(_) => glow::BUFFER,
        ObjectName::VertexArray(_) => glow::VERTEX_ARRAY,
        ObjectName::Texture(_) => glow::TEXTURE,
        ObjectName::Shader(_) => glow::SHADER,
        ObjectName::Program(_) => glow::PROGRAM,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn scalar_type(scalar: ScalarType) -> u32 {
    match scalar {
        ScalarType::Float => glow::FLOAT,
        ScalarType::Int => glow::INT,
        ScalarType::UnsignedInt => glow::UNSIGNED_INT,
        ScalarType::UnsignedByte => glow::UNSIGNED_BYTE,
    }
}

fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
    }
}

fn depth_func(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Never => glow::NEVER,
        DepthFunc::Less => glow::LESS,
        DepthFunc::Equal => glow::EQUAL,
        DepthFunc::LessOrEqual => glow::LEQUAL,
        DepthFunc::Greater => glow::GREATER,
        DepthFunc::NotEqual => glow::NOTEQUAL,
        DepthFunc::GreaterOrEqual => glow::GEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

fn face(face: Face) -> u32 {
    match face {
        Face::Front => glow::FRONT,
        Face::Back => glow::BACK,
        Face::FrontAndBack => glow::FRONT_AND_BACK,
    }
}

fn texture_wrap(wrap: TextureWrap) -> i32 {
    (match wrap {
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        TextureWrap::Repeat => glow::REPEAT,
        TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn texture_filter(filter: TextureFilter) -> i32 {
    (match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
        TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

impl GlBackend for GlowBackend {
    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { self.gl.create_buffer() }.map(|b| BufferHandle(b.0))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(buffer_target(target), buffer.map(|b| glow::NativeBuffer(b.0)))
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { self.gl.create_vertex_array() }.map(|v| VertexArrayHandle(v.0))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0)))
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.0))
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        scalar: ScalarType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            match scalar {
                ScalarType::Float => self.gl.vertex_attrib_pointer_f32(
                    index,
                    size,
                    glow::FLOAT,
                    normalized,
                    stride,
                    offset,
                ),
                ScalarType::UnsignedByte if normalized => self.gl.vertex_attrib_pointer_f32(
                    index,
                    size,
                    glow::UNSIGNED_BYTE,
                    true,
                    stride,
                    offset,
                ),
                integer => self.gl.vertex_attrib_pointer_i32(
                    index,
                    size,
                    scalar_type(integer),
                    stride,
                    offset,
                ),
            }
        }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { self.gl.create_texture() }.map(|t| TextureHandle(t.0))
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)))
        }
    }

    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn tex_sub_image_rgba8(&self, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                x as i32,
                y as i32,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            )
        }
    }

    fn tex_parameter(&self, parameter: TextureParameter) {
        let (name, value) = match parameter {
            TextureParameter::WrapS(wrap) => (glow::TEXTURE_WRAP_S, texture_wrap(wrap)),
            TextureParameter::WrapT(wrap) => (glow::TEXTURE_WRAP_T, texture_wrap(wrap)),
            TextureParameter::MinFilter(filter) => {
                (glow::TEXTURE_MIN_FILTER, texture_filter(filter))
            }
            TextureParameter::MagFilter(filter) => {
                (glow::TEXTURE_MAG_FILTER, texture_filter(filter))
            }
            TextureParameter::BaseLevel(level) => (glow::TEXTURE_BASE_LEVEL, level),
            TextureParameter::MaxLevel(level) => (glow::TEXTURE_MAX_LEVEL, level),
        };
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, name, value) }
    }

    fn generate_mipmap(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle, String> {
        let kind = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(kind) }.map(|s| ShaderHandle(s.0))
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        unsafe { self.gl.shader_source(glow::NativeShader(shader.0), source) }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.compile_shader(glow::NativeShader(shader.0)) }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        unsafe { self.gl.get_shader_compile_status(glow::NativeShader(shader.0)) }
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader.0)) }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        unsafe { self.gl.create_program() }.map(|p| ProgramHandle(p.0))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .attach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0))
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .detach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0))
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { self.gl.link_program(glow::NativeProgram(program.0)) }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        unsafe { self.gl.get_program_link_status(glow::NativeProgram(program.0)) }
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        unsafe { self.gl.get_program_info_log(glow::NativeProgram(program.0)) }
    }

    fn validate_program(&self, program: ProgramHandle) -> bool {
        let program = glow::NativeProgram(program.0);
        unsafe {
            self.gl.validate_program(program);
            self.gl.get_program_validate_status(program)
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
        }
        .map(|location| UniformLocation(location.0))
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(location, false, &m),
            }
        }
    }

    fn enable(&self, cap: Capability) {
        unsafe { self.gl.enable(capability(cap)) }
    }

    fn disable(&self, cap: Capability) {
        unsafe { self.gl.disable(capability(cap)) }
    }

    fn depth_func(&self, func: DepthFunc) {
        unsafe { self.gl.depth_func(depth_func(func)) }
    }

    fn front_face(&self, winding: Winding) {
        let mode = match winding {
            Winding::Clockwise => glow::CW,
            Winding::CounterClockwise => glow::CCW,
        };
        unsafe { self.gl.front_face(mode) }
    }

    fn cull_face(&self, f: Face) {
        unsafe { self.gl.cull_face(face(f)) }
    }

    fn polygon_mode(&self, f: Face, mode: PolygonMode) {
        let mode = match mode {
            PolygonMode::Fill => glow::FILL,
            PolygonMode::Line => glow::LINE,
        };
        unsafe { self.gl.polygon_mode(face(f), mode) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self, color: bool, depth: bool) {
        let mut mask = 0;
        if color {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn draw_arrays(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLES, first, count) }
    }

    fn draw_elements(&self, count: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0)
        }
    }

    fn get_error(&self) -> Option<u32> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }

    fn vendor(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VENDOR) }
    }

    fn renderer(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::RENDERER) }
    }

    fn version(&self) -> String {
        unsafe { self.gl.get_parameter_string(glow::VERSION) }
    }

    fn max_label_length(&self) -> usize {
        self.max_label_length
    }

    fn object_label(&self, object: ObjectName, label: &str) {
        unsafe {
            self.gl
                .object_label(object_identifier(object), object.raw(), Some(label))
        }
    }

    fn set_debug_output(&self, enabled: bool) -> bool {
        if !self.debug_supported {
            return false;
        }
        unsafe {
            if enabled {
                self.gl.enable(glow::DEBUG_OUTPUT);
                self.gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
            } else {
                self.gl.disable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
                self.gl.disable(glow::DEBUG_OUTPUT);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_severity_levels() {
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_HIGH), Level::Error);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_MEDIUM), Level::Warn);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_LOW), Level::Info);
        assert_eq!(debug_level(glow::DEBUG_SEVERITY_NOTIFICATION), Level::Debug);
    }

    #[test]
    fn test_debug_type_names() {
        assert_eq!(debug_type_name(glow::DEBUG_TYPE_ERROR), "error");
        assert_eq!(debug_type_name(glow::DEBUG_TYPE_PERFORMANCE), "performance");
        assert_eq!(debug_type_name(glow::DEBUG_TYPE_OTHER), "other");
    }

    #[test]
    fn test_object_identifiers() {
        let texture = TextureHandle(std::num::NonZeroU32::MIN);
        assert_eq!(object_identifier(ObjectName::Texture(texture)), glow::TEXTURE);
        assert_eq!(
            object_identifier(ObjectName::VertexArray(VertexArrayHandle(
                std::num::NonZeroU32::MIN
            ))),
            glow::VERTEX_ARRAY
        );
    }
}
