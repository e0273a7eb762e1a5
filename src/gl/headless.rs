//! # Headless Backend
//!
//! An in-memory emulation of the OpenGL binding model. It does not
//! rasterize anything. Instead it keeps the state a driver would keep
//! (live objects, binding points, texture units, the program in use,
//! uniform values, fixed-function toggles) and records every clear and
//! draw call, raising the same error codes a driver raises for misuse.
//!
//! Tests use it to check resource sequencing: that every handle is deleted
//! exactly once, that unbinding restores a neutral state, and that draws
//! happen with the expected program, vertex array and uniforms in place.
//!
//! Uniforms are discovered by scanning the GLSL source for `uniform`
//! declarations, including members of uniform structs. A stage compiles
//! when its source defines `void main`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::num::NonZeroU32;

use super::{
    BufferHandle, BufferTarget, Capability, DepthFunc, Face, GlBackend, ObjectName, PolygonMode,
    ProgramHandle, ScalarType, ShaderHandle, ShaderStage, TextureHandle, TextureParameter,
    UniformLocation, UniformValue, VertexArrayHandle, Winding, INVALID_ENUM, INVALID_OPERATION,
    INVALID_VALUE,
};

/// Highest texture unit accepted by [`GlBackend::active_texture`]
const MAX_TEXTURE_UNITS: u32 = 32;

/// Reported `GL_MAX_LABEL_LENGTH` unless overridden
pub const DEFAULT_MAX_LABEL_LENGTH: usize = 256;

/// Count of objects that have been created and not yet deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveHandles {
    pub buffers: usize,
    pub vertex_arrays: usize,
    pub textures: usize,
    pub shaders: usize,
    pub programs: usize,
}

impl LiveHandles {
    pub fn total(&self) -> usize {
        self.buffers + self.vertex_arrays + self.textures + self.shaders + self.programs
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Snapshot of every binding point
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingState {
    pub array_buffer: Option<BufferHandle>,
    /// Element buffer of the bound vertex array, or the unattached slot
    pub element_buffer: Option<BufferHandle>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub active_unit: u32,
    pub textures: BTreeMap<u32, TextureHandle>,
    pub program: Option<ProgramHandle>,
}

impl BindingState {
    /// True when nothing is bound on any target
    pub fn is_neutral(&self) -> bool {
        self.array_buffer.is_none()
            && self.element_buffer.is_none()
            && self.vertex_array.is_none()
            && self.textures.is_empty()
            && self.program.is_none()
    }
}

/// Snapshot of the fixed-function toggles
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionState {
    pub depth_test: bool,
    pub face_culling: bool,
    pub depth_func: DepthFunc,
    pub front_face: Winding,
    pub cull_face: Face,
    pub polygon_mode: PolygonMode,
    pub clear_color: [f32; 4],
    pub viewport: [i32; 4],
    pub debug_output: bool,
}

/// An object deletion, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deleted {
    Buffer(BufferHandle),
    VertexArray(VertexArrayHandle),
    Texture(TextureHandle),
    Shader(ShaderHandle),
    Program(ProgramHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Arrays { first: i32, count: i32 },
    Elements { count: i32 },
}

/// One recorded draw call with the state it ran under
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub kind: DrawKind,
    pub program: ProgramHandle,
    pub vertex_array: VertexArrayHandle,
    pub textures: BTreeMap<u32, TextureHandle>,
    pub uniforms: HashMap<String, UniformValue>,
    pub front_face: Winding,
    pub face_culling: bool,
    /// Validations of the program made before this draw
    pub validations: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BufferInfo {
    pub target: Option<BufferTarget>,
    pub byte_len: usize,
    pub uploads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributePointer {
    pub buffer: BufferHandle,
    pub size: i32,
    pub scalar: ScalarType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
}

#[derive(Debug, Clone, Default)]
pub struct VertexArrayInfo {
    pub element_buffer: Option<BufferHandle>,
    pub enabled: BTreeSet<u32>,
    pub pointers: BTreeMap<u32, AttributePointer>,
}

#[derive(Debug, Clone, Default)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    /// Level 0 storage, bottom row first
    pub pixels: Vec<u8>,
    /// Destination row of every sub-image upload, in call order
    pub row_uploads: Vec<u32>,
    pub parameters: Vec<TextureParameter>,
    pub mipmaps_generated: bool,
}

#[derive(Debug, Clone)]
struct ShaderRecord {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Clone, Default)]
struct ProgramRecord {
    attached: Vec<ShaderHandle>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    values: HashMap<String, UniformValue>,
    validations: usize,
}

#[derive(Default)]
struct State {
    last_name: u32,
    buffers: HashMap<BufferHandle, BufferInfo>,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArrayInfo>,
    textures: HashMap<TextureHandle, TextureInfo>,
    shaders: HashMap<ShaderHandle, ShaderRecord>,
    programs: HashMap<ProgramHandle, ProgramRecord>,

    array_buffer: Option<BufferHandle>,
    unattached_element_buffer: Option<BufferHandle>,
    vertex_array: Option<VertexArrayHandle>,
    active_unit: u32,
    units: BTreeMap<u32, TextureHandle>,
    program: Option<ProgramHandle>,

    capabilities: HashSet<Capability>,
    depth_func: DepthFunc,
    front_face: Winding,
    cull_face: Face,
    polygon_mode: PolygonMode,
    clear_color: [f32; 4],
    viewport: [i32; 4],
    debug_output: bool,
    labels: HashMap<ObjectName, String>,

    clears: usize,
    draw_calls: Vec<DrawCall>,
    errors: VecDeque<u32>,
    invalid_deletes: usize,
    deletions: Vec<Deleted>,
}

impl State {
    fn next_name(&mut self) -> NonZeroU32 {
        self.last_name += 1;
        NonZeroU32::new(self.last_name).unwrap_or(NonZeroU32::MIN)
    }

    fn raise(&mut self, code: u32) {
        self.errors.push_back(code);
    }

    fn bound_texture(&self) -> Option<TextureHandle> {
        self.units.get(&self.active_unit).copied()
    }

    fn element_buffer(&self) -> Option<BufferHandle> {
        match self.vertex_array {
            Some(vao) => self
                .vertex_arrays
                .get(&vao)
                .and_then(|info| info.element_buffer),
            None => self.unattached_element_buffer,
        }
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<BufferHandle> {
        match target {
            BufferTarget::Vertex => self.array_buffer,
            BufferTarget::Index => self.element_buffer(),
        }
    }

    fn object_exists(&self, object: ObjectName) -> bool {
        match object {
            ObjectName::Buffer(h) => self.buffers.contains_key(&h),
            ObjectName::VertexArray(h) => self.vertex_arrays.contains_key(&h),
            ObjectName::Texture(h) => self.textures.contains_key(&h),
            ObjectName::Shader(h) => self.shaders.contains_key(&h),
            ObjectName::Program(h) => self.programs.contains_key(&h),
        }
    }

    fn record_draw(&mut self, kind: DrawKind) {
        let (Some(program), Some(vertex_array)) = (self.program, self.vertex_array) else {
            self.raise(INVALID_OPERATION);
            return;
        };
        if matches!(kind, DrawKind::Elements { .. }) && self.element_buffer().is_none() {
            self.raise(INVALID_OPERATION);
            return;
        }
        let (uniforms, validations) = self
            .programs
            .get(&program)
            .map(|record| (record.values.clone(), record.validations))
            .unwrap_or_default();
        let call = DrawCall {
            kind,
            program,
            vertex_array,
            textures: self.units.clone(),
            uniforms,
            front_face: self.front_face,
            face_culling: self.capabilities.contains(&Capability::CullFace),
            validations,
        };
        self.draw_calls.push(call);
    }
}

/// In-memory [`GlBackend`] for tests and display-less runs
pub struct HeadlessBackend {
    state: RefCell<State>,
    vendor: String,
    renderer: String,
    version: String,
    max_label_length: usize,
    debug_supported: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_strings("thistle", "headless", "3.3 (headless)")
    }

    /// Backend reporting the given vendor, renderer and version strings
    pub fn with_strings(vendor: &str, renderer: &str, version: &str) -> Self {
        Self {
            state: RefCell::new(State::default()),
            vendor: vendor.to_string(),
            renderer: renderer.to_string(),
            version: version.to_string(),
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
            debug_supported: true,
        }
    }

    /// Reports `length` as the label limit; 0 disables labels
    pub fn with_max_label_length(mut self, length: usize) -> Self {
        self.max_label_length = length;
        self
    }

    /// Emulates a context without debug output or object labels
    pub fn without_debug_support(mut self) -> Self {
        self.debug_supported = false;
        self.max_label_length = 0;
        self
    }

    /// Label of a live object
    pub fn label_of(&self, object: ObjectName) -> Option<String> {
        let state = self.state.borrow();
        if !state.object_exists(object) {
            return None;
        }
        state.labels.get(&object).cloned()
    }

    /// Times `program` has been validated
    pub fn validation_count(&self, program: ProgramHandle) -> usize {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map_or(0, |record| record.validations)
    }

    /// Queues an error code to be returned by the next `get_error`
    pub fn inject_error(&self, code: u32) {
        self.state.borrow_mut().raise(code);
    }

    pub fn live_handles(&self) -> LiveHandles {
        let state = self.state.borrow();
        LiveHandles {
            buffers: state.buffers.len(),
            vertex_arrays: state.vertex_arrays.len(),
            textures: state.textures.len(),
            shaders: state.shaders.len(),
            programs: state.programs.len(),
        }
    }

    /// Number of delete calls that named an object which was not alive
    pub fn invalid_deletes(&self) -> usize {
        self.state.borrow().invalid_deletes
    }

    /// Successful deletions in call order
    pub fn deletions(&self) -> Vec<Deleted> {
        self.state.borrow().deletions.clone()
    }

    pub fn binding_state(&self) -> BindingState {
        let state = self.state.borrow();
        BindingState {
            array_buffer: state.array_buffer,
            element_buffer: state.element_buffer(),
            vertex_array: state.vertex_array,
            active_unit: state.active_unit,
            textures: state.units.clone(),
            program: state.program,
        }
    }

    pub fn fixed_function_state(&self) -> FixedFunctionState {
        let state = self.state.borrow();
        FixedFunctionState {
            depth_test: state.capabilities.contains(&Capability::DepthTest),
            face_culling: state.capabilities.contains(&Capability::CullFace),
            depth_func: state.depth_func,
            front_face: state.front_face,
            cull_face: state.cull_face,
            polygon_mode: state.polygon_mode,
            clear_color: state.clear_color,
            viewport: state.viewport,
            debug_output: state.debug_output,
        }
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draw_calls.clone()
    }

    pub fn clear_count(&self) -> usize {
        self.state.borrow().clears
    }

    /// Number of errors queued and not yet read
    pub fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }

    pub fn buffer_info(&self, buffer: BufferHandle) -> Option<BufferInfo> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn vertex_array_info(&self, vertex_array: VertexArrayHandle) -> Option<VertexArrayInfo> {
        self.state.borrow().vertex_arrays.get(&vertex_array).cloned()
    }

    pub fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        self.state.borrow().textures.get(&texture).cloned()
    }

    /// Uniform names the program exposes after linking
    pub fn program_uniforms(&self, program: ProgramHandle) -> Vec<String> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.uniforms.clone())
            .unwrap_or_default()
    }

    /// Last value written to `name` on `program`
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|record| record.values.get(name).copied())
    }
}

impl GlBackend for HeadlessBackend {
    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let mut state = self.state.borrow_mut();
        let handle = BufferHandle(state.next_name());
        state.buffers.insert(handle, BufferInfo::default());
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = buffer {
            match state.buffers.get_mut(&handle) {
                Some(info) => {
                    info.target.get_or_insert(target);
                }
                None => {
                    state.raise(INVALID_OPERATION);
                    return;
                }
            }
        }
        match target {
            BufferTarget::Vertex => state.array_buffer = buffer,
            BufferTarget::Index => match state.vertex_array {
                Some(vao) => {
                    if let Some(info) = state.vertex_arrays.get_mut(&vao) {
                        info.element_buffer = buffer;
                    }
                }
                None => state.unattached_element_buffer = buffer,
            },
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(handle) = state.bound_buffer(target) else {
            state.raise(INVALID_OPERATION);
            return;
        };
        if let Some(info) = state.buffers.get_mut(&handle) {
            info.byte_len = data.len();
            info.uploads += 1;
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_none() {
            state.invalid_deletes += 1;
            return;
        }
        state.deletions.push(Deleted::Buffer(buffer));
        if state.array_buffer == Some(buffer) {
            state.array_buffer = None;
        }
        if state.unattached_element_buffer == Some(buffer) {
            state.unattached_element_buffer = None;
        }
        if let Some(vao) = state.vertex_array {
            if let Some(info) = state.vertex_arrays.get_mut(&vao) {
                if info.element_buffer == Some(buffer) {
                    info.element_buffer = None;
                }
            }
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        let mut state = self.state.borrow_mut();
        let handle = VertexArrayHandle(state.next_name());
        state.vertex_arrays.insert(handle, VertexArrayInfo::default());
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = vertex_array {
            if !state.vertex_arrays.contains_key(&handle) {
                state.raise(INVALID_OPERATION);
                return;
            }
        }
        state.vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array).is_none() {
            state.invalid_deletes += 1;
            return;
        }
        state.deletions.push(Deleted::VertexArray(vertex_array));
        if state.vertex_array == Some(vertex_array) {
            state.vertex_array = None;
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vao) = state.vertex_array else {
            state.raise(INVALID_OPERATION);
            return;
        };
        if let Some(info) = state.vertex_arrays.get_mut(&vao) {
            info.enabled.insert(index);
        }
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
        let mut state = self.state.borrow_mut();
        let (Some(vao), Some(buffer)) = (state.vertex_array, state.array_buffer) else {
            state.raise(INVALID_OPERATION);
            return;
        };
        if !(1..=4).contains(&size) || stride < 0 || offset < 0 {
            state.raise(INVALID_VALUE);
            return;
        }
        if let Some(info) = state.vertex_arrays.get_mut(&vao) {
            info.pointers.insert(
                index,
                AttributePointer {
                    buffer,
                    size,
                    scalar,
                    normalized,
                    stride,
                    offset,
                },
            );
        }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let mut state = self.state.borrow_mut();
        let handle = TextureHandle(state.next_name());
        state.textures.insert(handle, TextureInfo::default());
        Ok(handle)
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        if unit >= MAX_TEXTURE_UNITS {
            state.raise(INVALID_ENUM);
            return;
        }
        state.active_unit = unit;
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(handle) if !state.textures.contains_key(&handle) => {
                state.raise(INVALID_OPERATION);
            }
            Some(handle) => {
                state.units.insert(unit, handle);
            }
            None => {
                state.units.remove(&unit);
            }
        }
    }

    fn tex_image_rgba8(&self, width: u32, height: u32, pixels: Option<&[u8]>) {
        let mut state = self.state.borrow_mut();
        let Some(handle) = state.bound_texture() else {
            state.raise(INVALID_OPERATION);
            return;
        };
        let expected = width as usize * height as usize * 4;
        let storage = match pixels {
            Some(data) if data.len() != expected => {
                state.raise(INVALID_VALUE);
                return;
            }
            Some(data) => data.to_vec(),
            None => vec![0; expected],
        };
        if let Some(info) = state.textures.get_mut(&handle) {
            info.width = width;
            info.height = height;
            info.pixels = storage;
        }
    }

    fn tex_sub_image_rgba8(&self, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(handle) = state.bound_texture() else {
            state.raise(INVALID_OPERATION);
            return;
        };
        let Some(info) = state.textures.get(&handle) else {
            return;
        };
        let in_bounds = x + width <= info.width && y + height <= info.height;
        if !in_bounds || pixels.len() != width as usize * height as usize * 4 {
            state.raise(INVALID_VALUE);
            return;
        }
        if let Some(info) = state.textures.get_mut(&handle) {
            let row_bytes = width as usize * 4;
            for row in 0..height as usize {
                let dst = ((y as usize + row) * info.width as usize + x as usize) * 4;
                let src = row * row_bytes;
                info.pixels[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
            }
            info.row_uploads.push(y);
        }
    }

    fn tex_parameter(&self, parameter: TextureParameter) {
        let mut state = self.state.borrow_mut();
        let Some(handle) = state.bound_texture() else {
            state.raise(INVALID_OPERATION);
            return;
        };
        if let Some(info) = state.textures.get_mut(&handle) {
            info.parameters.push(parameter);
        }
    }

    fn generate_mipmap(&self) {
        let mut state = self.state.borrow_mut();
        let handle = state.bound_texture();
        let generated = handle
            .and_then(|h| state.textures.get_mut(&h))
            .is_some_and(|info| {
                info.mipmaps_generated = info.width > 0 && info.height > 0;
                info.mipmaps_generated
            });
        if !generated {
            state.raise(INVALID_OPERATION);
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture).is_none() {
            state.invalid_deletes += 1;
            return;
        }
        state.deletions.push(Deleted::Texture(texture));
        state.units.retain(|_, bound| *bound != texture);
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle, String> {
        let mut state = self.state.borrow_mut();
        let handle = ShaderHandle(state.next_name());
        state.shaders.insert(
            handle,
            ShaderRecord {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        Ok(handle)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader) {
            Some(record) => record.source = source.to_string(),
            None => state.raise(INVALID_VALUE),
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.shaders.get_mut(&shader) else {
            state.raise(INVALID_VALUE);
            return;
        };
        record.compiled = record.source.contains("void main");
        record.log = if record.compiled {
            String::new()
        } else {
            "ERROR: 0:1: 'main' : function not found".to_string()
        };
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|record| record.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_none() {
            state.invalid_deletes += 1;
            return;
        }
        state.deletions.push(Deleted::Shader(shader));
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let mut state = self.state.borrow_mut();
        let handle = ProgramHandle(state.next_name());
        state.programs.insert(handle, ProgramRecord::default());
        Ok(handle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader) {
            state.raise(INVALID_VALUE);
            return;
        }
        let attached = state.programs.get_mut(&program).map(|record| {
            if record.attached.contains(&shader) {
                false
            } else {
                record.attached.push(shader);
                true
            }
        });
        match attached {
            Some(true) => {}
            Some(false) => state.raise(INVALID_OPERATION),
            None => state.raise(INVALID_VALUE),
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        let detached = state.programs.get_mut(&program).is_some_and(|record| {
            let before = record.attached.len();
            record.attached.retain(|s| *s != shader);
            record.attached.len() != before
        });
        if !detached {
            state.raise(INVALID_OPERATION);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program).map(|r| r.attached.clone()) else {
            state.raise(INVALID_VALUE);
            return;
        };

        let stages: Vec<&ShaderRecord> = attached
            .iter()
            .filter_map(|shader| state.shaders.get(shader))
            .collect();
        let has_stage = |stage| {
            stages
                .iter()
                .any(|record| record.stage == stage && record.compiled)
        };

        let (linked, log) = if !has_stage(ShaderStage::Vertex) {
            (false, "error: no compiled vertex shader attached".to_string())
        } else if !has_stage(ShaderStage::Fragment) {
            (false, "error: no compiled fragment shader attached".to_string())
        } else {
            (true, String::new())
        };

        let mut uniforms = Vec::new();
        if linked {
            for record in &stages {
                for name in parse_uniforms(&record.source) {
                    if !uniforms.contains(&name) {
                        uniforms.push(name);
                    }
                }
            }
        }

        if let Some(record) = state.programs.get_mut(&program) {
            record.linked = linked;
            record.log = log;
            record.uniforms = uniforms;
            record.values.clear();
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|record| record.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn validate_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.programs.get_mut(&program) else {
            state.raise(INVALID_VALUE);
            return false;
        };
        record.validations += 1;
        if !record.linked {
            record.log = "Validation failed: program is not linked".to_string();
        }
        record.linked
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        if let Some(handle) = program {
            let usable = state.programs.get(&handle).is_some_and(|r| r.linked);
            if !usable {
                state.raise(INVALID_OPERATION);
                return;
            }
        }
        state.program = program;
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            state.invalid_deletes += 1;
            return;
        }
        state.deletions.push(Deleted::Program(program));
        if state.program == Some(program) {
            state.program = None;
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        let index = match state.programs.get(&program) {
            Some(record) if record.linked => record.uniforms.iter().position(|u| u == name),
            _ => {
                state.raise(INVALID_OPERATION);
                return None;
            }
        };
        index.map(|i| UniformLocation(i as u32))
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.program else {
            state.raise(INVALID_OPERATION);
            return;
        };
        let Some(record) = state.programs.get_mut(&program) else {
            state.raise(INVALID_OPERATION);
            return;
        };
        match record.uniforms.get(location.0 as usize).cloned() {
            Some(name) => {
                record.values.insert(name, value);
            }
            None => state.raise(INVALID_OPERATION),
        }
    }

    fn enable(&self, capability: Capability) {
        self.state.borrow_mut().capabilities.insert(capability);
    }

    fn disable(&self, capability: Capability) {
        self.state.borrow_mut().capabilities.remove(&capability);
    }

    fn depth_func(&self, func: DepthFunc) {
        self.state.borrow_mut().depth_func = func;
    }

    fn front_face(&self, winding: Winding) {
        self.state.borrow_mut().front_face = winding;
    }

    fn cull_face(&self, face: Face) {
        self.state.borrow_mut().cull_face = face;
    }

    fn polygon_mode(&self, face: Face, mode: PolygonMode) {
        let mut state = self.state.borrow_mut();
        // Core profile only accepts FRONT_AND_BACK
        if face != Face::FrontAndBack {
            state.raise(INVALID_ENUM);
            return;
        }
        state.polygon_mode = mode;
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, color: bool, depth: bool) {
        if color || depth {
            self.state.borrow_mut().clears += 1;
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        if width < 0 || height < 0 {
            state.raise(INVALID_VALUE);
            return;
        }
        state.viewport = [x, y, width, height];
    }

    fn draw_arrays(&self, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        if first < 0 || count < 0 {
            state.raise(INVALID_VALUE);
            return;
        }
        state.record_draw(DrawKind::Arrays { first, count });
    }

    fn draw_elements(&self, count: i32) {
        let mut state = self.state.borrow_mut();
        if count < 0 {
            state.raise(INVALID_VALUE);
            return;
        }
        state.record_draw(DrawKind::Elements { count });
    }

    fn get_error(&self) -> Option<u32> {
        self.state.borrow_mut().errors.pop_front()
    }

    fn vendor(&self) -> String {
        self.vendor.clone()
    }

    fn renderer(&self) -> String {
        self.renderer.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn max_label_length(&self) -> usize {
        self.max_label_length
    }

    fn object_label(&self, object: ObjectName, label: &str) {
        let mut state = self.state.borrow_mut();
        if !state.object_exists(object) || label.len() >= self.max_label_length {
            state.raise(INVALID_VALUE);
            return;
        }
        state.labels.insert(object, label.to_string());
    }

    fn set_debug_output(&self, enabled: bool) -> bool {
        if !self.debug_supported {
            return false;
        }
        self.state.borrow_mut().debug_output = enabled;
        true
    }
}

const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Declared names of one `type a, b[2], c` declaration
fn declared_names(tokens: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| !PRECISION_QUALIFIERS.contains(*t))
        .skip(1)
        .flat_map(|t| t.split(','))
        .filter_map(|name| name.split('[').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collects the active uniform names of a GLSL stage
///
/// Struct-typed uniforms expand to `name.member` for each member.
fn parse_uniforms(source: &str) -> Vec<String> {
    let without_comments: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");
    let spaced = without_comments
        .replace('{', " { ")
        .replace('}', " } ")
        .replace(';', " ; ");
    let tokens: Vec<&str> = spaced.split_whitespace().collect();

    let mut structs: HashMap<String, Vec<String>> = HashMap::new();
    let mut uniforms = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "struct" if i + 2 < tokens.len() && tokens[i + 2] == "{" => {
                let name = tokens[i + 1].to_string();
                let mut members = Vec::new();
                let mut j = i + 3;
                let mut statement = Vec::new();
                while j < tokens.len() && tokens[j] != "}" {
                    if tokens[j] == ";" {
                        members.extend(declared_names(&statement));
                        statement.clear();
                    } else {
                        statement.push(tokens[j]);
                    }
                    j += 1;
                }
                structs.insert(name, members);
                i = j + 1;
            }
            "uniform" => {
                let mut j = i + 1;
                let mut statement = Vec::new();
                while j < tokens.len() && tokens[j] != ";" {
                    statement.push(tokens[j]);
                    j += 1;
                }
                let type_name = statement
                    .iter()
                    .find(|t| !PRECISION_QUALIFIERS.contains(*t))
                    .copied()
                    .unwrap_or_default();
                for name in declared_names(&statement) {
                    match structs.get(type_name) {
                        Some(members) => {
                            uniforms.extend(members.iter().map(|m| format!("{name}.{m}")))
                        }
                        None => uniforms.push(name),
                    }
                }
                i = j + 1;
            }
            _ => i += 1,
        }
    }

    uniforms
}
