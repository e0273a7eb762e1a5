//! Vertex array objects
//!
//! A vertex array remembers the element buffer bound while it is active
//! and the attribute pointers configured while it is active. It references
//! its buffers by handle; the buffers themselves are owned elsewhere.

use log::{debug, trace};

use super::buffer::GpuBuffer;
use super::vertex_layout::VertexAttributeDescriptor;
use crate::error::{RenderError, Result};
use crate::gl::{
    ensure_call_succeeded, label_object, BufferHandle, BufferTarget, Gl, ObjectName,
    VertexArrayHandle,
};

/// Owns one native vertex array
pub struct VertexArray {
    gl: Gl,
    handle: VertexArrayHandle,
    vertex_buffer: BufferHandle,
    index_buffer: Option<BufferHandle>,
    layout: Vec<VertexAttributeDescriptor>,
}

impl VertexArray {
    /// Creates a vertex array that captures `index_buffer` as its element
    /// buffer
    ///
    /// On return no vertex array and no vertex buffer are bound.
    pub fn new(gl: &Gl, vertex_buffer: &GpuBuffer, index_buffer: Option<&GpuBuffer>) -> Result<Self> {
        let handle = gl
            .create_vertex_array()
            .map_err(|reason| RenderError::ResourceCreation {
                resource: "vertex array",
                reason,
            })?;

        let vertex_array = Self {
            gl: gl.clone(),
            handle,
            vertex_buffer: vertex_buffer.handle(),
            index_buffer: index_buffer.map(GpuBuffer::handle),
            layout: Vec::new(),
        };

        gl.bind_vertex_array(Some(handle));
        ensure_call_succeeded(gl.as_ref(), "glBindVertexArray")?;
        vertex_buffer.bind();
        if let Some(index_buffer) = index_buffer {
            index_buffer.bind();
        }
        ensure_call_succeeded(gl.as_ref(), "glBindBuffer")?;

        // The element binding is vertex array state and survives this
        gl.bind_vertex_array(None);
        vertex_buffer.unbind();
        label_object(
            gl.as_ref(),
            ObjectName::VertexArray(handle),
            &format!("{} layout", vertex_buffer.label()),
        )?;

        debug!(
            "Created vertex array {} (vertex buffer {}, index buffer {:?})",
            handle.raw(),
            vertex_array.vertex_buffer.raw(),
            vertex_array.index_buffer.map(BufferHandle::raw)
        );
        Ok(vertex_array)
    }

    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.index_buffer
    }

    /// Attribute layout recorded by the last
    /// [`configure_attributes`](Self::configure_attributes)
    pub fn layout(&self) -> &[VertexAttributeDescriptor] {
        &self.layout
    }

    /// Points each descriptor's slot at `vertex_buffer`
    ///
    /// Binds this vertex array and the vertex buffer, issues one enable and
    /// one pointer call per descriptor, then unbinds the vertex array
    /// before the vertex buffer. Both are unbound on failure too.
    pub fn configure_attributes(
        &mut self,
        vertex_buffer: &GpuBuffer,
        descriptors: &[VertexAttributeDescriptor],
    ) -> Result<()> {
        self.bind();
        vertex_buffer.bind();
        let result = self.point_attributes(descriptors);
        self.unbind();
        vertex_buffer.unbind();

        result?;
        self.layout = descriptors.to_vec();
        Ok(())
    }

    fn point_attributes(&self, descriptors: &[VertexAttributeDescriptor]) -> Result<()> {
        for descriptor in descriptors {
            descriptor.validate()?;
            let slot = descriptor.slot();
            trace!(
                "Vertex array {}: {} -> slot {} ({} x {:?}, stride {} B, offset {} B)",
                self.handle.raw(),
                descriptor.semantic,
                slot,
                descriptor.element_count,
                descriptor.scalar,
                descriptor.byte_stride(),
                descriptor.byte_offset()
            );
            self.gl.enable_vertex_attrib_array(slot);
            self.gl.vertex_attrib_pointer(
                slot,
                descriptor.element_count as i32,
                descriptor.scalar,
                false,
                descriptor.byte_stride() as i32,
                descriptor.byte_offset() as i32,
            );
            ensure_call_succeeded(self.gl.as_ref(), "glVertexAttribPointer")?;
        }
        Ok(())
    }

    pub fn bind(&self) {
        self.gl.bind_vertex_array(Some(self.handle));
    }

    pub fn unbind(&self) {
        self.gl.bind_vertex_array(None);
    }

    /// Deletes the native vertex array
    pub fn dispose(self) {}
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        debug!("Deleting vertex array {}", self.handle.raw());
        self.gl.delete_vertex_array(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::vertex_layout::position_uv_layout;
    use crate::gl::{HeadlessBackend, ScalarType, INVALID_OPERATION};
    use std::rc::Rc;

    fn buffers(gl: &Gl) -> (GpuBuffer, GpuBuffer) {
        let vertices = [0.0f32; 15];
        let vbo = GpuBuffer::new(gl, BufferTarget::Vertex, &vertices, "vbo").unwrap();
        let ebo = GpuBuffer::new(gl, BufferTarget::Index, &[0u32, 1, 2], "ebo").unwrap();
        (vbo, ebo)
    }

    #[test]
    fn test_index_buffer_is_captured() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, ebo) = buffers(&gl);

        let vao = VertexArray::new(&gl, &vbo, Some(&ebo)).unwrap();
        assert!(backend.binding_state().is_neutral());

        let info = backend.vertex_array_info(vao.handle()).unwrap();
        assert_eq!(info.element_buffer, Some(ebo.handle()));
        assert_eq!(vao.index_buffer(), Some(ebo.handle()));
    }

    #[test]
    fn test_configure_attributes_sets_pointers() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, _ebo) = buffers(&gl);

        let mut vao = VertexArray::new(&gl, &vbo, None).unwrap();
        vao.configure_attributes(&vbo, &position_uv_layout()).unwrap();

        let info = backend.vertex_array_info(vao.handle()).unwrap();
        assert_eq!(info.enabled.iter().copied().collect::<Vec<_>>(), vec![0, 2]);

        let uv = info.pointers[&2];
        assert_eq!(uv.size, 2);
        assert_eq!(uv.scalar, ScalarType::Float);
        assert_eq!(uv.stride, 20);
        assert_eq!(uv.offset, 12);
        assert_eq!(uv.buffer, vbo.handle());

        assert_eq!(vao.layout().len(), 2);
        assert!(backend.binding_state().is_neutral());
    }

    #[test]
    fn test_failed_configure_restores_bindings() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, _ebo) = buffers(&gl);
        let mut vao = VertexArray::new(&gl, &vbo, None).unwrap();

        let mut layout = position_uv_layout();
        layout[1].offset = layout[1].stride;
        assert!(vao.configure_attributes(&vbo, &layout).is_err());
        assert!(backend.binding_state().is_neutral());
        assert!(vao.layout().is_empty());

        backend.inject_error(INVALID_OPERATION);
        assert!(matches!(
            vao.configure_attributes(&vbo, &position_uv_layout()),
            Err(RenderError::NativeCall {
                call: "glVertexAttribPointer",
                ..
            })
        ));
        assert!(backend.binding_state().is_neutral());
    }

    #[test]
    fn test_vertex_array_labeled_after_buffer() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, _ebo) = buffers(&gl);
        let vao = VertexArray::new(&gl, &vbo, None).unwrap();
        assert_eq!(
            backend
                .label_of(ObjectName::VertexArray(vao.handle()))
                .as_deref(),
            Some("vbo layout")
        );
    }

    #[test]
    fn test_unbind_twice_is_stable() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, _ebo) = buffers(&gl);
        let vao = VertexArray::new(&gl, &vbo, None).unwrap();

        vao.bind();
        vao.unbind();
        let first = backend.binding_state();
        vao.unbind();
        assert_eq!(backend.binding_state(), first);
    }

    #[test]
    fn test_drop_releases_handle() {
        let backend = Rc::new(HeadlessBackend::new());
        let gl: Gl = backend.clone();
        let (vbo, ebo) = buffers(&gl);
        let vao = VertexArray::new(&gl, &vbo, Some(&ebo)).unwrap();

        vao.dispose();
        assert_eq!(backend.live_handles().vertex_arrays, 0);
        assert_eq!(backend.live_handles().buffers, 2);
    }
}
