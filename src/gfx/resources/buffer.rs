//! GPU buffer objects holding vertex or index data

use bytemuck::Pod;
use log::{debug, trace};

use crate::error::{RenderError, Result};
use crate::gl::{ensure_call_succeeded, label_object, BufferHandle, BufferTarget, Gl, ObjectName};

/// Owns one native buffer filled once at construction
///
/// The data is immutable after upload. The handle is deleted when the
/// buffer is dropped or passed to [`dispose`](GpuBuffer::dispose).
pub struct GpuBuffer {
    gl: Gl,
    handle: BufferHandle,
    target: BufferTarget,
    byte_len: usize,
    label: String,
}

impl GpuBuffer {
    /// Creates a buffer and uploads `data` in a single transfer
    ///
    /// The buffer is left unbound. Index buffers must be created while no
    /// vertex array is bound, or the binding lands in that vertex array.
    ///
    /// # Arguments
    /// * `gl` - Backend to allocate on
    /// * `target` - Vertex or index binding target
    /// * `data` - Plain-old-data elements to upload
    /// * `label` - Name used in log output and attached as the object label
    pub fn new<T: Pod>(gl: &Gl, target: BufferTarget, data: &[T], label: &str) -> Result<Self> {
        let handle = gl
            .create_buffer()
            .map_err(|reason| RenderError::ResourceCreation {
                resource: "buffer",
                reason,
            })?;

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = Self {
            gl: gl.clone(),
            handle,
            target,
            byte_len: bytes.len(),
            label: label.to_string(),
        };

        gl.bind_buffer(target, Some(handle));
        ensure_call_succeeded(gl.as_ref(), "glBindBuffer")?;

        trace!("Uploading {} bytes to {} buffer '{}'", bytes.len(), target, label);
        gl.buffer_data(target, bytes);
        ensure_call_succeeded(gl.as_ref(), "glBufferData")?;

        gl.bind_buffer(target, None);
        label_object(gl.as_ref(), ObjectName::Buffer(handle), label)?;
        debug!(
            "Created {} buffer '{}' ({} bytes, handle {})",
            target,
            label,
            buffer.byte_len,
            handle.raw()
        );
        Ok(buffer)
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Binds this buffer to its target
    pub fn bind(&self) {
        self.gl.bind_buffer(self.target, Some(self.handle));
    }

    /// Clears the binding of this buffer's target
    pub fn unbind(&self) {
        self.gl.bind_buffer(self.target, None);
    }

    /// Deletes the native buffer
    pub fn dispose(self) {}
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        debug!(
            "Deleting {} buffer '{}' (handle {})",
            self.target,
            self.label,
            self.handle.raw()
        );
        self.gl.delete_buffer(self.handle);
    }
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("byte_len", &self.byte_len)
            .field("label", &self.label)
            .finish()
    }
}
