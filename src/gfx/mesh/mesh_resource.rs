//! GPU-resident meshes

use std::rc::Rc;

use log::debug;

use super::MeshDescription;
use crate::error::Result;
use crate::gfx::resources::{GpuBuffer, Texture, VertexArray, VertexAttributeDescriptor};
use crate::gl::{
    ensure_call_succeeded, BufferTarget, Capability, Face, Gl, VertexArrayHandle, Winding,
};

/// Textures a mesh samples from
///
/// Textures are shared: several meshes loaded from one model usually
/// reference the same image.
#[derive(Debug, Clone, Default)]
pub struct MeshTextures {
    pub diffuse: Option<Rc<Texture>>,
    pub specular: Option<Rc<Texture>>,
}

/// A mesh uploaded to vertex and index buffers behind one vertex array
///
/// Dropping the mesh releases, in order, the index buffer, the vertex
/// buffer, the vertex array and its references to the textures.
pub struct MeshResource {
    // Declaration order is release order
    index_buffer: Option<GpuBuffer>,
    vertex_buffer: GpuBuffer,
    vertex_array: VertexArray,
    diffuse_texture: Option<Rc<Texture>>,
    specular_texture: Option<Rc<Texture>>,

    gl: Gl,
    attributes: Vec<VertexAttributeDescriptor>,
    vertex_count: usize,
    index_count: usize,
    winding: Winding,
}

impl MeshResource {
    /// Uploads `description` and activates its vertex attributes
    ///
    /// An index buffer is only allocated when the description has indices.
    pub fn new(gl: &Gl, description: &MeshDescription, textures: MeshTextures) -> Result<Self> {
        description.validate()?;

        let vertex_buffer = GpuBuffer::new(
            gl,
            BufferTarget::Vertex,
            &description.vertices,
            "mesh vertices",
        )?;
        let index_buffer = if description.is_indexed() {
            Some(GpuBuffer::new(
                gl,
                BufferTarget::Index,
                &description.indices,
                "mesh indices",
            )?)
        } else {
            None
        };
        let vertex_array = VertexArray::new(gl, &vertex_buffer, index_buffer.as_ref())?;

        let mut mesh = Self {
            index_buffer,
            vertex_buffer,
            vertex_array,
            diffuse_texture: textures.diffuse,
            specular_texture: textures.specular,
            gl: gl.clone(),
            attributes: description.attributes.clone(),
            vertex_count: description.vertex_count(),
            index_count: description.indices.len(),
            winding: description.winding,
        };
        mesh.activate_vertex_attributes()?;

        debug!(
            "Created mesh: {} vertices, {} indices, {} attributes",
            mesh.vertex_count,
            mesh.index_count,
            mesh.attributes.len()
        );
        Ok(mesh)
    }

    /// Configures one attribute pointer per descriptor on the vertex array
    ///
    /// Leaves both the vertex array and the vertex buffer unbound.
    pub fn activate_vertex_attributes(&mut self) -> Result<()> {
        self.vertex_array
            .configure_attributes(&self.vertex_buffer, &self.attributes)
    }

    /// Activates the vertex array, which carries the buffer bindings
    pub fn bind(&self) {
        self.vertex_array.bind();
    }

    /// Issues an indexed draw when indices exist, otherwise an array draw
    /// over every vertex
    ///
    /// The mesh must be bound and a program in use.
    pub fn draw(&self) -> Result<()> {
        if self.index_buffer.is_some() {
            self.gl.draw_elements(self.index_count as i32);
            ensure_call_succeeded(self.gl.as_ref(), "glDrawElements")
        } else {
            self.gl.draw_arrays(0, self.vertex_count as i32);
            ensure_call_succeeded(self.gl.as_ref(), "glDrawArrays")
        }
    }

    /// Clears the vertex array binding, then the vertex and index buffer
    /// bindings
    pub fn unbind(&self) {
        self.vertex_array.unbind();
        self.vertex_buffer.unbind();
        if let Some(index_buffer) = &self.index_buffer {
            index_buffer.unbind();
        }
    }

    /// Enables back-face culling with this mesh's winding as the front face
    pub fn apply_face_culling(&self) {
        self.gl.enable(Capability::CullFace);
        self.gl.front_face(self.winding);
        self.gl.cull_face(Face::Back);
    }

    pub fn winding(&self) -> Winding {
        self.winding
    }

    pub fn diffuse_texture(&self) -> Option<&Texture> {
        self.diffuse_texture.as_deref()
    }

    pub fn specular_texture(&self) -> Option<&Texture> {
        self.specular_texture.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn attributes(&self) -> &[VertexAttributeDescriptor] {
        &self.attributes
    }

    pub fn vertex_array_handle(&self) -> VertexArrayHandle {
        self.vertex_array.handle()
    }

    /// Releases the buffers, the vertex array and the texture references
    pub fn dispose(self) {}
}

impl std::fmt::Debug for MeshResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshResource")
            .field("vertex_array", &self.vertex_array.handle())
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("winding", &self.winding)
            .finish()
    }
}
