use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::error::Result;
use crate::gfx::mesh::{MeshDescription, MeshResource, MeshTextures};
use crate::gfx::resources::{Texture, TextureOptions};
use crate::gl::Gl;

/// Loads each texture file once and shares it between meshes
///
/// Entries hold a reference to their texture; a texture is released when
/// the cache and every mesh using it have let go.
pub struct TextureCache {
    gl: Gl,
    options: TextureOptions,
    textures: HashMap<PathBuf, Rc<Texture>>,
}

impl TextureCache {
    pub fn new(gl: &Gl, options: TextureOptions) -> Self {
        Self {
            gl: gl.clone(),
            options,
            textures: HashMap::new(),
        }
    }

    /// Returns the texture for `path`, decoding and uploading it on first use
    pub fn get_or_load(&mut self, path: impl AsRef<Path>) -> Result<Rc<Texture>> {
        let path = path.as_ref();
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let texture = Rc::new(Texture::from_file(&self.gl, path, self.options)?);
        debug!("Cached texture {}", path.display());
        self.textures.insert(path.to_path_buf(), texture.clone());
        Ok(texture)
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.textures.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Drops the cache's references
    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

/// Uploads descriptions as meshes, loading referenced textures through
/// `cache`
pub fn upload_meshes(
    gl: &Gl,
    descriptions: &[MeshDescription],
    cache: &mut TextureCache,
) -> Result<Vec<MeshResource>> {
    descriptions
        .iter()
        .map(|description| {
            let textures = MeshTextures {
                diffuse: description
                    .diffuse_texture
                    .as_ref()
                    .map(|path| cache.get_or_load(path))
                    .transpose()?,
                specular: description
                    .specular_texture
                    .as_ref()
                    .map(|path| cache.get_or_load(path))
                    .transpose()?,
            };
            MeshResource::new(gl, description, textures)
        })
        .collect()
}
