//! 2D textures
//!
//! Textures are uploaded once and never modified. Image data arrives with
//! the top row first; by default it is flipped so that texture coordinate
//! `v = 0` samples the bottom of the image, matching the graphics API's
//! bottom-left origin.

use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::assets::image::{load_image, ImageData};
use crate::error::{RenderError, Result};
use crate::gl::{
    ensure_call_succeeded, label_object, Gl, ObjectName, TextureFilter, TextureHandle,
    TextureParameter, TextureWrap,
};

/// Highest mipmap level sampled
pub const MAX_MIP_LEVEL: i32 = 8;

/// Upload options for [`Texture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    /// Write source rows bottom-up
    pub flip_vertically: bool,
    pub generate_mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            flip_vertically: true,
            generate_mipmaps: true,
        }
    }
}

impl TextureOptions {
    pub fn with_flip_vertically(mut self, flip: bool) -> Self {
        self.flip_vertically = flip;
        self
    }

    pub fn with_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self
    }
}

/// Owns one native 2D texture with RGBA8 storage
pub struct Texture {
    gl: Gl,
    handle: TextureHandle,
    width: u32,
    height: u32,
    source: Option<PathBuf>,
}

impl Texture {
    /// Decodes an image file and uploads it
    pub fn from_file(gl: &Gl, path: impl AsRef<Path>, options: TextureOptions) -> Result<Self> {
        let path = path.as_ref();
        let image = load_image(path)?;
        let mut texture = Self::from_image(gl, &image, options)?;
        label_object(
            gl.as_ref(),
            ObjectName::Texture(texture.handle),
            &path.display().to_string(),
        )?;
        texture.source = Some(path.to_path_buf());
        Ok(texture)
    }

    /// Uploads decoded image rows one at a time
    ///
    /// Storage is reserved first, then each source row is written with its
    /// own sub-image call. With vertical flip enabled rows are visited from
    /// last to first.
    pub fn from_image(gl: &Gl, image: &ImageData, options: TextureOptions) -> Result<Self> {
        let texture = Self::allocate(gl, image.width(), image.height(), None)?;

        let height = image.height();
        let rows: Box<dyn Iterator<Item = u32>> = if options.flip_vertically {
            Box::new((0..height).rev())
        } else {
            Box::new(0..height)
        };
        for y in rows {
            let destination = if options.flip_vertically {
                height - y - 1
            } else {
                y
            };
            gl.tex_sub_image_rgba8(0, destination, image.width(), 1, image.row(y));
        }
        ensure_call_succeeded(gl.as_ref(), "glTexSubImage2D")?;
        trace!("Uploaded {} rows to texture {}", height, texture.handle.raw());

        texture.configure(options)?;
        Ok(texture)
    }

    /// Uploads tightly packed RGBA8 bytes in a single transfer, bottom row
    /// first
    pub fn from_raw(
        gl: &Gl,
        width: u32,
        height: u32,
        rgba: &[u8],
        options: TextureOptions,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::ResourceCreation {
                resource: "texture",
                reason: format!(
                    "{}x{} RGBA8 needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    rgba.len()
                ),
            });
        }
        let texture = Self::allocate(gl, width, height, Some(rgba))?;
        texture.configure(options)?;
        Ok(texture)
    }

    /// Creates the texture, binds it on unit 0 and reserves level 0 storage
    fn allocate(gl: &Gl, width: u32, height: u32, pixels: Option<&[u8]>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreation {
                resource: "texture",
                reason: format!("empty image ({width}x{height})"),
            });
        }
        let handle = gl
            .create_texture()
            .map_err(|reason| RenderError::ResourceCreation {
                resource: "texture",
                reason,
            })?;
        let texture = Self {
            gl: gl.clone(),
            handle,
            width,
            height,
            source: None,
        };

        texture.bind(0);
        gl.tex_image_rgba8(width, height, pixels);
        ensure_call_succeeded(gl.as_ref(), "glTexImage2D")?;
        label_object(
            gl.as_ref(),
            ObjectName::Texture(handle),
            &format!("texture {width}x{height}"),
        )?;
        Ok(texture)
    }

    /// Sets sampling parameters and mipmaps, then unbinds unit 0
    fn configure(&self, options: TextureOptions) -> Result<()> {
        let min_filter = if options.generate_mipmaps {
            TextureFilter::LinearMipmapLinear
        } else {
            TextureFilter::Linear
        };
        let parameters = [
            TextureParameter::WrapS(TextureWrap::ClampToEdge),
            TextureParameter::WrapT(TextureWrap::ClampToEdge),
            TextureParameter::MinFilter(min_filter),
            TextureParameter::MagFilter(TextureFilter::Linear),
            TextureParameter::BaseLevel(0),
            TextureParameter::MaxLevel(MAX_MIP_LEVEL),
        ];
        for parameter in parameters {
            self.gl.tex_parameter(parameter);
        }
        ensure_call_succeeded(self.gl.as_ref(), "glTexParameteri")?;

        if options.generate_mipmaps {
            self.gl.generate_mipmap();
            ensure_call_succeeded(self.gl.as_ref(), "glGenerateMipmap")?;
        }

        self.unbind(0);
        debug!(
            "Created texture {} ({}x{})",
            self.handle.raw(),
            self.width,
            self.height
        );
        Ok(())
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// File the texture was decoded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Binds this texture on texture unit `unit`
    pub fn bind(&self, unit: u32) {
        self.gl.active_texture(unit);
        self.gl.bind_texture(Some(self.handle));
    }

    /// Clears the 2D binding of texture unit `unit`
    pub fn unbind(&self, unit: u32) {
        self.gl.active_texture(unit);
        self.gl.bind_texture(None);
    }

    /// Deletes the native texture
    pub fn dispose(self) {}
}

impl Drop for Texture {
    fn drop(&mut self) {
        debug!("Deleting texture {}", self.handle.raw());
        self.gl.delete_texture(self.handle);
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("source", &self.source)
            .finish()
    }
}
