//! # Asset Loading
//!
//! Turns files on disk into CPU-side data ready for upload: Wavefront OBJ
//! models become [`MeshDescription`](crate::gfx::mesh::MeshDescription)s
//! and image files become RGBA8 [`ImageData`]. The [`TextureCache`] keeps
//! one GPU texture per image path.

pub mod image;
pub mod model;
pub mod texture_cache;

pub use self::image::{load_image, ImageData};
pub use model::{calculate_vertex_normals, load_obj};
pub use texture_cache::{upload_meshes, TextureCache};
