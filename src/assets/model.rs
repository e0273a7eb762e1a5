//! Wavefront OBJ loading

use std::path::Path;

use log::{debug, warn};

use crate::error::{RenderError, Result};
use crate::gfx::mesh::MeshDescription;
use crate::gfx::resources::vertex_layout::position_normal_uv_layout;

/// Loads every model in an OBJ file as an indexed mesh description
///
/// Faces are triangulated and each model is re-indexed so positions,
/// normals and texture coordinates share one index. Vertices are
/// interleaved as position, normal, texture coordinates. Texture paths from
/// the material library are resolved against the OBJ file's directory.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<MeshDescription>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RenderError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|err| {
        warn!("No materials for {}: {}", path.display(), err);
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let descriptions = models
        .iter()
        .map(|model| mesh_description(model, &materials, base_dir))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Loaded {} with {} meshes and {} materials",
        path.display(),
        descriptions.len(),
        materials.len()
    );
    Ok(descriptions)
}

fn mesh_description(
    model: &tobj::Model,
    materials: &[tobj::Material],
    base_dir: &Path,
) -> Result<MeshDescription> {
    let mesh = &model.mesh;
    let vertex_count = mesh.positions.len() / 3;
    if vertex_count == 0 {
        return Err(RenderError::InvalidMesh(format!(
            "model '{}' has no vertices",
            model.name
        )));
    }

    // Use normals from the file if every vertex has one
    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.clone()
    } else {
        calculate_vertex_normals(&mesh.positions, &mesh.indices)
    };

    let mut vertices = Vec::with_capacity(vertex_count * 8);
    for i in 0..vertex_count {
        vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
        vertices.extend_from_slice(&normals[i * 3..i * 3 + 3]);
        match mesh.texcoords.get(i * 2..i * 2 + 2) {
            Some(uv) => vertices.extend_from_slice(uv),
            None => vertices.extend_from_slice(&[0.0, 0.0]),
        }
    }

    let mut description =
        MeshDescription::new(vertices, mesh.indices.clone(), position_normal_uv_layout());

    if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
        if let Some(texture) = &material.diffuse_texture {
            description = description.with_diffuse_texture(base_dir.join(texture));
        }
        if let Some(texture) = &material.specular_texture {
            description = description.with_specular_texture(base_dir.join(texture));
        }
    }

    description.validate()?;
    Ok(description)
}

/// Averages the face normals of the triangles touching each vertex
pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut normals = vec![0.0f32; vertex_count * 3];

    let position = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }
        let (v0, v1, v2) = (position(i0), position(i1), position(i2));

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for vertex in [i0, i1, i2] {
            normals[vertex * 3] += face_normal[0];
            normals[vertex * 3 + 1] += face_normal[1];
            normals[vertex * 3 + 2] += face_normal[2];
        }
    }

    for normal in normals.chunks_exact_mut(3) {
        let length = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        if length > f32::EPSILON {
            normal.iter_mut().for_each(|n| *n /= length);
        } else {
            normal.copy_from_slice(&[0.0, 1.0, 0.0]);
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const QUAD_OBJ: &str = "mtllib quad.mtl
o quad
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl crate
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    const QUAD_MTL: &str = "newmtl crate
Kd 1.0 1.0 1.0
map_Kd textures/diffuse.png
map_Ks textures/specular.png
";

    #[test]
    fn test_load_quad_with_material() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quad.obj"), QUAD_OBJ).unwrap();
        fs::write(dir.path().join("quad.mtl"), QUAD_MTL).unwrap();

        let meshes = load_obj(dir.path().join("quad.obj")).unwrap();
        assert_eq!(meshes.len(), 1);

        let quad = &meshes[0];
        assert_eq!(quad.stride(), 8);
        assert_eq!(quad.vertex_count(), 4);
        // The quad is split into two triangles
        assert_eq!(quad.indices.len(), 6);
        assert_eq!(&quad.vertices[3..8], &[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            quad.diffuse_texture.as_deref(),
            Some(dir.path().join("textures/diffuse.png").as_path())
        );
        assert_eq!(
            quad.specular_texture.as_deref(),
            Some(dir.path().join("textures/specular.png").as_path())
        );
    }

    #[test]
    fn test_missing_normals_are_generated() {
        let dir = tempfile::tempdir().unwrap();
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        fs::write(dir.path().join("tri.obj"), obj).unwrap();

        let meshes = load_obj(dir.path().join("tri.obj")).unwrap();
        let tri = &meshes[0];
        assert_eq!(&tri.vertices[3..6], &[0.0, 0.0, 1.0]);
        assert!(tri.diffuse_texture.is_none());
    }

    #[test]
    fn test_missing_file() {
        match load_obj("does/not/exist.obj") {
            Err(RenderError::ResourceNotFound { path }) => {
                assert_eq!(path, Path::new("does/not/exist.obj"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_vertex_normals_average_faces() {
        // Two triangles folded along the X axis
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let indices = [0, 1, 2, 0, 3, 1];
        let normals = calculate_vertex_normals(&positions, &indices);

        let shared = &normals[0..3];
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((shared[0]).abs() < 1e-6);
        assert!((shared[1] - -expected).abs() < 1e-6 || (shared[1] - expected).abs() < 1e-6);
        assert!((shared[1].abs() - shared[2].abs()).abs() < 1e-6);
        // Vertex 2 only touches the first triangle
        assert_eq!(&normals[6..9], &[0.0, 0.0, 1.0]);
    }
}
