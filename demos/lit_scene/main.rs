//! # Lit Scene
//!
//! Checkerboard crates around an emissive lamp, a material-lit sphere
//! orbiting the lamp and a pulsating floor.
//!
//! Fly with W/A/S/D, Space and Left Ctrl, look with the mouse, zoom with
//! the wheel and quit with Escape.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use cgmath::{One, Quaternion};
use thistle::assets::ImageData;
use thistle::prelude::*;

const CRATE_POSITIONS: [[f32; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [2.0, 1.5, -6.0],
    [-1.5, -1.2, -2.5],
    [-3.8, 0.5, -8.3],
    [2.4, -0.4, -3.5],
];

fn asset(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(relative)
}

fn program(gl: &Gl, vertex: &str, fragment: &str) -> thistle::Result<Rc<ShaderProgram>> {
    let program = ShaderProgram::from_files(
        gl,
        asset(&format!("shaders/{vertex}")),
        asset(&format!("shaders/{fragment}")),
    )?;
    Ok(Rc::new(program))
}

fn checkerboard(gl: &Gl, even: [u8; 4], odd: [u8; 4]) -> thistle::Result<Rc<Texture>> {
    let image = ImageData::checkerboard(256, 8, even, odd);
    Ok(Rc::new(Texture::from_image(
        gl,
        &image,
        TextureOptions::default(),
    )?))
}

fn build_scene(gl: &Gl, camera: Rc<RefCell<Camera>>) -> thistle::Result<Scene> {
    let light_position = Vector3::new(1.2, 1.0, 2.0);
    let mut scene = Scene::new(camera);

    // Crates
    let textured = program(gl, "lit.vert", "lit_textured.frag")?;
    let textures = MeshTextures {
        diffuse: Some(checkerboard(gl, [196, 140, 80, 255], [120, 80, 40, 255])?),
        specular: Some(checkerboard(gl, [230, 230, 230, 255], [30, 30, 30, 255])?),
    };
    let crate_meshes = load_obj(asset("models/crate.obj"))?
        .iter()
        .map(|description| MeshResource::new(gl, description, textures.clone()).map(Rc::new))
        .collect::<thistle::Result<Vec<_>>>()?;

    for (i, position) in CRATE_POSITIONS.iter().enumerate() {
        for mesh in &crate_meshes {
            let mut object = SceneObject::new(mesh.clone(), textured.clone())?
                .with_attribute(SpecularWithTextureMaterial::default())
                .with_attribute(LitByEmissive::new(light_position));
            object.set_position(Vector3::from(*position))?;
            if i % 2 == 0 {
                object = object.with_behavior(RotationOnXY::default());
            }
            scene.add(object);
        }
    }

    // Lamp
    let white = program(gl, "lit.vert", "white.frag")?;
    let lamp_mesh = Rc::new(MeshResource::new(
        gl,
        &generate_cube(),
        MeshTextures::default(),
    )?);
    scene.add(SceneObject::new(lamp_mesh, white)?.with_transform(
        light_position,
        0.2,
        Quaternion::one(),
    )?);

    // Sphere orbiting the lamp
    let material = program(gl, "lit.vert", "lit_material.frag")?;
    let sphere_mesh = Rc::new(MeshResource::new(
        gl,
        &generate_sphere(32, 16),
        MeshTextures::default(),
    )?);
    let mut sphere = SceneObject::new(sphere_mesh, material)?
        .with_attribute(SimpleMaterial::default())
        .with_attribute(LitByEmissive::new(light_position))
        .with_behavior(Orbit::new(light_position, 1.5, 45.0));
    sphere.set_scale(0.3)?;
    scene.add(sphere);

    // Floor
    let pulsating = program(gl, "lit.vert", "pulsating_blue.frag")?;
    let floor_mesh = Rc::new(MeshResource::new(
        gl,
        &generate_plane(20.0, 20.0, 4, 4),
        MeshTextures::default(),
    )?);
    let mut floor = SceneObject::new(floor_mesh, pulsating)?.with_attribute(PulsatingBlue);
    floor.set_position(Vector3::new(0.0, -2.0, 0.0))?;
    scene.add(floor);

    log::info!("Built scene with {} objects", scene.object_count());
    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_filter("info,thistle=debug"));

    let debug = cfg!(debug_assertions);
    let orchestrator = RenderOrchestrator::new(build_scene)
        .with_render_config(
            RenderConfig::default()
                .with_clear_color([0.1, 0.1, 0.12, 1.0])
                .with_debug_output(debug),
        )
        .with_camera_config(CameraConfig::default().with_position(Point3::new(0.0, 0.0, 6.0)));

    GlApp::new(
        WindowConfig::default()
            .with_title("thistle - lit scene")
            .with_debug_context(debug),
        orchestrator,
    )
    .run()
    .context("lit scene demo failed")
}
