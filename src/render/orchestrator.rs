use std::cell::RefCell;
use std::rc::Rc;

use log::{error, info, trace};
use winit::keyboard::KeyCode;

use super::host::{FrameHandler, FrameHost};
use super::state::{apply_render_config, DriverInfo};
use crate::config::{CameraConfig, RenderConfig};
use crate::error::Result;
use crate::gfx::camera::{Camera, CameraController};
use crate::gfx::scene::Scene;
use crate::gl::Gl;

/// Builds the scene once the native context exists
pub trait SceneLoader {
    fn load_scene(&mut self, gl: &Gl, camera: Rc<RefCell<Camera>>) -> Result<Scene>;
}

impl<F> SceneLoader for F
where
    F: FnMut(&Gl, Rc<RefCell<Camera>>) -> Result<Scene>,
{
    fn load_scene(&mut self, gl: &Gl, camera: Rc<RefCell<Camera>>) -> Result<Scene> {
        self(gl, camera)
    }
}

/// State that only exists between load and close
struct Loaded {
    gl: Gl,
    camera: Rc<RefCell<Camera>>,
    scene: Option<Scene>,
}

/// Connects a frame host to a scene and a fly camera
///
/// Load applies the global render state and builds the scene through the
/// [`SceneLoader`]. Each update feeds queued pointer events and held keys to
/// the camera controller; each render clears, draws the scene and presents.
/// Close disposes the scene, then releases input and the context, once.
pub struct RenderOrchestrator {
    render_config: RenderConfig,
    camera_config: CameraConfig,
    loader: Box<dyn SceneLoader>,
    controller: CameraController,
    exit_key: KeyCode,
    loaded: Option<Loaded>,
    closed: bool,
}

impl RenderOrchestrator {
    pub fn new(loader: impl SceneLoader + 'static) -> Self {
        let camera_config = CameraConfig::default();
        Self {
            render_config: RenderConfig::default(),
            controller: CameraController::from_config(&camera_config),
            camera_config,
            loader: Box::new(loader),
            exit_key: KeyCode::Escape,
            loaded: None,
            closed: false,
        }
    }

    pub fn with_render_config(mut self, config: RenderConfig) -> Self {
        self.render_config = config;
        self
    }

    pub fn with_camera_config(mut self, config: CameraConfig) -> Self {
        self.controller = CameraController::from_config(&config);
        self.camera_config = config;
        self
    }

    pub fn with_exit_key(mut self, key: KeyCode) -> Self {
        self.exit_key = key;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.loaded.as_ref().and_then(|loaded| loaded.scene.as_ref())
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.loaded.as_mut().and_then(|loaded| loaded.scene.as_mut())
    }

    pub fn camera(&self) -> Option<&Rc<RefCell<Camera>>> {
        self.loaded.as_ref().map(|loaded| &loaded.camera)
    }
}

impl FrameHandler for RenderOrchestrator {
    fn on_load(&mut self, host: &mut dyn FrameHost) -> Result<()> {
        let gl = host.backend();

        let driver = DriverInfo::query(gl.as_ref());
        info!("GL vendor: {}", driver.vendor);
        info!("GL renderer: {}", driver.renderer);
        info!("GL version: {}", driver.version);

        apply_render_config(gl.as_ref(), &self.render_config, &driver)?;

        let (width, height) = host.viewport_size();
        gl.viewport(0, 0, width as i32, height as i32);

        let mut camera = Camera::new(&self.camera_config);
        camera.set_viewport(width, height);
        let camera = Rc::new(RefCell::new(camera));

        let mut scene = self.loader.load_scene(&gl, camera.clone())?;
        scene.set_program_validation(self.render_config.validate_programs);
        scene.set_face_culling(self.render_config.face_culling_for(&driver.vendor));
        info!("Scene loaded with {} objects", scene.object_count());

        self.loaded = Some(Loaded {
            gl,
            camera,
            scene: Some(scene),
        });
        Ok(())
    }

    fn on_update(&mut self, host: &mut dyn FrameHost, delta_time: f64) -> Result<()> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(());
        };
        let mut camera = loaded.camera.borrow_mut();

        for event in host.drain_pointer_events() {
            self.controller.process_pointer_event(&event, &mut camera);
        }

        if host.keyboard().is_pressed(self.exit_key) {
            info!("Exit key pressed");
            host.request_exit();
            return Ok(());
        }

        self.controller
            .update(delta_time as f32, host.keyboard(), &mut camera);
        Ok(())
    }

    fn on_render(&mut self, host: &mut dyn FrameHost, delta_time: f64) -> Result<()> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };

        loaded.gl.clear(true, true);
        if let Some(scene) = loaded.scene.as_mut() {
            scene.draw(delta_time, host.elapsed_seconds())?;
        }
        trace!("Frame rendered in {:.4}s", delta_time);
        host.present()
    }

    fn on_resize(&mut self, _host: &mut dyn FrameHost, width: u32, height: u32) -> Result<()> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(());
        };

        loaded.gl.viewport(0, 0, width as i32, height as i32);
        loaded.camera.borrow_mut().set_viewport(width, height);
        Ok(())
    }

    fn on_close(&mut self, host: &mut dyn FrameHost) {
        if self.closed {
            return;
        }
        self.closed = true;
        info!("Closing render orchestrator");

        if let Some(mut loaded) = self.loaded.take() {
            if let Some(scene) = loaded.scene.take() {
                scene.dispose();
            }
        }
        self.controller.reset_pointer();

        if let Err(err) = host.release_input() {
            error!("Failed to release input: {}", err);
        }
        if let Err(err) = host.release_context() {
            error!("Failed to release context: {}", err);
        }
    }
}

impl std::fmt::Debug for RenderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOrchestrator")
            .field("render_config", &self.render_config)
            .field("camera_config", &self.camera_config)
            .field("loaded", &self.loaded.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
