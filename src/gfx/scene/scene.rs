use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use super::object::{DrawContext, SceneObject};
use crate::error::Result;
use crate::gfx::camera::Camera;

/// Identifies an object within the scene that added it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Ordered collection of scene objects viewed through one camera
///
/// Objects draw in insertion order. The camera is shared with whoever
/// steers it, usually the render orchestrator's camera controller.
pub struct Scene {
    camera: Rc<RefCell<Camera>>,
    objects: Vec<(ObjectId, SceneObject)>,
    next_id: u64,
    validate_programs: bool,
    face_culling: bool,
}

impl Scene {
    /// Creates an empty scene drawn through `camera`
    pub fn new(camera: Rc<RefCell<Camera>>) -> Self {
        Self {
            camera,
            objects: Vec::new(),
            next_id: 0,
            validate_programs: false,
            face_culling: true,
        }
    }

    pub fn camera(&self) -> &Rc<RefCell<Camera>> {
        &self.camera
    }

    /// Validate every object's program before its draw
    pub fn set_program_validation(&mut self, validate: bool) {
        self.validate_programs = validate;
    }

    /// Let meshes enable back-face culling before their draws
    pub fn set_face_culling(&mut self, enabled: bool) {
        self.face_culling = enabled;
    }

    pub fn face_culling(&self) -> bool {
        self.face_culling
    }

    /// Appends `object` and returns its id
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push((id, object));
        debug!("Added scene object {} ({} total)", id.0, self.objects.len());
        id
    }

    /// Takes the object out of the scene, keeping the order of the rest
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|(object_id, _)| *object_id == id)?;
        Some(self.objects.remove(index).1)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|(object_id, _)| *object_id == id)
            .map(|(_, object)| object)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|(object_id, _)| *object_id == id)
            .map(|(_, object)| object)
    }

    /// Ids in draw order
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().map(|(id, _)| *id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every object, releasing resources no other object shares
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Draws every object once, in insertion order
    ///
    /// # Arguments
    /// * `delta_time` - Seconds since the previous frame
    /// * `absolute_time` - Seconds since the frame loop started
    pub fn draw(&mut self, delta_time: f64, absolute_time: f64) -> Result<()> {
        let camera = self.camera.borrow();
        let context = DrawContext {
            delta_time,
            absolute_time,
            camera: &camera,
            validate_program: self.validate_programs,
            face_culling: self.face_culling,
        };

        for (_, object) in self.objects.iter_mut() {
            object.draw(&context)?;
        }
        Ok(())
    }

    /// Disposes every object in insertion order
    pub fn dispose(self) {
        info!("Disposing scene with {} objects", self.objects.len());
        for (_, object) in self.objects {
            object.dispose();
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .field("validate_programs", &self.validate_programs)
            .field("face_culling", &self.face_culling)
            .finish()
    }
}
