//! # Frame Hosts
//!
//! A host owns the window (or its stand-in), the native context and the
//! input source. It drives a [`FrameHandler`] through load, update, render,
//! resize and close, and offers the handler the services it needs during
//! those callbacks.

use std::rc::Rc;

use crate::error::Result;
use crate::gl::{Gl, HeadlessBackend};
use crate::input::{InputState, KeyboardState, PointerEvent};

/// Services a host provides to its frame handler
pub trait FrameHost {
    /// Backend bound to the host's current context
    fn backend(&self) -> Gl;

    /// Framebuffer size in pixels
    fn viewport_size(&self) -> (u32, u32);

    /// Seconds since the frame loop started
    fn elapsed_seconds(&self) -> f64;

    fn keyboard(&self) -> &dyn KeyboardState;

    /// Pointer events received since the previous call, oldest first
    fn drain_pointer_events(&mut self) -> Vec<PointerEvent>;

    /// Shows the finished frame
    fn present(&mut self) -> Result<()>;

    /// Asks the host to close after the current frame
    fn request_exit(&mut self);

    /// Stops delivering input
    fn release_input(&mut self) -> Result<()>;

    /// Releases the native context; the backend is unusable afterwards
    fn release_context(&mut self) -> Result<()>;
}

/// Receives the frame lifecycle from a [`FrameHost`]
pub trait FrameHandler {
    fn on_load(&mut self, host: &mut dyn FrameHost) -> Result<()>;

    fn on_update(&mut self, host: &mut dyn FrameHost, delta_time: f64) -> Result<()>;

    fn on_render(&mut self, host: &mut dyn FrameHost, delta_time: f64) -> Result<()>;

    fn on_resize(&mut self, host: &mut dyn FrameHost, width: u32, height: u32) -> Result<()>;

    /// Final callback; must not fail
    fn on_close(&mut self, host: &mut dyn FrameHost);
}

/// Host over [`HeadlessBackend`] with scripted input and a manual clock
///
/// Counts presented frames and release calls so tests can check the
/// lifecycle a handler goes through.
pub struct HeadlessHost {
    backend: Rc<HeadlessBackend>,
    input: InputState,
    viewport: (u32, u32),
    elapsed: f64,
    presented_frames: usize,
    exit_requested: bool,
    input_releases: usize,
    context_releases: usize,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_backend(Rc::new(HeadlessBackend::new()), width, height)
    }

    pub fn with_backend(backend: Rc<HeadlessBackend>, width: u32, height: u32) -> Self {
        Self {
            backend,
            input: InputState::new(),
            viewport: (width, height),
            elapsed: 0.0,
            presented_frames: 0,
            exit_requested: false,
            input_releases: 0,
            context_releases: 0,
        }
    }

    /// The emulated backend, for inspecting recorded state
    pub fn headless_backend(&self) -> &Rc<HeadlessBackend> {
        &self.backend
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn presented_frames(&self) -> usize {
        self.presented_frames
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn input_releases(&self) -> usize {
        self.input_releases
    }

    pub fn context_releases(&self) -> usize {
        self.context_releases
    }

    /// Advances the clock by `delta_time` and runs one update and render
    pub fn step(&mut self, handler: &mut dyn FrameHandler, delta_time: f64) -> Result<()> {
        self.elapsed += delta_time;
        handler.on_update(self, delta_time)?;
        handler.on_render(self, delta_time)
    }

    /// Changes the framebuffer size and notifies `handler`
    pub fn resize(&mut self, handler: &mut dyn FrameHandler, width: u32, height: u32) -> Result<()> {
        self.viewport = (width, height);
        handler.on_resize(self, width, height)
    }
}

impl FrameHost for HeadlessHost {
    fn backend(&self) -> Gl {
        self.backend.clone()
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    fn keyboard(&self) -> &dyn KeyboardState {
        &self.input
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        self.input.drain_pointer_events()
    }

    fn present(&mut self) -> Result<()> {
        self.presented_frames += 1;
        Ok(())
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn release_input(&mut self) -> Result<()> {
        self.input_releases += 1;
        self.input.reset();
        Ok(())
    }

    fn release_context(&mut self) -> Result<()> {
        self.context_releases += 1;
        Ok(())
    }
}
