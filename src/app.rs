//! # Windowed Runner
//!
//! [`GlApp`] opens a window with an OpenGL 3.3 core context through winit
//! and glutin and drives a [`FrameHandler`] from the event loop. Input
//! events are folded into an [`InputState`] between frames.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, PossiblyCurrentContext, Version,
};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    raw_window_handle::HasWindowHandle,
    window::{Window, WindowId},
};

use crate::config::WindowConfig;
use crate::error::{RenderError, Result};
use crate::gl::{Gl, GlowBackend};
use crate::input::{InputState, KeyboardState, PointerEvent};
use crate::render::{FrameHandler, FrameHost};

/// Window, context and input behind a running [`GlApp`]
struct WindowHost {
    backend: Gl,
    // Surface and context are released before the window goes away
    surface: Option<Surface<WindowSurface>>,
    context: Option<PossiblyCurrentContext>,
    window: Window,
    input: InputState,
    started: Instant,
    exit_requested: bool,
}

impl WindowHost {
    fn create(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self> {
        let window_attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));
        let template = ConfigTemplateBuilder::new().with_depth_size(config.depth_bits);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(event_loop, template, pick_config)
            .map_err(RenderError::context)?;
        let window =
            window.ok_or_else(|| RenderError::Context("display did not create a window".into()))?;

        let raw_window_handle = window
            .window_handle()
            .map_err(RenderError::context)?
            .as_raw();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .with_debug(config.debug_context)
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .map_err(RenderError::context)?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(RenderError::context)?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(RenderError::context)?;
        let context = not_current
            .make_current(&surface)
            .map_err(RenderError::context)?;

        let interval = if config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            warn!("Could not set swap interval: {}", err);
        }

        let backend =
            unsafe { GlowBackend::from_loader(|symbol| gl_display.get_proc_address(symbol)) };
        info!("Created OpenGL context for '{}'", config.title);

        Ok(Self {
            backend: Rc::new(backend),
            surface: Some(surface),
            context: Some(context),
            window,
            input: InputState::new(),
            started: Instant::now(),
            exit_requested: false,
        })
    }

    fn resize_surface(&self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) =
            (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        if let (Some(surface), Some(context)) = (&self.surface, &self.context) {
            surface.resize(context, width, height);
        }
    }
}

/// Prefers the configuration with the most samples
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("Display offered no GL configurations")
}

impl FrameHost for WindowHost {
    fn backend(&self) -> Gl {
        self.backend.clone()
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.window.inner_size().into()
    }

    fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn keyboard(&self) -> &dyn KeyboardState {
        &self.input
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerEvent> {
        self.input.drain_pointer_events()
    }

    fn present(&mut self) -> Result<()> {
        match (&self.surface, &self.context) {
            (Some(surface), Some(context)) => {
                surface.swap_buffers(context).map_err(RenderError::context)
            }
            _ => Err(RenderError::Context("context already released".into())),
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn release_input(&mut self) -> Result<()> {
        self.input.reset();
        Ok(())
    }

    fn release_context(&mut self) -> Result<()> {
        self.surface = None;
        if let Some(context) = self.context.take() {
            context.make_not_current().map_err(RenderError::context)?;
        }
        Ok(())
    }
}

/// Event loop state while the app runs
struct Runner<H: FrameHandler> {
    config: WindowConfig,
    handler: H,
    host: Option<WindowHost>,
    last_frame: Option<Instant>,
    error: Option<RenderError>,
    closed: bool,
}

impl<H: FrameHandler> Runner<H> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RenderError) {
        error!("Fatal error: {}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
        self.close(event_loop);
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if !self.closed {
            self.closed = true;
            if let Some(host) = self.host.as_mut() {
                self.handler.on_close(host);
            }
        }
        event_loop.exit();
    }

    fn frame(&mut self) -> Result<bool> {
        let Some(host) = self.host.as_mut() else {
            return Ok(true);
        };

        let now = Instant::now();
        let delta_time = self
            .last_frame
            .replace(now)
            .map(|last| (now - last).as_secs_f64())
            .unwrap_or(0.0);

        self.handler.on_update(host, delta_time)?;
        if host.exit_requested {
            return Ok(false);
        }
        self.handler.on_render(host, delta_time)?;
        Ok(true)
    }
}

impl<H: FrameHandler> ApplicationHandler for Runner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() || self.closed {
            return;
        }

        let mut host = match WindowHost::create(event_loop, &self.config) {
            Ok(host) => host,
            Err(err) => {
                error!("Fatal error: {}", err);
                self.error = Some(err);
                self.closed = true;
                event_loop.exit();
                return;
            }
        };

        let loaded = self.handler.on_load(&mut host);
        self.host = Some(host);
        if let Err(err) = loaded {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.closed {
            return;
        }
        let Some(host) = self.host.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => self.close(event_loop),
            WindowEvent::Resized(size) => {
                host.resize_surface(size);
                if size.width > 0 && size.height > 0 {
                    if let Err(err) = self.handler.on_resize(host, size.width, size.height) {
                        self.fail(event_loop, err);
                    }
                }
            }
            WindowEvent::RedrawRequested => match self.frame() {
                Ok(true) => {}
                Ok(false) => self.close(event_loop),
                Err(err) => self.fail(event_loop, err),
            },
            other => {
                host.input.process_window_event(&other);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(host) = self.host.as_ref() {
            host.window.request_redraw();
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.close(event_loop);
    }
}

/// Runs a [`FrameHandler`] in a native window
pub struct GlApp<H: FrameHandler> {
    config: WindowConfig,
    handler: H,
}

impl<H: FrameHandler> GlApp<H> {
    pub fn new(config: WindowConfig, handler: H) -> Self {
        Self { config, handler }
    }

    /// Runs the event loop until the window closes
    ///
    /// Returns the first fatal error raised by the handler or by context
    /// creation. The handler is closed before this returns either way.
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new().map_err(RenderError::context)?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = Runner {
            config: self.config,
            handler: self.handler,
            host: None,
            last_frame: None,
            error: None,
            closed: false,
        };
        event_loop
            .run_app(&mut runner)
            .map_err(RenderError::context)?;

        match runner.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
