//! Windowed runner.
//!
//! [`Simulation`] collects a [`SwarmConfig`] plus a few start-up switches,
//! then `run()` opens a window, creates the surface and drives a [`Swarm`]
//! from the winit event loop until the window closes.
//!
//! Keys: `Space` pauses, `E` toggles the post-processing effects.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

use crate::config::SwarmConfig;
use crate::error::{GpuError, SwarmError};
use crate::gpu::{request_device, Swarm};
use crate::input::Input;

/// A swarm builder.
///
/// Use method chaining to configure, then call `.run()` to start.
pub struct Simulation {
    config: SwarmConfig,
    start_paused: bool,
    title: String,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            config: SwarmConfig::default(),
            start_paused: false,
            title: "swarmlight".to_string(),
        }
    }

    pub fn with_config(mut self, config: SwarmConfig) -> Self {
        self.config = config;
        self
    }

    /// Width and height segments of the seed sphere.
    pub fn with_segments(mut self, segments: u32) -> Self {
        self.config.scene.sphere_segments = segments;
        self
    }

    pub fn with_effects(mut self, enabled: bool) -> Self {
        self.config.compositor.enabled = enabled;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.start_paused = paused;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Run until the window is closed.
    pub fn run(self) -> Result<(), SwarmError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;
        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Surface plus the swarm drawing into it.
struct Display {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    swarm: Swarm,
}

impl Display {
    async fn new(window: Arc<Window>, config: SwarmConfig) -> Result<Self, SwarmError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(GpuError::from)?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&adapter);
        // Colors are authored in display space and written as is.
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let swarm = Swarm::new(
            device,
            queue,
            format,
            surface_config.width,
            surface_config.height,
            config,
        )?;

        Ok(Self {
            window,
            surface,
            surface_config,
            swarm,
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SwarmError> {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface
                .configure(self.swarm.device(), &self.surface_config);
        }
        self.swarm.resize(width, height)
    }

    fn reconfigure(&mut self) {
        self.surface
            .configure(self.swarm.device(), &self.surface_config);
    }
}

struct App {
    settings: Simulation,
    display: Option<Display>,
    input: Input,
    last_redraw: Instant,
    error: Option<SwarmError>,
}

impl App {
    fn new(settings: Simulation) -> Self {
        let input = Input::new(settings.config.interaction.moving_timeout);
        Self {
            settings,
            display: None,
            input,
            last_redraw: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SwarmError) {
        tracing::error!(error = %error, "stopping");
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let wall_dt = now.duration_since(self.last_redraw).as_secs_f32();
        self.last_redraw = now;

        let Some(display) = self.display.as_mut() else {
            return;
        };

        if self.input.key_pressed(KeyCode::Space) {
            display.swarm.toggle_pause();
        }
        if self.input.key_pressed(KeyCode::KeyE) {
            display.swarm.toggle_effects();
        }

        let frame = match display.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                display.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                let error = SwarmError::ResourceAllocation {
                    resource: "surface texture",
                    message: "out of memory".to_string(),
                };
                self.fail(event_loop, error);
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "frame skipped");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let result = display.swarm.frame(self.input.pointer_input(), &view);
        display.window.pre_present_notify();
        frame.present();

        self.input.advance(wall_dt);
        self.input.end_frame();

        if let Err(e) = result {
            if e.is_recoverable() {
                tracing::warn!(error = %e, "frame dropped");
            } else {
                self.fail(event_loop, e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        };

        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        match pollster::block_on(Display::new(window.clone(), self.settings.config.clone())) {
            Ok(mut display) => {
                if self.settings.start_paused {
                    display.swarm.set_paused(true);
                }
                self.display = Some(display);
                self.last_redraw = Instant::now();
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(display) = self.display.as_mut() {
                    if let Err(e) = display.resize(size.width, size.height) {
                        self.fail(event_loop, e);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(display) = &self.display {
                    display.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_writes_config() {
        let sim = Simulation::new()
            .with_segments(64)
            .with_effects(false)
            .paused(true);
        assert_eq!(sim.config().scene.sphere_segments, 64);
        assert!(!sim.config().compositor.enabled);
        assert!(sim.start_paused);
    }
}
