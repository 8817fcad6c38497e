//! GPU side of the swarm.
//!
//! [`Swarm`] owns one instance of every pipeline stage and drives them in a
//! fixed order each frame:
//!
//! 1. parameter animation tick
//! 2. attractor smoothing
//! 3. simulation step
//! 4. shadow depth render
//! 5. particle draw into the offscreen scene target
//! 6. compositor (or a plain copy when effects are off) onto the output view
//!
//! Everything is recorded into one command encoder and submitted once.
//! Pausing skips steps 3 to 5 but keeps the compositor running, so trails
//! fade out behind the hidden particles.

mod camera;
pub mod compositor;
mod particles;
mod post_process;
mod shadow;
mod simulation;

use std::time::Duration;

pub use camera::{Camera, LightCamera};
pub use compositor::{Compositor, CompositorState, GraphFactory, GraphInputs, PassGraph};
pub use particles::{ParticleInstances, ParticleRenderer};
pub use post_process::{
    bloom_factors, bloom_level_size, CompositorGraph, PostProcessFactory, PostProcessPipelines,
    SceneTarget, BLOOM_KERNEL_RADII, BLOOM_LEVELS,
};
pub use shadow::{DepthSource, ShadowFrame, ShadowPass, SHADOW_DEPTH_FORMAT, SHADOW_MAP_FORMAT};
pub use simulation::{SimulationField, STATE_FORMAT};

use crate::animator::{AnimationGroup, ParameterAnimator, ParameterSink, ParameterUpdate};
use crate::attractor::{Attractor, PointerState};
use crate::config::{MaterialParameters, SimulationParameters, SwarmConfig};
use crate::error::{GpuError, SwarmError};
use crate::input::PointerInput;
use crate::params;
use crate::seed::{seeded_rng, sphere_vertex_count, sphere_vertices, texture_size_for, SeedData};
use crate::time::Time;
use crate::uniforms::StepContext;

/// Offscreen scene and post-process intermediate format.
pub const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Run `create` inside an out-of-memory error scope.
pub(crate) fn allocation_scope<T>(
    device: &wgpu::Device,
    resource: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, SwarmError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(SwarmError::ResourceAllocation {
            resource,
            message: error.to_string(),
        }),
    }
}

/// Run `create` inside a validation error scope.
///
/// Shaders are translated per backend at pipeline creation, so a construct a
/// backend cannot express shows up here instead of as an uncaptured panic.
pub(crate) fn pipeline_scope<T>(
    device: &wgpu::Device,
    label: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, SwarmError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => Err(GpuError::Pipeline {
            label,
            message: error.to_string(),
        }
        .into()),
    }
}

/// Request an adapter and device, optionally compatible with `surface`.
pub async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), GpuError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;

    let info = adapter.get_info();
    tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Swarm Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;

    Ok((adapter, device, queue))
}

/// Writes animated values into the live simulation and material state.
struct LiveUniforms<'a> {
    simulation: &'a mut SimulationParameters,
    material: &'a mut MaterialParameters,
    particles: &'a mut ParticleRenderer,
}

impl ParameterSink for LiveUniforms<'_> {
    fn on_change(&mut self, update: ParameterUpdate) {
        match update {
            ParameterUpdate::Motion { speed, die_speed } => {
                self.simulation.speed = speed;
                self.simulation.die_speed = die_speed;
            }
            ParameterUpdate::Color(color) => {
                self.material.color = color;
                self.particles.set_material(self.material);
            }
        }
    }

    fn on_complete(&mut self, group: AnimationGroup) {
        tracing::trace!(?group, "animation settled");
    }
}

/// The whole pipeline, bound to one device.
pub struct Swarm {
    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Edited configuration.
    config: SwarmConfig,
    /// `config` with the animated values applied.
    live: SwarmConfig,

    time: Time,
    animator: ParameterAnimator,
    attractor: Attractor,
    camera: Camera,
    pointer_active: bool,

    field: SimulationField,
    instances: ParticleInstances,
    shadow: ShadowPass,
    last_shadow: ShadowFrame,
    particles: ParticleRenderer,
    pipelines: PostProcessPipelines,
    scene: SceneTarget,
    /// Output size the scene target is rebuilt to on the next frame.
    pending_size: Option<(u32, u32)>,
    scene_builds: u32,
    compositor: Compositor<CompositorGraph>,
}

impl Swarm {
    /// Build every stage for a `width` x `height` output of `output_format`.
    ///
    /// Scene settings (seed geometry, shadow resolution) are fixed here.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        mut config: SwarmConfig,
    ) -> Result<Self, SwarmError> {
        config.clamp_to_schema()?;

        let segments = config.scene.sphere_segments;
        let count = sphere_vertex_count(segments, segments)?;
        let max = device.limits().max_texture_dimension_2d;
        if texture_size_for(count) > max {
            return Err(SwarmError::configuration(format!(
                "{segments} sphere segments need a state texture larger than the device limit {max}"
            )));
        }
        let positions = sphere_vertices(config.scene.sphere_radius, segments, segments)?;
        let mut rng = seeded_rng(config.scene.seed);
        let seed = SeedData::tight(&positions, &mut rng)?;

        let mut field = SimulationField::new(&device)?;
        field.initialize(&device, &queue, &seed)?;
        let instances = ParticleInstances::new(&device, &seed);

        let mut shadow = ShadowPass::new(&device, &queue, field.render_layout(), &config.scene)?;
        if let Err(e) = shadow.allocate(&device, &queue) {
            tracing::warn!(error = %e, "shadows disabled");
        }

        let mut particles = ParticleRenderer::new(&device, field.render_layout(), shadow.map_layout())?;
        particles.set_field(&field);
        particles.set_material(&config.material);
        particles.set_resolution(width, height);

        let pipelines = PostProcessPipelines::new(&device, output_format)?;
        let scene = SceneTarget::new(&device, &pipelines, width, height)?;
        let compositor = Compositor::new(width, height, config.compositor);

        tracing::info!(
            particles = seed.layout.particle_count(),
            texture_size = seed.layout.texture_size(),
            width,
            height,
            "swarm initialized"
        );

        Ok(Self {
            time: Time::new(config.interaction.elapsed_time_factor),
            animator: ParameterAnimator::new(&config),
            attractor: Attractor::new(&config.simulation),
            camera: Camera::new(&config.scene),
            pointer_active: false,
            live: config.clone(),
            config,
            last_shadow: ShadowFrame {
                depth: DepthSource::Sentinel,
                light_space: glam::Mat4::IDENTITY,
            },
            device,
            queue,
            field,
            instances,
            shadow,
            particles,
            pipelines,
            scene,
            pending_size: None,
            scene_builds: 1,
            compositor,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Configuration with the animated values currently in effect.
    pub fn live_config(&self) -> &SwarmConfig {
        &self.live
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn field(&self) -> &SimulationField {
        &self.field
    }

    pub fn shadow(&self) -> &ShadowPass {
        &self.shadow
    }

    pub fn compositor(&self) -> &Compositor<CompositorGraph> {
        &self.compositor
    }

    pub fn attractor(&self) -> &Attractor {
        &self.attractor
    }

    pub fn animator(&self) -> &ParameterAnimator {
        &self.animator
    }

    /// How many scene targets have been allocated, the initial one included.
    pub fn scene_build_count(&self) -> u32 {
        self.scene_builds
    }

    /// New output size in physical pixels.
    ///
    /// Only the latest size is kept. The scene target is rebuilt once at the
    /// start of the next frame, so a burst of resize events allocates nothing.
    /// Zero sizes are remembered but ignored until a real size arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SwarmError> {
        self.compositor.resize(width, height);
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pending_size = (self.scene.size() != (width, height)).then_some((width, height));
        Ok(())
    }

    fn apply_pending_size(&mut self) -> Result<(), SwarmError> {
        let Some((width, height)) = self.pending_size.take() else {
            return Ok(());
        };
        let scene = SceneTarget::new(&self.device, &self.pipelines, width, height)?;
        std::mem::replace(&mut self.scene, scene).destroy();
        self.scene_builds += 1;
        self.particles.set_resolution(width, height);
        tracing::debug!(width, height, "scene target resized");
        Ok(())
    }

    /// Replace the configuration. Values are clamped into their domains.
    pub fn set_config(&mut self, mut config: SwarmConfig) -> Result<(), SwarmError> {
        config.clamp_to_schema()?;
        self.animator.rebase(&config);
        self.compositor.set_settings(config.compositor);
        self.time
            .set_elapsed_time_factor(config.interaction.elapsed_time_factor);

        let mut live = config.clone();
        live.simulation.speed = self.animator.speed();
        live.simulation.die_speed = self.animator.die_speed();
        live.material.color = self.animator.color();
        self.particles.set_material(&live.material);

        self.live = live;
        self.config = config;
        Ok(())
    }

    /// Set one tunable by name. Returns the clamped value.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<f32, SwarmError> {
        let mut config = self.config.clone();
        let applied = params::set(&mut config, name, value)?;
        self.set_config(config)?;
        Ok(applied)
    }

    pub fn is_paused(&self) -> bool {
        self.time.is_paused()
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused {
            self.time.pause();
        } else {
            self.time.resume();
        }
        tracing::info!(paused, "pause toggled");
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.is_paused());
    }

    pub fn effects_enabled(&self) -> bool {
        self.compositor.is_enabled()
    }

    pub fn set_effects_enabled(&mut self, enabled: bool) {
        self.config.compositor.enabled = enabled;
        self.live.compositor.enabled = enabled;
        self.compositor.set_enabled(enabled);
        tracing::info!(enabled, "effects toggled");
    }

    pub fn toggle_effects(&mut self) {
        self.set_effects_enabled(!self.effects_enabled());
    }

    /// Render one frame onto `output`, timing it with the wall clock.
    pub fn frame(&mut self, pointer: PointerInput, output: &wgpu::TextureView) -> Result<(), SwarmError> {
        let dt = self.time.update();
        self.render_frame(dt, pointer, output)
    }

    /// Render one frame as if `raw_delta` had passed.
    pub fn frame_with_delta(
        &mut self,
        raw_delta: Duration,
        pointer: PointerInput,
        output: &wgpu::TextureView,
    ) -> Result<(), SwarmError> {
        let dt = self.time.advance(raw_delta);
        self.render_frame(dt, pointer, output)
    }

    fn handle_gesture(&mut self, pointer: PointerInput) {
        let was_active = std::mem::replace(&mut self.pointer_active, pointer.active);
        if self.time.is_paused() || !self.config.interaction.click_to_color_change {
            return;
        }
        match (was_active, pointer.active) {
            (false, true) => {
                self.animator.press();
            }
            (true, false) => self.animator.release(),
            _ => {}
        }
    }

    fn render_frame(
        &mut self,
        dt: f32,
        pointer: PointerInput,
        output: &wgpu::TextureView,
    ) -> Result<(), SwarmError> {
        self.apply_pending_size()?;
        self.handle_gesture(pointer);

        let mut sink = LiveUniforms {
            simulation: &mut self.live.simulation,
            material: &mut self.live.material,
            particles: &mut self.particles,
        };
        self.animator.tick(dt, &mut sink);

        self.attractor.update(
            &self.live.simulation,
            PointerState {
                position: pointer.position,
                moving: pointer.moving,
            },
            self.live.interaction.pointer_factor,
            dt,
        );

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Swarm Frame Encoder"),
        });

        let paused = self.time.is_paused();
        if !paused {
            let ctx = StepContext {
                time: self.time.shader_time(),
                delta_time: dt,
                frame: self.time.frame(),
                follow_position: self.attractor.position(),
                radius: self.attractor.radius(),
            };
            self.field
                .step(&mut encoder, &self.queue, &self.live.simulation, &ctx)?;
            // The light tracks the configured base, not the smoothed attractor.
            self.last_shadow = self.shadow.render(
                &mut encoder,
                &self.queue,
                &self.field,
                &self.instances,
                self.particles.uniforms(),
                self.live.simulation.follow_position,
            )?;
        }

        let (width, height) = self.scene.size();
        self.particles
            .set_view_proj(self.camera.view_proj(width as f32 / height as f32));
        self.particles.set_visible(!paused);

        {
            let [r, g, b] = self.live.scene.background;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.scene.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.scene.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.particles.draw(
                &mut pass,
                &self.queue,
                &self.field,
                &self.shadow,
                &self.last_shadow,
                &self.instances,
            )?;
        }

        let mut factory = PostProcessFactory {
            device: &self.device,
            pipelines: &self.pipelines,
            scene: &self.scene,
        };
        self.compositor.prepare(&mut factory)?;
        match self.compositor.graph() {
            Some(graph) => graph.run(&mut encoder, &self.pipelines, output),
            None => self
                .pipelines
                .present(&mut encoder, self.scene.present_bind_group(), output),
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Copy the current particle state to the CPU. Blocks on the device.
    pub fn read_state(&self) -> Result<Vec<[f32; 4]>, SwarmError> {
        self.field.read_state(&self.device, &self.queue)
    }
}
