//! Shadow pass: particle depth from a top-down light, double buffered.
//!
//! Each call renders into the back map and hands out the front one, then
//! swaps. The particle shader therefore always samples depth produced on the
//! previous frame, while the light matrix it gets is the current one.
//!
//! Light depth is written as a color value into an `R32Float` map, with a
//! shared z-buffer keeping the nearest particle. The particle vertex stage
//! reads the map with a plain `textureLoad`, which every backend can
//! translate. Depth textures cannot be loaded that way on GL.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::camera::LightCamera;
use super::particles::ParticleInstances;
use super::simulation::SimulationField;
use super::{allocation_scope, pipeline_scope};
use crate::config::SceneSettings;
use crate::error::SwarmError;
use crate::pingpong::{PingPong, Slot};
use crate::shader;
use crate::uniforms::{MaterialUniforms, ShadowUniforms};

/// Light-space depth as seen by the particle shader.
pub const SHADOW_MAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
/// Z-buffer of the shadow pass itself. Never sampled.
pub const SHADOW_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Which shadow map a frame's particle draw should sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthSource {
    Target(Slot),
    /// 1x1 map at depth 1.0: nothing is ever occluded.
    Sentinel,
}

/// Result of one [`ShadowPass::render`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrame {
    pub depth: DepthSource,
    pub light_space: Mat4,
}

struct ShadowMap {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

struct ShadowTargets {
    maps: PingPong<ShadowMap>,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

pub struct ShadowPass {
    light: LightCamera,
    resolution: u32,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    map_layout: wgpu::BindGroupLayout,
    targets: Option<ShadowTargets>,
    sentinel: ShadowMap,
    light_space: Mat4,
}

impl ShadowPass {
    /// Build the depth pipeline and the sentinel map. Call
    /// [`ShadowPass::allocate`] to get real shadows.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        state_layout: &wgpu::BindGroupLayout,
        scene: &SceneSettings,
    ) -> Result<Self, SwarmError> {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let map_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Map Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniform Buffer"),
            contents: bytemuck::bytes_of(&ShadowUniforms::new(
                Mat4::IDENTITY,
                scene.shadow_resolution,
                &MaterialUniforms::default(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = pipeline_scope(device, "shadow pipeline", || {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Shadow Shader"),
                source: wgpu::ShaderSource::Wgsl(shader::shadow_shader().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Shadow Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, state_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Shadow Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[ParticleInstances::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: SHADOW_MAP_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::RED,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SHADOW_DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let sentinel = create_shadow_map(device, &map_layout, 1, "Shadow Sentinel");
        clear_maps(device, queue, &[&sentinel]);

        Ok(Self {
            light: LightCamera::new(scene),
            resolution: scene.shadow_resolution.max(1),
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            map_layout,
            targets: None,
            sentinel,
            light_space: Mat4::IDENTITY,
        })
    }

    /// Allocate both shadow maps and the z-buffer at the fixed shadow
    /// resolution, clearing the maps to the far plane.
    ///
    /// On failure the pass stays on the sentinel: `render` draws nothing and
    /// every particle reads as lit.
    pub fn allocate(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<(), SwarmError> {
        let size = self.resolution;
        let max = device.limits().max_texture_dimension_2d;
        if size > max {
            self.targets = None;
            return Err(SwarmError::ResourceAllocation {
                resource: "shadow maps",
                message: format!("resolution {size} exceeds the device limit {max}"),
            });
        }

        let result = allocation_scope(device, "shadow maps", || {
            let a = create_shadow_map(device, &self.map_layout, size, "Shadow Map A");
            let b = create_shadow_map(device, &self.map_layout, size, "Shadow Map B");
            let depth = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Shadow Z-Buffer"),
                size: map_extent(size),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SHADOW_DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            (a, b, depth)
        });

        match result {
            Ok((a, b, depth)) => {
                clear_maps(device, queue, &[&a, &b]);
                let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
                self.targets = Some(ShadowTargets {
                    maps: PingPong::new(a, b),
                    _depth: depth,
                    depth_view,
                });
                tracing::debug!(resolution = size, "shadow maps allocated");
                Ok(())
            }
            Err(e) => {
                self.targets = None;
                Err(e)
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.targets.is_none()
    }

    pub fn light(&self) -> &LightCamera {
        &self.light
    }

    pub fn set_light(&mut self, light: LightCamera) {
        self.light = light;
    }

    /// Light matrix of the last render.
    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }

    /// Render the particles' depth from a light above `follow`.
    ///
    /// Writes the back map, returns the front one, then swaps.
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        field: &SimulationField,
        instances: &ParticleInstances,
        material: &MaterialUniforms,
        follow: Vec3,
    ) -> Result<ShadowFrame, SwarmError> {
        let state = field.current_bind_group()?;
        self.light_space = self.light.light_space(follow);

        let Some(targets) = self.targets.as_mut() else {
            return Ok(ShadowFrame {
                depth: DepthSource::Sentinel,
                light_space: self.light_space,
            });
        };

        let uniforms = ShadowUniforms::new(self.light_space, self.resolution, material);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.maps.back().view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(FAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, state, &[]);
            pass.set_vertex_buffer(0, instances.buffer().slice(..));
            pass.draw(0..6, 0..instances.count());
        }

        let previous = targets.maps.front_slot();
        targets.maps.swap();
        Ok(ShadowFrame {
            depth: DepthSource::Target(previous),
            light_space: self.light_space,
        })
    }

    /// Layout of the shadow map bind group the particle shader samples.
    pub fn map_layout(&self) -> &wgpu::BindGroupLayout {
        &self.map_layout
    }

    pub fn map_bind_group(&self, source: DepthSource) -> &wgpu::BindGroup {
        match (source, &self.targets) {
            (DepthSource::Target(slot), Some(targets)) => &targets.maps.get(slot).bind_group,
            _ => &self.sentinel.bind_group,
        }
    }
}

const FAR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 0.0,
    a: 0.0,
};

fn map_extent(size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: 1,
    }
}

fn create_shadow_map(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    size: u32,
    label: &str,
) -> ShadowMap {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: map_extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SHADOW_MAP_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&view),
        }],
    });
    ShadowMap {
        _texture: texture,
        view,
        bind_group,
    }
}

fn clear_maps(device: &wgpu::Device, queue: &wgpu::Queue, maps: &[&ShadowMap]) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Shadow Clear Encoder"),
    });
    for map in maps {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &map.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(FAR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
    queue.submit(std::iter::once(encoder.finish()));
}
