//! Simulation field: GPU-resident particle state advanced by a compute pass.
//!
//! State lives in a pair of `Rgba32Float` textures, one texel per particle
//! holding `(x, y, z, life)`. Each step reads the front texture, writes the
//! back one through a storage binding, then swaps. A third texture keeps the
//! seed positions for respawning. Nothing is read back to the CPU per frame.

use wgpu::util::DeviceExt;

use super::{allocation_scope, pipeline_scope};
use crate::config::SimulationParameters;
use crate::error::{GpuError, SwarmError};
use crate::pingpong::{PingPong, Slot};
use crate::seed::{FieldLayout, SeedData};
use crate::shader;
use crate::uniforms::{SimulationUniforms, StepContext};

/// Texel format of the state and seed textures.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const WORKGROUP_SIZE: u32 = 8;
const STATE_TEXEL_BYTES: u32 = 16;

struct StateTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Everything that exists only after [`SimulationField::initialize`].
struct FieldResources {
    layout: FieldLayout,
    states: PingPong<StateTexture>,
    _seed: StateTexture,
    /// Indexed by the slot being read.
    compute_bind_groups: [wgpu::BindGroup; 2],
    /// Indexed by the slot exposed to the render passes.
    render_bind_groups: [wgpu::BindGroup; 2],
}

/// Owner of the particle state and the step pipeline.
pub struct SimulationField {
    pipeline: wgpu::ComputePipeline,
    compute_layout: wgpu::BindGroupLayout,
    render_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniforms: SimulationUniforms,
    resources: Option<FieldResources>,
}

impl SimulationField {
    /// Compile the step pipeline. No particle state exists yet.
    pub fn new(device: &wgpu::Device) -> Result<Self, SwarmError> {
        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Simulation Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                state_texture_entry(1, wgpu::ShaderStages::COMPUTE),
                state_texture_entry(2, wgpu::ShaderStages::COMPUTE),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle State Bind Group Layout"),
            entries: &[state_texture_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let pipeline = pipeline_scope(device, "simulation pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Simulation Shader"),
                source: wgpu::ShaderSource::Wgsl(shader::simulation_shader().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Simulation Pipeline Layout"),
                bind_group_layouts: &[&compute_layout],
                push_constant_ranges: &[],
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Simulation Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        let uniforms = SimulationUniforms::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            pipeline,
            compute_layout,
            render_layout,
            uniform_buffer,
            uniforms,
            resources: None,
        })
    }

    /// Upload the seed and build both state textures from it.
    ///
    /// Replaces any previous state. On error the field keeps no partial state.
    pub fn initialize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        seed: &SeedData,
    ) -> Result<(), SwarmError> {
        self.resources = None;

        let layout = seed.layout;
        let size = layout.texture_size();
        let max = device.limits().max_texture_dimension_2d;
        if size > max {
            return Err(SwarmError::configuration(format!(
                "state texture side {size} exceeds the device limit {max}"
            )));
        }

        let data: &[u8] = bytemuck::cast_slice(&seed.texels);
        let resources = allocation_scope(device, "simulation state textures", || {
            let seed_texture = create_state_texture(device, queue, "Seed Texture", size, data);
            let a = create_state_texture(device, queue, "Particle State A", size, data);
            let b = create_state_texture(device, queue, "Particle State B", size, data);

            let compute_bind_groups = [
                self.compute_bind_group(device, &a, &b, &seed_texture, "Simulation Bind Group A->B"),
                self.compute_bind_group(device, &b, &a, &seed_texture, "Simulation Bind Group B->A"),
            ];
            let render_bind_groups = [
                self.render_bind_group(device, &a, "Particle State Bind Group A"),
                self.render_bind_group(device, &b, "Particle State Bind Group B"),
            ];

            FieldResources {
                layout,
                states: PingPong::new(a, b),
                _seed: seed_texture,
                compute_bind_groups,
                render_bind_groups,
            }
        })?;

        self.uniforms.particle_count = layout.particle_count();
        self.uniforms.texture_size = size;
        self.resources = Some(resources);

        tracing::debug!(
            particles = layout.particle_count(),
            texture_size = size,
            "simulation field initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    pub fn layout(&self) -> Option<FieldLayout> {
        self.resources.as_ref().map(|r| r.layout)
    }

    /// Record one step into `encoder` and swap.
    ///
    /// The uniform upload goes through the queue, so at most one step per
    /// submission sees its own parameters. Returns the slot now holding the
    /// current state.
    pub fn step(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        params: &SimulationParameters,
        ctx: &StepContext,
    ) -> Result<Slot, SwarmError> {
        let resources = self
            .resources
            .as_mut()
            .ok_or(SwarmError::NotInitialized("simulation field"))?;

        let layout = resources.layout;
        self.uniforms =
            SimulationUniforms::new(params, ctx, layout.particle_count(), layout.texture_size());
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Simulation Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(
                0,
                &resources.compute_bind_groups[resources.states.front_slot().index()],
                &[],
            );
            let groups = layout.texture_size().div_ceil(WORKGROUP_SIZE);
            pass.dispatch_workgroups(groups, groups, 1);
        }

        resources.states.swap();
        Ok(resources.states.front_slot())
    }

    /// Uniforms of the last step.
    pub fn uniforms(&self) -> &SimulationUniforms {
        &self.uniforms
    }

    /// Layout of the bind group exposing the current state to render passes.
    pub fn render_layout(&self) -> &wgpu::BindGroupLayout {
        &self.render_layout
    }

    /// Bind group exposing the current state texture.
    pub fn current_bind_group(&self) -> Result<&wgpu::BindGroup, SwarmError> {
        let resources = self
            .resources
            .as_ref()
            .ok_or(SwarmError::NotInitialized("simulation field"))?;
        Ok(&resources.render_bind_groups[resources.states.front_slot().index()])
    }

    /// Copy the current state back to the CPU. Blocks on the device.
    pub fn read_state(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<[f32; 4]>, SwarmError> {
        let resources = self
            .resources
            .as_ref()
            .ok_or(SwarmError::NotInitialized("simulation field"))?;
        let size = resources.layout.texture_size();
        let unpadded = size * STATE_TEXEL_BYTES;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Readback Buffer"),
            size: (padded * size) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("State Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &resources.states.front().texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(size),
                },
            },
            texture_extent(size),
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?
            .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

        let mut texels = Vec::with_capacity((size * size) as usize);
        {
            let bytes = slice.get_mapped_range();
            for row in bytes.chunks(padded as usize) {
                let row: &[[f32; 4]] = bytemuck::cast_slice(&row[..unpadded as usize]);
                texels.extend_from_slice(row);
            }
        }
        staging.unmap();
        Ok(texels)
    }

    fn compute_bind_group(
        &self,
        device: &wgpu::Device,
        read: &StateTexture,
        write: &StateTexture,
        seed: &StateTexture,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.compute_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&read.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&seed.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&write.view),
                },
            ],
        })
    }

    fn render_bind_group(
        &self,
        device: &wgpu::Device,
        state: &StateTexture,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.render_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&state.view),
            }],
        })
    }
}

fn state_texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn texture_extent(size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: 1,
    }
}

fn create_state_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    size: u32,
    data: &[u8],
) -> StateTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: texture_extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    StateTexture { texture, view }
}
