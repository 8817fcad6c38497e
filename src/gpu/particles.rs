//! Particle renderer: one instanced quad per state texel.
//!
//! The vertex stage fetches the particle position straight from the current
//! state texture by instance index, so the only vertex data is a per-texel
//! random size seed uploaded once. Texels past the particle count and
//! particles behind the camera get a zero-area quad. Nothing is culled on
//! the CPU.

use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

use super::shadow::{ShadowFrame, ShadowPass};
use super::simulation::SimulationField;
use super::{pipeline_scope, SCENE_COLOR_FORMAT, SCENE_DEPTH_FORMAT};
use crate::config::MaterialParameters;
use crate::error::SwarmError;
use crate::seed::SeedData;
use crate::shader;
use crate::uniforms::MaterialUniforms;

/// Per-texel size seeds, shared by the particle and shadow draws.
pub struct ParticleInstances {
    buffer: wgpu::Buffer,
    count: u32,
}

impl ParticleInstances {
    pub fn new(device: &wgpu::Device, seed: &SeedData) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Size Seed Buffer"),
            contents: bytemuck::cast_slice(&seed.size_seeds),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            buffer,
            count: seed.layout.texel_count(),
        }
    }

    /// Instance-rate `f32` at location 0.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Every texel, inert ones included.
    pub fn count(&self) -> u32 {
        self.count
    }
}

pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: MaterialUniforms,
    visible: bool,
}

impl ParticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        state_layout: &wgpu::BindGroupLayout,
        shadow_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, SwarmError> {
        let uniforms = MaterialUniforms::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = pipeline_scope(device, "particle pipeline", || {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Particle Shader"),
                source: wgpu::ShaderSource::Wgsl(shader::particle_shader().into()),
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, state_layout, shadow_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Particle Pipeline"),
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
                        format: SCENE_COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: SCENE_DEPTH_FORMAT,
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

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            visible: true,
        })
    }

    pub fn uniforms(&self) -> &MaterialUniforms {
        &self.uniforms
    }

    pub fn set_material(&mut self, material: &MaterialParameters) {
        self.uniforms.set_material(material);
    }

    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        self.uniforms.set_view_proj(view_proj);
    }

    /// Drawing buffer size in physical pixels.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.uniforms
            .set_resolution(Vec2::new(width.max(1) as f32, height.max(1) as f32));
    }

    pub fn set_field(&mut self, field: &SimulationField) {
        if let Some(layout) = field.layout() {
            self.uniforms.particle_count = layout.particle_count();
            self.uniforms.texture_size = layout.texture_size();
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Record the particle draw into an open scene pass.
    ///
    /// Does nothing while hidden.
    pub fn draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        queue: &wgpu::Queue,
        field: &SimulationField,
        shadow: &ShadowPass,
        frame: &ShadowFrame,
        instances: &ParticleInstances,
    ) -> Result<(), SwarmError> {
        if !self.visible {
            return Ok(());
        }
        let state = field.current_bind_group()?;

        self.uniforms.set_light_space(frame.light_space);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, state, &[]);
        pass.set_bind_group(2, shadow.map_bind_group(frame.depth), &[]);
        pass.set_vertex_buffer(0, instances.buffer().slice(..));
        pass.draw(0..6, 0..instances.count());
        Ok(())
    }
}
