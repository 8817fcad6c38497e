//! Post-processing graph: bloom, temporal blend, save, output.
//!
//! The scene is rendered into an offscreen [`SceneTarget`]. With effects on,
//! a [`CompositorGraph`] runs a fixed chain of fullscreen passes over it:
//!
//! 1. bright pass at half resolution
//! 2. five blur levels, each a horizontal then a vertical gaussian, every
//!    level at half the size of the previous one
//! 3. composite of the scene plus the weighted levels
//! 4. temporal blend with last frame's result
//! 5. save: copy of the blend result into the history texture
//! 6. copy to the output view
//!
//! Shader modules and pipelines live in [`PostProcessPipelines`] and are
//! built once. A graph owns only its targets, uniforms and bind groups, which
//! is everything that depends on the viewport size and the baked settings.

use wgpu::util::DeviceExt;

use super::compositor::{GraphFactory, GraphInputs, PassGraph};
use super::{allocation_scope, pipeline_scope, SCENE_COLOR_FORMAT, SCENE_DEPTH_FORMAT};
use crate::config::CompositorSettings;
use crate::error::SwarmError;
use crate::shader::{self, PostPass};
use crate::uniforms::{BlendUniforms, BloomCompositeUniforms, BlurUniforms, BrightPassUniforms};

pub const BLOOM_LEVELS: usize = 5;
/// Gaussian radius per level. Sigma equals the radius.
pub const BLOOM_KERNEL_RADII: [u32; BLOOM_LEVELS] = [3, 5, 7, 9, 11];
const BLOOM_WEIGHTS: [f32; BLOOM_LEVELS] = [1.0, 0.8, 0.6, 0.4, 0.2];
const BRIGHT_SMOOTH_WIDTH: f32 = 0.01;

/// Level weights after the radius lerp toward `1.2 - w`.
pub fn bloom_factors(radius: f32) -> [f32; BLOOM_LEVELS] {
    BLOOM_WEIGHTS.map(|w| w + (1.2 - w - w) * radius)
}

/// Size of blur level `level` for a `width` x `height` viewport.
pub fn bloom_level_size(width: u32, height: u32, level: usize) -> (u32, u32) {
    (((width / 2) >> level).max(1), ((height / 2) >> level).max(1))
}

pub fn bloom_composite_uniforms(settings: &CompositorSettings) -> BloomCompositeUniforms {
    let f = bloom_factors(settings.bloom_radius);
    BloomCompositeUniforms {
        factors: [f[0], f[1], f[2], f[3]],
        extra: [f[4], 0.0, 0.0, 0.0],
        strength: settings.bloom_strength,
        _padding: [0.0; 3],
    }
}

/// Pipelines, layouts and the sampler shared by every graph.
pub struct PostProcessPipelines {
    single_layout: wgpu::BindGroupLayout,
    composite_layout: wgpu::BindGroupLayout,
    blend_layout: wgpu::BindGroupLayout,
    copy_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bright: wgpu::RenderPipeline,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    blend: wgpu::RenderPipeline,
    /// Writes to the output format.
    copy: wgpu::RenderPipeline,
}

impl PostProcessPipelines {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Result<Self, SwarmError> {
        let single_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post-Process Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2)],
        });
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Composite Bind Group Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
                texture_entry(3),
                texture_entry(4),
                texture_entry(5),
                texture_entry(6),
                texture_entry(7),
            ],
        });
        let blend_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Blend Bind Group Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2),
                texture_entry(3),
            ],
        });
        let copy_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Copy Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post-Process Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bright = fullscreen_pipeline(device, PostPass::Bright, &single_layout, SCENE_COLOR_FORMAT)?;
        let blur = fullscreen_pipeline(device, PostPass::Blur, &single_layout, SCENE_COLOR_FORMAT)?;
        let composite = fullscreen_pipeline(
            device,
            PostPass::BloomComposite,
            &composite_layout,
            SCENE_COLOR_FORMAT,
        )?;
        let blend = fullscreen_pipeline(device, PostPass::Blend, &blend_layout, SCENE_COLOR_FORMAT)?;
        let copy = fullscreen_pipeline(device, PostPass::Copy, &copy_layout, output_format)?;

        Ok(Self {
            single_layout,
            composite_layout,
            blend_layout,
            copy_layout,
            sampler,
            bright,
            blur,
            composite,
            blend,
            copy,
        })
    }

    fn copy_bind_group(&self, device: &wgpu::Device, source: &wgpu::TextureView, label: &str) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.copy_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn single_bind_group(
        &self,
        device: &wgpu::Device,
        source: &wgpu::TextureView,
        uniforms: &wgpu::Buffer,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.single_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniforms.as_entire_binding(),
                },
            ],
        })
    }

    /// Copy `source` onto `output` with the output-format pipeline.
    pub fn present(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::BindGroup,
        output: &wgpu::TextureView,
    ) {
        fullscreen_pass(encoder, "Present Pass", output, &self.copy, source);
    }
}

/// Offscreen color and depth the particles are drawn into.
pub struct SceneTarget {
    width: u32,
    height: u32,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    /// Copy-pass bind group reading `color`, for presenting without effects.
    present_bind_group: wgpu::BindGroup,
}

impl SceneTarget {
    pub fn new(
        device: &wgpu::Device,
        pipelines: &PostProcessPipelines,
        width: u32,
        height: u32,
    ) -> Result<Self, SwarmError> {
        let (width, height) = (width.max(1), height.max(1));
        allocation_scope(device, "scene target", || {
            let color = create_color_target(device, "Scene Color", width, height, wgpu::TextureUsages::empty());
            let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
            let depth = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Scene Depth"),
                size: extent(width, height),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: SCENE_DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());
            let present_bind_group =
                pipelines.copy_bind_group(device, &color_view, "Scene Present Bind Group");
            Self {
                width,
                height,
                color,
                color_view,
                depth,
                depth_view,
                present_bind_group,
            }
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn present_bind_group(&self) -> &wgpu::BindGroup {
        &self.present_bind_group
    }

    pub fn destroy(self) {
        self.depth.destroy();
        self.color.destroy();
    }
}

struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, extra: wgpu::TextureUsages) -> Self {
        let texture = create_color_target(device, label, width, height, extra);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

struct BlurLevel {
    horizontal: RenderTarget,
    vertical: RenderTarget,
    horizontal_uniforms: wgpu::Buffer,
    vertical_uniforms: wgpu::Buffer,
    horizontal_bind_group: wgpu::BindGroup,
    vertical_bind_group: wgpu::BindGroup,
}

/// One built graph. Fields run from the save end back to the bright pass,
/// the order they are torn down in.
pub struct CompositorGraph {
    inputs: GraphInputs,
    history: RenderTarget,
    present_bind_group: wgpu::BindGroup,
    blended: RenderTarget,
    blend_uniforms: wgpu::Buffer,
    blend_bind_group: wgpu::BindGroup,
    bloomed: RenderTarget,
    composite_uniforms: wgpu::Buffer,
    composite_bind_group: wgpu::BindGroup,
    levels: Vec<BlurLevel>,
    bright: RenderTarget,
    bright_uniforms: wgpu::Buffer,
    bright_bind_group: wgpu::BindGroup,
}

impl CompositorGraph {
    pub fn inputs(&self) -> &GraphInputs {
        &self.inputs
    }

    /// Intermediate textures owned by this graph.
    pub fn target_count(&self) -> usize {
        4 + 2 * self.levels.len()
    }

    /// Record every pass, ending with a copy onto `output`.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipelines: &PostProcessPipelines,
        output: &wgpu::TextureView,
    ) {
        fullscreen_pass(
            encoder,
            "Bright Pass",
            &self.bright.view,
            &pipelines.bright,
            &self.bright_bind_group,
        );
        for level in &self.levels {
            fullscreen_pass(
                encoder,
                "Blur Horizontal",
                &level.horizontal.view,
                &pipelines.blur,
                &level.horizontal_bind_group,
            );
            fullscreen_pass(
                encoder,
                "Blur Vertical",
                &level.vertical.view,
                &pipelines.blur,
                &level.vertical_bind_group,
            );
        }
        fullscreen_pass(
            encoder,
            "Bloom Composite",
            &self.bloomed.view,
            &pipelines.composite,
            &self.composite_bind_group,
        );
        fullscreen_pass(
            encoder,
            "Temporal Blend",
            &self.blended.view,
            &pipelines.blend,
            &self.blend_bind_group,
        );

        encoder.copy_texture_to_texture(
            self.blended.texture.as_image_copy(),
            self.history.texture.as_image_copy(),
            extent(self.inputs.width, self.inputs.height),
        );

        pipelines.present(encoder, &self.present_bind_group, output);
    }
}

impl PassGraph for CompositorGraph {
    fn dispose(self) {
        self.history.texture.destroy();
        self.blended.texture.destroy();
        self.blend_uniforms.destroy();
        self.bloomed.texture.destroy();
        self.composite_uniforms.destroy();
        for level in self.levels.into_iter().rev() {
            level.vertical.texture.destroy();
            level.horizontal.texture.destroy();
            level.vertical_uniforms.destroy();
            level.horizontal_uniforms.destroy();
        }
        self.bright.texture.destroy();
        self.bright_uniforms.destroy();
    }
}

/// Builds [`CompositorGraph`]s over the current scene target.
pub struct PostProcessFactory<'a> {
    pub device: &'a wgpu::Device,
    pub pipelines: &'a PostProcessPipelines,
    pub scene: &'a SceneTarget,
}

impl GraphFactory for PostProcessFactory<'_> {
    type Graph = CompositorGraph;

    fn build(&mut self, inputs: &GraphInputs) -> Result<CompositorGraph, SwarmError> {
        let device = self.device;
        let pipelines = self.pipelines;
        let scene = self.scene;
        let settings = &inputs.settings;
        let (width, height) = (inputs.width, inputs.height);

        allocation_scope(device, "compositor targets", || {
            let (half_w, half_h) = bloom_level_size(width, height, 0);

            let bright = RenderTarget::new(device, "Bright Target", half_w, half_h, wgpu::TextureUsages::empty());
            let bright_uniforms = uniform_buffer(
                device,
                "Bright Pass Uniforms",
                &BrightPassUniforms {
                    threshold: settings.bloom_threshold,
                    smooth_width: BRIGHT_SMOOTH_WIDTH,
                    _padding: [0.0; 2],
                },
            );
            let bright_bind_group = pipelines.single_bind_group(
                device,
                &scene.color_view,
                &bright_uniforms,
                "Bright Pass Bind Group",
            );

            let mut levels: Vec<BlurLevel> = Vec::with_capacity(BLOOM_LEVELS);
            for (i, &kernel_radius) in BLOOM_KERNEL_RADII.iter().enumerate() {
                let (w, h) = bloom_level_size(width, height, i);
                let horizontal = RenderTarget::new(device, "Blur Horizontal Target", w, h, wgpu::TextureUsages::empty());
                let vertical = RenderTarget::new(device, "Blur Vertical Target", w, h, wgpu::TextureUsages::empty());
                let horizontal_uniforms = uniform_buffer(
                    device,
                    "Blur Horizontal Uniforms",
                    &BlurUniforms {
                        direction: [1.0 / w as f32, 0.0],
                        kernel_radius,
                        _padding: 0,
                    },
                );
                let vertical_uniforms = uniform_buffer(
                    device,
                    "Blur Vertical Uniforms",
                    &BlurUniforms {
                        direction: [0.0, 1.0 / h as f32],
                        kernel_radius,
                        _padding: 0,
                    },
                );
                let source = levels.last().map_or(&bright.view, |prev| &prev.vertical.view);
                let horizontal_bind_group = pipelines.single_bind_group(
                    device,
                    source,
                    &horizontal_uniforms,
                    "Blur Horizontal Bind Group",
                );
                let vertical_bind_group = pipelines.single_bind_group(
                    device,
                    &horizontal.view,
                    &vertical_uniforms,
                    "Blur Vertical Bind Group",
                );
                levels.push(BlurLevel {
                    horizontal,
                    vertical,
                    horizontal_uniforms,
                    vertical_uniforms,
                    horizontal_bind_group,
                    vertical_bind_group,
                });
            }

            let bloomed = RenderTarget::new(device, "Bloom Target", width, height, wgpu::TextureUsages::empty());
            let composite_uniforms =
                uniform_buffer(device, "Bloom Composite Uniforms", &bloom_composite_uniforms(settings));
            let mut composite_entries = vec![
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&pipelines.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: composite_uniforms.as_entire_binding(),
                },
            ];
            for (i, level) in levels.iter().enumerate() {
                composite_entries.push(wgpu::BindGroupEntry {
                    binding: 3 + i as u32,
                    resource: wgpu::BindingResource::TextureView(&level.vertical.view),
                });
            }
            let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Bloom Composite Bind Group"),
                layout: &pipelines.composite_layout,
                entries: &composite_entries,
            });

            let blended = RenderTarget::new(device, "Blend Target", width, height, wgpu::TextureUsages::COPY_SRC);
            let history = RenderTarget::new(device, "History Target", width, height, wgpu::TextureUsages::COPY_DST);
            let blend_uniforms = uniform_buffer(
                device,
                "Blend Uniforms",
                &BlendUniforms {
                    mix_ratio: settings.mix_ratio,
                    opacity: settings.opacity,
                    _padding: [0.0; 2],
                },
            );
            let blend_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Blend Bind Group"),
                layout: &pipelines.blend_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&bloomed.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&pipelines.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: blend_uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&history.view),
                    },
                ],
            });
            let present_bind_group =
                pipelines.copy_bind_group(device, &blended.view, "Composited Present Bind Group");

            CompositorGraph {
                inputs: *inputs,
                history,
                present_bind_group,
                blended,
                blend_uniforms,
                blend_bind_group,
                bloomed,
                composite_uniforms,
                composite_bind_group,
                levels,
                bright,
                bright_uniforms,
                bright_bind_group,
            }
        })
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn create_color_target(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    extra: wgpu::TextureUsages,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | extra,
        view_formats: &[],
    })
}

fn uniform_buffer<T: bytemuck::Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM,
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    pass: PostPass,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, SwarmError> {
    pipeline_scope(device, pass.label(), || {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(pass.label()),
            source: wgpu::ShaderSource::Wgsl(shader::post_process_shader(pass).into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(pass.label()),
            bind_group_layouts: &[layout],
            push_constant_ranges: &[],
        });
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(pass.label()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_factors_lerp_with_radius() {
        assert_eq!(bloom_factors(0.0), BLOOM_WEIGHTS);
        let mirrored = bloom_factors(1.0);
        for (f, w) in mirrored.iter().zip(BLOOM_WEIGHTS) {
            assert!((f - (1.2 - w)).abs() < 1e-6);
        }
        // Radius 0.5 flattens every level to 0.6.
        for f in bloom_factors(0.5) {
            assert!((f - 0.6).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bloom_levels_halve() {
        assert_eq!(bloom_level_size(1920, 1080, 0), (960, 540));
        assert_eq!(bloom_level_size(1920, 1080, 1), (480, 270));
        assert_eq!(bloom_level_size(1920, 1080, 4), (60, 33));
        assert_eq!(bloom_level_size(3, 3, 4), (1, 1));
    }

    #[test]
    fn test_composite_uniforms_pack_fifth_level_in_extra() {
        let settings = CompositorSettings::default();
        let uniforms = bloom_composite_uniforms(&settings);
        let expected = bloom_factors(settings.bloom_radius);
        assert_eq!(uniforms.factors, [expected[0], expected[1], expected[2], expected[3]]);
        assert_eq!(uniforms.extra[0], expected[4]);
        assert_eq!(uniforms.strength, settings.bloom_strength);
    }
}
