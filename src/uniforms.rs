//! Uniform blocks shared with the WGSL shaders.
//!
//! Every block is `#[repr(C)]` and [`Pod`] so it can be uploaded with
//! `queue.write_buffer(&buffer, 0, bytemuck::bytes_of(&block))`. Layouts stick
//! to 4-byte scalars, `vec4` and `mat4x4` so the Rust and WGSL offsets agree
//! without implicit padding. The matching WGSL structs live in the shader
//! sources under `src/shaders/`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

use crate::config::{MaterialParameters, SimulationParameters};

/// Displacement in the simulation is expressed per frame at this rate.
pub const REFERENCE_FPS: f32 = 60.0;

/// Inputs of the simulation compute pass. 80 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimulationUniforms {
    pub follow_position: [f32; 4],
    pub time: f32,
    pub delta_time: f32,
    pub speed: f32,
    pub die_speed: f32,
    pub attraction: f32,
    pub radius: f32,
    pub curl_size: f32,
    pub curl_strength: f32,
    pub curl_time_scale: f32,
    pub breathing_rate: f32,
    pub breathing_depth: f32,
    pub particle_count: u32,
    pub texture_size: u32,
    pub frame: u32,
    pub _padding: [u32; 2],
}

/// Per-frame values that are not part of [`SimulationParameters`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepContext {
    pub time: f32,
    pub delta_time: f32,
    pub frame: u32,
    /// Smoothed attractor position.
    pub follow_position: Vec3,
    /// Smoothed shell radius.
    pub radius: f32,
}

impl SimulationUniforms {
    pub fn new(
        params: &SimulationParameters,
        step: &StepContext,
        particle_count: u32,
        texture_size: u32,
    ) -> Self {
        Self {
            follow_position: step.follow_position.extend(1.0).to_array(),
            time: step.time,
            delta_time: step.delta_time,
            speed: params.speed,
            die_speed: params.die_speed,
            attraction: params.attraction,
            radius: step.radius,
            curl_size: params.curl_size,
            curl_strength: params.curl_strength,
            curl_time_scale: params.curl_time_scale,
            breathing_rate: params.breathing_rate,
            breathing_depth: params.breathing_depth,
            particle_count,
            texture_size,
            frame: step.frame,
            _padding: [0; 2],
        }
    }

    pub fn follow_position(&self) -> Vec3 {
        Vec3::new(
            self.follow_position[0],
            self.follow_position[1],
            self.follow_position[2],
        )
    }
}

/// Inputs of the particle draw. 208 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    /// rgb plus the color multiplier in `w`.
    pub base_color: [f32; 4],
    /// Drawing buffer size in physical pixels.
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub size_numerator: f32,
    pub size_start: f32,
    pub size_end: f32,
    pub shadow_bias: f32,
    pub shadow_reduction: f32,
    pub spread: f32,
    pub sample_count: u32,
    pub particle_count: u32,
    pub texture_size: u32,
    pub _padding: [u32; 4],
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl MaterialUniforms {
    /// Refresh the material scalars, leaving matrices and resolution alone.
    pub fn set_material(&mut self, material: &MaterialParameters) {
        let color = &material.color;
        self.base_color = [color.r, color.g, color.b, color.multiplier];
        self.point_size = material.point_size;
        self.size_numerator = material.size_numerator;
        self.size_start = material.size_smoothstep_start;
        self.size_end = material.size_smoothstep_end;
        self.shadow_bias = color.shadow_bias;
        self.shadow_reduction = color.shadow_reduction;
        self.spread = material.spread;
        self.sample_count = material.sample_count;
    }

    pub fn set_view_proj(&mut self, view_proj: Mat4) {
        self.view_proj = view_proj.to_cols_array_2d();
    }

    pub fn set_light_space(&mut self, light_space: Mat4) {
        self.light_space = light_space.to_cols_array_2d();
    }

    pub fn set_resolution(&mut self, resolution: Vec2) {
        self.resolution = resolution.to_array();
    }
}

/// Inputs of the shadow depth pass. 96 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadowUniforms {
    pub light_space: [[f32; 4]; 4],
    /// Shadow target size in texels.
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub size_numerator: f32,
    pub size_start: f32,
    pub size_end: f32,
    pub particle_count: u32,
    pub texture_size: u32,
}

impl ShadowUniforms {
    pub fn new(light_space: Mat4, resolution: u32, material: &MaterialUniforms) -> Self {
        Self {
            light_space: light_space.to_cols_array_2d(),
            resolution: [resolution as f32; 2],
            point_size: material.point_size,
            size_numerator: material.size_numerator,
            size_start: material.size_start,
            size_end: material.size_end,
            particle_count: material.particle_count,
            texture_size: material.texture_size,
        }
    }
}

/// Bright-pass inputs. 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BrightPassUniforms {
    pub threshold: f32,
    /// Width of the soft knee above the threshold.
    pub smooth_width: f32,
    pub _padding: [f32; 2],
}

/// One separable blur direction. 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BlurUniforms {
    /// Texel-space step, `(1/w, 0)` or `(0, 1/h)`.
    pub direction: [f32; 2],
    pub kernel_radius: u32,
    pub _padding: u32,
}

/// Bloom composite weights. 48 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BloomCompositeUniforms {
    /// Per-level factors after radius lerp, levels 0..4 in x,y,z,w then `extra.x`.
    pub factors: [f32; 4],
    pub extra: [f32; 4],
    pub strength: f32,
    pub _padding: [f32; 3],
}

/// Temporal blend inputs. 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BlendUniforms {
    pub mix_ratio: f32,
    pub opacity: f32,
    pub _padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<SimulationUniforms>(), 80);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 208);
        assert_eq!(std::mem::size_of::<ShadowUniforms>(), 96);
        assert_eq!(std::mem::size_of::<BrightPassUniforms>(), 16);
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 16);
        assert_eq!(std::mem::size_of::<BloomCompositeUniforms>(), 48);
        assert_eq!(std::mem::size_of::<BlendUniforms>(), 16);
    }

    #[test]
    fn test_material_packs_color_multiplier_in_w() {
        let mut uniforms = MaterialUniforms::default();
        uniforms.set_material(&MaterialParameters::default());
        assert_eq!(uniforms.base_color, [0.656, 1.0, 1.0, 1.3]);
        assert_eq!(uniforms.shadow_bias, 0.0022);
        assert_eq!(uniforms.sample_count, 2);
    }

    #[test]
    fn test_simulation_uniforms_take_smoothed_radius() {
        let params = SimulationParameters::default();
        let step = StepContext {
            radius: 0.29,
            follow_position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let uniforms = SimulationUniforms::new(&params, &step, 10, 4);
        assert_eq!(uniforms.radius, 0.29);
        assert_eq!(uniforms.follow_position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(uniforms.particle_count, 10);
    }
}
