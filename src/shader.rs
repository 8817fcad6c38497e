//! WGSL shader assembly.
//!
//! Sources live under `src/shaders/` and are embedded at compile time. Shaders
//! that need hashing or noise get [`crate::shader_utils`] prepended; every
//! post-process fragment shader gets the shared fullscreen vertex stage.

use crate::shader_utils;

const SIMULATION_WGSL: &str = include_str!("shaders/simulation.wgsl");
const PARTICLES_WGSL: &str = include_str!("shaders/particles.wgsl");
const SHADOW_WGSL: &str = include_str!("shaders/shadow.wgsl");
const FULLSCREEN_WGSL: &str = include_str!("shaders/fullscreen.wgsl");
const BRIGHT_WGSL: &str = include_str!("shaders/bright.wgsl");
const BLUR_WGSL: &str = include_str!("shaders/blur.wgsl");
const BLOOM_COMPOSITE_WGSL: &str = include_str!("shaders/bloom_composite.wgsl");
const BLEND_WGSL: &str = include_str!("shaders/blend.wgsl");
const COPY_WGSL: &str = include_str!("shaders/copy.wgsl");

/// Every post-process fragment stage, in graph order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostPass {
    Bright,
    Blur,
    BloomComposite,
    Blend,
    Copy,
}

impl PostPass {
    pub const ALL: [PostPass; 5] = [
        PostPass::Bright,
        PostPass::Blur,
        PostPass::BloomComposite,
        PostPass::Blend,
        PostPass::Copy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PostPass::Bright => "bright pass",
            PostPass::Blur => "blur",
            PostPass::BloomComposite => "bloom composite",
            PostPass::Blend => "temporal blend",
            PostPass::Copy => "copy",
        }
    }

    fn fragment_source(self) -> &'static str {
        match self {
            PostPass::Bright => BRIGHT_WGSL,
            PostPass::Blur => BLUR_WGSL,
            PostPass::BloomComposite => BLOOM_COMPOSITE_WGSL,
            PostPass::Blend => BLEND_WGSL,
            PostPass::Copy => COPY_WGSL,
        }
    }
}

/// Compute shader that advances the particle state.
pub fn simulation_shader() -> String {
    format!("{}\n{}", shader_utils::all_utils_wgsl(), SIMULATION_WGSL)
}

/// Vertex and fragment stages of the particle draw.
pub fn particle_shader() -> String {
    format!("{}\n{}", shader_utils::RANDOM_WGSL, PARTICLES_WGSL)
}

/// Depth-only particle stage for the light camera.
pub fn shadow_shader() -> String {
    SHADOW_WGSL.to_string()
}

/// Fullscreen vertex stage plus the fragment stage of `pass`.
pub fn post_process_shader(pass: PostPass) -> String {
    format!("{}\n{}", FULLSCREEN_WGSL, pass.fragment_source())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utils_prepended_where_needed() {
        assert!(simulation_shader().contains("fn curl_noise"));
        assert!(particle_shader().contains("fn hash2"));
        assert!(!shadow_shader().contains("fn hash"));
    }

    #[test]
    fn test_post_shaders_share_vertex_stage() {
        for pass in PostPass::ALL {
            let source = post_process_shader(pass);
            assert!(source.contains("fn vs_main"), "{}", pass.label());
            assert!(source.contains("fn fs_main"), "{}", pass.label());
        }
    }
}
