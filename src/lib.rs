//! # swarmlight
//!
//! A GPU-resident particle swarm. Particle state never leaves the GPU: a
//! compute pass advances it every frame, a light camera renders it into a
//! depth map for soft self-shadowing, and a post-processing chain adds bloom
//! and a temporal blend that leaves motion trails.
//!
//! ## Quick Start
//!
//! ```ignore
//! use swarmlight::prelude::*;
//!
//! fn main() -> Result<(), SwarmError> {
//!     let mut config = SwarmConfig::default();
//!     params::set(&mut config, "attraction", 20.0)?;
//!
//!     Simulation::new()
//!         .with_config(config)
//!         .with_segments(128)
//!         .run()
//! }
//! ```
//!
//! ## Pipeline
//!
//! Each frame runs, in order:
//!
//! 1. [`ParameterAnimator`] eases speed, die speed and the color mode toward
//!    their targets and writes them into the live uniforms.
//! 2. [`Attractor`] smooths the follow target toward the pointer.
//! 3. [`SimulationField`] steps the particle state: curl noise, attraction
//!    to a breathing shell around the target, and respawn at the seed
//!    position when a particle's life runs out.
//! 4. [`ShadowPass`] renders depth from above the target into one of two
//!    alternating targets.
//! 5. [`ParticleRenderer`] draws one quad per state texel, sampling the
//!    previous frame's depth for shadowing.
//! 6. The [`Compositor`] runs bloom, temporal blend and output, rebuilding
//!    its graph whenever the viewport or a baked setting changes.
//!
//! ## Configuration
//!
//! Every knob lives in [`SwarmConfig`], loadable from TOML. The
//! [`params`] schema names each knob with its `{min, max, step}` domain
//! and clamps writes into it:
//!
//! ```ignore
//! let mut config = SwarmConfig::load("swarm.toml")?;
//! params::apply_assignment(&mut config, "bloom_strength=0.5")?;
//! ```
//!
//! ## Headless use
//!
//! [`Swarm`] renders into any texture view, so it can run without a
//! window. See `tests/gpu_pipeline.rs`.

pub mod animator;
pub mod attractor;
pub mod config;
pub mod easing;
pub mod error;
pub mod gpu;
pub mod input;
pub mod kernel;
pub mod params;
pub mod pingpong;
pub mod seed;
pub mod shader;
pub mod shader_utils;
mod simulation;
pub mod time;
pub mod uniforms;

pub use animator::{ColorMode, ParameterAnimator, ParameterSink, ParameterUpdate, COLOR_MODES};
pub use attractor::{Attractor, PointerState};
pub use config::{
    CompositorSettings, InteractionSettings, MaterialParameters, SceneSettings,
    SimulationParameters, SwarmConfig,
};
pub use error::{ConfigError, GpuError, SwarmError};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::{
    Compositor, CompositorState, ParticleRenderer, ShadowPass, SimulationField, Swarm,
};
pub use input::{Input, PointerInput};
pub use seed::{FieldLayout, SeedData};
pub use simulation::Simulation;
pub use time::Time;

/// Convenient imports for typical usage.
pub mod prelude {
    pub use crate::animator::{ColorMode, ParameterAnimator};
    pub use crate::config::SwarmConfig;
    pub use crate::error::SwarmError;
    pub use crate::gpu::Swarm;
    pub use crate::input::{Input, PointerInput};
    pub use crate::params;
    pub use crate::simulation::Simulation;
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
}
