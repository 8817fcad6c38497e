//! Configuration surface for the swarm.
//!
//! Every knob the control panel can touch lives in [`SwarmConfig`]. The
//! struct deserializes from TOML with all fields optional, so a config file
//! only needs to list what it changes:
//!
//! ```toml
//! [simulation]
//! attraction = 20.0
//!
//! [compositor]
//! mix_ratio = 0.8
//! ```
//!
//! Values are clamped through [`crate::params::schema`] after loading.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::animator::ColorMode;
use crate::error::{ConfigError, SwarmError};

/// Scalars consumed by the simulation compute pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Strength of the pull toward the follow target.
    pub attraction: f32,
    /// Displacement per reference frame.
    pub speed: f32,
    /// Lifetime decay per second.
    pub die_speed: f32,
    /// Shell radius particles settle on around the target.
    pub radius: f32,
    /// Curl noise spatial frequency.
    pub curl_size: f32,
    /// Curl noise amplitude.
    pub curl_strength: f32,
    /// Multiplier applied to time before it drives the noise field.
    pub curl_time_scale: f32,
    /// How fast the attraction shell breathes.
    pub breathing_rate: f32,
    /// Relative amplitude of the breathing.
    pub breathing_depth: f32,
    /// Offset the target by the pointer while it moves.
    pub follow_mouse: bool,
    /// Base attractor position.
    pub follow_position: Vec3,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            attraction: 11.35,
            speed: 0.04,
            die_speed: 1.22,
            radius: 0.58,
            curl_size: 0.38,
            curl_strength: 1.0,
            curl_time_scale: 0.59,
            breathing_rate: 0.49,
            breathing_depth: 0.17,
            follow_mouse: true,
            follow_position: Vec3::ZERO,
        }
    }
}

/// Material scalars consumed by the particle shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParameters {
    pub point_size: f32,
    pub size_numerator: f32,
    pub size_smoothstep_start: f32,
    pub size_smoothstep_end: f32,
    /// Jittered depth samples per particle.
    pub sample_count: u32,
    /// Jitter denominator: the offset radius in shadow UV space is `1 / spread`.
    pub spread: f32,
    /// The animated color group.
    pub color: ColorMode,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            point_size: 1.03,
            size_numerator: 41.0,
            size_smoothstep_start: 0.06,
            size_smoothstep_end: 0.5,
            sample_count: 2,
            spread: 512.0,
            color: ColorMode::DEFAULT,
        }
    }
}

/// Inputs baked into the compositor graph. Any change forces a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorSettings {
    /// Skip the graph entirely without disposing it.
    pub enabled: bool,
    /// Weight of the saved previous frame in the temporal blend.
    pub mix_ratio: f32,
    pub opacity: f32,
    pub bloom_strength: f32,
    pub bloom_radius: f32,
    pub bloom_threshold: f32,
}

impl CompositorSettings {
    /// Whether two settings produce the same graph. `enabled` is not baked in.
    pub fn same_graph(&self, other: &Self) -> bool {
        self.mix_ratio == other.mix_ratio
            && self.opacity == other.opacity
            && self.bloom_strength == other.bloom_strength
            && self.bloom_radius == other.bloom_radius
            && self.bloom_threshold == other.bloom_threshold
    }
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mix_ratio: 0.65,
            opacity: 1.0,
            bloom_strength: 0.28,
            bloom_radius: 1.06,
            bloom_threshold: 0.68,
        }
    }
}

/// Pointer and gesture behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// World units the target moves per unit of normalized pointer offset.
    pub pointer_factor: f32,
    /// Seconds after the last pointer motion before "moving" reverts.
    pub moving_timeout: f32,
    /// Press cycles the color mode and slows the swarm.
    pub click_to_color_change: bool,
    /// Scale applied to wall time before it reaches the shaders.
    pub elapsed_time_factor: f32,
    /// Speed multiplier while pressed.
    pub slow_speed_factor: f32,
    /// Die-speed multiplier while pressed.
    pub slow_die_speed_factor: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            pointer_factor: 4.0,
            moving_timeout: 1.5,
            click_to_color_change: true,
            elapsed_time_factor: 0.7,
            slow_speed_factor: 0.1,
            slow_die_speed_factor: 0.4,
        }
    }
}

/// Scene-level constants fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub sphere_radius: f32,
    /// Width and height segments of the seed sphere.
    pub sphere_segments: u32,
    /// Side of the square shadow depth targets, independent of the viewport.
    pub shadow_resolution: u32,
    /// Half extent of the orthographic light frustum.
    pub shadow_extent: f32,
    pub shadow_near: f32,
    pub shadow_far: f32,
    /// Height of the light camera above the follow target.
    pub light_height: f32,
    pub background: [f32; 3],
    pub camera_distance: f32,
    pub camera_fov_degrees: f32,
    /// Seed for initial lifetimes and size seeds. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            sphere_radius: 3.0,
            sphere_segments: 256,
            shadow_resolution: 512,
            shadow_extent: 5.0,
            shadow_near: 0.0,
            shadow_far: 50.0,
            light_height: 10.0,
            // #353540
            background: [0.208, 0.208, 0.251],
            camera_distance: 5.0,
            camera_fov_degrees: 65.0,
            seed: None,
        }
    }
}

/// Every tunable of the swarm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub simulation: SimulationParameters,
    pub material: MaterialParameters,
    pub compositor: CompositorSettings,
    pub interaction: InteractionSettings,
    pub scene: SceneSettings,
}

impl SwarmConfig {
    /// Parse a TOML document and clamp every knob into its domain.
    pub fn from_toml_str(source: &str) -> Result<Self, SwarmError> {
        let mut config: SwarmConfig = toml::from_str(source).map_err(ConfigError::from)?;
        config.clamp_to_schema()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SwarmError> {
        let source = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&source)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> String {
        // All fields are plain numbers, bools and arrays.
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Clamp every schema knob. NaN cannot be clamped and is rejected.
    pub fn clamp_to_schema(&mut self) -> Result<(), SwarmError> {
        for tunable in crate::params::schema() {
            let value = (tunable.get)(self);
            if value.is_nan() {
                return Err(SwarmError::configuration(format!(
                    "{} is not a number",
                    tunable.name
                )));
            }
            tunable.apply(self, value);
        }
        Ok(())
    }

    /// Lower-cost profile for touch devices: fewer seed particles.
    pub fn touch_profile(mut self) -> Self {
        self.scene.sphere_segments = 128;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SwarmConfig::from_toml_str(
            r#"
            [simulation]
            attraction = 20.0

            [compositor]
            mix_ratio = 0.8
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.attraction, 20.0);
        assert_eq!(config.simulation.speed, 0.04);
        assert_eq!(config.compositor.mix_ratio, 0.8);
        assert_eq!(config.compositor.bloom_threshold, 0.68);
        assert_eq!(config.scene.sphere_segments, 256);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = SwarmConfig::from_toml_str(
            r#"
            [simulation]
            speed = 5.0

            [material]
            sample_count = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.speed, 0.1);
        assert_eq!(config.material.sample_count, 10);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = SwarmConfig::from_toml_str("[simulation\nspeed = ").unwrap_err();
        assert!(matches!(err, SwarmError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_round_trip_default() {
        let config = SwarmConfig::default();
        let parsed = SwarmConfig::from_toml_str(&config.to_toml_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_enabled_is_not_part_of_graph_identity() {
        let a = CompositorSettings::default();
        let b = CompositorSettings {
            enabled: false,
            ..a
        };
        assert!(a.same_graph(&b));
        let c = CompositorSettings {
            bloom_radius: 0.5,
            ..a
        };
        assert!(!a.same_graph(&c));
    }
}
