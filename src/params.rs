//! Tunable parameter schema.
//!
//! A flat table of named, range-bounded knobs, each bound to a getter and a
//! setter on [`SwarmConfig`]. The table is built once and handed to whatever
//! control surface drives the swarm (the CLI `--set` flag in the bundled
//! binary). Writes are clamped into the declared domain, never rejected.
//!
//! Booleans are exposed as `0`/`1` with a step of `1`.

use crate::config::SwarmConfig;
use crate::error::SwarmError;

/// Declared numeric domain of a knob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDomain {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamDomain {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Clamp into `[min, max]`. Whole-number steps also snap to the grid.
    pub fn clamp(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step >= 1.0 {
            let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
            snapped.clamp(self.min, self.max)
        } else {
            clamped
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Panel folder a knob belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamGroup {
    Simulation,
    Material,
    Compositor,
    Interaction,
}

/// One row of the schema.
#[derive(Clone, Copy)]
pub struct Tunable {
    pub name: &'static str,
    pub group: ParamGroup,
    pub domain: ParamDomain,
    pub get: fn(&SwarmConfig) -> f32,
    pub set: fn(&mut SwarmConfig, f32),
}

impl Tunable {
    /// Clamp `value` into the domain and write it. Returns what was written.
    pub fn apply(&self, config: &mut SwarmConfig, value: f32) -> f32 {
        let value = self.domain.clamp(value);
        (self.set)(config, value);
        value
    }
}

impl std::fmt::Debug for Tunable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tunable")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("domain", &self.domain)
            .finish()
    }
}

fn flag(value: f32) -> bool {
    value >= 0.5
}

fn from_flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

macro_rules! tunable {
    ($name:literal, $group:ident, [$min:expr, $max:expr, $step:expr], |$c:ident| $field:expr) => {
        Tunable {
            name: $name,
            group: ParamGroup::$group,
            domain: ParamDomain::new($min, $max, $step),
            get: |$c| $field,
            set: |$c, v| $field = v,
        }
    };
}

static SCHEMA: [Tunable; 30] = [
    // Simulation
    tunable!("attraction", Simulation, [0.0, 100.0, 0.001], |c| c.simulation.attraction),
    tunable!("speed", Simulation, [0.0, 0.1, 0.001], |c| c.simulation.speed),
    tunable!("die_speed", Simulation, [0.0, 10.0, 0.001], |c| c.simulation.die_speed),
    tunable!("radius", Simulation, [0.0, 2.0, 0.001], |c| c.simulation.radius),
    tunable!("curl_size", Simulation, [0.0, 1.0, 0.001], |c| c.simulation.curl_size),
    tunable!("curl_strength", Simulation, [0.0, 5.0, 0.001], |c| c.simulation.curl_strength),
    tunable!("curl_time_scale", Simulation, [0.0, 1.0, 0.001], |c| c.simulation.curl_time_scale),
    tunable!("breathing_rate", Simulation, [0.0, 1.0, 0.001], |c| c.simulation.breathing_rate),
    tunable!("breathing_depth", Simulation, [0.0, 1.0, 0.001], |c| c.simulation.breathing_depth),
    Tunable {
        name: "follow_mouse",
        group: ParamGroup::Simulation,
        domain: ParamDomain::new(0.0, 1.0, 1.0),
        get: |c| from_flag(c.simulation.follow_mouse),
        set: |c, v| c.simulation.follow_mouse = flag(v),
    },
    // Material
    tunable!("point_size", Material, [0.001, 10.0, 0.001], |c| c.material.point_size),
    tunable!("size_numerator", Material, [0.0, 100.0, 1.0], |c| c.material.size_numerator),
    tunable!("size_smoothstep_start", Material, [0.0, 1.0, 0.001], |c| c.material.size_smoothstep_start),
    tunable!("size_smoothstep_end", Material, [0.0, 1.0, 0.001], |c| c.material.size_smoothstep_end),
    Tunable {
        name: "sample_count",
        group: ParamGroup::Material,
        domain: ParamDomain::new(0.0, 10.0, 1.0),
        get: |c| c.material.sample_count as f32,
        set: |c, v| c.material.sample_count = v as u32,
    },
    tunable!("spread", Material, [0.0, 1000.0, 1.0], |c| c.material.spread),
    tunable!("shadow_bias", Material, [0.0, 0.01, 0.0001], |c| c.material.color.shadow_bias),
    tunable!("shadow_reduction", Material, [0.0, 1.0, 0.001], |c| c.material.color.shadow_reduction),
    tunable!("color_r", Material, [0.0, 1.0, 0.001], |c| c.material.color.r),
    tunable!("color_g", Material, [0.0, 1.0, 0.001], |c| c.material.color.g),
    tunable!("color_b", Material, [0.0, 1.0, 0.001], |c| c.material.color.b),
    tunable!("color_multiplier", Material, [1.0, 10.0, 0.001], |c| c.material.color.multiplier),
    // Compositor
    tunable!("mix_ratio", Compositor, [-2.0, 2.0, 0.01], |c| c.compositor.mix_ratio),
    tunable!("opacity", Compositor, [0.0, 1.0, 0.01], |c| c.compositor.opacity),
    tunable!("bloom_strength", Compositor, [0.0, 2.0, 0.01], |c| c.compositor.bloom_strength),
    tunable!("bloom_radius", Compositor, [0.0, 2.0, 0.01], |c| c.compositor.bloom_radius),
    tunable!("bloom_threshold", Compositor, [0.0, 1.0, 0.01], |c| c.compositor.bloom_threshold),
    // Interaction
    tunable!("pointer_factor", Interaction, [0.0, 10.0, 0.1], |c| c.interaction.pointer_factor),
    tunable!("elapsed_time_factor", Interaction, [0.0, 1.0, 0.1], |c| c.interaction.elapsed_time_factor),
    Tunable {
        name: "click_to_color_change",
        group: ParamGroup::Interaction,
        domain: ParamDomain::new(0.0, 1.0, 1.0),
        get: |c| from_flag(c.interaction.click_to_color_change),
        set: |c, v| c.interaction.click_to_color_change = flag(v),
    },
];

/// The full knob table.
pub fn schema() -> &'static [Tunable] {
    &SCHEMA
}

/// Look a knob up by name.
pub fn find(name: &str) -> Option<&'static Tunable> {
    SCHEMA.iter().find(|t| t.name == name)
}

/// Set a knob by name, clamping into its domain.
pub fn set(config: &mut SwarmConfig, name: &str, value: f32) -> Result<f32, SwarmError> {
    let tunable =
        find(name).ok_or_else(|| SwarmError::configuration(format!("unknown parameter `{name}`")))?;
    if value.is_nan() {
        return Err(SwarmError::configuration(format!("{name} is not a number")));
    }
    Ok(tunable.apply(config, value))
}

/// Parse a `name=value` assignment and apply it.
pub fn apply_assignment(config: &mut SwarmConfig, assignment: &str) -> Result<f32, SwarmError> {
    let (name, value) = assignment
        .split_once('=')
        .ok_or_else(|| SwarmError::configuration(format!("expected name=value, got `{assignment}`")))?;
    let name = name.trim();
    let value = value.trim();
    let parsed = match value {
        "true" => 1.0,
        "false" => 0.0,
        other => other
            .parse::<f32>()
            .map_err(|_| SwarmError::configuration(format!("`{other}` is not a number for {name}")))?,
    };
    set(config, name, parsed)
}
