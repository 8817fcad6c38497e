//! Gesture-driven parameter animation.
//!
//! Two independent groups of scalars are animated:
//!
//! - **Motion**: `speed` and `die_speed`. Pressing eases them toward a slowed
//!   fraction of their baseline, releasing eases them back.
//! - **Color**: the six scalars of a [`ColorMode`]. Each press advances to the
//!   next mode in [`COLOR_MODES`]. A new color transition never starts while
//!   one is still in flight; motion transitions always restart.
//!
//! Every tick pushes the interpolated values into a [`ParameterSink`], which is
//! how the animator writes into the parameter sets it does not own.

use serde::{Deserialize, Serialize};

use crate::config::SwarmConfig;
use crate::easing::{Transition, Tween};

/// One color configuration of the particle material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorMode {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    /// Depth bias of the self-shadow test.
    pub shadow_bias: f32,
    /// How much a fully occluded particle is darkened.
    pub shadow_reduction: f32,
    /// Brightness multiplier applied after shading.
    pub multiplier: f32,
}

impl ColorMode {
    pub const DEFAULT: ColorMode = ColorMode {
        r: 0.656,
        g: 1.0,
        b: 1.0,
        shadow_bias: 0.0022,
        shadow_reduction: 0.53,
        multiplier: 1.3,
    };

    pub const YELLOW: ColorMode = ColorMode {
        r: 0.97,
        g: 0.97,
        b: 0.4,
        shadow_bias: 0.01,
        shadow_reduction: 0.41,
        multiplier: 1.1,
    };

    pub const PURPLE: ColorMode = ColorMode {
        r: 0.7,
        g: 0.0,
        b: 1.0,
        shadow_bias: 0.0021,
        shadow_reduction: 0.801,
        multiplier: 2.675,
    };

    fn to_array(self) -> [f32; 6] {
        [
            self.r,
            self.g,
            self.b,
            self.shadow_bias,
            self.shadow_reduction,
            self.multiplier,
        ]
    }

    fn from_array(values: [f32; 6]) -> Self {
        let [r, g, b, shadow_bias, shadow_reduction, multiplier] = values;
        Self {
            r,
            g,
            b,
            shadow_bias,
            shadow_reduction,
            multiplier,
        }
    }
}

impl Default for ColorMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The color modes a press cycles through, in order.
pub const COLOR_MODES: [ColorMode; 3] = [ColorMode::DEFAULT, ColorMode::YELLOW, ColorMode::PURPLE];

/// Animated group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationGroup {
    Motion,
    Color,
}

/// A batch of interpolated values for one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterUpdate {
    Motion { speed: f32, die_speed: f32 },
    Color(ColorMode),
}

/// Receives animated values.
pub trait ParameterSink {
    /// Called every tick a group is moving, including the tick it settles on.
    fn on_change(&mut self, update: ParameterUpdate);

    /// Called once when a group settles.
    fn on_complete(&mut self, _group: AnimationGroup) {}
}

/// Drives both animation groups.
#[derive(Debug, Clone)]
pub struct ParameterAnimator {
    baseline_speed: f32,
    baseline_die_speed: f32,
    slow_speed_factor: f32,
    slow_die_speed_factor: f32,
    speed: Tween,
    die_speed: Tween,
    color: [Tween; 6],
    color_index: usize,
    color_in_flight: bool,
    pressed: bool,
}

impl ParameterAnimator {
    pub fn new(config: &SwarmConfig) -> Self {
        Self::with_transition(config, Transition::default())
    }

    /// Animator whose tweens all use `transition`.
    pub fn with_transition(config: &SwarmConfig, transition: Transition) -> Self {
        let color = config.material.color.to_array().map(|v| Tween::new(v, transition));
        // Start on whichever mode the configured color matches, otherwise the
        // first press lands on the second mode.
        let color_index = COLOR_MODES
            .iter()
            .position(|mode| *mode == config.material.color)
            .unwrap_or(0);

        Self {
            baseline_speed: config.simulation.speed,
            baseline_die_speed: config.simulation.die_speed,
            slow_speed_factor: config.interaction.slow_speed_factor,
            slow_die_speed_factor: config.interaction.slow_die_speed_factor,
            speed: Tween::new(config.simulation.speed, transition),
            die_speed: Tween::new(config.simulation.die_speed, transition),
            color,
            color_index,
            color_in_flight: false,
            pressed: false,
        }
    }

    /// Begin a press. Returns `true` if a color transition was started.
    pub fn press(&mut self) -> bool {
        self.pressed = true;
        self.speed.retarget(self.baseline_speed * self.slow_speed_factor);
        self.die_speed
            .retarget(self.baseline_die_speed * self.slow_die_speed_factor);

        if self.color_in_flight {
            tracing::debug!("color transition in flight, press ignored for color");
            return false;
        }
        self.color_index = (self.color_index + 1) % COLOR_MODES.len();
        let destination = COLOR_MODES[self.color_index].to_array();
        for (tween, target) in self.color.iter_mut().zip(destination) {
            tween.retarget(target);
        }
        self.color_in_flight = true;
        tracing::debug!(mode = self.color_index, "color transition started");
        true
    }

    /// End a press: motion eases back to baseline. Color is unaffected.
    pub fn release(&mut self) {
        self.pressed = false;
        self.speed.retarget(self.baseline_speed);
        self.die_speed.retarget(self.baseline_die_speed);
    }

    /// Adopt new baselines from an edited config.
    ///
    /// Settled groups snap to the new values. A moving group keeps animating
    /// and the new baseline applies from the next gesture.
    pub fn rebase(&mut self, config: &SwarmConfig) {
        self.baseline_speed = config.simulation.speed;
        self.baseline_die_speed = config.simulation.die_speed;
        self.slow_speed_factor = config.interaction.slow_speed_factor;
        self.slow_die_speed_factor = config.interaction.slow_die_speed_factor;

        if !self.pressed && self.motion_settled() {
            self.speed.snap(self.baseline_speed);
            self.die_speed.snap(self.baseline_die_speed);
        }
        if !self.color_in_flight {
            for (tween, value) in self.color.iter_mut().zip(config.material.color.to_array()) {
                tween.snap(value);
            }
        }
    }

    /// Advance both groups by `dt` seconds and push values into `sink`.
    pub fn tick(&mut self, dt: f32, sink: &mut impl ParameterSink) {
        if !self.motion_settled() {
            let speed_done = self.speed.step(dt);
            let die_done = self.die_speed.step(dt);
            sink.on_change(ParameterUpdate::Motion {
                speed: self.speed.value(),
                die_speed: self.die_speed.value(),
            });
            if speed_done && die_done {
                sink.on_complete(AnimationGroup::Motion);
            }
        }

        if self.color_in_flight {
            let mut done = true;
            for tween in &mut self.color {
                done &= tween.step(dt);
            }
            sink.on_change(ParameterUpdate::Color(self.color()));
            if done {
                self.color_in_flight = false;
                tracing::debug!(mode = self.color_index, "color transition complete");
                sink.on_complete(AnimationGroup::Color);
            }
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed.value()
    }

    pub fn die_speed(&self) -> f32 {
        self.die_speed.value()
    }

    /// Current interpolated color.
    pub fn color(&self) -> ColorMode {
        ColorMode::from_array(self.color.map(|t| t.value()))
    }

    /// Index into [`COLOR_MODES`] of the current or destination mode.
    pub fn color_mode_index(&self) -> usize {
        self.color_index
    }

    pub fn is_color_change_in_flight(&self) -> bool {
        self.color_in_flight
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn motion_settled(&self) -> bool {
        self.speed.is_settled() && self.die_speed.is_settled()
    }
}
