//! Scalar easing primitives.
//!
//! Two families live here:
//!
//! - [`Tween`]: a retargetable transition toward a target value, driven either
//!   by a damped spring or by a fixed-duration easing curve. Retargeting keeps
//!   the current value (and, for springs, the current velocity) so an
//!   interrupted transition never jumps.
//! - [`SmoothDamp`]: critically damped smoothing toward a moving target with a
//!   time constant, used to chase the attractor every frame.

/// Physical spring constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub tension: f32,
    pub friction: f32,
    pub mass: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            tension: 170.0,
            friction: 26.0,
            mass: 1.0,
        }
    }
}

/// Easing curve for duration-based transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadInOut,
    CubicOut,
}

impl Easing {
    /// Map progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// How a [`Tween`] moves toward its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Spring(SpringConfig),
    Eased { duration: f32, easing: Easing },
}

impl Default for Transition {
    fn default() -> Self {
        Transition::Spring(SpringConfig::default())
    }
}

/// Fixed integration step for springs, in seconds.
const SPRING_STEP: f32 = 0.001;

/// A single animated scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    value: f32,
    velocity: f32,
    from: f32,
    target: f32,
    elapsed: f32,
    transition: Transition,
    settled: bool,
}

impl Tween {
    /// A tween resting at `value`.
    pub fn new(value: f32, transition: Transition) -> Self {
        Self {
            value,
            velocity: 0.0,
            from: value,
            target: value,
            elapsed: 0.0,
            transition,
            settled: true,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Start moving toward `target` from wherever the tween is now.
    pub fn retarget(&mut self, target: f32) {
        self.from = self.value;
        self.target = target;
        self.elapsed = 0.0;
        self.settled = self.value == target && self.velocity == 0.0;
    }

    /// Jump to `value` and stop.
    pub fn snap(&mut self, value: f32) {
        *self = Self::new(value, self.transition);
    }

    /// Advance by `dt` seconds. Returns `true` once the tween has settled.
    pub fn step(&mut self, dt: f32) -> bool {
        if self.settled {
            return true;
        }
        self.elapsed += dt.max(0.0);

        match self.transition {
            Transition::Spring(config) => self.step_spring(config, dt),
            Transition::Eased { duration, easing } => {
                if duration <= 0.0 || self.elapsed >= duration {
                    self.finish();
                } else {
                    let t = easing.apply(self.elapsed / duration);
                    self.value = self.from + (self.target - self.from) * t;
                }
            }
        }
        self.settled
    }

    fn step_spring(&mut self, config: SpringConfig, dt: f32) {
        let mass = config.mass.max(f32::EPSILON);
        // Rest threshold scales with the distance travelled so tiny values
        // such as a shadow bias still animate visibly.
        let span = (self.target - self.from).abs();
        let precision = (span * 1e-3).max(1e-6);

        let mut remaining = dt.max(0.0);
        while remaining > 0.0 {
            let h = remaining.min(SPRING_STEP);
            let displacement = self.value - self.target;
            let acceleration =
                (-config.tension * displacement - config.friction * self.velocity) / mass;
            self.velocity += acceleration * h;
            self.value += self.velocity * h;
            remaining -= h;

            if self.velocity.abs() < precision && (self.value - self.target).abs() < precision {
                self.finish();
                return;
            }
        }
    }

    fn finish(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
        self.settled = true;
    }
}

/// Critically damped smoothing of one scalar toward a moving target.
///
/// `smooth_time` is roughly the time needed to cover the remaining distance.
/// The exponential decay is approximated with the usual cubic polynomial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothDamp {
    pub velocity: f32,
}

impl SmoothDamp {
    /// Distance under which the value snaps onto the target.
    pub const EPSILON: f32 = 0.001;

    /// Move `current` toward `target`. Returns whether the value changed.
    pub fn update(&mut self, current: &mut f32, target: f32, smooth_time: f32, dt: f32) -> bool {
        if (*current - target).abs() <= Self::EPSILON {
            *current = target;
            return false;
        }
        if dt <= 0.0 {
            return false;
        }

        let smooth_time = smooth_time.max(1e-4);
        let omega = 2.0 / smooth_time;
        let x = omega * dt;
        let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

        let change = *current - target;
        let temp = (self.velocity + omega * change) * dt;
        self.velocity = (self.velocity - omega * temp) * decay;
        let mut output = target + (change + temp) * decay;

        // Never overshoot.
        if (target - *current > 0.0) == (output > target) {
            output = target;
            self.velocity = (output - target) / dt;
        }

        *current = output;
        true
    }
}

/// [`SmoothDamp`] applied per component of a vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothDamp3 {
    axes: [SmoothDamp; 3],
}

impl SmoothDamp3 {
    pub fn update(
        &mut self,
        current: &mut glam::Vec3,
        target: glam::Vec3,
        smooth_time: f32,
        dt: f32,
    ) -> bool {
        let mut moved = false;
        let mut values = current.to_array();
        let targets = target.to_array();
        for ((axis, value), goal) in self.axes.iter_mut().zip(values.iter_mut()).zip(targets) {
            moved |= axis.update(value, goal, smooth_time, dt);
        }
        *current = glam::Vec3::from_array(values);
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tween: &mut Tween, seconds: f32) {
        let frames = (seconds * 60.0) as usize;
        for _ in 0..frames {
            tween.step(1.0 / 60.0);
        }
    }

    #[test]
    fn test_spring_settles_on_target() {
        let mut tween = Tween::new(0.04, Transition::default());
        tween.retarget(0.004);
        run(&mut tween, 3.0);
        assert!(tween.is_settled());
        assert_eq!(tween.value(), 0.004);
    }

    #[test]
    fn test_spring_retarget_keeps_value() {
        let mut tween = Tween::new(0.0, Transition::default());
        tween.retarget(1.0);
        run(&mut tween, 0.1);
        let midway = tween.value();
        assert!(midway > 0.0 && midway < 1.0);

        tween.retarget(0.0);
        assert_eq!(tween.value(), midway);
        // Velocity carries over, so the value keeps rising for a moment.
        tween.step(1.0 / 120.0);
        assert!(tween.value() > midway);
    }

    #[test]
    fn test_tiny_span_still_animates() {
        let mut tween = Tween::new(0.0022, Transition::default());
        tween.retarget(0.01);
        tween.step(1.0 / 60.0);
        assert!(!tween.is_settled());
        assert!(tween.value() > 0.0022 && tween.value() < 0.01);
    }

    #[test]
    fn test_eased_transition_reaches_target_on_time() {
        let mut tween = Tween::new(
            0.0,
            Transition::Eased {
                duration: 0.5,
                easing: Easing::QuadInOut,
            },
        );
        tween.retarget(2.0);
        assert!(!tween.step(0.25));
        assert!((tween.value() - 1.0).abs() < 1e-5);
        assert!(tween.step(0.25));
        assert_eq!(tween.value(), 2.0);
    }

    #[test]
    fn test_retarget_to_current_is_settled() {
        let mut tween = Tween::new(1.0, Transition::default());
        tween.retarget(1.0);
        assert!(tween.is_settled());
    }

    #[test]
    fn test_smooth_damp_converges_without_overshoot() {
        let mut damp = SmoothDamp::default();
        let mut value = 0.0;
        let mut last = value;
        for _ in 0..120 {
            damp.update(&mut value, 1.0, 0.25, 1.0 / 60.0);
            assert!(value <= 1.0);
            assert!(value >= last);
            last = value;
        }
        assert!((value - 1.0).abs() <= SmoothDamp::EPSILON);
    }

    #[test]
    fn test_smooth_damp_zero_dt_is_noop() {
        let mut damp = SmoothDamp::default();
        let mut value = 0.0;
        assert!(!damp.update(&mut value, 1.0, 0.25, 0.0));
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_smooth_damp_snaps_inside_epsilon() {
        let mut damp = SmoothDamp::default();
        let mut value = 0.9995;
        assert!(!damp.update(&mut value, 1.0, 0.25, 1.0 / 60.0));
        assert_eq!(value, 1.0);
    }
}
