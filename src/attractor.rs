//! Attractor chasing.
//!
//! The particles are pulled toward a follow target on a breathing shell. The
//! target and the shell radius are not set directly: every frame they are
//! smoothed toward a destination that depends on the pointer.
//!
//! | pointer state                     | destination                         | smooth time |
//! |-----------------------------------|-------------------------------------|-------------|
//! | moving, following enabled         | base + pointer x factor, radius / 2 | 0.25 / 0.1  |
//! | otherwise                         | base, full radius                   | 0.05 / 0.1  |

use glam::{Vec2, Vec3};

use crate::config::SimulationParameters;
use crate::easing::{SmoothDamp, SmoothDamp3};

const FOLLOW_POSITION_SMOOTH: f32 = 0.25;
const FOLLOW_RADIUS_SMOOTH: f32 = 0.1;
const RETURN_SMOOTH: f32 = 0.05;

/// Smoothed follow target and shell radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    position: Vec3,
    radius: f32,
    position_damp: SmoothDamp3,
    radius_damp: SmoothDamp,
}

/// Pointer inputs to [`Attractor::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Normalized pointer position, see [`crate::Input::pointer`].
    pub position: Vec2,
    pub moving: bool,
}

impl Attractor {
    /// Attractor resting at the configured base.
    pub fn new(params: &SimulationParameters) -> Self {
        Self {
            position: params.follow_position,
            radius: params.radius,
            position_damp: SmoothDamp3::default(),
            radius_damp: SmoothDamp::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Destination and smooth times for the current pointer state.
    pub fn destination(
        params: &SimulationParameters,
        pointer: PointerState,
        pointer_factor: f32,
    ) -> (Vec3, f32, f32, f32) {
        if pointer.moving && params.follow_mouse {
            let offset = Vec3::new(pointer.position.x, pointer.position.y, 0.0) * pointer_factor;
            (
                params.follow_position + offset,
                params.radius * 0.5,
                FOLLOW_POSITION_SMOOTH,
                FOLLOW_RADIUS_SMOOTH,
            )
        } else {
            (params.follow_position, params.radius, RETURN_SMOOTH, FOLLOW_RADIUS_SMOOTH)
        }
    }

    /// Advance the smoothing by `dt` seconds.
    pub fn update(
        &mut self,
        params: &SimulationParameters,
        pointer: PointerState,
        pointer_factor: f32,
        dt: f32,
    ) {
        let (target, radius, position_smooth, radius_smooth) =
            Self::destination(params, pointer, pointer_factor);
        self.position_damp
            .update(&mut self.position, target, position_smooth, dt);
        self.radius_damp
            .update(&mut self.radius, radius, radius_smooth, dt);
    }
}
