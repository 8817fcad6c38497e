//! Frame timing.
//!
//! [`Time`] is the single source of elapsed and delta time for a frame. Wall
//! clock deltas come from `std::time::Instant`; tests and headless runs feed
//! explicit deltas through [`Time::advance`] instead.
//!
//! ```ignore
//! let mut time = Time::new(0.7);
//! // once per frame:
//! let dt = time.update();
//! let shader_time = time.shader_time();
//! ```

use std::time::{Duration, Instant};

/// Deltas above this are treated as a stall and clamped.
pub const MAX_DELTA: f32 = 0.1;

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    /// Unpaused seconds since start.
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u32,
    fps: f32,
    fps_frames: u32,
    fps_window: f32,
    paused: bool,
    /// Factor applied to elapsed time before it reaches the shaders.
    elapsed_time_factor: f32,
}

impl Time {
    pub fn new(elapsed_time_factor: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_window: 0.0,
            paused: false,
            elapsed_time_factor,
        }
    }

    /// Measure the wall clock since the last call and advance by it.
    ///
    /// Returns the frame delta in seconds.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(raw)
    }

    /// Advance by an explicit duration. Returns the applied delta.
    pub fn advance(&mut self, raw: Duration) -> f32 {
        if self.paused {
            self.delta_secs = 0.0;
            return 0.0;
        }

        self.delta_secs = raw.as_secs_f32().min(MAX_DELTA);
        self.elapsed_secs += self.delta_secs;
        self.frame_count = self.frame_count.wrapping_add(1);

        self.fps_frames += 1;
        self.fps_window += raw.as_secs_f32();
        if self.fps_window >= 0.5 {
            self.fps = self.fps_frames as f32 / self.fps_window;
            self.fps_frames = 0;
            self.fps_window = 0.0;
        }

        self.delta_secs
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Elapsed time as seen by the shaders.
    #[inline]
    pub fn shader_time(&self) -> f32 {
        self.elapsed_secs * self.elapsed_time_factor
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames advanced since start. Wraps.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_elapsed_time_factor(&mut self, factor: f32) {
        self.elapsed_time_factor = factor;
    }

    /// Stop time. `delta()` reads zero until [`Time::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume without counting the paused interval.
    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_new() {
        let time = Time::new(0.7);
        assert_eq!(time.frame(), 0);
        assert_eq!(time.elapsed(), 0.0);
        assert!(!time.is_paused());
    }

    #[test]
    fn test_advance_accumulates() {
        let mut time = Time::new(0.5);
        time.advance(Duration::from_millis(20));
        time.advance(Duration::from_millis(20));
        assert!((time.elapsed() - 0.04).abs() < 1e-6);
        assert!((time.shader_time() - 0.02).abs() < 1e-6);
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut time = Time::default();
        let dt = time.advance(Duration::from_secs(3));
        assert_eq!(dt, MAX_DELTA);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut time = Time::default();
        time.advance(Duration::from_millis(16));
        time.pause();

        let elapsed = time.elapsed();
        assert_eq!(time.advance(Duration::from_millis(16)), 0.0);
        assert_eq!(time.elapsed(), elapsed);
        assert_eq!(time.frame(), 1);

        time.toggle_pause();
        assert!(!time.is_paused());
    }
}
