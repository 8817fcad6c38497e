//! Pointer and keyboard input.
//!
//! [`Input`] turns raw window events into the few signals the swarm reacts
//! to: a normalized pointer position, whether the pointer has moved recently,
//! press/release edges (mouse or touch), and keys pressed this frame.
//!
//! The "moving" flag is a countdown. Every pointer motion rearms it to the
//! configured timeout and [`Input::advance`] drains it with frame time, so a
//! burst of motion never leaves stale timers behind.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, TouchPhase, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What the swarm reads from the pointer each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerInput {
    /// Normalized position, see [`Input::pointer`].
    pub position: Vec2,
    /// Primary button or touch down.
    pub active: bool,
    /// Moved within the timeout.
    pub moving: bool,
}

/// Tracked input state.
#[derive(Debug)]
pub struct Input {
    pointer: Vec2,
    window_size: (u32, u32),
    moving_timeout: f32,
    moving_remaining: f32,

    held: bool,
    pressed: bool,
    released: bool,

    keys_pressed: HashSet<KeyCode>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new(1.5)
    }
}

impl Input {
    /// Input tracker whose moving flag clears `moving_timeout` seconds after
    /// the last pointer motion.
    pub fn new(moving_timeout: f32) -> Self {
        Self {
            pointer: Vec2::ZERO,
            window_size: (800, 600),
            moving_timeout: moving_timeout.max(0.0),
            moving_remaining: 0.0,
            held: false,
            pressed: false,
            released: false,
            keys_pressed: HashSet::new(),
        }
    }

    /// Pointer position normalized to the window center: `x` in `[-1, 1]`
    /// to the right, `y` in `[-1, 1]` upward.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Snapshot for the frame step.
    pub fn pointer_input(&self) -> PointerInput {
        PointerInput {
            position: self.pointer,
            active: self.held,
            moving: self.is_pointer_moving(),
        }
    }

    /// Whether the pointer moved within the timeout.
    pub fn is_pointer_moving(&self) -> bool {
        self.moving_remaining > 0.0
    }

    /// Whether the primary button or a touch is down.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// A press started this frame.
    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// A press ended this frame.
    pub fn released(&self) -> bool {
        self.released
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn set_moving_timeout(&mut self, seconds: f32) {
        self.moving_timeout = seconds.max(0.0);
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Record pointer motion to physical pixel `(x, y)`.
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return;
        }
        let cx = w as f32 / 2.0;
        let cy = h as f32 / 2.0;
        self.pointer = Vec2::new((x - cx) / cx, -(y - cy) / cy);
        self.moving_remaining = self.moving_timeout;
    }

    pub fn press(&mut self) {
        if !self.held {
            self.pressed = true;
        }
        self.held = true;
    }

    pub fn release(&mut self) {
        if self.held {
            self.released = true;
        }
        self.held = false;
    }

    /// Drain the moving countdown by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.moving_remaining = (self.moving_remaining - dt.max(0.0)).max(0.0);
    }

    /// Clear per-frame edges. Call after the frame has consumed them.
    pub fn end_frame(&mut self) {
        self.pressed = false;
        self.released = false;
        self.keys_pressed.clear();
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if event.state == ElementState::Pressed && !event.repeat {
                        self.keys_pressed.insert(code);
                    }
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.press(),
                ElementState::Released => self.release(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::Touch(touch) => {
                self.pointer_moved(touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => self.press(),
                    TouchPhase::Ended | TouchPhase::Cancelled => self.release(),
                    TouchPhase::Moved => {}
                }
            }
            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_normalization() {
        let mut input = Input::new(1.5);
        input.set_window_size(800, 600);

        input.pointer_moved(400.0, 300.0);
        assert_eq!(input.pointer(), Vec2::ZERO);

        input.pointer_moved(800.0, 0.0);
        assert_eq!(input.pointer(), Vec2::new(1.0, 1.0));

        input.pointer_moved(0.0, 600.0);
        assert_eq!(input.pointer(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_moving_flag_times_out() {
        let mut input = Input::new(1.5);
        assert!(!input.is_pointer_moving());

        input.pointer_moved(10.0, 10.0);
        input.advance(1.0);
        assert!(input.is_pointer_moving());

        // New motion rearms the full timeout.
        input.pointer_moved(20.0, 20.0);
        input.advance(1.0);
        assert!(input.is_pointer_moving());

        input.advance(0.6);
        assert!(!input.is_pointer_moving());
    }

    #[test]
    fn test_press_edges() {
        let mut input = Input::default();
        input.press();
        assert!(input.pressed());
        assert!(input.is_held());

        input.end_frame();
        input.press();
        assert!(!input.pressed());

        input.release();
        assert!(input.released());
        assert!(!input.is_held());

        input.end_frame();
        input.release();
        assert!(!input.released());
    }

    #[test]
    fn test_pointer_input_snapshot() {
        let mut input = Input::new(0.5);
        input.set_window_size(200, 100);
        assert_eq!(input.pointer_input(), PointerInput::default());

        input.pointer_moved(200.0, 50.0);
        input.press();
        let snapshot = input.pointer_input();
        assert_eq!(snapshot.position, Vec2::new(1.0, 0.0));
        assert!(snapshot.active);
        assert!(snapshot.moving);

        input.advance(1.0);
        input.release();
        let snapshot = input.pointer_input();
        assert!(!snapshot.active);
        assert!(!snapshot.moving);
        assert_eq!(snapshot.position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_zero_sized_window_ignores_motion() {
        let mut input = Input::default();
        input.set_window_size(0, 0);
        input.pointer_moved(10.0, 10.0);
        assert!(!input.is_pointer_moving());
        assert_eq!(input.pointer(), Vec2::ZERO);
    }
}
