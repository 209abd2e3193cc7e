//! Frame-coherent mouse state tracker.
//!
//! [`MouseState`] accumulates winit mouse events during a frame and turns them
//! into the [`ControlInput`] the orbit controls consume: drag with the left
//! button to rotate, scroll to zoom.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

use orrery_scene::ControlInput;

/// Pixel scroll (touchpads) per line of wheel scroll.
const PIXELS_PER_LINE: f64 = 40.0;

/// Per-button press/release tracking for a single frame.
#[derive(Debug, Clone, Copy, Default)]
struct ButtonFrame {
    pressed: bool,
    just_pressed: bool,
    just_released: bool,
}

/// Maps a [`MouseButton`] to an index 0..3; extra buttons share the last slot.
fn button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
        _ => 3,
    }
}

/// Frame-coherent mouse state.
///
/// Forward winit events via the `on_*` methods, read [`Self::control_input`]
/// once per frame, then call [`Self::clear_transients`].
#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Last known cursor position; `None` until the first move after entering.
    position: Option<Vec2>,
    delta: Vec2,
    /// Movement made while the rotate button was held.
    drag: Vec2,
    buttons: [ButtonFrame; 4],
    scroll: f32,
    cursor_in_window: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a `CursorMoved` event (physical pixels).
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if let Some(previous) = self.position {
            let step = new_pos - previous;
            self.delta += step;
            if self.buttons[button_index(MouseButton::Left)].pressed {
                self.drag += step;
            }
        }
        self.position = Some(new_pos);
    }

    /// Process a `MouseInput` event.
    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        let frame = &mut self.buttons[button_index(button)];
        match state {
            ElementState::Pressed => {
                frame.pressed = true;
                frame.just_pressed = true;
            }
            ElementState::Released => {
                frame.pressed = false;
                frame.just_released = true;
            }
        }
    }

    /// Process a `MouseWheel` event. Positive values scroll up (zoom in).
    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    pub fn on_cursor_entered(&mut self) {
        self.cursor_in_window = true;
    }

    /// Leaving the window forgets the position and releases every button,
    /// since the release may happen where we cannot see it.
    pub fn on_cursor_left(&mut self) {
        self.cursor_in_window = false;
        self.position = None;
        for button in &mut self.buttons {
            button.pressed = false;
        }
    }

    /// Clears per-frame transients: delta, drag, scroll, just_pressed, just_released.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.drag = Vec2::ZERO;
        self.scroll = 0.0;
        for b in &mut self.buttons {
            b.just_pressed = false;
            b.just_released = false;
        }
    }

    /// Input for the orbit controls gathered this frame.
    #[must_use]
    pub fn control_input(&self, viewport_height: f32) -> ControlInput {
        ControlInput {
            rotate_delta: self.drag,
            zoom_delta: self.scroll,
            viewport_height,
        }
    }

    /// Current cursor position in physical pixels, if known.
    #[must_use]
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    /// Movement since the last clear, whether or not a button is held.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].pressed
    }

    #[must_use]
    pub fn just_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_pressed
    }

    #[must_use]
    pub fn just_button_released(&self, button: MouseButton) -> bool {
        self.buttons[button_index(button)].just_released
    }

    /// Scroll accumulated this frame in lines (positive = scroll up).
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    #[must_use]
    pub fn is_cursor_in_window(&self) -> bool {
        self.cursor_in_window
    }
}
