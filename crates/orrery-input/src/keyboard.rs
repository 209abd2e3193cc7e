//! Frame-coherent keyboard state tracker and the key-to-command mapping.
//!
//! Physical key codes are used so the bindings sit in the same place on every
//! keyboard layout.

use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Minimal description of a key event for processing.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: KeyCode,
    pub state: ElementState,
    pub repeat: bool,
}

/// Tracks held keys and the keys pressed since the last clear.
///
/// Forward every [`KeyEvent`] to [`process_event`](Self::process_event), read
/// commands through [`KeyBindings::commands`], then call
/// [`clear_transients`](Self::clear_transients).
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
    just_pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys winit cannot identify are ignored.
    pub fn process_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        self.process_raw(RawKeyEvent {
            key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    /// Auto-repeat never counts as a fresh press.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        match event.state {
            ElementState::Pressed => {
                if !event.repeat && self.pressed.insert(event.key) {
                    self.just_pressed.insert(event.key);
                }
            }
            ElementState::Released => {
                self.pressed.remove(&event.key);
            }
        }
    }

    #[must_use]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    #[must_use]
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn clear_transients(&mut self) {
        self.just_pressed.clear();
    }

    /// Drop all held keys, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.just_pressed.clear();
    }
}

/// Something the user asked the viewer to do from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    TogglePause,
    Quit,
}

/// Which key triggers which [`ViewerCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub toggle_pause: KeyCode,
    pub quit: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_pause: KeyCode::Space,
            quit: KeyCode::Escape,
        }
    }
}

impl KeyBindings {
    /// Commands triggered by keys pressed this frame, in a fixed order.
    #[must_use]
    pub fn commands(&self, keyboard: &KeyboardState) -> Vec<ViewerCommand> {
        let mut commands = Vec::new();
        if keyboard.just_pressed(self.toggle_pause) {
            commands.push(ViewerCommand::TogglePause);
        }
        if keyboard.just_pressed(self.quit) {
            commands.push(ViewerCommand::Quit);
        }
        if !commands.is_empty() {
            tracing::debug!(?commands, "keyboard commands");
        }
        commands
    }
}
