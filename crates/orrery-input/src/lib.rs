//! Window input for the viewer: mouse drags and wheel feed the orbit controls,
//! a few keys map to viewer commands.

pub mod keyboard;
pub mod mouse;

pub use keyboard::{KeyBindings, KeyboardState, RawKeyEvent, ViewerCommand};
pub use mouse::MouseState;
