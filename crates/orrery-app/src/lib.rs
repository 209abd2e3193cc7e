//! The orrery viewer application.
//!
//! [`viewer::Viewer`] holds everything a frame needs and runs headless;
//! [`window::App`] wires it to a winit window, the GPU renderer and the debug
//! server.

pub mod debug_link;
pub mod frame_clock;
pub mod platform;
pub mod viewer;
pub mod window;
