//! Debug HTTP surface for the viewer.
//!
//! Exposes frame metrics and the camera panel fields over a local HTTP server
//! so the running scene can be observed and nudged from outside. Only compiled
//! in debug builds.

#[cfg(debug_assertions)]
pub mod server;

#[cfg(debug_assertions)]
pub use server::{DebugServer, DebugServerError};


use serde::Serialize;

/// Environment variable overriding the configured debug port.
pub const DEBUG_PORT_ENV: &str = "ORRERY_DEBUG_PORT";

/// Names of the camera panel fields accepted by `POST /panel`, in display order.
pub const PANEL_FIELDS: [&str; 3] = ["z", "y", "x"];

/// Renderer counters mirrored into [`DebugState`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RenderMetrics {
    pub draw_calls: u32,
    pub meshes: usize,
    pub textures: usize,
    pub frames_skipped: u64,
    pub background_visible: bool,
}

/// One live-adjustable panel field and its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelFieldState {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub value: f32,
}

/// State shared between the frame loop and the debug server.
/// Written once per frame, read by the server on request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DebugState {
    pub frame_count: u64,
    pub frame_time_ms: f64,
    pub fps: f64,
    pub window_width: u32,
    pub window_height: u32,
    pub pixel_ratio: f64,
    pub uptime_seconds: f64,
    /// Sun rotation about its local Y axis, radians.
    pub sun_angle: f32,
    pub camera_position: [f32; 3],
    pub paused: bool,
    pub quit_requested: bool,
    pub render: RenderMetrics,
    /// Served by `/panel`, not `/metrics`.
    #[serde(skip)]
    pub panel: Vec<PanelFieldState>,
}

/// A request from the debug surface, applied by the frame loop at the start of
/// the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugRequest {
    SetPanelField { field: String, value: f32 },
    Pause,
    Resume,
    Quit,
}

/// Debug port from `ORRERY_DEBUG_PORT`, falling back to `configured`.
pub fn debug_port(configured: u16) -> u16 {
    parse_port(std::env::var(DEBUG_PORT_ENV).ok().as_deref()).unwrap_or(configured)
}

fn parse_port(value: Option<&str>) -> Option<u16> {
    value.and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod port_tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(Some("8080")), Some(8080));
        assert_eq!(parse_port(Some(" 9000 ")), Some(9000));
        assert_eq!(parse_port(Some("not-a-port")), None);
        assert_eq!(parse_port(Some("70000")), None);
        assert_eq!(parse_port(None), None);
    }
}
