//! Orbit camera controls: drag to rotate around the target, scroll to zoom.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use orrery_config::ControlsConfig;

use crate::camera::PerspectiveCamera;

/// Keeps the camera off the poles where the orbit would flip.
const POLAR_EPSILON: f32 = 1e-3;

/// Motion below this is treated as settled.
const REST_THRESHOLD: f32 = 1e-6;

/// Per-scroll-step zoom base, raised to the zoom speed.
const ZOOM_BASE: f32 = 0.95;

/// Pointer input gathered since the previous frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    /// Drag distance in physical pixels while the rotate button is held.
    pub rotate_delta: Vec2,
    /// Scroll amount in lines; positive zooms in.
    pub zoom_delta: f32,
    /// Height of the viewport in physical pixels, used to scale drag to angle.
    pub viewport_height: f32,
}

impl ControlInput {
    pub fn is_idle(&self) -> bool {
        self.rotate_delta == Vec2::ZERO && self.zoom_delta == 0.0
    }
}

/// Orbit controller with optional damping.
///
/// With damping on, each input is spread over the following frames: every
/// update applies `damping_factor` of the pending rotation and keeps the rest.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub invert_y: bool,
    /// Pending (azimuth, polar) change in radians.
    pending: Vec2,
    /// Pending distance multiplier.
    scale: f32,
}

impl OrbitControls {
    pub fn from_config(config: &ControlsConfig) -> Self {
        Self {
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            min_distance: config.min_distance.max(0.0),
            max_distance: config.max_distance.max(config.min_distance),
            invert_y: config.invert_y,
            pending: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Queue pointer input. Takes effect on the next [`Self::update`].
    pub fn handle_input(&mut self, input: &ControlInput) {
        if input.rotate_delta != Vec2::ZERO {
            let height = input.viewport_height.max(1.0);
            let dy = if self.invert_y {
                -input.rotate_delta.y
            } else {
                input.rotate_delta.y
            };
            self.pending.x -= TAU * input.rotate_delta.x / height * self.rotate_speed;
            self.pending.y -= TAU * dy / height * self.rotate_speed;
        }
        if input.zoom_delta != 0.0 {
            // Scrolling forward brings the camera closer.
            self.scale *= ZOOM_BASE.powf(self.zoom_speed * input.zoom_delta);
        }
    }

    /// True when no queued motion remains.
    pub fn is_at_rest(&self) -> bool {
        self.pending.abs().max_element() < REST_THRESHOLD
            && (self.scale - 1.0).abs() < REST_THRESHOLD
    }

    /// Drop any queued motion.
    pub fn stop(&mut self) {
        self.pending = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Move the camera by the queued motion. Returns whether the camera changed.
    ///
    /// A camera at rest is left untouched so that positions written directly
    /// (for example by the debug panel) survive exactly.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.is_at_rest() {
            self.stop();
            return false;
        }

        let offset = camera.position - camera.target;
        let radius = offset.length();
        if radius < f32::EPSILON {
            self.stop();
            return false;
        }

        let mut azimuth = offset.x.atan2(offset.z);
        let mut polar = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let step = if self.enable_damping {
            self.pending * self.damping_factor
        } else {
            self.pending
        };
        azimuth += step.x;
        polar = (polar + step.y).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let sin_polar = polar.sin();
        camera.position = camera.target
            + Vec3::new(
                radius * sin_polar * azimuth.sin(),
                radius * polar.cos(),
                radius * sin_polar * azimuth.cos(),
            );

        if self.enable_damping {
            self.pending *= 1.0 - self.damping_factor;
        } else {
            self.pending = Vec2::ZERO;
        }
        self.scale = 1.0;
        true
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::from_config(&ControlsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(dx: f32, dy: f32) -> ControlInput {
        ControlInput {
            rotate_delta: Vec2::new(dx, dy),
            zoom_delta: 0.0,
            viewport_height: 720.0,
        }
    }

    #[test]
    fn test_idle_update_leaves_camera_untouched() {
        let mut controls = OrbitControls::default();
        let mut camera = PerspectiveCamera::default();
        camera.position.z = 37.0;
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position.z, 37.0);
    }

    #[test]
    fn test_rotation_preserves_distance() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut camera = PerspectiveCamera::default();
        let before = camera.distance_to_target();
        controls.handle_input(&drag(120.0, 30.0));
        assert!(controls.update(&mut camera));
        assert!((camera.distance_to_target() - before).abs() < 1e-3);
        assert!(controls.is_at_rest());
    }

    #[test]
    fn test_damping_spreads_motion_over_frames() {
        let mut controls = OrbitControls::default();
        let mut camera = PerspectiveCamera::default();
        controls.handle_input(&drag(200.0, 0.0));

        let start = camera.position;
        controls.update(&mut camera);
        let first_step = (camera.position - start).length();
        let mid = camera.position;
        controls.update(&mut camera);
        let second_step = (camera.position - mid).length();

        assert!(first_step > 0.0);
        assert!(second_step < first_step);
        assert!(!controls.is_at_rest());
    }

    #[test]
    fn test_damped_motion_settles() {
        let mut controls = OrbitControls::default();
        let mut camera = PerspectiveCamera::default();
        controls.handle_input(&drag(50.0, 10.0));
        for _ in 0..1000 {
            controls.update(&mut camera);
        }
        assert!(controls.is_at_rest());
    }

    #[test]
    fn test_zoom_in_moves_closer() {
        let mut controls = OrbitControls::default();
        let mut camera = PerspectiveCamera::default();
        let before = camera.distance_to_target();
        controls.handle_input(&ControlInput {
            zoom_delta: 3.0,
            viewport_height: 720.0,
            ..ControlInput::default()
        });
        controls.update(&mut camera);
        assert!(camera.distance_to_target() < before);
    }

    #[test]
    fn test_zoom_clamped_to_min_distance() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut camera = PerspectiveCamera::default();
        controls.handle_input(&ControlInput {
            zoom_delta: 500.0,
            viewport_height: 720.0,
            ..ControlInput::default()
        });
        controls.update(&mut camera);
        assert!((camera.distance_to_target() - controls.min_distance).abs() < 1e-3);
    }

    #[test]
    fn test_polar_angle_clamped() {
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        let mut camera = PerspectiveCamera::default();
        controls.handle_input(&drag(0.0, 100_000.0));
        controls.update(&mut camera);
        assert!(camera.position.is_finite());
        assert!(camera.view_matrix().is_finite());
        assert!(camera.position.y > 0.0);
    }
}
