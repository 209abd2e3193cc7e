//! Perspective camera producing view and projection matrices.

use glam::{Mat4, Vec3};
use orrery_config::CameraConfig;

/// A perspective camera looking at a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Eye position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from_array(config.position),
            target: Vec3::ZERO,
            fov_y: config.fov_y_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    /// Compute the view matrix (world to camera space).
    pub fn view_matrix(&self) -> Mat4 {
        let mut forward = self.target - self.position;
        // An eye sitting on its target has no direction; look down -Z.
        if forward.length_squared() < 1e-12 {
            forward = Vec3::NEG_Z;
        }
        // Looking straight down the up axis makes look_at degenerate.
        let up = if forward.normalize().cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_to_rh(self.position, forward, up)
    }

    /// Compute the projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        // Near plane maps to z=1, far plane to z=0.
        Mat4::perspective_rh(self.fov_y, self.aspect, self.far, self.near)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update the aspect ratio. Zero heights are treated as one pixel.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect = width.max(1.0) / height.max(1.0);
    }

    pub fn distance_to_target(&self) -> f32 {
        (self.position - self.target).length()
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_default_matches_reference_view() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 15.0, 100.0));
        assert!((camera.fov_y - 55f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn test_set_aspect_ratio() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect_ratio(800.0, 600.0);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        camera.set_aspect_ratio(800.0, 0.0);
        assert_eq!(camera.aspect, 800.0);
    }

    #[test]
    fn test_target_projects_to_screen_centre() {
        let camera = PerspectiveCamera::default();
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = PerspectiveCamera {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            ..PerspectiveCamera::default()
        };
        let depth = |d: f32| {
            let clip = camera.view_projection() * Vec4::new(0.0, 0.0, -d, 1.0);
            clip.z / clip.w
        };
        assert!((depth(camera.near) - 1.0).abs() < 1e-4);
        assert!(depth(camera.far).abs() < 1e-4);
        assert!(depth(10.0) > depth(100.0));
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_position() {
        let camera = PerspectiveCamera {
            position: Vec3::new(10.0, 20.0, 30.0),
            ..PerspectiveCamera::default()
        };
        let eye = camera.view_matrix().inverse().col(3).truncate();
        assert!((eye - camera.position).length() < 1e-3);
    }

    #[test]
    fn test_looking_straight_down_is_finite() {
        let camera = PerspectiveCamera {
            position: Vec3::new(0.0, 100.0, 0.0),
            ..PerspectiveCamera::default()
        };
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn test_eye_on_target_is_finite() {
        let camera = PerspectiveCamera {
            position: Vec3::ZERO,
            ..PerspectiveCamera::default()
        };
        assert!(camera.view_projection().is_finite());
        let eye = camera.view_matrix().inverse().col(3).truncate();
        assert!(eye.length() < 1e-5);
    }
}
