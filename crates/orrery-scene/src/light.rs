//! Scene lights. Both kinds are position independent.

use crate::color::Color;

/// Uniform light applied to every lit surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Sky/ground gradient blended by how much a surface faces up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub const fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// Linear RGB scaled by intensity.
    pub fn radiance(&self) -> [f32; 3] {
        self.color.to_linear().map(|c| c * self.intensity)
    }
}

impl HemisphereLight {
    pub const fn new(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            sky,
            ground,
            intensity,
        }
    }

    /// Irradiance for a world-space normal with the given Y component.
    pub fn irradiance(&self, normal_y: f32) -> [f32; 3] {
        let t = 0.5 * normal_y.clamp(-1.0, 1.0) + 0.5;
        let sky = self.sky.to_linear();
        let ground = self.ground.to_linear();
        std::array::from_fn(|i| (ground[i] + (sky[i] - ground[i]) * t) * self.intensity)
    }
}
