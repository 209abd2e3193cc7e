//! The single owner of scene, camera and viewport state.

use crate::camera::PerspectiveCamera;
use crate::graph::Scene;

/// Logical window size and the pixel density the renderer targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
    pub max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
            max_pixel_ratio: max_pixel_ratio.max(1.0),
        };
        viewport.set(width, height, device_pixel_ratio);
        viewport
    }

    fn set(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.max_pixel_ratio)
        } else {
            1.0
        };
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the drawing surface in physical pixels.
    pub fn render_size(&self) -> RenderSize {
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).round() as u32).max(1);
        RenderSize {
            width: scale(self.width),
            height: scale(self.height),
            pixel_ratio: self.pixel_ratio,
        }
    }
}

/// Physical output size handed to the renderer after a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

/// Scene, camera and viewport, passed explicitly to the builder and the frame step.
#[derive(Debug, Clone)]
pub struct SceneContext {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub viewport: Viewport,
}

impl SceneContext {
    /// A context whose camera aspect already matches `viewport`.
    pub fn new(scene: Scene, mut camera: PerspectiveCamera, viewport: Viewport) -> Self {
        camera.set_aspect_ratio(viewport.width as f32, viewport.height as f32);
        Self {
            scene,
            camera,
            viewport,
        }
    }

    /// React to a new logical window size. Touches only the camera aspect and
    /// the viewport; animation state is left alone.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> RenderSize {
        self.viewport.set(width, height, device_pixel_ratio);
        self.camera
            .set_aspect_ratio(self.viewport.width as f32, self.viewport.height as f32);
        let size = self.viewport.render_size();
        tracing::debug!(
            "Viewport resized to {}x{} (render {}x{} @ {:.2})",
            self.viewport.width,
            self.viewport.height,
            size.width,
            size.height,
            size.pixel_ratio
        );
        size
    }
}
