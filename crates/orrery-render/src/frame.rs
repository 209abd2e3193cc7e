//! Per-frame draw list and uniform data, gathered from the scene graph on the CPU.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use orrery_scene::{Geometry, NodeId, NodeKind, PerspectiveCamera, Scene, TextureHandle};

/// One mesh node to draw this frame.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub geometry: Geometry,
    pub model: Mat4,
    /// Linear RGBA base color.
    pub color: [f32; 4],
    pub lit: bool,
    pub map: Option<TextureHandle>,
}

/// Everything the renderer needs from the scene for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameData {
    pub draws: Vec<DrawItem>,
    /// Summed ambient radiance (linear RGB).
    pub ambient: [f32; 3],
    /// Summed hemisphere sky color times intensity.
    pub sky: [f32; 3],
    /// Summed hemisphere ground color times intensity.
    pub ground: [f32; 3],
}

impl FrameData {
    /// Walk the scene graph once, collecting meshes in traversal order and lights.
    pub fn collect(scene: &Scene) -> Self {
        let mut frame = Self::default();
        scene.graph.visit(|id, node, world| match &node.kind {
            NodeKind::Mesh(mesh) => frame.draws.push(DrawItem {
                node: id,
                geometry: mesh.geometry,
                model: world,
                color: mesh.material.color().to_linear_rgba(1.0),
                lit: mesh.material.is_lit(),
                map: mesh.material.map().cloned(),
            }),
            NodeKind::AmbientLight(light) => add(&mut frame.ambient, light.radiance()),
            NodeKind::HemisphereLight(light) => {
                // Irradiance is linear in the blend factor, so summing the
                // endpoints of several hemisphere lights is exact.
                add(&mut frame.sky, light.irradiance(1.0));
                add(&mut frame.ground, light.irradiance(-1.0));
            }
            NodeKind::Group => {}
        });
        frame
    }
}

fn add(acc: &mut [f32; 3], value: [f32; 3]) {
    for (a, v) in acc.iter_mut().zip(value) {
        *a += v;
    }
}

/// Uniform shared by every draw in a frame (group 0).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
}

impl FrameUniform {
    pub fn new(camera: &PerspectiveCamera, frame: &FrameData) -> Self {
        let extend = |c: [f32; 3]| [c[0], c[1], c[2], 0.0];
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            ambient: extend(frame.ambient),
            sky: extend(frame.sky),
            ground: extend(frame.ground),
        }
    }
}

/// Per-draw uniform (group 1, dynamic offset).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: 1.0 for lit materials, 0.0 for flat ones.
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub fn new(item: &DrawItem) -> Self {
        Self {
            model: item.model.to_cols_array_2d(),
            normal: item.model.inverse().transpose().to_cols_array_2d(),
            color: item.color,
            flags: [if item.lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}
