//! Scene composition and animation for the orrery.
//!
//! The scene is built once from a fixed planet table ([`build_solar_system`])
//! and then advanced frame by frame by an [`AnimationDriver`]. Drawing, input
//! and frame pacing are reached through the traits in [`animation`], so the
//! whole model runs headless in tests.

pub mod animation;
pub mod asset;
pub mod builder;
pub mod camera;
pub mod color;
pub mod context;
pub mod controls;
pub mod debug_panel;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;
pub mod planets;

pub use animation::{
    AnimationDriver, CameraControl, FrameRenderer, FrameScheduler, ManualScheduler, StopHandle,
};
pub use asset::{StaticTextureProvider, TextureHandle, TextureImage, TextureImageError, TextureProvider};
pub use builder::{SolarSystem, build_solar_system};
pub use camera::PerspectiveCamera;
pub use color::Color;
pub use context::{RenderSize, SceneContext, Viewport};
pub use controls::{ControlInput, OrbitControls};
pub use debug_panel::{Axis, DebugPanel, NumericField, PanelError, PanelWrite};
pub use geometry::{Geometry, GeometryKey, MeshData};
pub use graph::{Mesh, Node, NodeId, NodeKind, Scene, SceneGraph, Transform};
pub use light::{AmbientLight, HemisphereLight};
pub use material::Material;
pub use planets::{PlanetConfig, REFERENCE_PLANETS, SUN_RADIUS, SUN_SPIN_SPEED, TableWarning};
