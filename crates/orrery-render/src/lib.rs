//! wgpu renderer for the solar system: surface management, render targets,
//! mesh and texture upload, and the per-frame scene pass.

pub mod background;
pub mod buffer;
pub mod frame;
pub mod gpu;
pub mod mesh_pipeline;
pub mod pass;
pub mod renderer;
pub mod shader;
pub mod targets;
pub mod texture;

pub use background::BackgroundPipeline;
pub use buffer::{
    BufferAllocator, DynamicUniformBuffer, IndexData, MeshBuffer, VertexPositionNormalUv,
};
pub use frame::{DrawItem, FrameData, FrameUniform, ObjectUniform};
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, SurfaceOptions, init_render_context_blocking,
};
pub use mesh_pipeline::MeshPipeline;
pub use pass::{FrameEncoder, RenderPassBuilder, clear_color};
pub use renderer::{RenderStats, SceneRenderer};
pub use shader::{ShaderError, ShaderLibrary};
pub use targets::{DepthBuffer, MsaaTarget};
pub use texture::{GpuTexture, TextureError, TextureManager};
