//! The scene renderer: draws a [`Scene`] from a [`PerspectiveCamera`] into the
//! window surface once per frame.

use std::collections::HashMap;
use std::sync::Arc;

use orrery_config::RenderConfig;
use orrery_scene::{
    Color, FrameRenderer, GeometryKey, PerspectiveCamera, RenderSize, Scene, TextureHandle,
};

use crate::background::BackgroundPipeline;
use crate::buffer::{BufferAllocator, DynamicUniformBuffer, MeshBuffer};
use crate::frame::{FrameData, FrameUniform, ObjectUniform};
use crate::gpu::{RenderContext, SurfaceError};
use crate::mesh_pipeline::{MeshPipeline, draw_mesh};
use crate::pass::{FrameEncoder, RenderPassBuilder, clear_color};
use crate::shader::{BACKGROUND_SHADER, MESH_SHADER, ShaderError, ShaderLibrary};
use crate::targets::{DepthBuffer, MsaaTarget};
use crate::texture::{GpuTexture, TextureManager};

/// Counters exposed to the debug server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    /// Mesh draws recorded in the last frame.
    pub draw_calls: u32,
    /// Distinct geometries uploaded so far.
    pub meshes: usize,
    /// Texture handles with a resident GPU texture.
    pub textures: usize,
    pub background_visible: bool,
}

/// Owns the GPU context and every resource needed to draw the solar system.
pub struct SceneRenderer {
    context: RenderContext,
    depth: DepthBuffer,
    msaa: Option<MsaaTarget>,
    textures: TextureManager,
    meshes: HashMap<GeometryKey, MeshBuffer>,
    mesh_pipeline: MeshPipeline,
    background: BackgroundPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    objects: DynamicUniformBuffer<ObjectUniform>,
    object_bind_group: wgpu::BindGroup,
    clear_color: wgpu::Color,
    stats: RenderStats,
    fatal: Option<SurfaceError>,
}

impl SceneRenderer {
    pub fn new(context: RenderContext, config: &RenderConfig) -> Result<Self, ShaderError> {
        let device = &context.device;
        let (width, height) = context.size();
        let sample_count = context.sample_count;

        let shaders = ShaderLibrary::with_builtins(device)?;
        let textures = TextureManager::new(device, &context.queue);
        let mesh_pipeline = MeshPipeline::new(
            device,
            &*shaders.get(MESH_SHADER)?,
            context.surface_format,
            sample_count,
            textures.bind_group_layout(),
        );
        let background = BackgroundPipeline::new(
            device,
            &*shaders.get(BACKGROUND_SHADER)?,
            context.surface_format,
            sample_count,
            textures.bind_group_layout(),
        );

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame-uniform"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &mesh_pipeline.frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Room for the reference scene (18 meshes) before the first grow.
        let objects = DynamicUniformBuffer::new(device, "object-uniforms", 32);
        let object_bind_group =
            create_object_bind_group(device, &mesh_pipeline.object_bind_group_layout, &objects);

        let depth = DepthBuffer::new(device, width, height, sample_count);
        let msaa = MsaaTarget::new(device, context.surface_format, width, height, sample_count);

        Ok(Self {
            depth,
            msaa,
            textures,
            meshes: HashMap::new(),
            mesh_pipeline,
            background,
            frame_buffer,
            frame_bind_group,
            objects,
            object_bind_group,
            clear_color: clear_color(Color::from_hex(config.clear_color), config.transparent),
            stats: RenderStats::default(),
            fatal: None,
            context,
        })
    }

    /// Resize the surface and every size-dependent target.
    pub fn resize(&mut self, size: RenderSize) {
        self.context.resize(size.width, size.height);
        let (width, height) = self.context.size();
        self.depth.resize(&self.context.device, width, height);
        if let Some(msaa) = &mut self.msaa {
            msaa.resize(&self.context.device, width, height);
        }
        log::debug!(
            "Renderer resized to {width}x{height} (pixel ratio {:.2})",
            size.pixel_ratio
        );
    }

    pub fn size(&self) -> (u32, u32) {
        self.context.size()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// A surface error the renderer could not recover from. The host should exit.
    pub fn take_fatal_error(&mut self) -> Option<SurfaceError> {
        self.fatal.take()
    }

    /// Upload geometry, textures and uniforms for `frame`. Returns the texture to
    /// bind for each draw, plus the background texture once it has resolved.
    fn prepare(
        &mut self,
        frame: &FrameData,
        camera: &PerspectiveCamera,
        background: Option<&TextureHandle>,
    ) -> (Vec<Arc<GpuTexture>>, Option<Arc<GpuTexture>>) {
        let device = &self.context.device;
        let queue = &self.context.queue;

        for draw in &frame.draws {
            self.meshes.entry(draw.geometry.key()).or_insert_with(|| {
                let mesh = draw.geometry.generate();
                log::debug!(
                    "Uploading {:?} ({} vertices, {} triangles)",
                    draw.geometry,
                    mesh.vertex_count(),
                    mesh.triangle_count()
                );
                BufferAllocator::new(device).create_from_mesh_data("scene-mesh", &mesh)
            });
        }

        let maps = frame
            .draws
            .iter()
            .map(|draw| self.textures.resolve(device, queue, draw.map.as_ref()))
            .collect();

        let background = background
            .filter(|handle| handle.is_resolved())
            .map(|handle| self.textures.resolve(device, queue, Some(handle)))
            .filter(|texture| !Arc::ptr_eq(texture, self.textures.fallback()));

        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniform::new(camera, frame)),
        );
        let objects: Vec<ObjectUniform> = frame.draws.iter().map(ObjectUniform::new).collect();
        if self.objects.write(device, queue, &objects) {
            self.object_bind_group = create_object_bind_group(
                device,
                &self.mesh_pipeline.object_bind_group_layout,
                &self.objects,
            );
        }

        (maps, background)
    }

    fn handle_surface_error(&mut self, error: SurfaceError) {
        self.stats.frames_skipped += 1;
        if error.is_recoverable() {
            log::warn!("Surface {error}, skipping frame");
        } else {
            log::error!("Surface {error}, cannot continue rendering");
            self.fatal = Some(error);
        }
    }
}

impl FrameRenderer for SceneRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) {
        let frame = FrameData::collect(scene);
        let (maps, background) = self.prepare(&frame, camera, scene.background.as_ref());

        let surface_texture = match self.context.get_current_texture() {
            Ok(texture) => texture,
            Err(error) => {
                self.handle_surface_error(error);
                return;
            }
        };

        let mut draw_calls = 0;
        let mut encoder =
            FrameEncoder::new(&self.context.device, &self.context.queue, surface_texture);
        {
            let builder = RenderPassBuilder::new()
                .clear_color(self.clear_color)
                .depth(&self.depth)
                .msaa(self.msaa.as_ref())
                .label("scene-pass");
            let mut pass = encoder.begin_render_pass(&builder);

            if let Some(texture) = &background {
                self.background.draw(&mut pass, &texture.bind_group);
            }

            pass.set_pipeline(&self.mesh_pipeline.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (index, (draw, map)) in frame.draws.iter().zip(&maps).enumerate() {
                let Some(mesh) = self.meshes.get(&draw.geometry.key()) else {
                    continue;
                };
                draw_mesh(
                    &mut pass,
                    &self.object_bind_group,
                    self.objects.offset(index),
                    &map.bind_group,
                    mesh,
                );
                draw_calls += 1;
            }
        }
        encoder.finish();

        self.stats.frames_rendered += 1;
        self.stats.draw_calls = draw_calls;
        self.stats.meshes = self.meshes.len();
        self.stats.textures = self.textures.len();
        self.stats.background_visible = background.is_some();
    }
}

fn create_object_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    objects: &DynamicUniformBuffer<ObjectUniform>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object-bind-group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: objects.binding(),
        }],
    })
}
