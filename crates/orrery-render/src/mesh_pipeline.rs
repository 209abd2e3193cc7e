//! Pipeline for sphere and torus meshes: textured surfaces lit by the ambient and
//! hemisphere lights, or flat-colored orbit paths and rings.

use std::num::NonZeroU64;

use crate::buffer::{MeshBuffer, VertexPositionNormalUv};
use crate::frame::{FrameUniform, ObjectUniform};
use crate::targets::{DepthBuffer, multisample_state};

/// Mesh rendering pipeline.
///
/// Bind groups:
/// - group 0: [`FrameUniform`]
/// - group 1: [`ObjectUniform`] with a dynamic offset per draw
/// - group 2: base color texture + sampler
pub struct MeshPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub frame_bind_group_layout: wgpu::BindGroupLayout,
    pub object_bind_group_layout: wgpu::BindGroupLayout,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("frame-bind-group-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<FrameUniform>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("object-bind-group-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<ObjectUniform>() as u64
                        ),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[
                &frame_bind_group_layout,
                &object_bind_group_layout,
                texture_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthBuffer::stencil_state(true)),
            multisample: multisample_state(sample_count),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            frame_bind_group_layout,
            object_bind_group_layout,
        }
    }
}

/// Record one mesh draw. The frame bind group must already be set.
pub fn draw_mesh(
    render_pass: &mut wgpu::RenderPass<'_>,
    object_bind_group: &wgpu::BindGroup,
    object_offset: u32,
    texture_bind_group: &wgpu::BindGroup,
    mesh: &MeshBuffer,
) {
    render_pass.set_bind_group(1, object_bind_group, &[object_offset]);
    render_pass.set_bind_group(2, texture_bind_group, &[]);
    mesh.bind(render_pass);
    mesh.draw(render_pass);
}

/// WGSL source for the mesh pipeline.
pub const MESH_SHADER_SOURCE: &str = r#"
struct FrameUniform {
    view_proj: mat4x4<f32>,
    ambient: vec4<f32>,
    sky: vec4<f32>,
    ground: vec4<f32>,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    color: vec4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: FrameUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var base_texture: texture_2d<f32>;
@group(2) @binding(1) var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = object.model * vec4<f32>(in.position, 1.0);
    out.clip_position = frame.view_proj * world;
    out.world_normal = (object.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(base_texture, base_sampler, in.uv) * object.color;
    if (object.flags.x < 0.5) {
        return vec4<f32>(albedo.rgb, 1.0);
    }
    let n = normalize(in.world_normal);
    let t = 0.5 * n.y + 0.5;
    let hemisphere = mix(frame.ground.rgb, frame.sky.rgb, t);
    let irradiance = frame.ambient.rgb + hemisphere;
    return vec4<f32>(albedo.rgb * irradiance, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{MESH_SHADER, ShaderLibrary};
    use crate::texture::{TextureManager, create_test_device_queue};

    #[test]
    fn test_shader_declares_entry_points() {
        assert!(MESH_SHADER_SOURCE.contains("fn vs_main"));
        assert!(MESH_SHADER_SOURCE.contains("fn fs_main"));
        assert!(MESH_SHADER_SOURCE.contains("@group(2) @binding(1)"));
    }

    #[test]
    fn test_pipeline_creation_single_sample() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let textures = TextureManager::new(&device, &queue);
        let shaders = ShaderLibrary::with_builtins(&device).unwrap();
        let _pipeline = MeshPipeline::new(
            &device,
            &shaders.get(MESH_SHADER).unwrap(),
            wgpu::TextureFormat::Bgra8UnormSrgb,
            1,
            textures.bind_group_layout(),
        );
    }

    #[test]
    fn test_pipeline_creation_multisampled() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let textures = TextureManager::new(&device, &queue);
        let shaders = ShaderLibrary::with_builtins(&device).unwrap();
        let _pipeline = MeshPipeline::new(
            &device,
            &shaders.get(MESH_SHADER).unwrap(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            4,
            textures.bind_group_layout(),
        );
    }
}
