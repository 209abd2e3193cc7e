//! Screen-space background: the star texture stretched over the whole viewport
//! behind every mesh, drawn as a single fullscreen triangle.

use crate::targets::{DepthBuffer, multisample_state};

/// Pipeline drawing the scene background texture.
pub struct BackgroundPipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl BackgroundPipeline {
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("background-pipeline-layout"),
            bind_group_layouts: &[texture_bind_group_layout],
            immediate_size: 0,
        });

        // Shares the pass with the meshes, so it carries the depth attachment
        // but neither tests nor writes it.
        let mut depth_stencil = DepthBuffer::stencil_state(false);
        depth_stencil.depth_compare = wgpu::CompareFunction::Always;

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("background-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
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

        Self { pipeline }
    }

    /// Draw the background. Call first in the pass, before any mesh.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, texture: &wgpu::BindGroup) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, texture, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

/// WGSL source for the background pass.
pub const BACKGROUND_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var background_texture: texture_2d<f32>;
@group(0) @binding(1) var background_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(background_texture, background_sampler, in.uv);
    return vec4<f32>(color.rgb, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{BACKGROUND_SHADER, ShaderLibrary};
    use crate::texture::{TextureManager, create_test_device_queue};

    #[test]
    fn test_fullscreen_triangle_covers_clip_space() {
        // Mirrors the vertex shader's index math.
        let corners: Vec<(f32, f32)> = (0u32..3)
            .map(|idx| {
                let u = ((idx << 1) & 2) as f32;
                let v = (idx & 2) as f32;
                (u * 2.0 - 1.0, v * 2.0 - 1.0)
            })
            .collect();
        assert_eq!(corners, vec![(-1.0, -1.0), (3.0, -1.0), (-1.0, 3.0)]);
    }

    #[test]
    fn test_pipeline_creation() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let textures = TextureManager::new(&device, &queue);
        let shaders = ShaderLibrary::with_builtins(&device).unwrap();
        let _pipeline = BackgroundPipeline::new(
            &device,
            &shaders.get(BACKGROUND_SHADER).unwrap(),
            wgpu::TextureFormat::Bgra8UnormSrgb,
            4,
            textures.bind_group_layout(),
        );
    }
}
