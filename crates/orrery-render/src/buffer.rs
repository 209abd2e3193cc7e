//! Vertex, index and uniform buffer management for GPU rendering.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use orrery_scene::MeshData;

/// A complete mesh buffer containing vertex and index data ready for GPU rendering.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
}

impl MeshBuffer {
    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
    }

    /// Draw the entire mesh using indexed rendering.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Index data that can be either u16 or u32 format.
pub enum IndexData<'a> {
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl IndexData<'_> {
    /// Get the appropriate wgpu index format for this data.
    pub fn format(&self) -> wgpu::IndexFormat {
        match self {
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
        }
    }

    /// Get the number of indices.
    pub fn count(&self) -> u32 {
        match self {
            IndexData::U16(data) => data.len() as u32,
            IndexData::U32(data) => data.len() as u32,
        }
    }

    /// Get the raw byte slice for buffer creation.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(data) => bytemuck::cast_slice(data),
            IndexData::U32(data) => bytemuck::cast_slice(data),
        }
    }
}

/// Vertex format with position, normal, and UV coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct VertexPositionNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl VertexPositionNormalUv {
    /// Get the vertex buffer layout for this vertex type.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPositionNormalUv>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: VertexFormat::Float32x3,
                },
                VertexAttribute {
                    offset: (std::mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Interleave a generated mesh into the GPU vertex format.
pub fn interleave(mesh: &MeshData) -> Vec<VertexPositionNormalUv> {
    mesh.positions
        .iter()
        .zip(&mesh.normals)
        .zip(&mesh.uvs)
        .map(|((position, normal), uv)| VertexPositionNormalUv {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: *uv,
        })
        .collect()
}

/// Narrow indices to u16 when every vertex is addressable with 16 bits.
pub fn narrow_indices(mesh: &MeshData) -> Option<Vec<u16>> {
    if mesh.positions.len() > u16::MAX as usize + 1 {
        return None;
    }
    mesh.indices
        .iter()
        .map(|&index| u16::try_from(index).ok())
        .collect()
}

/// GPU buffer allocator for creating vertex and index buffers.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    /// Create a new buffer allocator with the given device.
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Create a complete mesh buffer from vertex and index data.
    pub fn create_mesh(&self, label: &str, vertices: &[u8], indices: IndexData) -> MeshBuffer {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: indices.as_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: indices.count(),
            index_format: indices.format(),
        }
    }

    /// Upload a generated sphere or torus mesh.
    pub fn create_from_mesh_data(&self, label: &str, mesh: &MeshData) -> MeshBuffer {
        let vertices = interleave(mesh);
        match narrow_indices(mesh) {
            Some(indices) => {
                self.create_mesh(label, bytemuck::cast_slice(&vertices), IndexData::U16(&indices))
            }
            None => self.create_mesh(
                label,
                bytemuck::cast_slice(&vertices),
                IndexData::U32(&mesh.indices),
            ),
        }
    }
}

/// Round `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Uniform buffer holding one `T` per draw, addressed with dynamic offsets.
pub struct DynamicUniformBuffer<T: Pod> {
    pub buffer: wgpu::Buffer,
    stride: u64,
    capacity: usize,
    label: &'static str,
    staging: Vec<u8>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Pod> DynamicUniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        let stride = aligned_stride(
            std::mem::size_of::<T>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);
        Self {
            buffer: Self::allocate(device, label, stride, capacity),
            stride,
            capacity,
            label,
            staging: Vec::new(),
            _marker: std::marker::PhantomData,
        }
    }

    fn allocate(device: &wgpu::Device, label: &str, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Write all items, growing the buffer if needed. Returns `true` when the
    /// buffer was reallocated and bind groups referencing it must be rebuilt.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, items: &[T]) -> bool {
        let mut grown = false;
        if items.len() > self.capacity {
            self.capacity = items.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.stride, self.capacity);
            log::debug!("Grew {} to {} slots", self.label, self.capacity);
            grown = true;
        }
        if items.is_empty() {
            return grown;
        }

        self.staging.clear();
        self.staging.resize(self.stride as usize * items.len(), 0);
        for (i, item) in items.iter().enumerate() {
            let start = i * self.stride as usize;
            let bytes = bytemuck::bytes_of(item);
            self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
        grown
    }

    /// Dynamic offset of slot `index`.
    pub fn offset(&self, index: usize) -> u32 {
        (index as u64 * self.stride) as u32
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Binding covering a single slot, as the shader sees it.
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::create_test_device_queue;
    use orrery_scene::Geometry;

    #[test]
    fn test_u16_vs_u32_format_selection() {
        let u16_data = IndexData::U16(&[0, 1, 2]);
        let u32_data = IndexData::U32(&[0, 1, 2]);

        assert_eq!(u16_data.format(), wgpu::IndexFormat::Uint16);
        assert_eq!(u32_data.format(), wgpu::IndexFormat::Uint32);
    }

    #[test]
    fn test_index_data_as_bytes() {
        let data = IndexData::U16(&[0, 1, 2]);
        assert_eq!(data.as_bytes().len(), 6);

        let data = IndexData::U32(&[0, 1, 2]);
        assert_eq!(data.as_bytes().len(), 12);
    }

    #[test]
    fn test_vertex_position_normal_uv_layout() {
        let layout = VertexPositionNormalUv::layout();
        // position (f32x3) + normal (f32x3) + uv (f32x2) = 32 bytes stride
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
    }

    #[test]
    fn test_interleave_keeps_vertex_count() {
        let mesh = Geometry::sphere(1.0, 8, 6).generate();
        let vertices = interleave(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[0].position, mesh.positions[0].to_array());
        assert_eq!(vertices[5].uv, mesh.uvs[5]);
    }

    #[test]
    fn test_reference_meshes_fit_u16() {
        let sphere = Geometry::sphere(10.0, 32, 32).generate();
        let torus = Geometry::torus(70.0, 0.05, 16, 100).generate();
        assert_eq!(narrow_indices(&sphere).map(|i| i.len()), Some(sphere.indices.len()));
        assert_eq!(narrow_indices(&torus).map(|i| i.len()), Some(torus.indices.len()));
    }

    #[test]
    fn test_large_mesh_keeps_u32() {
        let mesh = Geometry::sphere(1.0, 400, 200).generate();
        assert!(mesh.vertex_count() > u16::MAX as usize);
        assert!(narrow_indices(&mesh).is_none());
    }

    #[test]
    fn test_aligned_stride() {
        assert_eq!(aligned_stride(160, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(12, 0), 12);
    }

    #[test]
    fn test_mesh_buffer_from_sphere() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mesh = Geometry::sphere(10.0, 32, 32).generate();
        let buffer = BufferAllocator::new(&device).create_from_mesh_data("sun", &mesh);
        assert_eq!(buffer.index_count as usize, mesh.indices.len());
        assert_eq!(buffer.index_format, wgpu::IndexFormat::Uint16);
    }

    #[test]
    fn test_dynamic_uniform_buffer_grows() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut uniforms = DynamicUniformBuffer::<[f32; 4]>::new(&device, "test-uniforms", 2);
        assert!(uniforms.stride() >= 16);
        assert!(!uniforms.write(&device, &queue, &[[0.0; 4]; 2]));
        assert!(uniforms.write(&device, &queue, &[[1.0; 4]; 5]));
        assert_eq!(uniforms.capacity(), 8);
        assert_eq!(uniforms.offset(3) as u64, uniforms.stride() * 3);
    }
}
