//! Owned GPU resources.
//!
//! Textures are destroyed on drop so replacing a target or mask frees its
//! memory right away instead of whenever the last handle goes.

use std::marker::PhantomData;

use glam::Vec2;
use wgpu::util::DeviceExt;

/// Offscreen colour target the sprite pass accumulates into.
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
    format: wgpu::TextureFormat,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, size: (u32, u32), format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Texture"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!(target: "gpu", "offscreen target {}x{} {:?}", size.0, size.1, format);
        Self { texture, view, size, format }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

impl Drop for OffscreenTarget {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

/// Single-channel texture holding a label mask.
pub struct MaskTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl MaskTexture {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, size: (u32, u32), pixels: &[u8]) -> Self {
        let extent = wgpu::Extent3d {
            width: size.0.max(1),
            height: size.1.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Label Mask Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(extent.width),
                rows_per_image: Some(extent.height),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view, size }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl Drop for MaskTexture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

/// Typed uniform buffer.
pub struct UniformBuffer<T: bytemuck::Pod> {
    buffer: wgpu::Buffer,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, value: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(value),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self { buffer, _marker: PhantomData }
    }

    pub fn write(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

/// Per-instance particle positions, two `f32` per particle.
///
/// Replaced wholesale every frame. Grows by doubling when the particle count
/// exceeds its capacity.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: usize,
    count: u32,
}

impl InstanceBuffer {
    const STRIDE: u64 = 2 * std::mem::size_of::<f32>() as u64;

    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Self::allocate(device, capacity),
            capacity,
            count: 0,
        }
    }

    fn allocate(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Offsets Buffer"),
            size: capacity as u64 * Self::STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Vertex layout of the offsets: location 0, stepped per instance.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    /// Whole instances held in `bytes`.
    pub fn instances_in(bytes: &[u8]) -> usize {
        bytes.len() / Self::STRIDE as usize
    }

    /// Upload packed positions, as given by [`Particles::position_bytes`](crate::particles::Particles::position_bytes).
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let count = Self::instances_in(bytes);
        if count > self.capacity {
            let capacity = count.next_power_of_two();
            self.buffer.destroy();
            self.buffer = Self::allocate(device, capacity);
            self.capacity = capacity;
            tracing::debug!(target: "gpu", "instance buffer grown to {} particles", capacity);
        }
        if count > 0 {
            queue.write_buffer(&self.buffer, 0, &bytes[..count * Self::STRIDE as usize]);
        }
        self.count = count as u32;
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Instances written by the last [`write`](Self::write).
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// Vertex of a textured quad: position in logical pixels, then uv.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Two triangles covering an axis-aligned rectangle with uv `(0,0)..(1,1)`.
pub fn quad_vertices(min: Vec2, max: Vec2) -> [QuadVertex; 6] {
    let v = |x: f32, y: f32, u: f32, w: f32| QuadVertex { position: [x, y], uv: [u, w] };
    [
        v(min.x, min.y, 0.0, 0.0),
        v(max.x, min.y, 1.0, 0.0),
        v(max.x, max.y, 1.0, 1.0),
        v(min.x, min.y, 0.0, 0.0),
        v(max.x, max.y, 1.0, 1.0),
        v(min.x, max.y, 0.0, 1.0),
    ]
}

/// Six-vertex quad buffer, rewritten when its rectangle changes.
pub struct QuadBuffer {
    buffer: wgpu::Buffer,
    rect: (Vec2, Vec2),
}

impl QuadBuffer {
    pub fn new(device: &wgpu::Device, label: &str, min: Vec2, max: Vec2) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&quad_vertices(min, max)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self { buffer, rect: (min, max) }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }

    /// Move the quad. No upload if the rectangle is unchanged.
    pub fn set_rect(&mut self, queue: &wgpu::Queue, min: Vec2, max: Vec2) {
        if self.rect == (min, max) {
            return;
        }
        self.rect = (min, max);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&quad_vertices(min, max)));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Particles;

    #[test]
    fn test_quad_uv_follows_position() {
        let verts = quad_vertices(Vec2::ZERO, Vec2::new(800.0, 600.0));
        for v in verts {
            assert_eq!(v.uv[0], v.position[0] / 800.0);
            assert_eq!(v.uv[1], v.position[1] / 600.0);
        }
    }

    #[test]
    fn test_instance_layout_stride() {
        let layout = InstanceBuffer::layout();
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn test_instances_match_particle_bytes() {
        let particles = Particles::from_fn(7, |i| (Vec2::splat(i as f32), Vec2::ZERO));
        assert_eq!(InstanceBuffer::instances_in(particles.position_bytes()), 7);
        assert_eq!(InstanceBuffer::instances_in(&[0u8; 12]), 1);
        assert_eq!(InstanceBuffer::instances_in(&[]), 0);
    }

    #[test]
    fn test_quad_vertex_size() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        assert_eq!(QuadBuffer::layout().attributes.len(), 2);
    }
}
