//! Text label drawn over the composite.

use glam::Vec2;

use crate::label::LabelMask;
use crate::shaders;
use crate::uniforms::LabelUniform;
use crate::viewport::Viewport;

use super::resources::{MaskTexture, QuadBuffer, UniformBuffer};
use super::try_build_pipeline;

struct BoundMask {
    texture: MaskTexture,
    bind_group: wgpu::BindGroup,
}

pub struct LabelPass {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform: UniformBuffer<LabelUniform>,
    quad: QuadBuffer,
    mask: Option<BoundMask>,
}

impl LabelPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, uniform: &LabelUniform) -> Self {
        let uniform = UniformBuffer::new(device, "Label Uniform Buffer", uniform);
        let quad = QuadBuffer::new(device, "Label Quad Buffer", Vec2::ZERO, Vec2::ZERO);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Label Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Label Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Label Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = try_build_pipeline(device, "Label Pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Label Shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::label_shader().into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Label Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[QuadBuffer::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            uniform,
            quad,
            mask: None,
        }
    }

    /// Upload a new mask, releasing the previous one.
    pub fn set_mask(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mask: &LabelMask, viewport: &Viewport) {
        let texture = MaskTexture::new(device, queue, (mask.width(), mask.height()), mask.pixels());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Label Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform.binding(),
                },
            ],
        });
        self.mask = Some(BoundMask { texture, bind_group });
        self.set_viewport(queue, viewport);
    }

    /// Drop the current mask; nothing is drawn until a new one is set.
    pub fn clear_mask(&mut self) {
        self.mask = None;
    }

    /// Re-centre the quad.
    pub fn set_viewport(&mut self, queue: &wgpu::Queue, viewport: &Viewport) {
        let Some(mask) = &self.mask else {
            return;
        };
        let (w, h) = mask.texture.size();
        let half = Vec2::new(w as f32, h as f32) * 0.5;
        let center = viewport.center();
        self.quad.set_rect(queue, center - half, center + half);
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: &LabelUniform) {
        self.uniform.write(queue, uniform);
    }

    /// Blend the label over whatever `view` holds.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let (Some(pipeline), Some(mask)) = (&self.pipeline, &self.mask) else {
            return;
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Label Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &mask.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.buffer().slice(..));
        pass.draw(0..6, 0..1);
    }
}
