//! Pass 2: viewport quad sampling the offscreen target.
//!
//! Maps the accumulated alpha through the threshold ramp and film grain, or, in
//! debug view, copies the target to the surface unchanged.

use glam::{Vec2, Vec3};

use crate::ramp::RampUniform;
use crate::shaders;
use crate::uniforms::CompositeUniform;
use crate::viewport::Viewport;

use super::resources::{OffscreenTarget, QuadBuffer, UniformBuffer};
use super::try_build_pipeline;

pub struct CompositePass {
    ramp_pipeline: Option<wgpu::RenderPipeline>,
    debug_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    uniform: UniformBuffer<CompositeUniform>,
    ramp: UniformBuffer<RampUniform>,
    quad: QuadBuffer,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        target: &OffscreenTarget,
        viewport: &Viewport,
        uniform: &CompositeUniform,
        ramp: &RampUniform,
    ) -> Self {
        let uniform = UniformBuffer::new(device, "Composite Uniform Buffer", uniform);
        let ramp = UniformBuffer::new(device, "Ramp Uniform Buffer", ramp);
        let quad = QuadBuffer::new(device, "Composite Quad Buffer", Vec2::ZERO, viewport.size());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Field Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
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
                uniform_entry(2),
                uniform_entry(3),
            ],
        });

        let bind_group = create_bind_group(device, &bind_group_layout, target, &sampler, &uniform, &ramp);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let source = shaders::composite_shader();
        let build = |label: &'static str, entry_point: &'static str| {
            try_build_pipeline(device, label, || {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Composite Shader"),
                    source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
                });
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[QuadBuffer::layout()],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some(entry_point),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: surface_format,
                            blend: None,
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
            })
        };

        Self {
            ramp_pipeline: build("Composite Pipeline", "fs_main"),
            debug_pipeline: build("Debug Blit Pipeline", "fs_debug"),
            bind_group_layout,
            bind_group,
            sampler,
            uniform,
            ramp,
            quad,
        }
    }

    /// Point the bind group at a recreated target.
    pub fn bind_target(&mut self, device: &wgpu::Device, target: &OffscreenTarget) {
        self.bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            target,
            &self.sampler,
            &self.uniform,
            &self.ramp,
        );
    }

    /// Stretch the quad over a new viewport.
    pub fn set_viewport(&mut self, queue: &wgpu::Queue, viewport: &Viewport) {
        self.quad.set_rect(queue, Vec2::ZERO, viewport.size());
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: &CompositeUniform) {
        self.uniform.write(queue, uniform);
    }

    pub fn write_ramp(&self, queue: &wgpu::Queue, ramp: &RampUniform) {
        self.ramp.write(queue, ramp);
    }

    /// Draw into `view`, clearing it to `background` first.
    ///
    /// With no usable pipeline for the requested mode the surface is only
    /// cleared.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        background: Vec3,
        debug_view: bool,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: background.x as f64,
                        g: background.y as f64,
                        b: background.z as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = if debug_view { &self.debug_pipeline } else { &self.ramp_pipeline };
        let Some(pipeline) = pipeline else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.buffer().slice(..));
        pass.draw(0..6, 0..1);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    target: &OffscreenTarget,
    sampler: &wgpu::Sampler,
    uniform: &UniformBuffer<CompositeUniform>,
    ramp: &UniformBuffer<RampUniform>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Composite Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(target.view()),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: ramp.binding(),
            },
        ],
    })
}
