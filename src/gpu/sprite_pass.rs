//! Pass 1: instanced soft sprites into the offscreen target.

use crate::config::Falloff;
use crate::particles::Particles;
use crate::shaders;
use crate::uniforms::SpriteUniform;

use super::resources::{InstanceBuffer, OffscreenTarget, UniformBuffer};
use super::try_build_pipeline;

/// `SrcAlpha, OneMinusSrcAlpha` on both colour and alpha, so overlapping
/// sprites push the stored alpha toward 1.
const FIELD_BLEND_COMPONENT: wgpu::BlendComponent = wgpu::BlendComponent {
    src_factor: wgpu::BlendFactor::SrcAlpha,
    dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
    operation: wgpu::BlendOperation::Add,
};

pub const FIELD_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: FIELD_BLEND_COMPONENT,
    alpha: FIELD_BLEND_COMPONENT,
};

pub struct SpritePass {
    pipeline: Option<wgpu::RenderPipeline>,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group: wgpu::BindGroup,
    uniform: UniformBuffer<SpriteUniform>,
    instances: InstanceBuffer,
    target_format: wgpu::TextureFormat,
    falloff: Falloff,
}

impl SpritePass {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        falloff: Falloff,
        uniform: &SpriteUniform,
        capacity: usize,
    ) -> Self {
        let uniform = UniformBuffer::new(device, "Sprite Uniform Buffer", uniform);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mut pass = Self {
            pipeline: None,
            pipeline_layout,
            bind_group,
            uniform,
            instances: InstanceBuffer::new(device, capacity),
            target_format,
            falloff,
        };
        pass.rebuild(device, falloff);
        pass
    }

    /// Recompile for a new falloff. On failure the pass is skipped.
    pub fn rebuild(&mut self, device: &wgpu::Device, falloff: Falloff) {
        self.falloff = falloff;
        let source = shaders::sprite_shader(falloff);
        let layout = &self.pipeline_layout;
        let format = self.target_format;
        self.pipeline = try_build_pipeline(device, "Sprite Pipeline", || {
            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Sprite Shader"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Sprite Pipeline"),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[InstanceBuffer::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(FIELD_BLEND),
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
    }

    pub fn falloff(&self) -> Falloff {
        self.falloff
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: &SpriteUniform) {
        self.uniform.write(queue, uniform);
    }

    /// Replace the per-instance offsets with this frame's positions.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, particles: &Particles) {
        self.instances.write(device, queue, particles.position_bytes());
    }

    /// Clear the target to transparent and draw every particle.
    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &OffscreenTarget) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sprite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(pipeline) = &self.pipeline else {
            return;
        };
        if self.instances.count() == 0 {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instances.buffer().slice(..));
        pass.draw(0..6, 0..self.instances.count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_blend_accumulates_alpha() {
        // dst alpha after two sprites of alpha a over an empty target
        let a: f32 = 0.4;
        let blend = |src: f32, dst: f32| src * src + dst * (1.0 - src);
        let once = blend(a, 0.0);
        let twice = blend(a, once);
        assert!(twice > once);
        assert_eq!(FIELD_BLEND.alpha.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(FIELD_BLEND.alpha, FIELD_BLEND.color);
    }
}
