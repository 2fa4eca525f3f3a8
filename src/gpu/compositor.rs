use crate::config::Look;
use crate::label::LabelMask;
use crate::particles::Particles;
use crate::uniforms::{CompositeUniform, LabelUniform, SpriteUniform};
use crate::viewport::{TargetPlan, Viewport};

use super::composite_pass::CompositePass;
use super::label_pass::LabelPass;
use super::resources::OffscreenTarget;
use super::sprite_pass::SpritePass;
use super::GpuContext;

/// Per-frame values that are not part of the persistent state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Milliseconds since start; drives animated grain.
    pub elapsed_ms: f32,
    /// Blit the raw offscreen target instead of the thresholded composite.
    pub debug_view: bool,
}

/// Owns the offscreen target and runs the sprite, composite and label passes.
pub struct Compositor {
    ctx: GpuContext,
    viewport: Viewport,
    plan: TargetPlan,
    target: OffscreenTarget,
    sprite: SpritePass,
    composite: CompositePass,
    label: LabelPass,
    look: Look,
    radius: f32,
}

impl Compositor {
    pub fn new(ctx: GpuContext, viewport: Viewport, look: &Look, radius: f32, capacity: usize) -> Self {
        let device = &ctx.device;
        let plan = TargetPlan::new(&viewport);
        let format = ctx.capabilities.target_format();
        let target = OffscreenTarget::new(device, plan.size(), format);

        let sprite = SpritePass::new(
            device,
            format,
            look.falloff,
            &SpriteUniform::new(&viewport, radius),
            capacity,
        );
        let composite = CompositePass::new(
            device,
            ctx.surface_format(),
            &target,
            &viewport,
            &CompositeUniform::new(&viewport, &look.grain, 0.0),
            &look.ramp.to_uniform(),
        );
        let label = LabelPass::new(
            device,
            ctx.surface_format(),
            &LabelUniform::new(&viewport, look.label_tint),
        );

        Self {
            ctx,
            viewport,
            plan,
            target,
            sprite,
            composite,
            label,
            look: look.clone(),
            radius,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target.size()
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target.format()
    }

    /// Bumped every time the offscreen target is reallocated.
    pub fn target_generation(&self) -> u64 {
        self.plan.generation()
    }

    /// Reallocate size-dependent resources.
    ///
    /// The target is only recreated when the physical size changes, so
    /// repeating a resize is free.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.ctx.resize_surface(viewport.physical_size());

        if self.plan.update(&viewport) {
            // Old target is destroyed when replaced.
            self.target = OffscreenTarget::new(&self.ctx.device, self.plan.size(), self.target.format());
            self.composite.bind_target(&self.ctx.device, &self.target);
        }

        let queue = &self.ctx.queue;
        self.sprite.write_uniform(queue, &SpriteUniform::new(&viewport, self.radius));
        self.label.write_uniform(queue, &LabelUniform::new(&viewport, self.look.label_tint));
        self.composite.set_viewport(queue, &viewport);
        self.label.set_viewport(queue, &viewport);
    }

    /// Sprite edge length changed.
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
        self.sprite.write_uniform(&self.ctx.queue, &SpriteUniform::new(&self.viewport, radius));
    }

    /// Apply render tunables. Only a falloff change rebuilds a pipeline.
    pub fn apply_look(&mut self, look: &Look) {
        if look.falloff != self.sprite.falloff() {
            self.sprite.rebuild(&self.ctx.device, look.falloff);
        }
        let queue = &self.ctx.queue;
        self.composite.write_ramp(queue, &look.ramp.to_uniform());
        self.label.write_uniform(queue, &LabelUniform::new(&self.viewport, look.label_tint));
        self.look = look.clone();
    }

    /// Replace or remove the label texture.
    pub fn set_label(&mut self, mask: Option<&LabelMask>) {
        match mask {
            Some(mask) => self.label.set_mask(&self.ctx.device, &self.ctx.queue, mask, &self.viewport),
            None => self.label.clear_mask(),
        }
    }

    /// Upload positions and draw one frame.
    pub fn render(&mut self, particles: &Particles, frame: FrameInput) -> Result<(), wgpu::SurfaceError> {
        self.render_with(particles, frame, |_, _, _, _| {})
    }

    /// Draw one frame, then let `overlay` record extra work on the surface
    /// view before submission.
    pub fn render_with<F>(
        &mut self,
        particles: &Particles,
        frame: FrameInput,
        overlay: F,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let device = &self.ctx.device;
        let queue = &self.ctx.queue;

        self.sprite.upload(device, queue, particles);
        self.composite.write_uniform(
            queue,
            &CompositeUniform::new(&self.viewport, &self.look.grain, frame.elapsed_ms),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        self.sprite.draw(&mut encoder, &self.target);
        self.composite.draw(&mut encoder, &view, self.look.background, frame.debug_view);
        self.label.draw(&mut encoder, &view);
        overlay(device, queue, &mut encoder, &view);

        queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
