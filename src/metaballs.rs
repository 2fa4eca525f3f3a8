//! The simulation plus pipeline context.
//!
//! A [`Metaballs`] owns one simulator and, once a device is available, one
//! [`Compositor`]. Several can coexist; dropping one releases everything it
//! allocated. Without a renderer it runs headless, which is also where it
//! ends up when the device could not be created.

use glam::Vec2;

use crate::config::Settings;
use crate::error::FontError;
use crate::gpu::{Compositor, FrameInput, GpuContext};
use crate::label::{LabelFont, LabelMask};
use crate::pointer::PointerState;
use crate::simulation::Simulator;
use crate::viewport::{TargetPlan, Viewport};

struct Label {
    font: LabelFont,
    text: String,
    mask: Option<LabelMask>,
}

pub struct Metaballs {
    settings: Settings,
    simulator: Simulator,
    viewport: Viewport,
    plan: TargetPlan,
    pointer: PointerState,
    renderer: Option<Compositor>,
    label: Option<Label>,
    debug_view: bool,
}

impl Metaballs {
    /// Headless context; attach a renderer to draw.
    pub fn new(settings: Settings, viewport: Viewport, seed: u64) -> Self {
        let simulator = Simulator::new(settings.sim.clone(), viewport, seed);
        Self {
            settings,
            simulator,
            viewport,
            plan: TargetPlan::new(&viewport),
            pointer: PointerState::at(viewport.center()),
            renderer: None,
            label: None,
            debug_view: false,
        }
    }

    /// Build the compositor on `ctx` and start drawing.
    pub fn attach_renderer(&mut self, ctx: GpuContext) {
        let mut compositor = Compositor::new(
            ctx,
            self.viewport,
            &self.settings.look,
            self.settings.sim.radius,
            self.settings.sim.particle_count,
        );
        compositor.set_label(self.label_mask());
        self.renderer = Some(compositor);
    }

    /// Stop drawing and release every device resource.
    pub fn detach_renderer(&mut self) {
        self.renderer = None;
    }

    pub fn renderer(&self) -> Option<&Compositor> {
        self.renderer.as_ref()
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Shared pointer cell; clone it into the input handler.
    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Physical size of the offscreen target.
    pub fn target_size(&self) -> (u32, u32) {
        self.plan.size()
    }

    pub fn target_plan(&self) -> &TargetPlan {
        &self.plan
    }

    pub fn debug_view(&self) -> bool {
        self.debug_view
    }

    pub fn set_debug_view(&mut self, on: bool) {
        self.debug_view = on;
    }

    pub fn toggle_debug_view(&mut self) -> bool {
        self.debug_view = !self.debug_view;
        tracing::debug!(target: "app", "debug view {}", if self.debug_view { "on" } else { "off" });
        self.debug_view
    }

    /// Step the simulation only.
    pub fn step(&mut self, delta_ms: f32) {
        self.simulator.step(delta_ms, self.pointer.get());
    }

    /// Step, then draw the post-step state.
    pub fn frame(&mut self, delta_ms: f32, elapsed_ms: f32) -> Result<(), wgpu::SurfaceError> {
        self.frame_with(delta_ms, elapsed_ms, |_, _, _, _| {})
    }

    /// [`frame`](Self::frame) with an overlay recorded after the label.
    pub fn frame_with<F>(&mut self, delta_ms: f32, elapsed_ms: f32, overlay: F) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.step(delta_ms);
        let Some(renderer) = &mut self.renderer else {
            return Ok(());
        };
        let input = FrameInput { elapsed_ms, debug_view: self.debug_view };
        renderer.render_with(self.simulator.particles(), input, overlay)
    }

    /// Reconfigure the surface after it was lost or became outdated.
    pub fn recover_surface(&self) {
        if let Some(renderer) = &self.renderer {
            renderer.context().reconfigure();
        }
    }

    /// Track a new surface size. Repeating the same call changes nothing.
    ///
    /// Particles keep their positions.
    pub fn resize(&mut self, width: f32, height: f32, scale_factor: f32) {
        let viewport = Viewport::new(width, height, scale_factor);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.simulator.resize(viewport);
        if self.plan.update(&viewport) {
            let (w, h) = self.plan.size();
            tracing::debug!(target: "app", "offscreen target now {}x{}", w, h);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(viewport);
        }
    }

    /// Apply edited tunables; the next frame reflects them.
    pub fn apply_settings(&mut self, settings: Settings) {
        let diff = self.settings.diff(&settings);
        if diff.is_empty() {
            return;
        }
        tracing::debug!(target: "config", "applying {:?}", diff);

        if diff.particle_count || diff.physics {
            self.simulator.set_config(settings.sim.clone());
            // A rebuilt box starts without a label.
            let label_size = self.label_mask().map(LabelMask::size);
            self.simulator.set_label_size(label_size);
        }
        if let Some(renderer) = &mut self.renderer {
            if diff.radius {
                renderer.set_radius(settings.sim.radius);
            }
            if diff.uniforms || diff.falloff {
                renderer.apply_look(&settings.look);
            }
        }
        self.settings = settings;

        if diff.label_width {
            if let Some(label) = self.label.take() {
                // A failure is logged and leaves the label off.
                let _ = self.set_label(label.font, &label.text);
            }
        }
    }

    /// Rasterize `text` and use it as the label and exclusion box.
    ///
    /// On failure the previous label is dropped, the box is inactive, and the
    /// error is logged once and returned.
    pub fn set_label(&mut self, font: LabelFont, text: &str) -> Result<(), FontError> {
        let (mask, result) = match LabelMask::rasterize(&font, text, self.settings.look.label_width) {
            Ok(mask) => (Some(mask), Ok(())),
            Err(e) => {
                tracing::warn!(target: "label", "label {:?} not shown: {}", text, e);
                (None, Err(e))
            }
        };

        self.simulator.set_label_size(mask.as_ref().map(LabelMask::size));
        if let Some(renderer) = &mut self.renderer {
            renderer.set_label(mask.as_ref());
        }
        self.label = Some(Label { font, text: text.to_string(), mask });
        result
    }

    /// Remove the label and its exclusion box.
    pub fn clear_label(&mut self) {
        self.label = None;
        self.simulator.set_label_size(None);
        if let Some(renderer) = &mut self.renderer {
            renderer.set_label(None);
        }
    }

    pub fn label_mask(&self) -> Option<&LabelMask> {
        self.label.as_ref().and_then(|l| l.mask.as_ref())
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label.as_ref().map(|l| l.text.as_str())
    }

    pub fn label_font(&self) -> Option<&LabelFont> {
        self.label.as_ref().map(|l| &l.font)
    }

    /// Re-rasterize the label with new text in the font it already uses.
    pub fn set_label_text(&mut self, text: &str) -> Result<(), FontError> {
        let Some(font) = self.label_font().cloned() else {
            return Err(FontError::NoFont);
        };
        self.set_label(font, text)
    }

    /// Current pointer position, logical pixels.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleKind;
    use crate::obstacle::Obstacle;

    fn font() -> LabelFont {
        LabelFont::load(
            "DejaVu Sans Mono",
            700,
            concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/DejaVuSansMono-Bold.ttf"),
        )
        .unwrap()
    }

    #[test]
    fn test_headless_frame_steps() {
        let mut m = Metaballs::new(Settings::rain(), Viewport::default(), 1);
        let before = m.simulator().particles().positions().to_vec();
        m.frame(16.0, 16.0).unwrap();
        assert_ne!(before, m.simulator().particles().positions());
        assert!(!m.has_renderer());
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut m = Metaballs::new(Settings::rain(), Viewport::new(800.0, 600.0, 1.0), 1);
        m.resize(400.0, 300.0, 2.0);
        let generation = m.target_plan().generation();
        let size = m.target_size();

        m.resize(400.0, 300.0, 2.0);
        assert_eq!(m.target_plan().generation(), generation);
        assert_eq!(m.target_size(), size);
        assert_eq!(size, (800, 600));
    }

    #[test]
    fn test_toggle_debug_view() {
        let mut m = Metaballs::new(Settings::fountain(), Viewport::default(), 1);
        assert!(!m.debug_view());
        assert!(m.toggle_debug_view());
        assert!(!m.toggle_debug_view());
    }

    #[test]
    fn test_apply_settings_resizes_particles() {
        let mut m = Metaballs::new(Settings::fountain(), Viewport::default(), 1);
        let mut settings = m.settings().clone();
        settings.sim.particle_count = 20;
        settings.look.grain.blend = 0.3;
        m.apply_settings(settings);

        assert_eq!(m.simulator().particles().len(), 20);
        assert_eq!(m.settings().look.grain.blend, 0.3);
    }

    #[test]
    fn test_label_sets_exclusion_box() {
        let mut m = Metaballs::new(Settings::label(), Viewport::default(), 1);
        assert!(matches!(m.settings().sim.obstacle, ObstacleKind::ExclusionBox { .. }));

        m.set_label(font(), "rain").unwrap();
        let size = m.label_mask().unwrap().size();
        match m.simulator().obstacle() {
            Obstacle::ExclusionBox(b) => assert_eq!(b.size, Some(size)),
            other => panic!("unexpected obstacle {:?}", other),
        }

        // Replacing the text replaces the box.
        m.set_label(font(), "a much longer label").unwrap();
        assert_eq!(m.label_text(), Some("a much longer label"));
    }

    #[test]
    fn test_empty_label_disables_box() {
        let mut m = Metaballs::new(Settings::label(), Viewport::default(), 1);
        m.set_label(font(), "rain").unwrap();
        assert!(m.set_label(font(), "   ").is_err());
        assert!(m.label_mask().is_none());
        match m.simulator().obstacle() {
            Obstacle::ExclusionBox(b) => assert!(b.bounds().is_none()),
            other => panic!("unexpected obstacle {:?}", other),
        }
    }

    #[test]
    fn test_obstacle_round_trip_keeps_label_box() {
        let mut m = Metaballs::new(Settings::label(), Viewport::default(), 1);
        m.set_label(font(), "rain").unwrap();
        let size = m.label_mask().unwrap().size();

        let mut settings = m.settings().clone();
        settings.sim.obstacle = ObstacleKind::None;
        m.apply_settings(settings.clone());
        assert!(matches!(m.simulator().obstacle(), Obstacle::None));

        settings.sim.obstacle = ObstacleKind::ExclusionBox { damping: 0.2 };
        m.apply_settings(settings);
        match m.simulator().obstacle() {
            Obstacle::ExclusionBox(b) => assert_eq!(b.size, Some(size)),
            other => panic!("unexpected obstacle {:?}", other),
        }
    }

    #[test]
    fn test_set_label_text_reuses_font() {
        let mut m = Metaballs::new(Settings::label(), Viewport::default(), 1);
        assert!(matches!(m.set_label_text("rain"), Err(FontError::NoFont)));

        m.set_label(font(), "rain").unwrap();
        let before = m.label_mask().unwrap().size();
        m.set_label_text("drizzle").unwrap();
        assert_eq!(m.label_text(), Some("drizzle"));
        assert_eq!(m.label_font().unwrap().family(), "DejaVu Sans Mono");
        assert_ne!(m.label_mask().unwrap().size(), before);
        match m.simulator().obstacle() {
            Obstacle::ExclusionBox(b) => assert_eq!(b.size, Some(m.label_mask().unwrap().size())),
            other => panic!("unexpected obstacle {:?}", other),
        }
    }

    #[test]
    fn test_label_width_change_rerasterizes() {
        let mut m = Metaballs::new(Settings::label(), Viewport::default(), 1);
        m.set_label(font(), "rain").unwrap();
        let before = m.label_mask().unwrap().width();

        let mut settings = m.settings().clone();
        settings.look.label_width = 200.0;
        m.apply_settings(settings);
        assert!(m.label_mask().unwrap().width() < before);
    }
}
