//! Runtime control panel (feature `egui`).
//!
//! Edits a copy of the [`Settings`]. When [`PanelChanges::settings`] is set
//! the host hands the copy to
//! [`Metaballs::apply_settings`](crate::Metaballs::apply_settings), which
//! applies only what changed. An edited label string goes to
//! [`Metaballs::set_label_text`](crate::Metaballs::set_label_text).

use glam::{Vec2, Vec3};

use crate::config::{Falloff, Settings, VelocityRange};
use crate::ramp::{Band, MAX_BANDS};

/// Values shown in the panel that are not settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStats {
    pub fps: f32,
    pub particles: usize,
    pub target_size: (u32, u32),
}

/// What the user edited in one [`ControlPanel::show`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelChanges {
    /// The settings copy differs from what was passed in.
    pub settings: bool,
    pub debug_view: bool,
    /// New label text, if the text field was edited.
    pub label_text: Option<String>,
}

impl PanelChanges {
    pub fn is_empty(&self) -> bool {
        !self.settings && !self.debug_view && self.label_text.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ControlPanel {
    pub open: bool,
    /// Edit buffer for the label field. No field is shown while `None`.
    label_text: Option<String>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self { open: true, label_text: None }
    }
}

impl ControlPanel {
    /// Show a label field starting at `text`, or hide it with `None`.
    pub fn set_label_text(&mut self, text: Option<&str>) {
        self.label_text = text.map(str::to_string);
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label_text.as_deref()
    }

    /// Draw the panel and report what was edited.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        settings: &mut Settings,
        debug_view: &mut bool,
        stats: PanelStats,
    ) -> PanelChanges {
        let mut changes = PanelChanges::default();
        let label_text = &mut self.label_text;
        egui::Window::new("Metaballs")
            .open(&mut self.open)
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{:.0} fps · {} particles · target {}x{}",
                    stats.fps, stats.particles, stats.target_size.0, stats.target_size.1
                ));
                changes.debug_view = ui.checkbox(debug_view, "Debug view").changed();
                ui.separator();

                if let Some(text) = label_text {
                    let edited = ui
                        .horizontal(|ui| {
                            ui.label("label");
                            ui.text_edit_singleline(text).changed()
                        })
                        .inner;
                    if edited {
                        changes.label_text = Some(text.clone());
                    }
                }

                egui::CollapsingHeader::new("Particles")
                    .default_open(true)
                    .show(ui, |ui| changes.settings |= particles_ui(ui, settings));
                egui::CollapsingHeader::new("Colours")
                    .default_open(true)
                    .show(ui, |ui| changes.settings |= look_ui(ui, settings));
            });
        changes
    }
}

fn particles_ui(ui: &mut egui::Ui, settings: &mut Settings) -> bool {
    let sim = &mut settings.sim;
    let mut changed = false;
    changed |= ui
        .add(egui::Slider::new(&mut sim.particle_count, 0..=1000).text("count"))
        .changed();
    changed |= ui.add(egui::Slider::new(&mut sim.radius, 0.0..=400.0).text("radius")).changed();
    changed |= vec2_ui(ui, "gravity", &mut sim.gravity, -0.5..=0.5);
    changed |= range_ui(ui, "start vx", &mut sim.start_velocity_x, -10.0..=10.0);
    changed |= range_ui(ui, "start vy", &mut sim.start_velocity_y, -10.0..=10.0);
    changed |= ui
        .add(egui::Slider::new(&mut sim.edges.restitution, 0.0..=1.0).text("edge bounce"))
        .changed();
    changed
}

fn look_ui(ui: &mut egui::Ui, settings: &mut Settings) -> bool {
    let look = &mut settings.look;
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("falloff");
        changed |= ui.radio_value(&mut look.falloff, Falloff::Clamped, "clamped").changed();
        changed |= ui.radio_value(&mut look.falloff, Falloff::Unclamped, "unclamped").changed();
    });

    let mut base = look.ramp.base();
    if color_ui(ui, "base", &mut base) {
        look.ramp.set_base(base);
        changed = true;
    }

    for i in 0..look.ramp.bands().len() {
        let Band { mut cutoff, .. } = look.ramp.bands()[i];
        ui.horizontal(|ui| {
            if ui
                .add(egui::Slider::new(&mut cutoff, 0.0..=1.0).text(format!("band {}", i + 1)))
                .changed()
            {
                look.ramp.set_cutoff(i, cutoff);
                changed = true;
            }
            if let Some(band) = look.ramp.band_mut(i) {
                changed |= color_ui(ui, "", &mut band.color);
            }
        });
    }
    if look.ramp.bands().len() < MAX_BANDS && ui.button("add band").clicked() {
        look.ramp.insert(Band::step(0.9, Vec3::ONE));
        changed = true;
    }

    changed |= ui
        .add(egui::Slider::new(&mut look.grain.blend, 0.0..=0.5).text("grain"))
        .changed();
    changed |= ui.checkbox(&mut look.grain.animate, "animate grain").changed();
    changed |= color_ui(ui, "background", &mut look.background);
    changed |= color_ui(ui, "label", &mut look.label_tint);
    changed |= ui
        .add(egui::Slider::new(&mut look.label_width, 50.0..=1200.0).text("label width"))
        .changed();
    changed
}

fn color_ui(ui: &mut egui::Ui, label: &str, color: &mut Vec3) -> bool {
    let mut rgb = color.to_array();
    let changed = ui
        .horizontal(|ui| {
            let response = ui.color_edit_button_rgb(&mut rgb);
            if !label.is_empty() {
                ui.label(label);
            }
            response.changed()
        })
        .inner;
    if changed {
        *color = Vec3::from_array(rgb);
    }
    changed
}

fn vec2_ui(ui: &mut egui::Ui, label: &str, value: &mut Vec2, range: std::ops::RangeInclusive<f32>) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let x = ui.add(egui::DragValue::new(&mut value.x).speed(0.005).range(range.clone()));
        let y = ui.add(egui::DragValue::new(&mut value.y).speed(0.005).range(range));
        x.changed() || y.changed()
    })
    .inner
}

fn range_ui(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut VelocityRange,
    range: std::ops::RangeInclusive<f32>,
) -> bool {
    let mut bounds = Vec2::new(value.min, value.max);
    let changed = vec2_ui(ui, label, &mut bounds, range);
    if changed {
        *value = VelocityRange::new(bounds.x.min(bounds.y), bounds.x.max(bounds.y));
    }
    changed
}
