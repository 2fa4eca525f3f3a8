//! Tunables for the simulation and the compositing passes.
//!
//! [`Settings`] is a flat, serializable bag of everything a host control panel
//! may change at runtime. [`SimConfig`] drives the [`Simulator`](crate::Simulator),
//! [`Look`] drives the GPU passes. Writes go through
//! [`Metaballs::apply_settings`](crate::Metaballs::apply_settings), which uses
//! [`Settings::diff`] to touch only what changed.
//!
//! The presets reproduce the demo variants:
//!
//! | Preset | Integration | Respawn | Obstacle |
//! |--------|-------------|---------|----------|
//! | [`Settings::rain`] | per frame | top | none |
//! | [`Settings::fountain`] | per frame | pointer | none |
//! | [`Settings::label`] | elapsed time | top | text box |
//! | [`Settings::tilted_line`] | per frame | top | rotating line |

use std::path::Path;

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ramp::{rgb8, Band, ThresholdRamp};

/// Upper bound for the device pixel ratio used to size the offscreen target.
pub const MAX_SCALE_FACTOR: f32 = 2.5;

/// Closed interval a velocity component is sampled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityRange {
    pub min: f32,
    pub max: f32,
}

impl VelocityRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Range symmetric around zero.
    pub const fn symmetric(magnitude: f32) -> Self {
        Self { min: -magnitude, max: magnitude }
    }

    /// Draw a uniform sample. A collapsed or inverted range yields `min`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        self.min + rng.gen::<f32>() * (self.max - self.min)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a step's elapsed time scales velocity integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Integration {
    /// One fixed increment per frame; elapsed time is ignored.
    PerFrame,
    /// `position += velocity * delta_ms * scale`, per axis.
    Elapsed { scale_x: f32, scale_y: f32 },
}

impl Integration {
    /// Per-axis multiplier applied to velocity for a step of `delta_ms`.
    pub fn time_scale(&self, delta_ms: f32) -> Vec2 {
        match *self {
            Integration::PerFrame => Vec2::ONE,
            Integration::Elapsed { scale_x, scale_y } => {
                Vec2::new(delta_ms * scale_x, delta_ms * scale_y)
            }
        }
    }
}

/// Left/right viewport edge response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeBounce {
    /// Distance of the bounce plane from each edge.
    pub inset: f32,
    /// Fraction of horizontal speed kept after a bounce.
    pub restitution: f32,
}

impl Default for EdgeBounce {
    fn default() -> Self {
        Self { inset: 0.0, restitution: 1.0 }
    }
}

/// Where particles go once they fall below the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum Respawn {
    /// Back above the top edge with a fresh downward speed; `vx` is kept.
    Top { velocity_y: VelocityRange },
    /// To the pointer with both velocity components resampled.
    Pointer {
        velocity_x: VelocityRange,
        velocity_y: VelocityRange,
    },
}

/// Obstacle variant the particles collide with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObstacleKind {
    #[default]
    None,
    /// Line segment through the viewport centre, spinning at `angular_speed`.
    RotatingLine {
        half_length: f32,
        /// Radians per second.
        angular_speed: f32,
        initial_angle: f32,
        /// Fraction of normal speed kept after hitting the line.
        restitution: f32,
    },
    /// Box around the text label, centred in the viewport.
    ExclusionBox {
        /// Fraction of vertical speed kept (and reversed) on landing.
        damping: f32,
    },
}

/// Physics tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub particle_count: usize,
    /// Sprite size in logical pixels; also the despawn margin below the viewport.
    pub radius: f32,
    /// Obstacle collision radius as a fraction of `radius`.
    pub collision_scale: f32,
    /// Added to every particle's velocity once per step.
    pub gravity: Vec2,
    /// Period after which the horizontal gravity component flips sign.
    pub gravity_flip_interval_ms: Option<f32>,
    pub start_velocity_x: VelocityRange,
    pub start_velocity_y: VelocityRange,
    /// Initial particles spawn in `[0, spawn_height]`; full viewport height if unset.
    pub spawn_height: Option<f32>,
    pub integration: Integration,
    pub edges: EdgeBounce,
    pub respawn: Respawn,
    pub obstacle: ObstacleKind,
}

impl SimConfig {
    /// Radius used against obstacles.
    pub fn collision_radius(&self) -> f32 {
        self.radius * self.collision_scale
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Settings::rain().sim
    }
}

/// Radial falloff written by the sprite fragment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    /// `clamp(0.5 - d, 0, 1)`.
    #[default]
    Clamped,
    /// `0.5 - d`; corners of the quad write negative alpha.
    Unclamped,
}

/// Film grain mixed over the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grain {
    /// Mix factor of the noise, `0` disables grain.
    pub blend: f32,
    /// Re-seed the noise every frame.
    pub animate: bool,
}

impl Default for Grain {
    fn default() -> Self {
        Self { blend: 0.0, animate: false }
    }
}

/// Render tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Look {
    pub ramp: ThresholdRamp,
    pub falloff: Falloff,
    pub grain: Grain,
    /// Clear colour of the visible framebuffer.
    pub background: Vec3,
    pub label_tint: Vec3,
    /// Pixel width label text is fitted to.
    pub label_width: f32,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            ramp: ThresholdRamp::default(),
            falloff: Falloff::Clamped,
            grain: Grain::default(),
            background: Vec3::splat(0.1),
            label_tint: Vec3::ONE,
            label_width: 400.0,
        }
    }
}

/// All runtime tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub sim: SimConfig,
    pub look: Look,
}

impl Settings {
    /// Large soft balls raining from the top; single red-on-green cutoff.
    pub fn rain() -> Self {
        Self {
            sim: SimConfig {
                particle_count: 100,
                radius: 250.0,
                collision_scale: 0.2,
                gravity: Vec2::new(0.0, 0.05),
                gravity_flip_interval_ms: None,
                start_velocity_x: VelocityRange::symmetric(0.1),
                start_velocity_y: VelocityRange::new(0.0, 0.1),
                spawn_height: None,
                integration: Integration::PerFrame,
                edges: EdgeBounce { inset: 125.0, restitution: 1.0 },
                respawn: Respawn::Top { velocity_y: VelocityRange::new(5.0, 8.0) },
                obstacle: ObstacleKind::None,
            },
            look: Look {
                falloff: Falloff::Unclamped,
                ..Look::default()
            },
        }
    }

    /// Many small balls re-emitted at the pointer; two stacked cutoffs.
    pub fn fountain() -> Self {
        Self {
            sim: SimConfig {
                particle_count: 500,
                radius: 100.0,
                collision_scale: 0.2,
                gravity: Vec2::new(0.0, 0.1),
                gravity_flip_interval_ms: None,
                start_velocity_x: VelocityRange::symmetric(0.1),
                start_velocity_y: VelocityRange::new(1.0, 3.0),
                spawn_height: None,
                integration: Integration::PerFrame,
                edges: EdgeBounce::default(),
                respawn: Respawn::Pointer {
                    velocity_x: VelocityRange::symmetric(5.0),
                    velocity_y: VelocityRange::symmetric(6.0),
                },
                obstacle: ObstacleKind::None,
            },
            look: Look {
                ramp: ThresholdRamp::new(Vec3::splat(0.78))
                    .with_band(Band::step(0.14, Vec3::new(0.0, 0.0, 1.0)))
                    .with_band(Band::step(0.19, Vec3::new(0.94, 0.29, 0.235))),
                falloff: Falloff::Clamped,
                ..Look::default()
            },
        }
    }

    /// Balls piling onto a centred text label, drifting sideways with flipping
    /// horizontal gravity. Thin border, fat border and fill bands over grain.
    pub fn label() -> Self {
        let background = rgb8(36, 31, 31);
        Self {
            sim: SimConfig {
                particle_count: 100,
                radius: 250.0,
                collision_scale: 0.2,
                gravity: Vec2::new(0.015, 0.1),
                gravity_flip_interval_ms: Some(3000.0),
                start_velocity_x: VelocityRange::symmetric(5.0),
                start_velocity_y: VelocityRange::new(1.0, 4.0),
                spawn_height: Some(100.0),
                integration: Integration::Elapsed { scale_x: 0.075, scale_y: 0.06 },
                edges: EdgeBounce { inset: 0.0, restitution: 0.75 },
                respawn: Respawn::Top { velocity_y: VelocityRange::new(5.0, 8.0) },
                obstacle: ObstacleKind::ExclusionBox { damping: 0.2 },
            },
            look: Look {
                ramp: ThresholdRamp::new(background)
                    .with_band(Band::smooth(0.46, 0.01, Vec3::ZERO))
                    .with_band(Band::smooth(0.49, 0.01, rgb8(41, 36, 36)))
                    .with_band(Band::smooth(0.53, 0.01, Vec3::ZERO)),
                falloff: Falloff::Unclamped,
                grain: Grain { blend: 0.04, animate: true },
                background,
                label_tint: Vec3::ONE,
                label_width: 400.0,
            },
        }
    }

    /// Balls bouncing off a slowly spinning line through the centre.
    pub fn tilted_line() -> Self {
        let fountain = Self::fountain();
        Self {
            sim: SimConfig {
                particle_count: 200,
                radius: 120.0,
                collision_scale: 0.2,
                gravity: Vec2::new(0.0, 0.1),
                gravity_flip_interval_ms: None,
                start_velocity_x: VelocityRange::symmetric(0.5),
                start_velocity_y: VelocityRange::new(1.0, 3.0),
                spawn_height: Some(200.0),
                integration: Integration::PerFrame,
                edges: EdgeBounce::default(),
                respawn: Respawn::Top { velocity_y: VelocityRange::new(1.0, 3.0) },
                obstacle: ObstacleKind::RotatingLine {
                    half_length: 300.0,
                    angular_speed: 0.4,
                    initial_angle: 0.2,
                    restitution: 0.45,
                },
            },
            look: fountain.look,
        }
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        tracing::info!(target: "config", "loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compare against another set of settings.
    pub fn diff(&self, other: &Settings) -> SettingsDiff {
        let mut physics_a = self.sim.clone();
        let mut physics_b = other.sim.clone();
        physics_a.particle_count = 0;
        physics_b.particle_count = 0;

        SettingsDiff {
            particle_count: self.sim.particle_count != other.sim.particle_count,
            physics: physics_a != physics_b,
            radius: self.sim.radius != other.sim.radius,
            uniforms: self.look.ramp != other.look.ramp
                || self.look.grain != other.look.grain
                || self.look.background != other.look.background
                || self.look.label_tint != other.look.label_tint,
            falloff: self.look.falloff != other.look.falloff,
            label_width: self.look.label_width != other.look.label_width,
        }
    }
}

/// Which parts of [`Settings`] differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsDiff {
    pub particle_count: bool,
    /// Anything in [`SimConfig`] other than the particle count.
    pub physics: bool,
    /// Sprite size changed; the sprite uniform needs a rewrite.
    pub radius: bool,
    /// Ramp, grain, background or label tint changed.
    pub uniforms: bool,
    /// Sprite falloff changed; the sprite pipeline must be rebuilt.
    pub falloff: bool,
    /// The label must be rasterized again.
    pub label_width: bool,
}

impl SettingsDiff {
    pub fn is_empty(&self) -> bool {
        *self == SettingsDiff::default()
    }

    pub fn needs_rebuild(&self) -> bool {
        self.falloff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_velocity_range_sample_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = VelocityRange::new(1.0, 3.0);
        for _ in 0..1000 {
            assert!(range.contains(range.sample(&mut rng)));
        }
    }

    #[test]
    fn test_degenerate_range_yields_min() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(VelocityRange::new(2.0, 2.0).sample(&mut rng), 2.0);
        assert_eq!(VelocityRange::new(5.0, 1.0).sample(&mut rng), 5.0);
    }

    #[test]
    fn test_time_scale() {
        assert_eq!(Integration::PerFrame.time_scale(16.0), Vec2::ONE);
        let elapsed = Integration::Elapsed { scale_x: 0.075, scale_y: 0.06 };
        let scale = elapsed.time_scale(20.0);
        assert!((scale.x - 1.5).abs() < 1e-6);
        assert!((scale.y - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_presets_json_roundtrip() {
        for settings in [Settings::rain(), Settings::fountain(), Settings::label(), Settings::tilted_line()] {
            let json = settings.to_json_string().unwrap();
            let parsed = Settings::from_json_str(&json).unwrap();
            assert_eq!(parsed, settings);
        }
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let settings = Settings::from_json_str(r#"{"sim":{"particle_count":3}}"#).unwrap();
        assert_eq!(settings.sim.particle_count, 3);
        assert_eq!(settings.sim.radius, SimConfig::default().radius);
        assert_eq!(settings.look, Look::default());
    }

    #[test]
    fn test_tagged_enums_in_json() {
        let json = r#"{"sim":{
            "integration":{"mode":"elapsed","scale_x":0.1,"scale_y":0.2},
            "respawn":{"target":"pointer","velocity_x":{"min":-1,"max":1},"velocity_y":{"min":0,"max":2}},
            "obstacle":{"kind":"exclusion_box","damping":0.2}}}"#;
        let settings = Settings::from_json_str(json).unwrap();
        assert_eq!(settings.sim.integration, Integration::Elapsed { scale_x: 0.1, scale_y: 0.2 });
        assert!(matches!(settings.sim.respawn, Respawn::Pointer { .. }));
        assert_eq!(settings.sim.obstacle, ObstacleKind::ExclusionBox { damping: 0.2 });
    }

    #[test]
    fn test_diff_separates_count_from_physics() {
        let a = Settings::fountain();
        let mut b = a.clone();
        assert!(a.diff(&b).is_empty());

        b.sim.particle_count = 10;
        let diff = a.diff(&b);
        assert!(diff.particle_count);
        assert!(!diff.physics);

        b.sim.gravity.y = 0.3;
        assert!(a.diff(&b).physics);
    }

    #[test]
    fn test_diff_look() {
        let a = Settings::label();
        let mut b = a.clone();
        b.look.grain.blend = 0.2;
        let diff = a.diff(&b);
        assert!(diff.uniforms);
        assert!(!diff.needs_rebuild());

        b.look.falloff = Falloff::Clamped;
        assert!(a.diff(&b).needs_rebuild());
    }
}
