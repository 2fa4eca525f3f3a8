//! # Metaballs
//!
//! Particle rain drawn as merged soft blobs.
//!
//! Every particle is a soft radial sprite. The sprites are blended into an
//! offscreen float target so overlapping sprites build up field intensity;
//! a second pass maps that intensity through a few hard or feathered
//! thresholds into flat colour bands, which is what makes neighbouring
//! blobs melt into one silhouette.
//!
//! ## Quick Start
//!
//! ```ignore
//! use metaballs::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     MetaballsApp::new(Settings::rain())
//!         .with_title("Rain")
//!         .run()
//! }
//! ```
//!
//! ## Variants
//!
//! One simulator covers all the demos. They differ only in [`Settings`]:
//!
//! | Preset | Respawn | Obstacle |
//! |--------|---------|----------|
//! | [`Settings::rain`] | top edge | none |
//! | [`Settings::fountain`] | pointer | none |
//! | [`Settings::label`] | top edge | box around a text label |
//! | [`Settings::tilted_line`] | top edge | rotating line |
//!
//! Settings load from JSON ([`Settings::from_json_file`]); missing fields fall
//! back to the rain preset.
//!
//! ## Headless use
//!
//! [`Metaballs`] runs without a renderer. This is how the tests drive it, and
//! where a host ends up when no GPU adapter is available.
//!
//! ```ignore
//! let mut m = Metaballs::new(Settings::fountain(), Viewport::new(800.0, 600.0, 1.0), 7);
//! m.pointer().set(Vec2::new(400.0, 300.0));
//! m.frame(16.0, 16.0)?;
//! ```
//!
//! ## Logging
//!
//! The crate logs through `tracing` with the targets `gpu`, `label`,
//! `config` and `app`. It never installs a subscriber.

pub mod app;
pub mod config;
pub mod error;
pub mod gpu;
pub mod label;
pub mod metaballs;
pub mod obstacle;
#[cfg(feature = "egui")]
pub mod panel;
pub mod particles;
pub mod pointer;
pub mod ramp;
pub mod shaders;
pub mod simulation;
pub mod time;
pub mod uniforms;
pub mod viewport;

pub use app::MetaballsApp;
pub use config::{
    EdgeBounce, Falloff, Grain, Integration, Look, ObstacleKind, Respawn, Settings, SettingsDiff, SimConfig,
    VelocityRange, MAX_SCALE_FACTOR,
};
pub use error::{ConfigError, FontError, GpuError, RunError, ShaderError};
pub use glam::{Vec2, Vec3};
pub use label::{LabelFont, LabelMask};
pub use metaballs::Metaballs;
pub use obstacle::{ExclusionBox, Obstacle, RotatingLine};
pub use particles::Particles;
pub use pointer::PointerState;
pub use ramp::{Band, ThresholdRamp};
pub use simulation::Simulator;
pub use time::FrameClock;
pub use viewport::{TargetPlan, Viewport};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use metaballs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::MetaballsApp;
    pub use crate::config::{Falloff, Grain, Look, ObstacleKind, Respawn, Settings, SimConfig, VelocityRange};
    pub use crate::error::RunError;
    pub use crate::label::LabelFont;
    pub use crate::metaballs::Metaballs;
    pub use crate::ramp::{rgb8, Band, ThresholdRamp};
    pub use crate::viewport::Viewport;
    pub use crate::{Vec2, Vec3};
    #[cfg(feature = "egui")]
    pub use egui;
}
