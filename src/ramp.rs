//! Threshold ramp for the composite pass.
//!
//! The sprite pass leaves an accumulated field intensity in the alpha channel
//! of the offscreen target. The composite pass maps that intensity to flat
//! colours: starting from a base colour, every band mixes its own colour in
//! once the intensity reaches the band's cutoff. Bands are applied in ascending
//! cutoff order, so higher bands override lower ones where the field is denser.
//!
//! [`ThresholdRamp::shade`] is the CPU reference of the WGSL in
//! [`shaders::composite_shader`](crate::shaders::composite_shader); both read the
//! same packed [`RampUniform`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maximum number of bands the composite shader evaluates.
pub const MAX_BANDS: usize = 4;

/// Convert an 8-bit RGB triple to a linear `0..1` colour.
pub fn rgb8(r: u8, g: u8, b: u8) -> Vec3 {
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}

/// One colour band of the ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Intensity at which the band starts to show.
    pub cutoff: f32,
    /// Width of the smooth transition above `cutoff`. Zero gives a hard step.
    pub feather: f32,
    /// Flat colour of the band.
    pub color: Vec3,
}

impl Band {
    /// Hard-edged band.
    pub fn step(cutoff: f32, color: Vec3) -> Self {
        Self { cutoff, feather: 0.0, color }
    }

    /// Band that fades in over `[cutoff, cutoff + feather]`.
    pub fn smooth(cutoff: f32, feather: f32, color: Vec3) -> Self {
        Self { cutoff, feather: feather.max(0.0), color }
    }

    /// Intensity from which the band is fully opaque.
    pub fn full_at(&self) -> f32 {
        self.cutoff + self.feather
    }

    /// Mix weight of this band for a given intensity.
    pub fn weight(&self, intensity: f32) -> f32 {
        if self.feather <= 0.0 {
            if intensity >= self.cutoff { 1.0 } else { 0.0 }
        } else {
            smoothstep(self.cutoff, self.full_at(), intensity)
        }
    }
}

/// Piecewise colour function over field intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRamp")]
pub struct ThresholdRamp {
    base: Vec3,
    bands: Vec<Band>,
}

impl ThresholdRamp {
    /// A ramp that maps every intensity to `base`.
    pub fn new(base: Vec3) -> Self {
        Self { base, bands: Vec::new() }
    }

    /// Add a band, keeping bands sorted by cutoff.
    ///
    /// Bands beyond [`MAX_BANDS`] are dropped with a warning.
    pub fn with_band(mut self, band: Band) -> Self {
        self.insert(band);
        self
    }

    /// Add a band in place. Returns `false` if the ramp is full.
    pub fn insert(&mut self, band: Band) -> bool {
        if self.bands.len() >= MAX_BANDS {
            tracing::warn!(target: "config", "threshold ramp holds at most {} bands, ignoring cutoff {}", MAX_BANDS, band.cutoff);
            return false;
        }
        let index = self.bands.partition_point(|b| b.cutoff <= band.cutoff);
        self.bands.insert(index, band);
        true
    }

    /// Base colour shown below the lowest cutoff.
    pub fn base(&self) -> Vec3 {
        self.base
    }

    pub fn set_base(&mut self, base: Vec3) {
        self.base = base;
    }

    /// Bands in ascending cutoff order.
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Mutable access to a band's colour and feather.
    ///
    /// Cutoffs are edited through [`set_cutoff`](Self::set_cutoff) so the
    /// ordering invariant holds.
    pub fn band_mut(&mut self, index: usize) -> Option<&mut Band> {
        self.bands.get_mut(index)
    }

    /// Move a band's cutoff and restore ascending order.
    pub fn set_cutoff(&mut self, index: usize, cutoff: f32) {
        if let Some(band) = self.bands.get_mut(index) {
            band.cutoff = cutoff;
            self.bands.sort_by(|a, b| a.cutoff.total_cmp(&b.cutoff));
        }
    }

    /// Colour of the topmost band, or the base colour when there is none.
    pub fn top(&self) -> Vec3 {
        self.bands.last().map_or(self.base, |b| b.color)
    }

    /// Evaluate the ramp for one intensity value.
    pub fn shade(&self, intensity: f32) -> Vec3 {
        self.bands
            .iter()
            .fold(self.base, |color, band| color.lerp(band.color, band.weight(intensity)))
    }

    /// Pack the ramp for the composite uniform buffer.
    pub fn to_uniform(&self) -> RampUniform {
        let mut uniform = RampUniform {
            base: self.base.extend(1.0).to_array(),
            colors: [[0.0; 4]; MAX_BANDS],
            edges: [[0.0; 4]; MAX_BANDS],
            count: [self.bands.len() as u32, 0, 0, 0],
        };
        for (i, band) in self.bands.iter().enumerate() {
            uniform.colors[i] = band.color.extend(1.0).to_array();
            uniform.edges[i] = [band.cutoff, band.feather, 0.0, 0.0];
        }
        uniform
    }
}

impl Default for ThresholdRamp {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 0.0)).with_band(Band::step(0.52, Vec3::new(1.0, 0.0, 0.0)))
    }
}

#[derive(Deserialize)]
struct RawRamp {
    base: Vec3,
    #[serde(default)]
    bands: Vec<Band>,
}

impl From<RawRamp> for ThresholdRamp {
    fn from(raw: RawRamp) -> Self {
        raw.bands
            .into_iter()
            .fold(ThresholdRamp::new(raw.base), ThresholdRamp::with_band)
    }
}

/// GPU layout of a [`ThresholdRamp`]; matches `struct Ramp` in the composite shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RampUniform {
    pub base: [f32; 4],
    pub colors: [[f32; 4]; MAX_BANDS],
    /// `x` = cutoff, `y` = feather.
    pub edges: [[f32; 4]; MAX_BANDS],
    /// `x` = band count.
    pub count: [u32; 4],
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
