//! Uniform buffer layouts shared with the WGSL in [`crate::shaders`].
//!
//! Every struct is `#[repr(C)]` and a multiple of 16 bytes so it can be written
//! with `Queue::write_buffer` as-is.

use glam::Vec3;

use crate::config::Grain;
use crate::viewport::Viewport;

/// Grain time advances at this many units per elapsed millisecond.
pub const GRAIN_TIME_SCALE: f32 = 0.1;

/// `struct Sprite` in the sprite shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteUniform {
    pub projection: [[f32; 4]; 4],
    /// `x` = sprite edge length in logical pixels.
    pub extent: [f32; 4],
}

impl SpriteUniform {
    pub fn new(viewport: &Viewport, radius: f32) -> Self {
        Self {
            projection: viewport.projection().to_cols_array_2d(),
            extent: [radius, radius, 0.0, 0.0],
        }
    }
}

/// `struct Uniforms` in the composite shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniform {
    pub projection: [[f32; 4]; 4],
    /// `xy` = padding (zero), `z` = grain time, `w` = grain blend.
    pub params: [f32; 4],
}

impl CompositeUniform {
    pub fn new(viewport: &Viewport, grain: &Grain, elapsed_ms: f32) -> Self {
        let time = if grain.animate { elapsed_ms * GRAIN_TIME_SCALE } else { 0.0 };
        Self {
            projection: viewport.projection().to_cols_array_2d(),
            params: [0.0, 0.0, time, grain.blend],
        }
    }
}

/// `struct Uniforms` in the label shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LabelUniform {
    pub projection: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

impl LabelUniform {
    pub fn new(viewport: &Viewport, tint: Vec3) -> Self {
        Self {
            projection: viewport.projection().to_cols_array_2d(),
            tint: tint.extend(1.0).to_array(),
        }
    }
}
