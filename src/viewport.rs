//! Viewport geometry shared by the simulator and the passes.

use glam::{Mat4, Vec2, Vec4};

use crate::config::MAX_SCALE_FACTOR;

/// Logical drawable size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixel ratio, capped at [`MAX_SCALE_FACTOR`].
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f32) -> Self {
        let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor.min(MAX_SCALE_FACTOR)
        } else {
            1.0
        };
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            scale_factor,
        }
    }

    /// Logical size in pixels.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Backing size in physical pixels, at least 1x1.
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.width * self.scale_factor).round().max(1.0) as u32;
        let h = (self.height * self.scale_factor).round().max(1.0) as u32;
        (w, h)
    }

    /// Orthographic transform from logical pixels to clip space.
    ///
    /// Pixel `(0, 0)` maps to the top-left corner `(-1, 1)` and `(width, height)`
    /// to `(1, -1)`. The z column is zero.
    pub fn projection(&self) -> Mat4 {
        let half_w = (self.width * 0.5).max(f32::EPSILON);
        let half_h = (self.height * 0.5).max(f32::EPSILON);
        Mat4::from_cols(
            Vec4::new(1.0 / half_w, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -1.0 / half_h, 0.0, 0.0),
            Vec4::ZERO,
            Vec4::new(-1.0, 1.0, 0.0, 1.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0, 1.0)
    }
}

/// Size bookkeeping for the offscreen target.
///
/// The generation only advances when the physical size actually changes; a
/// renderer recreates its target when it sees a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPlan {
    size: (u32, u32),
    generation: u64,
}

impl TargetPlan {
    pub fn new(viewport: &Viewport) -> Self {
        Self { size: viewport.physical_size(), generation: 0 }
    }

    /// Track a new viewport. Returns `true` if the target must be recreated.
    pub fn update(&mut self, viewport: &Viewport) -> bool {
        let size = viewport.physical_size();
        if size == self.size {
            return false;
        }
        self.size = size;
        self.generation += 1;
        true
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_projection_flips_y() {
        let viewport = Viewport::new(800.0, 600.0, 2.0);
        let m = viewport.projection();
        let top_left = m.project_point3(Vec3::ZERO);
        let bottom_right = m.project_point3(Vec3::new(800.0, 600.0, 5.0));
        assert!((top_left - Vec3::new(-1.0, 1.0, 0.0)).length() < 1e-6);
        assert!((bottom_right - Vec3::new(1.0, -1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_physical_size_rounds() {
        assert_eq!(Viewport::new(401.0, 300.0, 1.5).physical_size(), (602, 450));
        assert_eq!(Viewport::new(0.0, 0.0, 1.0).physical_size(), (1, 1));
    }

    #[test]
    fn test_scale_factor_capped() {
        assert_eq!(Viewport::new(10.0, 10.0, 3.0).scale_factor, MAX_SCALE_FACTOR);
        assert_eq!(Viewport::new(10.0, 10.0, f32::NAN).scale_factor, 1.0);
    }

    #[test]
    fn test_target_plan_generation() {
        let a = Viewport::new(800.0, 600.0, 1.0);
        let mut plan = TargetPlan::new(&a);
        assert!(!plan.update(&a));
        assert_eq!(plan.generation(), 0);

        let b = Viewport::new(400.0, 300.0, 1.0);
        assert!(plan.update(&b));
        assert!(!plan.update(&b));
        assert_eq!(plan.generation(), 1);
        assert_eq!(plan.size(), (400, 300));
    }
}
