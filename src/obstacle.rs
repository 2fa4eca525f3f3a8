//! Obstacles particles collide with.
//!
//! An [`Obstacle`] is built from an [`ObstacleKind`] and the viewport, and is
//! re-centred whenever the viewport resizes. Geometry is in logical pixels with
//! the origin at the top-left corner and y pointing down.

use glam::{Mat2, Vec2};

use crate::config::ObstacleKind;

/// Line segment spinning about a fixed centre.
///
/// In the line's local frame the segment lies on the x axis between
/// `-half_length` and `half_length`. Particles rest on its upper side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatingLine {
    pub center: Vec2,
    pub half_length: f32,
    /// Current rotation in radians.
    pub angle: f32,
    /// Radians per second.
    pub angular_speed: f32,
    pub restitution: f32,
}

impl RotatingLine {
    /// Rotate the line by `delta_ms` worth of angular speed.
    pub fn advance(&mut self, delta_ms: f32) {
        self.angle = (self.angle + self.angular_speed * delta_ms / 1000.0) % std::f32::consts::TAU;
    }

    fn rotation(&self) -> Mat2 {
        Mat2::from_angle(self.angle)
    }

    /// World point to the line's local frame.
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        self.rotation().transpose() * (point - self.center)
    }

    /// Local point back to world space.
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.rotation() * local + self.center
    }

    /// World direction to the line's local frame.
    pub fn dir_to_local(&self, dir: Vec2) -> Vec2 {
        self.rotation().transpose() * dir
    }

    pub fn dir_to_world(&self, local: Vec2) -> Vec2 {
        self.rotation() * local
    }

    /// World-space end points of the segment.
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (
            self.to_world(Vec2::new(-self.half_length, 0.0)),
            self.to_world(Vec2::new(self.half_length, 0.0)),
        )
    }

    /// Resolve a particle that moved from `previous` to `position` this step.
    ///
    /// The contact surface sits `collision_radius` above the line. A particle
    /// that crosses it downwards gets its local normal velocity reflected and
    /// scaled by `restitution` and is placed on the surface. Returns `true` on
    /// contact.
    pub fn collide(
        &self,
        previous: Vec2,
        position: &mut Vec2,
        velocity: &mut Vec2,
        collision_radius: f32,
    ) -> bool {
        let mut local = self.to_local(*position);
        if local.x.abs() > self.half_length {
            return false;
        }

        let mut local_velocity = self.dir_to_local(*velocity);
        let surface = -collision_radius;
        let local_previous = self.to_local(previous);
        if local_velocity.y <= 0.0 || local_previous.y > surface || local.y <= surface {
            return false;
        }

        local_velocity.y *= -self.restitution;
        local.y = surface;
        *position = self.to_world(local);
        *velocity = self.dir_to_world(local_velocity);
        true
    }
}

/// Axis-aligned box centred in the viewport, sized to the text label.
///
/// Inactive until a label size is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionBox {
    pub center: Vec2,
    pub size: Option<Vec2>,
    /// Fraction of vertical speed kept (and reversed) on landing.
    pub damping: f32,
}

impl ExclusionBox {
    /// `(min, max)` corners, if the box is active.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        self.size.map(|size| {
            let half = size * 0.5;
            (self.center - half, self.center + half)
        })
    }

    /// Sweep the particle's next move against the box.
    ///
    /// Predicts with the raw velocity. A hit on the x sweep reverses `vx`. A hit
    /// on the y sweep parks the particle on the top edge and damps `vy`; the
    /// return value is then `true` and the caller must skip its own vertical
    /// integration for this step.
    pub fn sweep(&self, position: &mut Vec2, velocity: &mut Vec2, radius: f32) -> bool {
        let Some((min, max)) = self.bounds() else {
            return false;
        };
        let p = *position;
        let v = *velocity;

        let overlaps_y = p.y + radius > min.y && p.y - radius < max.y;
        if p.x + radius + v.x > min.x && p.x - radius + v.x < max.x && overlaps_y {
            velocity.x = -velocity.x;
        }

        let overlaps_x = p.x + radius > min.x && p.x - radius < max.x;
        if overlaps_x && p.y + radius + v.y > min.y && p.y - radius + v.y < max.y {
            position.y = min.y - radius - v.y;
            velocity.y *= -self.damping;
            return true;
        }
        false
    }
}

/// Obstacle in the particle field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Obstacle {
    #[default]
    None,
    RotatingLine(RotatingLine),
    ExclusionBox(ExclusionBox),
}

impl Obstacle {
    /// Build the obstacle for a viewport of `size` logical pixels.
    pub fn new(kind: &ObstacleKind, size: Vec2) -> Self {
        let center = size * 0.5;
        match *kind {
            ObstacleKind::None => Obstacle::None,
            ObstacleKind::RotatingLine {
                half_length,
                angular_speed,
                initial_angle,
                restitution,
            } => Obstacle::RotatingLine(RotatingLine {
                center,
                half_length,
                angle: initial_angle,
                angular_speed,
                restitution,
            }),
            ObstacleKind::ExclusionBox { damping } => Obstacle::ExclusionBox(ExclusionBox {
                center,
                size: None,
                damping,
            }),
        }
    }

    /// Re-derive size-dependent geometry for a new viewport.
    pub fn resize(&mut self, size: Vec2) {
        match self {
            Obstacle::None => {}
            Obstacle::RotatingLine(line) => line.center = size * 0.5,
            Obstacle::ExclusionBox(exclusion) => exclusion.center = size * 0.5,
        }
    }

    /// Per-frame motion.
    pub fn advance(&mut self, delta_ms: f32) {
        if let Obstacle::RotatingLine(line) = self {
            line.advance(delta_ms);
        }
    }

    /// Set or clear the exclusion box size. No-op for other variants.
    pub fn set_label_size(&mut self, size: Option<Vec2>) {
        if let Obstacle::ExclusionBox(exclusion) = self {
            exclusion.size = size;
        }
    }

    pub fn label_size(&self) -> Option<Vec2> {
        match self {
            Obstacle::ExclusionBox(exclusion) => exclusion.size,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_line() -> RotatingLine {
        RotatingLine {
            center: Vec2::new(400.0, 300.0),
            half_length: 200.0,
            angle: 0.0,
            angular_speed: 0.0,
            restitution: 0.45,
        }
    }

    #[test]
    fn test_local_frame_roundtrip() {
        let line = RotatingLine { angle: 0.7, ..flat_line() };
        let p = Vec2::new(123.0, 456.0);
        assert!((line.to_world(line.to_local(p)) - p).length() < 1e-3);
    }

    #[test]
    fn test_line_reflects_crossing_particle() {
        let line = flat_line();
        let previous = Vec2::new(400.0, 285.0);
        let mut position = Vec2::new(400.0, 295.0);
        let mut velocity = Vec2::new(0.0, 10.0);
        assert!(line.collide(previous, &mut position, &mut velocity, 10.0));
        assert!((velocity.y + 4.5).abs() < 1e-5);
        assert!((position.y - 290.0).abs() < 1e-4);
    }

    #[test]
    fn test_line_rejects_outside_span() {
        let line = flat_line();
        let mut position = Vec2::new(650.0, 295.0);
        let mut velocity = Vec2::new(0.0, 10.0);
        assert!(!line.collide(Vec2::new(650.0, 285.0), &mut position, &mut velocity, 10.0));
        assert_eq!(velocity, Vec2::new(0.0, 10.0));
    }

    #[test]
    fn test_line_ignores_upward_motion() {
        let line = flat_line();
        let mut position = Vec2::new(400.0, 285.0);
        let mut velocity = Vec2::new(0.0, -10.0);
        assert!(!line.collide(Vec2::new(400.0, 295.0), &mut position, &mut velocity, 10.0));
    }

    #[test]
    fn test_line_advance_uses_seconds() {
        let mut line = RotatingLine { angular_speed: 1.0, ..flat_line() };
        line.advance(500.0);
        assert!((line.angle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_inactive_box_never_hits() {
        let exclusion = ExclusionBox { center: Vec2::splat(100.0), size: None, damping: 0.2 };
        let mut p = Vec2::splat(100.0);
        let mut v = Vec2::new(1.0, 1.0);
        assert!(!exclusion.sweep(&mut p, &mut v, 10.0));
        assert_eq!(v, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_box_landing_damps_and_parks() {
        let exclusion = ExclusionBox {
            center: Vec2::new(400.0, 300.0),
            size: Some(Vec2::new(200.0, 50.0)),
            damping: 0.2,
        };
        // Box top is at y = 275.
        let mut p = Vec2::new(400.0, 260.0);
        let mut v = Vec2::new(0.0, 8.0);
        assert!(exclusion.sweep(&mut p, &mut v, 10.0));
        assert_eq!(p.y, 275.0 - 10.0 - 8.0);
        assert!((v.y + 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_box_side_hit_reverses_vx() {
        let exclusion = ExclusionBox {
            center: Vec2::new(400.0, 300.0),
            size: Some(Vec2::new(200.0, 50.0)),
            damping: 0.2,
        };
        // Left edge is x = 300; particle at the same height moving right.
        let mut p = Vec2::new(285.0, 300.0);
        let mut v = Vec2::new(8.0, 0.0);
        exclusion.sweep(&mut p, &mut v, 10.0);
        assert_eq!(v.x, -8.0);
    }

    #[test]
    fn test_resize_recentres() {
        let kind = ObstacleKind::ExclusionBox { damping: 0.2 };
        let mut obstacle = Obstacle::new(&kind, Vec2::new(800.0, 600.0));
        obstacle.set_label_size(Some(Vec2::new(400.0, 60.0)));
        obstacle.resize(Vec2::new(400.0, 300.0));
        match obstacle {
            Obstacle::ExclusionBox(exclusion) => {
                assert_eq!(exclusion.center, Vec2::new(200.0, 150.0));
                assert_eq!(exclusion.size, Some(Vec2::new(400.0, 60.0)));
            }
            other => panic!("unexpected obstacle {:?}", other),
        }
    }
}
