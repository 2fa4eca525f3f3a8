//! Particle storage.
//!
//! Positions and velocities live in two parallel, densely packed `f32` arrays
//! (`[x0, y0, x1, y1, ...]`). The position array is uploaded to the GPU as one
//! contiguous block every frame and doubles as the per-instance offset buffer
//! of the sprite pass.

use glam::Vec2;

/// Structure-of-arrays particle set.
///
/// Both arrays always hold exactly `2 * len()` floats; indices `2i` and `2i + 1`
/// address particle `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particles {
    positions: Vec<f32>,
    velocities: Vec<f32>,
}

impl Particles {
    /// Create an empty particle set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set with `count` particles produced by `spawn(index)`.
    pub fn from_fn(count: usize, mut spawn: impl FnMut(usize) -> (Vec2, Vec2)) -> Self {
        let mut particles = Self {
            positions: Vec::with_capacity(count * 2),
            velocities: Vec::with_capacity(count * 2),
        };
        for i in 0..count {
            let (position, velocity) = spawn(i);
            particles.push(position, velocity);
        }
        particles
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len() / 2
    }

    /// Whether the set holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a particle.
    pub fn push(&mut self, position: Vec2, velocity: Vec2) {
        self.positions.extend_from_slice(&[position.x, position.y]);
        self.velocities.extend_from_slice(&[velocity.x, velocity.y]);
    }

    /// Grow or shrink to `count` particles.
    ///
    /// Existing particles keep their state; new ones come from `spawn(index)`.
    pub fn resize_with(&mut self, count: usize, mut spawn: impl FnMut(usize) -> (Vec2, Vec2)) {
        if count <= self.len() {
            self.positions.truncate(count * 2);
            self.velocities.truncate(count * 2);
            return;
        }
        for i in self.len()..count {
            let (position, velocity) = spawn(i);
            self.push(position, velocity);
        }
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec2 {
        Vec2::new(self.positions[index * 2], self.positions[index * 2 + 1])
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec2 {
        Vec2::new(self.velocities[index * 2], self.velocities[index * 2 + 1])
    }

    #[inline]
    pub fn set_position(&mut self, index: usize, position: Vec2) {
        self.positions[index * 2] = position.x;
        self.positions[index * 2 + 1] = position.y;
    }

    #[inline]
    pub fn set_velocity(&mut self, index: usize, velocity: Vec2) {
        self.velocities[index * 2] = velocity.x;
        self.velocities[index * 2 + 1] = velocity.y;
    }

    /// Packed positions, two floats per particle.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Packed velocities, two floats per particle.
    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    /// Position array as raw bytes; this is what the sprite pass uploads.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Iterate over `(position, velocity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        (0..self.len()).map(move |i| (self.position(i), self.velocity(i)))
    }
}
