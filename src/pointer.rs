//! Shared pointer position.
//!
//! Written by the input handler, read by the simulator as a respawn target.
//! Both coordinates are packed into one `AtomicU64`, so a read never sees the x
//! of one event and the y of another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec2;

/// Cloneable handle to the latest pointer position, in logical pixels.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    packed: Arc<AtomicU64>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `position` instead of the origin.
    pub fn at(position: Vec2) -> Self {
        let state = Self::default();
        state.set(position);
        state
    }

    pub fn set(&self, position: Vec2) {
        let packed = (u64::from(position.x.to_bits()) << 32) | u64::from(position.y.to_bits());
        self.packed.store(packed, Ordering::Relaxed);
    }

    pub fn get(&self) -> Vec2 {
        let packed = self.packed.load(Ordering::Relaxed);
        Vec2::new(f32::from_bits((packed >> 32) as u32), f32::from_bits(packed as u32))
    }
}
