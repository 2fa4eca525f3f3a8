//! Frame clock.
//!
//! Produces the per-frame delta and elapsed time, in milliseconds, that drive
//! [`Metaballs::frame`](crate::Metaballs::frame).
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // once per redraw:
//! let tick = clock.tick();
//! metaballs.frame(tick.delta_ms, tick.elapsed_ms);
//! ```

use std::time::{Duration, Instant};

/// Longest delta handed to the simulator. Longer gaps (window hidden,
/// debugger pause) are treated as one slow frame instead of a jump.
pub const MAX_DELTA_MS: f32 = 100.0;

/// Timing of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    pub delta_ms: f32,
    pub elapsed_ms: f32,
    pub frame: u64,
}

#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    frame_count: u64,
    /// Used instead of the measured delta when set.
    fixed_delta_ms: Option<f32>,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            last_frame: now,
            frame_count: 0,
            fixed_delta_ms: None,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Advance to now.
    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    /// Advance to `now`.
    pub fn tick_at(&mut self, now: Instant) -> Tick {
        let raw_delta = now.saturating_duration_since(self.last_frame).as_secs_f32() * 1000.0;
        let delta_ms = self.fixed_delta_ms.unwrap_or(raw_delta).clamp(0.0, MAX_DELTA_MS);
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        Tick {
            delta_ms,
            elapsed_ms: now.saturating_duration_since(self.start).as_secs_f32() * 1000.0,
            frame: self.frame_count,
        }
    }

    pub fn set_fixed_delta(&mut self, delta_ms: Option<f32>) {
        self.fixed_delta_ms = delta_ms;
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
