//! CPU particle simulation.
//!
//! [`Simulator::step`] advances every particle by one frame:
//!
//! 1. gravity is added to the velocity and x is integrated,
//! 2. the exclusion box (if any) sweeps the next move; a landing replaces the
//!    vertical integration for this step,
//! 3. y is integrated and the rotating line (if any) reflects crossings,
//! 4. x is clamped to the left/right bounce planes,
//! 5. particles below the bottom edge respawn.
//!
//! The whole set is stepped before the caller reads positions, so a render
//! never sees a half-stepped frame.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{Respawn, SimConfig};
use crate::obstacle::Obstacle;
use crate::particles::Particles;
use crate::viewport::Viewport;

/// Owns the particle set and advances it.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimConfig,
    particles: Particles,
    obstacle: Obstacle,
    viewport: Viewport,
    gravity: Vec2,
    flip_elapsed_ms: f32,
    rng: StdRng,
}

impl Simulator {
    /// Spawn `config.particle_count` particles across the viewport.
    pub fn new(config: SimConfig, viewport: Viewport, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = Particles::from_fn(config.particle_count, |_| {
            spawn_initial(&config, &viewport, &mut rng)
        });
        Self::with_particles(config, viewport, particles, rng)
    }

    /// Start from an explicit particle set.
    ///
    /// `config.particle_count` is overwritten with the set's length.
    pub fn with_particles(
        mut config: SimConfig,
        viewport: Viewport,
        particles: Particles,
        rng: StdRng,
    ) -> Self {
        config.particle_count = particles.len();
        Self {
            obstacle: Obstacle::new(&config.obstacle, viewport.size()),
            gravity: config.gravity,
            config,
            particles,
            viewport,
            flip_elapsed_ms: 0.0,
            rng,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut Particles {
        &mut self.particles
    }

    pub fn obstacle(&self) -> &Obstacle {
        &self.obstacle
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Gravity currently in effect, including any horizontal flip.
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Advance one frame of `delta_ms` milliseconds.
    ///
    /// `pointer` is the respawn target for [`Respawn::Pointer`], in logical
    /// pixels.
    pub fn step(&mut self, delta_ms: f32, pointer: Vec2) {
        self.update_gravity(delta_ms);
        self.obstacle.advance(delta_ms);

        let scale = self.config.integration.time_scale(delta_ms);
        let collision_radius = self.config.collision_radius();
        let collide = collision_radius > 0.0;
        let width = self.viewport.width;
        let height = self.viewport.height;
        let radius = self.config.radius;
        let edges = self.config.edges;
        // Narrow viewports pull both planes to the middle.
        let inset = edges.inset.min(width * 0.5).max(0.0);
        let left = inset;
        let right = width - inset;

        for i in 0..self.particles.len() {
            let start = self.particles.position(i);
            let mut position = start;
            let mut velocity = self.particles.velocity(i) + self.gravity;

            position.x += velocity.x * scale.x;

            let landed = match &self.obstacle {
                Obstacle::ExclusionBox(exclusion) if collide => {
                    exclusion.sweep(&mut position, &mut velocity, collision_radius)
                }
                _ => false,
            };

            if !landed {
                position.y += velocity.y * scale.y;
                if let Obstacle::RotatingLine(line) = &self.obstacle {
                    if collide {
                        line.collide(start, &mut position, &mut velocity, collision_radius);
                    }
                }
            }

            if position.x < left {
                position.x = left;
                velocity.x *= -edges.restitution;
            } else if position.x > right {
                position.x = right;
                velocity.x *= -edges.restitution;
            }

            if position.y - radius > height {
                match self.config.respawn {
                    Respawn::Top { velocity_y } => {
                        position.y = -radius;
                        velocity.y = velocity_y.sample(&mut self.rng);
                    }
                    Respawn::Pointer { velocity_x, velocity_y } => {
                        position = clamp_into(pointer, left, right, -radius, height);
                        velocity = Vec2::new(
                            velocity_x.sample(&mut self.rng),
                            velocity_y.sample(&mut self.rng),
                        );
                    }
                }
            }

            self.particles.set_position(i, position);
            self.particles.set_velocity(i, velocity);
        }
    }

    fn update_gravity(&mut self, delta_ms: f32) {
        let Some(interval) = self.config.gravity_flip_interval_ms else {
            return;
        };
        if interval <= 0.0 {
            return;
        }
        self.flip_elapsed_ms += delta_ms;
        while self.flip_elapsed_ms >= interval {
            self.flip_elapsed_ms -= interval;
            self.gravity.x = -self.gravity.x;
        }
    }

    /// Track a new viewport. Particles are not moved.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.obstacle.resize(viewport.size());
    }

    /// Set or clear the text label size used by the exclusion box.
    pub fn set_label_size(&mut self, size: Option<Vec2>) {
        self.obstacle.set_label_size(size);
    }

    /// Apply new physics settings.
    ///
    /// A count change grows or shrinks the set; surviving particles keep
    /// their state. A changed obstacle kind rebuilds the obstacle, keeping the
    /// label size.
    pub fn set_config(&mut self, config: SimConfig) {
        if config.particle_count != self.particles.len() {
            let viewport = self.viewport;
            let rng = &mut self.rng;
            self.particles
                .resize_with(config.particle_count, |_| spawn_initial(&config, &viewport, rng));
        }
        if config.obstacle != self.config.obstacle {
            let label = self.obstacle.label_size();
            self.obstacle = Obstacle::new(&config.obstacle, self.viewport.size());
            self.obstacle.set_label_size(label);
        }
        if config.gravity != self.config.gravity
            || config.gravity_flip_interval_ms != self.config.gravity_flip_interval_ms
        {
            self.gravity = config.gravity;
            self.flip_elapsed_ms = 0.0;
        }
        self.config = config;
    }
}

fn spawn_initial(config: &SimConfig, viewport: &Viewport, rng: &mut impl Rng) -> (Vec2, Vec2) {
    let spawn_height = config.spawn_height.unwrap_or(viewport.height);
    let position = Vec2::new(
        rng.gen::<f32>() * viewport.width,
        rng.gen::<f32>() * spawn_height,
    );
    let velocity = Vec2::new(
        config.start_velocity_x.sample(rng),
        config.start_velocity_y.sample(rng),
    );
    (position, velocity)
}

fn clamp_into(point: Vec2, left: f32, right: f32, top: f32, bottom: f32) -> Vec2 {
    Vec2::new(point.x.max(left).min(right), point.y.max(top).min(bottom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeBounce, Integration, ObstacleKind, Settings, VelocityRange};

    fn single(config: SimConfig, position: Vec2, velocity: Vec2) -> Simulator {
        let mut particles = Particles::new();
        particles.push(position, velocity);
        Simulator::with_particles(
            config,
            Viewport::new(800.0, 600.0, 1.0),
            particles,
            StdRng::seed_from_u64(1),
        )
    }

    #[test]
    fn test_new_spawns_within_viewport() {
        let config = Settings::fountain().sim;
        let sim = Simulator::new(config.clone(), Viewport::new(640.0, 480.0, 1.0), 3);
        assert_eq!(sim.particles().len(), 500);
        for (p, v) in sim.particles().iter() {
            assert!(p.x >= 0.0 && p.x <= 640.0);
            assert!(p.y >= 0.0 && p.y <= 480.0);
            assert!(config.start_velocity_y.contains(v.y));
        }
    }

    #[test]
    fn test_empty_set_steps() {
        let mut config = Settings::rain().sim;
        config.particle_count = 0;
        let mut sim = Simulator::new(config, Viewport::default(), 0);
        sim.step(16.0, Vec2::ZERO);
        assert!(sim.particles().is_empty());
    }

    #[test]
    fn test_per_frame_integration_ignores_delta() {
        let mut config = Settings::fountain().sim;
        config.gravity = Vec2::ZERO;
        let mut a = single(config.clone(), Vec2::new(100.0, 100.0), Vec2::new(1.0, 2.0));
        let mut b = single(config, Vec2::new(100.0, 100.0), Vec2::new(1.0, 2.0));
        a.step(8.0, Vec2::ZERO);
        b.step(40.0, Vec2::ZERO);
        assert_eq!(a.particles().position(0), Vec2::new(101.0, 102.0));
        assert_eq!(a.particles().position(0), b.particles().position(0));
    }

    #[test]
    fn test_elapsed_integration_scales_per_axis() {
        let mut config = Settings::fountain().sim;
        config.gravity = Vec2::ZERO;
        config.integration = Integration::Elapsed { scale_x: 0.075, scale_y: 0.06 };
        let mut sim = single(config, Vec2::new(100.0, 100.0), Vec2::new(2.0, 5.0));
        sim.step(20.0, Vec2::ZERO);
        let p = sim.particles().position(0);
        assert!((p.x - 103.0).abs() < 1e-4);
        assert!((p.y - 106.0).abs() < 1e-4);
    }

    #[test]
    fn test_edge_bounce_with_restitution() {
        let mut config = Settings::fountain().sim;
        config.gravity = Vec2::ZERO;
        config.edges = EdgeBounce { inset: 0.0, restitution: 0.75 };
        let mut sim = single(config, Vec2::new(798.0, 100.0), Vec2::new(4.0, 0.0));
        sim.step(16.0, Vec2::ZERO);
        assert_eq!(sim.particles().position(0).x, 800.0);
        assert_eq!(sim.particles().velocity(0).x, -3.0);
    }

    #[test]
    fn test_edge_inset() {
        let mut config = Settings::rain().sim;
        config.gravity = Vec2::ZERO;
        let mut sim = single(config, Vec2::new(130.0, 100.0), Vec2::new(-10.0, 0.0));
        sim.step(16.0, Vec2::ZERO);
        assert_eq!(sim.particles().position(0).x, 125.0);
        assert_eq!(sim.particles().velocity(0).x, 10.0);
    }

    #[test]
    fn test_edge_inset_fits_narrow_viewport() {
        let mut config = Settings::rain().sim;
        config.particle_count = 5;
        let mut sim = Simulator::new(config, Viewport::new(100.0, 600.0, 1.0), 3);
        sim.step(16.0, Vec2::new(50.0, 50.0));
        for (p, _) in sim.particles().iter() {
            assert_eq!(p.x, 50.0, "x = {} outside 0..100", p.x);
        }
    }

    #[test]
    fn test_top_respawn_keeps_vx() {
        let config = Settings::rain().sim;
        let mut sim = single(config, Vec2::new(300.0, 851.0), Vec2::new(0.05, 2.0));
        sim.step(16.0, Vec2::ZERO);
        let p = sim.particles().position(0);
        let v = sim.particles().velocity(0);
        assert_eq!(p.y, -250.0);
        assert_eq!(v.x, 0.05);
        assert!(v.y >= 5.0 && v.y <= 8.0);
    }

    #[test]
    fn test_pointer_respawn_moves_to_pointer() {
        let config = Settings::fountain().sim;
        let mut sim = single(config, Vec2::new(300.0, 750.0), Vec2::ZERO);
        sim.step(16.0, Vec2::new(420.0, 50.0));
        assert_eq!(sim.particles().position(0), Vec2::new(420.0, 50.0));
        let v = sim.particles().velocity(0);
        assert!(v.x.abs() <= 5.0 && v.y.abs() <= 6.0);
    }

    #[test]
    fn test_pointer_respawn_clamps_outside_pointer() {
        let config = Settings::fountain().sim;
        let mut sim = single(config, Vec2::new(300.0, 750.0), Vec2::ZERO);
        sim.step(16.0, Vec2::new(-50.0, 9000.0));
        assert_eq!(sim.particles().position(0), Vec2::new(0.0, 600.0));
    }

    #[test]
    fn test_gravity_flips_on_interval() {
        let config = Settings::label().sim;
        let mut sim = Simulator::new(config, Viewport::default(), 0);
        assert_eq!(sim.gravity().x, 0.015);
        sim.step(2999.0, Vec2::ZERO);
        assert_eq!(sim.gravity().x, 0.015);
        sim.step(2.0, Vec2::ZERO);
        assert_eq!(sim.gravity().x, -0.015);
    }

    #[test]
    fn test_zero_radius_disables_obstacles() {
        let mut config = Settings::label().sim;
        config.radius = 0.0;
        config.gravity = Vec2::ZERO;
        config.integration = Integration::PerFrame;
        let mut sim = single(config, Vec2::new(400.0, 250.0), Vec2::new(0.0, 10.0));
        sim.set_label_size(Some(Vec2::new(400.0, 100.0)));
        sim.step(16.0, Vec2::ZERO);
        assert_eq!(sim.particles().position(0), Vec2::new(400.0, 260.0));
    }

    #[test]
    fn test_label_box_catches_falling_particle() {
        let mut config = Settings::label().sim;
        config.gravity = Vec2::ZERO;
        config.integration = Integration::PerFrame;
        // Collision radius 50, box spans y 250..350.
        let mut sim = single(config, Vec2::new(400.0, 195.0), Vec2::new(0.0, 10.0));
        sim.set_label_size(Some(Vec2::new(400.0, 100.0)));
        sim.step(16.0, Vec2::ZERO);
        assert_eq!(sim.particles().position(0).y, 250.0 - 50.0 - 10.0);
        assert!((sim.particles().velocity(0).y + 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_config_resizes_and_rebuilds() {
        let mut sim = Simulator::new(Settings::rain().sim, Viewport::default(), 5);
        let before = sim.particles().position(0);

        let mut config = sim.config().clone();
        config.particle_count = 150;
        config.obstacle = ObstacleKind::ExclusionBox { damping: 0.2 };
        config.start_velocity_y = VelocityRange::new(0.0, 0.0);
        sim.set_config(config);

        assert_eq!(sim.particles().len(), 150);
        assert_eq!(sim.particles().position(0), before);
        assert_eq!(sim.particles().velocity(120).y, 0.0);
        assert!(matches!(sim.obstacle(), Obstacle::ExclusionBox(_)));
    }

    #[test]
    fn test_resize_keeps_positions() {
        let mut sim = Simulator::new(Settings::fountain().sim, Viewport::new(800.0, 600.0, 1.0), 9);
        let before = sim.particles().clone();
        sim.resize(Viewport::new(400.0, 300.0, 2.0));
        assert_eq!(sim.particles(), &before);
        assert_eq!(sim.viewport().size(), Vec2::new(400.0, 300.0));
    }
}
