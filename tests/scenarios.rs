//! End-to-end scenarios with fixed seeds.

use glam::Vec2;
use metaballs::config::{EdgeBounce, Integration, ObstacleKind, Respawn, VelocityRange};
use metaballs::obstacle::RotatingLine;
use metaballs::{Metaballs, Obstacle, Particles, Settings, Simulator, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn falling_config() -> metaballs::SimConfig {
    let mut config = Settings::rain().sim;
    config.radius = 50.0;
    config.gravity = Vec2::new(0.0, 0.1);
    config.gravity_flip_interval_ms = None;
    config.integration = Integration::PerFrame;
    config.edges = EdgeBounce::default();
    config.respawn = Respawn::Top { velocity_y: VelocityRange::new(1.0, 3.0) };
    config.obstacle = ObstacleKind::None;
    config
}

#[test]
fn single_particle_falls_and_respawns_at_top() {
    let particles = Particles::from_fn(1, |_| (Vec2::new(100.0, 0.0), Vec2::ZERO));
    let mut sim = Simulator::with_particles(
        falling_config(),
        Viewport::new(800.0, 500.0, 1.0),
        particles,
        StdRng::seed_from_u64(2024),
    );

    let mut reached_450 = false;
    for step in 0..1000 {
        let before = sim.particles().position(0);
        let expected_vy = sim.particles().velocity(0).y + 0.1;
        let expected_y = before.y + expected_vy;
        reached_450 |= before.y >= 450.0;

        sim.step(16.0, Vec2::ZERO);
        let p = sim.particles().position(0);
        let v = sim.particles().velocity(0);

        if expected_y - 50.0 > 500.0 {
            assert!(reached_450, "respawned at step {} before reaching 450", step);
            assert!(p.y <= 0.0);
            assert_eq!(p.y, -50.0);
            assert!((1.0..=3.0).contains(&v.y), "vy = {}", v.y);
            assert_eq!(p.x, 100.0);
            return;
        }
        assert!((p.y - expected_y).abs() < 1e-3);
        assert!((v.y - expected_vy).abs() < 1e-5);
    }
    panic!("particle never respawned");
}

#[test]
fn respawn_is_reproducible_with_seed() {
    let run = || {
        let particles = Particles::from_fn(1, |_| (Vec2::new(100.0, 540.0), Vec2::new(0.0, 20.0)));
        let mut sim = Simulator::with_particles(
            falling_config(),
            Viewport::new(800.0, 500.0, 1.0),
            particles,
            StdRng::seed_from_u64(99),
        );
        sim.step(16.0, Vec2::ZERO);
        sim.particles().velocity(0)
    };
    assert_eq!(run(), run());
}

#[test]
fn line_reflects_crossing_particle() {
    let mut config = Settings::tilted_line().sim;
    config.gravity = Vec2::ZERO;
    config.obstacle = ObstacleKind::RotatingLine {
        half_length: 300.0,
        angular_speed: 0.0,
        initial_angle: 0.3,
        restitution: 0.45,
    };
    let viewport = Viewport::new(800.0, 600.0, 1.0);
    let collision_radius = config.collision_radius();

    let line = RotatingLine {
        center: viewport.center(),
        half_length: 300.0,
        angle: 0.3,
        angular_speed: 0.0,
        restitution: 0.45,
    };
    // Just above the contact surface, moving down along the line normal.
    let start = line.to_world(Vec2::new(40.0, -collision_radius - 2.0));
    let velocity = line.dir_to_world(Vec2::new(0.0, 6.0));

    let particles = Particles::from_fn(1, |_| (start, velocity));
    let mut sim = Simulator::with_particles(config, viewport, particles, StdRng::seed_from_u64(1));
    sim.step(16.0, Vec2::ZERO);

    let Obstacle::RotatingLine(line) = *sim.obstacle() else {
        panic!("expected a rotating line");
    };
    let local_p = line.to_local(sim.particles().position(0));
    let local_v = line.dir_to_local(sim.particles().velocity(0));
    assert!((local_v.y - (-0.45 * 6.0)).abs() < 1e-4, "vy' = {}", local_v.y);
    assert!((local_p.y + collision_radius).abs() < 1e-3, "y' = {}", local_p.y);
}

#[test]
fn line_ignores_particles_beyond_its_ends() {
    let line = RotatingLine {
        center: Vec2::new(400.0, 300.0),
        half_length: 100.0,
        angle: 0.0,
        angular_speed: 0.0,
        restitution: 0.45,
    };
    let previous = Vec2::new(600.0, 280.0);
    let mut position = Vec2::new(600.0, 310.0);
    let mut velocity = Vec2::new(0.0, 30.0);
    assert!(!line.collide(previous, &mut position, &mut velocity, 10.0));
    assert_eq!(velocity, Vec2::new(0.0, 30.0));
}

#[test]
fn resize_scales_target_and_keeps_particles() {
    let mut m = Metaballs::new(Settings::fountain(), Viewport::new(800.0, 600.0, 1.0), 11);
    assert_eq!(m.target_size(), (800, 600));
    let before = m.simulator().particles().clone();

    m.resize(400.0, 300.0, 1.0);
    assert_eq!(m.target_size(), (400, 300));
    assert_eq!(m.simulator().particles(), &before);

    m.resize(400.0, 300.0, 2.0);
    assert_eq!(m.target_size(), (800, 600));
    assert_eq!(m.simulator().particles(), &before);
}

#[test]
fn repeated_resize_allocates_once() {
    let mut m = Metaballs::new(Settings::rain(), Viewport::new(800.0, 600.0, 1.0), 11);
    m.resize(1024.0, 768.0, 1.5);
    let generation = m.target_plan().generation();
    let projection = m.viewport().projection();

    m.resize(1024.0, 768.0, 1.5);
    assert_eq!(m.target_plan().generation(), generation);
    assert_eq!(m.viewport().projection(), projection);
    assert_eq!(m.target_size(), (1536, 1152));
}

#[test]
fn scale_factor_is_capped() {
    let mut m = Metaballs::new(Settings::rain(), Viewport::default(), 0);
    m.resize(100.0, 100.0, 4.0);
    assert_eq!(m.target_size(), (250, 250));
}

#[test]
fn contexts_are_independent() {
    let mut a = Metaballs::new(Settings::fountain(), Viewport::default(), 5);
    let b = Metaballs::new(Settings::fountain(), Viewport::default(), 5);
    a.pointer().set(Vec2::new(10.0, 10.0));
    a.frame(16.0, 16.0).unwrap();

    assert_ne!(a.simulator().particles(), b.simulator().particles());
    assert_eq!(b.pointer().get(), Viewport::default().center());
}
