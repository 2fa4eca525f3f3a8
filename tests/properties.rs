//! Property tests for the simulator and the threshold ramp.

use glam::{Vec2, Vec3};
use metaballs::ramp::{Band, ThresholdRamp};
use metaballs::{Respawn, Settings, Simulator, Viewport};
use proptest::prelude::*;

fn preset(index: usize) -> Settings {
    match index % 4 {
        0 => Settings::rain(),
        1 => Settings::fountain(),
        2 => Settings::label(),
        _ => Settings::tilted_line(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn particles_stay_between_edges(
        preset_index in 0usize..4,
        count in 0usize..60,
        seed in any::<u64>(),
        steps in 1usize..120,
        delta in 1.0f32..40.0,
        width in 1.0f32..1600.0,
        height in 200.0f32..1200.0,
        pointer in (-500.0f32..2000.0, -500.0f32..2000.0),
    ) {
        let mut settings = preset(preset_index);
        settings.sim.particle_count = count;
        let viewport = Viewport::new(width, height, 1.0);
        let mut sim = Simulator::new(settings.sim, viewport, seed);
        sim.set_label_size(Some(Vec2::new(width * 0.5, 60.0)));

        for _ in 0..steps {
            sim.step(delta, Vec2::new(pointer.0, pointer.1));
            for (p, _) in sim.particles().iter() {
                prop_assert!(p.x >= -1e-3 && p.x <= width + 1e-3, "x = {} outside 0..{}", p.x, width);
            }
        }
    }

    #[test]
    fn fallen_particles_respawn_in_range(
        preset_index in 0usize..3,
        seed in any::<u64>(),
        depth in 1.0f32..500.0,
        x in 0.0f32..800.0,
        vy in 0.0f32..20.0,
    ) {
        let settings = preset(preset_index);
        let radius = settings.sim.radius;
        let viewport = Viewport::new(800.0, 600.0, 1.0);
        let mut sim = Simulator::new(settings.sim.clone(), viewport, seed);
        sim.particles_mut().set_position(0, Vec2::new(x, 600.0 + radius + depth));
        sim.particles_mut().set_velocity(0, Vec2::new(0.0, vy));

        sim.step(16.0, Vec2::new(400.0, 100.0));

        let p = sim.particles().position(0);
        let v = sim.particles().velocity(0);
        prop_assert!(p.y >= -radius && p.y <= 600.0, "respawned at y = {}", p.y);
        match settings.sim.respawn {
            Respawn::Top { velocity_y } => prop_assert!(velocity_y.contains(v.y)),
            Respawn::Pointer { velocity_x, velocity_y } => {
                prop_assert!(velocity_x.contains(v.x));
                prop_assert!(velocity_y.contains(v.y));
            }
        }
    }

    #[test]
    fn ramp_is_base_below_and_top_above(
        cutoffs in prop::collection::vec(0.05f32..0.95, 1..=4),
        feathers in prop::collection::vec(0.0f32..0.05, 4),
        below in 0.0f32..1.0,
        above in 0.0f32..1.0,
    ) {
        let base = Vec3::new(0.1, 0.2, 0.3);
        let mut ramp = ThresholdRamp::new(base);
        // Insert in the generated (unsorted) order.
        for (i, cutoff) in cutoffs.iter().enumerate() {
            let color = Vec3::new(i as f32 * 0.2 + 0.2, 0.5, 1.0 - i as f32 * 0.2);
            ramp.insert(Band::smooth(*cutoff, feathers[i], color));
        }

        let lowest = ramp.bands().iter().map(|b| b.cutoff).fold(f32::INFINITY, f32::min);
        let highest = ramp.bands().iter().map(Band::full_at).fold(f32::NEG_INFINITY, f32::max);

        let below = below * lowest * 0.999;
        prop_assert_eq!(ramp.shade(below), base);

        let above = highest + above;
        prop_assert!(ramp.shade(above).abs_diff_eq(ramp.top(), 1e-6));
    }
}
