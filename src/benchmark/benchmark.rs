use std::time::Instant;

use crate::simulation::attraction::{AttractionMatrix, AttractionPreset};
use crate::simulation::engine::Engine;
use crate::simulation::forces::{DirectSum, ForceAccumulator, GridSum, Interaction};
use crate::simulation::generator::{GeneratorKind, ParticleGenerator};
use crate::simulation::params::{VelocityUpdateSetting, World};
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{NVec2, Particle};

const COLORS: usize = 6;

/// Helper to build a reproducible population of size `n`
fn make_particles(n: usize) -> Vec<Particle> {
    // fixed generator: same seed and palette on every run
    ParticleGenerator {
        kind: GeneratorKind::Uniform,
        color_count: COLORS,
        particle_count: n,
        fixed: true,
    }
    .generate(1.0)
}

/// Helper to build the rule table and setting used by every benchmark
fn make_rules() -> (AttractionMatrix, VelocityUpdateSetting) {
    let rules = AttractionMatrix::preset(AttractionPreset::Chain, COLORS, COLORS);
    let setting = VelocityUpdateSetting {
        rmax: 0.05,
        ..VelocityUpdateSetting::default()
    };
    (rules, setting)
}

fn time_accumulator(
    acc: &dyn ForceAccumulator,
    interaction: &Interaction<'_>,
    particles: &[Particle],
    steps: usize,
) -> f64 {
    let n = particles.len();
    let mut forces = vec![NVec2::zeros(); n];
    let mut counts = vec![0u32; n];

    // Warm up
    acc.accumulate(interaction, particles, &mut forces, &mut counts);

    let t0 = Instant::now();
    for _ in 0..steps {
        acc.accumulate(interaction, particles, &mut forces, &mut counts);
    }
    t0.elapsed().as_secs_f64() / steps as f64
}

/// Force pass timings: direct vs grid vs parallel grid.
pub fn bench_accumulators() {
    let ns = [500, 1000, 2000, 4000, 8000, 16000];
    let (rules, setting) = make_rules();
    let world = World::default();
    let interaction = Interaction {
        setting: &setting,
        rules: &rules,
        world: &world,
    };

    for n in ns {
        let particles = make_particles(n);
        // O(n^2) gets slow fast, time it once at large n
        let steps_direct = if n <= 2000 { 5 } else { 1 };

        let direct = time_accumulator(&DirectSum { parallel: false }, &interaction, &particles, steps_direct);
        let grid = time_accumulator(&GridSum { parallel: false }, &interaction, &particles, 5);
        let grid_par = time_accumulator(&GridSum { parallel: true }, &interaction, &particles, 5);

        println!(
            "N = {n:5}, direct = {:8.6} s, grid = {:8.6} s, grid (parallel) = {:8.6} s",
            direct, grid, grid_par
        );
    }
}

/// Full tick cost for a range of n, one CSV row per n
/// Paste output directly into a spreadsheet to graph
pub fn bench_tick_curve() {
    println!("N,direct_ms,grid_ms");

    let (rules, setting) = make_rules();
    for n in (1000..=32000).step_by(1000) {
        let steps_direct = if n <= 4000 { 5 } else { 1 };
        let steps_grid = 5;

        let mut ms = [0.0; 2];
        for (slot, (spatial_grid, steps)) in [(false, steps_direct), (true, steps_grid)].into_iter().enumerate() {
            let engine = Engine {
                spatial_grid,
                ..Engine::default()
            };
            let Ok(mut scenario) = Scenario::new(engine, World::default(), setting, rules.clone(), make_particles(n)) else {
                eprintln!("N = {n}: scenario rejected");
                return;
            };

            let t0 = Instant::now();
            for _ in 0..steps {
                if let Err(e) = scenario.step() {
                    eprintln!("N = {n}: {e}");
                    return;
                }
            }
            ms[slot] = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;
        }

        println!("{},{:.6},{:.6}", n, ms[0], ms[1]);
    }
}
