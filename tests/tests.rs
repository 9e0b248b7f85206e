use plife::simulation::attraction::{AttractionMatrix, AttractionPreset};
use plife::simulation::distance::DistanceFunction;
use plife::simulation::engine::Engine;
use plife::simulation::forces::{DirectSum, ForceAccumulator, ForceFunction, GridSum, Interaction};
use plife::simulation::generator::{GeneratorKind, ParticleGenerator};
use plife::simulation::params::{VelocityUpdateSetting, World};
use plife::simulation::scenario::Scenario;
use plife::simulation::states::{NVec2, Particle};
use plife::{ConfigError, ScenarioConfig, SimulationError};

/// Build a 2-particle population separated along the x-axis
pub fn two_particles(dist: f32, c1: u32, c2: u32) -> Vec<Particle> {
    vec![
        Particle::new(c1, NVec2::new(-dist / 2.0, 0.0)),
        Particle::new(c2, NVec2::new(dist / 2.0, 0.0)),
    ]
}

/// Default physics setting for tests
pub fn test_setting(rmax: f32) -> VelocityUpdateSetting {
    VelocityUpdateSetting {
        rmax,
        ..VelocityUpdateSetting::default()
    }
}

/// Sequential engine with the direct accumulator
pub fn direct_engine() -> Engine {
    Engine {
        spatial_grid: false,
        parallel: false,
        ..Engine::default()
    }
}

/// Run one force pass and return (forces, counts)
pub fn forces_of(
    acc: &dyn ForceAccumulator,
    setting: &VelocityUpdateSetting,
    rules: &AttractionMatrix,
    world: &World,
    particles: &[Particle],
) -> (Vec<NVec2>, Vec<u32>) {
    let interaction = Interaction { setting, rules, world };
    let mut forces = vec![NVec2::zeros(); particles.len()];
    let mut counts = vec![0; particles.len()];
    acc.accumulate(&interaction, particles, &mut forces, &mut counts);
    (forces, counts)
}

fn population(n: usize, colors: usize, kind: GeneratorKind) -> Vec<Particle> {
    ParticleGenerator::new(kind, colors, n, true).unwrap().generate(1.0)
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn force_newton_third_law_with_symmetric_rules() {
    let rules = AttractionMatrix::from_rows(&[vec![0.3, 0.8], vec![0.8, -0.2]]).unwrap();
    let world = World::default();
    for f in ForceFunction::ALL {
        for d in [0.005, 0.02, 0.04] {
            let setting = VelocityUpdateSetting {
                force_function: f,
                ..test_setting(0.05)
            };
            let (forces, _) = forces_of(&DirectSum::default(), &setting, &rules, &world, &two_particles(d, 0, 1));
            let net = forces[0] + forces[1];
            assert!(net.norm() < 1e-6, "{f} at {d}: net force {net:?}");
            assert!(forces[0].y.abs() < 1e-9);
        }
    }
}

#[test]
fn force_asymmetric_rules_break_the_third_law() {
    let rules = AttractionMatrix::from_rows(&[vec![0.0, 1.0], vec![-1.0, 0.0]]).unwrap();
    let (forces, _) = forces_of(
        &DirectSum::default(),
        &test_setting(0.05),
        &rules,
        &World::default(),
        &two_particles(0.03, 0, 1),
    );
    // 0 chases 1, 1 flees 0: both pushed toward +x
    assert!(forces[0].x > 0.0);
    assert!(forces[1].x > 0.0);
}

#[test]
fn force_attraction_points_toward_neighbour() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = two_particles(0.03, 0, 0); // r = 0.6, inside the attractive lobe
    let (forces, _) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    assert!(forces[0].x > 0.0);
    assert!(forces[1].x < 0.0);
}

#[test]
fn force_short_range_repulsion_ignores_rules() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = two_particles(0.01, 0, 0); // r = 0.2 < beta
    let (forces, _) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    assert!(forces[0].x < 0.0);
    assert!(forces[1].x > 0.0);
}

#[test]
fn force_factor_scales_the_sum() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = two_particles(0.03, 0, 0);
    let (base, _) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    let setting = VelocityUpdateSetting {
        force_factor: 3.0,
        ..test_setting(0.05)
    };
    let (scaled, _) = forces_of(&DirectSum::default(), &setting, &rules, &World::default(), &ps);
    assert!((scaled[0] - base[0] * 3.0).norm() < 1e-6);
}

#[test]
fn force_is_zero_without_neighbours() {
    let rules = AttractionMatrix::preset(AttractionPreset::Exclusive, 2, 2);
    let ps = two_particles(0.5, 0, 1);
    let (forces, counts) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    assert_eq!(forces, vec![NVec2::zeros(); 2]);
    assert_eq!(counts, vec![0, 0]);
}

#[test]
fn force_coincident_particles_are_counted_but_exert_nothing() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = vec![Particle::new(0, NVec2::new(0.1, 0.1)); 3];
    let (forces, counts) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    assert!(forces.iter().all(|f| *f == NVec2::zeros()));
    assert_eq!(counts, vec![2, 2, 2]);
}

#[test]
fn force_uses_the_wrapped_displacement() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = vec![Particle::new(0, NVec2::new(0.985, 0.0)), Particle::new(0, NVec2::new(-0.985, 0.0))];
    let (forces, counts) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::toroidal(1.0), &ps);
    assert_eq!(counts, vec![1, 1]);
    // attraction across the seam: particle 0 pulled toward +x
    assert!(forces[0].x > 0.0);

    let (_, counts) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::open(), &ps);
    assert_eq!(counts, vec![0, 0]);
}

#[test]
fn attractor_count_ignores_sign() {
    let rules = AttractionMatrix::from_rows(&[vec![0.0, 1.0], vec![-1.0, 0.0]]).unwrap();
    let ps = vec![
        Particle::new(0, NVec2::new(0.0, 0.0)),
        Particle::new(1, NVec2::new(0.02, 0.0)),
        Particle::new(1, NVec2::new(0.0, 0.03)),
        Particle::new(1, NVec2::new(0.5, 0.5)),
    ];
    let (_, counts) = forces_of(&DirectSum::default(), &test_setting(0.05), &rules, &World::default(), &ps);
    assert_eq!(counts[0], 2);
    assert_eq!(counts[3], 0);
}

// ==================================================================================
// Accumulator tests
// ==================================================================================

#[test]
fn grid_matches_direct_for_every_metric() {
    let rules = AttractionMatrix::preset(AttractionPreset::Chain, 4, 4);
    let ps = population(1500, 4, GeneratorKind::Uniform);

    for world in [World::toroidal(1.0), World::open()] {
        for metric in DistanceFunction::ALL {
            let setting = VelocityUpdateSetting {
                distance_function: metric,
                ..test_setting(0.06)
            };
            let (fd, cd) = forces_of(&DirectSum::default(), &setting, &rules, &world, &ps);
            let (fg, cg) = forces_of(&GridSum::default(), &setting, &rules, &world, &ps);
            assert_eq!(cd, cg, "{metric} wrap={}", world.wrap);
            for (a, b) in fd.iter().zip(fg.iter()) {
                assert!((a - b).norm() <= 1e-4 * (1.0 + a.norm()), "{metric}: {a:?} vs {b:?}");
            }
        }
    }
}

#[test]
fn grid_falls_back_on_a_small_torus() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let setting = test_setting(0.8);
    let world = World::toroidal(1.0);
    let ps = population(50, 1, GeneratorKind::Uniform);
    let (fd, cd) = forces_of(&DirectSum::default(), &setting, &rules, &world, &ps);
    let (fg, cg) = forces_of(&GridSum::default(), &setting, &rules, &world, &ps);
    assert_eq!(fd, fg);
    assert_eq!(cd, cg);
}

#[test]
fn grid_on_a_torus_with_tiny_rmax_matches_direct() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let setting = test_setting(1e-6);
    let world = World::toroidal(1.0);
    let mut ps = population(200, 1, GeneratorKind::Uniform);
    // one pair close enough to interact
    ps.push(Particle::new(0, NVec2::new(0.25, 0.25)));
    ps.push(Particle::new(0, NVec2::new(0.25 + 6e-7, 0.25)));

    let (fd, cd) = forces_of(&DirectSum::default(), &setting, &rules, &world, &ps);
    let (fg, cg) = forces_of(&GridSum::default(), &setting, &rules, &world, &ps);
    assert_eq!(cd, cg);
    assert_eq!(cd[200], 1);
    for (a, b) in fd.iter().zip(fg.iter()) {
        assert!((a - b).norm() <= 1e-4 * (1.0 + a.norm()), "{a:?} vs {b:?}");
    }

    let engine = Engine {
        parallel: false,
        ..Engine::default()
    };
    let mut s = Scenario::new(engine, world, setting, rules, ps).unwrap();
    s.step().unwrap();
    assert_eq!(s.ticks(), 1);
}

#[test]
fn parallel_sums_are_bit_identical() {
    let rules = AttractionMatrix::preset(AttractionPreset::Snake, 6, 6);
    let ps = population(2000, 6, GeneratorKind::RainbowRing);
    let setting = test_setting(0.05);
    let world = World::default();

    let seq = forces_of(&DirectSum { parallel: false }, &setting, &rules, &world, &ps);
    let par = forces_of(&DirectSum { parallel: true }, &setting, &rules, &world, &ps);
    assert_eq!(seq, par);

    let seq = forces_of(&GridSum { parallel: false }, &setting, &rules, &world, &ps);
    let par = forces_of(&GridSum { parallel: true }, &setting, &rules, &world, &ps);
    assert_eq!(seq, par);
}

// ==================================================================================
// Integrator / scenario tests
// ==================================================================================

#[test]
fn zero_rules_reduce_to_pure_decay() {
    let setting = test_setting(0.05);
    let ps = vec![
        Particle::with_velocity(0, NVec2::new(0.0, 0.0), NVec2::new(0.2, -0.1)),
        Particle::with_velocity(1, NVec2::new(0.01, 0.0), NVec2::new(0.0, 0.3)),
    ];
    let mut s = Scenario::new(direct_engine(), World::open(), setting, AttractionMatrix::new(2), ps.clone())
        .unwrap();

    // short-range repulsion still acts, so keep the pair apart
    let mut s_far = Scenario::new(
        direct_engine(),
        World::open(),
        setting,
        AttractionMatrix::new(2),
        vec![ps[0], Particle::with_velocity(1, NVec2::new(5.0, 5.0), NVec2::new(0.0, 0.3))],
    )
    .unwrap();

    let dt = setting.velocity_half_life;
    s_far.tick(dt).unwrap();
    let p = s_far.particles()[0];
    assert!((p.velocity - NVec2::new(0.1, -0.05)).norm() < 1e-6);
    assert!((p.position - NVec2::new(0.1, -0.05) * dt).norm() < 1e-6);

    for _ in 0..3 {
        s_far.tick(dt).unwrap();
    }
    let speed = s_far.particles()[1].velocity.norm();
    assert!((speed - 0.3 / 16.0).abs() < 1e-6);

    // with a neighbour inside the repulsion zone the pair is pushed apart
    s.tick(dt).unwrap();
    assert!(s.particles()[0].velocity.x < 0.2 * 0.5);
}

#[test]
fn repulsive_pair_separates_and_settles() {
    let mut rules = AttractionMatrix::new(1);
    rules.set(0, 0, -1.0).unwrap();
    let setting = VelocityUpdateSetting {
        rmax: 10.0,
        velocity_half_life: 0.1,
        ..VelocityUpdateSetting::default()
    };
    let mut s = Scenario::new(direct_engine(), World::open(), setting, rules, two_particles(1.0, 0, 0)).unwrap();
    let separation = |s: &Scenario| (s.particles()[1].position - s.particles()[0].position).norm();

    s.tick(0.01).unwrap();
    let p = s.particles();
    assert!(p[0].velocity.x < 0.0 && p[1].velocity.x > 0.0);

    let mut last = separation(&s);
    for _ in 0..100 {
        s.tick(0.01).unwrap();
        let now = separation(&s);
        assert!(now > last, "separation shrank: {last} -> {now}");
        last = now;
    }

    for _ in 0..20_000 {
        s.tick(0.01).unwrap();
    }
    let settled = separation(&s);
    assert!((settled - 10.0).abs() < 0.1, "settled at {settled}");
    s.tick(0.01).unwrap();
    assert!((separation(&s) - settled).abs() < 1e-3);
}

#[test]
fn ticks_are_deterministic() {
    let cfg = "
engine:
  parallel: true
  fixed_dt: 0.01
rules:
  colors: 5
  preset: chain
particles:
  generator: rainbow_ring
  count: 1500
  fixed: true
";
    let mut a = Scenario::build_scenario(ScenarioConfig::from_yaml(cfg).unwrap()).unwrap();
    let mut b = Scenario::build_scenario(ScenarioConfig::from_yaml(cfg).unwrap()).unwrap();
    for _ in 0..20 {
        a.step().unwrap();
        b.step().unwrap();
    }
    assert_eq!(a.particles(), b.particles());
    assert_eq!(a.ticks(), 20);
    assert!((a.time() - 0.2).abs() < 1e-5);
}

#[test]
fn degenerate_tick_is_not_committed() {
    let setting = VelocityUpdateSetting {
        rmax: 0.05,
        force_factor: 1e30,
        ..VelocityUpdateSetting::default()
    };
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let mut s = Scenario::new(direct_engine(), World::open(), setting, rules, two_particles(0.01, 0, 0)).unwrap();
    let before = s.particles().to_vec();

    let err = s.tick(1e10).unwrap_err();
    assert!(matches!(err, SimulationError::NumericDegeneration { tick: 0, .. }), "{err}");
    assert_eq!(s.particles(), before.as_slice());
    assert_eq!(s.ticks(), 0);
    assert_eq!(s.time(), 0.0);
    assert_eq!(s.statistics().nan_count, 0);
}

#[test]
fn attractor_count_is_published_with_the_tick() {
    let rules = AttractionMatrix::preset(AttractionPreset::Identity, 1, 1);
    let ps = vec![
        Particle::new(0, NVec2::new(0.0, 0.0)),
        Particle::new(0, NVec2::new(0.02, 0.0)),
        Particle::new(0, NVec2::new(0.9, 0.9)),
    ];
    let mut s = Scenario::new(direct_engine(), World::default(), test_setting(0.05), rules, ps).unwrap();
    assert!(s.particles().iter().all(|p| p.attractor_count == 0));
    s.tick(0.001).unwrap();
    let counts: Vec<u32> = s.particles().iter().map(|p| p.attractor_count).collect();
    assert_eq!(counts, vec![1, 1, 0]);
}

#[test]
fn statistics_count_colours() {
    let cfg = "
rules:
  colors: 3
particles:
  generator: uniform
  count: 10
  fixed: true
";
    let s = Scenario::build_scenario(ScenarioConfig::from_yaml(cfg).unwrap()).unwrap();
    let stats = s.statistics();
    assert_eq!(stats.particle_count, 10);
    assert_eq!(stats.color_counts, vec![4, 3, 3]);
    assert!(stats.to_string().starts_with("particleCount: 10"));
}

// ==================================================================================
// Configuration rejection tests
// ==================================================================================

#[test]
fn invalid_configuration_is_rejected_before_the_first_tick() {
    let base = "
rules:
  colors: 2
particles:
  count: 10
  fixed: true
";
    let cases = [
        ("setting:\n  rmax: 0.0\n", "rmax"),
        ("setting:\n  velocity_half_life: -1.0\n", "half-life"),
        ("setting:\n  distance_function: l3\n", "distance"),
        ("setting:\n  rmax: 1.5\n", "exceeds"),
        ("world:\n  half_extent: 0.0\n", "half extent"),
        ("engine:\n  fixed_dt: 0.0\n", "time step"),
    ];
    for (extra, needle) in cases {
        let cfg = ScenarioConfig::from_yaml(&format!("{base}{extra}")).unwrap();
        let err = Scenario::build_scenario(cfg).unwrap_err();
        assert!(err.to_string().contains(needle), "{extra}: {err}");
    }
}

#[test]
fn rule_swaps_cannot_smuggle_non_finite_coefficients() {
    let mut s = Scenario::new(
        direct_engine(),
        World::default(),
        test_setting(0.05),
        AttractionMatrix::new(2),
        two_particles(0.03, 0, 1),
    )
    .unwrap();

    let mut bad = AttractionMatrix::new(2);
    let err = bad.set(0, 0, f32::NAN).unwrap_err();
    assert_eq!(err, ConfigError::NonFiniteCoefficient { row: 0, col: 0 });
    assert!(AttractionMatrix::from_flat(2, vec![0.0, f32::INFINITY, 0.0, 0.0]).is_err());

    let err = s.set_rules(AttractionMatrix::new(0)).unwrap_err();
    assert!(matches!(err, SimulationError::Config(ConfigError::MatrixDimensions { .. })));
    assert_eq!(s.rules().colors(), 2);

    s.set_rules(bad).unwrap();
    s.step().unwrap();
    assert_eq!(s.ticks(), 1);
}

#[test]
fn too_many_particles_are_rejected() {
    let ps = vec![Particle::new(0, NVec2::zeros()); plife::MAX_PARTICLES + 1];
    let err = Scenario::new(direct_engine(), World::default(), test_setting(0.05), AttractionMatrix::new(1), ps)
        .unwrap_err();
    assert!(matches!(err, SimulationError::Config(ConfigError::TooManyParticles { .. })));
}

#[test]
fn non_finite_initial_state_is_rejected() {
    let ps = vec![Particle::with_velocity(0, NVec2::zeros(), NVec2::new(f32::NAN, 0.0))];
    let err = Scenario::new(direct_engine(), World::default(), test_setting(0.05), AttractionMatrix::new(1), ps)
        .unwrap_err();
    assert!(matches!(err, SimulationError::Config(ConfigError::NonFiniteParticle(0))));
}

#[test]
fn bundled_scenarios_build() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    for name in ["default.yaml", "rainbow_ring.yaml", "repulsion_pair.yaml", "command.yaml"] {
        let text = std::fs::read_to_string(dir.join(name)).unwrap();
        let cfg = ScenarioConfig::from_yaml(&text).unwrap();
        let mut s = Scenario::build_scenario(cfg).unwrap_or_else(|e| panic!("{name}: {e}"));
        s.step().unwrap();
    }
}
