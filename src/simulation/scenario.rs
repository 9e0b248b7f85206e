//! Build fully-initialized simulation sessions from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario`
//! containing:
//! - engine settings (`Engine`) and the force accumulator they select
//! - the per-tick physics setting (`VelocityUpdateSetting`) and `World`
//! - the colour-pair rule table (`AttractionMatrix`)
//! - the double-buffered particle state (`System`) at t = 0
//!
//! All configuration is validated here, before the first tick. Settings and
//! rules can be swapped between ticks through the `set_*` methods.

use std::fmt::Write as _;

use log::{debug, error, info};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::configuration::config::ScenarioConfig;
use crate::error::{ConfigError, Result};
use crate::simulation::attraction::AttractionMatrix;
use crate::simulation::engine::Engine;
use crate::simulation::forces::{ForceAccumulator, Interaction};
use crate::simulation::integrator::half_life_integrator;
use crate::simulation::params::{VelocityUpdateSetting, World};
use crate::simulation::states::{Particle, Statistics, System};
use crate::visualization::viewport::Viewport;

/// A running particle-life session.
pub struct Scenario {
    pub engine: Engine,
    pub viewport: Option<Viewport>,
    setting: VelocityUpdateSetting,
    rules: AttractionMatrix,
    world: World,
    system: System,
    accumulator: Box<dyn ForceAccumulator + Send + Sync>,
    pool: Option<ThreadPool>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("engine", &self.engine)
            .field("setting", &self.setting)
            .field("world", &self.world)
            .field("particles", &self.system.len())
            .field("ticks", &self.system.ticks)
            .finish()
    }
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        let engine = cfg.engine.to_engine()?;
        let world = cfg.world.to_world()?;
        let setting = cfg.setting.to_setting()?;
        let rules = cfg.rules.to_matrix()?;
        let particles = cfg.particles.to_particles(rules.colors(), world.half_extent)?;
        let viewport = cfg.viewport.as_ref().map(|v| v.to_viewport()).transpose()?;

        let mut scenario = Self::new(engine, world, setting, rules, particles)?;
        scenario.viewport = viewport;
        Ok(scenario)
    }

    /// Assemble a session from runtime values, validating all of them.
    pub fn new(
        engine: Engine,
        world: World,
        setting: VelocityUpdateSetting,
        rules: AttractionMatrix,
        mut particles: Vec<Particle>,
    ) -> Result<Self> {
        engine.validate()?;
        world.validate()?;
        setting.validate()?;
        world.check_setting(&setting)?;
        rules.validate()?;
        check_colors(&particles, &rules)?;

        for p in particles.iter_mut() {
            p.position = world.wrap_position(&p.position);
        }
        let system = System::new(particles)?;

        let pool = match engine.threads {
            Some(n) => Some(ThreadPoolBuilder::new().num_threads(n).build()?),
            None => None,
        };

        info!(
            "scenario: {} particles, {} colors, {} / {}, rmax {}, grid {}, parallel {}",
            system.len(),
            rules.colors(),
            setting.force_function,
            setting.distance_function,
            setting.rmax,
            engine.spatial_grid,
            engine.parallel,
        );

        Ok(Self {
            accumulator: engine.accumulator(),
            engine,
            viewport: None,
            setting,
            rules,
            world,
            system,
            pool,
        })
    }

    /// Advance by one tick of length `dt`.
    ///
    /// On error nothing is committed: the published particles, time and tick
    /// count are those of the last successful tick.
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        let interaction = Interaction {
            setting: &self.setting,
            rules: &self.rules,
            world: &self.world,
        };
        let system = &mut self.system;
        let accumulator = self.accumulator.as_ref();
        let parallel = self.engine.parallel;

        let result = match &self.pool {
            Some(pool) => pool.install(|| half_life_integrator(system, accumulator, &interaction, dt, parallel)),
            None => half_life_integrator(system, accumulator, &interaction, dt, parallel),
        };
        if let Err(e) = &result {
            error!("tick {} rejected: {e}", self.system.ticks);
        }
        result
    }

    /// Advance by one tick of the engine's step length.
    pub fn step(&mut self) -> Result<()> {
        self.tick(self.engine.dt())
    }

    /// Replace the physics setting; takes effect at the next tick.
    pub fn set_setting(&mut self, setting: VelocityUpdateSetting) -> Result<()> {
        setting.validate()?;
        self.world.check_setting(&setting)?;
        debug!("setting updated: {setting:?}");
        self.setting = setting;
        Ok(())
    }

    /// Replace the rule table; it must be finite and cover every colour in the population.
    pub fn set_rules(&mut self, rules: AttractionMatrix) -> Result<()> {
        rules.validate()?;
        check_colors(self.system.particles(), &rules)?;
        debug!("rules updated:\n{rules}");
        self.rules = rules;
        Ok(())
    }

    pub fn setting(&self) -> &VelocityUpdateSetting {
        &self.setting
    }

    pub fn rules(&self) -> &AttractionMatrix {
        &self.rules
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Published state of the last committed tick.
    pub fn particles(&self) -> &[Particle] {
        self.system.particles()
    }

    pub fn time(&self) -> f32 {
        self.system.t
    }

    pub fn ticks(&self) -> u64 {
        self.system.ticks
    }

    pub fn statistics(&self) -> Statistics {
        self.system.statistics(self.rules.colors())
    }

    /// Rule table and setting in a human-readable form.
    pub fn dump_parameters(&self) -> String {
        let s = &self.setting;
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.rules);
        let _ = writeln!(out);
        let _ = writeln!(out, "forceFunction: {}", s.force_function);
        let _ = writeln!(out, "distanceFunction: {}", s.distance_function);
        let _ = writeln!(out, "rmax: {}", s.rmax);
        let _ = writeln!(out, "velocityHalfLife: {}", s.velocity_half_life);
        let _ = writeln!(out, "forceFactor: {}", s.force_factor);
        let _ = write!(out, "world: {}", if self.world.wrap { "wrap" } else { "open" });
        out
    }
}

fn check_colors(particles: &[Particle], rules: &AttractionMatrix) -> std::result::Result<(), ConfigError> {
    let colors = rules.colors();
    match particles.iter().position(|p| p.color as usize >= colors) {
        Some(index) => Err(ConfigError::ColorOutOfRange {
            index,
            color: particles[index].color,
            colors,
        }),
        None => Ok(()),
    }
}
