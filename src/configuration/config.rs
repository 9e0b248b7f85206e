//! Configuration types for loading particle-life scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`EngineConfig`]    – accumulator choice, parallelism, tick clock
//! - [`WorldConfig`]     – torus or open plane, and its half extent
//! - [`SettingConfig`]   – force/distance selectors and physics knobs
//! - [`RulesConfig`]     – the colour-pair attraction table
//! - [`ParticlesConfig`] – initial population (generator, list, or command text)
//! - [`ViewportConfig`]  – optional camera for the headless culling stats
//! - [`ScenarioConfig`]  – top-level wrapper used to load a scenario from YAML
//!
//! Every section except `rules` and `particles` may be omitted.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   spatial_grid: true
//!   parallel: true
//!   fps: 60.0
//!   ticks: 600
//!
//! world:
//!   wrap: true
//!   half_extent: 1.0
//!
//! setting:
//!   force_function: force2   # or 0..=2
//!   distance_function: l2    # or 0..=6
//!   rmax: 0.05
//!   velocity_half_life: 0.1
//!   force_factor: 1.0
//!
//! rules:
//!   colors: 4
//!   preset: chain            # or `matrix: [[...], ...]`
//!   updates: [negate]
//!
//! particles:
//!   generator: rainbow_ring
//!   count: 4000
//!   fixed: true
//! ```
//!
//! The scenario builder maps this configuration into runtime types and
//! validates every value before the first tick.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::simulation::attraction::{AttractionMatrix, AttractionPreset, AttractionUpdate, MAX_COLORS};
use crate::simulation::distance::DistanceFunction;
use crate::simulation::engine::Engine;
use crate::simulation::forces::ForceFunction;
use crate::simulation::generator::{parse_command, GeneratorKind, ParticleGenerator};
use crate::simulation::params::{VelocityUpdateSetting, World};
use crate::simulation::states::{NVec2, Particle};
use crate::visualization::viewport::{Rect2, Transform, Viewport};

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub spatial_grid: bool, // `true` - uniform grid neighbour search, `false` - direct N^2 summation
    pub parallel: bool, // spread per-particle force sums over worker threads
    pub threads: Option<usize>, // size of a dedicated worker pool
    pub fps: f32, // ticks per unit of simulated time
    pub fixed_dt: Option<f32>, // explicit step length, overrides 1 / fps
    pub ticks: u64, // ticks for a headless run
}

impl Default for EngineConfig {
    fn default() -> Self {
        let e = Engine::default();
        Self {
            spatial_grid: e.spatial_grid,
            parallel: e.parallel,
            threads: e.threads,
            fps: e.fps,
            fixed_dt: e.fixed_dt,
            ticks: e.ticks,
        }
    }
}

impl EngineConfig {
    pub fn to_engine(&self) -> Result<Engine, ConfigError> {
        let engine = Engine {
            spatial_grid: self.spatial_grid,
            parallel: self.parallel,
            threads: self.threads,
            fps: self.fps,
            fixed_dt: self.fixed_dt,
            ticks: self.ticks,
        };
        engine.validate()?;
        Ok(engine)
    }
}

/// World topology
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub wrap: bool, // toroidal world when true
    pub half_extent: f32, // world spans [-half_extent, half_extent)
}

impl Default for WorldConfig {
    fn default() -> Self {
        let w = World::default();
        Self {
            wrap: w.wrap,
            half_extent: w.half_extent,
        }
    }
}

impl WorldConfig {
    pub fn to_world(&self) -> Result<World, ConfigError> {
        let world = World {
            wrap: self.wrap,
            half_extent: self.half_extent,
        };
        world.validate()?;
        Ok(world)
    }
}

/// Force or distance function given by name or by fixed-layout index.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Selector {
    Index(u32),
    Name(String),
}

impl Selector {
    pub fn to_force(&self) -> Result<ForceFunction, ConfigError> {
        match self {
            Selector::Index(i) => ForceFunction::try_from(*i),
            Selector::Name(s) => s.parse(),
        }
    }

    pub fn to_distance(&self) -> Result<DistanceFunction, ConfigError> {
        match self {
            Selector::Index(i) => DistanceFunction::try_from(*i),
            Selector::Name(s) => s.parse(),
        }
    }
}

/// Per-tick physics settings; unset fields take the runtime defaults.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SettingConfig {
    pub force_function: Option<Selector>,
    pub distance_function: Option<Selector>,
    pub rmax: Option<f32>, // interaction cutoff radius
    pub velocity_half_life: Option<f32>, // time for velocity to halve absent force
    pub force_factor: Option<f32>, // global force multiplier
}

impl SettingConfig {
    pub fn to_setting(&self) -> Result<VelocityUpdateSetting, ConfigError> {
        let d = VelocityUpdateSetting::default();
        let setting = VelocityUpdateSetting {
            force_function: match &self.force_function {
                Some(s) => s.to_force()?,
                None => d.force_function,
            },
            distance_function: match &self.distance_function {
                Some(s) => s.to_distance()?,
                None => d.distance_function,
            },
            rmax: self.rmax.unwrap_or(d.rmax),
            velocity_half_life: self.velocity_half_life.unwrap_or(d.velocity_half_life),
            force_factor: self.force_factor.unwrap_or(d.force_factor),
        };
        setting.validate()?;
        Ok(setting)
    }
}

/// Colour-pair attraction table
#[derive(Deserialize, Debug, Clone)]
pub struct RulesConfig {
    pub colors: usize, // number of colours, 1..=6
    #[serde(default)]
    pub preset: Option<AttractionPreset>, // starting table, `zero` when unset
    #[serde(default)]
    pub matrix: Option<Vec<Vec<f32>>>, // explicit rows, overrides `preset`
    #[serde(default)]
    pub updates: Vec<AttractionUpdate>, // applied in order after the preset
    #[serde(default)]
    pub seed: Option<u64>, // seed for random updates
}

impl RulesConfig {
    pub fn to_matrix(&self) -> Result<AttractionMatrix, ConfigError> {
        if self.colors == 0 || self.colors > MAX_COLORS {
            return Err(ConfigError::InvalidColorCount {
                count: self.colors,
                max: MAX_COLORS,
            });
        }
        let mut matrix = match &self.matrix {
            Some(rows) => {
                let m = AttractionMatrix::from_rows(rows)?;
                if m.colors() != self.colors {
                    return Err(ConfigError::MatrixDimensions {
                        colors: self.colors,
                        expected: self.colors * self.colors,
                        actual: m.as_slice().len(),
                    });
                }
                m
            }
            None => AttractionMatrix::preset(
                self.preset.unwrap_or(AttractionPreset::Zero),
                self.colors,
                self.colors,
            ),
        };
        if !self.updates.is_empty() {
            let mut rng = match self.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            for update in &self.updates {
                matrix.apply(*update, &mut rng);
            }
        }
        Ok(matrix)
    }
}

/// Initial state of a single particle
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub color: u32, // rule-table index
    pub x: [f32; 2], // initial position
    #[serde(default)]
    pub v: [f32; 2], // initial velocity
}

/// Initial population. `list` wins over `command`, which wins over `generator`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ParticlesConfig {
    pub generator: Option<GeneratorKind>,
    pub count: usize,
    pub fixed: bool, // reproducible seed and palette
    pub list: Option<Vec<ParticleConfig>>,
    pub command: Option<String>, // `<color> <x> <y>` per line
}

impl ParticlesConfig {
    pub fn to_particles(&self, colors: usize, half_extent: f32) -> Result<Vec<Particle>, ConfigError> {
        if let Some(list) = &self.list {
            return Ok(list
                .iter()
                .map(|p| Particle::with_velocity(p.color, NVec2::from(p.x), NVec2::from(p.v)))
                .collect());
        }
        if let Some(text) = &self.command {
            return parse_command(text);
        }
        let generator = ParticleGenerator::new(self.generator.unwrap_or_default(), colors, self.count, self.fixed)?;
        Ok(generator.generate(half_extent))
    }
}

/// Camera given either as center + zoom or as a square visible rectangle.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ViewportConfig {
    pub center: Option<[f32; 2]>,
    pub zoom: Option<f32>,
    pub rect: Option<[f32; 4]>, // x, y, width, height
    pub screen: Option<[f32; 2]>, // width, height in pixels
}

impl ViewportConfig {
    pub fn to_viewport(&self) -> Result<Viewport, ConfigError> {
        let d = Viewport::default();
        let transform = match self.rect {
            Some([x, y, width, height]) => Transform::try_from(Rect2 { x, y, width, height })?,
            None => Transform {
                center: self.center.map(NVec2::from).unwrap_or(d.transform.center),
                zoom: self.zoom.unwrap_or(d.transform.zoom),
            },
        };
        let screen = self.screen.map(NVec2::from).unwrap_or(d.screen);
        Viewport::new(transform, screen)
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub setting: SettingConfig,
    pub rules: RulesConfig,
    pub particles: ParticlesConfig,
    #[serde(default)]
    pub viewport: Option<ViewportConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
