pub mod error;
pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use error::{ConfigError, Result, SimulationError};

pub use simulation::states::{Particle, System, Statistics, NVec2, MAX_PARTICLES};
pub use simulation::params::{VelocityUpdateSetting, World};
pub use simulation::distance::DistanceFunction;
pub use simulation::forces::{ForceFunction, ForceAccumulator, Interaction, DirectSum, GridSum, BETA};
pub use simulation::attraction::{AttractionMatrix, AttractionPreset, AttractionUpdate, LineUpdate, MAX_COLORS};
pub use simulation::generator::{Color, GeneratorKind, ParticleGenerator, parse_command};
pub use simulation::integrator::half_life_integrator;
pub use simulation::engine::Engine;
pub use simulation::scenario::Scenario;

pub use configuration::config::{EngineConfig, WorldConfig, SettingConfig, RulesConfig, ParticlesConfig, ViewportConfig, ScenarioConfig};

pub use visualization::viewport::{Transform, Rect2, Viewport, tile_offsets};
pub use visualization::headless::{run_headless, visible_count, RunReport};

pub use benchmark::benchmark::{bench_accumulators, bench_tick_curve};
