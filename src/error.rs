//! Error types for the particle-life kernel.
//!
//! Configuration problems are rejected when a setting, rule table, or
//! population is applied. Simulation errors are raised by a tick and leave the
//! published particle buffer untouched.

use std::collections::TryReserveError;

use thiserror::Error;

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("rmax must be positive and finite, got {0}")]
    InvalidRmax(f32),

    #[error("velocity half-life must be positive and finite, got {0}")]
    InvalidHalfLife(f32),

    #[error("force factor must be finite, got {0}")]
    InvalidForceFactor(f32),

    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),

    #[error("world half extent must be positive and finite, got {0}")]
    InvalidWorld(f32),

    #[error("rmax {rmax} exceeds the wrapping world half extent {half_extent}")]
    RmaxExceedsWorld { rmax: f32, half_extent: f32 },

    #[error("invalid viewport: {0}")]
    InvalidViewport(String),

    #[error("unknown force function: {0}")]
    UnknownForceFunction(String),

    #[error("unknown distance function: {0}")]
    UnknownDistanceFunction(String),

    #[error("attraction matrix for {colors} colors needs {expected} entries, got {actual}")]
    MatrixDimensions {
        colors: usize,
        expected: usize,
        actual: usize,
    },

    #[error("attraction coefficient at ({row}, {col}) is not finite")]
    NonFiniteCoefficient { row: usize, col: usize },

    #[error("color index {index} outside the {colors}-color rule table")]
    ColorIndexOutOfRange { index: usize, colors: usize },

    #[error("particle {index} has color {color} outside the {colors}-color rule table")]
    ColorOutOfRange {
        index: usize,
        color: u32,
        colors: usize,
    },

    #[error("particle count {count} exceeds the maximum of {max}")]
    TooManyParticles { count: usize, max: usize },

    #[error("color count must be in 1..={max}, got {count}")]
    InvalidColorCount { count: usize, max: usize },

    #[error("particle {0} has a non-finite initial state")]
    NonFiniteParticle(usize),

    #[error("{0}")]
    Command(String),
}

/// Errors surfaced by a simulation tick or session construction.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A tick produced NaN or infinite state; it was not committed.
    #[error("non-finite state for particle {index} during tick {tick}")]
    NumericDegeneration { index: usize, tick: u64 },

    #[error("failed to allocate particle buffers: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
