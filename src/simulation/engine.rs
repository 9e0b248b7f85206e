//! High-level runtime engine settings
//!
//! Selects the force accumulator (direct or grid), parallelism, and the
//! tick clock used when building and running a `Scenario`

use crate::error::ConfigError;
use crate::simulation::forces::{DirectSum, ForceAccumulator, GridSum};

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub spatial_grid: bool, // false = direct O(n^2), true = uniform grid
    pub parallel: bool, // per-particle force sums on the rayon pool
    pub threads: Option<usize>, // dedicated pool size, global pool when None
    pub fps: f32, // ticks per second of simulated time
    pub fixed_dt: Option<f32>, // overrides 1 / fps
    pub ticks: u64, // default run length for the headless runner
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            spatial_grid: true,
            parallel: true,
            threads: None,
            fps: 60.0,
            fixed_dt: None,
            ticks: 600,
        }
    }
}

impl Engine {
    /// Step length of one tick.
    pub fn dt(&self) -> f32 {
        self.fixed_dt.unwrap_or(1.0 / self.fps)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.dt();
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        Ok(())
    }

    pub fn accumulator(&self) -> Box<dyn ForceAccumulator + Send + Sync> {
        if self.spatial_grid {
            Box::new(GridSum { parallel: self.parallel })
        } else {
            Box::new(DirectSum { parallel: self.parallel })
        }
    }
}
