//! Runtime settings consulted by the force pass and the integrator.
//!
//! `VelocityUpdateSetting` holds the per-tick physics knobs:
//! - force profile and distance metric selectors,
//! - interaction cutoff `rmax`,
//! - velocity half-life and global force factor.
//!
//! `World` describes the topology: a torus `[-h, h)^2` or an unbounded plane.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::distance::DistanceFunction;
use crate::simulation::forces::ForceFunction;
use crate::simulation::states::NVec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityUpdateSetting {
    pub force_function: ForceFunction,
    pub distance_function: DistanceFunction,
    pub rmax: f32, // interaction cutoff radius
    pub velocity_half_life: f32, // time for velocity to halve without force
    pub force_factor: f32, // global force multiplier
}

impl Default for VelocityUpdateSetting {
    fn default() -> Self {
        Self {
            force_function: ForceFunction::default(),
            distance_function: DistanceFunction::default(),
            rmax: 0.05,
            velocity_half_life: 0.1,
            force_factor: 1.0,
        }
    }
}

impl VelocityUpdateSetting {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rmax.is_finite() && self.rmax > 0.0) {
            return Err(ConfigError::InvalidRmax(self.rmax));
        }
        if !(self.velocity_half_life.is_finite() && self.velocity_half_life > 0.0) {
            return Err(ConfigError::InvalidHalfLife(self.velocity_half_life));
        }
        if !self.force_factor.is_finite() {
            return Err(ConfigError::InvalidForceFactor(self.force_factor));
        }
        Ok(())
    }

    /// Per-tick velocity multiplier `0.5^(dt / half_life)`.
    pub fn decay_factor(&self, dt: f32) -> f32 {
        0.5_f32.powf(dt / self.velocity_half_life)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub wrap: bool, // toroidal when true
    pub half_extent: f32, // torus spans [-half_extent, half_extent) on both axes
}

impl Default for World {
    fn default() -> Self {
        Self {
            wrap: true,
            half_extent: 1.0,
        }
    }
}

impl World {
    pub fn toroidal(half_extent: f32) -> Self {
        Self {
            wrap: true,
            half_extent,
        }
    }

    pub fn open() -> Self {
        Self {
            wrap: false,
            half_extent: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_extent.is_finite() && self.half_extent > 0.0) {
            return Err(ConfigError::InvalidWorld(self.half_extent));
        }
        Ok(())
    }

    /// A setting is compatible with the world if no pair can interact
    /// through two periodic images at once.
    pub fn check_setting(&self, setting: &VelocityUpdateSetting) -> Result<(), ConfigError> {
        if self.wrap && setting.rmax > self.half_extent {
            return Err(ConfigError::RmaxExceedsWorld {
                rmax: setting.rmax,
                half_extent: self.half_extent,
            });
        }
        Ok(())
    }

    /// Displacement from `from` to `to`, the shortest periodic image when wrapping.
    #[inline]
    pub fn displacement(&self, from: &NVec2, to: &NVec2) -> NVec2 {
        let d = to - from;
        if self.wrap {
            wrap_vector(&d, self.half_extent)
        } else {
            d
        }
    }

    /// Bring a position back into the torus; identity for an open world.
    #[inline]
    pub fn wrap_position(&self, p: &NVec2) -> NVec2 {
        if self.wrap {
            wrap_vector(p, self.half_extent)
        } else {
            *p
        }
    }
}

/// Wrap `value` into `[-max, max)`.
#[inline]
pub fn wrap_scalar(value: f32, max: f32) -> f32 {
    if (-max..max).contains(&value) {
        return value;
    }
    let span = 2.0 * max;
    let wrapped = value - ((value + max) / span).floor() * span;
    // rounding in the quotient can leave the result one span out
    if wrapped < -max {
        wrapped + span
    } else if wrapped >= max {
        wrapped - span
    } else {
        wrapped
    }
}

#[inline]
pub fn wrap_vector(v: &NVec2, max: f32) -> NVec2 {
    NVec2::new(wrap_scalar(v.x, max), wrap_scalar(v.y, max))
}
