//! Force profiles and force accumulators for the particle-life kernel
//!
//! A force profile maps a normalized distance and an attraction coefficient to
//! a radial magnitude. Accumulators sum those contributions per particle, either
//! by a direct O(n^2) scan or through a uniform spatial grid.

use std::fmt;
use std::str::FromStr;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::attraction::AttractionMatrix;
use crate::simulation::params::{VelocityUpdateSetting, World};
use crate::simulation::spatial_grid::SpatialGrid;
use crate::simulation::states::{NVec2, Particle};

/// Fraction of `rmax` below which every profile is purely repulsive.
pub const BETA: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceFunction {
    Force1,
    #[default]
    Force2,
    Force3,
}

impl ForceFunction {
    pub const ALL: [ForceFunction; 3] = [
        ForceFunction::Force1,
        ForceFunction::Force2,
        ForceFunction::Force3,
    ];

    /// Radial force magnitude for `r = distance / rmax` in `[0, 1]`.
    ///
    /// Positive pulls toward the neighbour, negative pushes away. Below `BETA`
    /// the result ignores `coefficient`; above it the result is `coefficient`
    /// times a lobe that vanishes at `BETA` and at 1.
    #[inline]
    pub fn magnitude(self, r: f32, coefficient: f32) -> f32 {
        if r < BETA {
            return r / BETA - 1.0;
        }
        let x = (r - BETA) / (1.0 - BETA);
        let lobe = match self {
            ForceFunction::Force1 => 1.0 - (2.0 * r - 1.0 - BETA).abs() / (1.0 - BETA),
            ForceFunction::Force2 => (std::f32::consts::PI * x).sin(),
            ForceFunction::Force3 => 6.75 * x * (1.0 - x) * (1.0 - x),
        };
        coefficient * lobe
    }

    pub fn name(self) -> &'static str {
        match self {
            ForceFunction::Force1 => "force1",
            ForceFunction::Force2 => "force2",
            ForceFunction::Force3 => "force3",
        }
    }
}

impl fmt::Display for ForceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForceFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForceFunction::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownForceFunction(s.to_string()))
    }
}

/// Selector order of the fixed-layout enum.
impl TryFrom<u32> for ForceFunction {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ForceFunction::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| ConfigError::UnknownForceFunction(value.to_string()))
    }
}

/// Read-only inputs of one force pass.
#[derive(Debug, Clone, Copy)]
pub struct Interaction<'a> {
    pub setting: &'a VelocityUpdateSetting,
    pub rules: &'a AttractionMatrix,
    pub world: &'a World,
}

impl Interaction<'_> {
    /// Contribution of `other` to the force on `me`, or `None` past the cutoff.
    ///
    /// Coincident particles pass the cutoff but contribute nothing.
    #[inline]
    pub fn pair_force(&self, me: &Particle, other: &Particle) -> Option<NVec2> {
        let d = self.world.displacement(&me.position, &other.position);
        let r = self.setting.distance_function.distance(&d);
        if r > self.setting.rmax {
            return None;
        }
        let len = d.norm();
        if len == 0.0 {
            return Some(NVec2::zeros());
        }
        let a = self.rules.get(me.color as usize, other.color as usize);
        let f = self.setting.force_function.magnitude(r / self.setting.rmax, a);
        Some(d * (f / len))
    }

    /// Net force on particle `i` from the candidate neighbours, with the
    /// number of neighbours inside the cutoff.
    #[inline]
    fn sum_over<I>(&self, i: usize, particles: &[Particle], candidates: I) -> (NVec2, u32)
    where
        I: IntoIterator<Item = usize>,
    {
        let me = &particles[i];
        let mut total = NVec2::zeros();
        let mut count = 0;
        for j in candidates {
            if j == i {
                continue;
            }
            if let Some(f) = self.pair_force(me, &particles[j]) {
                total += f;
                count += 1;
            }
        }
        (total * self.setting.force_factor, count)
    }
}

/// Per-particle force summation over a frozen particle buffer.
///
/// Implementations overwrite `forces[i]` and `counts[i]` for every particle
/// and must read nothing but `particles`.
pub trait ForceAccumulator {
    fn accumulate(
        &self,
        interaction: &Interaction<'_>,
        particles: &[Particle],
        forces: &mut [NVec2],
        counts: &mut [u32],
    );
}

/// Direct O(n^2) pairwise sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSum {
    pub parallel: bool,
}

impl ForceAccumulator for DirectSum {
    fn accumulate(
        &self,
        interaction: &Interaction<'_>,
        particles: &[Particle],
        forces: &mut [NVec2],
        counts: &mut [u32],
    ) {
        let n = particles.len();
        let each = |(i, (f, c)): (usize, (&mut NVec2, &mut u32))| {
            (*f, *c) = interaction.sum_over(i, particles, 0..n);
        };
        if self.parallel {
            forces.par_iter_mut().zip(counts.par_iter_mut()).enumerate().for_each(each);
        } else {
            forces.iter_mut().zip(counts.iter_mut()).enumerate().for_each(each);
        }
    }
}

/// Neighbour search through a uniform grid with cells no smaller than `rmax`.
///
/// Falls back to the direct scan when the torus is too small for a 3 x 3
/// neighbourhood of distinct cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSum {
    pub parallel: bool,
}

impl ForceAccumulator for GridSum {
    fn accumulate(
        &self,
        interaction: &Interaction<'_>,
        particles: &[Particle],
        forces: &mut [NVec2],
        counts: &mut [u32],
    ) {
        let Some(grid) = SpatialGrid::build(particles, interaction.world, interaction.setting.rmax) else {
            debug!("grid too coarse for rmax {}, using direct sum", interaction.setting.rmax);
            return DirectSum { parallel: self.parallel }.accumulate(interaction, particles, forces, counts);
        };

        let each = |(i, (f, c)): (usize, (&mut NVec2, &mut u32))| {
            (*f, *c) = interaction.sum_over(i, particles, grid.neighbors(&particles[i].position));
        };
        if self.parallel {
            forces.par_iter_mut().zip(counts.par_iter_mut()).enumerate().for_each(each);
        } else {
            forces.iter_mut().zip(counts.iter_mut()).enumerate().for_each(each);
        }
    }
}
