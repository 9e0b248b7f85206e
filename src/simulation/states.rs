//! Core state types for the particle-life simulation.
//!
//! - `Particle`: fixed-layout particle record (colour, position, velocity,
//!   neighbour count from the last force pass)
//! - `System`: double-buffered particle population plus simulation time
//! - `Statistics`: buffer health summary (colour counts, NaN / infinite entries)

use std::fmt;

use bytemuck::{Pod, Zeroable};
use nalgebra::Vector2;

use crate::error::{ConfigError, Result};

pub type NVec2 = Vector2<f32>;

/// Largest population a session accepts.
pub const MAX_PARTICLES: usize = 65_536;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub color: u32, // index into the attraction matrix
    pub position: NVec2, // world position
    pub velocity: NVec2, // world units per unit time
    pub attractor_count: u32, // neighbours within rmax during the last force pass
}

impl Particle {
    pub fn new(color: u32, position: NVec2) -> Self {
        Self::with_velocity(color, position, NVec2::zeros())
    }

    pub fn with_velocity(color: u32, position: NVec2, velocity: NVec2) -> Self {
        Self {
            color,
            position,
            velocity,
            attractor_count: 0,
        }
    }

    pub fn has_nan(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).any(|c| c.is_nan())
    }

    pub fn has_infinite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).any(|c| c.is_infinite())
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }

    /// Raw bytes of a particle slice, for bulk transfer to a compute backend.
    pub fn as_bytes(particles: &[Particle]) -> &[u8] {
        bytemuck::cast_slice(particles)
    }
}

/// Double-buffered particle population.
///
/// `front` is the published state for the current tick. A tick reads only
/// `front` and writes the next state into `back`; `swap` commits it.
#[derive(Debug, Clone)]
pub struct System {
    front: Vec<Particle>,
    back: Vec<Particle>,
    forces: Vec<NVec2>, // per-particle scratch, reused every tick
    counts: Vec<u32>,
    pub t: f32, // simulation time
    pub ticks: u64, // committed ticks
}

impl System {
    pub fn new(particles: Vec<Particle>) -> Result<Self> {
        let n = particles.len();
        if n > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles {
                count: n,
                max: MAX_PARTICLES,
            }
            .into());
        }
        if let Some(index) = particles.iter().position(|p| !p.is_finite()) {
            return Err(ConfigError::NonFiniteParticle(index).into());
        }

        let mut back = Vec::new();
        back.try_reserve_exact(n)?;
        back.extend_from_slice(&particles);

        let mut forces = Vec::new();
        forces.try_reserve_exact(n)?;
        forces.resize(n, NVec2::zeros());

        let mut counts = Vec::new();
        counts.try_reserve_exact(n)?;
        counts.resize(n, 0);

        Ok(Self {
            front: particles,
            back,
            forces,
            counts,
            t: 0.0,
            ticks: 0,
        })
    }

    /// Published particle state.
    pub fn particles(&self) -> &[Particle] {
        &self.front
    }

    pub fn len(&self) -> usize {
        self.front.len()
    }

    pub fn is_empty(&self) -> bool {
        self.front.is_empty()
    }

    /// Frozen input buffer, writable output buffer and force scratch for one tick.
    pub(crate) fn split_mut(&mut self) -> (&[Particle], &mut [Particle], &mut [NVec2], &mut [u32]) {
        (&self.front, &mut self.back, &mut self.forces, &mut self.counts)
    }

    /// Commit the back buffer as the new published state.
    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    pub fn statistics(&self, colors: usize) -> Statistics {
        let mut stats = Statistics {
            particle_count: self.front.len(),
            color_counts: vec![0; colors],
            nan_count: 0,
            infinite_count: 0,
        };
        for p in &self.front {
            if p.has_nan() {
                stats.nan_count += 1;
            }
            if p.has_infinite() {
                stats.infinite_count += 1;
            }
            if let Some(c) = stats.color_counts.get_mut(p.color as usize) {
                *c += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub particle_count: usize,
    pub color_counts: Vec<usize>,
    pub nan_count: usize,
    pub infinite_count: usize,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "particleCount: {}", self.particle_count)?;
        for (color, count) in self.color_counts.iter().enumerate() {
            writeln!(f, "- color {color}: {count}")?;
        }
        writeln!(f)?;
        writeln!(f, "NaN: {}", self.nan_count)?;
        write!(f, "Infinite: {}", self.infinite_count)
    }
}
