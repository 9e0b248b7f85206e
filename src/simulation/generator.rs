//! Initial particle populations.
//!
//! Layouts are produced on `[-1, 1)^2` and scaled by the world half extent.
//! A `fixed` generator is reproducible: seeded RNG and identity colour palette.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::attraction::MAX_COLORS;
use crate::simulation::states::{NVec2, Particle, MAX_PARTICLES};

/// Seed of every `fixed` generator.
pub const FIXED_SEED: u64 = 20_240_816;

/// Named particle colours, in rule-table index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
}

impl Color {
    pub const ALL: [Color; MAX_COLORS] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::Yellow => "yellow",
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        match self {
            Color::Red => [1.0, 0.0, 0.0],
            Color::Green => [0.0, 1.0, 0.0],
            Color::Blue => [0.0, 0.0, 1.0],
            Color::Cyan => [0.0, 1.0, 1.0],
            Color::Magenta => [1.0, 0.0, 1.0],
            Color::Yellow => [1.0, 1.0, 0.0],
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::Command(format!("Invalid color: {s}")))
    }
}

impl TryFrom<u32> for Color {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Color::ALL
            .get(value as usize)
            .copied()
            .ok_or(ConfigError::InvalidColorCount {
                count: value as usize + 1,
                max: MAX_COLORS,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    #[default]
    Uniform,
    Circle,      // disc of random radius around the origin
    UnitCircle,  // disc of radius 1
    Partition,   // one vertical band per colour
    RainbowRing, // one angular sector of an annulus per colour
    Grid,        // row-major lattice
    Imbalance,   // colour i drawn with weight 2^i
}

/// Maps a running index to a colour, optionally through a shuffled order.
struct ColorPalette(Vec<u32>);

impl ColorPalette {
    fn get(&self, i: usize) -> u32 {
        self.0[i % self.0.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleGenerator {
    pub kind: GeneratorKind,
    pub color_count: usize,
    pub particle_count: usize,
    pub fixed: bool,
}

impl ParticleGenerator {
    pub fn new(
        kind: GeneratorKind,
        color_count: usize,
        particle_count: usize,
        fixed: bool,
    ) -> Result<Self, ConfigError> {
        if color_count == 0 || color_count > MAX_COLORS {
            return Err(ConfigError::InvalidColorCount {
                count: color_count,
                max: MAX_COLORS,
            });
        }
        if particle_count > MAX_PARTICLES {
            return Err(ConfigError::TooManyParticles {
                count: particle_count,
                max: MAX_PARTICLES,
            });
        }
        Ok(Self {
            kind,
            color_count,
            particle_count,
            fixed,
        })
    }

    fn rng(&self) -> ChaCha8Rng {
        if self.fixed {
            ChaCha8Rng::seed_from_u64(FIXED_SEED)
        } else {
            ChaCha8Rng::from_entropy()
        }
    }

    fn palette(&self, rng: &mut ChaCha8Rng) -> ColorPalette {
        let mut order: Vec<u32> = (0..self.color_count as u32).collect();
        if !self.fixed {
            order.shuffle(rng);
        }
        ColorPalette(order)
    }

    /// Generate the population, scaled to `[-half_extent, half_extent)`.
    pub fn generate(&self, half_extent: f32) -> Vec<Particle> {
        let mut rng = self.rng();
        let palette = self.palette(&mut rng);
        let n = self.particle_count;
        let colors = self.color_count;

        let mut out = Vec::with_capacity(n);
        match self.kind {
            GeneratorKind::Uniform => {
                for i in 0..n {
                    out.push(((i % colors) as u32, uniform(&mut rng)));
                }
            }
            GeneratorKind::Circle => {
                let r = rng.gen_range(0.1..0.8);
                for i in 0..n {
                    out.push(((i % colors) as u32, in_disc(&mut rng, r)));
                }
            }
            GeneratorKind::UnitCircle => {
                for i in 0..n {
                    out.push(((i % colors) as u32, in_disc(&mut rng, 1.0)));
                }
            }
            GeneratorKind::Partition => {
                let width = 2.0 / colors as f32;
                for i in 0..n {
                    let band = (i % colors) as f32;
                    let x0 = -1.0 + width * band;
                    let x = rng.gen_range(x0..x0 + width);
                    let y = rng.gen_range(-1.0..1.0);
                    out.push((palette.get(i), NVec2::new(x, y)));
                }
            }
            GeneratorKind::RainbowRing => {
                let sector = std::f32::consts::TAU / colors as f32;
                let (r0, dr) = if self.fixed {
                    (0.5, 0.2)
                } else {
                    (rng.gen_range(0.2..0.6), rng.gen_range(0.05..0.3))
                };
                for i in 0..n {
                    let c = (i % colors) as f32;
                    let r = rng.gen_range(r0..r0 + dr);
                    let theta = rng.gen_range(sector * c..sector * (c + 1.0));
                    out.push((palette.get(i), NVec2::new(r * theta.cos(), r * theta.sin())));
                }
            }
            GeneratorKind::Grid => {
                let rows = (n as f32).sqrt().ceil().max(1.0) as usize;
                let gap = 2.0 / rows as f32;
                for i in 0..n {
                    let (row, col) = (i / rows, i % rows);
                    let x = -1.0 + col as f32 * gap + gap / 2.0;
                    let y = -1.0 + (rows - row - 1) as f32 * gap + gap / 2.0;
                    out.push((palette.get(i), NVec2::new(x, y)));
                }
            }
            GeneratorKind::Imbalance => {
                let total: u32 = (1 << colors) - 1;
                for _ in 0..n {
                    // floor(log2(k)) for k uniform in 1..=2^colors - 1
                    let k = rng.gen_range(1..=total);
                    let c = 31 - k.leading_zeros();
                    out.push((palette.get(c as usize), uniform(&mut rng)));
                }
            }
        }

        out.into_iter()
            .map(|(color, p)| Particle::new(color, p * half_extent))
            .collect()
    }
}

fn uniform<R: Rng>(rng: &mut R) -> NVec2 {
    NVec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
}

fn in_disc<R: Rng>(rng: &mut R, r: f32) -> NVec2 {
    loop {
        let p = NVec2::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
        if p.norm_squared() <= r * r {
            return p;
        }
    }
}

/// Most line errors reported in one message.
const MAX_REPORTED_ERRORS: usize = 5;

/// Parse a particle list, one `<color> <x> <y>` per line.
///
/// `#` starts a comment and blank lines are skipped. Positions are taken as
/// world coordinates. All bad lines are reported together.
pub fn parse_command(text: &str) -> Result<Vec<Particle>, ConfigError> {
    let mut particles = Vec::new();
    let mut errors = Vec::new();

    for (i, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(p)) => particles.push(p),
            Ok(None) => {}
            Err(msg) => errors.push(format!("Line {}: {msg}", i + 1)),
        }
    }

    if errors.is_empty() {
        return Ok(particles);
    }
    let extra = errors.len().saturating_sub(MAX_REPORTED_ERRORS);
    errors.truncate(MAX_REPORTED_ERRORS);
    if extra > 0 {
        errors.push(format!("({extra} more errors)"));
    }
    Err(ConfigError::Command(errors.join("\n")))
}

fn parse_line(line: &str) -> Result<Option<Particle>, String> {
    let command = line.split('#').next().unwrap_or_default();
    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        [] => Ok(None),
        [color, x, y] => {
            let color: Color = color.parse().map_err(|_| format!("Invalid color: {color}"))?;
            let x: f32 = x.parse().map_err(|_| format!("Invalid x: {x}"))?;
            let y: f32 = y.parse().map_err(|_| format!("Invalid y: {y}"))?;
            if !(x.is_finite() && y.is_finite()) {
                return Err(format!("Non-finite position: {x} {y}"));
            }
            Ok(Some(Particle::new(color.index(), NVec2::new(x, y))))
        }
        _ => Err(format!("Invalid command: {parts:?}")),
    }
}
