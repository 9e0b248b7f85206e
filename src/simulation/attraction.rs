//! Interaction rule table.
//!
//! `AttractionMatrix[(a, b)]` is the coefficient colour `a` feels toward colour
//! `b`: positive attracts, negative repels, zero ignores. Entries need not be
//! symmetric. The kernel only reads the table; presets and bulk updates are
//! editing helpers for whoever owns the configuration.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Colours with a named palette entry.
pub const MAX_COLORS: usize = 6;

/// Editing granularity of presets and random updates.
const STEP: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct AttractionMatrix {
    colors: usize,
    values: Vec<f32>, // row-major, values[a * colors + b]
}

impl AttractionMatrix {
    /// All-zero table.
    pub fn new(colors: usize) -> Self {
        Self {
            colors,
            values: vec![0.0; colors * colors],
        }
    }

    pub fn from_flat(colors: usize, values: Vec<f32>) -> Result<Self, ConfigError> {
        let m = Self { colors, values };
        m.validate()?;
        Ok(m)
    }

    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, ConfigError> {
        let colors = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != colors) {
            return Err(ConfigError::MatrixDimensions {
                colors,
                expected: colors * colors,
                actual: colors * (colors - 1) + bad.len(),
            });
        }
        Self::from_flat(colors, rows.concat())
    }

    pub fn colors(&self) -> usize {
        self.colors
    }

    /// Coefficient colour `a` feels toward colour `b`.
    ///
    /// # Panics
    ///
    /// If either index is `>= colors()`.
    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f32 {
        assert!(a < self.colors && b < self.colors, "color ({a}, {b}) outside a {}-color table", self.colors);
        self.values[a * self.colors + b]
    }

    /// Set one coefficient; rejects indices outside the table and non-finite values.
    pub fn set(&mut self, a: usize, b: usize, value: f32) -> Result<(), ConfigError> {
        self.check_index(a)?;
        self.check_index(b)?;
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteCoefficient { row: a, col: b });
        }
        self.put(a, b, value);
        Ok(())
    }

    #[inline]
    fn put(&mut self, a: usize, b: usize, value: f32) {
        self.values[a * self.colors + b] = value;
    }

    fn check_index(&self, index: usize) -> Result<(), ConfigError> {
        if index >= self.colors {
            return Err(ConfigError::ColorIndexOutOfRange {
                index,
                colors: self.colors,
            });
        }
        Ok(())
    }

    /// At least one colour, `colors^2` entries, all finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = self.colors * self.colors;
        if self.colors == 0 || self.values.len() != expected {
            return Err(ConfigError::MatrixDimensions {
                colors: self.colors,
                expected,
                actual: self.values.len(),
            });
        }
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(k) => Err(ConfigError::NonFiniteCoefficient {
                row: k / self.colors,
                col: k % self.colors,
            }),
            None => Ok(()),
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.colors).all(|a| (a + 1..self.colors).all(|b| self.get(a, b) == self.get(b, a)))
    }

    fn modify(&mut self, mut f: impl FnMut(usize, usize, f32) -> f32) {
        for a in 0..self.colors {
            for b in 0..self.colors {
                let v = self.get(a, b);
                self.put(a, b, f(a, b, v));
            }
        }
    }

    pub fn transpose(&mut self) {
        for a in 0..self.colors {
            for b in a + 1..self.colors {
                self.values.swap(a * self.colors + b, b * self.colors + a);
            }
        }
    }

    /// Apply a bulk update in place.
    pub fn apply<R: Rng>(&mut self, update: AttractionUpdate, rng: &mut R) {
        match update {
            AttractionUpdate::Randomize => self.modify(|_, _, _| random_step(rng)),
            AttractionUpdate::SymmetricRandom => {
                for a in 0..self.colors {
                    for b in a..self.colors {
                        let v = random_step(rng);
                        self.put(a, b, v);
                        self.put(b, a, v);
                    }
                }
            }
            AttractionUpdate::Negate => self.modify(|_, _, v| -v),
            AttractionUpdate::Transpose => self.transpose(),
            AttractionUpdate::ZeroToOne => self.modify(|_, _, v| if v == 0.0 { 1.0 } else { v }),
            AttractionUpdate::ZeroToMinusOne => self.modify(|_, _, v| if v == 0.0 { -1.0 } else { v }),
        }
    }

    /// Set one row, one column, or the diagonal of the first `active` colours.
    pub fn apply_line(&mut self, line: LineUpdate, value: f32, active: usize) -> Result<(), ConfigError> {
        let active = active.min(self.colors);
        match line {
            LineUpdate::Row(a) => {
                self.check_index(a)?;
                (0..active).try_for_each(|b| self.set(a, b, value))
            }
            LineUpdate::Column(b) => {
                self.check_index(b)?;
                (0..active).try_for_each(|a| self.set(a, b, value))
            }
            LineUpdate::Diagonal => (0..active).try_for_each(|i| self.set(i, i, value)),
        }
    }

    /// Preset table for `colors` colours, with `active` of them taking part.
    pub fn preset(preset: AttractionPreset, colors: usize, active: usize) -> Self {
        let active = active.min(colors);
        let mut m = Self::new(colors);
        match preset {
            AttractionPreset::Zero => {}
            AttractionPreset::Identity => (0..colors).for_each(|i| m.put(i, i, 1.0)),
            AttractionPreset::Exclusive => {
                m.modify(|a, b, _| if a == b { 1.0 } else { -1.0 });
            }
            AttractionPreset::Chain => {
                for a in 0..active {
                    let prev = (a + active - 1) % active;
                    let next = (a + 1) % active;
                    for b in 0..active {
                        let v = if a == b {
                            1.0
                        } else if b == prev || b == next {
                            0.2
                        } else {
                            -1.0
                        };
                        m.put(a, b, v);
                    }
                }
            }
            AttractionPreset::Snake => {
                for a in 0..active {
                    let next = (a + 1) % active;
                    for b in 0..active {
                        let v = if a == b {
                            1.0
                        } else if b == next {
                            0.2
                        } else {
                            0.0
                        };
                        m.put(a, b, v);
                    }
                }
            }
            AttractionPreset::Area => (0..colors).for_each(|i| m.put(i, i, STEP)),
        }
        m
    }
}

/// Uniform draw from {-1.0, -0.9, ..., 1.0}.
fn random_step<R: Rng>(rng: &mut R) -> f32 {
    rng.gen_range(-10..=10) as f32 * STEP
}

impl fmt::Display for AttractionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in 0..self.colors {
            if a > 0 {
                writeln!(f)?;
            }
            for b in 0..self.colors {
                write!(f, "{:+.1} ", self.get(a, b))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionPreset {
    Zero,
    Identity,
    Exclusive,
    Chain,
    Snake,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionUpdate {
    Randomize,
    SymmetricRandom,
    Negate,
    Transpose,
    ZeroToOne,
    ZeroToMinusOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineUpdate {
    Row(usize),
    Column(usize),
    Diagonal,
}
