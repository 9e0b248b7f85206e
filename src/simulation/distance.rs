//! Distance metrics for the interaction cutoff.
//!
//! Every metric is non-negative, zero only at the zero vector, and never
//! smaller than the Chebyshev (L∞) distance. The last property is what lets a
//! uniform grid with cells of side `rmax` find every in-range pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::states::NVec2;

/// Metric used for the cutoff and the profile argument `r / rmax`.
///
/// `Triangular` and `Pentagonal` are not symmetric under `d -> -d`, so with
/// either of them the pair forces of two particles are not equal and
/// opposite even under a symmetric rule table. See [`Self::is_symmetric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceFunction {
    L1,
    #[default]
    L2,
    Linf,
    L05,
    L02,
    Triangular,
    Pentagonal,
}

// Outward edge normals of a regular triangle / pentagon inscribed in the unit
// circle with a vertex at +y.
const TRIANGLE_NORMALS: [[f32; 2]; 3] = [
    [-0.866_025_4, 0.5],
    [0.0, -1.0],
    [0.866_025_4, 0.5],
];
const TRIANGLE_APOTHEM: f32 = 0.5;

const PENTAGON_NORMALS: [[f32; 2]; 5] = [
    [-0.587_785_3, 0.809_017],
    [-0.951_056_5, -0.309_017],
    [0.0, -1.0],
    [0.951_056_5, -0.309_017],
    [0.587_785_3, 0.809_017],
];
const PENTAGON_APOTHEM: f32 = 0.809_017;

impl DistanceFunction {
    pub const ALL: [DistanceFunction; 7] = [
        DistanceFunction::L1,
        DistanceFunction::L2,
        DistanceFunction::Linf,
        DistanceFunction::L05,
        DistanceFunction::L02,
        DistanceFunction::Triangular,
        DistanceFunction::Pentagonal,
    ];

    /// Metric length of a displacement.
    pub fn distance(self, d: &NVec2) -> f32 {
        let (ax, ay) = (d.x.abs(), d.y.abs());
        match self {
            DistanceFunction::L1 => ax + ay,
            DistanceFunction::L2 => d.norm(),
            DistanceFunction::Linf => ax.max(ay),
            DistanceFunction::L05 => p_norm(ax, ay, 0.5),
            DistanceFunction::L02 => p_norm(ax, ay, 0.2),
            DistanceFunction::Triangular => polygon_gauge(d, &TRIANGLE_NORMALS, TRIANGLE_APOTHEM),
            DistanceFunction::Pentagonal => polygon_gauge(d, &PENTAGON_NORMALS, PENTAGON_APOTHEM),
        }
    }

    /// Whether `distance(d) == distance(-d)` for every `d`.
    ///
    /// The odd-sided polygons are not centrally symmetric.
    pub fn is_symmetric(self) -> bool {
        !matches!(self, DistanceFunction::Triangular | DistanceFunction::Pentagonal)
    }

    pub fn name(self) -> &'static str {
        match self {
            DistanceFunction::L1 => "l1",
            DistanceFunction::L2 => "l2",
            DistanceFunction::Linf => "linf",
            DistanceFunction::L05 => "l05",
            DistanceFunction::L02 => "l02",
            DistanceFunction::Triangular => "triangular",
            DistanceFunction::Pentagonal => "pentagonal",
        }
    }
}

/// `x^p` with `0^p := 0`.
#[inline]
fn pow_or_zero(x: f32, p: f32) -> f32 {
    if x == 0.0 {
        0.0
    } else {
        x.powf(p)
    }
}

/// `(ax^p + ay^p)^(1/p)`, factored by the larger component so tiny or huge
/// inputs neither underflow nor overflow.
#[inline]
fn p_norm(ax: f32, ay: f32, p: f32) -> f32 {
    let m = ax.max(ay);
    if m == 0.0 {
        return 0.0;
    }
    let s = pow_or_zero(ax / m, p) + pow_or_zero(ay / m, p);
    m * s.powf(1.0 / p)
}

/// Smallest `t` with `d / t` on the polygon boundary.
#[inline]
fn polygon_gauge(d: &NVec2, normals: &[[f32; 2]], apothem: f32) -> f32 {
    let support = normals
        .iter()
        .map(|n| n[0] * d.x + n[1] * d.y)
        .fold(0.0_f32, f32::max);
    support / apothem
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceFunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistanceFunction::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDistanceFunction(s.to_string()))
    }
}

/// Selector order of the fixed-layout enum.
impl TryFrom<u32> for DistanceFunction {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        DistanceFunction::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| ConfigError::UnknownDistanceFunction(value.to_string()))
    }
}
