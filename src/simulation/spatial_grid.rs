//! # Uniform spatial grid
//!
//! Bins particles into square cells of side `>= rmax` so a force pass only
//! visits the 3 x 3 block of cells around each particle instead of the whole
//! population. Every supported metric is at least the Chebyshev distance, so
//! any pair within `rmax` is in adjacent cells.
//!
//! Storage uses the offset-array layout (compressed sparse rows):
//! `particle_indices[cell_offsets[c]..cell_offsets[c + 1]]` holds the indices
//! of the particles in cell `c`, in ascending order.
//!
//! - Toroidal world: the grid tiles `[-h, h)^2` exactly and neighbour cells
//!   wrap. It needs at least 3 cells per axis, otherwise `build` returns `None`.
//! - Open world: the grid covers the bounding box of the population.
//!
//! In both cases the cell size grows if the grid would need far more cells
//! than there are particles.

use crate::simulation::params::{wrap_vector, World};
use crate::simulation::states::{NVec2, Particle};

/// Minimum cell budget for a grid.
const MIN_CELL_BUDGET: usize = 1024;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    pub origin: NVec2, // lower-left corner of cell (0, 0)
    pub cell_size: f32,
    pub cols: usize,
    pub rows: usize,
    pub wrap: bool,
    pub cell_offsets: Vec<usize>,
    pub particle_indices: Vec<usize>,
}

impl SpatialGrid {
    /// Build a grid over `particles` for cutoff radius `rmax`.
    pub fn build(particles: &[Particle], world: &World, rmax: f32) -> Option<Self> {
        let mut grid = if world.wrap {
            let span = 2.0 * world.half_extent;
            let budget = (4 * particles.len()).max(MIN_CELL_BUDGET);
            let cells = ((span / rmax).floor() as usize).min((budget as f32).sqrt() as usize);
            if cells < 3 {
                return None;
            }
            Self {
                origin: NVec2::new(-world.half_extent, -world.half_extent),
                cell_size: span / cells as f32,
                cols: cells,
                rows: cells,
                wrap: true,
                cell_offsets: Vec::new(),
                particle_indices: Vec::new(),
            }
        } else {
            let (min, max) = compute_bbox(particles);
            let extent = max - min;
            let budget = (4 * particles.len()).max(MIN_CELL_BUDGET);

            let mut cell_size = rmax;
            let mut cols = (extent.x / cell_size).floor() as usize + 1;
            let mut rows = (extent.y / cell_size).floor() as usize + 1;
            if cols.saturating_mul(rows) > budget {
                // coarser cells keep the memory bounded; still >= rmax
                let side = (budget as f32).sqrt();
                cell_size = (extent.x.max(extent.y) / (side - 1.0)).max(rmax);
                cols = (extent.x / cell_size).floor() as usize + 1;
                rows = (extent.y / cell_size).floor() as usize + 1;
            }
            Self {
                origin: min,
                cell_size,
                cols,
                rows,
                wrap: false,
                cell_offsets: Vec::new(),
                particle_indices: Vec::new(),
            }
        };
        grid.fill(particles);
        Some(grid)
    }

    fn fill(&mut self, particles: &[Particle]) {
        let cell_count = self.cols * self.rows;

        let mut counts = vec![0usize; cell_count];
        let cells: Vec<usize> = particles.iter().map(|p| self.cell_index(&p.position)).collect();
        for &c in &cells {
            counts[c] += 1;
        }

        self.cell_offsets = Vec::with_capacity(cell_count + 1);
        let mut total = 0;
        for count in &counts {
            self.cell_offsets.push(total);
            total += count;
        }
        self.cell_offsets.push(total);

        self.particle_indices = vec![0; particles.len()];
        let mut cursor = self.cell_offsets[..cell_count].to_vec();
        for (i, &c) in cells.iter().enumerate() {
            self.particle_indices[cursor[c]] = i;
            cursor[c] += 1;
        }
    }

    /// Cell coordinates of a position, clamped into the grid.
    #[inline]
    pub fn cell_coords(&self, p: &NVec2) -> (usize, usize) {
        let p = if self.wrap { wrap_vector(p, -self.origin.x) } else { *p };
        let rel = (p - self.origin) / self.cell_size;
        let cx = (rel.x.floor().max(0.0) as usize).min(self.cols - 1);
        let cy = (rel.y.floor().max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    #[inline]
    pub fn cell_index(&self, p: &NVec2) -> usize {
        let (cx, cy) = self.cell_coords(p);
        cy * self.cols + cx
    }

    /// Particle indices stored in one cell.
    #[inline]
    pub fn cell(&self, index: usize) -> &[usize] {
        &self.particle_indices[self.cell_offsets[index]..self.cell_offsets[index + 1]]
    }

    /// Indices of every particle in the 3 x 3 block of cells around `p`.
    pub fn neighbors<'a>(&'a self, p: &NVec2) -> impl Iterator<Item = usize> + 'a {
        let (cx, cy) = self.cell_coords(p);
        (-1i64..=1)
            .flat_map(move |dy| (-1i64..=1).map(move |dx| (dx, dy)))
            .filter_map(move |(dx, dy)| self.neighbor_cell(cx, cy, dx, dy))
            .flat_map(move |c| self.cell(c).iter().copied())
    }

    #[inline]
    fn neighbor_cell(&self, cx: usize, cy: usize, dx: i64, dy: i64) -> Option<usize> {
        let (cols, rows) = (self.cols as i64, self.rows as i64);
        let (mut x, mut y) = (cx as i64 + dx, cy as i64 + dy);
        if self.wrap {
            x = x.rem_euclid(cols);
            y = y.rem_euclid(rows);
        } else if x < 0 || x >= cols || y < 0 || y >= rows {
            return None;
        }
        Some(y as usize * self.cols + x as usize)
    }
}

/// Axis-aligned bounding box of all particle positions.
fn compute_bbox(particles: &[Particle]) -> (NVec2, NVec2) {
    let mut min = NVec2::new(f32::INFINITY, f32::INFINITY);
    let mut max = NVec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in particles {
        min.x = min.x.min(p.position.x);
        min.y = min.y.min(p.position.y);
        max.x = max.x.max(p.position.x);
        max.y = max.y.max(p.position.y);
    }
    if particles.is_empty() {
        return (NVec2::zeros(), NVec2::zeros());
    }
    (min, max)
}
