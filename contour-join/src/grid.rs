//! Visited grid and compressed contour footprints
//!
//! The grid covers one cluster's rectangle with cells of `2^step_log` pixels. Each cell holds a
//! 64-bit map of its 8x8 sub-cells, so a cell bit stands for a square of `2^(step_log - 3)`
//! pixels. A contour's footprint is the list of (cell, bitmap) pairs it touches; the grid
//! accumulates footprints of everything merged into the growing contour. An empty AND between
//! a candidate footprint and the grid proves that the candidate cannot share a segment with
//! the growing contour. A non-empty AND proves nothing.

use contour_core::Rect;

/// Smallest step usable by the grid: one bit per pixel
pub const MIN_GRID_STEP_LOG: u32 = 3;
pub const MAX_GRID_STEP_LOG: u32 = 30;
/// Starting step of the automatic choice
pub(crate) const MIN_RECOMMENDED_GRID_STEP_LOG: u32 = 4;
/// The automatic choice grows the step until the largest cluster grid fits in this many cells
pub(crate) const MAX_RECOMMENDED_GRID_SIZE: u64 = 32 * 1024 * 1024;

#[derive(Clone, Copy, Debug, Default)]
struct GridArea {
    min_x: i32,
    min_y: i32,
    dim_x: usize,
    dim_y: usize,
}

impl GridArea {
    fn of(rect: &Rect, step_log: u32) -> Self {
        let min_x = rect.min_x >> step_log;
        let min_y = rect.min_y >> step_log;
        Self {
            min_x,
            min_y,
            dim_x: ((rect.max_x >> step_log) - min_x) as usize + 1,
            dim_y: ((rect.max_y >> step_log) - min_y) as usize + 1,
        }
    }

    fn size(&self) -> usize {
        self.dim_x * self.dim_y
    }
}

/// Calls `f(cell_x, cell_y, bit)` for every point whose sub-cell differs from the previous one
#[inline]
fn for_each_sub_cell(points: &[i32], step_log: u32, mut f: impl FnMut(i32, i32, u64)) {
    let shift = step_log - 3;
    let (mut last_x, mut last_y) = (i32::MAX, i32::MAX);
    for p in points.chunks_exact(2) {
        let x_bit = p[0] >> shift;
        let y_bit = p[1] >> shift;
        if x_bit == last_x && y_bit == last_y {
            continue;
        }
        last_x = x_bit;
        last_y = y_bit;
        f(x_bit >> 3, y_bit >> 3, 1u64 << (((y_bit & 7) << 3) | (x_bit & 7)));
    }
}

/// Footprints of all members of the current cluster
#[derive(Debug, Default)]
pub(crate) struct Footprints {
    positions: Vec<usize>,
    bitmaps: Vec<u64>,
    offsets: Vec<usize>,
}

impl Footprints {
    fn entries(&self, member: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        let range = self.offsets[member]..self.offsets[member + 1];
        self.positions[range.clone()]
            .iter()
            .copied()
            .zip(self.bitmaps[range].iter().copied())
    }
}

/// Occupancy bitmap of the growing contour over one cluster
#[derive(Debug)]
pub(crate) struct VisitedGrid {
    step_log: u32,
    area: GridArea,
    cells: Vec<u64>,
    non_zero: Vec<usize>,
}

impl VisitedGrid {
    pub fn new(step_log: u32) -> Self {
        debug_assert!((MIN_GRID_STEP_LOG..=MAX_GRID_STEP_LOG).contains(&step_log));
        Self {
            step_log,
            area: GridArea::default(),
            cells: Vec::new(),
            non_zero: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.area.dim_x, self.area.dim_y)
    }

    /// Resizes the grid to cover `cluster_rect` and empties it
    pub fn initialize(&mut self, cluster_rect: &Rect) {
        self.area = GridArea::of(cluster_rect, self.step_log);
        let size = self.area.size();
        if self.cells.len() < size {
            self.cells.resize(size, 0);
        }
        self.cells[..size].fill(0);
        self.non_zero.clear();
    }

    /// Builds the footprints of cluster members from their points and rectangles, in order
    ///
    /// The grid cells serve as scratch space and are left empty.
    pub fn compress<'a>(
        &mut self,
        members: impl Iterator<Item = (&'a [i32], Rect)>,
        footprints: &mut Footprints,
    ) {
        footprints.positions.clear();
        footprints.bitmaps.clear();
        footprints.offsets.clear();
        footprints.offsets.push(0);
        let step_log = self.step_log;
        for (points, rect) in members {
            let own = GridArea::of(&rect, step_log);
            let scratch = &mut self.cells[..own.size()];
            scratch.fill(0);
            for_each_sub_cell(points, step_log, |x, y, bit| {
                let gx = (x - own.min_x) as usize;
                let gy = (y - own.min_y) as usize;
                debug_assert!(gx < own.dim_x && gy < own.dim_y);
                scratch[gy * own.dim_x + gx] |= bit;
            });
            let from_x = (own.min_x - self.area.min_x) as usize;
            let from_y = (own.min_y - self.area.min_y) as usize;
            debug_assert!(from_x + own.dim_x <= self.area.dim_x);
            debug_assert!(from_y + own.dim_y <= self.area.dim_y);
            for gy in 0..own.dim_y {
                let row = (from_y + gy) * self.area.dim_x + from_x;
                for gx in 0..own.dim_x {
                    let bitmap = scratch[gy * own.dim_x + gx];
                    if bitmap != 0 {
                        footprints.positions.push(row + gx);
                        footprints.bitmaps.push(bitmap);
                    }
                }
            }
            footprints.offsets.push(footprints.positions.len());
        }
        let size = self.area.size();
        self.cells[..size].fill(0);
        self.non_zero.clear();
    }

    /// Empties the grid, touching only non-zero cells when they are few
    pub fn clear(&mut self) {
        let size = self.area.size();
        if self.non_zero.len() >= size >> 1 {
            self.cells[..size].fill(0);
        } else {
            for &position in &self.non_zero {
                self.cells[position] = 0;
            }
        }
        self.non_zero.clear();
    }

    #[inline]
    fn set(&mut self, position: usize, bitmap: u64) {
        let previous = self.cells[position];
        self.cells[position] = previous | bitmap;
        if previous == 0 {
            self.non_zero.push(position);
        }
    }

    pub fn add_footprint(&mut self, footprints: &Footprints, member: usize) {
        for (position, bitmap) in footprints.entries(member) {
            debug_assert!(bitmap != 0);
            self.set(position, bitmap);
        }
    }

    /// Whether the footprint of `member` meets any visited sub-cell
    pub fn probably_visited(&self, footprints: &Footprints, member: usize) -> bool {
        footprints
            .entries(member)
            .any(|(position, bitmap)| self.cells[position] & bitmap != 0)
    }

    /// Marks the sub-cells of arbitrary points lying in the cluster rectangle
    pub fn mark_points(&mut self, points: &[i32]) {
        let area = self.area;
        let cells = &mut self.cells;
        let non_zero = &mut self.non_zero;
        for_each_sub_cell(points, self.step_log, |x, y, bit| {
            let gx = (x - area.min_x) as usize;
            let gy = (y - area.min_y) as usize;
            debug_assert!(gx < area.dim_x && gy < area.dim_y);
            let position = gy * area.dim_x + gx;
            let previous = cells[position];
            cells[position] = previous | bit;
            if previous == 0 {
                non_zero.push(position);
            }
        });
    }
}
