//! Grouping of contours by reindexed label
//!
//! Every group with more than one member is a cluster: its members are the only contours
//! the splice engine ever tries to join with each other.

use contour_common::{Error, Result};
use contour_core::Rect;
use rayon::prelude::*;

/// Contour indexes grouped by reindexed label, ascending inside each group
#[derive(Debug)]
pub(crate) struct JoinedLabelsLists {
    indexes: Vec<usize>,
    offsets: Vec<usize>,
    group_of: Vec<usize>,
    cluster_rects: Vec<Option<Rect>>,
    max_list_length: usize,
}

impl JoinedLabelsLists {
    pub fn build(reindexed: &[i32]) -> Self {
        let mut indexes: Vec<usize> = (0..reindexed.len()).collect();
        // stable: members stay in ascending index order
        indexes.par_sort_by_key(|&i| reindexed[i]);

        let mut offsets = Vec::new();
        let mut group_of = vec![0; reindexed.len()];
        let mut max_list_length = 0;
        let mut start = 0;
        for (k, &index) in indexes.iter().enumerate() {
            if k > 0 && reindexed[index] != reindexed[indexes[k - 1]] {
                offsets.push(start);
                max_list_length = max_list_length.max(k - start);
                start = k;
            }
            group_of[index] = offsets.len();
        }
        if !indexes.is_empty() {
            offsets.push(start);
            max_list_length = max_list_length.max(indexes.len() - start);
        }
        offsets.push(indexes.len());

        Self {
            indexes,
            offsets,
            group_of,
            cluster_rects: Vec::new(),
            max_list_length,
        }
    }

    pub fn number_of_groups(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn number_of_clusters(&self) -> usize {
        (0..self.number_of_groups())
            .filter(|&g| self.offsets[g + 1] - self.offsets[g] > 1)
            .count()
    }

    pub fn max_list_length(&self) -> usize {
        self.max_list_length
    }

    /// Members of the group containing `contour`, `contour` included
    pub fn group_members(&self, contour: usize) -> &[usize] {
        let g = self.group_of[contour];
        &self.indexes[self.offsets[g]..self.offsets[g + 1]]
    }

    pub fn has_neighbours_to_join(&self, contour: usize) -> bool {
        let g = self.group_of[contour];
        self.offsets[g + 1] - self.offsets[g] > 1
    }

    /// Union rectangle of the cluster containing `contour`
    pub fn cluster_rect(&self, contour: usize) -> Option<Rect> {
        self.cluster_rects
            .get(self.group_of[contour])
            .copied()
            .flatten()
    }

    /// Computes the union rectangle of every cluster
    pub fn initialize_cluster_rects(&mut self, rects: &[Rect]) {
        let indexes = &self.indexes;
        let offsets = &self.offsets;
        self.cluster_rects = (0..offsets.len() - 1)
            .into_par_iter()
            .map(|g| {
                let members = &indexes[offsets[g]..offsets[g + 1]];
                if members.len() <= 1 {
                    return None;
                }
                Some(
                    members[1..]
                        .iter()
                        .fold(rects[members[0]], |r, &i| r.union(&rects[i])),
                )
            })
            .collect();
    }

    /// Largest number of grid cells any cluster needs with cells of `2^step_log` pixels
    ///
    /// With `require_31_bit`, a cluster needing `2^31` cells or more is an error.
    pub fn max_cluster_grid_size(&self, step_log: u32, require_31_bit: bool) -> Result<u64> {
        debug_assert!(step_log <= 31);
        self.cluster_rects
            .par_iter()
            .flatten()
            .map(|r| {
                let dim_x = ((r.max_x >> step_log) - (r.min_x >> step_log)) as u64 + 1;
                let dim_y = ((r.max_y >> step_log) - (r.min_y >> step_log)) as u64 + 1;
                let size = dim_x * dim_y;
                if require_31_bit && size > i32::MAX as u64 {
                    return Err(Error::capacity(format!(
                        "too large cluster: its containing rectangle {r} requires grid \
                         {dim_x}x{dim_y} >= 2^31 elements; probably you must increase \
                         grid_step_log = {step_log}"
                    )));
                }
                Ok(size)
            })
            .try_reduce(|| 0, |a, b| Ok(a.max(b)))
    }
}
