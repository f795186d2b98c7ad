//! Counters collected while joining

use serde::{Deserialize, Serialize};

/// Statistics of one [`join_into`](crate::ContourJoiner::join_into) call
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinStats {
    pub input_contours: usize,
    pub output_contours: usize,
    /// Label groups with more than one member
    pub clusters: usize,
    /// Contours belonging to some cluster
    pub clustered_contours: usize,
    /// Chosen grid step logarithm, `None` when the grid is disabled
    pub grid_step_log: Option<u32>,
    /// Candidates that passed the cheap checks and reached the exact test
    pub join_attempts: u64,
    pub successful_joins: u64,
    /// Candidates dropped by the visited-grid prune
    pub grid_rejections: u64,
    /// Candidates with no segment inside the common rectangle
    pub disjoint_rejections: u64,
    /// Candidates rejected for a co-directional common segment or no seam at all
    pub seam_rejections: u64,
    /// Split-off loops queued for later growth
    pub deferred_contours: u64,
    /// Contours that a splice reduced to nothing, such as a hole filled by its last fragment
    pub annihilated_contours: u64,
    /// Largest number of fragments merged into one output contour
    pub max_joined_fragments: usize,
    /// Longest deferred queue observed
    pub max_deferred_queue: usize,
    pub preparing_ms: u64,
    pub joining_ms: u64,
}

impl JoinStats {
    /// Share of exact attempts that ended in a splice
    pub fn success_ratio(&self) -> f64 {
        if self.join_attempts == 0 {
            0.0
        } else {
            self.successful_joins as f64 / self.join_attempts as f64
        }
    }
}
