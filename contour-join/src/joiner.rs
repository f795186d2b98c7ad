//! The contour joiner: entry point of the crate
//!
//! Construction does all the cheap, data-parallel work: labels are reindexed, contours are
//! grouped into clusters, rectangles and internal flags are read once and the visited grid
//! step is chosen. [`ContourJoiner::join_into`] then walks the source set in index order,
//! copying singletons and growing every cluster with the splice engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use contour_common::{Error, Result};
use contour_core::{ContourSet, Rect};
use rayon::prelude::*;

use crate::cluster::ClusterWorkspace;
use crate::config::JoinConfig;
use crate::grid::{
    MAX_GRID_STEP_LOG, MAX_RECOMMENDED_GRID_SIZE, MIN_GRID_STEP_LOG,
    MIN_RECOMMENDED_GRID_STEP_LOG,
};
use crate::labels::JoinedLabelsLists;
use crate::order::JoiningOrder;
use crate::stats::JoinStats;

type Interrupter<'a> = Box<dyn Fn() -> bool + Send + Sync + 'a>;

/// Merges contours of the same reindexed label that share boundary segments
pub struct ContourJoiner<'a> {
    pub(crate) source: &'a ContourSet,
    pub(crate) reindexed: Vec<i32>,
    pub(crate) lists: JoinedLabelsLists,
    pub(crate) rects: Vec<Rect>,
    pub(crate) internal: Vec<bool>,
    pub(crate) joining_order: JoiningOrder,
    pub(crate) pack_result: bool,
    grid_step_log: Option<u32>,
    interrupter: Option<Interrupter<'a>>,
    preparing_ms: u64,
    stats: JoinStats,
}

fn reindex(
    index: usize,
    label: i32,
    joined_labels_map: Option<&[i32]>,
    default_joined_label: i32,
) -> Result<i32> {
    if label < 0 {
        return Err(Error::invalid(format!(
            "contour #{index} has negative label {label}; object labels must be non-negative"
        )));
    }
    let Some(map) = joined_labels_map else {
        return Ok(default_joined_label);
    };
    match map.get(label as usize) {
        None => Ok(label),
        Some(&joined) if joined < 0 => Err(Error::invalid(format!(
            "joined labels map contains negative value {joined} for label {label} \
             (contour #{index})"
        ))),
        Some(&joined) => Ok(joined),
    }
}

impl<'a> ContourJoiner<'a> {
    /// Prepares joining of `source`
    ///
    /// `grid_step_log` is `None` for an automatic choice, `Some(0)` to disable the visited
    /// grid, or the logarithm of the grid cell size in `3..=30`. Labels are reindexed through
    /// `joined_labels_map`; without a map every contour gets `default_joined_label`.
    pub fn new(
        source: &'a ContourSet,
        grid_step_log: Option<u32>,
        joined_labels_map: Option<&[i32]>,
        default_joined_label: i32,
    ) -> Result<Self> {
        let start = Instant::now();
        if default_joined_label < 0 {
            return Err(Error::invalid(format!(
                "negative default joined label {default_joined_label}"
            )));
        }
        if let Some(log) = grid_step_log {
            if log != 0 && !(MIN_GRID_STEP_LOG..=MAX_GRID_STEP_LOG).contains(&log) {
                return Err(Error::invalid(format!(
                    "grid step logarithm {log} is out of range {MIN_GRID_STEP_LOG}..\
                     {MAX_GRID_STEP_LOG} (0 disables the grid)"
                )));
            }
        }
        let n = source.len();

        let reindexed = (0..n)
            .into_par_iter()
            .map(|k| reindex(k, source.label(k)?, joined_labels_map, default_joined_label))
            .collect::<Result<Vec<_>>>()?;
        let mut lists = JoinedLabelsLists::build(&reindexed);

        let (rects, internal): (Vec<Rect>, Vec<bool>) = (0..n)
            .into_par_iter()
            .map(|k| {
                let rect = source.rectangle(k)?;
                let area = rect.width() * rect.height();
                if lists.has_neighbours_to_join(k) && area > i32::MAX as i64 {
                    return Err(Error::capacity(format!(
                        "containing rectangles of contours must have area <= {} pixels, \
                         but contour #{k} is {}x{}",
                        i32::MAX,
                        rect.width(),
                        rect.height()
                    )));
                }
                Ok((rect, source.is_internal(k)?))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();

        let grid_step_log = match grid_step_log {
            Some(0) => None,
            Some(log) => {
                lists.initialize_cluster_rects(&rects);
                lists.max_cluster_grid_size(log, true)?;
                Some(log)
            }
            None => {
                lists.initialize_cluster_rects(&rects);
                let mut log = MIN_RECOMMENDED_GRID_STEP_LOG;
                while log < MAX_GRID_STEP_LOG
                    && lists.max_cluster_grid_size(log, false)? > MAX_RECOMMENDED_GRID_SIZE
                {
                    log += 1;
                }
                Some(log)
            }
        };

        let preparing_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            contours = n,
            clusters = lists.number_of_clusters(),
            max_cluster = lists.max_list_length(),
            grid_step_log,
            preparing_ms,
            "prepared contour joiner"
        );
        Ok(Self {
            source,
            reindexed,
            lists,
            rects,
            internal,
            joining_order: JoiningOrder::default(),
            pack_result: true,
            grid_step_log,
            interrupter: None,
            preparing_ms,
            stats: JoinStats::default(),
        })
    }

    pub fn with_config(source: &'a ContourSet, config: &JoinConfig) -> Result<Self> {
        let mut joiner = Self::new(
            source,
            config.grid_step_log,
            config.joined_labels_map.as_deref(),
            config.default_joined_label,
        )?;
        joiner
            .set_joining_order(config.joining_order)
            .set_pack_result(config.pack_result);
        Ok(joiner)
    }

    pub fn joining_order(&self) -> JoiningOrder {
        self.joining_order
    }

    pub fn set_joining_order(&mut self, joining_order: JoiningOrder) -> &mut Self {
        self.joining_order = joining_order;
        self
    }

    pub fn is_pack_result(&self) -> bool {
        self.pack_result
    }

    pub fn set_pack_result(&mut self, pack_result: bool) -> &mut Self {
        self.pack_result = pack_result;
        self
    }

    /// Installs a predicate polled during joining; `true` cancels the join
    pub fn set_interrupter(
        &mut self,
        interrupter: impl Fn() -> bool + Send + Sync + 'a,
    ) -> &mut Self {
        self.interrupter = Some(Box::new(interrupter));
        self
    }

    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) -> &mut Self {
        self.set_interrupter(move || flag.load(Ordering::Relaxed))
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupter.as_ref().is_some_and(|interrupted| interrupted())
    }

    /// Chosen grid step logarithm, `None` when the visited grid is disabled
    pub fn grid_step_log(&self) -> Option<u32> {
        self.grid_step_log
    }

    pub fn source(&self) -> &'a ContourSet {
        self.source
    }

    pub fn number_of_contours(&self) -> usize {
        self.source.len()
    }

    pub fn number_of_clusters(&self) -> usize {
        self.lists.number_of_clusters()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.rects.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.rects.len(),
            });
        }
        Ok(())
    }

    pub fn reindexed_label(&self, index: usize) -> Result<i32> {
        self.check_index(index)?;
        Ok(self.reindexed[index])
    }

    /// Whether contours `i` and `j` belong to the same merge group
    pub fn needs_join(&self, i: usize, j: usize) -> Result<bool> {
        self.check_index(i)?;
        self.check_index(j)?;
        Ok(self.reindexed[i] == self.reindexed[j])
    }

    /// Whether some other contour shares the reindexed label of `index`
    pub fn has_neighbours_to_join(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.lists.has_neighbours_to_join(index))
    }

    /// Union of all source rectangles, `None` for an empty source
    pub fn containing_rectangle(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.union(&b))
    }

    /// Statistics of the last join
    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    /// Appends joined contours to `result` as they are finalized
    ///
    /// On error, including cancellation, every record already appended is complete.
    pub fn join_into(&mut self, result: &mut ContourSet) -> Result<()> {
        let start = Instant::now();
        let n = self.source.len();
        let before = result.len();
        let mut workspace = ClusterWorkspace::new(n, self.grid_step_log);
        workspace.stats = JoinStats {
            input_contours: n,
            clusters: self.lists.number_of_clusters(),
            clustered_contours: (0..n)
                .filter(|&k| self.lists.has_neighbours_to_join(k))
                .count(),
            grid_step_log: self.grid_step_log,
            preparing_ms: self.preparing_ms,
            ..JoinStats::default()
        };
        let joiner = &*self;
        let outcome = (0..n)
            .try_for_each(|k| workspace.add_contour_and_continuations(joiner, k, result));
        workspace.stats.output_contours = result.len() - before;
        workspace.stats.joining_ms = start.elapsed().as_millis() as u64;
        self.stats = workspace.stats;
        if let Err(e) = &outcome {
            tracing::warn!(
                error = %e,
                written = self.stats.output_contours,
                "contour joining stopped"
            );
        }
        outcome?;
        tracing::info!(
            input = self.stats.input_contours,
            output = self.stats.output_contours,
            clusters = self.stats.clusters,
            joins = self.stats.successful_joins,
            elapsed_ms = self.stats.joining_ms,
            grid_step_log = self.grid_step_log,
            "joined contours"
        );
        Ok(())
    }

    /// Joins into a fresh contour set
    pub fn join_contours(&mut self) -> Result<ContourSet> {
        let mut result = ContourSet::new();
        self.join_into(&mut result)?;
        Ok(result)
    }
}
