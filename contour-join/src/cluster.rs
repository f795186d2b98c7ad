//! Growth of output contours inside one cluster
//!
//! A cluster is loaded once: members are unpacked into a flat buffer, their footprints are
//! compressed into the visited grid and their rectangles go into an R-tree. Then every
//! unprocessed member seeds a growing contour that absorbs overlapping neighbours until no
//! candidate can be spliced. Loops split off by a splice wait in the deferred queue and grow
//! the same way once the current contour is finished.

use contour_common::{Error, Result};
use contour_core::{pack, ContourHeader, ContourSet, Rect};

use crate::grid::{Footprints, VisitedGrid};
use crate::index::RectIndex;
use crate::joiner::ContourJoiner;
use crate::splice::{DeferredQueue, JoinContext, JoinOutcome, Splicer};
use crate::stats::JoinStats;

/// Steps between two polls of the interrupter
const CHECK_INTERRUPTION_STEP: u64 = 256;
/// Steps between two rebuilds of the visited grid from the actual points
const REVIVING_VISITED_GRID_STEP: u64 = 64;

/// Scratch state of one join call, sized for the whole source set
pub(crate) struct ClusterWorkspace {
    processed: Vec<bool>,
    members: Vec<usize>,
    member_of: Vec<usize>,
    points: Vec<i32>,
    offsets: Vec<usize>,
    unpacked: Vec<i32>,
    footprints: Footprints,
    grid: Option<VisitedGrid>,
    current_index: usize,
    current: Vec<i32>,
    current_internal: bool,
    current_rect: Rect,
    history: Vec<usize>,
    neighbours: Vec<usize>,
    in_neighbours: Vec<bool>,
    found: Vec<usize>,
    splicer: Splicer,
    deferred: DeferredQueue,
    packed: Vec<i32>,
    pub stats: JoinStats,
}

impl ClusterWorkspace {
    pub fn new(number_of_contours: usize, grid_step_log: Option<u32>) -> Self {
        Self {
            processed: vec![false; number_of_contours],
            members: Vec::new(),
            member_of: vec![0; number_of_contours],
            points: Vec::new(),
            offsets: Vec::new(),
            unpacked: Vec::new(),
            footprints: Footprints::default(),
            grid: grid_step_log.map(VisitedGrid::new),
            current_index: 0,
            current: Vec::new(),
            current_internal: false,
            current_rect: Rect::new(0, 0, 0, 0),
            history: Vec::new(),
            neighbours: Vec::new(),
            in_neighbours: vec![false; number_of_contours],
            found: Vec::new(),
            splicer: Splicer::default(),
            deferred: DeferredQueue::default(),
            packed: Vec::new(),
            stats: JoinStats::default(),
        }
    }

    /// Writes contour `k` and, when it belongs to a cluster, everything joined with it
    pub fn add_contour_and_continuations(
        &mut self,
        joiner: &ContourJoiner<'_>,
        k: usize,
        result: &mut ContourSet,
    ) -> Result<()> {
        if self.processed[k] {
            return Ok(());
        }
        let source = joiner.source;
        if !joiner.lists.has_neighbours_to_join(k) {
            let mut header = source.header(k)?;
            header.clear_touching().set_label(joiner.reindexed[k]);
            let points = source.contour_points(k)?;
            if joiner.pack_result {
                pack::pack_into(&mut self.packed, points)?;
                result.add_contour(&header, &self.packed)?;
            } else {
                result.add_contour(&header, points)?;
            }
            self.processed[k] = true;
            return Ok(());
        }
        let members = joiner.lists.group_members(k);
        debug_assert_eq!(members.first(), Some(&k));
        self.load_cluster(joiner, members)?;
        let index = RectIndex::build(members, &joiner.rects);
        self.join_cluster(joiner, &index, result)
    }

    fn load_cluster(&mut self, joiner: &ContourJoiner<'_>, members: &[usize]) -> Result<()> {
        self.members.clear();
        self.members.extend_from_slice(members);
        self.points.clear();
        self.offsets.clear();
        self.offsets.push(0);
        for (m, &index) in members.iter().enumerate() {
            self.member_of[index] = m;
            pack::unpack_into(&mut self.unpacked, joiner.source.contour_points(index)?, false)?;
            let rect = joiner.rects[index];
            let actual = Rect::of_points(&self.unpacked);
            if rect.union(&actual) != rect {
                return Err(Error::geometry(format!(
                    "points of contour #{index} lie outside its containing rectangle \
                     {rect}: actual rectangle is {actual}"
                )));
            }
            self.points.extend_from_slice(&self.unpacked);
            self.offsets.push(self.points.len());
        }
        if let Some(grid) = &mut self.grid {
            let cluster_rect = joiner.lists.cluster_rect(members[0]).ok_or_else(|| {
                Error::state("cluster rectangles were not initialized for the visited grid")
            })?;
            grid.initialize(&cluster_rect);
            let points = &self.points;
            let offsets = &self.offsets;
            grid.compress(
                members.iter().enumerate().map(|(m, &index)| {
                    (&points[offsets[m]..offsets[m + 1]], joiner.rects[index])
                }),
                &mut self.footprints,
            );
        }
        tracing::debug!(
            first = members[0],
            members = members.len(),
            points = self.points.len() / 2,
            grid = ?self.grid.as_ref().map(VisitedGrid::dimensions),
            "loaded cluster"
        );
        Ok(())
    }

    fn join_cluster(
        &mut self,
        joiner: &ContourJoiner<'_>,
        index: &RectIndex,
        result: &mut ContourSet,
    ) -> Result<()> {
        let first = self.members[0];
        let label = joiner.reindexed[first];
        let mut steps: u64 = 0;
        self.deferred.clear();
        for m in 0..self.members.len() {
            let seed = self.members[m];
            if self.processed[seed] {
                continue;
            }
            self.start_current(joiner, m, seed);
            self.add_possible_neighbours(joiner, index, seed);
            loop {
                loop {
                    steps += 1;
                    if steps % CHECK_INTERRUPTION_STEP == 0 && joiner.is_interrupted() {
                        return Err(Error::Cancelled(format!(
                            "contour joiner was interrupted while processing contour \
                             #{first}/{} after {steps} joining actions",
                            joiner.source.len()
                        )));
                    }
                    if steps % REVIVING_VISITED_GRID_STEP == 0 {
                        self.revive_grid();
                    }
                    if !self.grow(joiner, index)? || self.current.is_empty() {
                        break;
                    }
                }
                self.stats.max_joined_fragments =
                    self.stats.max_joined_fragments.max(self.history.len());
                self.stats.max_deferred_queue =
                    self.stats.max_deferred_queue.max(self.deferred.len());
                self.write_current(label, joiner.pack_result, result)?;
                match self.deferred.pop_into(&mut self.current) {
                    Some(internal) => self.current_internal = internal,
                    None => break,
                }
            }
            self.processed[seed] = true;
        }
        Ok(())
    }

    fn start_current(&mut self, joiner: &ContourJoiner<'_>, m: usize, seed: usize) {
        self.current_index = seed;
        self.current_rect = joiner.rects[seed];
        if let Some(grid) = &mut self.grid {
            grid.clear();
            grid.add_footprint(&self.footprints, m);
        }
        for &candidate in &self.neighbours {
            self.in_neighbours[candidate] = false;
        }
        self.neighbours.clear();
        self.current.clear();
        self.current
            .extend_from_slice(&self.points[self.offsets[m]..self.offsets[m + 1]]);
        self.current_internal = joiner.internal[seed];
        self.history.clear();
        self.history.push(seed);
    }

    /// Appends unprocessed members overlapping `contour` that come after the seed
    fn add_possible_neighbours(
        &mut self,
        joiner: &ContourJoiner<'_>,
        index: &RectIndex,
        contour: usize,
    ) {
        self.found.clear();
        index.find_intersecting(&joiner.rects[contour], &mut self.found);
        joiner
            .joining_order
            .sort_indexes(&mut self.found, &joiner.rects);
        for &candidate in &self.found {
            if candidate > self.current_index
                && !self.in_neighbours[candidate]
                && !self.processed[candidate]
            {
                self.in_neighbours[candidate] = true;
                self.neighbours.push(candidate);
            }
        }
    }

    /// Splices the first candidate that shares a seam with the current contour
    fn grow(&mut self, joiner: &ContourJoiner<'_>, index: &RectIndex) -> Result<bool> {
        for i in 0..self.neighbours.len() {
            let candidate = self.neighbours[i];
            if self.processed[candidate] {
                continue;
            }
            let member = self.member_of[candidate];
            if let Some(grid) = &self.grid {
                if !grid.probably_visited(&self.footprints, member) {
                    self.stats.grid_rejections += 1;
                    continue;
                }
            }
            self.stats.join_attempts += 1;
            let ctx = JoinContext {
                history: &self.history,
                joined_index: candidate,
            };
            let outcome = self.splicer.try_join(
                &mut self.current,
                &mut self.current_internal,
                &self.current_rect,
                &self.points[self.offsets[member]..self.offsets[member + 1]],
                joiner.internal[candidate],
                &joiner.rects[candidate],
                &mut self.deferred,
                &ctx,
            )?;
            match outcome {
                JoinOutcome::Spliced { deferred } => {
                    tracing::trace!(
                        current = self.current_index,
                        joined = candidate,
                        deferred,
                        points = self.current.len() / 2,
                        "spliced contour"
                    );
                    self.stats.successful_joins += 1;
                    self.stats.deferred_contours += deferred as u64;
                    self.current_rect = self.current_rect.union(&joiner.rects[candidate]);
                    self.history.push(candidate);
                    self.processed[candidate] = true;
                    self.add_possible_neighbours(joiner, index, candidate);
                    if let Some(grid) = &mut self.grid {
                        grid.add_footprint(&self.footprints, member);
                    }
                    return Ok(true);
                }
                JoinOutcome::Disjoint => self.stats.disjoint_rejections += 1,
                JoinOutcome::Codirectional | JoinOutcome::NoSeam => {
                    tracing::trace!(
                        current = self.current_index,
                        joined = candidate,
                        ?outcome,
                        "no seam to splice"
                    );
                    self.stats.seam_rejections += 1;
                }
            }
        }
        Ok(false)
    }

    /// Rebuilds the grid from the points still present in current and deferred contours
    fn revive_grid(&mut self) {
        if let Some(grid) = &mut self.grid {
            grid.clear();
            grid.mark_points(&self.current);
            for points in self.deferred.iter() {
                grid.mark_points(points);
            }
        }
    }

    fn write_current(
        &mut self,
        label: i32,
        pack_result: bool,
        result: &mut ContourSet,
    ) -> Result<()> {
        if self.current.is_empty() {
            self.stats.annihilated_contours += 1;
            return Ok(());
        }
        let header = ContourHeader::with_internal(label, self.current_internal);
        if pack_result {
            pack::pack_into(&mut self.packed, &self.current)?;
            result.add_contour(&header, &self.packed)
        } else {
            result.add_contour(&header, &self.current)
        }
    }
}
