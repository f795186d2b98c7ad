//! Exact join of two unpacked contours along their common counter-directional segments
//!
//! Both contours are unit-step walks. Inside the intersection of their containing rectangles
//! every unit segment is keyed by its lower-left end and its axis; the key maps to the position
//! of the segment start in its contour. A key present in both contours is either a seam (the
//! two segments run in opposite directions and annihilate) or a co-directional overlap, which
//! makes the join impossible. The splice walk copies points of one contour and crosses over
//! to the other at every seam, until it returns to its start.

use std::ops::Range;

use contour_common::{Error, Result};
use contour_core::{Rect, MAX_CONTOUR_NUMBER_OF_POINTS};

const EMPTY_POSITION: u32 = u32::MAX;

/// Steps farther than this from the intersection rectangle are copied in bulk
const MAX_TRIVIAL_DISTANCE: i64 = 6;

/// Once this many deferred contours were popped, the queue storage is compacted
const REPACKING_DEFERRED_QUEUE_STEP: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Current,
    Joined,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Current => 0,
            Side::Joined => 1,
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Current => Side::Joined,
            Side::Joined => Side::Current,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Side::Current => "current",
            Side::Joined => "joined",
        }
    }
}

#[inline]
fn next_position(p: usize, len: usize) -> usize {
    if p + 2 == len {
        0
    } else {
        p + 2
    }
}

/// Whether `a` precedes `b` on a cycle of `len` positions read from `start`
fn cyclic_less(start: usize, len: usize, a: usize, b: usize) -> bool {
    debug_assert!(a < len && b < len && start < len);
    if a < start {
        b < start && a < b
    } else {
        b < start || a < b
    }
}

fn position_of_min_x(points: &[i32]) -> usize {
    let mut result = 0;
    for p in (2..points.len()).step_by(2) {
        if points[p] < points[result] {
            result = p;
        }
    }
    result
}

/// The intersection rectangle, in coordinates relative to its minimum corner
#[derive(Clone, Copy, Debug, Default)]
struct Area {
    min_x: i32,
    min_y: i32,
    diff_x: i32,
    diff_y: i32,
    dim_x: usize,
}

impl Area {
    fn of(rect: &Rect) -> Self {
        Self {
            min_x: rect.min_x,
            min_y: rect.min_y,
            diff_x: rect.max_x - rect.min_x,
            diff_y: rect.max_y - rect.min_y,
            dim_x: (rect.max_x - rect.min_x) as usize + 1,
        }
    }

    #[inline]
    fn relative(&self, points: &[i32], p: usize) -> (i32, i32) {
        (points[p] - self.min_x, points[p + 1] - self.min_y)
    }

    #[inline]
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x <= self.diff_x && y <= self.diff_y
    }

    /// L1 distance from a relative point to the rectangle
    #[inline]
    fn distance(&self, x: i32, y: i32) -> i64 {
        let outside = |v: i32, diff: i32| -> i64 {
            if v < 0 {
                -(v as i64)
            } else if v > diff {
                v as i64 - diff as i64
            } else {
                0
            }
        };
        outside(x, self.diff_x) + outside(y, self.diff_y)
    }

    /// Key of the unit segment (x0, y0) - (x1, y1) and whether it is horizontal
    #[inline]
    fn key(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> (usize, bool) {
        let horizontal = y0 == y1;
        let key_x = if x1 < x0 { x1 } else { x0 };
        let key_y = if y1 < y0 { y1 } else { y0 };
        (key_y as usize * self.dim_x + key_x as usize, horizontal)
    }
}

/// A unit segment with both ends inside the intersection rectangle
struct InnerSegment {
    start: usize,
    last_x: i32,
    last_y: i32,
    x: i32,
    y: i32,
}

/// Segments of a cyclic unit-step walk lying inside `area`, skipping far-away stretches
fn inner_segments(points: &[i32], area: Area) -> impl Iterator<Item = InnerSegment> + '_ {
    let n = points.len();
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < n {
            let (x, y) = area.relative(points, i);
            let distance = area.distance(x, y);
            if distance > 0 {
                // a unit-step walk needs at least `distance` steps to come back
                i = i.saturating_add(2 * distance as usize);
                continue;
            }
            let start = if i == 0 { n - 2 } else { i - 2 };
            let (last_x, last_y) = area.relative(points, start);
            i += 2;
            if !area.contains(last_x, last_y) || (last_x == x && last_y == y) {
                continue;
            }
            debug_assert!((last_x - x).abs() + (last_y - y).abs() == 1);
            return Some(InnerSegment {
                start,
                last_x,
                last_y,
                x,
                y,
            });
        }
        None
    })
}

/// Segment positions of one contour, by segment key
#[derive(Debug, Default)]
struct SegmentMatrix {
    horizontal: Vec<u32>,
    vertical: Vec<u32>,
}

impl SegmentMatrix {
    fn reset(&mut self, size: usize) {
        if self.horizontal.len() < size {
            self.horizontal.resize(size, EMPTY_POSITION);
            self.vertical.resize(size, EMPTY_POSITION);
        }
        self.horizontal[..size].fill(EMPTY_POSITION);
        self.vertical[..size].fill(EMPTY_POSITION);
    }

    #[inline]
    fn slot(&mut self, key: usize, horizontal: bool) -> &mut u32 {
        if horizontal {
            &mut self.horizontal[key]
        } else {
            &mut self.vertical[key]
        }
    }

    #[inline]
    fn get(&self, key: usize, horizontal: bool) -> Option<usize> {
        let position = if horizontal {
            self.horizontal[key]
        } else {
            self.vertical[key]
        };
        (position != EMPTY_POSITION).then_some(position as usize)
    }
}

/// Identity of the contours taking part in a join, for error messages
#[derive(Clone, Copy, Debug)]
pub(crate) struct JoinContext<'a> {
    /// Original indexes of all fragments already merged into the current contour
    pub history: &'a [usize],
    pub joined_index: usize,
}

impl JoinContext<'_> {
    fn current_index(&self) -> usize {
        self.history.first().copied().unwrap_or(self.joined_index)
    }

    fn history_list(&self) -> String {
        const MAX_LISTED: usize = 50;
        let mut list = self
            .history
            .iter()
            .take(MAX_LISTED)
            .map(|i| format!("#{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        if self.history.len() > MAX_LISTED {
            list.push_str(", ...");
        }
        list
    }
}

/// Outcome of one exact join attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JoinOutcome {
    /// No segment of the current contour lies inside the joined rectangle
    Disjoint,
    /// The contours share a segment running in the same direction
    Codirectional,
    /// The contours share no counter-directional segment
    NoSeam,
    /// The joined contour was absorbed; `deferred` extra loops were queued
    Spliced { deferred: usize },
}

/// Read-only view of both contours and their segment matrices during a walk
struct SeamView<'a> {
    points: [&'a [i32]; 2],
    area: Area,
    matrices: &'a [SegmentMatrix; 2],
}

impl SeamView<'_> {
    #[inline]
    fn points(&self, side: Side) -> &[i32] {
        self.points[side.index()]
    }

    /// Position at `target` of the segment starting at `p` on the other contour
    #[inline]
    fn position_at(&self, target: Side, p: usize) -> Option<usize> {
        let points = self.points(target.other());
        let (x, y) = self.area.relative(points, p);
        if !self.area.contains(x, y) {
            return None;
        }
        let (next_x, next_y) = self.area.relative(points, next_position(p, points.len()));
        if !self.area.contains(next_x, next_y) || (x == next_x && y == next_y) {
            return None;
        }
        let (key, horizontal) = self.area.key(x, y, next_x, next_y);
        self.matrices[target.index()].get(key, horizontal)
    }

    /// First segment of `side`, from `from` on, not shared with the other contour
    fn find_only_this(&self, side: Side, from: usize, usage: Option<&[bool]>) -> Option<usize> {
        let len = self.points(side).len();
        let mut p = from;
        for _ in 0..len / 2 {
            let unused = usage.map_or(true, |usage| !usage[p >> 1]);
            if unused && self.position_at(side.other(), p).is_none() {
                return Some(p);
            }
            p = next_position(p, len);
        }
        None
    }
}

/// Splice scratch state; grows on demand and is reused across all joins of one joiner
#[derive(Debug, Default)]
pub(crate) struct Splicer {
    area: Area,
    matrices: [SegmentMatrix; 2],
    usage: [Vec<bool>; 2],
    main: Vec<i32>,
    extra: Vec<i32>,
}

impl Splicer {
    /// Tries to absorb `joined` into `current`
    ///
    /// On [`JoinOutcome::Spliced`], `current` holds the first loop of the result (possibly
    /// empty when the contours annihilate completely) and every further loop has been pushed
    /// to `deferred`. Other outcomes leave `current` untouched.
    pub fn try_join(
        &mut self,
        current: &mut Vec<i32>,
        current_internal: &mut bool,
        current_rect: &Rect,
        joined: &[i32],
        joined_internal: bool,
        joined_rect: &Rect,
        deferred: &mut DeferredQueue,
        ctx: &JoinContext<'_>,
    ) -> Result<JoinOutcome> {
        let Some(intersection) = current_rect.intersection(joined_rect) else {
            return Ok(JoinOutcome::Disjoint);
        };
        self.prepare(&intersection, current_rect, joined_rect, ctx)?;
        if !self.scan_current(current, ctx)? {
            return Ok(JoinOutcome::Disjoint);
        }
        match self.scan_joined(current, joined, ctx)? {
            JoinOutcome::Spliced { .. } => {}
            outcome => return Ok(outcome),
        }
        let total_points = current.len() / 2 + joined.len() / 2;
        if total_points > MAX_CONTOUR_NUMBER_OF_POINTS {
            return Err(Error::capacity(format!(
                "too large contours: total number of points in the joining result will be \
                 {total_points} > {MAX_CONTOUR_NUMBER_OF_POINTS}"
            )));
        }
        for (usage, points) in self.usage.iter_mut().zip([current.len(), joined.len()]) {
            usage.clear();
            usage.resize(points / 2, false);
        }

        let view = SeamView {
            points: [current.as_slice(), joined],
            area: self.area,
            matrices: &self.matrices,
        };
        let internals = [*current_internal, joined_internal];
        let mut main_internal = *current_internal;
        let mut queued = 0;
        match walk(&view, &mut self.usage, &mut self.main, 0, internals, ctx)? {
            Some(internal) => {
                main_internal = internal;
                let mut iteration = 1;
                while let Some(internal) =
                    walk(&view, &mut self.usage, &mut self.extra, iteration, internals, ctx)?
                {
                    if !self.extra.is_empty() {
                        deferred.push(&self.extra, internal);
                        queued += 1;
                    }
                    iteration += 1;
                }
            }
            None => self.main.clear(),
        }
        std::mem::swap(current, &mut self.main);
        *current_internal = main_internal;
        Ok(JoinOutcome::Spliced { deferred: queued })
    }

    fn prepare(
        &mut self,
        intersection: &Rect,
        current_rect: &Rect,
        joined_rect: &Rect,
        ctx: &JoinContext<'_>,
    ) -> Result<()> {
        let (dim_x, dim_y) = (intersection.width(), intersection.height());
        let size = dim_x * dim_y;
        if size > i32::MAX as i64 {
            return Err(Error::capacity(format!(
                "too large intersection area: {dim_x} x {dim_y} >= 2^31 pixels, such contours \
                 cannot be joined (joining contour #{} with containing rectangle {joined_rect} \
                 to the current contour grown from #{} with containing rectangle {current_rect})",
                ctx.joined_index,
                ctx.current_index()
            )));
        }
        self.area = Area::of(intersection);
        for matrix in &mut self.matrices {
            matrix.reset(size as usize);
        }
        Ok(())
    }

    /// Fills the current matrix; false if no current segment lies in the rectangle
    fn scan_current(&mut self, current: &[i32], ctx: &JoinContext<'_>) -> Result<bool> {
        let area = self.area;
        let matrix = &mut self.matrices[Side::Current.index()];
        let mut inside = false;
        for s in inner_segments(current, area) {
            inside = true;
            let (key, horizontal) = area.key(s.last_x, s.last_y, s.x, s.y);
            let slot = matrix.slot(key, horizontal);
            if *slot != EMPTY_POSITION {
                return Err(Error::geometry(format!(
                    "one of the contours [{}] intersects itself, i.e. twice contains the \
                     segment {},{} - {},{}; such contours cannot be joined",
                    ctx.history_list(),
                    area.min_x + s.last_x,
                    area.min_y + s.last_y,
                    area.min_x + s.x,
                    area.min_y + s.y
                )));
            }
            *slot = s.start as u32;
        }
        Ok(inside)
    }

    /// Fills the joined matrix and classifies common segments
    ///
    /// Returns `Spliced` (with no deferred count yet) when at least one seam exists.
    fn scan_joined(
        &mut self,
        current: &[i32],
        joined: &[i32],
        ctx: &JoinContext<'_>,
    ) -> Result<JoinOutcome> {
        let area = self.area;
        let [current_matrix, joined_matrix] = &mut self.matrices;
        let mut seam = false;
        for s in inner_segments(joined, area) {
            let (key, horizontal) = area.key(s.last_x, s.last_y, s.x, s.y);
            let slot = joined_matrix.slot(key, horizontal);
            if *slot != EMPTY_POSITION {
                return Err(Error::geometry(format!(
                    "the contour #{} intersects itself, i.e. twice contains the segment \
                     {},{} - {},{}; such contours cannot be joined",
                    ctx.joined_index,
                    area.min_x + s.last_x,
                    area.min_y + s.last_y,
                    area.min_x + s.x,
                    area.min_y + s.y
                )));
            }
            *slot = s.start as u32;
            if let Some(q) = current_matrix.get(key, horizontal) {
                if area.relative(current, q) == (s.last_x, s.last_y) {
                    return Ok(JoinOutcome::Codirectional);
                }
                debug_assert_eq!(area.relative(current, q), (s.x, s.y));
                seam = true;
            }
        }
        Ok(if seam {
            JoinOutcome::Spliced { deferred: 0 }
        } else {
            JoinOutcome::NoSeam
        })
    }
}

/// Walks one loop of the union of the two contours into `out`
///
/// Iteration 0 starts at the leftmost point of both contours, which surely lies on the outer
/// boundary of the result. Later iterations start at any unused segment belonging to one
/// contour only; they produce the extra loops split off by the join. Returns the orientation
/// of the produced loop, or `None` when nothing is left to walk.
fn walk(
    view: &SeamView<'_>,
    usage: &mut [Vec<bool>; 2],
    out: &mut Vec<i32>,
    iteration: usize,
    internals: [bool; 2],
    ctx: &JoinContext<'_>,
) -> Result<Option<bool>> {
    out.clear();
    let (mut side, start, internal) = if iteration == 0 {
        let current = view.points(Side::Current);
        let joined = view.points(Side::Joined);
        let mut side = Side::Current;
        let mut p = position_of_min_x(current);
        let joined_p = position_of_min_x(joined);
        if joined[joined_p] < current[p] {
            side = Side::Joined;
            p = joined_p;
        }
        let internal = internals[side.index()];
        match view.find_only_this(side, p, None) {
            Some(p) => (side, p, internal),
            None => {
                debug_assert!(side == Side::Current);
                let side = side.other();
                match view.find_only_this(side, 0, None) {
                    Some(p) => (side, p, internal),
                    None => return Ok(None),
                }
            }
        }
    } else {
        let internal = !internals[Side::Joined.index()];
        let found = [Side::Joined, Side::Current].into_iter().find_map(|side| {
            view.find_only_this(side, 0, Some(&usage[side.index()]))
                .map(|p| (side, p))
        });
        match found {
            Some((side, p)) => (side, p, internal),
            None => return Ok(None),
        }
    };

    let max_result = view.points(Side::Current).len() + view.points(Side::Joined).len();
    let start_side = side;
    let mut p = start;
    let mut starts: [Option<usize>; 2] = [None, None];
    starts[side.index()] = Some(p);
    let mut lasts = starts;
    let mut switched = false;
    loop {
        if out.len() >= max_result {
            return Err(Error::geometry(format!(
                "infinite loop while joining contour #{} to the current contour grown from #{} \
                 (fragments [{}])",
                ctx.joined_index,
                ctx.current_index(),
                ctx.history_list()
            )));
        }
        let points = view.points(side);
        let len = points.len();
        let used = &mut usage[side.index()];
        debug_assert!(!used[p >> 1], "point #{} used twice", p >> 1);
        let (x, y) = view.area.relative(points, p);
        let distance = view.area.distance(x, y);
        let skipped = distance > MAX_TRIVIAL_DISTANCE;
        if skipped {
            let limit = if side == start_side && start > p {
                start
            } else {
                len
            };
            let count = (2 * (distance as usize - 1)).min(limit - p);
            out.extend_from_slice(&points[p..p + count]);
            used[p >> 1..(p + count) >> 1].fill(true);
            p += count;
            if p == len {
                p = 0;
            }
        } else {
            out.extend_from_slice(&points[p..p + 2]);
            used[p >> 1] = true;
            p = next_position(p, len);
        }

        let other = side.other();
        if let Some(at_other) = view.position_at(other, p) {
            debug_assert!(!skipped, "a seam right after skipping trivial steps");
            if view.position_at(side, at_other) != Some(p) {
                return Err(Error::geometry(format!(
                    "mutual positions of current and joined contours do not match at {} \
                     position #{} while joining contour #{}",
                    side.name(),
                    p >> 1,
                    ctx.joined_index
                )));
            }
            let other_points = view.points(other);
            let at_other = next_position(at_other, other_points.len());
            let point = (points[p], points[p + 1]);
            if (other_points[at_other], other_points[at_other + 1]) != point {
                return Err(Error::geometry(format!(
                    "different points at the current and joined contours near {},{} while \
                     joining contour #{}",
                    point.0, point.1, ctx.joined_index
                )));
            }
            lasts[side.index()] = Some(p);
            match view.position_at(side, at_other) {
                Some(q) => {
                    // the next segment of the other contour is a seam too: jump along this one
                    p = next_position(q, len);
                    if (points[p], points[p + 1]) != point {
                        return Err(Error::geometry(format!(
                            "invalid jump to #{} at {} contour: {},{} -> {},{}",
                            p >> 1,
                            side.name(),
                            point.0,
                            point.1,
                            points[p],
                            points[p + 1]
                        )));
                    }
                }
                None => {
                    side = other;
                    p = at_other;
                }
            }
            switched = true;
            if p != start || side != start_side {
                check_returning_back(view, side, p, &mut starts, &lasts, ctx)?;
            }
        }
        if p == start && side == start_side {
            break;
        }
    }
    if !switched {
        return Err(Error::geometry(format!(
            "no switches while joining contour #{}, though the contours have common \
             counter-directional segments",
            ctx.joined_index
        )));
    }
    Ok(Some(internal))
}

/// A walk re-entering a contour behind its own last exit means inconsistent input
fn check_returning_back(
    view: &SeamView<'_>,
    side: Side,
    p: usize,
    starts: &mut [Option<usize>; 2],
    lasts: &[Option<usize>; 2],
    ctx: &JoinContext<'_>,
) -> Result<()> {
    let i = side.index();
    let Some(start) = starts[i] else {
        starts[i] = Some(p);
        return Ok(());
    };
    let Some(last) = lasts[i] else {
        return Err(Error::geometry(format!(
            "walk re-entered the {} contour before leaving it",
            side.name()
        )));
    };
    let points = view.points(side);
    let len = points.len();
    if cyclic_less(start, len, p, last) {
        return Err(Error::geometry(format!(
            "returning back: cannot join contour #{} to the current contour grown from #{} \
             (fragments [{}]), because the walk returned to an earlier point #{}/{} [x={},y={}] \
             of the {} contour, before its last point #{}/{} [x={},y={}], having started from \
             point #{}/{}; it is possible if some of contours are self-intersecting; such \
             contours cannot be joined",
            ctx.joined_index,
            ctx.current_index(),
            ctx.history_list(),
            p >> 1,
            len >> 1,
            points[p],
            points[p + 1],
            side.name(),
            last >> 1,
            len >> 1,
            points[last],
            points[last + 1],
            start >> 1,
            len >> 1
        )));
    }
    Ok(())
}

/// FIFO of split-off loops still waiting to grow
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    points: Vec<i32>,
    entries: Vec<(Range<usize>, bool)>,
    start: usize,
}

impl DeferredQueue {
    pub fn len(&self) -> usize {
        self.entries.len() - self.start
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.entries.clear();
        self.start = 0;
    }

    pub fn push(&mut self, points: &[i32], internal: bool) {
        let from = self.points.len();
        self.points.extend_from_slice(points);
        self.entries.push((from..self.points.len(), internal));
    }

    /// Moves the oldest contour into `out`, returning its internal flag
    pub fn pop_into(&mut self, out: &mut Vec<i32>) -> Option<bool> {
        let (range, internal) = self.entries.get(self.start)?.clone();
        out.clear();
        out.extend_from_slice(&self.points[range]);
        self.start += 1;
        if self.start >= REPACKING_DEFERRED_QUEUE_STEP {
            self.compact();
        }
        Some(internal)
    }

    fn compact(&mut self) {
        let shift = self
            .entries
            .get(self.start)
            .map_or(self.points.len(), |(range, _)| range.start);
        self.points.drain(..shift);
        self.entries.drain(..self.start);
        for (range, _) in &mut self.entries {
            *range = range.start - shift..range.end - shift;
        }
        self.start = 0;
    }

    /// Points of every queued contour, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &[i32]> + '_ {
        self.entries[self.start..]
            .iter()
            .map(|(range, _)| &self.points[range.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contour_core::{pack, precise_doubled_area, unpack};

    fn walk_of(packed: &[i32]) -> Vec<i32> {
        unpack(packed, false).unwrap()
    }

    fn join(
        current: &mut Vec<i32>,
        joined: &[i32],
        deferred: &mut DeferredQueue,
    ) -> Result<JoinOutcome> {
        let mut splicer = Splicer::default();
        let mut internal = false;
        let current_rect = Rect::of_points(current);
        let history = [0];
        splicer.try_join(
            current,
            &mut internal,
            &current_rect,
            joined,
            false,
            &Rect::of_points(joined),
            deferred,
            &JoinContext {
                history: &history,
                joined_index: 1,
            },
        )
    }

    #[test]
    fn test_cyclic_less() {
        assert!(cyclic_less(4, 10, 5, 8));
        assert!(!cyclic_less(4, 10, 8, 5));
        assert!(cyclic_less(4, 10, 8, 2));
        assert!(!cyclic_less(4, 10, 2, 8));
        assert!(cyclic_less(4, 10, 0, 2));
    }

    #[test]
    fn test_two_halves_make_a_square() {
        // same orientation, common edge y = 2 traversed in opposite directions
        let mut current = walk_of(&[0, 0, 4, 0, 4, 2, 0, 2]);
        let joined = walk_of(&[0, 2, 4, 2, 4, 4, 0, 4]);
        let mut deferred = DeferredQueue::default();
        let outcome = join(&mut current, &joined, &mut deferred).unwrap();
        assert_eq!(outcome, JoinOutcome::Spliced { deferred: 0 });
        assert_eq!(deferred.len(), 0);
        let packed = pack(&current).unwrap();
        assert_eq!(packed.len(), 8);
        assert_eq!(precise_doubled_area(&packed).unwrap(), 32);
    }

    #[test]
    fn test_disjoint_and_codirectional() {
        let mut current = walk_of(&[0, 0, 2, 0, 2, 2, 0, 2]);
        let far = walk_of(&[10, 10, 12, 10, 12, 12, 10, 12]);
        let mut deferred = DeferredQueue::default();
        assert_eq!(
            join(&mut current, &far, &mut deferred).unwrap(),
            JoinOutcome::Disjoint
        );
        let copy = current.clone();
        assert_eq!(
            join(&mut current, &copy, &mut deferred).unwrap(),
            JoinOutcome::Codirectional
        );
        assert_eq!(current, copy);
    }

    #[test]
    fn test_touching_corner_is_disjoint() {
        let mut current = walk_of(&[0, 0, 2, 0, 2, 2, 0, 2]);
        let corner = walk_of(&[2, 2, 4, 2, 4, 4, 2, 4]);
        let mut deferred = DeferredQueue::default();
        assert_eq!(
            join(&mut current, &corner, &mut deferred).unwrap(),
            JoinOutcome::Disjoint
        );
    }

    #[test]
    fn test_crossing_squares_have_no_seam() {
        let mut current = walk_of(&[0, 0, 4, 0, 4, 4, 0, 4]);
        let crossing = walk_of(&[3, 3, 6, 3, 6, 6, 3, 6]);
        let mut deferred = DeferredQueue::default();
        assert_eq!(
            join(&mut current, &crossing, &mut deferred).unwrap(),
            JoinOutcome::NoSeam
        );
    }

    #[test]
    fn test_opposite_copies_annihilate() {
        let mut current = walk_of(&[0, 0, 3, 0, 3, 3, 0, 3]);
        let reversed = contour_core::reverse_contour(&current).unwrap();
        let mut deferred = DeferredQueue::default();
        assert_eq!(
            join(&mut current, &reversed, &mut deferred).unwrap(),
            JoinOutcome::Spliced { deferred: 0 }
        );
        assert!(current.is_empty());
    }

    #[test]
    fn test_self_intersecting_current_is_an_error() {
        // the walk goes along the segment (1,0)-(2,0) twice
        let mut current = vec![0, 0, 1, 0, 2, 0, 1, 0, 1, 1, 0, 1];
        let joined = walk_of(&[0, 0, 3, 0, 3, 3, 0, 3]);
        let mut deferred = DeferredQueue::default();
        let err = join(&mut current, &joined, &mut deferred).unwrap_err();
        assert!(matches!(err, Error::Geometry(_)), "{err}");
        assert!(err.to_string().contains("intersects itself"));
    }

    #[test]
    fn test_deferred_queue_compaction() {
        let mut queue = DeferredQueue::default();
        for k in 0..40 {
            queue.push(&[k, k, k + 1, k], k % 2 == 0);
        }
        let mut out = Vec::new();
        for k in 0..20 {
            assert_eq!(queue.pop_into(&mut out), Some(k % 2 == 0));
            assert_eq!(out, vec![k, k, k + 1, k]);
        }
        assert_eq!(queue.len(), 20);
        assert_eq!(queue.iter().next(), Some(&[20, 20, 21, 20][..]));
        queue.clear();
        assert_eq!(queue.pop_into(&mut out), None);
    }
}
