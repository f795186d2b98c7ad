//! Pack/unpack codec between minimal vertex lists and unit-step walks
//!
//! A *packed* contour keeps only the vertices where the direction changes: no three
//! consecutive stored points are collinear and co-directional. An *unpacked* contour stores
//! every unit step. Both forms are cyclic; the last point connects back to the first.
//!
//! All functions take raw interleaved `[x0, y0, x1, y1, ...]` slices and can be used without
//! a [`ContourSet`](crate::ContourSet).

use contour_common::{Error, Result};

use crate::point::{
    check_contour_length, check_point, collinear_codirectional, MAX_CONTOUR_NUMBER_OF_POINTS,
};

/// Packs a contour into its minimal vertex list
pub fn pack(points: &[i32]) -> Result<Vec<i32>> {
    let mut result = Vec::new();
    pack_into(&mut result, points)?;
    Ok(result)
}

/// Packs `points` into `result` (cleared first), returning the number of packed points
pub fn pack_into(result: &mut Vec<i32>, points: &[i32]) -> Result<usize> {
    pack_impl::<true>(result, points)
}

/// Same as [`pack_into`], for points already known to be in range
pub(crate) fn pack_unchecked_into(result: &mut Vec<i32>, points: &[i32]) -> Result<usize> {
    pack_impl::<false>(result, points)
}

fn pack_impl<const CHECKED: bool>(result: &mut Vec<i32>, points: &[i32]) -> Result<usize> {
    check_contour_length(points.len())?;
    let points = without_last_identical_points(points);
    result.clear();
    let (x0, y0) = (points[0], points[1]);
    if CHECKED {
        check_point(x0, y0)?;
    }
    result.push(x0);
    result.push(y0);
    if points.len() == 2 {
        return Ok(1);
    }

    let first = first_not_identical_point(points, x0, y0);
    let mut previous_x = points[first];
    let mut previous_y = points[first + 1];
    if CHECKED {
        check_point(previous_x, previous_y)?;
    }
    let dx0 = previous_x - x0;
    let dy0 = previous_y - y0;
    let mut previous_dx = dx0;
    let mut previous_dy = dy0;
    for p in points[first + 2..].chunks_exact(2) {
        let (x, y) = (p[0], p[1]);
        let dx = x.wrapping_sub(previous_x);
        let dy = y.wrapping_sub(previous_y);
        if (dx | dy) == 0 {
            continue;
        }
        if CHECKED {
            check_point(x, y)?;
        }
        if !collinear_codirectional(previous_dx, previous_dy, dx, dy) {
            result.push(previous_x);
            result.push(previous_y);
            previous_dx = dx;
            previous_dy = dy;
        }
        previous_x = x;
        previous_y = y;
    }
    result.push(previous_x);
    result.push(previous_y);
    correct_wrap_segment(result, x0, y0, dx0, dy0);
    Ok(result.len() >> 1)
}

/// Removes a vertex that only exists because the walk started in the middle of an edge
fn correct_wrap_segment(result: &mut Vec<i32>, x0: i32, y0: i32, dx0: i32, dy0: i32) {
    let len = result.len();
    if len <= 4 {
        return;
    }
    let (previous_x, previous_y) = (result[len - 4], result[len - 3]);
    let (x, y) = (result[len - 2], result[len - 1]);
    let mut dx = x0 - x;
    let mut dy = y0 - y;
    if collinear_codirectional(x - previous_x, y - previous_y, dx, dy) {
        result.truncate(len - 2);
        dx = x - previous_x;
        dy = y - previous_y;
    }
    if collinear_codirectional(dx, dy, dx0, dy0) {
        result.drain(..2);
    }
}

fn without_last_identical_points(points: &[i32]) -> &[i32] {
    let n = points.len();
    let (last_x, last_y) = (points[n - 2], points[n - 1]);
    let mut m = n;
    while m > 2 && points[m - 4] == last_x && points[m - 3] == last_y {
        m -= 2;
    }
    &points[..m]
}

fn first_not_identical_point(points: &[i32], x0: i32, y0: i32) -> usize {
    let mut i = 2;
    while i < points.len() && points[i] == x0 && points[i + 1] == y0 {
        i += 2;
    }
    debug_assert!(i < points.len(), "trailing identical points were not removed");
    i
}

/// Expands a packed contour into a unit-step walk
///
/// Non-axis-aligned segments are an error unless `diagonal` is set, in which case they are
/// replaced with a staircase of unit steps.
pub fn unpack(points: &[i32], diagonal: bool) -> Result<Vec<i32>> {
    let mut result = Vec::new();
    unpack_into(&mut result, points, diagonal)?;
    Ok(result)
}

/// Like [`unpack`], also returning the exact doubled signed area of the stored vertices
pub fn unpack_with_area(points: &[i32], diagonal: bool) -> Result<(Vec<i32>, i64)> {
    let mut result = Vec::new();
    let area = unpack_into(&mut result, points, diagonal)?;
    Ok((result, area))
}

/// Unpacks `points` into `result` (cleared first) and returns the doubled signed area
pub fn unpack_into(result: &mut Vec<i32>, points: &[i32], diagonal: bool) -> Result<i64> {
    check_contour_length(points.len())?;
    let points = without_last_identical_points(points);
    let n = points.len();
    result.clear();
    let mut last_x = points[n - 2];
    let mut last_y = points[n - 1];
    check_point(last_x, last_y)?;
    if n == 2 {
        result.push(last_x);
        result.push(last_y);
        return Ok(0);
    }
    let mut doubled_area = 0i64;
    for i in (0..n).step_by(2) {
        let (x, y) = (points[i], points[i + 1]);
        check_point(x, y)?;
        if y == last_y {
            reserve_points(result, x.abs_diff(last_x) as usize)?;
            while last_x < x {
                last_x += 1;
                result.push(last_x);
                result.push(last_y);
            }
            while last_x > x {
                last_x -= 1;
                result.push(last_x);
                result.push(last_y);
            }
        } else if x == last_x {
            doubled_area += x as i64 * 2 * (y as i64 - last_y as i64);
            reserve_points(result, y.abs_diff(last_y) as usize)?;
            while last_y < y {
                last_y += 1;
                result.push(last_x);
                result.push(last_y);
            }
            while last_y > y {
                last_y -= 1;
                result.push(last_x);
                result.push(last_y);
            }
        } else if diagonal {
            doubled_area += (x as i64 + last_x as i64) * (y as i64 - last_y as i64);
            add_diagonal_excluding_first(result, last_x, last_y, x, y)?;
            last_x = x;
            last_y = y;
        } else {
            let previous = (if i == 0 { n } else { i }) / 2 - 1;
            return Err(Error::format(
                i,
                format!(
                    "cannot unpack contour containing non-horizontal and non-vertical segments \
                     ({last_x},{last_y} - {x},{y}) between points #{previous} and #{}",
                    i / 2
                ),
            ));
        }
    }
    Ok(doubled_area)
}

fn reserve_points(result: &mut Vec<i32>, added: usize) -> Result<()> {
    let total = (result.len() >> 1) + added;
    if total > MAX_CONTOUR_NUMBER_OF_POINTS {
        return Err(Error::capacity(format!(
            "too large unpacked contour: more than {MAX_CONTOUR_NUMBER_OF_POINTS} points"
        )));
    }
    result.reserve(2 * added);
    Ok(())
}

#[inline]
fn rint(v: f64) -> i32 {
    v.round_ties_even() as i32
}

/// Appends a unit-step staircase from (x1, y1) to (x2, y2), excluding the start point
fn add_diagonal_excluding_first(
    result: &mut Vec<i32>,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
) -> Result<()> {
    debug_assert!(x1 != x2 && y1 != y2);
    let x_difference = x2 - x1;
    let y_difference = y2 - y1;
    let x_length = x_difference.unsigned_abs() as usize;
    let y_length = y_difference.unsigned_abs() as usize;
    let steps = x_length + y_length;
    let expected = result.len() + 2 * steps;
    reserve_points(result, steps)?;
    let mut push = |x: i32, y: i32| {
        result.push(x);
        result.push(y);
    };
    if x_length < y_length {
        let tangent = x_difference as f64 / y_difference as f64;
        if y1 < y2 {
            let mut dy = 1.0;
            let mut last_x = x1;
            for y in y1 + 1..y2 {
                let x = x1 + rint(dy * tangent);
                dy += 1.0;
                if x != last_x {
                    push(last_x, y);
                    last_x = x;
                }
                push(x, y);
            }
            if x2 != last_x {
                push(last_x, y2);
            }
        } else {
            let mut dy = (y_length - 1) as f64;
            let mut next_x = x2 + rint(dy * tangent);
            if x1 != next_x {
                push(next_x, y1);
            }
            for y in (y2 + 1..y1).rev() {
                let x = next_x;
                push(x, y);
                dy -= 1.0;
                next_x = if y == y2 + 1 {
                    x2
                } else {
                    x2 + rint(dy * tangent)
                };
                if x != next_x {
                    push(next_x, y);
                }
            }
        }
    } else {
        let tangent = y_difference as f64 / x_difference as f64;
        if x1 < x2 {
            let mut dx = 1.0;
            let mut last_y = y1;
            for x in x1 + 1..x2 {
                let y = y1 + rint(dx * tangent);
                dx += 1.0;
                if y != last_y {
                    push(x, last_y);
                    last_y = y;
                }
                push(x, y);
            }
            if y2 != last_y {
                push(x2, last_y);
            }
        } else {
            let mut dx = (x_length - 1) as f64;
            let mut next_y = y2 + rint(dx * tangent);
            if y1 != next_y {
                push(x1, next_y);
            }
            for x in (x2 + 1..x1).rev() {
                let y = next_y;
                push(x, y);
                dx -= 1.0;
                next_y = if x == x2 + 1 {
                    y2
                } else {
                    y2 + rint(dx * tangent)
                };
                if y != next_y {
                    push(x, next_y);
                }
            }
        }
    }
    push(x2, y2);
    debug_assert_eq!(result.len(), expected, "staircase length mismatch");
    Ok(())
}

/// Reverses the traversal direction of a contour
pub fn reverse_contour(points: &[i32]) -> Result<Vec<i32>> {
    check_contour_length(points.len())?;
    Ok(points
        .chunks_exact(2)
        .rev()
        .flat_map(|p| [p[0], p[1]])
        .collect())
}
