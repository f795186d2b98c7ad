//! Classification of a query point against one contour
//!
//! The query is exact for integer and half-integer coordinates. The scan counts crossings of
//! the horizontal line through the point on each side of it, and remembers the nearest
//! crossing on either side so that callers get the width of the inside section for free.

use contour_common::{Error, Result};

use crate::point::check_contour_length;

/// Position of a point relative to a contour
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InsideStatus {
    /// Strictly inside; `left` and `right` are the nearest boundary crossings on the same row
    Inside { left: f64, right: f64 },
    /// On a non-horizontal boundary; the inside section continues to the right up to `right`
    LeftBoundary { right: f64 },
    /// On a non-horizontal boundary; the inside section continues to the left down to `left`
    RightBoundary { left: f64 },
    /// On a boundary which the contour touches from both sides (zero-width section)
    DegeneratedBoundary { x: f64 },
    /// On a horizontal segment of the boundary
    HorizontalBoundary,
    Outside,
}

impl InsideStatus {
    pub fn is_strictly_inside(&self) -> bool {
        matches!(self, InsideStatus::Inside { .. })
    }

    pub fn is_boundary(&self) -> bool {
        !matches!(self, InsideStatus::Inside { .. } | InsideStatus::Outside)
    }
}

/// Classifies (x, y) against the contour
///
/// With `surely_unpacked` the scan may jump over runs of unit steps that cannot reach the
/// query row; passing it for a packed contour gives wrong answers or a geometry error.
pub fn point_inside_status(
    points: &[i32],
    x: f64,
    y: f64,
    surely_unpacked: bool,
) -> Result<InsideStatus> {
    status_impl(points, x, y, surely_unpacked, None)
}

fn status_impl(
    points: &[i32],
    x: f64,
    y: f64,
    surely_unpacked: bool,
    segment_containing_point: Option<usize>,
) -> Result<InsideStatus> {
    check_contour_length(points.len())?;
    let n = points.len();
    if x < i32::MIN as f64 || x > i32::MAX as f64 || y < i32::MIN as f64 || y > i32::MAX as f64 {
        return Ok(InsideStatus::Outside);
    }
    if n == 2 {
        return Ok(if x == points[0] as f64 && y == points[1] as f64 {
            InsideStatus::HorizontalBoundary
        } else {
            InsideStatus::Outside
        });
    }
    let int_y = y.ceil() as i32;
    let y_is_integer = int_y as f64 == y;
    let start = match skip_starting_horizontal(points, x, y_is_integer, int_y) {
        Ok(p) => p,
        Err(status) => return Ok(status),
    };
    let before_start = if start == 0 { n } else { start };
    let mut last_x = points[before_start - 2];
    let mut last_y = points[before_start - 1];
    let mut count_less = 0u32;
    let mut count_greater = 0u32;
    let mut count_containing = 0u32;
    let mut max_less_x = f64::NEG_INFINITY;
    let mut min_greater_x = f64::INFINITY;
    let mut p = start;
    loop {
        if surely_unpacked {
            let increment = increment_for_long_jump(last_y.abs_diff(int_y), p, n, start);
            if increment > 0 {
                p += increment;
                last_x = points[p - 2];
                last_y = points[p - 1];
            }
        }
        let mut point_x = points[p];
        let point_y = points[p + 1];
        if y_is_integer && point_y == int_y {
            let (mut min_x, mut max_x) = (point_x, point_x);
            let mut q = next_position(p, n);
            while points[q + 1] == int_y {
                min_x = min_x.min(points[q]);
                max_x = max_x.max(points[q]);
                q = next_position(q, n);
            }
            let left_of_section = x < min_x as f64;
            let contains_x = !left_of_section && x <= max_x as f64;
            p = (if q == 0 { n } else { q }) - 2;
            point_x = points[p];
            let next_y = points[next_position(p, n) + 1];
            let touches = (last_y < point_y) != (point_y < next_y);
            if contains_x {
                if min_x != max_x {
                    return Ok(InsideStatus::HorizontalBoundary);
                }
                count_containing += 1;
                if touches {
                    count_containing += 1;
                }
            } else if left_of_section {
                if !touches {
                    count_greater += 1;
                }
                min_greater_x = min_greater_x.min(min_x as f64);
            } else {
                if !touches {
                    count_less += 1;
                }
                max_less_x = max_less_x.max(max_x as f64);
            }
        } else if point_y != last_y {
            if segment_containing_point == Some(p) {
                count_containing += 1;
            } else {
                let crosses = if last_y < point_y {
                    (last_y as f64) < y && y < point_y as f64
                } else {
                    (point_y as f64) < y && y < last_y as f64
                };
                if crosses {
                    let ix = intersection_x(y, last_x, last_y, point_x, point_y);
                    if ix == x {
                        count_containing += 1;
                    } else if x < ix {
                        count_greater += 1;
                        min_greater_x = min_greater_x.min(ix);
                    } else {
                        count_less += 1;
                        max_less_x = max_less_x.max(ix);
                    }
                }
            }
        }
        last_x = point_x;
        last_y = point_y;
        p = next_position(p, n);
        if p == start {
            break;
        }
    }
    if (count_less + count_containing + count_greater) & 1 != 0 {
        return Err(Error::geometry(format!(
            "imbalance of left/right/containing counters ({count_less}, {count_greater}, \
             {count_containing}) at point ({x}, {y}){}",
            if surely_unpacked {
                "; maybe the contour is not actually unpacked"
            } else {
                ""
            }
        )));
    }
    if max_less_x >= min_greater_x {
        return Err(Error::geometry(format!(
            "nearest left intersection {max_less_x} is not less than nearest right \
             intersection {min_greater_x} at point ({x}, {y})"
        )));
    }
    let center_even = count_containing & 1 == 0;
    let left_odd = count_less & 1 != 0;
    Ok(match (center_even, left_odd) {
        (true, true) => InsideStatus::Inside {
            left: max_less_x,
            right: min_greater_x,
        },
        (true, false) if count_containing == 0 => InsideStatus::Outside,
        (true, false) => InsideStatus::DegeneratedBoundary { x },
        (false, true) => InsideStatus::RightBoundary { left: max_less_x },
        (false, false) => InsideStatus::LeftBoundary {
            right: min_greater_x,
        },
    })
}

#[inline]
fn next_position(p: usize, n: usize) -> usize {
    if p + 2 == n {
        0
    } else {
        p + 2
    }
}

/// Finds a scan start not lying on the query row, or resolves the all-horizontal case
fn skip_starting_horizontal(
    points: &[i32],
    x: f64,
    y_is_integer: bool,
    int_y: i32,
) -> std::result::Result<usize, InsideStatus> {
    if !y_is_integer || points[1] != int_y {
        return Ok(0);
    }
    let (mut min_x, mut max_x) = (points[0], points[0]);
    for p in (2..points.len()).step_by(2) {
        if points[p + 1] != int_y {
            return Ok(p);
        }
        min_x = min_x.min(points[p]);
        max_x = max_x.max(points[p]);
    }
    Err(if min_x as f64 <= x && x <= max_x as f64 {
        InsideStatus::HorizontalBoundary
    } else {
        InsideStatus::Outside
    })
}

/// How far an unpacked walk can be skipped without reaching the query row
fn increment_for_long_jump(distance: u32, p: usize, n: usize, start: usize) -> usize {
    if distance <= 5 {
        return 0;
    }
    let limit = (if start > p { start } else { n }) - (p + 2);
    (2 * (distance as usize - 1)).min(limit)
}

fn intersection_x(y: f64, x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
    let dx = (x2 as i64 - x1 as i64) as f64;
    let dy = (y2 as i64 - y1 as i64) as f64;
    x1 as f64 + ((y - y1 as f64) / dy) * dx
}

/// Finds some point strictly inside the contour
///
/// Tries the midpoint of every non-horizontal segment, the closing one included; when the
/// midpoint lies on a left or right boundary, moves halfway into the adjacent inside section.
pub fn find_some_point_inside(points: &[i32], surely_unpacked: bool) -> Result<Option<(f64, f64)>> {
    check_contour_length(points.len())?;
    if points.len() == 2 {
        return Ok(None);
    }
    let (mut last_x, mut last_y) = (points[0], points[1]);
    // segments are identified by their end point; the closing one ends at 0
    for p in (2..points.len()).step_by(2).chain(std::iter::once(0)) {
        let (point_x, point_y) = (points[p], points[p + 1]);
        if point_y != last_y {
            let x = 0.5 * (last_x as f64 + point_x as f64);
            let y = 0.5 * (last_y as f64 + point_y as f64);
            match status_impl(points, x, y, surely_unpacked, Some(p))? {
                InsideStatus::Inside { .. } => return Ok(Some((x, y))),
                InsideStatus::LeftBoundary { right: other }
                | InsideStatus::RightBoundary { left: other } => {
                    return Ok(Some((0.5 * (x + other), y)))
                }
                _ => {}
            }
        }
        last_x = point_x;
        last_y = point_y;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [i32; 8] = [0, 0, 4, 0, 4, 4, 0, 4];

    #[test]
    fn test_inside_square() {
        let status = point_inside_status(&SQUARE, 1.5, 2.0, false).unwrap();
        assert_eq!(
            status,
            InsideStatus::Inside {
                left: 0.0,
                right: 4.0
            }
        );
    }

    #[test]
    fn test_outside_square() {
        assert_eq!(
            point_inside_status(&SQUARE, 5.0, 2.0, false).unwrap(),
            InsideStatus::Outside
        );
        assert_eq!(
            point_inside_status(&SQUARE, 2.0, -0.5, false).unwrap(),
            InsideStatus::Outside
        );
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(
            point_inside_status(&SQUARE, 2.0, 0.0, false).unwrap(),
            InsideStatus::HorizontalBoundary
        );
        assert_eq!(
            point_inside_status(&SQUARE, 0.0, 1.5, false).unwrap(),
            InsideStatus::LeftBoundary { right: 4.0 }
        );
        assert_eq!(
            point_inside_status(&SQUARE, 4.0, 1.5, false).unwrap(),
            InsideStatus::RightBoundary { left: 0.0 }
        );
    }

    #[test]
    fn test_unpacked_long_jump_matches_packed() {
        let walk = crate::pack::unpack(&[0, 0, 20, 0, 20, 20, 0, 20], false).unwrap();
        for y in [0.5, 7.0, 13.5, 19.5] {
            let packed = point_inside_status(&SQUARE.map(|v| v * 5), 3.0, y, false).unwrap();
            let unpacked = point_inside_status(&walk, 3.0, y, true).unwrap();
            assert_eq!(packed, unpacked, "y = {y}");
        }
    }

    #[test]
    fn test_single_point_contour() {
        assert_eq!(
            point_inside_status(&[2, 3], 2.0, 3.0, false).unwrap(),
            InsideStatus::HorizontalBoundary
        );
        assert_eq!(find_some_point_inside(&[2, 3], false).unwrap(), None);
    }

    #[test]
    fn test_find_some_point_inside_through_closing_segment() {
        // square 0..4 with a spike touching the middle of its right side; every other
        // non-horizontal midpoint is a boundary touched from both sides
        let points = [0, 0, 4, 0, 4, 4, 6, 4, 6, 2, 4, 2, 6, 2, 6, 4, 4, 4, 0, 4];
        let (x, y) = find_some_point_inside(&points, false).unwrap().unwrap();
        assert_eq!((x, y), (2.0, 2.0));
        assert!(point_inside_status(&points, x, y, false)
            .unwrap()
            .is_strictly_inside());
    }

    #[test]
    fn test_find_some_point_inside() {
        let (x, y) = find_some_point_inside(&SQUARE, false).unwrap().unwrap();
        assert!(point_inside_status(&SQUARE, x, y, false)
            .unwrap()
            .is_strictly_inside());
    }
}
