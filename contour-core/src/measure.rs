//! Perimeter and area measures over raw point slices

use contour_common::Result;

use crate::point::{check_contour_length, check_point_i64, round_half_up};

/// Perimeter where unit steps count exactly and longer steps use their Euclidean length
pub fn strict_perimeter(points: &[i32]) -> Result<f64> {
    check_contour_length(points.len())?;
    let n = points.len();
    let (mut last_x, mut last_y) = (points[n - 2], points[n - 1]);
    let mut perimeter = 0.0;
    for p in points.chunks_exact(2) {
        let dx = p[0] as i64 - last_x as i64;
        let dy = p[1] as i64 - last_y as i64;
        let d_sqr = dx * dx + dy * dy;
        perimeter += if d_sqr <= 1 {
            d_sqr as f64
        } else {
            (d_sqr as f64).sqrt()
        };
        last_x = p[0];
        last_y = p[1];
    }
    Ok(perimeter)
}

/// Iterates over the midpoints of consecutive segments, starting with the wrap segment
fn segment_centers(points: &[i32]) -> impl Iterator<Item = (f64, f64)> + '_ {
    let n = points.len();
    (0..n).step_by(2).map(move |i| {
        let j = if i + 2 < n { i + 2 } else { 0 };
        (
            0.5 * (points[i] as f64 + points[j] as f64),
            0.5 * (points[i + 1] as f64 + points[j + 1] as f64),
        )
    })
}

fn wrap_center(points: &[i32]) -> (f64, f64) {
    let n = points.len();
    (
        0.5 * (points[n - 2] as f64 + points[0] as f64),
        0.5 * (points[n - 1] as f64 + points[1] as f64),
    )
}

/// Perimeter of the polygon through the midpoints of all segments
pub fn segment_centers_perimeter(points: &[i32]) -> Result<f64> {
    check_contour_length(points.len())?;
    let (mut last_x, mut last_y) = wrap_center(points);
    let mut perimeter = 0.0;
    for (x, y) in segment_centers(points) {
        let (dx, dy) = (x - last_x, y - last_y);
        perimeter += (dx * dx + dy * dy).sqrt();
        last_x = x;
        last_y = y;
    }
    Ok(perimeter)
}

/// Signed area of the polygon through the midpoints of all segments
pub fn segment_centers_area(points: &[i32]) -> Result<f64> {
    check_contour_length(points.len())?;
    let (mut last_x, mut last_y) = wrap_center(points);
    let mut area = 0.0;
    for (x, y) in segment_centers(points) {
        area += (x + last_x) * (y - last_y);
        last_x = x;
        last_y = y;
    }
    Ok(0.5 * area)
}

/// Signed shoelace area
pub fn strict_area(points: &[i32]) -> Result<f64> {
    Ok(0.5 * precise_doubled_area(points)? as f64)
}

/// Exact doubled signed shoelace area
pub fn precise_doubled_area(points: &[i32]) -> Result<i64> {
    check_contour_length(points.len())?;
    let n = points.len();
    let (mut last_x, mut last_y) = (points[n - 2] as i64, points[n - 1] as i64);
    let mut area = 0i64;
    for p in points.chunks_exact(2) {
        let (x, y) = (p[0] as i64, p[1] as i64);
        area += (x + last_x) * (y - last_y);
        last_x = x;
        last_y = y;
    }
    Ok(area)
}

/// Maps every point through `v * scale + shift`, rounding half up
pub fn transform_contour(
    points: &[i32],
    scale_x: f64,
    scale_y: f64,
    shift_x: f64,
    shift_y: f64,
) -> Result<Vec<i32>> {
    let mut result = points.to_vec();
    transform_contour_in_place(&mut result, scale_x, scale_y, shift_x, shift_y)?;
    Ok(result)
}

pub(crate) fn transform_contour_in_place(
    points: &mut [i32],
    scale_x: f64,
    scale_y: f64,
    shift_x: f64,
    shift_y: f64,
) -> Result<()> {
    check_contour_length(points.len())?;
    if scale_x == 1.0 && scale_y == 1.0 && shift_x == 0.0 && shift_y == 0.0 {
        return Ok(());
    }
    for p in points.chunks_exact_mut(2) {
        let x = round_half_up(scale_x * p[0] as f64 + shift_x);
        let y = round_half_up(scale_y * p[1] as f64 + shift_y);
        check_point_i64(x, y)?;
        p[0] = x as i32;
        p[1] = y as i32;
    }
    Ok(())
}
