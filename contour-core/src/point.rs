//! Coordinate range and step geometry shared by the container and the codecs
//!
//! Coordinates are limited to `MIN_COORDINATE..=MAX_COORDINATE`, which leaves two spare high
//! bits in an `i32`: bounding-box sizes and `2 * points + header` always fit in 31 bits.

use contour_common::{Error, Result};

pub const MIN_COORDINATE: i32 = -0x4000_0000;
pub const MAX_COORDINATE: i32 = 0x3FFF_FFFF;

const COORDINATE_HIGH_BITS: i64 = 0xFFFF_FFFF_8000_0000_u64 as i64;

/// Upper bound for the number of contours in one container
pub const MAX_NUMBER_OF_CONTOURS: usize = 500_000_000;

/// Upper bound for the number of points in one contour
pub const MAX_CONTOUR_NUMBER_OF_POINTS: usize =
    ((i32::MAX as usize) - crate::header::MAX_ALLOWED_HEADER_LENGTH) >> 1;

#[inline]
pub fn in_range(x: i32, y: i32) -> bool {
    (x.wrapping_sub(MIN_COORDINATE) | y.wrapping_sub(MIN_COORDINATE)) >= 0
}

#[inline]
pub fn in_range_i64(x: i64, y: i64) -> bool {
    ((x.wrapping_sub(MIN_COORDINATE as i64) | y.wrapping_sub(MIN_COORDINATE as i64))
        & COORDINATE_HIGH_BITS)
        == 0
}

#[inline]
pub fn check_point(x: i32, y: i32) -> Result<()> {
    if in_range(x, y) {
        Ok(())
    } else {
        Err(out_of_range(x as i64, y as i64))
    }
}

#[inline]
pub fn check_point_i64(x: i64, y: i64) -> Result<()> {
    if in_range_i64(x, y) {
        Ok(())
    } else {
        Err(out_of_range(x, y))
    }
}

fn out_of_range(x: i64, y: i64) -> Error {
    Error::OutOfRange(format!(
        "point coordinates ({x}, {y}) are out of allowed range {MIN_COORDINATE}..{MAX_COORDINATE}"
    ))
}

/// Whether step (dx2, dy2) continues step (dx1, dy1) along the same ray
#[inline]
pub fn collinear_codirectional(dx1: i32, dy1: i32, dx2: i32, dy2: i32) -> bool {
    (dx1 as i64) * (dy2 as i64) == (dy1 as i64) * (dx2 as i64)
        && (dx1 ^ dx2) >= 0
        && (dy1 ^ dy2) >= 0
}

/// Round half up, the rounding used by scale+shift transforms
#[inline]
pub fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Checks the length (in i32 words) of a raw point sequence
pub fn check_contour_length(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::invalid("empty contour is not allowed"));
    }
    if len % 2 != 0 {
        return Err(Error::invalid(format!(
            "contour length must be even, but it is {len}"
        )));
    }
    if len >> 1 > MAX_CONTOUR_NUMBER_OF_POINTS {
        return Err(Error::capacity(format!(
            "too large number of points in a contour: it is > {MAX_CONTOUR_NUMBER_OF_POINTS}"
        )));
    }
    Ok(())
}
