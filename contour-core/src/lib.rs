//! Contour container and codecs for the contour-seam toolkit
//!
//! A [`ContourSet`] stores many closed integer polygons in one flat `i32` buffer. The
//! [`pack`] module converts between minimal vertex lists and unit-step walks, [`measure`]
//! and [`inside`] provide geometry over raw point slices, and [`format`] reads and writes
//! `.ctrs` files.

pub mod format;
pub mod header;
pub mod inside;
pub mod measure;
pub mod pack;
pub mod point;
pub mod set;

pub use header::{BoundaryTouch, ContourHeader, Rect};
pub use inside::{find_some_point_inside, point_inside_status, InsideStatus};
pub use measure::{
    precise_doubled_area, segment_centers_area, segment_centers_perimeter, strict_area,
    strict_perimeter, transform_contour,
};
pub use pack::{pack, pack_into, reverse_contour, unpack, unpack_into, unpack_with_area};
pub use point::{
    MAX_CONTOUR_NUMBER_OF_POINTS, MAX_COORDINATE, MAX_NUMBER_OF_CONTOURS, MIN_COORDINATE,
};
pub use set::ContourSet;
