//! On-disk storage of contour sets

pub mod contours_file;
pub mod crc;

pub use contours_file::{read_contours, read_contours_from, write_contours, write_contours_to};
