//! Splicing of contour fragments into maximal closed boundaries
//!
//! Contours produced tile by tile from one labelled raster cut objects along tile borders. The
//! [`ContourJoiner`] groups contours by a reindexed label and, inside every group with more
//! than one member, splices fragments that share counter-directional boundary segments. Loops
//! that appear while splicing (holes, split-off pieces) are kept as separate output contours.
//!
//! ```no_run
//! use contour_core::ContourSet;
//! use contour_join::{ContourJoiner, JoiningOrder};
//!
//! # fn run(tiles: &ContourSet) -> contour_common::Result<ContourSet> {
//! let mut joiner = ContourJoiner::new(tiles, None, Some(&[]), 0)?;
//! joiner.set_joining_order(JoiningOrder::SmallFirst);
//! let joined = joiner.join_contours()?;
//! # Ok(joined)
//! # }
//! ```

mod cluster;
pub mod config;
mod grid;
mod index;
mod joiner;
mod labels;
pub mod order;
mod splice;
pub mod stats;

pub use config::JoinConfig;
pub use grid::{MAX_GRID_STEP_LOG, MIN_GRID_STEP_LOG};
pub use joiner::ContourJoiner;
pub use order::JoiningOrder;
pub use stats::JoinStats;
