//! `contour-tool`: conversion, packing, transformation and joining of `.ctrs` files

pub mod cli;
pub mod json;
pub mod logging;
