//! Interpolation for baked lanes.
//!
//! Every segment between two keys is a cubic Bezier whose x axis is the
//! frame offset and whose y axis is the slider value.

pub mod bezier;

pub use bezier::{solve, SolveError};
