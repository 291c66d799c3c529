//! Diagnostic utilities for local_planner

pub mod visualization;

pub use visualization::{colors, PolarPlot};
