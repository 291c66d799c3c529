//! local_planner - histogram-based local obstacle avoidance
//!
//! Each planning cycle turns raw depth clouds and the vehicle pose into a
//! ranked list of candidate travel directions:
//! crop cloud, compute FOV, build the fresh histogram, propagate the obstacle
//! memory, merge both, optionally compress elevation, compute and smooth the
//! cost matrix, then pick the cheapest bins.

// Core modules
pub mod common;
pub mod config;
pub mod geometry;
pub mod utils;

// Pipeline stages
pub mod perception;
pub mod histogram;
pub mod cost;
pub mod planner;

// Re-export common types for convenience
pub use common::{AgedPoint, CandidateDirection, PointCloud, PolarPoint, Pose3D};
pub use common::CostTerm;
pub use common::{PlannerError, PlannerResult};
pub use config::PlannerConfig;
pub use histogram::Histogram;
pub use planner::{LocalPlanner, PlannerInput, PlannerOutput};
