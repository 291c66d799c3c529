//! Common types, traits, and error definitions for local_planner
//!
//! This module provides the foundational building blocks used across
//! all stages of the planning pipeline.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
