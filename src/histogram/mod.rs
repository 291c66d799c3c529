// Polar histogram: data type and the stages that build and merge it

pub mod builder;
pub mod histogram;

pub use builder::*;
pub use histogram::*;
