// Perception stages: cloud cropping and sensor field of view

pub mod fov;
pub mod point_cloud_filter;

pub use fov::*;
pub use point_cloud_filter::*;
