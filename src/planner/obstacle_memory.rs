//! Aged obstacle points carried from one planning cycle to the next

use itertools::iproduct;
use nalgebra::Vector3;
use serde::Deserialize;

use crate::common::{AgedPoint, PolarPoint};
use crate::geometry::polar_to_cartesian;
use crate::histogram::Histogram;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Bins older than this many cycles are forgotten
    pub max_age: u32,
    /// Bins farther than this [m] are forgotten
    pub max_distance: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_age: 10, max_distance: 12.0 }
    }
}

/// World-frame obstacle points remembered from the last combined histogram.
///
/// Created empty with the planner, replaced at the end of every cycle and
/// emptied by [`ObstacleMemory::clear`] when the planner is reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMemory {
    points: Vec<AgedPoint>,
    max_age: u32,
    max_distance: f64,
}

impl ObstacleMemory {
    pub fn new(config: &MemoryConfig) -> Self {
        Self::with_limits(config.max_age, config.max_distance)
    }

    pub fn with_limits(max_age: u32, max_distance: f64) -> Self {
        Self { points: Vec::new(), max_age, max_distance: max_distance.max(0.0) }
    }

    /// Replace the memory with the obstacles of `histogram` seen from `position`.
    ///
    /// Every occupied bin within the age and distance limits yields four points,
    /// a quarter bin from its center in each diagonal direction, at the bin's
    /// mean distance. The points keep the bin's age.
    pub fn reproject_histogram(&mut self, histogram: &Histogram, position: &Vector3<f64>) {
        let grid = histogram.grid();
        let e_offset = grid.e_res() / 4.0;
        let z_offset = grid.z_res() / 4.0;

        self.points.clear();
        for (e, z) in iproduct!(0..grid.e_dim, 0..grid.z_dim) {
            if !histogram.is_occupied(e, z) {
                continue;
            }
            let age = histogram.get_age(e, z);
            let dist = histogram.get_dist(e, z);
            if age > self.max_age || !(dist > 0.0 && dist <= self.max_distance) {
                continue;
            }

            let center = grid.index_to_polar(e, z, dist);
            for &(de, dz) in &[(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
                let corner = PolarPoint::new(center.e + de * e_offset, center.z + dz * z_offset, dist);
                self.points.push(AgedPoint::new(polar_to_cartesian(&corner, position), age));
            }
        }
        log::debug!("Obstacle memory holds {} points", self.points.len());
    }

    pub fn points(&self) -> &[AgedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl Default for ObstacleMemory {
    fn default() -> Self {
        Self::new(&MemoryConfig::default())
    }
}
