//! Polar obstacle histogram
//!
//! A fixed-size grid over (elevation, azimuth). Each bin carries three layers:
//! occupancy, mean obstacle distance and obstacle age in planning cycles.

use std::fmt;

use itertools::iproduct;
use nalgebra::DMatrix;

use crate::geometry::{PolarGrid, ALPHA_RES};

/// Occupancy value written into a bin that contains an obstacle
pub const OCCUPIED: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    grid: PolarGrid,
    bin: DMatrix<f64>,
    age: DMatrix<u32>,
    dist: DMatrix<f64>,
}

impl Histogram {
    /// Empty histogram with square bins of `resolution` degrees
    pub fn new(resolution: usize) -> Self {
        Self::with_grid(PolarGrid::from_resolution(resolution))
    }

    pub fn with_grid(grid: PolarGrid) -> Self {
        let (rows, cols) = grid.shape();
        Self {
            grid,
            bin: DMatrix::zeros(rows, cols),
            age: DMatrix::zeros(rows, cols),
            dist: DMatrix::zeros(rows, cols),
        }
    }

    pub fn grid(&self) -> PolarGrid {
        self.grid
    }

    pub fn e_dim(&self) -> usize {
        self.grid.e_dim
    }

    pub fn z_dim(&self) -> usize {
        self.grid.z_dim
    }

    pub fn get_bin(&self, e: usize, z: usize) -> f64 {
        self.bin[(e, z)]
    }

    pub fn set_bin(&mut self, e: usize, z: usize, value: f64) {
        self.bin[(e, z)] = value;
    }

    pub fn get_age(&self, e: usize, z: usize) -> u32 {
        self.age[(e, z)]
    }

    pub fn set_age(&mut self, e: usize, z: usize, value: u32) {
        self.age[(e, z)] = value;
    }

    pub fn get_dist(&self, e: usize, z: usize) -> f64 {
        self.dist[(e, z)]
    }

    pub fn set_dist(&mut self, e: usize, z: usize, value: f64) {
        self.dist[(e, z)] = value;
    }

    pub fn is_occupied(&self, e: usize, z: usize) -> bool {
        self.bin[(e, z)] > 0.0
    }

    /// Copy all three layers of bin (e, z) from `other`
    pub fn copy_bin_from(&mut self, other: &Histogram, e: usize, z: usize) {
        self.bin[(e, z)] = other.bin[(e, z)];
        self.age[(e, z)] = other.age[(e, z)];
        self.dist[(e, z)] = other.dist[(e, z)];
    }

    pub fn set_zero(&mut self) {
        self.bin.fill(0.0);
        self.age.fill(0);
        self.dist.fill(0.0);
    }

    /// True when no bin is occupied
    pub fn is_empty(&self) -> bool {
        self.bin.iter().all(|&v| v <= 0.0)
    }

    pub fn occupied_count(&self) -> usize {
        self.bin.iter().filter(|&&v| v > 0.0).count()
    }

    /// Histogram with twice the resolution in both axes.
    ///
    /// Each bin is copied into the 2x2 block of finer bins it covers.
    pub fn upsample(&self) -> Histogram {
        let mut fine = Histogram::with_grid(PolarGrid::new(self.e_dim() * 2, self.z_dim() * 2));
        for (e, z) in iproduct!(0..fine.e_dim(), 0..fine.z_dim()) {
            fine.bin[(e, z)] = self.bin[(e / 2, z / 2)];
            fine.age[(e, z)] = self.age[(e / 2, z / 2)];
            fine.dist[(e, z)] = self.dist[(e / 2, z / 2)];
        }
        fine
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(ALPHA_RES)
    }
}

/// Occupancy map, highest elevation on top, one character per bin
impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in (0..self.e_dim()).rev() {
            for z in 0..self.z_dim() {
                let c = if self.is_occupied(e, z) { '1' } else { '0' };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GRID_LENGTH_E, GRID_LENGTH_Z};

    #[test]
    fn test_new_histogram_is_zero() {
        let hist = Histogram::new(ALPHA_RES);
        assert_eq!(hist.e_dim(), GRID_LENGTH_E);
        assert_eq!(hist.z_dim(), GRID_LENGTH_Z);
        assert!(hist.is_empty());
        assert_eq!(hist.occupied_count(), 0);
    }

    #[test]
    fn test_set_and_reset_bins() {
        let mut hist = Histogram::default();
        hist.set_bin(3, 59, OCCUPIED);
        hist.set_dist(3, 59, 2.5);
        hist.set_age(3, 59, 4);
        assert!(hist.is_occupied(3, 59));
        assert!(!hist.is_empty());
        assert_eq!(hist.get_age(3, 59), 4);
        assert!((hist.get_dist(3, 59) - 2.5).abs() < 1e-12);

        hist.set_zero();
        assert!(hist.is_empty());
        assert_eq!(hist.get_age(3, 59), 0);
    }

    #[test]
    fn test_upsample_copies_blocks() {
        let mut coarse = Histogram::new(2 * ALPHA_RES);
        coarse.set_bin(1, 29, OCCUPIED);
        coarse.set_dist(1, 29, 3.0);
        coarse.set_age(1, 29, 2);

        let fine = coarse.upsample();
        assert_eq!(fine.grid(), PolarGrid::default());
        assert_eq!(fine.occupied_count(), 4);
        for (e, z) in iproduct!(2..4, 58..60) {
            assert!(fine.is_occupied(e, z));
            assert!((fine.get_dist(e, z) - 3.0).abs() < 1e-12);
            assert_eq!(fine.get_age(e, z), 2);
        }
    }

    #[test]
    fn test_display_marks_occupied_bins() {
        let mut hist = Histogram::with_grid(PolarGrid::new(2, 3));
        hist.set_bin(1, 2, OCCUPIED);
        assert_eq!(format!("{}", hist), "001\n000\n");
    }
}
