//! Field of view of the depth sensor on the polar histogram grid
//!
//! Azimuth bins wrap around the ±180° seam; elevation bins are clamped at
//! the poles.

use crate::geometry::{wrap_angle_to_plus_minus_180, PolarGrid, RAD_TO_DEG};

/// Histogram bins currently observable by the sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOfView {
    /// Azimuth bin indices inside the horizontal FOV, ascending
    pub z_fov_idx: Vec<usize>,
    /// Lowest elevation bin inside the vertical FOV
    pub e_fov_min: usize,
    /// Highest elevation bin inside the vertical FOV
    pub e_fov_max: usize,
}

impl FieldOfView {
    /// FOV covering no bin
    pub fn empty() -> Self {
        Self { z_fov_idx: Vec::new(), e_fov_min: 0, e_fov_max: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.z_fov_idx.is_empty()
    }

    pub fn contains(&self, e: usize, z: usize) -> bool {
        e >= self.e_fov_min && e <= self.e_fov_max && self.z_fov_idx.binary_search(&z).is_ok()
    }

    /// Per-azimuth membership mask of length `z_dim`
    pub fn azimuth_mask(&self, z_dim: usize) -> Vec<bool> {
        let mut mask = vec![false; z_dim];
        for &z in self.z_fov_idx.iter().filter(|&&z| z < z_dim) {
            mask[z] = true;
        }
        mask
    }
}

// Edge of the FOV as a bin index, before wrapping or clamping.
fn fov_edge_index(angle_deg: f64, resolution: f64) -> i64 {
    let index = (angle_deg / resolution).round() - 1.0;
    index.max(f64::from(i32::MIN)).min(f64::from(i32::MAX)) as i64
}

/// FOV on the default histogram grid.
///
/// `h_fov`/`v_fov` are the full opening angles in degrees, `yaw`/`pitch` the
/// vehicle attitude in radians. Any non-finite input gives an empty FOV.
pub fn calculate_fov(h_fov: f64, v_fov: f64, yaw: f64, pitch: f64) -> FieldOfView {
    calculate_fov_on_grid(&PolarGrid::default(), h_fov, v_fov, yaw, pitch)
}

pub fn calculate_fov_on_grid(grid: &PolarGrid, h_fov: f64, v_fov: f64, yaw: f64, pitch: f64) -> FieldOfView {
    if !(h_fov.is_finite() && v_fov.is_finite() && yaw.is_finite() && pitch.is_finite()) {
        log::warn!("Non-finite FOV input (h {}, v {}, yaw {}, pitch {}), no bin is visible", h_fov, v_fov, yaw, pitch);
        return FieldOfView::empty();
    }
    let yaw_deg = wrap_angle_to_plus_minus_180(yaw * RAD_TO_DEG);
    let pitch_deg = pitch * RAD_TO_DEG;

    let z_fov_max = fov_edge_index(-yaw_deg + h_fov / 2.0 + 270.0, grid.z_res());
    let z_fov_min = fov_edge_index(-yaw_deg - h_fov / 2.0 + 270.0, grid.z_res());
    let e_fov_max = fov_edge_index(-pitch_deg + v_fov / 2.0 + 90.0, grid.e_res());
    let e_fov_min = fov_edge_index(-pitch_deg - v_fov / 2.0 + 90.0, grid.e_res());

    // A FOV of 360° or more covers every azimuth bin exactly once
    let span = (z_fov_max - z_fov_min).max(0).min(grid.z_dim as i64);
    let mut z_fov_idx: Vec<usize> = (z_fov_min..z_fov_min + span)
        .map(|i| grid.wrap_azimuth_index(i))
        .collect();
    z_fov_idx.sort_unstable();
    z_fov_idx.dedup();

    FieldOfView {
        z_fov_idx,
        e_fov_min: grid.clamp_elevation_index(e_fov_min),
        e_fov_max: grid.clamp_elevation_index(e_fov_max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GRID_LENGTH_Z;

    const H_FOV: f64 = 90.0;
    const V_FOV: f64 = 45.0;

    #[test]
    fn test_fov_inside_grid() {
        let fov = calculate_fov(H_FOV, V_FOV, 3.14, 0.0);
        assert_eq!(fov.e_fov_min, 10);
        assert_eq!(fov.e_fov_max, 18);
        assert_eq!(fov.z_fov_idx, (7..=21).collect::<Vec<_>>());
    }

    #[test]
    fn test_fov_upper_bound_wraps() {
        let fov = calculate_fov(H_FOV, V_FOV, -2.3, 0.0);
        let mut expected: Vec<usize> = (0..=12).collect();
        expected.extend_from_slice(&[58, 59]);
        assert_eq!(fov.z_fov_idx, expected);
    }

    #[test]
    fn test_fov_lower_bound_wraps() {
        let fov = calculate_fov(H_FOV, V_FOV, 3.9, 0.0);
        let mut expected: Vec<usize> = (0..=13).collect();
        expected.push(59);
        assert_eq!(fov.z_fov_idx, expected);
    }

    #[test]
    fn test_fov_both_bounds_below_zero() {
        let fov = calculate_fov(H_FOV, V_FOV, 5.6, 0.0);
        assert_eq!(fov.z_fov_idx, (43..58).collect::<Vec<_>>());
    }

    #[test]
    fn test_elevation_bounds_independent_of_yaw() {
        for &yaw in &[3.14, -2.3, 3.9, 5.6, 0.0, -7.0] {
            let fov = calculate_fov(H_FOV, V_FOV, yaw, 0.0);
            assert_eq!((fov.e_fov_min, fov.e_fov_max), (10, 18));
            assert_eq!(fov.z_fov_idx.len(), 15);
            assert!(fov.z_fov_idx.iter().all(|&z| z < GRID_LENGTH_Z));
        }
    }

    #[test]
    fn test_elevation_bounds_clamped_at_poles() {
        let fov = calculate_fov(H_FOV, 170.0, 0.0, -1.2);
        assert_eq!(fov.e_fov_max, 29);
        let fov = calculate_fov(H_FOV, 170.0, 0.0, 1.2);
        assert_eq!(fov.e_fov_min, 0);
    }

    #[test]
    fn test_full_circle_fov_has_each_bin_once() {
        let fov = calculate_fov(400.0, V_FOV, 1.0, 0.0);
        assert_eq!(fov.z_fov_idx, (0..GRID_LENGTH_Z).collect::<Vec<_>>());
    }

    #[test]
    fn test_contains_and_mask() {
        let fov = calculate_fov(H_FOV, V_FOV, -2.3, 0.0);
        assert!(fov.contains(10, 59));
        assert!(fov.contains(18, 0));
        assert!(!fov.contains(9, 0));
        assert!(!fov.contains(12, 30));
        let mask = fov.azimuth_mask(GRID_LENGTH_Z);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 15);
        assert!(mask[58] && mask[12] && !mask[13]);
    }

    #[test]
    fn test_non_finite_input_gives_empty_fov() {
        for &(h, v, yaw, pitch) in &[
            (H_FOV, V_FOV, f64::INFINITY, 0.0),
            (H_FOV, V_FOV, f64::NEG_INFINITY, 0.0),
            (H_FOV, V_FOV, 0.0, f64::INFINITY),
            (H_FOV, V_FOV, f64::NAN, 0.0),
            (f64::INFINITY, V_FOV, 0.0, 0.0),
            (H_FOV, f64::INFINITY, 0.0, 0.0),
        ] {
            let fov = calculate_fov(h, v, yaw, pitch);
            assert!(fov.is_empty());
            assert!(!fov.contains(15, 30));
        }
    }

    #[test]
    fn test_huge_finite_input_stays_in_grid() {
        let fov = calculate_fov(H_FOV, V_FOV, 1.0e300, 0.0);
        assert_eq!(fov.z_fov_idx.len(), 15);
        assert!(fov.z_fov_idx.iter().all(|&z| z < GRID_LENGTH_Z));

        let fov = calculate_fov(H_FOV, V_FOV, 0.0, 1.0e300);
        assert_eq!((fov.e_fov_min, fov.e_fov_max), (0, 0));

        let fov = calculate_fov(1.0e300, 1.0e300, 0.0, 0.0);
        assert_eq!(fov.z_fov_idx, (0..GRID_LENGTH_Z).collect::<Vec<_>>());
        assert_eq!((fov.e_fov_min, fov.e_fov_max), (0, 29));
    }

    #[test]
    fn test_yaw_wraps_by_full_turns() {
        let turns = 2.0 * std::f64::consts::PI * 3.0;
        assert_eq!(calculate_fov(H_FOV, V_FOV, 0.7 + turns, 0.0), calculate_fov(H_FOV, V_FOV, 0.7, 0.0));
    }
}
