//! Histogram construction, propagation, merging and elevation compression

use itertools::iproduct;
use nalgebra::{DMatrix, Vector3};
use serde::Deserialize;

use crate::common::{AgedPoint, PointCloud};
use crate::geometry::{cartesian_to_polar, PolarGrid, ALPHA_RES};
use crate::histogram::{Histogram, OCCUPIED};
use crate::perception::FieldOfView;

// Points this close to the vehicle have no usable direction.
const MIN_POINT_DISTANCE: f64 = 1e-6;

/// Per-bin accumulator: point count, summed distance, summed age
struct BinAccumulator {
    count: DMatrix<u32>,
    dist_sum: DMatrix<f64>,
    age_sum: DMatrix<u64>,
}

impl BinAccumulator {
    fn new(grid: &PolarGrid) -> Self {
        let (rows, cols) = grid.shape();
        Self {
            count: DMatrix::zeros(rows, cols),
            dist_sum: DMatrix::zeros(rows, cols),
            age_sum: DMatrix::zeros(rows, cols),
        }
    }

    fn add(&mut self, grid: &PolarGrid, point: &Vector3<f64>, position: &Vector3<f64>, age: u32) {
        if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
            return;
        }
        let p_pol = cartesian_to_polar(point, position);
        if p_pol.r < MIN_POINT_DISTANCE {
            return;
        }
        let (e, z) = grid.polar_to_index(&p_pol);
        self.count[(e, z)] += 1;
        self.dist_sum[(e, z)] += p_pol.r;
        self.age_sum[(e, z)] += u64::from(age);
    }

    /// Occupied bins get the mean distance and mean age of their points
    fn into_histogram(self, grid: PolarGrid) -> Histogram {
        let mut hist = Histogram::with_grid(grid);
        for (e, z) in iproduct!(0..grid.e_dim, 0..grid.z_dim) {
            let count = self.count[(e, z)];
            if count > 0 {
                hist.set_bin(e, z, OCCUPIED);
                hist.set_dist(e, z, self.dist_sum[(e, z)] / f64::from(count));
                hist.set_age(e, z, (self.age_sum[(e, z)] / u64::from(count)) as u32);
            }
        }
        hist
    }
}

/// Histogram of the freshly cropped cloud as seen from `position`.
///
/// Bins hit by at least one point are set to [`OCCUPIED`] (no accumulation)
/// and store the mean distance of their points.
pub fn generate_new_histogram(cropped_cloud: &PointCloud, position: &Vector3<f64>) -> Histogram {
    let grid = PolarGrid::from_resolution(ALPHA_RES);
    let mut acc = BinAccumulator::new(&grid);
    for point in cropped_cloud.iter() {
        acc.add(&grid, point, position, 0);
    }
    acc.into_histogram(grid)
}

/// Histogram of remembered obstacle points reprojected to `position`.
///
/// Points are binned at twice the angular resolution, so sparse memory still
/// covers contiguous bins, then upsampled to the regular grid.
pub fn propagate_histogram(reprojected_points: &[AgedPoint], position: &Vector3<f64>) -> Histogram {
    let grid = PolarGrid::from_resolution(2 * ALPHA_RES);
    let mut acc = BinAccumulator::new(&grid);
    for p in reprojected_points {
        acc.add(&grid, &p.position, position, p.age);
    }
    acc.into_histogram(grid).upsample()
}

/// Merged histogram plus whether any bin is occupied
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedHistogram {
    pub histogram: Histogram,
    pub hist_empty: bool,
}

/// Merge the fresh histogram with the propagated memory.
///
/// Inside the FOV the fresh bins are taken as they are and occupied ones get
/// age 1. Outside the FOV an occupied propagated bin replaces the fresh one and
/// ages by one cycle, unless the commanded waypoint lies outside the FOV, in
/// which case its age is kept.
pub fn combined_histogram(
    mut new_hist: Histogram,
    propagated_hist: &Histogram,
    waypoint_outside_fov: bool,
    fov: &FieldOfView,
) -> CombinedHistogram {
    let use_memory = propagated_hist.grid() == new_hist.grid();
    if !use_memory {
        log::warn!(
            "Propagated histogram grid {:?} does not match {:?}, ignoring memory",
            propagated_hist.grid().shape(),
            new_hist.grid().shape()
        );
    }

    let z_in_fov = fov.azimuth_mask(new_hist.z_dim());
    let age_increment = if waypoint_outside_fov { 0 } else { 1 };
    let mut hist_empty = true;

    for (e, z) in iproduct!(0..new_hist.e_dim(), 0..new_hist.z_dim()) {
        let inside_fov = z_in_fov[z] && e >= fov.e_fov_min && e <= fov.e_fov_max;
        if !inside_fov && use_memory && propagated_hist.is_occupied(e, z) {
            new_hist.copy_bin_from(propagated_hist, e, z);
            new_hist.set_age(e, z, propagated_hist.get_age(e, z).saturating_add(age_increment));
        } else if new_hist.is_occupied(e, z) {
            new_hist.set_age(e, z, 1);
        }

        if new_hist.is_occupied(e, z) {
            hist_empty = false;
        }
    }

    CombinedHistogram { histogram: new_hist, hist_empty }
}

/// Elevation band folded by [`compress_histogram_elevation`]
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// Half-height of the folded band [deg]
    pub vertical_cap: f64,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { enabled: false, vertical_cap: 15.0 }
    }
}

/// Fold the elevation rows within `±vertical_cap` degrees into a single row.
///
/// Per azimuth column the output is occupied if any bin of the band is
/// occupied, and takes the distance and age of the nearest occupied bin.
pub fn compress_histogram_elevation(input_hist: &Histogram, vertical_cap: f64) -> Histogram {
    let grid = input_hist.grid();
    let cap = vertical_cap.abs().min(90.0);
    let e_min = grid.elevation_angle_to_index(-cap);
    let e_max = grid.elevation_angle_to_index(cap);

    let mut new_hist = Histogram::with_grid(PolarGrid::new(1, grid.z_dim));
    for (e, z) in iproduct!(e_min..=e_max, 0..grid.z_dim) {
        if !input_hist.is_occupied(e, z) {
            continue;
        }
        if !new_hist.is_occupied(0, z) || input_hist.get_dist(e, z) < new_hist.get_dist(0, z) {
            new_hist.set_bin(0, z, input_hist.get_bin(e, z));
            new_hist.set_dist(0, z, input_hist.get_dist(e, z));
            new_hist.set_age(0, z, input_hist.get_age(e, z));
        }
    }
    new_hist
}
