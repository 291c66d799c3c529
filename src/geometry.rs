//! Polar geometry and histogram bin indexing
//!
//! Conventions used by every stage of the planner:
//! - azimuth `z = atan2(dx, dy)` in degrees, 0 along +y and +90 along +x,
//!   circular over [-180, 180)
//! - elevation `e = atan2(dz, hypot(dx, dy))` in degrees, clamped to [-90, 90]
//!
//! All wrap-around and clamping of bin indices goes through [`PolarGrid`].

use nalgebra::Vector3;

use crate::common::PolarPoint;

/// Angular width of one histogram bin [deg]
pub const ALPHA_RES: usize = 6;
/// Number of elevation bins at `ALPHA_RES`
pub const GRID_LENGTH_E: usize = 180 / ALPHA_RES;
/// Number of azimuth bins at `ALPHA_RES`
pub const GRID_LENGTH_Z: usize = 360 / ALPHA_RES;

pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

// Angles within this fraction of a bin below an edge snap to the upper bin.
const BIN_EDGE_TOLERANCE: f64 = 1e-6;

/// Wrap an angle in degrees to [-180, 180)
pub fn wrap_angle_to_plus_minus_180(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Absolute angular difference between two azimuths, in [0, 180]
pub fn azimuth_difference(a: f64, b: f64) -> f64 {
    wrap_angle_to_plus_minus_180(a - b).abs()
}

/// Cartesian point at polar offset `p` from `origin`
pub fn polar_to_cartesian(p: &PolarPoint, origin: &Vector3<f64>) -> Vector3<f64> {
    let e = p.e * DEG_TO_RAD;
    let z = p.z * DEG_TO_RAD;
    Vector3::new(
        origin.x + p.r * e.cos() * z.sin(),
        origin.y + p.r * e.cos() * z.cos(),
        origin.z + p.r * e.sin(),
    )
}

/// Polar offset of `point` as seen from `origin`.
///
/// A point coinciding with the origin maps to (0, 0, 0).
pub fn cartesian_to_polar(point: &Vector3<f64>, origin: &Vector3<f64>) -> PolarPoint {
    let d = point - origin;
    let horizontal = d.x.hypot(d.y);
    PolarPoint {
        e: d.z.atan2(horizontal) * RAD_TO_DEG,
        z: d.x.atan2(d.y) * RAD_TO_DEG,
        r: d.norm(),
    }
}

/// Dimensions of a polar grid over elevation [-90, 90] and azimuth [-180, 180).
///
/// Elevation indices are clamped, azimuth indices wrap modulo `z_dim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolarGrid {
    pub e_dim: usize,
    pub z_dim: usize,
}

impl PolarGrid {
    pub fn new(e_dim: usize, z_dim: usize) -> Self {
        Self { e_dim: e_dim.max(1), z_dim: z_dim.max(1) }
    }

    /// Grid with square bins of `resolution` degrees
    pub fn from_resolution(resolution: usize) -> Self {
        let res = resolution.max(1).min(180) as f64;
        Self::new((180.0 / res).round() as usize, (360.0 / res).round() as usize)
    }

    /// Grid matching the shape of a cost or histogram matrix
    pub fn from_shape(shape: (usize, usize)) -> Self {
        Self::new(shape.0, shape.1)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.e_dim, self.z_dim)
    }

    /// Elevation bin width [deg]
    pub fn e_res(&self) -> f64 {
        180.0 / self.e_dim as f64
    }

    /// Azimuth bin width [deg]
    pub fn z_res(&self) -> f64 {
        360.0 / self.z_dim as f64
    }

    pub fn wrap_azimuth_index(&self, index: i64) -> usize {
        index.rem_euclid(self.z_dim as i64) as usize
    }

    pub fn clamp_elevation_index(&self, index: i64) -> usize {
        index.max(0).min(self.e_dim as i64 - 1) as usize
    }

    pub fn elevation_angle_to_index(&self, e: f64) -> usize {
        let idx = ((e + 90.0) / self.e_res() + BIN_EDGE_TOLERANCE).floor();
        self.clamp_elevation_index(idx as i64)
    }

    pub fn azimuth_angle_to_index(&self, z: f64) -> usize {
        let idx = ((z + 180.0) / self.z_res() + BIN_EDGE_TOLERANCE).floor();
        self.wrap_azimuth_index(idx as i64)
    }

    /// Elevation at the center of bin `e`
    pub fn elevation_index_to_angle(&self, e: usize) -> f64 {
        e as f64 * self.e_res() + self.e_res() / 2.0 - 90.0
    }

    /// Azimuth at the center of bin `z`
    pub fn azimuth_index_to_angle(&self, z: usize) -> f64 {
        z as f64 * self.z_res() + self.z_res() / 2.0 - 180.0
    }

    pub fn index_to_polar(&self, e: usize, z: usize, radius: f64) -> PolarPoint {
        PolarPoint::new(self.elevation_index_to_angle(e), self.azimuth_index_to_angle(z), radius)
    }

    /// (elevation index, azimuth index) of the bin containing `p`
    pub fn polar_to_index(&self, p: &PolarPoint) -> (usize, usize) {
        (self.elevation_angle_to_index(p.e), self.azimuth_angle_to_index(p.z))
    }
}

impl Default for PolarGrid {
    fn default() -> Self {
        Self::new(GRID_LENGTH_E, GRID_LENGTH_Z)
    }
}

/// Elevation bin of angle `e` on a grid of `resolution` degrees
pub fn elevation_angle_to_index(e: f64, resolution: usize) -> usize {
    PolarGrid::from_resolution(resolution).elevation_angle_to_index(e)
}

/// Azimuth bin of angle `z` on a grid of `resolution` degrees
pub fn azimuth_angle_to_index(z: f64, resolution: usize) -> usize {
    PolarGrid::from_resolution(resolution).azimuth_angle_to_index(z)
}
