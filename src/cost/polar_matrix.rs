//! Padding and smoothing of polar (elevation x azimuth) matrices
//!
//! Columns are azimuth and continue circularly across the ±180° seam.
//! Rows are elevation and do not wrap.

use nalgebra::DMatrix;
use serde::Deserialize;

/// How rows beyond the elevation edges are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationPadding {
    /// Replicate the edge row
    Clamp,
    /// Continue over the pole: mirror the rows and rotate them by half a revolution.
    /// Needs an even number of columns, falls back to `Clamp` otherwise.
    AcrossPole,
}

impl Default for ElevationPadding {
    fn default() -> Self {
        ElevationPadding::Clamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub smoothing_radius: usize,
    pub elevation_padding: ElevationPadding,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { smoothing_radius: 2, elevation_padding: ElevationPadding::Clamp }
    }
}

/// Pad `matrix` by `n_lines_padding` on every side, clamping the elevation edges
pub fn pad_polar_matrix(matrix: &DMatrix<f64>, n_lines_padding: usize) -> DMatrix<f64> {
    pad_polar_matrix_with(matrix, n_lines_padding, ElevationPadding::Clamp)
}

pub fn pad_polar_matrix_with(matrix: &DMatrix<f64>, n_lines_padding: usize, padding: ElevationPadding) -> DMatrix<f64> {
    let (rows, cols) = matrix.shape();
    let n = n_lines_padding;
    if rows == 0 || cols == 0 {
        return DMatrix::zeros(rows + 2 * n, cols + 2 * n);
    }

    let padding = if padding == ElevationPadding::AcrossPole && cols % 2 != 0 {
        log::warn!("Cannot pad across the pole with {} azimuth columns, clamping instead", cols);
        ElevationPadding::Clamp
    } else {
        padding
    };

    let (rows_i, n_i) = (rows as i64, n as i64);
    let half_turn = (cols / 2) as i64;
    DMatrix::from_fn(rows + 2 * n, cols + 2 * n, |pr, pc| {
        let r = pr as i64 - n_i;
        let c = pc as i64 - n_i;
        let (src_r, shift) = match padding {
            _ if r >= 0 && r < rows_i => (r, 0),
            ElevationPadding::Clamp => (r.max(0).min(rows_i - 1), 0),
            ElevationPadding::AcrossPole if r < 0 => ((-r - 1).min(rows_i - 1), half_turn),
            ElevationPadding::AcrossPole => ((2 * rows_i - r - 1).max(0), half_turn),
        };
        let src_c = (c + shift).rem_euclid(cols as i64);
        matrix[(src_r as usize, src_c as usize)]
    })
}

/// Interior of a matrix padded by `n_lines_padding`
pub fn trim_polar_matrix(matrix_padded: &DMatrix<f64>, n_lines_padding: usize) -> DMatrix<f64> {
    let n = n_lines_padding;
    let (rows, cols) = matrix_padded.shape();
    let rows = rows.saturating_sub(2 * n);
    let cols = cols.saturating_sub(2 * n);
    DMatrix::from_fn(rows, cols, |r, c| matrix_padded[(r + n, c + n)])
}

/// Smooth `matrix` in place with a triangular kernel of `smoothing_radius` bins.
///
/// A radius of 0 leaves the matrix unchanged.
pub fn smooth_polar_matrix(matrix: &mut DMatrix<f64>, smoothing_radius: usize) {
    smooth_polar_matrix_with(matrix, smoothing_radius, ElevationPadding::Clamp);
}

pub fn smooth_polar_matrix_with(matrix: &mut DMatrix<f64>, smoothing_radius: usize, padding: ElevationPadding) {
    let (rows, cols) = matrix.shape();
    if smoothing_radius == 0 || rows == 0 || cols == 0 {
        return;
    }
    let r = smoothing_radius;
    let padded = pad_polar_matrix_with(matrix, r, padding);

    let kernel: Vec<f64> = (0..=2 * r)
        .map(|k| (r + 1 - (k as i64 - r as i64).unsigned_abs() as usize) as f64)
        .collect();
    let kernel_sum: f64 = kernel.iter().sum();

    // azimuth pass on every padded row, then elevation pass on the interior
    let horizontal = DMatrix::from_fn(rows + 2 * r, cols, |pr, c| {
        kernel.iter().enumerate().map(|(k, w)| w * padded[(pr, c + k)]).sum::<f64>() / kernel_sum
    });
    *matrix = DMatrix::from_fn(rows, cols, |row, c| {
        kernel.iter().enumerate().map(|(k, w)| w * horizontal[(row + k, c)]).sum::<f64>() / kernel_sum
    });
}
