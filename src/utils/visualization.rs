//! Visualization of polar histograms and cost matrices
//!
//! Plots are drawn over (azimuth, elevation) in degrees using gnuplot.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, PointSize, PointSymbol};
use nalgebra::DMatrix;

use crate::common::{CandidateDirection, PlannerError, PlannerResult};
use crate::geometry::PolarGrid;
use crate::histogram::Histogram;

/// Color palette for consistent styling
pub mod colors {
    pub const OBSTACLE: &str = "#000000";
    pub const BEST: &str = "#FF0000";
    pub const CANDIDATE: &str = "#FFA500";
}

/// Bin centers (azimuth, elevation) of a grid
fn bin_centers(grid: &PolarGrid, bins: impl Iterator<Item = (usize, usize)>) -> (Vec<f64>, Vec<f64>) {
    bins.map(|(e, z)| (grid.azimuth_index_to_angle(z), grid.elevation_index_to_angle(e))).unzip()
}

/// Polar plot built up from layers and rendered on save
#[derive(Debug, Clone, Default)]
pub struct PolarPlot {
    title: String,
    cost_matrix: Option<DMatrix<f64>>,
    obstacles: (Vec<f64>, Vec<f64>),
    candidates: (Vec<f64>, Vec<f64>),
}

impl PolarPlot {
    pub fn new(title: &str) -> Self {
        Self { title: title.to_string(), ..Default::default() }
    }

    /// Cost matrix as a heat map. Costs are log-scaled so obstacles do not
    /// wash out the goal and smoothness terms.
    pub fn plot_cost_matrix(&mut self, matrix: &DMatrix<f64>) -> &mut Self {
        self.cost_matrix = Some(matrix.map(|c| if c.is_finite() && c > 0.0 { c.ln_1p() } else { 0.0 }));
        self
    }

    /// Occupied bins of `histogram` as points
    pub fn plot_histogram(&mut self, histogram: &Histogram) -> &mut Self {
        let grid = histogram.grid();
        let occupied = itertools::iproduct!(0..grid.e_dim, 0..grid.z_dim).filter(|&(e, z)| histogram.is_occupied(e, z));
        self.obstacles = bin_centers(&grid, occupied);
        self
    }

    /// Candidate directions, best first
    pub fn plot_candidates(&mut self, candidates: &[CandidateDirection]) -> &mut Self {
        self.candidates = candidates.iter().map(|c| (c.azimuth(), c.elevation())).unzip();
        self
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.0.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.0.len()
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        {
            let axes = figure.axes2d();
            axes.set_title(&self.title, &[]);
            axes.set_x_label("Azimuth [deg]", &[]);
            axes.set_y_label("Elevation [deg]", &[]);
            axes.set_x_range(AutoOption::Fix(-180.0), AutoOption::Fix(180.0));
            axes.set_y_range(AutoOption::Fix(-90.0), AutoOption::Fix(90.0));

            if let Some(matrix) = &self.cost_matrix {
                let (rows, cols) = matrix.shape();
                // gnuplot expects row-major data
                let data: Vec<f64> = (0..rows).flat_map(|r| (0..cols).map(move |c| (r, c))).map(|rc| matrix[rc]).collect();
                axes.image(data, rows, cols, Some((-180.0, -90.0, 180.0, 90.0)), &[]);
            }
            if !self.obstacles.0.is_empty() {
                axes.points(
                    &self.obstacles.0,
                    &self.obstacles.1,
                    &[Caption("Obstacles"), Color(colors::OBSTACLE), PointSymbol('S'), PointSize(0.8)],
                );
            }
            if let (Some(&bz), Some(&be)) = (self.candidates.0.first(), self.candidates.1.first()) {
                axes.points(
                    &self.candidates.0[1..],
                    &self.candidates.1[1..],
                    &[Caption("Candidates"), Color(colors::CANDIDATE), PointSymbol('O'), PointSize(1.0)],
                );
                axes.points(&[bz], &[be], &[Caption("Best"), Color(colors::BEST), PointSymbol('*'), PointSize(2.0)]);
            }
        }
        figure
    }

    /// Save plot to SVG file
    pub fn save_svg(&self, path: &str) -> PlannerResult<()> {
        self.render()
            .save_to_svg(path, 900, 500)
            .map_err(|e| PlannerError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
    }
}
