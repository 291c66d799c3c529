//! One planning cycle: from point clouds and pose to ranked travel directions

use nalgebra::{DMatrix, Vector3};

use crate::common::{CandidateDirection, PointCloud, PolarPoint, Pose3D};
use crate::config::PlannerConfig;
use crate::cost::{get_best_candidates_from_cost_matrix, get_cost_matrix, smooth_polar_matrix_with};
use crate::geometry::{cartesian_to_polar, PolarGrid};
use crate::histogram::{
    combined_histogram, compress_histogram_elevation, generate_new_histogram, propagate_histogram, Histogram,
};
use crate::perception::{calculate_fov, filter_point_cloud, ClosestPoint, FieldOfView, HistogramBox};
use crate::planner::{get_direction_from_tree, ObstacleMemory};

/// Snapshot of everything one cycle reads
#[derive(Debug, Clone)]
pub struct PlannerInput {
    pub clouds: Vec<PointCloud>,
    pub pose: Pose3D,
    pub goal: Vector3<f64>,
    pub last_sent_waypoint: Vector3<f64>,
    /// Node positions of the global path in travel order, may be empty
    pub path_node_positions: Vec<Vector3<f64>>,
    pub only_yawed: bool,
}

impl PlannerInput {
    /// Input without clouds or path; the last waypoint defaults to the goal
    pub fn new(pose: Pose3D, goal: Vector3<f64>) -> Self {
        Self {
            clouds: Vec::new(),
            pose,
            goal,
            last_sent_waypoint: goal,
            path_node_positions: Vec::new(),
            only_yawed: false,
        }
    }

    pub fn with_clouds(mut self, clouds: Vec<PointCloud>) -> Self {
        self.clouds = clouds;
        self
    }

    pub fn with_last_sent_waypoint(mut self, waypoint: Vector3<f64>) -> Self {
        self.last_sent_waypoint = waypoint;
        self
    }

    pub fn with_path(mut self, path_node_positions: Vec<Vector3<f64>>) -> Self {
        self.path_node_positions = path_node_positions;
        self
    }
}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct PlannerOutput {
    /// Ranked directions, best first
    pub candidates: Vec<CandidateDirection>,
    /// Fresh and remembered obstacles merged, before elevation compression
    pub histogram: Histogram,
    pub hist_empty: bool,
    /// Smoothed cost matrix the candidates were picked from
    pub cost_matrix: DMatrix<f64>,
    pub fov: FieldOfView,
    pub closest_point: Option<ClosestPoint>,
    pub counter_backoff: u32,
    pub tree_direction: Option<PolarPoint>,
    pub waypoint_outside_fov: bool,
}

impl PlannerOutput {
    pub fn best_candidate(&self) -> Option<&CandidateDirection> {
        self.candidates.first()
    }
}

/// Histogram-based local planner.
///
/// Owns the state that lives across cycles: the crop box, the obstacle
/// memory and the backoff counter.
#[derive(Debug, Clone)]
pub struct LocalPlanner {
    config: PlannerConfig,
    histogram_box: HistogramBox,
    memory: ObstacleMemory,
    counter_backoff: u32,
}

impl LocalPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let config = config.sanitized();
        Self {
            histogram_box: HistogramBox::new(config.histogram_box.radius),
            memory: ObstacleMemory::new(&config.memory),
            counter_backoff: 0,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn memory(&self) -> &ObstacleMemory {
        &self.memory
    }

    pub fn counter_backoff(&self) -> u32 {
        self.counter_backoff
    }

    /// Forget all obstacles and the backoff state
    pub fn reset(&mut self) {
        self.memory.clear();
        self.counter_backoff = 0;
        log::info!("Local planner reset");
    }

    pub fn run_cycle(&mut self, input: &PlannerInput) -> PlannerOutput {
        let position = input.pose.position;

        self.histogram_box.set_box_limits(&position, self.config.histogram_box.ground_distance);
        let filtered = filter_point_cloud(
            &input.clouds,
            &self.config.filter,
            &self.histogram_box,
            &position,
            self.counter_backoff,
        );
        self.counter_backoff = filtered.counter_backoff;

        let fov = calculate_fov(self.config.fov.h_fov, self.config.fov.v_fov, input.pose.yaw, input.pose.pitch);
        let waypoint_outside_fov = is_outside_fov(&fov, &input.last_sent_waypoint, &position);

        let new_hist = generate_new_histogram(&filtered.cropped_cloud, &position);
        let propagated = propagate_histogram(self.memory.points(), &position);
        let combined = combined_histogram(new_hist, &propagated, waypoint_outside_fov, &fov);

        let tree_direction = get_direction_from_tree(&input.path_node_positions, &position);
        if tree_direction.is_none() && !input.path_node_positions.is_empty() {
            log::debug!("No usable path node, steering by the goal only");
        }

        let mut cost_matrix = {
            let compressed;
            let cost_hist = if self.config.compression.enabled {
                compressed = compress_histogram_elevation(&combined.histogram, self.config.compression.vertical_cap);
                &compressed
            } else {
                &combined.histogram
            };
            get_cost_matrix(
                cost_hist,
                &input.goal,
                &position,
                &input.last_sent_waypoint,
                &self.config.cost,
                input.only_yawed,
                tree_direction,
            )
        };
        smooth_polar_matrix_with(
            &mut cost_matrix,
            self.config.smoothing.smoothing_radius,
            self.config.smoothing.elevation_padding,
        );
        let candidates =
            get_best_candidates_from_cost_matrix(&cost_matrix, self.config.candidates.number_of_candidates);

        self.memory.reproject_histogram(&combined.histogram, &position);

        log::debug!(
            "Cycle: {} cropped points, {} occupied bins, {} remembered points, backoff {}",
            filtered.cropped_cloud.len(),
            combined.histogram.occupied_count(),
            self.memory.len(),
            self.counter_backoff
        );
        if let Some(best) = candidates.first() {
            log::debug!("Best direction e={:.1} z={:.1} cost={:.2}", best.elevation(), best.azimuth(), best.cost);
        }

        PlannerOutput {
            candidates,
            histogram: combined.histogram,
            hist_empty: combined.hist_empty,
            cost_matrix,
            fov,
            closest_point: filtered.closest_point,
            counter_backoff: self.counter_backoff,
            tree_direction,
            waypoint_outside_fov,
        }
    }
}

impl Default for LocalPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

// A waypoint at the vehicle position counts as inside the FOV.
fn is_outside_fov(fov: &FieldOfView, waypoint: &Vector3<f64>, position: &Vector3<f64>) -> bool {
    let p = cartesian_to_polar(waypoint, position);
    if !(p.r.is_finite() && p.r > 0.0) {
        return false;
    }
    let (e, z) = PolarGrid::default().polar_to_index(&p);
    !fov.contains(e, z)
}
