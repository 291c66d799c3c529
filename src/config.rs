//! Planner configuration
//!
//! Every section is optional in the TOML file and falls back to its defaults.
//!
//! ```toml
//! [fov]
//! h_fov = 59.0
//! v_fov = 46.0
//!
//! [cost]
//! goal_cost_param = 2.0
//! obstacle_cost_param = 5000.0
//!
//! [smoothing]
//! smoothing_radius = 2
//! elevation_padding = "across_pole"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::common::{PlannerError, PlannerResult};
use crate::cost::{CostParameters, SmoothingConfig};
use crate::geometry::{GRID_LENGTH_E, GRID_LENGTH_Z};
use crate::histogram::CompressionConfig;
use crate::perception::FilterConfig;
use crate::planner::MemoryConfig;

/// Sensor opening angles [deg]
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FovConfig {
    pub h_fov: f64,
    pub v_fov: f64,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self { h_fov: 59.0, v_fov: 46.0 }
    }
}

/// Crop box around the vehicle [m]
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    pub radius: f64,
    /// Height above ground below which returns are cropped
    pub ground_distance: f64,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self { radius: 12.0, ground_distance: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    pub number_of_candidates: usize,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self { number_of_candidates: 8 }
    }
}

/// Full planner configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub fov: FovConfig,
    #[serde(default, rename = "box")]
    pub histogram_box: BoxConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub cost: CostParameters,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub candidates: CandidateConfig,
    #[serde(default)]
    pub compression: CompressionConfig,
}

fn clamp_f64(name: &str, value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        log::warn!("{} = {} is not finite, using {}", name, value, fallback);
        return fallback;
    }
    let clamped = value.max(min).min(max);
    if clamped != value {
        log::warn!("{} = {} out of [{}, {}], clamped to {}", name, value, min, max, clamped);
    }
    clamped
}

impl PlannerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse from a TOML string
    pub fn from_toml_str(contents: &str) -> PlannerResult<Self> {
        let config: PlannerConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Parse from a TOML string, rejecting values that would be clamped
    pub fn from_toml_str_strict(contents: &str) -> PlannerResult<Self> {
        let config = Self::from_toml_str(contents)?;
        if config.sanitized() != config {
            return Err(PlannerError::InvalidParameter(
                "configuration contains out-of-range values".to_string(),
            ));
        }
        Ok(config)
    }

    /// Copy with every inconsistent value clamped to the nearest valid one.
    ///
    /// Misconfiguration never stops the planner; each clamp is logged.
    pub fn sanitized(self) -> Self {
        let mut c = self;
        let defaults = PlannerConfig::default();

        c.fov.h_fov = clamp_f64("fov.h_fov", c.fov.h_fov, 1.0, 360.0, defaults.fov.h_fov);
        c.fov.v_fov = clamp_f64("fov.v_fov", c.fov.v_fov, 1.0, 180.0, defaults.fov.v_fov);

        c.histogram_box.radius =
            clamp_f64("box.radius", c.histogram_box.radius, 0.0, f64::MAX, defaults.histogram_box.radius);
        c.histogram_box.ground_distance = clamp_f64(
            "box.ground_distance",
            c.histogram_box.ground_distance,
            0.0,
            f64::MAX,
            defaults.histogram_box.ground_distance,
        );

        c.filter.min_dist_backoff = clamp_f64(
            "filter.min_dist_backoff",
            c.filter.min_dist_backoff,
            0.0,
            f64::MAX,
            defaults.filter.min_dist_backoff,
        );
        c.filter.min_realsense_dist = clamp_f64(
            "filter.min_realsense_dist",
            c.filter.min_realsense_dist,
            0.0,
            f64::MAX,
            defaults.filter.min_realsense_dist,
        );

        let weight = |name: &str, v: f64, fallback: f64| clamp_f64(name, v, 0.0, f64::MAX, fallback);
        c.cost.goal_cost_param = weight("cost.goal_cost_param", c.cost.goal_cost_param, defaults.cost.goal_cost_param);
        c.cost.height_change_cost_param = weight(
            "cost.height_change_cost_param",
            c.cost.height_change_cost_param,
            defaults.cost.height_change_cost_param,
        );
        c.cost.smooth_cost_param =
            weight("cost.smooth_cost_param", c.cost.smooth_cost_param, defaults.cost.smooth_cost_param);
        c.cost.tree_cost_param = weight("cost.tree_cost_param", c.cost.tree_cost_param, defaults.cost.tree_cost_param);
        c.cost.obstacle_cost_param =
            weight("cost.obstacle_cost_param", c.cost.obstacle_cost_param, defaults.cost.obstacle_cost_param);
        c.cost.safety_distance = weight("cost.safety_distance", c.cost.safety_distance, defaults.cost.safety_distance);

        let max_radius = GRID_LENGTH_Z / 2;
        if c.smoothing.smoothing_radius > max_radius {
            log::warn!(
                "smoothing.smoothing_radius = {} exceeds {}, clamped",
                c.smoothing.smoothing_radius,
                max_radius
            );
            c.smoothing.smoothing_radius = max_radius;
        }

        c.memory.max_distance =
            clamp_f64("memory.max_distance", c.memory.max_distance, 0.0, f64::MAX, defaults.memory.max_distance);

        let n_bins = GRID_LENGTH_E * GRID_LENGTH_Z;
        let n = c.candidates.number_of_candidates;
        if n == 0 || n > n_bins {
            let clamped = n.max(1).min(n_bins);
            log::warn!("candidates.number_of_candidates = {} out of [1, {}], clamped to {}", n, n_bins, clamped);
            c.candidates.number_of_candidates = clamped;
        }

        c.compression.vertical_cap = clamp_f64(
            "compression.vertical_cap",
            c.compression.vertical_cap,
            0.0,
            90.0,
            defaults.compression.vertical_cap,
        );

        c
    }
}
