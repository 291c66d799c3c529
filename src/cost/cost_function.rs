//! Direction cost over the polar histogram
//!
//! The cost of a candidate direction is the sum of independent terms:
//! - goal: angular deviation from the direction to the goal
//! - obstacle: proximity of the obstacle in the candidate bin
//! - smoothness: angular deviation from the last commanded waypoint
//! - tree: angular deviation from the global path sub-goal, when available
//!
//! Angular deviations are in degrees, azimuth differences wrap at ±180°.

use itertools::iproduct;
use nalgebra::{DMatrix, Vector3};
use serde::Deserialize;

use crate::common::{CostTerm, PolarPoint};
use crate::geometry::{azimuth_difference, cartesian_to_polar};
use crate::histogram::Histogram;

/// Cost of a direction that cannot be evaluated safely
pub const MAX_COST: f64 = 1.0e9;

// Reference points closer than this give no usable direction.
const MIN_REFERENCE_DISTANCE: f64 = 1e-6;

/// Weights and thresholds of the cost terms
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostParameters {
    /// Weight of the azimuth deviation from the goal direction [1/deg]
    pub goal_cost_param: f64,
    /// Weight of the elevation deviation from the goal direction [1/deg]
    pub height_change_cost_param: f64,
    /// Weight of the deviation from the last sent waypoint [1/deg]
    pub smooth_cost_param: f64,
    /// Weight of the deviation from the tree sub-goal [1/deg]
    pub tree_cost_param: f64,
    /// Base cost of an occupied bin
    pub obstacle_cost_param: f64,
    /// Obstacles nearer than this [m] are penalized in inverse proportion to their distance
    pub safety_distance: f64,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            goal_cost_param: 2.0,
            height_change_cost_param: 4.0,
            smooth_cost_param: 1.5,
            tree_cost_param: 1.0,
            obstacle_cost_param: 5000.0,
            safety_distance: 1.5,
        }
    }
}

/// Everything a cost term may look at besides the candidate itself
#[derive(Debug, Clone)]
pub struct CostContext<'a> {
    pub params: &'a CostParameters,
    /// Only yaw motion is possible, elevation deviations are ignored
    pub only_yawed: bool,
    pub tree_direction: Option<PolarPoint>,
    facing_goal: Option<PolarPoint>,
    facing_waypoint: Option<PolarPoint>,
}

impl<'a> CostContext<'a> {
    pub fn new(
        goal: Vector3<f64>,
        position: Vector3<f64>,
        last_sent_waypoint: Vector3<f64>,
        params: &'a CostParameters,
        only_yawed: bool,
    ) -> Self {
        Self {
            params,
            only_yawed,
            tree_direction: None,
            facing_goal: direction_to(&goal, &position),
            facing_waypoint: direction_to(&last_sent_waypoint, &position),
        }
    }

    pub fn with_tree_direction(mut self, tree_direction: Option<PolarPoint>) -> Self {
        self.tree_direction = tree_direction;
        self
    }

    /// Direction from the vehicle to the goal, `None` when already there
    pub fn facing_goal(&self) -> Option<PolarPoint> {
        self.facing_goal
    }

    /// Direction from the vehicle to the last sent waypoint, `None` when already there
    pub fn facing_waypoint(&self) -> Option<PolarPoint> {
        self.facing_waypoint
    }

    /// (azimuth, elevation) deviation of `candidate` from `reference` [deg]
    fn deviation(&self, candidate: &PolarPoint, reference: &PolarPoint) -> (f64, f64) {
        let dz = azimuth_difference(candidate.z, reference.z);
        let de = if self.only_yawed { 0.0 } else { (candidate.e - reference.e).abs() };
        (dz, de)
    }
}

fn direction_to(target: &Vector3<f64>, position: &Vector3<f64>) -> Option<PolarPoint> {
    let p = cartesian_to_polar(target, position);
    if p.r.is_finite() && p.r >= MIN_REFERENCE_DISTANCE {
        Some(p)
    } else {
        None
    }
}

pub struct GoalTerm;

impl CostTerm for GoalTerm {
    fn cost(&self, candidate: &PolarPoint, _obstacle_distance: f64, ctx: &CostContext<'_>) -> f64 {
        match ctx.facing_goal {
            Some(goal) => {
                let (dz, de) = ctx.deviation(candidate, &goal);
                ctx.params.goal_cost_param * dz + ctx.params.height_change_cost_param * de
            }
            None => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "goal"
    }
}

pub struct ObstacleTerm;

impl CostTerm for ObstacleTerm {
    fn cost(&self, _candidate: &PolarPoint, obstacle_distance: f64, ctx: &CostContext<'_>) -> f64 {
        if obstacle_distance == 0.0 {
            0.0
        } else if obstacle_distance > 0.0 && obstacle_distance.is_finite() {
            ctx.params.obstacle_cost_param * (ctx.params.safety_distance / obstacle_distance).max(1.0)
        } else {
            MAX_COST
        }
    }

    fn name(&self) -> &'static str {
        "obstacle"
    }
}

pub struct SmoothnessTerm;

impl CostTerm for SmoothnessTerm {
    fn cost(&self, candidate: &PolarPoint, _obstacle_distance: f64, ctx: &CostContext<'_>) -> f64 {
        match ctx.facing_waypoint {
            Some(heading) => {
                let (dz, de) = ctx.deviation(candidate, &heading);
                ctx.params.smooth_cost_param * (dz + de)
            }
            None => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "smoothness"
    }
}

pub struct TreeTerm;

impl CostTerm for TreeTerm {
    fn cost(&self, candidate: &PolarPoint, _obstacle_distance: f64, ctx: &CostContext<'_>) -> f64 {
        match ctx.tree_direction {
            Some(sub_goal) => {
                let (dz, de) = ctx.deviation(candidate, &sub_goal);
                ctx.params.tree_cost_param * (dz + de)
            }
            None => 0.0,
        }
    }

    fn name(&self) -> &'static str {
        "tree"
    }
}

static COST_TERMS: [&(dyn CostTerm + Sync); 4] = [&GoalTerm, &ObstacleTerm, &SmoothnessTerm, &TreeTerm];

/// Sum of all cost terms, clamped to [`MAX_COST`]
pub fn evaluate_candidate(candidate: &PolarPoint, obstacle_distance: f64, ctx: &CostContext<'_>) -> f64 {
    let cost: f64 = COST_TERMS
        .iter()
        .map(|term| {
            let c = term.cost(candidate, obstacle_distance, ctx);
            log::trace!("{} cost {:.3} at e={:.1} z={:.1}", term.name(), c, candidate.e, candidate.z);
            c
        })
        .sum();
    if cost.is_finite() {
        cost.min(MAX_COST)
    } else {
        MAX_COST
    }
}

/// Cost of travelling along (`e_angle`, `z_angle`) [deg].
///
/// `obstacle_distance` is the mean distance of the obstacle in that direction.
/// Exactly 0.0 marks a free bin and adds no obstacle cost; any positive
/// distance, however small, is penalized and reaches [`MAX_COST`] as it
/// approaches zero.
pub fn cost_function(
    e_angle: f64,
    z_angle: f64,
    obstacle_distance: f64,
    goal: &Vector3<f64>,
    position: &Vector3<f64>,
    last_sent_waypoint: &Vector3<f64>,
    cost_params: &CostParameters,
    only_yawed: bool,
) -> f64 {
    let ctx = CostContext::new(*goal, *position, *last_sent_waypoint, cost_params, only_yawed);
    evaluate_candidate(&PolarPoint::new(e_angle, z_angle, 1.0), obstacle_distance, &ctx)
}

/// Cost of every bin of `histogram`, same shape as the histogram.
///
/// Occupied bins use their mean obstacle distance as the proximity signal;
/// an occupied bin without a valid distance costs [`MAX_COST`].
pub fn get_cost_matrix(
    histogram: &Histogram,
    goal: &Vector3<f64>,
    position: &Vector3<f64>,
    last_sent_waypoint: &Vector3<f64>,
    cost_params: &CostParameters,
    only_yawed: bool,
    tree_direction: Option<PolarPoint>,
) -> DMatrix<f64> {
    let grid = histogram.grid();
    let ctx = CostContext::new(*goal, *position, *last_sent_waypoint, cost_params, only_yawed)
        .with_tree_direction(tree_direction);

    let mut cost_matrix = DMatrix::zeros(grid.e_dim, grid.z_dim);
    for (e, z) in iproduct!(0..grid.e_dim, 0..grid.z_dim) {
        let obstacle_distance = if histogram.is_occupied(e, z) {
            let d = histogram.get_dist(e, z);
            if !(d > 0.0 && d.is_finite()) {
                cost_matrix[(e, z)] = MAX_COST;
                continue;
            }
            d
        } else {
            0.0
        };
        let candidate = grid.index_to_polar(e, z, 1.0);
        cost_matrix[(e, z)] = evaluate_candidate(&candidate, obstacle_distance, &ctx);
    }
    cost_matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{azimuth_angle_to_index, elevation_angle_to_index, ALPHA_RES};
    use crate::histogram::OCCUPIED;

    fn context(params: &CostParameters, only_yawed: bool) -> CostContext<'_> {
        // goal straight ahead along +y, last waypoint along +x
        CostContext::new(Vector3::new(0.0, 10.0, 0.0), Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0), params, only_yawed)
    }

    #[test]
    fn test_goal_direction_is_cheapest() {
        let params = CostParameters::default();
        let goal = Vector3::new(0.0, 10.0, 0.0);
        let position = Vector3::zeros();
        let toward = cost_function(0.0, 0.0, 0.0, &goal, &position, &goal, &params, false);
        let sideways = cost_function(0.0, 90.0, 0.0, &goal, &position, &goal, &params, false);
        let behind = cost_function(0.0, 180.0, 0.0, &goal, &position, &goal, &params, false);
        assert!(toward.abs() < 1e-9);
        assert!(toward < sideways);
        assert!(sideways < behind);
    }

    #[test]
    fn test_goal_term_wraps_azimuth() {
        let params = CostParameters::default();
        let ctx = CostContext::new(Vector3::new(-0.1, -10.0, 0.0), Vector3::zeros(), Vector3::zeros(), &params, false);
        // goal just left of -180, candidate at +177: 3 degrees apart across the seam
        let goal_z = ctx.facing_goal().unwrap().z;
        let cost = GoalTerm.cost(&PolarPoint::new(0.0, 177.0, 1.0), 0.0, &ctx);
        let expected = params.goal_cost_param * azimuth_difference(177.0, goal_z);
        assert!((cost - expected).abs() < 1e-9);
        assert!(cost < params.goal_cost_param * 4.0);
    }

    #[test]
    fn test_obstacle_term_grows_near_obstacles() {
        let params = CostParameters::default();
        let ctx = context(&params, false);
        let free = ObstacleTerm.cost(&PolarPoint::new(0.0, 0.0, 1.0), 0.0, &ctx);
        let far = ObstacleTerm.cost(&PolarPoint::new(0.0, 0.0, 1.0), 5.0, &ctx);
        let at_safety = ObstacleTerm.cost(&PolarPoint::new(0.0, 0.0, 1.0), params.safety_distance, &ctx);
        let near = ObstacleTerm.cost(&PolarPoint::new(0.0, 0.0, 1.0), 0.3, &ctx);
        assert_eq!(free, 0.0);
        assert!((far - params.obstacle_cost_param).abs() < 1e-9);
        assert!((at_safety - params.obstacle_cost_param).abs() < 1e-9);
        assert!(near > far);
        assert_eq!(ObstacleTerm.cost(&PolarPoint::new(0.0, 0.0, 1.0), f64::NAN, &ctx), MAX_COST);
    }

    #[test]
    fn test_obstacle_dominates_direction_terms() {
        let params = CostParameters::default();
        let goal = Vector3::new(0.0, 10.0, 0.0);
        let position = Vector3::zeros();
        let blocked = cost_function(0.0, 0.0, 4.0, &goal, &position, &goal, &params, false);
        let worst_free = cost_function(-87.0, 177.0, 0.0, &goal, &position, &goal, &params, false);
        assert!(blocked > worst_free);
        let touching = cost_function(0.0, 0.0, 1e-12, &goal, &position, &goal, &params, false);
        assert_eq!(touching, MAX_COST);
    }

    #[test]
    fn test_smoothness_term() {
        let params = CostParameters::default();
        let ctx = context(&params, false);
        let aligned = SmoothnessTerm.cost(&PolarPoint::new(0.0, 90.0, 1.0), 0.0, &ctx);
        let opposite = SmoothnessTerm.cost(&PolarPoint::new(0.0, -90.0, 1.0), 0.0, &ctx);
        assert!(aligned.abs() < 1e-9);
        assert!((opposite - params.smooth_cost_param * 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_yawed_ignores_elevation() {
        let params = CostParameters::default();
        let goal = Vector3::new(0.0, 10.0, 0.0);
        let position = Vector3::zeros();
        let level = cost_function(0.0, 0.0, 0.0, &goal, &position, &goal, &params, true);
        let climbing = cost_function(30.0, 0.0, 0.0, &goal, &position, &goal, &params, true);
        assert!((level - climbing).abs() < 1e-9);
        let climbing_free = cost_function(30.0, 0.0, 0.0, &goal, &position, &goal, &params, false);
        assert!(climbing_free > climbing);
    }

    #[test]
    fn test_degenerate_references_contribute_nothing() {
        let params = CostParameters::default();
        let position = Vector3::new(1.0, 2.0, 3.0);
        let cost = cost_function(12.0, -60.0, 0.0, &position, &position, &position, &params, false);
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_tree_term_only_with_direction() {
        let params = CostParameters::default();
        let ctx = context(&params, false);
        let candidate = PolarPoint::new(0.0, 45.0, 1.0);
        assert_eq!(TreeTerm.cost(&candidate, 0.0, &ctx), 0.0);
        let ctx = ctx.with_tree_direction(Some(PolarPoint::new(0.0, -45.0, 3.0)));
        assert!((TreeTerm.cost(&candidate, 0.0, &ctx) - params.tree_cost_param * 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_term_names_are_distinct() {
        let names: Vec<&str> = COST_TERMS.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["goal", "obstacle", "smoothness", "tree"]);
    }

    #[test]
    fn test_get_cost_matrix() {
        let params = CostParameters::default();
        let goal = Vector3::new(0.0, 10.0, 0.0);
        let position = Vector3::zeros();

        let mut hist = Histogram::default();
        let e = elevation_angle_to_index(3.0, ALPHA_RES);
        let z = azimuth_angle_to_index(3.0, ALPHA_RES);
        hist.set_bin(e, z, OCCUPIED);
        hist.set_dist(e, z, 2.0);
        // occupied without a distance
        hist.set_bin(0, 0, OCCUPIED);

        let cost_matrix = get_cost_matrix(&hist, &goal, &position, &goal, &params, false, None);
        assert_eq!(cost_matrix.shape(), (hist.e_dim(), hist.z_dim()));
        assert_eq!(cost_matrix[(0, 0)], MAX_COST);
        assert!(cost_matrix[(e, z)] >= params.obstacle_cost_param);

        let grid = hist.grid();
        let p = grid.index_to_polar(e, z + 1, 1.0);
        let expected = cost_function(p.e, p.z, 0.0, &goal, &position, &goal, &params, false);
        assert!((cost_matrix[(e, z + 1)] - expected).abs() < 1e-9);
        assert!(cost_matrix[(e, z + 1)] < cost_matrix[(e, z)]);
    }
}
