//! Sub-goal direction from the node positions of an external path

use nalgebra::Vector3;

use crate::common::PolarPoint;
use crate::geometry::cartesian_to_polar;

/// Nodes farther than this [m] from the vehicle are not followed
pub const MAX_TREE_NODE_DISTANCE: f64 = 3.0;

// The sub-goal must be at least this far away to define a direction.
const MIN_SUB_GOAL_DISTANCE: f64 = 1e-6;

/// Polar direction to the node following the one closest to `position`.
///
/// `path_node_positions` is in travel order. Returns `None` when the path is
/// empty, the closest node is more than [`MAX_TREE_NODE_DISTANCE`] away, or the
/// closest node is the last one; the caller then steers by the goal alone.
pub fn get_direction_from_tree(path_node_positions: &[Vector3<f64>], position: &Vector3<f64>) -> Option<PolarPoint> {
    let (closest_idx, closest_dist) = path_node_positions
        .iter()
        .enumerate()
        .map(|(i, node)| (i, (node - position).norm()))
        .filter(|(_, d)| d.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })?;

    if closest_dist > MAX_TREE_NODE_DISTANCE {
        log::debug!("Closest path node is {:.2} m away, ignoring the tree", closest_dist);
        return None;
    }

    let sub_goal = path_node_positions.get(closest_idx + 1)?;
    let direction = cartesian_to_polar(sub_goal, position);
    if direction.r.is_finite() && direction.r >= MIN_SUB_GOAL_DISTANCE {
        Some(direction)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path() -> Vec<Vector3<f64>> {
        (0..6).map(|i| Vector3::new(0.0, i as f64, 2.0)).collect()
    }

    #[test]
    fn test_empty_path() {
        assert!(get_direction_from_tree(&[], &Vector3::zeros()).is_none());
    }

    #[test]
    fn test_direction_to_next_node() {
        let path = straight_path();
        let position = Vector3::new(0.1, 1.2, 2.0);
        let p = get_direction_from_tree(&path, &position).unwrap();
        // closest node is (0, 1, 2), the sub-goal (0, 2, 2)
        let expected = cartesian_to_polar(&Vector3::new(0.0, 2.0, 2.0), &position);
        assert!((p.z - expected.z).abs() < 1e-9);
        assert!((p.e - expected.e).abs() < 1e-9);
        assert!((p.r - expected.r).abs() < 1e-9);
        assert!(p.z.abs() < 10.0);
    }

    #[test]
    fn test_closest_node_is_last() {
        let path = straight_path();
        assert!(get_direction_from_tree(&path, &Vector3::new(0.0, 5.2, 2.0)).is_none());
    }

    #[test]
    fn test_path_too_far_away() {
        let path = straight_path();
        assert!(get_direction_from_tree(&path, &Vector3::new(10.0, 2.0, 2.0)).is_none());
    }

    #[test]
    fn test_ties_pick_first_node() {
        let path = vec![Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, -1.0, 0.0), Vector3::new(1.0, 0.0, 0.0)];
        let p = get_direction_from_tree(&path, &Vector3::zeros()).unwrap();
        // nodes 0 and 1 are equally close, so the sub-goal is node 1
        assert!((p.z.abs() - 180.0).abs() < 1e-9);
    }
}
