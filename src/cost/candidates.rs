//! Selection of the cheapest travel directions from a cost matrix

use std::collections::BinaryHeap;

use itertools::iproduct;
use nalgebra::DMatrix;
use ordered_float::OrderedFloat;

use crate::common::CandidateDirection;
use crate::cost::MAX_COST;
use crate::geometry::PolarGrid;

/// Heap key: cost first, then row-major scan position
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RankedBin {
    cost: OrderedFloat<f64>,
    scan_index: usize,
}

/// The `number_of_candidates` cheapest bins of `matrix`, best first.
///
/// Bins with equal cost keep row-major scan order (lower elevation index, then
/// lower azimuth index). NaN costs rank as [`MAX_COST`]. The request is clamped
/// to the number of bins.
pub fn get_best_candidates_from_cost_matrix(
    matrix: &DMatrix<f64>,
    number_of_candidates: usize,
) -> Vec<CandidateDirection> {
    let (rows, cols) = matrix.shape();
    let n = number_of_candidates.min(rows * cols);
    if n == 0 {
        return Vec::new();
    }

    // max-heap of the best n seen so far, the worst of them on top
    let mut queue: BinaryHeap<RankedBin> = BinaryHeap::with_capacity(n + 1);
    for (row, col) in iproduct!(0..rows, 0..cols) {
        let raw = matrix[(row, col)];
        let candidate = RankedBin {
            cost: OrderedFloat(if raw.is_nan() { MAX_COST } else { raw }),
            scan_index: row * cols + col,
        };
        if queue.len() < n {
            queue.push(candidate);
        } else if queue.peek().map_or(false, |worst| candidate < *worst) {
            queue.pop();
            queue.push(candidate);
        }
    }

    let grid = PolarGrid::from_shape((rows, cols));
    queue
        .into_sorted_vec()
        .into_iter()
        .map(|bin| {
            let p = grid.index_to_polar(bin.scan_index / cols, bin.scan_index % cols, 1.0);
            CandidateDirection::new(bin.cost.into_inner(), p.e, p.z)
        })
        .collect()
}
