//! Common traits defining the seams of the planning pipeline

use crate::common::types::PolarPoint;
use crate::cost::CostContext;

/// One additive term of the direction cost.
///
/// Terms are pure: the same candidate and context always yield the same
/// weighted cost. The cost engine sums all terms of a candidate.
pub trait CostTerm {
    /// Weighted cost of travelling along `candidate`, given the mean distance
    /// of the obstacle in that bin (0.0 when the bin is free).
    fn cost(&self, candidate: &PolarPoint, obstacle_distance: f64, ctx: &CostContext<'_>) -> f64;

    /// Short name used when tracing per-term costs
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostParameters;
    use nalgebra::Vector3;

    struct ConstantTerm(f64);

    impl CostTerm for ConstantTerm {
        fn cost(&self, _candidate: &PolarPoint, _obstacle_distance: f64, _ctx: &CostContext<'_>) -> f64 {
            self.0
        }

        fn name(&self) -> &'static str {
            "constant"
        }
    }

    #[test]
    fn test_cost_term_trait_object() {
        let params = CostParameters::default();
        let ctx = CostContext::new(Vector3::new(0.0, 5.0, 0.0), Vector3::zeros(), Vector3::zeros(), &params, false);
        let terms: Vec<Box<dyn CostTerm>> = vec![Box::new(ConstantTerm(1.5)), Box::new(ConstantTerm(2.0))];
        let total: f64 = terms.iter().map(|t| t.cost(&PolarPoint::new(0.0, 0.0, 1.0), 0.0, &ctx)).sum();
        assert!((total - 3.5).abs() < 1e-12);
        assert_eq!(terms[0].name(), "constant");
    }
}
