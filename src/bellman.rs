//! The Bellman operator `T`: one sweep of per-state optimization.

use nalgebra::DVector;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::interp::PiecewiseLinear;
use crate::model::{ModelParameters, OfferDistribution, StateGrid};
use crate::objective::StateObjective;
use crate::optimizer::{optimize_state, SearchStrategy, StatePolicy};

/// Optimal effort pair per grid point, produced as a byproduct of applying
/// the operator in policy mode.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyPair {
    /// Optimal search effort `s*` aligned to the state grid.
    pub search: DVector<f64>,
    /// Optimal investment effort `φ*` aligned to the state grid.
    pub investment: DVector<f64>,
}

/// Applies the per-state optimization at every grid point.
///
/// Each application reads exactly one immutable snapshot of the input value
/// array and writes disjoint per-index results, so one sweep corresponds to
/// one exact application of the mathematical operator `T`. Points are
/// mutually independent and are dispatched across the rayon pool.
#[derive(Clone, Debug)]
pub struct BellmanOperator<'a, D> {
    grid: &'a StateGrid,
    params: &'a ModelParameters<D>,
    strategy: SearchStrategy,
}

impl<'a, D: OfferDistribution> BellmanOperator<'a, D> {
    /// Binds the operator to a grid, parameters, and an optimization strategy.
    pub fn new(
        grid: &'a StateGrid,
        params: &'a ModelParameters<D>,
        strategy: SearchStrategy,
    ) -> Self {
        Self {
            grid,
            params,
            strategy,
        }
    }

    /// The grid this operator sweeps.
    pub fn grid(&self) -> &StateGrid {
        self.grid
    }

    /// Computes `T(values)`: the updated value array, one optimized objective
    /// value per grid point. Aborts on the first per-point failure.
    pub fn apply(&self, values: &DVector<f64>) -> Result<DVector<f64>> {
        let policies = self.solve_all(values)?;
        Ok(DVector::from_iterator(
            policies.len(),
            policies.iter().map(|p| p.value),
        ))
    }

    /// Computes the optimal effort pair at every grid point for `values`.
    pub fn policies(&self, values: &DVector<f64>) -> Result<PolicyPair> {
        let policies = self.solve_all(values)?;
        let n = policies.len();
        Ok(PolicyPair {
            search: DVector::from_iterator(n, policies.iter().map(|p| p.search)),
            investment: DVector::from_iterator(n, policies.iter().map(|p| p.investment)),
        })
    }

    fn solve_all(&self, values: &DVector<f64>) -> Result<Vec<StatePolicy>> {
        let value_fn = PiecewiseLinear::new(self.grid, values)?;
        (0..self.grid.len())
            .into_par_iter()
            .map(|index| {
                let objective = StateObjective::new(self.grid.get(index), &value_fn, self.params);
                optimize_state(&objective, &self.strategy, index)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::model::baseline_parameters;

    #[test]
    fn apply_preserves_array_shape() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 7).unwrap();
        let operator = BellmanOperator::new(&grid, &params, SearchStrategy::grid_search());

        let values = grid.points() * 0.5;
        let updated = operator.apply(&values).unwrap();
        assert_eq!(updated.len(), grid.len());
        assert!(updated.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn policies_align_with_the_grid_and_respect_constraints() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 7).unwrap();
        let operator = BellmanOperator::new(&grid, &params, SearchStrategy::grid_search());

        let values = grid.points() * 0.5;
        let policy = operator.policies(&values).unwrap();
        assert_eq!(policy.search.len(), grid.len());
        assert_eq!(policy.investment.len(), grid.len());
        for i in 0..grid.len() {
            assert!(policy.search[i] >= params.floor());
            assert!(policy.investment[i] >= params.floor());
            assert!(policy.search[i] + policy.investment[i] <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn rejects_value_arrays_of_the_wrong_length() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 7).unwrap();
        let operator = BellmanOperator::new(&grid, &params, SearchStrategy::grid_search());

        let short = DVector::from_element(3, 1.0);
        assert!(matches!(
            operator.apply(&short),
            Err(SolverError::ShapeMismatch { expected: 7, found: 3, .. })
        ));
    }
}
