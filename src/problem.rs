//! High-level wrapper tying parameters, grid, operator, and solver together.

use nalgebra::DVector;
use serde::Serialize;

use crate::bellman::{BellmanOperator, PolicyPair};
use crate::error::{Result, SolverError};
use crate::model::{ModelParameters, OfferDistribution, StateGrid};
use crate::optimizer::SearchStrategy;
use crate::solver::{compute_fixed_point, ConvergenceReport, SolverOptions};

/// One worker's search-and-investment problem, ready to solve.
#[derive(Clone, Debug)]
pub struct SearchProblem<D> {
    params: ModelParameters<D>,
    grid: StateGrid,
    strategy: SearchStrategy,
}

impl<D: OfferDistribution> SearchProblem<D> {
    /// Bundles parameters and a grid with the default optimization strategy.
    pub fn new(params: ModelParameters<D>, grid: StateGrid) -> Self {
        Self {
            params,
            grid,
            strategy: SearchStrategy::default(),
        }
    }

    /// Selects the per-state optimization strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Accessor for the model parameters.
    pub fn params(&self) -> &ModelParameters<D> {
        &self.params
    }

    /// Accessor for the state grid.
    pub fn grid(&self) -> &StateGrid {
        &self.grid
    }

    /// The conventional starting guess `V₀(x) = x / 2`.
    pub fn default_initial_guess(&self) -> DVector<f64> {
        self.grid.points() * 0.5
    }

    /// Runs value-function iteration from the default initial guess.
    pub fn solve(&self, options: &SolverOptions) -> Result<Solution> {
        self.solve_from(self.default_initial_guess(), options)
    }

    /// Runs value-function iteration from a caller-supplied initial guess,
    /// then recovers the optimal policies from the converged value array.
    pub fn solve_from(&self, initial: DVector<f64>, options: &SolverOptions) -> Result<Solution> {
        if initial.len() != self.grid.len() {
            return Err(SolverError::shape_mismatch(
                "initial value array length",
                self.grid.len(),
                initial.len(),
            ));
        }

        let operator = BellmanOperator::new(&self.grid, &self.params, self.strategy.clone());
        let (value, report) = compute_fixed_point(|v| operator.apply(v), initial, options)?;
        let policy = operator.policies(&value)?;

        Ok(Solution {
            value,
            policy,
            report,
        })
    }
}

/// The solved model: value and policy arrays aligned to the state grid, plus
/// convergence diagnostics. Serializable so plotting and persistence can live
/// outside the solver.
#[derive(Clone, Debug, Serialize)]
pub struct Solution {
    /// Approximate fixed point of the Bellman operator.
    pub value: DVector<f64>,
    /// Optimal `(search, investment)` efforts per grid point.
    pub policy: PolicyPair,
    /// Diagnostics from the fixed-point iteration.
    pub report: ConvergenceReport,
}
