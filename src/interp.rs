//! Piecewise-linear approximation of a value function known on a finite grid.

use nalgebra::DVector;

use crate::error::{Result, SolverError};
use crate::model::StateGrid;

/// Extends a value array defined on a [`StateGrid`] to arbitrary query points.
///
/// Interpolates linearly between bracketing grid points and extrapolates flat
/// beyond the grid: the production function can map a state outside the grid
/// range, and the constrained optimizer probes such points during its search,
/// so queries past either endpoint must stay well-defined and bounded.
#[derive(Clone, Copy, Debug)]
pub struct PiecewiseLinear<'a> {
    grid: &'a [f64],
    values: &'a [f64],
}

impl<'a> PiecewiseLinear<'a> {
    /// Pairs a grid with a value array of equal length.
    pub fn new(grid: &'a StateGrid, values: &'a DVector<f64>) -> Result<Self> {
        if values.len() != grid.len() {
            return Err(SolverError::shape_mismatch(
                "value array length",
                grid.len(),
                values.len(),
            ));
        }
        Ok(Self {
            grid: grid.points().as_slice(),
            values: values.as_slice(),
        })
    }

    /// Evaluates the approximated value function at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.grid.len();
        if x <= self.grid[0] {
            return self.values[0];
        }
        if x >= self.grid[n - 1] {
            return self.values[n - 1];
        }

        // First index with grid[hi] >= x; interior by the checks above.
        let hi = self.grid.partition_point(|&g| g < x);
        if self.grid[hi] == x {
            return self.values[hi];
        }
        let lo = hi - 1;
        let t = (x - self.grid[lo]) / (self.grid[hi] - self.grid[lo]);
        self.values[lo] + t * (self.values[hi] - self.values[lo])
    }
}
