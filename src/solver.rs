//! Fixed-point iteration driver and its diagnostics.

use std::time::{Duration, Instant};

use nalgebra::DVector;
use serde::Serialize;

use crate::error::{Result, SolverError};

/// Configuration for the fixed-point iteration.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    /// Supremum-norm tolerance for convergence.
    pub tolerance: f64,
    /// Maximum number of operator applications before giving up.
    pub max_iterations: usize,
    /// Emit a progress line every this many iterations; `0` silences them.
    pub report_every: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 50,
            report_every: 10,
        }
    }
}

impl SolverOptions {
    /// Overrides the convergence tolerance while keeping other defaults.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Overrides the iteration cap while keeping other defaults.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the progress-report cadence (`0` disables reporting).
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }
}

/// Diagnostics returned alongside the final value array.
#[derive(Clone, Debug, Serialize)]
pub struct ConvergenceReport {
    /// Number of operator applications performed.
    pub iterations: usize,
    /// Supremum-norm change observed in the final iteration.
    pub error: f64,
    /// Wall-clock time spent iterating.
    pub elapsed: Duration,
    /// Whether `error` fell below the tolerance before the cap was hit.
    pub converged: bool,
}

/// Iterates `V ← T(V)` until the sup-norm change falls below the tolerance or
/// the iteration cap is reached.
///
/// Works against any value-array-to-value-array operator, not just
/// [`BellmanOperator`](crate::bellman::BellmanOperator). Iterations are
/// strictly sequential: each application consumes the full output of the
/// previous one. Hitting the cap is not an error; the best available
/// approximation is returned and the report marks the run unconverged.
pub fn compute_fixed_point<T>(
    operator: T,
    initial: DVector<f64>,
    options: &SolverOptions,
) -> Result<(DVector<f64>, ConvergenceReport)>
where
    T: Fn(&DVector<f64>) -> Result<DVector<f64>>,
{
    let started = Instant::now();
    let mut current = initial;
    let mut error = f64::INFINITY;
    let mut iterations = 0usize;

    while iterations < options.max_iterations {
        let next = operator(&current)?;
        if next.len() != current.len() {
            return Err(SolverError::shape_mismatch(
                "operator output length",
                current.len(),
                next.len(),
            ));
        }
        error = (&next - &current).amax();
        current = next;
        iterations += 1;

        if options.report_every > 0 && iterations % options.report_every == 0 {
            log::info!("fixed-point iteration {iterations}: sup-norm error {error:.3e}");
        }
        if error <= options.tolerance {
            break;
        }
    }

    let converged = error <= options.tolerance;
    if converged {
        log::debug!("fixed point reached after {iterations} iterations (error {error:.3e})");
    } else {
        log::warn!(
            "fixed-point iteration stopped at the cap of {} with error {error:.3e} above tolerance {:.3e}",
            options.max_iterations,
            options.tolerance
        );
    }

    Ok((
        current,
        ConvergenceReport {
            iterations,
            error,
            elapsed: started.elapsed(),
            converged,
        },
    ))
}
