//! Per-state constrained maximization over (search, investment) effort.

use serde::Serialize;

use crate::error::{Result, SolverError};
use crate::model::OfferDistribution;
use crate::objective::StateObjective;

/// How the per-state maximization is carried out.
///
/// Selected once at [`BellmanOperator`](crate::bellman::BellmanOperator)
/// construction and applied uniformly to every grid point.
#[derive(Clone, Debug)]
pub enum SearchStrategy {
    /// Derivative-free Nelder–Mead simplex search with an infeasibility
    /// penalty, started from a single fixed guess. A local method: it is not
    /// guaranteed to find the global maximum of the (possibly multi-modal)
    /// objective, and no multi-start is attempted.
    ConstrainedLocal {
        /// Starting `(search, investment)` pair for every state.
        initial_guess: (f64, f64),
    },
    /// Exhaustive evaluation on a `resolution × resolution` Cartesian grid of
    /// effort pairs over `[ε, 1]`, skipping infeasible and non-finite
    /// candidates. Deterministic; serves as an oracle for the local method.
    GridSearch {
        /// Points per effort axis. Must be at least 2.
        resolution: usize,
    },
}

impl SearchStrategy {
    /// Local search from the conventional `(0.2, 0.2)` starting point.
    pub fn constrained_local() -> Self {
        Self::ConstrainedLocal {
            initial_guess: (0.2, 0.2),
        }
    }

    /// Exhaustive search on the default 15 × 15 effort grid.
    pub fn grid_search() -> Self {
        Self::GridSearch { resolution: 15 }
    }
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::constrained_local()
    }
}

/// Optimal controls and achieved objective value at one state.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct StatePolicy {
    /// Optimal search effort `s*`.
    pub search: f64,
    /// Optimal investment effort `φ*`.
    pub investment: f64,
    /// Objective value at the optimum; one entry of the updated value array.
    pub value: f64,
}

/// Maximizes the Bellman objective at one state under the chosen strategy.
///
/// `grid_index` is carried only for error context: a state where every
/// constraint-satisfying candidate evaluates non-finite aborts with
/// [`SolverError::InfeasibleState`] instead of leaking a NaN into the value
/// array.
pub fn optimize_state<D: OfferDistribution>(
    objective: &StateObjective<'_, D>,
    strategy: &SearchStrategy,
    grid_index: usize,
) -> Result<StatePolicy> {
    match strategy {
        SearchStrategy::ConstrainedLocal { initial_guess } => {
            constrained_local(objective, *initial_guess, grid_index)
        }
        SearchStrategy::GridSearch { resolution } => {
            grid_search(objective, *resolution, grid_index)
        }
    }
}

fn constrained_local<D: OfferDistribution>(
    objective: &StateObjective<'_, D>,
    initial_guess: (f64, f64),
    grid_index: usize,
) -> Result<StatePolicy> {
    // Minimize the negated objective; infeasible or non-finite points get an
    // infinite penalty, which Nelder-Mead reflections simply move away from.
    let penalized = |s: f64, phi: f64| -> f64 {
        if !objective.is_feasible(s, phi) {
            return f64::INFINITY;
        }
        let w = objective.evaluate(s, phi);
        if w.is_finite() {
            -w
        } else {
            f64::INFINITY
        }
    };

    let start = project_guess(initial_guess, objective.floor());
    let (optimum, fval) = nelder_mead(penalized, start, 0.1, 250, 1e-10);
    if !fval.is_finite() {
        return Err(SolverError::infeasible(grid_index, objective.state()));
    }

    Ok(StatePolicy {
        search: optimum.0,
        investment: optimum.1,
        value: -fval,
    })
}

fn grid_search<D: OfferDistribution>(
    objective: &StateObjective<'_, D>,
    resolution: usize,
    grid_index: usize,
) -> Result<StatePolicy> {
    if resolution < 2 {
        return Err(SolverError::invalid_parameter(
            "grid-search resolution",
            resolution as f64,
        ));
    }
    let eps = objective.floor();
    let step = (1.0 - eps) / (resolution - 1) as f64;

    let mut best: Option<StatePolicy> = None;
    for i in 0..resolution {
        let search = eps + step * i as f64;
        for j in 0..resolution {
            let investment = eps + step * j as f64;
            if search + investment > 1.0 {
                continue;
            }
            let value = objective.evaluate(search, investment);
            if !value.is_finite() {
                continue;
            }
            if best.map_or(true, |b| value > b.value) {
                best = Some(StatePolicy {
                    search,
                    investment,
                    value,
                });
            }
        }
    }

    best.ok_or_else(|| SolverError::infeasible(grid_index, objective.state()))
}

/// Projects a starting guess onto the constraint set
/// `{s ≥ ε, φ ≥ ε, s + φ ≤ 1}` when that set is nonempty.
///
/// Clamps both coordinates to the floor first, then shrinks only the slack
/// above the floor, so neither coordinate can be pushed back below it. If no
/// feasible point exists at all (`2ε > 1`), infeasibility surfaces through
/// the penalized objective instead.
fn project_guess(guess: (f64, f64), floor: f64) -> (f64, f64) {
    let s = guess.0.max(floor);
    let phi = guess.1.max(floor);
    let slack = s + phi - 2.0 * floor;
    if s + phi <= 1.0 || slack <= 0.0 {
        return (s, phi);
    }
    let shrink = (1.0 - 2.0 * floor) / slack;
    let projected = (floor + (s - floor) * shrink, floor + (phi - floor) * shrink);
    if projected.0 + projected.1 <= 1.0 {
        return projected;
    }
    // Rounding can leave the shrunk point a hair outside the boundary; fall
    // back to the centroid of the constraint triangle.
    let center = floor + (1.0 - 2.0 * floor) / 3.0;
    (center, center)
}

/// Minimizes `f` over two variables with the Nelder–Mead simplex method.
///
/// Returns the best vertex and its objective value once the simplex value
/// spread falls below `tolerance` or `max_iterations` passes have run.
fn nelder_mead<F>(
    f: F,
    start: (f64, f64),
    step: f64,
    max_iterations: usize,
    tolerance: f64,
) -> ((f64, f64), f64)
where
    F: Fn(f64, f64) -> f64,
{
    const REFLECT: f64 = 1.0;
    const EXPAND: f64 = 2.0;
    const CONTRACT: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let mut vertices = [
        start,
        (start.0 + step, start.1),
        (start.0, start.1 + step),
    ];
    let mut scores = vertices.map(|(x, y)| f(x, y));

    for _ in 0..max_iterations {
        // Order vertices best-to-worst. NaN cannot occur: the penalized
        // objective maps every pathological point to +infinity.
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
        vertices = [vertices[order[0]], vertices[order[1]], vertices[order[2]]];
        scores = [scores[order[0]], scores[order[1]], scores[order[2]]];

        if scores[2] - scores[0] < tolerance {
            break;
        }

        let centroid = (
            0.5 * (vertices[0].0 + vertices[1].0),
            0.5 * (vertices[0].1 + vertices[1].1),
        );
        let reflected = (
            centroid.0 + REFLECT * (centroid.0 - vertices[2].0),
            centroid.1 + REFLECT * (centroid.1 - vertices[2].1),
        );
        let reflected_score = f(reflected.0, reflected.1);

        if reflected_score < scores[0] {
            let expanded = (
                centroid.0 + EXPAND * (reflected.0 - centroid.0),
                centroid.1 + EXPAND * (reflected.1 - centroid.1),
            );
            let expanded_score = f(expanded.0, expanded.1);
            if expanded_score < reflected_score {
                vertices[2] = expanded;
                scores[2] = expanded_score;
            } else {
                vertices[2] = reflected;
                scores[2] = reflected_score;
            }
        } else if reflected_score < scores[1] {
            vertices[2] = reflected;
            scores[2] = reflected_score;
        } else {
            let toward = if reflected_score < scores[2] {
                reflected
            } else {
                vertices[2]
            };
            let contracted = (
                centroid.0 + CONTRACT * (toward.0 - centroid.0),
                centroid.1 + CONTRACT * (toward.1 - centroid.1),
            );
            let contracted_score = f(contracted.0, contracted.1);
            if contracted_score < scores[2].min(reflected_score) {
                vertices[2] = contracted;
                scores[2] = contracted_score;
            } else {
                for k in 1..3 {
                    vertices[k] = (
                        vertices[0].0 + SHRINK * (vertices[k].0 - vertices[0].0),
                        vertices[0].1 + SHRINK * (vertices[k].1 - vertices[0].1),
                    );
                    scores[k] = f(vertices[k].0, vertices[k].1);
                }
            }
        }
    }

    let mut best = 0;
    for k in 1..3 {
        if scores[k] < scores[best] {
            best = k;
        }
    }
    (vertices[best], scores[best])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::PiecewiseLinear;
    use crate::model::{baseline_parameters, ModelParameters, StateGrid};
    use approx::assert_relative_eq;
    use statrs::distribution::Beta;

    #[test]
    fn nelder_mead_finds_quadratic_minimum() {
        let ((x, y), fval) = nelder_mead(
            |x, y| (x - 0.3).powi(2) + 2.0 * (y + 0.1).powi(2),
            (1.0, 1.0),
            0.1,
            500,
            1e-14,
        );
        assert_relative_eq!(x, 0.3, epsilon = 1e-5);
        assert_relative_eq!(y, -0.1, epsilon = 1e-5);
        assert!(fval < 1e-9);
    }

    #[test]
    fn strategies_agree_on_the_bellman_objective() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 10).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();
        let objective = StateObjective::new(grid.get(5), &v, &params);

        let local = optimize_state(&objective, &SearchStrategy::constrained_local(), 5).unwrap();
        let coarse = optimize_state(&objective, &SearchStrategy::grid_search(), 5).unwrap();

        // The local optimum dominates any grid candidate it shares a basin
        // with; the coarse grid brackets it from below.
        assert!(local.value >= coarse.value - 1e-6);
        assert!((local.value - coarse.value).abs() < 0.2);
    }

    #[test]
    fn reported_policies_are_feasible() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 10).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();
        let eps = params.floor();

        for i in 0..grid.len() {
            let objective = StateObjective::new(grid.get(i), &v, &params);
            for strategy in [SearchStrategy::constrained_local(), SearchStrategy::grid_search()] {
                let policy = optimize_state(&objective, &strategy, i).unwrap();
                assert!(policy.search >= eps);
                assert!(policy.investment >= eps);
                assert!(policy.search + policy.investment <= 1.0 + 1e-12);
                assert!(policy.value.is_finite());
            }
        }
    }

    #[test]
    fn guess_projection_keeps_both_coordinates_at_the_floor() {
        // Shrinking only the slack above the floor must not drop the smaller
        // coordinate below it, even for badly skewed guesses.
        for (guess, floor) in [
            ((0.9, 0.1), 0.45),
            ((1.5, 0.01), 0.45),
            ((0.9, 0.9), 1e-4),
            ((2.0, 0.0), 0.2),
        ] {
            let (s, phi) = project_guess(guess, floor);
            assert!(s >= floor, "search {s} below floor {floor} for {guess:?}");
            assert!(phi >= floor, "investment {phi} below floor {floor} for {guess:?}");
            assert!(s + phi <= 1.0, "simplex violated for {guess:?}: {s} + {phi}");
            assert!(s >= phi, "projection must preserve the skew of {guess:?}");
        }

        // A guess already inside the constraint set passes through untouched.
        assert_eq!(project_guess((0.2, 0.3), 0.1), (0.2, 0.3));
    }

    #[test]
    fn skewed_guess_with_a_large_floor_still_optimizes() {
        let offers = Beta::new(2.0, 2.0).unwrap();
        // The feasible set {s >= 0.45, phi >= 0.45, s + phi <= 1} is a thin
        // but nonempty triangle; a skewed guess must be projected into it,
        // not reported as infeasible.
        let params = ModelParameters::new(1.4, 0.6, 0.96, 0.45, offers).unwrap();
        let grid = StateGrid::from_parameters(&params, 5).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();

        let strategy = SearchStrategy::ConstrainedLocal {
            initial_guess: (0.9, 0.1),
        };
        for i in 0..grid.len() {
            let objective = StateObjective::new(grid.get(i), &v, &params);
            let policy = optimize_state(&objective, &strategy, i).unwrap();
            assert!(policy.search >= 0.45);
            assert!(policy.investment >= 0.45);
            assert!(policy.search + policy.investment <= 1.0 + 1e-12);
            assert!(policy.value.is_finite());
        }
    }

    #[test]
    fn caller_supplied_guesses_reach_comparable_optima() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 10).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();
        let objective = StateObjective::new(grid.get(5), &v, &params);

        let oracle = optimize_state(&objective, &SearchStrategy::grid_search(), 5).unwrap();

        // Interior guesses leave the whole starting simplex feasible, so the
        // local search must land near the exhaustive optimum from any of them.
        for guess in [(0.4, 0.4), (0.1, 0.3), (0.6, 0.1)] {
            let strategy = SearchStrategy::ConstrainedLocal {
                initial_guess: guess,
            };
            let policy = optimize_state(&objective, &strategy, 5).unwrap();
            assert!(
                (policy.value - oracle.value).abs() < 0.2,
                "guess {guess:?} landed far from the oracle: {} vs {}",
                policy.value,
                oracle.value
            );
        }
    }

    #[test]
    fn infeasible_guesses_are_projected_and_accepted() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 10).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();
        let objective = StateObjective::new(grid.get(5), &v, &params);

        // Guesses outside the constraint set are projected into it, and
        // boundary-hugging ones are kept; neither may be reported as
        // infeasible while feasible points exist.
        for guess in [(0.9, 0.9), (1.5, 0.01), (0.05, 0.9)] {
            let strategy = SearchStrategy::ConstrainedLocal {
                initial_guess: guess,
            };
            let policy = optimize_state(&objective, &strategy, 5).unwrap();
            assert!(policy.value.is_finite());
            assert!(objective.is_feasible(policy.search, policy.investment));
        }
    }

    #[test]
    fn grid_search_rejects_degenerate_resolutions() {
        let params = baseline_parameters();
        let grid = StateGrid::from_parameters(&params, 5).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();
        let objective = StateObjective::new(grid.get(0), &v, &params);

        for resolution in [0, 1] {
            let result =
                optimize_state(&objective, &SearchStrategy::GridSearch { resolution }, 0);
            assert!(matches!(result, Err(SolverError::InvalidParameter { .. })));
        }
    }

    #[test]
    fn oversized_floor_is_reported_as_infeasible() {
        let offers = Beta::new(2.0, 2.0).unwrap();
        let params = ModelParameters::new(1.4, 0.6, 0.96, 0.6, offers).unwrap();
        let grid = StateGrid::from_parameters(&params, 5).unwrap();
        let values = grid.points() * 0.5;
        let v = PiecewiseLinear::new(&grid, &values).unwrap();

        for i in 0..grid.len() {
            let objective = StateObjective::new(grid.get(i), &v, &params);
            for strategy in [SearchStrategy::constrained_local(), SearchStrategy::grid_search()] {
                let result = optimize_state(&objective, &strategy, i);
                assert!(matches!(
                    result,
                    Err(SolverError::InfeasibleState { grid_index, .. }) if grid_index == i
                ));
            }
        }
    }
}
