//! The per-state Bellman objective.
//!
//! Bundles everything one state's optimization needs (the state itself, the
//! interpolated value function, the model parameters) into an explicit value
//! type, so the optimizer stays stateless and per-point evaluations can run
//! on worker threads without shared mutable capture.

use crate::interp::PiecewiseLinear;
use crate::model::{ModelParameters, OfferDistribution};
use crate::quadrature::fixed_quad;

/// Right-hand side of the Bellman equation at a single state `x`:
///
/// ```text
/// w(s, φ) = x·(1 − s − φ) + β·[ (1 − π(s))·V(G(x, φ)) + π(s)·∫ V(max(G(x, φ), u)) f(u) du ]
/// ```
///
/// The `max(·, u)` inside the integral encodes the worker's right to reject an
/// inferior outside offer and keep the continuation value of staying.
pub struct StateObjective<'a, D> {
    state: f64,
    value_fn: &'a PiecewiseLinear<'a>,
    params: &'a ModelParameters<D>,
    support: (f64, f64),
}

impl<'a, D: OfferDistribution> StateObjective<'a, D> {
    /// Builds the objective for one grid state.
    pub fn new(
        state: f64,
        value_fn: &'a PiecewiseLinear<'a>,
        params: &'a ModelParameters<D>,
    ) -> Self {
        Self {
            state,
            value_fn,
            params,
            support: params.offer_support(),
        }
    }

    /// The state `x` this objective is anchored at.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Effort floor `ε` shared by both controls.
    pub fn floor(&self) -> f64 {
        self.params.floor()
    }

    /// Whether `(s, φ)` respects `s ≥ ε`, `φ ≥ ε`, `s + φ ≤ 1`.
    pub fn is_feasible(&self, search: f64, investment: f64) -> bool {
        let eps = self.params.floor();
        search >= eps && investment >= eps && search + investment <= 1.0
    }

    /// Expected value of continuing at post-decision capital `y` given search
    /// effort `s`:
    ///
    /// ```text
    /// q(y, s) = π(s)·E[ V(max(y, U)) ] + (1 − π(s))·V(y)
    /// ```
    ///
    /// The expectation is quadrature over the truncated offer support.
    pub fn expected_continuation(&self, y: f64, search: f64) -> f64 {
        let arrival = self.params.offer_probability(search);
        let stay = self.value_fn.eval(y);
        if arrival == 0.0 {
            return stay;
        }
        let (lo, hi) = self.support;
        let f = self.params.offer_distribution();
        let offer_value = fixed_quad(|u| self.value_fn.eval(y.max(u)) * f.density(u), lo, hi);
        arrival * offer_value + (1.0 - arrival) * stay
    }

    /// Evaluates `w(s, φ)`. May return a non-finite value at boundary
    /// degeneracies; callers must treat such points as infeasible.
    pub fn evaluate(&self, search: f64, investment: f64) -> f64 {
        let y = self.params.production(self.state, investment);
        let current = self.state * (1.0 - search - investment);
        current + self.params.discount() * self.expected_continuation(y, search)
    }
}
