//! Model primitives: scalar parameters, the offer distribution, and the state grid.

use nalgebra::DVector;
use statrs::distribution::{Continuous, ContinuousCDF};

use crate::error::{Result, SolverError};

/// Quantiles bounding the truncated offer support used for numerical
/// integration. Mass outside `[F⁻¹(0.005), F⁻¹(0.995)]` is numerically
/// negligible for the distributions this model is run with.
pub const OFFER_SUPPORT_QUANTILES: (f64, f64) = (0.005, 0.995);

/// Conventional number of grid points when the caller has no strong opinion.
pub const DEFAULT_GRID_SIZE: usize = 25;

/// Capability required of the outside-offer value distribution `F`.
///
/// Blanket-implemented for every continuous `statrs` distribution, so
/// `statrs::distribution::Beta` (the conventional choice) works out of the
/// box, as does any custom distribution exposing the same three operations.
pub trait OfferDistribution: Send + Sync {
    /// Cumulative distribution function `F(u)`.
    fn cdf(&self, u: f64) -> f64;

    /// Probability density `f(u)`.
    fn density(&self, u: f64) -> f64;

    /// Quantile function `F⁻¹(p)`.
    fn quantile(&self, p: f64) -> f64;
}

impl<T> OfferDistribution for T
where
    T: Continuous<f64, f64> + ContinuousCDF<f64, f64> + Send + Sync,
{
    fn cdf(&self, u: f64) -> f64 {
        ContinuousCDF::cdf(self, u)
    }

    fn density(&self, u: f64) -> f64 {
        self.pdf(u)
    }

    fn quantile(&self, p: f64) -> f64 {
        self.inverse_cdf(p)
    }
}

/// Offer-arrival probability used when the caller supplies none: `π(s) = √s`.
pub fn sqrt_offer_probability(search: f64) -> f64 {
    search.max(0.0).sqrt()
}

/// Immutable scalar configuration of the worker's problem.
///
/// Owned by the caller and threaded by reference through every component, so
/// several solver runs with different parameterizations can coexist. Never
/// mutated by the solver.
#[derive(Clone, Debug)]
pub struct ModelParameters<D> {
    scale: f64,
    elasticity: f64,
    discount: f64,
    floor: f64,
    offer_probability: fn(f64) -> f64,
    offer_distribution: D,
}

impl<D: OfferDistribution> ModelParameters<D> {
    /// Validates and bundles the model's scalar parameters.
    ///
    /// `scale` is the production scale `A > 0`, `elasticity` the production
    /// elasticity `α ∈ (0, 1)`, `discount` the factor `β ∈ (0, 1)`, and
    /// `floor` the small positive bound `ε` kept on both effort controls.
    /// The offer-arrival probability defaults to `π(s) = √s`.
    pub fn new(
        scale: f64,
        elasticity: f64,
        discount: f64,
        floor: f64,
        offer_distribution: D,
    ) -> Result<Self> {
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(SolverError::invalid_parameter("scale", scale));
        }
        if !(elasticity > 0.0 && elasticity < 1.0) {
            return Err(SolverError::invalid_parameter("elasticity", elasticity));
        }
        if !(discount > 0.0 && discount < 1.0) {
            return Err(SolverError::invalid_parameter("discount", discount));
        }
        if !(floor > 0.0 && floor < 1.0) {
            return Err(SolverError::invalid_parameter("floor", floor));
        }

        Ok(Self {
            scale,
            elasticity,
            discount,
            floor,
            offer_probability: sqrt_offer_probability,
            offer_distribution,
        })
    }

    /// Overrides the offer-arrival probability `π` while keeping other fields.
    pub fn with_offer_probability(mut self, pi: fn(f64) -> f64) -> Self {
        self.offer_probability = pi;
        self
    }

    /// Production scale `A`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Production elasticity `α`.
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Discount factor `β`.
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Lower bound `ε` enforced on both effort controls.
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Offer-arrival probability `π(s)`.
    pub fn offer_probability(&self, search: f64) -> f64 {
        (self.offer_probability)(search)
    }

    /// The outside-offer value distribution `F`.
    pub fn offer_distribution(&self) -> &D {
        &self.offer_distribution
    }

    /// Next-period human capital on the current job: `G(x, φ) = A·(xφ)^α`.
    pub fn production(&self, state: f64, investment: f64) -> f64 {
        self.scale * (state * investment).powf(self.elasticity)
    }

    /// Truncated offer support `[F⁻¹(0.005), F⁻¹(0.995)]` used for quadrature.
    pub fn offer_support(&self) -> (f64, f64) {
        let (lo, hi) = OFFER_SUPPORT_QUANTILES;
        (
            self.offer_distribution.quantile(lo),
            self.offer_distribution.quantile(hi),
        )
    }

    /// Default upper bound of the state grid: the larger of the production
    /// fixed point `A^{1/(1−α)}` and the `1 − ε` offer quantile, so the grid
    /// covers both internally accumulated and externally offered capital.
    pub fn grid_upper_bound(&self) -> f64 {
        let production_cap = self.scale.powf(1.0 / (1.0 - self.elasticity));
        production_cap.max(self.offer_distribution.quantile(1.0 - self.floor))
    }
}

/// Conventional textbook parameterization: `A = 1.4`, `α = 0.6`, `β = 0.96`,
/// `ε = 1e-4`, offers drawn from `Beta(2, 2)`.
pub fn baseline_parameters() -> ModelParameters<statrs::distribution::Beta> {
    let offers = statrs::distribution::Beta::new(2.0, 2.0).expect("Beta(2, 2) is well-formed");
    ModelParameters::new(1.4, 0.6, 0.96, 1e-4, offers).expect("baseline parameters are valid")
}

/// Discretized domain of job-specific human capital.
///
/// Strictly increasing, strictly positive, and immutable after construction.
#[derive(Clone, Debug)]
pub struct StateGrid {
    points: DVector<f64>,
}

impl StateGrid {
    /// Validates an explicit grid: at least two points, strictly positive,
    /// strictly increasing.
    pub fn new(points: DVector<f64>) -> Result<Self> {
        if points.len() < 2 {
            return Err(SolverError::shape_mismatch("grid length", 2, points.len()));
        }
        for (index, value) in points.iter().enumerate() {
            if !(*value > 0.0) || !value.is_finite() {
                return Err(SolverError::NonPositiveState {
                    index,
                    value: *value,
                });
            }
            if index > 0 && points[index - 1] >= *value {
                return Err(SolverError::GridNotIncreasing { index });
            }
        }
        Ok(Self { points })
    }

    /// Builds the default uniform grid of `size` points over
    /// `[ε, grid_upper_bound]` implied by the model parameters.
    pub fn from_parameters<D: OfferDistribution>(
        params: &ModelParameters<D>,
        size: usize,
    ) -> Result<Self> {
        if size < 2 {
            return Err(SolverError::shape_mismatch("grid length", 2, size));
        }
        let lo = params.floor();
        let hi = params.grid_upper_bound();
        if hi <= lo {
            return Err(SolverError::invalid_parameter("grid upper bound", hi));
        }
        let step = (hi - lo) / (size - 1) as f64;
        let points = DVector::from_fn(size, |i, _| lo + step * i as f64);
        Self::new(points)
    }

    /// [`from_parameters`](Self::from_parameters) with [`DEFAULT_GRID_SIZE`] points.
    pub fn default_from_parameters<D: OfferDistribution>(
        params: &ModelParameters<D>,
    ) -> Result<Self> {
        Self::from_parameters(params, DEFAULT_GRID_SIZE)
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the grid holds no points. Unreachable for a validated grid,
    /// which always holds at least two.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Read-only view of the grid points.
    pub fn points(&self) -> &DVector<f64> {
        &self.points
    }

    /// The grid point at `index`.
    pub fn get(&self, index: usize) -> f64 {
        self.points[index]
    }

    /// Smallest grid point.
    pub fn min(&self) -> f64 {
        self.points[0]
    }

    /// Largest grid point.
    pub fn max(&self) -> f64 {
        self.points[self.points.len() - 1]
    }
}
