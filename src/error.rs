use thiserror::Error;

/// Unified error type for `hcsearch` operations.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Raised when provided arrays have incompatible lengths.
    #[error("shape mismatch in {context}: expected {expected} but found {found}")]
    ShapeMismatch {
        /// Human-readable context describing the operation.
        context: &'static str,
        /// The required length, often the model-implied value.
        expected: usize,
        /// The length that was actually supplied.
        found: usize,
    },

    /// Raised when a scalar model parameter falls outside its admissible range.
    #[error("model parameter `{name}` is out of range: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Raised when the state grid is not strictly increasing.
    #[error("state grid must be strictly increasing; violated at index {index}")]
    GridNotIncreasing { index: usize },

    /// Raised when a grid entry is not strictly positive (human capital must be).
    #[error("state grid entries must be strictly positive; index {index} holds {value}")]
    NonPositiveState { index: usize, value: f64 },

    /// Raised when no feasible effort pair produces a finite objective at a state.
    /// A single poisoned grid point would invalidate the whole value array, so
    /// the operator application is aborted with the offending location attached.
    #[error(
        "no feasible (search, investment) pair at grid index {grid_index} \
         (state {state}); every candidate evaluated non-finite"
    )]
    InfeasibleState { grid_index: usize, state: f64 },
}

impl SolverError {
    /// Helper to format a [`ShapeMismatch`](SolverError::ShapeMismatch) error.
    pub fn shape_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            found,
        }
    }

    /// Helper for parameter validation failures.
    pub fn invalid_parameter(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }

    /// Helper to raise when a state admits no feasible effort pair.
    pub fn infeasible(grid_index: usize, state: f64) -> Self {
        Self::InfeasibleState { grid_index, state }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, SolverError>;
