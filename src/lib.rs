//! Value-function iteration for on-the-job search with human-capital investment.
//!
//! This crate solves the infinite-horizon problem of a worker who splits each
//! period's time between producing at the current job, investing in
//! job-specific human capital, and searching for outside offers: the
//! on-the-job search model familiar from Ljungqvist and Sargent's *Recursive
//! Macroeconomic Theory*. It provides tools to
//!
//! - describe the model and discretize its state space (`model` module),
//! - approximate a value function off the grid (`interp` module),
//! - evaluate and maximize the per-state Bellman objective (`objective` and
//!   `optimizer` modules),
//! - sweep the Bellman operator across the grid in parallel (`bellman`
//!   module), and
//! - iterate the operator to its fixed point with convergence diagnostics
//!   (`solver` module).
//!
//! Per-state maximization offers two interchangeable strategies: a
//! derivative-free constrained Nelder–Mead search and an exhaustive
//! effort-grid search that doubles as a cross-check. The local search starts
//! from a single fixed guess per state, so global optimality of the (possibly
//! multi-modal) per-state objective is not guaranteed.
//!
//! # Quick start
//!
//! ```no_run
//! use hcsearch::model::baseline_parameters;
//! use hcsearch::{SearchProblem, SolverOptions, StateGrid};
//!
//! let params = baseline_parameters();
//! let grid = StateGrid::default_from_parameters(&params).expect("valid grid");
//!
//! let problem = SearchProblem::new(params, grid);
//! let solution = problem.solve(&SolverOptions::default()).expect("feasible model");
//!
//! println!(
//!     "solved in {} iterations (error {:.2e})",
//!     solution.report.iterations, solution.report.error
//! );
//! println!("search efforts: {:?}", solution.policy.search.as_slice());
//! ```

pub mod bellman;
pub mod error;
pub mod interp;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod problem;
pub mod quadrature;
pub mod solver;

pub use bellman::{BellmanOperator, PolicyPair};
pub use error::{Result, SolverError};
pub use model::{ModelParameters, OfferDistribution, StateGrid};
pub use optimizer::{SearchStrategy, StatePolicy};
pub use problem::{SearchProblem, Solution};
pub use solver::{compute_fixed_point, ConvergenceReport, SolverOptions};
