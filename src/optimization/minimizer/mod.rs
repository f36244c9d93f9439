//! minimizer — argmin-powered minimization of a scalar objective.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **minimizing**
//! an objective `c(θ)` over an unconstrained parameter vector. Callers
//! implement a single trait, [`Objective`], and invoke [`minimize`] to run
//! L-BFGS with a configurable line search, tolerances, finite-difference
//! gradients and a derivative-free fallback.
//!
//! Key behaviors
//! -------------
//! - Expose the objective to Argmin via [`adapter::ArgMinAdapter`].
//! - Expose a single entrypoint [`minimize`] that:
//!   - validates the initial guess with [`Objective::check`],
//!   - selects an L-BFGS solver via [`builders`] based on [`LineSearcher`],
//!   - executes it via [`run::run_lbfgs`],
//!   - restarts with Nelder–Mead ([`run::run_nelder_mead`]) when the L-BFGS
//!     backend breaks down and the fallback is enabled, and
//!   - normalizes results into an [`OptimOutcome`].
//! - Provide finite-difference gradients in [`finite_diff`] when analytic
//!   derivatives are missing, with error capture and validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`Objective::value`] is the cost handed to argmin; no sign flips.
//! - Objectives treat invalid inputs as recoverable [`OptError`] values, not
//!   panics.
//! - [`OptimOutcome::converged`] is `true` only for genuine convergence;
//!   an exhausted iteration budget is reported as `false`.
//!
//! Conventions
//! -----------
//! - Parameters live in an unconstrained space as [`Theta`]
//!   (`Array1<f64>`). Any mapping from constrained → unconstrained space
//!   happens in the model layer.
//! - Errors bubble up as `OptResult<T>` / [`OptError`].
//!
//! Downstream usage
//! ----------------
//! - The GMM layer implements [`Objective`] for its criterion and calls
//!   [`minimize`] with the unconstrained start, the binned data and an
//!   [`OptimOptions`] configuration.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover gradient handling in [`adapter`],
//!   solver construction in [`builders`], finite differences and
//!   validation, configuration and outcome invariants in [`traits`], and
//!   end-to-end solves (including the fallback) in [`api`].
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{
    LineSearcher, Objective, OptimOptions, OptimOutcome, SolverKind, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{
        LineSearcher, Objective, OptimOptions, OptimOutcome, SolverKind, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
