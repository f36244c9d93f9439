//! models — moment prediction, GMM criterion, weighting and fitting.
//!
//! Purpose
//! -------
//! Turn the primitives of `gmm::core` into an estimator: predict binned
//! moments for a candidate distribution, measure their distance to the
//! empirical weights, minimize that distance with the generic minimizer,
//! and estimate the second-stage weighting matrix.
//!
//! Key behaviors
//! -------------
//! - [`moments`]: [`predict`] (quadrature or CDF differences per bin) and
//!   [`moment_errors`] (relative or absolute).
//! - [`criterion`]: the scalar `eᵀ W e` with its sentinel policy, and
//!   [`GMMObjective`], the bridge to [`minimize`].
//! - [`weighting`]: [`estimate_weighting`], the SVD pseudo-inverse of the
//!   first-stage moment covariance.
//! - [`estimator`]: the single-fit driver [`fit`] and the session type
//!   [`GMMEstimator`] with its two-step sequence.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are the validated containers of `gmm::core`; shape and domain
//!   problems that would fail on every evaluation are rejected before the
//!   optimizer starts.
//! - Nothing is cached: each evaluation recomputes moments from scratch.
//!
//! Conventions
//! -----------
//! - Results are [`GMMResult`]; optimizer errors arrive as
//!   `GMMError::Optimization` and session errors are wrapped in
//!   `GMMError::Stage`.
//! - Logging uses the `log` facade: `debug!` for stage starts and sentinel
//!   conversions, `info!` for fitted results, `warn!` for non-convergence
//!   and singular or degenerate weighting.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; full pipelines (bracket table →
//!   identity fit → two-step fit) live in `tests/integration_gmm_pipeline.rs`.
//!
//! [`minimize`]: crate::optimization::minimizer::minimize
//! [`GMMResult`]: crate::gmm::errors::GMMResult

pub mod criterion;
pub mod estimator;
pub mod moments;
pub mod weighting;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::criterion::{CRITERION_SENTINEL, GMMObjective, criterion, quadratic_form};
pub use self::estimator::{FitResult, GMMEstimator, TwoStepResult, fit};
pub use self::moments::{ErrorVector, ModelMoments, moment_errors, predict};
pub use self::weighting::{WeightingEstimate, estimate_weighting};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use binned_gmm::gmm::models::prelude::*;
//
// to import the estimation surface in a single line.

pub mod prelude {
    pub use super::estimator::{FitResult, GMMEstimator, TwoStepResult, fit};
    pub use super::moments::{moment_errors, predict};
    pub use super::weighting::{WeightingEstimate, estimate_weighting};
}
