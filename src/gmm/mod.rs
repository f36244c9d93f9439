//! gmm — GMM estimation of income distributions from binned data.
//!
//! Purpose
//! -------
//! Fit a lognormal or gamma distribution to an income distribution reported
//! as probability mass per income bracket, by matching the bin masses the
//! distribution implies ("model moments") to the observed ones with the
//! generalized method of moments.
//!
//! Key behaviors
//! -------------
//! - `core`: validated bins and weights, distribution families, adaptive
//!   double-exponential quadrature, parameter bounds, weighting matrices, option
//!   structs and the bracket-table reader.
//! - `models`: moment prediction, moment errors, the GMM criterion, the
//!   two-step weighting estimator, and the fitting session.
//! - `errors`: the [`GMMError`] surface with stage labeling for two-step
//!   sessions.
//!
//! Invariants & assumptions
//! ------------------------
//! - Incomes are non-negative; bin edges are finite and strictly increasing
//!   and the outer bins are truncated to `[lower_eps, upper_surrogate]`.
//! - Weights need not sum to one; they are compared bin by bin.
//! - Everything is synchronous and free of global state.
//!
//! Downstream usage
//! ----------------
//! - Parse a [`BracketTable`] (or build [`BinnedData`] directly), rescale
//!   merged brackets if needed, and open a [`GMMEstimator`].
//! - Call `fit_identity` for a one-stage estimate or `fit_two_step` for the
//!   efficient two-step estimate; `FitResult::fitted_moments` regenerates the
//!   fitted bin masses for plotting.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; the pipeline is exercised in
//!   `tests/integration_gmm_pipeline.rs`.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------
//
// These are the everyday types most users need. Quadrature, validation and
// θ-space helpers remain under their respective submodules.

pub use self::core::{
    BinEdges, BinnedData, Bounds, BracketTable, DistributionSpec, EmpiricalWeights, ErrorForm,
    Family, GMMOptions, MomentMethod, MomentOptions, ParamBound, QuadratureOptions, Truncation,
    WeightMatrix, WeightingKind, WeightingOptions,
};

pub use self::errors::{FitStage, GMMError, GMMResult};

pub use self::models::{
    CRITERION_SENTINEL, FitResult, GMMEstimator, TwoStepResult, WeightingEstimate, criterion,
    estimate_weighting, fit, predict,
};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use binned_gmm::gmm::prelude::*;
//
// to import the estimation surface in a single line.

pub mod prelude {
    pub use super::{
        BinEdges, BinnedData, Bounds, BracketTable, DistributionSpec, EmpiricalWeights, ErrorForm,
        Family, FitResult, FitStage, GMMError, GMMEstimator, GMMOptions, GMMResult, MomentMethod,
        MomentOptions, ParamBound, TwoStepResult, WeightMatrix, WeightingKind, WeightingOptions,
        fit, predict,
    };
}
