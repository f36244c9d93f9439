//! Optimizer driver and two-step estimation session.
//!
//! Purpose
//! -------
//! Fit a two-parameter income distribution to binned data by minimizing the
//! GMM criterion, either once with a given weighting matrix ([`fit`]) or as
//! the full identity → weighting → two-step sequence held by
//! [`GMMEstimator`].
//!
//! Key behaviors
//! -------------
//! - [`fit`] validates the initial guess, maps it into θ-space through the
//!   parameter bounds, runs the minimizer and maps θ̂ back. The fitted
//!   parameters always satisfy their bounds.
//! - An iteration cap, or a best value still at [`CRITERION_SENTINEL`], is
//!   reported as `converged == false` and logged at warn level; it is not
//!   an error. [`FitResult::into_converged`] turns it into one.
//! - [`GMMEstimator::fit_two_step`] keeps every intermediate product in
//!   [`TwoStepResult`]. Errors raised inside the session are labeled with
//!   the [`FitStage`] they came from.
//!
//! Invariants & assumptions
//! ------------------------
//! - A failed fit never returns a parameter pair.
//! - The session is immutable; each call builds its own objective.
use crate::{
    gmm::{
        core::{
            bins::{BinEdges, BinnedData, EmpiricalWeights},
            bounds::Bounds,
            family::{DistributionSpec, Family},
            options::{GMMOptions, MomentOptions},
            table::BracketTable,
            validation::validate_initial,
            weight_matrix::{WeightMatrix, WeightingKind},
        },
        errors::{FitStage, GMMError, GMMResult},
        models::{
            criterion::{CRITERION_SENTINEL, GMMObjective},
            moments::{ModelMoments, predict},
            weighting::{WeightingEstimate, estimate_weighting},
        },
    },
    optimization::minimizer::{FnEvalMap, SolverKind, Theta, minimize},
};
use ndarray::Array1;

/// Outcome of a single GMM fit.
///
/// Fields
/// ------
/// - `spec`: fitted distribution (model-space parameters).
/// - `theta_hat`: optimizer solution in unconstrained θ-space.
/// - `criterion`: criterion value at `spec`.
/// - `converged`, `status`: solver termination as reported by `argmin`.
/// - `iterations`, `fn_evals`: work counters.
/// - `solver`: L-BFGS variant, or Nelder–Mead after a fallback.
/// - `weighting`: kind of weighting matrix the fit used.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub spec: DistributionSpec,
    pub theta_hat: Theta,
    pub criterion: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub solver: SolverKind,
    pub weighting: WeightingKind,
}

impl FitResult {
    /// Model moments at the fitted parameters, for plotting the fitted
    /// curve against the empirical bins.
    ///
    /// # Errors
    /// - Any [`predict`] error.
    pub fn fitted_moments(
        &self, edges: &BinEdges, options: &MomentOptions,
    ) -> GMMResult<ModelMoments> {
        predict(edges, &self.spec, options)
    }

    /// Return `self` only if the solver converged.
    ///
    /// # Errors
    /// - `GMMError::NonConvergence` carrying the solver status and iteration
    ///   count.
    pub fn into_converged(self) -> GMMResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(GMMError::NonConvergence { status: self.status, iterations: self.iterations })
        }
    }
}

/// fit — minimize the GMM criterion for `family` from `initial`.
///
/// Parameters
/// ----------
/// - `initial`: model-space starting point `(p1, p2)`.
/// - `data`: bin edges and (possibly rescaled) empirical weights.
/// - `weight`: `N × N` weighting matrix.
/// - `family`: distribution family.
/// - `options`: moment, error-form, bound and optimizer options.
///
/// Returns
/// -------
/// `GMMResult<FitResult>`
///
/// ## Steps
/// 1. Validate `initial` (length, finiteness) and map it into θ-space;
///    a guess outside its bound is rejected here.
/// 2. Build a [`GMMObjective`] and run [`minimize`], which checks the
///    weighting shape, truncation and zero weights before iterating.
/// 3. Map θ̂ back through the bounds into a [`DistributionSpec`].
///
/// Errors
/// ------
/// - `GMMError::ParameterCountMismatch`, `NonFiniteInitial`,
///   `InitialOutsideBounds` for a bad starting point.
/// - `GMMError::WeightMatrixShape`, `InvalidTruncation`, `Division` from
///   the objective pre-check.
/// - `GMMError::Optimization` for solver failures.
pub fn fit(
    initial: &Array1<f64>, data: &BinnedData, weight: &WeightMatrix, family: Family,
    options: &GMMOptions,
) -> GMMResult<FitResult> {
    validate_initial(initial, family)?;
    let objective = GMMObjective::new(family, weight, options);
    let theta0 = objective.bounds().to_theta(initial)?;
    log::debug!(
        "fitting {family} with {} weighting on {} bins from {initial}",
        weight.kind(),
        data.n_bins()
    );

    let outcome = minimize(&objective, theta0, data, &options.optim)?;
    let params = objective.params(&outcome.theta_hat)?;
    let spec = DistributionSpec::from_array(family, &params)?;
    let converged = outcome.converged && outcome.value < CRITERION_SENTINEL;

    if converged {
        log::info!(
            "{spec}: criterion {:.6e} after {} iterations ({})",
            outcome.value,
            outcome.iterations,
            outcome.solver
        );
    } else {
        log::warn!(
            "{spec}: not converged ({}) after {} iterations, criterion {:.6e}",
            outcome.status,
            outcome.iterations,
            outcome.value
        );
    }

    Ok(FitResult {
        spec,
        theta_hat: outcome.theta_hat,
        criterion: outcome.value,
        converged,
        status: outcome.status,
        iterations: outcome.iterations,
        fn_evals: outcome.fn_evals,
        solver: outcome.solver,
        weighting: weight.kind(),
    })
}

/// Everything produced by a two-step estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoStepResult {
    /// First stage, `W = I`.
    pub identity: FitResult,
    /// Weighting matrix estimated at the first-stage parameters.
    pub weighting: WeightingEstimate,
    /// Second stage, started from the first-stage parameters.
    pub two_step: FitResult,
}

/// `GMMEstimator` — one estimation session over a fixed dataset.
///
/// Owns the binned data, the raw (unrescaled) weights used by the weighting
/// estimator, the family and the options, and threads them through each
/// stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GMMEstimator {
    family: Family,
    data: BinnedData,
    raw_weights: EmpiricalWeights,
    options: GMMOptions,
}

impl GMMEstimator {
    /// Create a session; the raw weights default to `data.weights()`.
    ///
    /// # Errors
    /// - `GMMError::InvalidTruncation` if the truncation surrogates are
    ///   incompatible with the outer edges.
    pub fn new(family: Family, data: BinnedData, options: GMMOptions) -> GMMResult<Self> {
        options.moments.truncation.check_edges(data.edges())?;
        let raw_weights = data.weights().clone();
        Ok(GMMEstimator { family, data, raw_weights, options })
    }

    /// Create a session from a bracket table; the table's unadjusted
    /// weights feed the weighting estimator.
    ///
    /// # Errors
    /// - Edge and weight validation errors from the table.
    /// - Truncation errors as in [`GMMEstimator::new`].
    pub fn from_table(
        family: Family, table: &BracketTable, lower_edge: f64, options: GMMOptions,
    ) -> GMMResult<Self> {
        let data = table.to_binned(lower_edge)?;
        let raw = table.raw_weights()?;
        GMMEstimator::new(family, data, options)?.with_raw_weights(raw)
    }

    /// Replace the raw weights used by [`GMMEstimator::estimate_weighting`].
    ///
    /// # Errors
    /// - `GMMError::WeightLengthMismatch` if `raw` does not have one entry
    ///   per bin.
    pub fn with_raw_weights(mut self, raw: EmpiricalWeights) -> GMMResult<Self> {
        let bins = self.data.n_bins();
        if raw.len() != bins {
            return Err(GMMError::WeightLengthMismatch { bins, weights: raw.len() });
        }
        self.raw_weights = raw;
        Ok(self)
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn data(&self) -> &BinnedData {
        &self.data
    }

    pub fn raw_weights(&self) -> &EmpiricalWeights {
        &self.raw_weights
    }

    pub fn options(&self) -> &GMMOptions {
        &self.options
    }

    /// Bounds in effect for this session.
    pub fn bounds(&self) -> Bounds {
        self.options.bounds.unwrap_or_else(|| Bounds::for_family(self.family))
    }

    /// First-stage fit with `W = I`.
    ///
    /// # Errors
    /// - Any [`fit`] error, labeled `FitStage::Identity`.
    pub fn fit_identity(&self, initial: &Array1<f64>) -> GMMResult<FitResult> {
        let weight = WeightMatrix::identity(self.data.n_bins());
        self.run_stage(initial, &weight, FitStage::Identity)
    }

    /// Fit with an explicit weighting matrix.
    ///
    /// # Errors
    /// - Any [`fit`] error, labeled with the stage matching `weight.kind()`.
    pub fn fit_with(&self, initial: &Array1<f64>, weight: &WeightMatrix) -> GMMResult<FitResult> {
        let stage = match weight.kind() {
            WeightingKind::Identity => FitStage::Identity,
            WeightingKind::TwoStep => FitStage::TwoStep,
            WeightingKind::User => FitStage::UserWeighted,
        };
        self.run_stage(initial, weight, stage)
    }

    /// Weighting matrix from the residuals of `first_stage`.
    ///
    /// # Errors
    /// - Any [`estimate_weighting`] error, labeled `FitStage::Weighting`.
    pub fn estimate_weighting(&self, first_stage: &FitResult) -> GMMResult<WeightingEstimate> {
        log::debug!("estimating two-step weighting at {}", first_stage.spec);
        estimate_weighting(&first_stage.spec, self.data.edges(), &self.raw_weights, &self.options)
            .map_err(|e| e.in_stage(FitStage::Weighting))
    }

    /// Identity fit, weighting estimate, then a second fit started from the
    /// first-stage parameters.
    ///
    /// # Errors
    /// - The first failing stage's error, wrapped in `GMMError::Stage`.
    pub fn fit_two_step(&self, initial: &Array1<f64>) -> GMMResult<TwoStepResult> {
        let identity = self.fit_identity(initial)?;
        let weighting = self.estimate_weighting(&identity)?;
        let start = identity.spec.to_array();
        let two_step = self.fit_with(&start, &weighting.weight)?;
        log::info!(
            "two-step estimate {} (identity stage {}, {} weighting warnings)",
            two_step.spec,
            identity.spec,
            weighting.warnings.len()
        );
        Ok(TwoStepResult { identity, weighting, two_step })
    }

    fn run_stage(
        &self, initial: &Array1<f64>, weight: &WeightMatrix, stage: FitStage,
    ) -> GMMResult<FitResult> {
        log::debug!("starting {stage}");
        fit(initial, &self.data, weight, self.family, &self.options).map_err(|e| e.in_stage(stage))
    }
}
