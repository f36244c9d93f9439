//! Two-step weighting estimator.
//!
//! Purpose
//! -------
//! Build the second-stage weighting matrix from first-stage residuals:
//!
//! ```text
//! e = errors(predict(θ̂₁), raw weights),   Ω = e eᵀ / n + δ I,   Ŵ = Ω⁺ / ‖Ω⁺‖₂
//! ```
//!
//! Key behaviors
//! -------------
//! - `e eᵀ / n` is rank one, so it is loaded with
//!   `δ = max(ridge, residual_tol², s / (max_condition - 1))`, where `s`
//!   is its largest singular value. The first term is the caller's ridge,
//!   the second makes `Ŵ` tend to the identity as the residuals vanish,
//!   and the third bounds `cond(Ω)` by `max_condition`.
//! - The inverse is an SVD pseudo-inverse with a relative cutoff. With the
//!   loading disabled, rank deficiency is recorded as a `SingularMatrix`
//!   warning and logged, never returned as an error.
//! - `Ŵ` is scaled to unit spectral norm; the scale does not move the
//!   minimizer and keeps the entries bounded for any residual size.
//! - Residuals with `s <= degenerate_tol` (e.g. after a perfect first-stage
//!   fit) yield the identity and a `DegenerateCovariance` warning.
//!
//! Invariants & assumptions
//! ------------------------
//! - Residuals use the same error form as the criterion, so `Ŵ` and the
//!   second-stage errors share a scale.
//! - The returned matrix is symmetric, finite and `N × N`.
use crate::{
    gmm::{
        core::{
            bins::{BinEdges, EmpiricalWeights},
            family::DistributionSpec,
            options::GMMOptions,
            weight_matrix::WeightMatrix,
        },
        errors::{GMMError, GMMResult},
        models::moments::{ErrorVector, moment_errors, predict},
    },
    inference::{covariance::moment_covariance, pinv::pseudo_inverse},
};
use ndarray::Array2;

/// Outcome of the two-step weighting estimator.
///
/// Fields
/// ------
/// - `weight`: second-stage weighting matrix (identity when degenerate).
/// - `residuals`: first-stage moment errors `e`.
/// - `covariance`: `Ω` as inverted, loading included.
/// - `ridge`: the loading `δ` applied.
/// - `rank`: numerical rank of `Ω`.
/// - `condition`: `s_max / s_min` of `Ω` (infinite when singular).
/// - `sample_size`: `n` used to scale `Ω`.
/// - `warnings`: `SingularMatrix` / `DegenerateCovariance` notes.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightingEstimate {
    pub weight: WeightMatrix,
    pub residuals: ErrorVector,
    pub covariance: Array2<f64>,
    pub ridge: f64,
    pub rank: usize,
    pub condition: f64,
    pub sample_size: usize,
    pub warnings: Vec<GMMError>,
}

impl WeightingEstimate {
    pub fn is_degenerate(&self) -> bool {
        self.warnings.iter().any(|w| matches!(w, GMMError::DegenerateCovariance { .. }))
    }
}

/// estimate_weighting — regularized inverse of the first-stage moment covariance.
///
/// Parameters
/// ----------
/// - `first_stage`: fitted distribution from the identity-weighted stage.
/// - `edges`: bin edges used for prediction.
/// - `raw_weights`: empirical weights before any bracket rescaling.
/// - `options`: moment options, error form and [`WeightingOptions`].
///
/// Returns
/// -------
/// `GMMResult<WeightingEstimate>`
///
/// Errors
/// ------
/// - `GMMError::WeightLengthMismatch` if `raw_weights` does not match the
///   bins.
/// - Prediction and moment-error failures (`Integration`, `Division`, ...)
///   propagate; no sentinel is used here.
/// - `GMMError::Inference` if the covariance or SVD step fails.
///
/// [`WeightingOptions`]: crate::gmm::core::options::WeightingOptions
pub fn estimate_weighting(
    first_stage: &DistributionSpec, edges: &BinEdges, raw_weights: &EmpiricalWeights,
    options: &GMMOptions,
) -> GMMResult<WeightingEstimate> {
    let n_bins = edges.n_bins();
    if raw_weights.len() != n_bins {
        return Err(GMMError::WeightLengthMismatch { bins: n_bins, weights: raw_weights.len() });
    }
    let wopts = &options.weighting;

    let model = predict(edges, first_stage, &options.moments)?;
    let residuals = moment_errors(&model, raw_weights, options.error_form)?;
    let sample_size = wopts.sample_size.unwrap_or(n_bins);
    let spread = residuals.dot(&residuals) / sample_size as f64;
    let ridge = wopts.effective_ridge(spread);
    let covariance = moment_covariance(&residuals, sample_size, ridge)?;
    let pinv = pseudo_inverse(&covariance, wopts.rcond)?;

    let mut warnings = Vec::new();
    let weight = if spread <= wopts.degenerate_tol {
        let warning = GMMError::DegenerateCovariance {
            largest_singular_value: spread,
            tol: wopts.degenerate_tol,
        };
        log::warn!("{warning}");
        warnings.push(warning);
        WeightMatrix::identity(n_bins)
    } else {
        if pinv.is_rank_deficient() {
            let warning = GMMError::SingularMatrix {
                rank: pinv.rank,
                dim: n_bins,
                condition: pinv.condition,
            };
            log::warn!("{warning}");
            warnings.push(warning);
        }
        let scale = pinv.smallest_retained_singular_value().unwrap_or(1.0);
        WeightMatrix::two_step(pinv.matrix * scale)?
    };
    log::debug!(
        "two-step weighting at {first_stage}: rank {} of {n_bins}, n = {sample_size}, \
         ridge {ridge:e}, condition {:e}",
        pinv.rank,
        pinv.condition
    );

    Ok(WeightingEstimate {
        weight,
        residuals,
        covariance,
        ridge,
        rank: pinv.rank,
        condition: pinv.condition,
        sample_size,
        warnings,
    })
}
