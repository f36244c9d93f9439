//! Binned moment prediction and moment errors.
//!
//! Purpose
//! -------
//! Turn a [`DistributionSpec`] into the probability mass it assigns to each
//! bin ("model moments") and compare those moments with the empirical
//! weights.
//!
//! Key behaviors
//! -------------
//! - [`predict`] integrates the density over each bin. The first bin starts
//!   at `Truncation::lower_eps` and the last ends at
//!   `Truncation::upper_surrogate`, regardless of the outer edges.
//! - [`MomentMethod::Adaptive`] uses adaptive quadrature; a bin that
//!   fails to converge is a `GMMError::Integration` naming the bin.
//!   [`MomentMethod::ClosedForm`] uses CDF differences.
//! - [`moment_errors`] returns `model - empirical` or
//!   `(model - empirical) / empirical`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Moments are recomputed on every call; nothing is cached.
//! - Predicted moments are non-negative.
//!
//! Testing notes
//! -------------
//! - Unit tests check that moments sum to one, monotonicity in bin width,
//!   agreement of both moment methods, and each error path.
use crate::gmm::{
    core::{
        bins::{BinEdges, EmpiricalWeights},
        family::DistributionSpec,
        options::{ErrorForm, MomentMethod, MomentOptions},
        quadrature::integrate,
        validation::validate_moment_lengths,
    },
    errors::{GMMError, GMMResult},
};
use ndarray::Array1;

/// Probability mass per bin.
pub type ModelMoments = Array1<f64>;

/// Discrepancy between model and empirical moments.
pub type ErrorVector = Array1<f64>;

/// predict — model moments of `spec` over the bins in `edges`.
///
/// Parameters
/// ----------
/// - `edges`: validated bin edges (`N` bins).
/// - `spec`: distribution family and parameters.
/// - `options`: truncation of the outer edges and moment method.
///
/// Returns
/// -------
/// `GMMResult<ModelMoments>`
///   Length-`N` vector of bin probabilities.
///
/// Errors
/// ------
/// - `GMMError::InvalidTruncation` if the surrogates empty the outer bins.
/// - `GMMError::InvalidDistribution` if `statrs` rejects the parameters.
/// - `GMMError::Integration { bin: Some(i), .. }` if quadrature on bin `i`
///   misses its tolerance.
/// - `GMMError::NonFiniteIntegrand` if the density is not finite.
pub fn predict(
    edges: &BinEdges, spec: &DistributionSpec, options: &MomentOptions,
) -> GMMResult<ModelMoments> {
    let truncation = &options.truncation;
    truncation.check_edges(edges)?;
    let density = spec.density()?;

    let n = edges.n_bins();
    let mut moments = Array1::<f64>::zeros(n);
    for i in 0..n {
        let (lo, hi) = truncation.bin_limits(edges, i);
        moments[i] = match &options.method {
            MomentMethod::Adaptive(quad) => {
                integrate(|x| density.pdf(x), lo, hi, quad).map_err(|e| e.at_bin(i))?.value
            }
            MomentMethod::ClosedForm => (density.cdf(hi) - density.cdf(lo)).max(0.0),
        };
    }
    Ok(moments)
}

/// moment_errors — discrepancy between model and empirical moments.
///
/// # Errors
/// - `GMMError::MomentLengthMismatch` if the lengths differ.
/// - `GMMError::Division { bin }` for a zero empirical weight under
///   [`ErrorForm::Relative`].
pub fn moment_errors(
    model: &ModelMoments, empirical: &EmpiricalWeights, form: ErrorForm,
) -> GMMResult<ErrorVector> {
    let data = empirical.as_array();
    validate_moment_lengths(data.len(), model.len())?;
    match form {
        ErrorForm::Absolute => Ok(model - data),
        ErrorForm::Relative => {
            if let Some(bin) = data.iter().position(|&w| w == 0.0) {
                return Err(GMMError::Division { bin });
            }
            Ok((model - data) / data)
        }
    }
}
