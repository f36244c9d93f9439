//! inference::covariance — outer-product covariance of moment residuals.
//!
//! Purpose
//! -------
//! Build the covariance matrix of moment conditions used by the two-step
//! weighting estimator. With a residual matrix `R` (`r × N`, one row per
//! residual draw) the estimator is
//!
//! ```text
//! Ω = (1/n) Rᵀ R  +  δ I,
//! ```
//!
//! where `n` is the scaling sample size and `δ ≥ 0` an optional ridge. The
//! binned estimator has a single residual row, so `Ω = e eᵀ / n` is rank one
//! unless a ridge is added.
//!
//! Invariants & assumptions
//! ------------------------
//! - Residuals are finite; `n ≥ 1`; `δ` is finite and non-negative.
//! - The output is symmetric and positive semi-definite by construction.
//!
//! Testing notes
//! -------------
//! - Unit tests check the rank-one structure, ridge handling, scaling, and
//!   input validation.
use crate::inference::errors::{InferenceError, InferenceResult};
use ndarray::{Array1, Array2, Axis};

/// moment_covariance — `Ω = e eᵀ / n + δ I` for a single residual vector.
///
/// Parameters
/// ----------
/// - `residuals`: moment error vector `e` of length `N ≥ 1`.
/// - `n`: scaling sample size (`≥ 1`).
/// - `ridge`: diagonal loading `δ ≥ 0`.
///
/// Returns
/// -------
/// `InferenceResult<Array2<f64>>`
///   Symmetric `N × N` covariance.
///
/// Errors
/// ------
/// - `InferenceError::EmptyResiduals`, `NonFiniteResidual`,
///   `InvalidSampleSize`, `InvalidRidge` for malformed inputs.
pub fn moment_covariance(
    residuals: &Array1<f64>, n: usize, ridge: f64,
) -> InferenceResult<Array2<f64>> {
    let rows = residuals.view().insert_axis(Axis(0)).to_owned();
    avg_outer_product(&rows, n, ridge)
}

/// avg_outer_product — `(1/n) Rᵀ R + δ I` for an `r × N` residual matrix.
///
/// # Errors
/// Same as [`moment_covariance`].
pub fn avg_outer_product(
    residuals: &Array2<f64>, n: usize, ridge: f64,
) -> InferenceResult<Array2<f64>> {
    if residuals.is_empty() {
        return Err(InferenceError::EmptyResiduals);
    }
    if let Some((index, &value)) = residuals.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteResidual { index, value });
    }
    if n == 0 {
        return Err(InferenceError::InvalidSampleSize { n });
    }
    if !ridge.is_finite() || ridge < 0.0 {
        return Err(InferenceError::InvalidRidge { ridge });
    }

    let mut omega = residuals.t().dot(residuals) / n as f64;
    if ridge > 0.0 {
        omega.diag_mut().mapv_inplace(|d| d + ridge);
    }
    Ok(omega)
}
