//! inference::pinv — SVD-based Moore–Penrose pseudo-inverse.
//!
//! Purpose
//! -------
//! Invert a (possibly rank-deficient) square matrix such as a moment
//! covariance `Ω` without ever forming an explicit inverse. The routine
//! copies the `ndarray` input into a `nalgebra::DMatrix`, runs a singular
//! value decomposition and truncates small singular values.
//!
//! Key behaviors
//! -------------
//! - Singular values `s_k ≤ rcond · s_max` are treated as zero, mirroring
//!   the usual relative cutoff of numerical pseudo-inverses.
//! - Report the retained rank, the singular values and the condition
//!   number `s_max / s_min` (infinite when `s_min = 0`) alongside the
//!   inverse so callers can record rank deficiency as a warning.
//! - A matrix whose singular values are all zero yields the zero matrix and
//!   rank 0.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are square and finite; violations are [`InferenceError`]s.
//! - The output satisfies the Penrose identity `A A⁺ A ≈ A` up to rounding.
//!
//! Testing notes
//! -------------
//! - Unit tests cover a full-rank inverse, a rank-one matrix, the zero
//!   matrix, and input validation.
use crate::inference::errors::{InferenceError, InferenceResult};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Default relative cutoff for singular values (relative to `s_max`).
pub const DEFAULT_RCOND: f64 = 1e-12;

/// Pseudo-inverse together with its spectral diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoInverse {
    /// `A⁺`, same shape as the input.
    pub matrix: Array2<f64>,
    /// Number of singular values above the cutoff.
    pub rank: usize,
    /// Singular values in the order returned by the decomposition.
    pub singular_values: Array1<f64>,
    /// `s_max / s_min` over all singular values.
    pub condition: f64,
}

impl PseudoInverse {
    /// Largest singular value (0 for the zero matrix).
    pub fn largest_singular_value(&self) -> f64 {
        self.singular_values.iter().cloned().fold(0.0, f64::max)
    }

    /// Smallest singular value above the cutoff, i.e. `1 / ‖A⁺‖₂`; `None`
    /// when nothing was kept.
    pub fn smallest_retained_singular_value(&self) -> Option<f64> {
        let mut kept = self.singular_values.to_vec();
        kept.sort_by(|a, b| b.total_cmp(a));
        self.rank.checked_sub(1).map(|k| kept[k])
    }

    /// `true` when some singular values were truncated.
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.matrix.nrows()
    }
}

/// pseudo_inverse — Moore–Penrose inverse via SVD with relative cutoff.
///
/// Parameters
/// ----------
/// - `a`: square, finite matrix.
/// - `rcond`: relative cutoff in `[0, 1)`.
///
/// Returns
/// -------
/// `InferenceResult<PseudoInverse>`
///
/// Errors
/// ------
/// - `InferenceError::NonSquareMatrix`, `NonFiniteMatrix`, `InvalidRcond`
///   for malformed inputs.
/// - `InferenceError::DecompositionFailed` if the SVD did not return its
///   singular vectors.
pub fn pseudo_inverse(a: &Array2<f64>, rcond: f64) -> InferenceResult<PseudoInverse> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(InferenceError::NonSquareMatrix { rows, cols });
    }
    if let Some(((row, col), &value)) = a.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(InferenceError::NonFiniteMatrix { row, col, value });
    }
    if !rcond.is_finite() || !(0.0..1.0).contains(&rcond) {
        return Err(InferenceError::InvalidRcond { rcond });
    }

    let n = rows;
    let svd = to_dmatrix(a).svd(true, true);
    let u = svd.u.ok_or(InferenceError::DecompositionFailed { reason: "missing U" })?;
    let v_t = svd.v_t.ok_or(InferenceError::DecompositionFailed { reason: "missing V^T" })?;
    let s = svd.singular_values;

    let s_max = s.iter().cloned().fold(0.0, f64::max);
    let s_min = s.iter().cloned().fold(f64::INFINITY, f64::min);
    let cutoff = rcond * s_max;
    let kept: Vec<usize> = (0..s.len()).filter(|&k| s[k] > cutoff && s[k] > 0.0).collect();

    // A⁺ = V Σ⁺ Uᵀ, summed over the retained singular triplets.
    let mut matrix = Array2::<f64>::zeros((n, n));
    for &k in &kept {
        let inv_s = 1.0 / s[k];
        for i in 0..n {
            let vik = v_t[(k, i)] * inv_s;
            for j in 0..n {
                matrix[[i, j]] += vik * u[(j, k)];
            }
        }
    }

    let condition = if s_min > 0.0 { s_max / s_min } else { f64::INFINITY };
    Ok(PseudoInverse {
        matrix,
        rank: kept.len(),
        singular_values: Array1::from_iter(s.iter().cloned()),
        condition,
    })
}

// ---- Helper methods ----

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}
