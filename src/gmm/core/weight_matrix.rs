//! Weighting matrices for the GMM criterion.
//!
//! A [`WeightMatrix`] is an `N × N` symmetric positive semi-definite matrix
//! tagged with how it was produced ([`WeightingKind`]). It is read-only for
//! the duration of an optimization stage; a new stage builds a new matrix.
use crate::gmm::errors::{GMMError, GMMResult};
use nalgebra::DMatrix;
use ndarray::Array2;
use std::fmt;

/// Absolute tolerance on `|W[i, j] - W[j, i]|` scaled by `max(1, |W|∞)`.
pub const SYMMETRY_TOL: f64 = 1e-10;

/// Smallest admissible eigenvalue, relative to the largest `|λ|`.
pub const PSD_TOL: f64 = 1e-10;

/// Origin of a weighting matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingKind {
    /// First-stage identity.
    Identity,
    /// Pseudo-inverse of an estimated moment covariance.
    TwoStep,
    /// Supplied by the caller.
    User,
}

impl fmt::Display for WeightingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightingKind::Identity => write!(f, "identity"),
            WeightingKind::TwoStep => write!(f, "two-step"),
            WeightingKind::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    matrix: Array2<f64>,
    kind: WeightingKind,
}

impl WeightMatrix {
    pub fn identity(n: usize) -> Self {
        WeightMatrix { matrix: Array2::eye(n), kind: WeightingKind::Identity }
    }

    /// Validate a caller-supplied matrix for `n` moments.
    ///
    /// # Errors
    /// - `GMMError::WeightMatrixShape` unless the matrix is `n × n`.
    /// - `GMMError::NonFiniteWeightMatrix` for NaN/±inf entries.
    /// - `GMMError::AsymmetricWeightMatrix` if not symmetric within
    ///   [`SYMMETRY_TOL`].
    /// - `GMMError::IndefiniteWeightMatrix` if an eigenvalue is below
    ///   `-PSD_TOL · max|λ|`.
    pub fn from_matrix(matrix: Array2<f64>, n: usize) -> GMMResult<Self> {
        Self::validated(matrix, n, WeightingKind::User)
    }

    /// Wrap a two-step estimate; symmetrizes away round-off first.
    pub(crate) fn two_step(matrix: Array2<f64>) -> GMMResult<Self> {
        let n = matrix.nrows();
        let symmetric = (&matrix + &matrix.t()) * 0.5;
        Self::validated(symmetric, n, WeightingKind::TwoStep)
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn kind(&self) -> WeightingKind {
        self.kind
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn validated(matrix: Array2<f64>, n: usize, kind: WeightingKind) -> GMMResult<Self> {
        let (rows, cols) = matrix.dim();
        if rows != n || cols != n {
            return Err(GMMError::WeightMatrixShape { rows, cols, expected: n });
        }
        if let Some(((row, col), &value)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(GMMError::NonFiniteWeightMatrix { row, col, value });
        }
        let scale = matrix.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        for i in 0..n {
            for j in (i + 1)..n {
                let gap = (matrix[[i, j]] - matrix[[j, i]]).abs();
                if gap > SYMMETRY_TOL * scale {
                    return Err(GMMError::AsymmetricWeightMatrix { row: i, col: j, gap });
                }
            }
        }
        check_semi_definite(&matrix)?;
        Ok(WeightMatrix { matrix, kind })
    }
}

/// Reject a symmetric matrix whose spectrum dips below round-off.
fn check_semi_definite(matrix: &Array2<f64>) -> GMMResult<()> {
    let n = matrix.nrows();
    if n == 0 {
        return Ok(());
    }
    let eigenvalues = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]).symmetric_eigenvalues();
    let min_eigenvalue = eigenvalues.min();
    let tol = PSD_TOL * eigenvalues.amax();
    if min_eigenvalue < -tol {
        return Err(GMMError::IndefiniteWeightMatrix { min_eigenvalue, tol });
    }
    Ok(())
}
