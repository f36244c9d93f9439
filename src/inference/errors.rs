//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used by the moment
//! covariance estimator and the pseudo-inverse. An alias `InferenceResult<T>`
//! standardizes the return type across inference code.

/// Unified error type for inference routines.
///
/// Covers malformed inputs (empty residuals, non-square or non-finite
/// matrices), invalid tuning constants, and decomposition failures.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Inputs ----
    /// Residual vector is empty.
    EmptyResiduals,

    /// Residual entry is NaN/±inf.
    NonFiniteResidual { index: usize, value: f64 },

    /// Matrix is not square.
    NonSquareMatrix { rows: usize, cols: usize },

    /// Matrix entry is NaN/±inf.
    NonFiniteMatrix { row: usize, col: usize, value: f64 },

    // ---- Tuning ----
    /// Scaling sample size must be at least one.
    InvalidSampleSize { n: usize },

    /// Ridge must be finite and non-negative.
    InvalidRidge { ridge: f64 },

    /// Relative singular-value cutoff must be finite and in `[0, 1)`.
    InvalidRcond { rcond: f64 },

    // ---- Numerics ----
    /// SVD did not produce the requested factors.
    DecompositionFailed { reason: &'static str },

    // ---- Fallback ----
    UnknownError,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Inputs ----
            InferenceError::EmptyResiduals => {
                write!(f, "Inference Error: residual vector is empty")
            }
            InferenceError::NonFiniteResidual { index, value } => {
                write!(f, "Inference Error: residual {index} is non-finite ({value})")
            }
            InferenceError::NonSquareMatrix { rows, cols } => {
                write!(f, "Inference Error: matrix must be square, got {rows}x{cols}")
            }
            InferenceError::NonFiniteMatrix { row, col, value } => {
                write!(f, "Inference Error: matrix entry ({row}, {col}) is non-finite ({value})")
            }

            // ---- Tuning ----
            InferenceError::InvalidSampleSize { n } => {
                write!(f, "Inference Error: sample size must be >= 1, got {n}")
            }
            InferenceError::InvalidRidge { ridge } => {
                write!(f, "Inference Error: ridge must be finite and >= 0, got {ridge}")
            }
            InferenceError::InvalidRcond { rcond } => {
                write!(f, "Inference Error: rcond must be finite and in [0, 1), got {rcond}")
            }

            // ---- Numerics ----
            InferenceError::DecompositionFailed { reason } => {
                write!(f, "Inference Error: decomposition failed ({reason})")
            }

            // ---- Fallback ----
            InferenceError::UnknownError => write!(f, "Inference Error: Unknown error occurred"),
        }
    }
}
