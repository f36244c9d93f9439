//! Errors for binned GMM estimation (data validation, distribution domains,
//! quadrature, moment errors, weighting, bounds, and optimizer failures).
//!
//! This module defines [`GMMError`], used across the data contracts, the
//! moment machinery and the estimator session, together with [`FitStage`]
//! which labels the stage of a two-step fit that failed.
//!
//! ## Conventions
//! - **Bin indices are 0-based.**
//! - `Domain` and `Integration` raised inside one criterion evaluation are
//!   converted to a sentinel by the criterion; everywhere else they
//!   propagate.
//! - `SingularMatrix` and `DegenerateCovariance` are recorded as warnings on
//!   a weighting estimate and never returned as `Err` by the estimator.
//! - Optimizer/backend errors are wrapped in [`GMMError::Optimization`]; an
//!   objective error that travelled through the optimizer is unwrapped back
//!   into its original variant.
use std::fmt;

use statrs::distribution::{GammaError, LogNormalError};

use crate::{
    gmm::core::family::Family, inference::errors::InferenceError, optimization::errors::OptError,
};

/// Crate-wide result alias for GMM operations that may produce [`GMMError`].
pub type GMMResult<T> = Result<T, GMMError>;

/// Stage of an estimation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStage {
    /// First-stage fit with the identity weighting matrix.
    Identity,
    /// Estimation of the two-step weighting matrix.
    Weighting,
    /// Second-stage fit with the estimated weighting matrix.
    TwoStep,
    /// Fit with a caller-supplied weighting matrix.
    UserWeighted,
}

impl fmt::Display for FitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStage::Identity => write!(f, "identity-weighted fit"),
            FitStage::Weighting => write!(f, "weighting-matrix estimation"),
            FitStage::TwoStep => write!(f, "two-step fit"),
            FitStage::UserWeighted => write!(f, "user-weighted fit"),
        }
    }
}

/// Unified error type for binned GMM estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum GMMError {
    // ---- Bins / data validation ----
    /// Fewer than two bin edges were supplied.
    TooFewEdges { len: usize },

    /// A bin edge is NaN/±inf.
    NonFiniteEdge { index: usize, value: f64 },

    /// The first bin edge is negative (incomes live on `[0, ∞)`).
    NegativeFirstEdge { value: f64 },

    /// Bin edges must be strictly increasing.
    EdgesNotIncreasing { index: usize, previous: f64, value: f64 },

    /// Number of weights does not match the number of bins.
    WeightLengthMismatch { bins: usize, weights: usize },

    /// An empirical weight is NaN/±inf.
    NonFiniteWeight { index: usize, value: f64 },

    /// An empirical weight is negative.
    NegativeWeight { index: usize, value: f64 },

    // ---- Distribution ----
    /// A distribution parameter lies outside its domain.
    Domain { family: Family, parameter: &'static str, value: f64 },

    /// Wrapper for statrs distribution construction errors.
    InvalidDistribution { family: Family, reason: &'static str },

    /// Unknown distribution family name.
    UnknownFamily { name: String },

    // ---- Quadrature / truncation ----
    /// Adaptive quadrature failed to reach its tolerance.
    Integration {
        bin: Option<usize>,
        lower: f64,
        upper: f64,
        abs_error: f64,
        subdivisions: usize,
    },

    /// The density returned a non-finite value inside an integration range.
    NonFiniteIntegrand { x: f64, value: f64 },

    /// Quadrature options must be finite and positive.
    InvalidQuadrature { name: &'static str, value: f64, reason: &'static str },

    /// Truncation bounds must satisfy `0 < lower_eps < upper_surrogate < ∞`
    /// and fit inside the outer bins.
    InvalidTruncation { lower_eps: f64, upper_surrogate: f64, reason: &'static str },

    // ---- Moment errors ----
    /// Relative error requested for a bin with zero empirical weight.
    Division { bin: usize },

    /// Two moment vectors have different lengths.
    MomentLengthMismatch { expected: usize, actual: usize },

    /// Unknown error form name.
    UnknownErrorForm { name: String },

    // ---- Weighting ----
    /// Weighting matrix shape does not match the number of moments.
    WeightMatrixShape { rows: usize, cols: usize, expected: usize },

    /// Weighting matrix entry is NaN/±inf.
    NonFiniteWeightMatrix { row: usize, col: usize, value: f64 },

    /// Weighting matrix is not symmetric within tolerance.
    AsymmetricWeightMatrix { row: usize, col: usize, gap: f64 },

    /// Weighting matrix has a negative eigenvalue beyond round-off.
    IndefiniteWeightMatrix { min_eigenvalue: f64, tol: f64 },

    /// Rank-deficient moment covariance (warning only).
    SingularMatrix { rank: usize, dim: usize, condition: f64 },

    /// Moment covariance numerically zero; identity used instead (warning only).
    DegenerateCovariance { largest_singular_value: f64, tol: f64 },

    /// Weighting options must be finite and within range.
    InvalidWeightingOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Bounds / initial guess ----
    /// Parameter bound is malformed.
    InvalidBound { index: usize, lower: f64, upper: f64, reason: &'static str },

    /// Initial guess is NaN/±inf.
    NonFiniteInitial { index: usize, value: f64 },

    /// Initial guess lies outside its bound.
    InitialOutsideBounds { index: usize, value: f64, lower: f64, upper: f64 },

    /// Wrong number of parameters for the family.
    ParameterCountMismatch { expected: usize, actual: usize },

    // ---- Bracket table ----
    /// A bracket-table row could not be parsed.
    TableParse { line: usize, reason: String },

    /// Reading the bracket table failed.
    TableIo { reason: String },

    /// The bracket table holds no rows.
    EmptyTable,

    /// Rescaling index out of range or divisor not positive.
    InvalidRescale { index: usize, divisor: f64, reason: &'static str },

    // ---- Estimation / optimizer ----
    /// Optimizer stopped without meeting its convergence criteria.
    NonConvergence { status: String, iterations: usize },

    /// Wrapper for optimizer errors.
    Optimization(OptError),

    /// Wrapper for inference (covariance / pseudo-inverse) errors.
    Inference(InferenceError),

    /// Error raised during a specific stage of a two-step session.
    Stage { stage: FitStage, source: Box<GMMError> },

    /// ---- Fallback ----
    UnknownError,
}

impl GMMError {
    /// Attach the failing bin to an integration error; other variants pass
    /// through unchanged.
    pub fn at_bin(self, bin: usize) -> Self {
        match self {
            GMMError::Integration { lower, upper, abs_error, subdivisions, .. } => {
                GMMError::Integration { bin: Some(bin), lower, upper, abs_error, subdivisions }
            }
            other => other,
        }
    }

    /// Label an error with the session stage it came from.
    pub fn in_stage(self, stage: FitStage) -> Self {
        GMMError::Stage { stage, source: Box::new(self) }
    }

    /// `true` for the errors the criterion maps to its sentinel value.
    pub fn is_recoverable_in_criterion(&self) -> bool {
        matches!(
            self,
            GMMError::Domain { .. }
                | GMMError::InvalidDistribution { .. }
                | GMMError::Integration { .. }
                | GMMError::NonFiniteIntegrand { .. }
        )
    }
}

impl std::error::Error for GMMError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GMMError::Optimization(err) => Some(err),
            GMMError::Inference(err) => Some(err),
            GMMError::Stage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for GMMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // ---- Bins / data validation ----
            GMMError::TooFewEdges { len } => {
                write!(f, "At least two bin edges are required; got {len}.")
            }
            GMMError::NonFiniteEdge { index, value } => {
                write!(f, "Bin edge at index {index} is non-finite: {value}")
            }
            GMMError::NegativeFirstEdge { value } => {
                write!(f, "First bin edge must be >= 0; got {value}")
            }
            GMMError::EdgesNotIncreasing { index, previous, value } => {
                write!(
                    f,
                    "Bin edges must be strictly increasing; edge {index} ({value}) <= previous ({previous})"
                )
            }
            GMMError::WeightLengthMismatch { bins, weights } => {
                write!(f, "Expected {bins} empirical weights (one per bin), got {weights}")
            }
            GMMError::NonFiniteWeight { index, value } => {
                write!(f, "Empirical weight at index {index} is non-finite: {value}")
            }
            GMMError::NegativeWeight { index, value } => {
                write!(f, "Empirical weight at index {index} is negative: {value}")
            }

            // ---- Distribution ----
            GMMError::Domain { family, parameter, value } => {
                write!(f, "{family} parameter {parameter} outside its domain: {value}")
            }
            GMMError::InvalidDistribution { family, reason } => {
                write!(f, "Invalid {family} distribution: {reason}")
            }
            GMMError::UnknownFamily { name } => {
                write!(f, "Unknown distribution family '{name}'; expected 'lognormal' or 'gamma'")
            }

            // ---- Quadrature / truncation ----
            GMMError::Integration { bin, lower, upper, abs_error, subdivisions } => {
                match bin {
                    Some(bin) => write!(f, "Integration over bin {bin} ")?,
                    None => write!(f, "Integration ")?,
                }
                write!(
                    f,
                    "[{lower}, {upper}] did not converge after {subdivisions} subdivisions (error estimate {abs_error:e})"
                )
            }
            GMMError::NonFiniteIntegrand { x, value } => {
                write!(f, "Density is non-finite at x = {x}: {value}")
            }
            GMMError::InvalidQuadrature { name, value, reason } => {
                write!(f, "Invalid quadrature option {name} = {value}: {reason}")
            }
            GMMError::InvalidTruncation { lower_eps, upper_surrogate, reason } => {
                write!(
                    f,
                    "Invalid truncation (lower_eps = {lower_eps}, upper_surrogate = {upper_surrogate}): {reason}"
                )
            }

            // ---- Moment errors ----
            GMMError::Division { bin } => {
                write!(f, "Relative moment error undefined: empirical weight of bin {bin} is zero")
            }
            GMMError::MomentLengthMismatch { expected, actual } => {
                write!(f, "Moment vector length mismatch: expected {expected}, got {actual}")
            }
            GMMError::UnknownErrorForm { name } => {
                write!(f, "Unknown error form '{name}'; expected 'relative' or 'absolute'")
            }

            // ---- Weighting ----
            GMMError::WeightMatrixShape { rows, cols, expected } => {
                write!(f, "Weighting matrix must be {expected}x{expected}; got {rows}x{cols}")
            }
            GMMError::NonFiniteWeightMatrix { row, col, value } => {
                write!(f, "Weighting matrix entry ({row}, {col}) is non-finite: {value}")
            }
            GMMError::AsymmetricWeightMatrix { row, col, gap } => {
                write!(f, "Weighting matrix is not symmetric at ({row}, {col}); gap {gap:e}")
            }
            GMMError::IndefiniteWeightMatrix { min_eigenvalue, tol } => {
                write!(
                    f,
                    "Weighting matrix is not positive semi-definite: smallest eigenvalue {min_eigenvalue:e} (tolerance {tol:e})"
                )
            }
            GMMError::SingularMatrix { rank, dim, condition } => {
                write!(
                    f,
                    "Moment covariance is singular: rank {rank} of {dim} (condition {condition:e}); pseudo-inverse used"
                )
            }
            GMMError::DegenerateCovariance { largest_singular_value, tol } => {
                write!(
                    f,
                    "Moment covariance is numerically zero (largest singular value {largest_singular_value:e} <= {tol:e}); identity weighting used"
                )
            }
            GMMError::InvalidWeightingOption { name, value, reason } => {
                write!(f, "Invalid weighting option {name} = {value}: {reason}")
            }

            // ---- Bounds / initial guess ----
            GMMError::InvalidBound { index, lower, upper, reason } => {
                write!(f, "Invalid bound for parameter {index} ({lower}, {upper}): {reason}")
            }
            GMMError::NonFiniteInitial { index, value } => {
                write!(f, "Initial value for parameter {index} is non-finite: {value}")
            }
            GMMError::InitialOutsideBounds { index, value, lower, upper } => {
                write!(
                    f,
                    "Initial value {value} for parameter {index} lies outside its bound ({lower}, {upper})"
                )
            }
            GMMError::ParameterCountMismatch { expected, actual } => {
                write!(f, "Expected {expected} parameters, got {actual}")
            }

            // ---- Bracket table ----
            GMMError::TableParse { line, reason } => {
                write!(f, "Bracket table line {line}: {reason}")
            }
            GMMError::TableIo { reason } => {
                write!(f, "Failed to read bracket table: {reason}")
            }
            GMMError::EmptyTable => {
                write!(f, "Bracket table holds no rows.")
            }
            GMMError::InvalidRescale { index, divisor, reason } => {
                write!(f, "Cannot rescale bracket {index} by {divisor}: {reason}")
            }

            // ---- Estimation / optimizer ----
            GMMError::NonConvergence { status, iterations } => {
                write!(f, "Optimizer did not converge after {iterations} iterations: {status}")
            }
            GMMError::Optimization(err) => {
                write!(f, "Optimization failed: {err}")
            }
            GMMError::Inference(err) => {
                write!(f, "{err}")
            }
            GMMError::Stage { stage, source } => {
                write!(f, "{stage} failed: {source}")
            }
            GMMError::UnknownError => {
                write!(f, "An unknown error occurred in GMM estimation.")
            }
        }
    }
}

impl From<OptError> for GMMError {
    fn from(err: OptError) -> GMMError {
        match err {
            OptError::Model(inner) => *inner,
            other => GMMError::Optimization(other),
        }
    }
}

impl From<InferenceError> for GMMError {
    fn from(err: InferenceError) -> GMMError {
        GMMError::Inference(err)
    }
}

impl From<LogNormalError> for GMMError {
    fn from(err: LogNormalError) -> GMMError {
        let reason = match err {
            LogNormalError::LocationInvalid => "location (mu) must be finite",
            LogNormalError::ScaleInvalid => "scale (sigma) must be finite and > 0",
            #[allow(unreachable_patterns)]
            _ => "unknown parameter error",
        };
        GMMError::InvalidDistribution { family: Family::LogNormal, reason }
    }
}

impl From<GammaError> for GMMError {
    fn from(err: GammaError) -> GMMError {
        let reason = match err {
            GammaError::ShapeInvalid => "shape (alpha) must be finite and > 0",
            GammaError::RateInvalid => "rate (1/beta) must be finite and > 0",
            #[allow(unreachable_patterns)]
            _ => "unknown parameter error",
        };
        GMMError::InvalidDistribution { family: Family::Gamma, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Round-tripping objective errors through `OptError`.
    // - Stage labelling and bin attachment helpers.
    // - Classification of criterion-recoverable errors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A GMM error wrapped by the optimizer is recovered unchanged.
    //
    // Given
    // -----
    // - `GMMError::Division { bin: 3 }` converted into `OptError` and back.
    //
    // Expect
    // ------
    // - The original variant; backend errors stay wrapped.
    fn opt_error_round_trip_recovers_original_variant() {
        // Arrange
        let original = GMMError::Division { bin: 3 };

        // Act
        let through: GMMError = OptError::from(original.clone()).into();
        let backend: GMMError = OptError::MissingThetaHat.into();

        // Assert
        assert_eq!(through, original);
        assert_eq!(backend, GMMError::Optimization(OptError::MissingThetaHat));
    }

    #[test]
    // Purpose
    // -------
    // `at_bin` fills the bin of integration errors and leaves others alone.
    fn at_bin_only_touches_integration_errors() {
        let err = GMMError::Integration {
            bin: None,
            lower: 0.0,
            upper: 1.0,
            abs_error: 1e-3,
            subdivisions: 50,
        };
        match err.at_bin(4) {
            GMMError::Integration { bin, .. } => assert_eq!(bin, Some(4)),
            other => panic!("Expected Integration, got {other:?}"),
        }
        assert_eq!(GMMError::EmptyTable.at_bin(4), GMMError::EmptyTable);
    }

    #[test]
    // Purpose
    // -------
    // Stage-labelled errors keep their source and mention the stage.
    fn in_stage_wraps_source_and_names_stage() {
        let err = GMMError::EmptyTable.in_stage(FitStage::TwoStep);
        assert!(err.to_string().starts_with("two-step fit failed"));
        match err {
            GMMError::Stage { stage, source } => {
                assert_eq!(stage, FitStage::TwoStep);
                assert_eq!(*source, GMMError::EmptyTable);
            }
            other => panic!("Expected Stage, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Only domain and quadrature failures are mapped to the sentinel.
    fn recoverable_errors_are_domain_and_quadrature_failures() {
        let domain = GMMError::Domain { family: Family::Gamma, parameter: "alpha", value: -1.0 };
        assert!(domain.is_recoverable_in_criterion());
        assert!(!GMMError::Division { bin: 0 }.is_recoverable_in_criterion());
        assert!(!GMMError::Optimization(OptError::UnknownError).is_recoverable_in_criterion());
    }
}
