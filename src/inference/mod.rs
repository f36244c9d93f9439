//! inference — moment covariance and pseudo-inverse for GMM weighting.
//!
//! Purpose
//! -------
//! Provide the linear-algebra building blocks behind the two-step GMM
//! weighting matrix: the outer-product covariance of moment residuals and a
//! numerically robust Moore–Penrose inverse of that covariance.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for malformed inputs and decomposition failures.
//! - Build `Ω = (1/n) Rᵀ R + δ I` from residual rows via
//!   [`moment_covariance`] and [`avg_outer_product`].
//! - Invert `Ω` through an SVD with a relative singular-value cutoff via
//!   [`pseudo_inverse`], reporting rank and condition in [`PseudoInverse`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Covariance matrices are square, symmetric and positive semi-definite.
//! - All numerical routines return [`InferenceError`] on failure rather
//!   than panicking.
//!
//! Conventions
//! -----------
//! - Residual arrays use rows for draws and columns for moment conditions.
//! - Functions are pure: no logging and no global state. Rank deficiency is
//!   reported as data and turned into warnings by the GMM layer.
//!
//! Testing notes
//! -------------
//! - Unit tests cover rank-one covariances, ridge loading, full-rank and
//!   rank-deficient inverses, and input validation.

pub mod covariance;
pub mod errors;
pub mod pinv;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{avg_outer_product, moment_covariance};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::pinv::{DEFAULT_RCOND, PseudoInverse, pseudo_inverse};

// ---- Optional convenience prelude for downstream crates ------------------

pub mod prelude {
    pub use super::covariance::{avg_outer_product, moment_covariance};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::pinv::{DEFAULT_RCOND, PseudoInverse, pseudo_inverse};
}
