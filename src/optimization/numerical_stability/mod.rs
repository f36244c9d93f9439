//! numerical_stability — numerically robust parameter transforms.
//!
//! Purpose
//! -------
//! Collect the scalar transforms used to keep box-constrained parameters
//! inside their admissible region while the optimizer moves freely in an
//! unconstrained vector `θ`. Centralizing them keeps the bound handling
//! in the GMM layer free of overflow/underflow concerns.
//!
//! Key behaviors
//! -------------
//! - Map ℝ → (0, ∞) with [`safe_softplus`] and back with
//!   [`safe_softplus_inv`] (lower-bounded parameters).
//! - Map ℝ → (0, 1) with [`safe_logistic`] and back with [`safe_logit`]
//!   (interval-bounded parameters).
//! - Share the [`BOUND_MARGIN`] tolerance used when an initial value sits
//!   on the edge of an interval.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite `f64`; validation of user-facing values happens in
//!   the GMM layer before any transform is applied.
//! - The forward transforms never return `NaN` for finite inputs.
//!
//! Conventions
//! -----------
//! - Pure functions only: no logging, no I/O, no global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] check agreement with naïve formulas,
//!   inverse pairs, and tail behavior.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    BOUND_MARGIN, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{
        BOUND_MARGIN, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    };
}
