//! optimization — criterion minimizer, parameter transforms, and error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model fitting, combining an
//! Argmin-backed minimizer, numerically stable parameter transforms, and a
//! single error/result surface. Callers implement an objective, choose
//! tolerances, and obtain fitted parameters and diagnostics without touching
//! backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **minimizing** an objective `c(θ)`
//!   (`minimizer`), including solver choice, stopping criteria and the
//!   Nelder–Mead fallback.
//! - Supply shared numerical primitives (`numerical_stability`) for mapping
//!   unconstrained parameters into bounded model space.
//! - Normalize configuration issues, numerical failures, and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Optimizers operate in an unconstrained parameter space `θ` and assume
//!   that inputs are finite once validation has passed; invalid states are
//!   reported as `OptError`, not panics.
//! - Errors raised by the GMM objective travel through this layer wrapped in
//!   `OptError::Model` and are unwrapped again by the GMM layer.
//!
//! Conventions
//! -----------
//! - Public optimization entrypoints that can fail return `OptResult<T>`;
//!   callers never see raw Argmin errors.
//! - Progress is reported through the `log` facade at debug level; the
//!   fallback restart is reported at warn level.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules cover solver wiring, tolerance handling,
//!   toy minimizations, the fallback path, and the transforms.

pub mod errors;
pub mod minimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::minimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
