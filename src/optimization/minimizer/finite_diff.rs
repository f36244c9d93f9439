//! minimizer::finite_diff — finite-difference gradients with error capture.
//!
//! Purpose
//! -------
//! Provide finite-difference gradient approximations around a parameter
//! vector, together with validation, so that the adapter can request
//! derivatives without depending directly on the `finitediff` API.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] tries central differences first and falls back to
//!   forward differences when the central pass hit an evaluation error or
//!   produced a non-finite gradient.
//! - [`run_fd_diff`] computes a forward-difference gradient with error
//!   capture and post-hoc validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective closure cannot return `Result`; it routes its first error
//!   into the shared `closure_err` cell and returns `NaN`.
//! - Gradients returned from this module satisfy [`validate_grad`].
//!
//! Conventions
//! -----------
//! - Finite differences are taken with respect to the unconstrained vector
//!   `Theta`; any reparameterization is handled by higher layers.
//! - Argmin’s [`Error`] is confined to the closure boundary; results are
//!   reported as [`OptResult`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover the happy path, closure-error propagation, the
//!   central→forward fallback, and non-finite gradients.
use crate::optimization::{
    errors::OptResult,
    minimizer::{Grad, Theta, validation::validate_grad},
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// fd_gradient — central-difference gradient with forward fallback.
///
/// Parameters
/// ----------
/// - `theta`: point at which the gradient is approximated.
/// - `func`: objective closure that writes any evaluation error into
///   `closure_err` and returns `NaN` in that case.
/// - `closure_err`: shared error slot; cleared on entry.
///
/// Returns
/// -------
/// `OptResult<Grad>`
///   - `Ok(grad)` from the central pass when it evaluated cleanly and
///     passed validation; otherwise the validated forward-difference
///     gradient.
///   - `Err(e)` when the forward pass also failed.
///
/// Errors
/// ------
/// - Any error captured from `func` during the forward pass.
/// - `OptError::InvalidGradient` / `OptError::GradientDimMismatch` from
///   [`validate_grad`].
pub fn fd_gradient<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let central = theta.central_diff(func);
    if closure_err.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }
    run_fd_diff(theta, func, closure_err)
}

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Clears `closure_err`, runs `forward_diff`, surfaces any captured error,
/// then validates the gradient.
///
/// # Errors
/// - `OptError` (via `impl From<Error> for OptError`) for a captured
///   closure error.
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}
