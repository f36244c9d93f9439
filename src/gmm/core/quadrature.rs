//! Adaptive integration of a bin density on finite intervals.
//!
//! Purpose
//! -------
//! Integrate a scalar density over one bin with the double-exponential
//! (tanh–sinh) rule from the `quadrature` crate. When the rule's error
//! estimate misses the tolerance, the panel with the largest error is
//! bisected and each half is integrated again, up to a subdivision cap.
//!
//! Key behaviors
//! -------------
//! - Convergence: total error `<= max(abs_tol, rel_tol · |value|)`.
//! - Failing to converge is reported as `GMMError::Integration` with the
//!   achieved error and subdivision count; the bin index is attached by the
//!   caller.
//! - A NaN/±inf integrand value aborts with `GMMError::NonFiniteIntegrand`
//!   naming the first offending abscissa.
//!
//! Conventions
//! -----------
//! - `integrate(f, a, b)` with `a > b` returns `-integrate(f, b, a)`;
//!   `a == b` returns zero without evaluating `f`.
use crate::gmm::{
    core::options::QuadratureOptions,
    errors::{GMMError, GMMResult},
};
use std::cell::Cell;

/// Result of an adaptive integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    pub value: f64,
    pub abs_error: f64,
    /// Number of panels in the final partition.
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// integrate — adaptive double-exponential integral of `f` over `[a, b]`.
///
/// Parameters
/// ----------
/// - `f`: integrand; must be finite on `[a, b]`.
/// - `a`, `b`: finite integration limits.
/// - `opts`: tolerances and subdivision cap.
///
/// Returns
/// -------
/// `GMMResult<Integral>`
///
/// Errors
/// ------
/// - `GMMError::NonFiniteIntegrand` if `f` returns NaN/±inf.
/// - `GMMError::Integration` if the tolerance is not met within
///   `opts.max_subdivisions` panels, or a panel can no longer be bisected
///   in floating point.
pub fn integrate<F>(f: F, a: f64, b: f64, opts: &QuadratureOptions) -> GMMResult<Integral>
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return Ok(Integral { value: 0.0, abs_error: 0.0, subdivisions: 1 });
    }
    if a > b {
        let flipped = integrate(f, b, a, opts)?;
        return Ok(Integral { value: -flipped.value, ..flipped });
    }

    let first_bad: Cell<Option<(f64, f64)>> = Cell::new(None);
    let guarded = |x: f64| {
        let value = f(x);
        if value.is_finite() {
            value
        } else {
            if first_bad.get().is_none() {
                first_bad.set(Some((x, value)));
            }
            0.0
        }
    };
    let panel = |lo: f64, hi: f64| -> GMMResult<Panel> {
        let out = ::quadrature::double_exponential::integrate(&guarded, lo, hi, opts.abs_tol);
        if let Some((x, value)) = first_bad.get() {
            return Err(GMMError::NonFiniteIntegrand { x, value });
        }
        Ok(Panel { a: lo, b: hi, value: out.integral, error: out.error_estimate.abs() })
    };

    let mut panels = vec![panel(a, b)?];
    loop {
        let value: f64 = panels.iter().map(|p| p.value).sum();
        let abs_error: f64 = panels.iter().map(|p| p.error).sum();
        let subdivisions = panels.len();
        if abs_error <= opts.abs_tol.max(opts.rel_tol * value.abs()) {
            return Ok(Integral { value, abs_error, subdivisions });
        }

        let failure =
            GMMError::Integration { bin: None, lower: a, upper: b, abs_error, subdivisions };
        if subdivisions >= opts.max_subdivisions {
            return Err(failure);
        }

        let worst = panels
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let Panel { a: lo, b: hi, .. } = panels[worst];
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            return Err(failure);
        }
        panels[worst] = panel(lo, mid)?;
        panels.push(panel(mid, hi)?);
    }
}
