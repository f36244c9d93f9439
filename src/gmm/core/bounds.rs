//! Box bounds on distribution parameters and their θ-space mapping.
//!
//! Purpose
//! -------
//! The optimizer works in an unconstrained vector `θ`. Each model
//! parameter carries a [`ParamBound`] that maps `θ` into its feasible set so
//! bounds hold exactly at every trial point, not only at the optimum.
//!
//! Key behaviors
//! -------------
//! - `Free`: `x = θ`.
//! - `Lower(lo)`: `x = lo + softplus(θ)`.
//! - `Interval(lo, hi)`: `x = lo + (hi - lo) · logistic(θ)`.
//! - [`Bounds::for_family`] gives the defaults: lognormal
//!   `[Free, Lower(1e-10)]`, gamma `[Lower(1e-10), Lower(1e-10)]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - An initial guess outside its bound is rejected by
//!   [`Bounds::to_theta`]. A guess exactly on a bound is nudged inside by
//!   [`BOUND_MARGIN`] so the inverse transform stays finite.
//! - `from_theta` never fails; it can return a value on the bound itself
//!   when `θ` saturates the transform.
use crate::{
    gmm::{
        core::family::Family,
        errors::{GMMError, GMMResult},
    },
    optimization::numerical_stability::transformations::{
        BOUND_MARGIN, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    },
};
use ndarray::Array1;

/// Default lower bound on strictly positive parameters.
pub const DEFAULT_POSITIVE_LOWER: f64 = 1e-10;

/// Feasible set of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamBound {
    Free,
    Lower(f64),
    Interval(f64, f64),
}

impl ParamBound {
    /// `(lower, upper)` limits, infinite where unbounded.
    pub fn limits(&self) -> (f64, f64) {
        match *self {
            ParamBound::Free => (f64::NEG_INFINITY, f64::INFINITY),
            ParamBound::Lower(lo) => (lo, f64::INFINITY),
            ParamBound::Interval(lo, hi) => (lo, hi),
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = self.limits();
        x >= lo && x <= hi
    }

    /// Map a model-space value into θ-space.
    pub fn to_theta(&self, x: f64) -> f64 {
        match *self {
            ParamBound::Free => x,
            ParamBound::Lower(lo) => safe_softplus_inv((x - lo).max(BOUND_MARGIN)),
            ParamBound::Interval(lo, hi) => {
                let p = ((x - lo) / (hi - lo)).clamp(BOUND_MARGIN, 1.0 - BOUND_MARGIN);
                safe_logit(p)
            }
        }
    }

    /// Map a θ-space value back into the feasible set.
    pub fn from_theta(&self, t: f64) -> f64 {
        match *self {
            ParamBound::Free => t,
            ParamBound::Lower(lo) => lo + safe_softplus(t),
            ParamBound::Interval(lo, hi) => lo + (hi - lo) * safe_logistic(t),
        }
    }

    fn validate(&self, index: usize) -> GMMResult<()> {
        let (lower, upper) = self.limits();
        let reason = match *self {
            ParamBound::Free => None,
            ParamBound::Lower(lo) if !lo.is_finite() => Some("lower bound must be finite"),
            ParamBound::Interval(lo, hi) if !lo.is_finite() || !hi.is_finite() => {
                Some("interval bounds must be finite")
            }
            ParamBound::Interval(lo, hi) if lo >= hi => Some("lower bound must be < upper bound"),
            _ => None,
        };
        match reason {
            Some(reason) => Err(GMMError::InvalidBound { index, lower, upper, reason }),
            None => Ok(()),
        }
    }
}

/// Bounds for the two parameters of a family, in storage order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    params: [ParamBound; 2],
}

impl Bounds {
    /// # Errors
    /// - `GMMError::InvalidBound` for non-finite or inverted limits.
    pub fn new(first: ParamBound, second: ParamBound) -> GMMResult<Self> {
        first.validate(0)?;
        second.validate(1)?;
        Ok(Bounds { params: [first, second] })
    }

    pub fn for_family(family: Family) -> Self {
        match family {
            Family::LogNormal => Bounds {
                params: [ParamBound::Free, ParamBound::Lower(DEFAULT_POSITIVE_LOWER)],
            },
            Family::Gamma => Bounds {
                params: [
                    ParamBound::Lower(DEFAULT_POSITIVE_LOWER),
                    ParamBound::Lower(DEFAULT_POSITIVE_LOWER),
                ],
            },
        }
    }

    pub fn get(&self, index: usize) -> Option<ParamBound> {
        self.params.get(index).copied()
    }

    /// Map an initial guess into θ-space.
    ///
    /// # Errors
    /// - `GMMError::ParameterCountMismatch` if `x.len() != 2`.
    /// - `GMMError::InitialOutsideBounds` if any entry violates its bound.
    pub fn to_theta(&self, x: &Array1<f64>) -> GMMResult<Array1<f64>> {
        if x.len() != self.params.len() {
            return Err(GMMError::ParameterCountMismatch {
                expected: self.params.len(),
                actual: x.len(),
            });
        }
        for (index, (bound, &value)) in self.params.iter().zip(x.iter()).enumerate() {
            if !bound.contains(value) {
                let (lower, upper) = bound.limits();
                return Err(GMMError::InitialOutsideBounds { index, value, lower, upper });
            }
        }
        Ok(self.params.iter().zip(x.iter()).map(|(b, &v)| b.to_theta(v)).collect())
    }

    /// Map θ back into model space.
    ///
    /// # Errors
    /// - `GMMError::ParameterCountMismatch` if `theta.len() != 2`.
    pub fn from_theta(&self, theta: &Array1<f64>) -> GMMResult<Array1<f64>> {
        if theta.len() != self.params.len() {
            return Err(GMMError::ParameterCountMismatch {
                expected: self.params.len(),
                actual: theta.len(),
            });
        }
        Ok(self.params.iter().zip(theta.iter()).map(|(b, &t)| b.from_theta(t)).collect())
    }
}
