//! GMM options — configuration for moment prediction, errors, weighting and
//! estimation.
//!
//! Purpose
//! -------
//! Collect every tuning knob of a binned GMM estimation in one place so call
//! sites pass explicit, validated options instead of magic numbers.
//!
//! Key behaviors
//! -------------
//! - [`Truncation`] replaces the open outer edges of the support: the first
//!   lower edge by `lower_eps` and the last upper edge by `upper_surrogate`.
//! - [`QuadratureOptions`] and [`MomentMethod`] select adaptive
//!   double-exponential integration or closed-form CDF differences; both live in
//!   [`MomentOptions`].
//! - [`ErrorForm`] selects relative or absolute moment errors.
//! - [`WeightingOptions`] configure the two-step weighting estimator.
//! - [`GMMOptions`] bundles the above with optimizer options and optional
//!   parameter bounds.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every `new` constructor validates its inputs and never panics.
//! - [`GMMOptions`] performs no cross-field checks; truncation is checked
//!   against concrete bin edges by [`Truncation::check_edges`] at
//!   prediction time.
//!
//! Testing notes
//! -------------
//! - Unit tests cover defaults, validation failures, and `ErrorForm`
//!   parsing.
use crate::{
    gmm::{
        core::{bins::BinEdges, bounds::Bounds},
        errors::{GMMError, GMMResult},
    },
    inference::pinv::DEFAULT_RCOND,
    optimization::minimizer::OptimOptions,
};
use std::{fmt, str::FromStr};

/// Default replacement for the first lower edge.
pub const DEFAULT_LOWER_EPS: f64 = 1e-10;
/// Default replacement for the last upper edge (incomes in thousands).
pub const DEFAULT_UPPER_SURROGATE: f64 = 1000.0;
/// Default absolute and relative quadrature tolerance.
pub const DEFAULT_QUAD_TOL: f64 = 1.49e-8;
/// Default cap on quadrature subintervals per bin.
pub const DEFAULT_MAX_SUBDIVISIONS: usize = 50;
/// Default threshold below which `Ω` is treated as numerically zero.
pub const DEFAULT_DEGENERATE_TOL: f64 = 1e-14;
/// Default residual size indistinguishable from zero; its square floors
/// the ridge added to `Ω`.
pub const DEFAULT_RESIDUAL_TOL: f64 = 1e-6;
/// Default cap on the condition number of the regularized `Ω`.
pub const DEFAULT_MAX_CONDITION: f64 = 1e6;

/// `Truncation` — finite stand-ins for the outer edges of the support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Truncation {
    pub lower_eps: f64,
    pub upper_surrogate: f64,
}

impl Truncation {
    /// # Errors
    /// - `GMMError::InvalidTruncation` unless
    ///   `0 < lower_eps < upper_surrogate < ∞`.
    pub fn new(lower_eps: f64, upper_surrogate: f64) -> GMMResult<Self> {
        let reason = if !lower_eps.is_finite() || lower_eps <= 0.0 {
            Some("lower_eps must be finite and > 0")
        } else if !upper_surrogate.is_finite() {
            Some("upper_surrogate must be finite")
        } else if upper_surrogate <= lower_eps {
            Some("upper_surrogate must exceed lower_eps")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(GMMError::InvalidTruncation { lower_eps, upper_surrogate, reason }),
            None => Ok(Truncation { lower_eps, upper_surrogate }),
        }
    }

    /// Check that the surrogates leave every bin non-empty.
    ///
    /// # Errors
    /// - `GMMError::InvalidTruncation` if `lower_eps` is not below the
    ///   first bin's upper edge or `upper_surrogate` is not above the last
    ///   bin's lower edge.
    pub fn check_edges(&self, edges: &BinEdges) -> GMMResult<()> {
        let n = edges.n_bins();
        let (_, first_upper) = edges.bounds(0);
        let (last_lower, _) = edges.bounds(n - 1);
        if self.lower_eps >= first_upper {
            return Err(GMMError::InvalidTruncation {
                lower_eps: self.lower_eps,
                upper_surrogate: self.upper_surrogate,
                reason: "lower_eps must lie below the first bin's upper edge",
            });
        }
        if self.upper_surrogate <= last_lower {
            return Err(GMMError::InvalidTruncation {
                lower_eps: self.lower_eps,
                upper_surrogate: self.upper_surrogate,
                reason: "upper_surrogate must lie above the last bin's lower edge",
            });
        }
        Ok(())
    }

    /// Integration limits of bin `i` after applying the surrogates.
    pub fn bin_limits(&self, edges: &BinEdges, i: usize) -> (f64, f64) {
        let (mut lo, mut hi) = edges.bounds(i);
        if i == 0 {
            lo = self.lower_eps;
        }
        if i + 1 == edges.n_bins() {
            hi = self.upper_surrogate;
        }
        (lo, hi)
    }
}

impl Default for Truncation {
    fn default() -> Self {
        Truncation { lower_eps: DEFAULT_LOWER_EPS, upper_surrogate: DEFAULT_UPPER_SURROGATE }
    }
}

/// `QuadratureOptions` — tolerances for adaptive double-exponential integration.
///
/// A bin converges when its error estimate is at most
/// `max(abs_tol, rel_tol · |value|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureOptions {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_subdivisions: usize,
}

impl QuadratureOptions {
    /// # Errors
    /// - `GMMError::InvalidQuadrature` for non-finite or non-positive
    ///   tolerances, or a zero subdivision cap.
    pub fn new(abs_tol: f64, rel_tol: f64, max_subdivisions: usize) -> GMMResult<Self> {
        for (name, value) in [("abs_tol", abs_tol), ("rel_tol", rel_tol)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GMMError::InvalidQuadrature {
                    name,
                    value,
                    reason: "must be finite and > 0",
                });
            }
        }
        if max_subdivisions == 0 {
            return Err(GMMError::InvalidQuadrature {
                name: "max_subdivisions",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        Ok(QuadratureOptions { abs_tol, rel_tol, max_subdivisions })
    }
}

impl Default for QuadratureOptions {
    fn default() -> Self {
        QuadratureOptions {
            abs_tol: DEFAULT_QUAD_TOL,
            rel_tol: DEFAULT_QUAD_TOL,
            max_subdivisions: DEFAULT_MAX_SUBDIVISIONS,
        }
    }
}

/// How bin probabilities are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MomentMethod {
    /// Adaptive quadrature of the density over each bin.
    Adaptive(QuadratureOptions),
    /// `F(upper) - F(lower)` using the family's CDF.
    ClosedForm,
}

impl Default for MomentMethod {
    fn default() -> Self {
        MomentMethod::Adaptive(QuadratureOptions::default())
    }
}

/// `MomentOptions` — truncation plus moment method.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MomentOptions {
    pub truncation: Truncation,
    pub method: MomentMethod,
}

impl MomentOptions {
    pub fn new(truncation: Truncation, method: MomentMethod) -> MomentOptions {
        MomentOptions { truncation, method }
    }
}

/// Form of the moment error vector.
///
/// Parsing is case-insensitive (`"relative"`, `"absolute"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorForm {
    /// `(model - empirical) / empirical`.
    #[default]
    Relative,
    /// `model - empirical`.
    Absolute,
}

impl FromStr for ErrorForm {
    type Err = GMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relative" | "rel" | "percent" => Ok(ErrorForm::Relative),
            "absolute" | "abs" | "level" => Ok(ErrorForm::Absolute),
            _ => Err(GMMError::UnknownErrorForm { name: s.to_string() }),
        }
    }
}

impl fmt::Display for ErrorForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorForm::Relative => write!(f, "relative"),
            ErrorForm::Absolute => write!(f, "absolute"),
        }
    }
}

/// `WeightingOptions` — configuration of the two-step weighting estimator.
///
/// Fields
/// ------
/// - `rcond`: relative singular-value cutoff of the pseudo-inverse.
/// - `degenerate_tol`: residuals whose covariance `e eᵀ / n` has largest
///   singular value at most this give the identity.
/// - `ridge`: minimum diagonal loading `δ` added to `Ω` before inversion.
/// - `residual_tol`: residual size treated as noise; the loading is at
///   least `residual_tol²`, so `Ŵ → I` as the residuals vanish.
/// - `max_condition`: the loading is also large enough to keep
///   `cond(Ω + δ I) <= max_condition`; `f64::INFINITY` disables the cap.
/// - `sample_size`: scaling `n` in `Ω = e eᵀ / n`; `None` uses the number
///   of bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightingOptions {
    pub rcond: f64,
    pub degenerate_tol: f64,
    pub ridge: f64,
    pub residual_tol: f64,
    pub max_condition: f64,
    pub sample_size: Option<usize>,
}

impl WeightingOptions {
    /// # Errors
    /// - `GMMError::InvalidWeightingOption` naming the offending field.
    pub fn new(
        rcond: f64, degenerate_tol: f64, ridge: f64, sample_size: Option<usize>,
    ) -> GMMResult<Self> {
        if !rcond.is_finite() || !(0.0..1.0).contains(&rcond) {
            return Err(GMMError::InvalidWeightingOption {
                name: "rcond",
                value: rcond,
                reason: "must be finite and in [0, 1)",
            });
        }
        if !degenerate_tol.is_finite() || degenerate_tol < 0.0 {
            return Err(GMMError::InvalidWeightingOption {
                name: "degenerate_tol",
                value: degenerate_tol,
                reason: "must be finite and >= 0",
            });
        }
        if !ridge.is_finite() || ridge < 0.0 {
            return Err(GMMError::InvalidWeightingOption {
                name: "ridge",
                value: ridge,
                reason: "must be finite and >= 0",
            });
        }
        if sample_size == Some(0) {
            return Err(GMMError::InvalidWeightingOption {
                name: "sample_size",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        Ok(WeightingOptions {
            rcond,
            degenerate_tol,
            ridge,
            residual_tol: DEFAULT_RESIDUAL_TOL,
            max_condition: DEFAULT_MAX_CONDITION,
            sample_size,
        })
    }

    /// Replace the residual floor and the condition cap.
    ///
    /// `with_regularization(0.0, f64::INFINITY)` together with `ridge = 0`
    /// gives the plain pseudo-inverse of `e eᵀ / n`.
    ///
    /// # Errors
    /// - `GMMError::InvalidWeightingOption` for a negative or non-finite
    ///   `residual_tol`, or `max_condition <= 1` (NaN included).
    pub fn with_regularization(
        mut self, residual_tol: f64, max_condition: f64,
    ) -> GMMResult<Self> {
        if !residual_tol.is_finite() || residual_tol < 0.0 {
            return Err(GMMError::InvalidWeightingOption {
                name: "residual_tol",
                value: residual_tol,
                reason: "must be finite and >= 0",
            });
        }
        if max_condition.is_nan() || max_condition <= 1.0 {
            return Err(GMMError::InvalidWeightingOption {
                name: "max_condition",
                value: max_condition,
                reason: "must be > 1",
            });
        }
        self.residual_tol = residual_tol;
        self.max_condition = max_condition;
        Ok(self)
    }

    /// Diagonal loading for residuals whose covariance has largest singular
    /// value `spread`: `max(ridge, residual_tol², spread / (max_condition - 1))`.
    pub fn effective_ridge(&self, spread: f64) -> f64 {
        let floor = self.ridge.max(self.residual_tol * self.residual_tol);
        if self.max_condition.is_finite() {
            floor.max(spread / (self.max_condition - 1.0))
        } else {
            floor
        }
    }
}

impl Default for WeightingOptions {
    fn default() -> Self {
        WeightingOptions {
            rcond: DEFAULT_RCOND,
            degenerate_tol: DEFAULT_DEGENERATE_TOL,
            ridge: 0.0,
            residual_tol: DEFAULT_RESIDUAL_TOL,
            max_condition: DEFAULT_MAX_CONDITION,
            sample_size: None,
        }
    }
}

/// `GMMOptions` — everything an estimation session needs besides data.
///
/// `bounds = None` selects the family defaults ([`Bounds::for_family`]).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GMMOptions {
    pub moments: MomentOptions,
    pub error_form: ErrorForm,
    pub optim: OptimOptions,
    pub bounds: Option<Bounds>,
    pub weighting: WeightingOptions,
}

impl GMMOptions {
    pub fn new(
        moments: MomentOptions, error_form: ErrorForm, optim: OptimOptions,
        bounds: Option<Bounds>, weighting: WeightingOptions,
    ) -> GMMOptions {
        GMMOptions { moments, error_form, optim, bounds, weighting }
    }
}
