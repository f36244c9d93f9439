//! Distribution families for binned income models.
//!
//! This module defines [`Family`], the two supported parametric income
//! distributions, [`DistributionSpec`], a validated `(family, p1, p2)`
//! triple, and [`Density`], the `statrs` distribution built from a spec.
//!
//! ## Supported families
//! - [`Family::LogNormal`]: `ln X ~ N(mu, sigma²)`, `mu` finite, `sigma > 0`.
//! - [`Family::Gamma`]: shape `alpha > 0`, scale `beta > 0`
//!   (`statrs` is parameterized by the rate `1 / beta`).
//!
//! ## Numerics
//! - Densities are defined on `x > 0`; `pdf(x)` returns `0` for `x <= 0`
//!   so integration ranges touching the origin stay finite.
//! - Parameter domains are checked before any `statrs` constructor runs, so
//!   domain violations surface as `GMMError::Domain` with the parameter name.
use crate::gmm::{
    core::validation::validate_family_params,
    errors::{GMMError, GMMResult},
};
use ndarray::{Array1, array};
use statrs::distribution::{Continuous, ContinuousCDF, Gamma, LogNormal};
use std::{fmt, str::FromStr};

/// Supported distribution families.
///
/// Parsing is case-insensitive and accepts `"lognormal"`, `"lognorm"`,
/// `"ln"`, `"gamma"` and `"ga"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    LogNormal,
    Gamma,
}

impl Family {
    /// Parameter names in storage order.
    pub const fn param_names(&self) -> [&'static str; 2] {
        match self {
            Family::LogNormal => ["mu", "sigma"],
            Family::Gamma => ["alpha", "beta"],
        }
    }
}

impl FromStr for Family {
    type Err = GMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lognormal" | "lognorm" | "ln" => Ok(Family::LogNormal),
            "gamma" | "ga" => Ok(Family::Gamma),
            _ => Err(GMMError::UnknownFamily { name: s.to_string() }),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::LogNormal => write!(f, "lognormal"),
            Family::Gamma => write!(f, "gamma"),
        }
    }
}

/// `DistributionSpec` — a family together with two validated parameters.
///
/// Fields are private so every instance satisfies its family's domain:
/// lognormal `(mu, sigma)` with `mu` finite and `sigma > 0`; gamma
/// `(alpha, beta)` with both `> 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionSpec {
    family: Family,
    p1: f64,
    p2: f64,
}

impl DistributionSpec {
    /// Build a spec after checking the family's parameter domain.
    ///
    /// # Errors
    /// - `GMMError::Domain` naming the offending parameter.
    pub fn new(family: Family, p1: f64, p2: f64) -> GMMResult<Self> {
        validate_family_params(family, p1, p2)?;
        Ok(DistributionSpec { family, p1, p2 })
    }

    pub fn lognormal(mu: f64, sigma: f64) -> GMMResult<Self> {
        Self::new(Family::LogNormal, mu, sigma)
    }

    pub fn gamma(alpha: f64, beta: f64) -> GMMResult<Self> {
        Self::new(Family::Gamma, alpha, beta)
    }

    /// Build a spec from a length-2 parameter vector.
    ///
    /// # Errors
    /// - `GMMError::ParameterCountMismatch` if `params.len() != 2`.
    /// - `GMMError::Domain` as in [`DistributionSpec::new`].
    pub fn from_array(family: Family, params: &Array1<f64>) -> GMMResult<Self> {
        if params.len() != 2 {
            return Err(GMMError::ParameterCountMismatch { expected: 2, actual: params.len() });
        }
        Self::new(family, params[0], params[1])
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn params(&self) -> (f64, f64) {
        (self.p1, self.p2)
    }

    pub fn to_array(&self) -> Array1<f64> {
        array![self.p1, self.p2]
    }

    /// Construct the backing `statrs` distribution.
    ///
    /// # Errors
    /// - `GMMError::InvalidDistribution` if `statrs` rejects the parameters
    ///   (e.g. a gamma scale so small that its rate overflows).
    pub fn density(&self) -> GMMResult<Density> {
        match self.family {
            Family::LogNormal => Ok(Density::LogNormal(LogNormal::new(self.p1, self.p2)?)),
            Family::Gamma => Ok(Density::Gamma(Gamma::new(self.p1, 1.0 / self.p2)?)),
        }
    }
}

impl fmt::Display for DistributionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [n1, n2] = self.family.param_names();
        write!(f, "{}({n1} = {}, {n2} = {})", self.family, self.p1, self.p2)
    }
}

/// Evaluable density backed by `statrs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    LogNormal(LogNormal),
    Gamma(Gamma),
}

impl Density {
    /// Probability density at `x`; `0` outside the support `x > 0`.
    pub fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        match self {
            Density::LogNormal(d) => d.pdf(x),
            Density::Gamma(d) => d.pdf(x),
        }
    }

    /// Cumulative distribution function at `x`; `0` for `x <= 0`.
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        match self {
            Density::LogNormal(d) => d.cdf(x),
            Density::Gamma(d) => d.cdf(x),
        }
    }
}

/// density — evaluate the family's density at a point.
///
/// Parameters
/// ----------
/// - `x`: evaluation point; values `<= 0` give `0`.
/// - `family`: distribution family.
/// - `p1`, `p2`: family parameters (`(mu, sigma)` or `(alpha, beta)`).
///
/// Returns
/// -------
/// `GMMResult<f64>`
///   Non-negative density value.
///
/// Errors
/// ------
/// - `GMMError::Domain` for parameters outside the family's domain.
/// - `GMMError::InvalidDistribution` if `statrs` rejects the parameters.
pub fn density(x: f64, family: Family, p1: f64, p2: f64) -> GMMResult<f64> {
    Ok(DistributionSpec::new(family, p1, p2)?.density()?.pdf(x))
}
