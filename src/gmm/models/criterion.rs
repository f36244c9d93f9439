//! GMM criterion `eᵀ W e` and its optimizer-facing objective.
//!
//! Purpose
//! -------
//! Assemble the scalar GMM criterion from model moments, moment errors and a
//! weighting matrix, and expose it to the generic minimizer through
//! [`GMMObjective`], which maps unconstrained `θ` through parameter bounds
//! before every evaluation.
//!
//! Key behaviors
//! -------------
//! - [`quadratic_form`] computes `eᵀ W e`, clamping round-off negatives to
//!   zero.
//! - [`criterion`] runs predict → errors → quadratic form. Domain and
//!   quadrature failures inside one evaluation become
//!   [`CRITERION_SENTINEL`] so the optimizer can keep exploring; every
//!   other error propagates.
//! - [`GMMObjective::check`] rejects configurations that would fail on every
//!   evaluation (shape mismatches, zero weights under the relative form)
//!   before the optimizer starts.
//!
//! Invariants & assumptions
//! ------------------------
//! - The criterion is pure and deterministic for fixed inputs.
//! - The weighting matrix is read-only for the lifetime of the objective.
use crate::{
    gmm::{
        core::{
            bins::BinnedData,
            bounds::Bounds,
            family::{DistributionSpec, Family},
            options::{ErrorForm, GMMOptions},
            weight_matrix::WeightMatrix,
        },
        errors::{GMMError, GMMResult},
        models::moments::{ErrorVector, moment_errors, predict},
    },
    optimization::{
        errors::{OptError, OptResult},
        minimizer::{Cost, Objective, Theta},
    },
};
use ndarray::Array1;

/// Criterion value reported when a trial point cannot be evaluated.
pub const CRITERION_SENTINEL: f64 = 1e10;

/// quadratic_form — `eᵀ W e`, clamped at zero.
///
/// `W` is positive semi-definite by construction, so the clamp only absorbs
/// round-off.
///
/// # Errors
/// - `GMMError::WeightMatrixShape` if `W` is not `len(e) × len(e)`.
pub fn quadratic_form(errors: &ErrorVector, weight: &WeightMatrix) -> GMMResult<f64> {
    let w = weight.matrix();
    let (rows, cols) = w.dim();
    if rows != errors.len() || cols != errors.len() {
        return Err(GMMError::WeightMatrixShape { rows, cols, expected: errors.len() });
    }
    Ok(errors.dot(&w.dot(errors)).max(0.0))
}

/// criterion — GMM criterion at model-space parameters `params`.
///
/// Parameters
/// ----------
/// - `params`: `(p1, p2)` for `family`.
/// - `data`: bin edges and empirical weights.
/// - `weight`: `N × N` weighting matrix.
/// - `family`: distribution family.
/// - `options`: moment options and error form.
///
/// Returns
/// -------
/// `GMMResult<f64>`
///   Non-negative criterion, or [`CRITERION_SENTINEL`] when the parameters
///   fall outside the family's domain, quadrature fails, or the value is not
///   finite.
///
/// Errors
/// ------
/// - Everything except the recoverable domain/quadrature failures, e.g.
///   `GMMError::Division`, `GMMError::ParameterCountMismatch`,
///   `GMMError::WeightMatrixShape`, `GMMError::InvalidTruncation`.
pub fn criterion(
    params: &Array1<f64>, data: &BinnedData, weight: &WeightMatrix, family: Family,
    options: &GMMOptions,
) -> GMMResult<f64> {
    match evaluate(params, data, weight, family, options) {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(value) => {
            log::debug!("criterion at {params} is {value}; using sentinel");
            Ok(CRITERION_SENTINEL)
        }
        Err(err) if err.is_recoverable_in_criterion() => {
            log::debug!("criterion at {params} failed ({err}); using sentinel");
            Ok(CRITERION_SENTINEL)
        }
        Err(err) => Err(err),
    }
}

fn evaluate(
    params: &Array1<f64>, data: &BinnedData, weight: &WeightMatrix, family: Family,
    options: &GMMOptions,
) -> GMMResult<f64> {
    let spec = DistributionSpec::from_array(family, params)?;
    let model = predict(data.edges(), &spec, &options.moments)?;
    let errors = moment_errors(&model, data.weights(), options.error_form)?;
    quadratic_form(&errors, weight)
}

/// `GMMObjective` — criterion in unconstrained θ-space.
///
/// Holds the model side of the problem (family, bounds, weighting, options);
/// the binned data are passed per evaluation as [`Objective::Data`].
#[derive(Debug, Clone)]
pub struct GMMObjective<'a> {
    family: Family,
    bounds: Bounds,
    weight: &'a WeightMatrix,
    options: &'a GMMOptions,
}

impl<'a> GMMObjective<'a> {
    /// Build an objective; `options.bounds = None` selects the family
    /// defaults.
    pub fn new(family: Family, weight: &'a WeightMatrix, options: &'a GMMOptions) -> Self {
        let bounds = options.bounds.unwrap_or_else(|| Bounds::for_family(family));
        GMMObjective { family, bounds, weight, options }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Model-space parameters for `θ`.
    ///
    /// # Errors
    /// - `GMMError::ParameterCountMismatch` for a wrong-length `θ`.
    pub fn params(&self, theta: &Theta) -> GMMResult<Array1<f64>> {
        self.bounds.from_theta(theta)
    }
}

impl Objective for GMMObjective<'_> {
    type Data = BinnedData;

    /// Criterion at `θ` after mapping through the bounds.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost> {
        let params = self.params(theta)?;
        Ok(criterion(&params, data, self.weight, self.family, self.options)?)
    }

    /// Reject inputs that would fail on every evaluation.
    ///
    /// # Errors
    /// - `OptError::InvalidThetaInput` for non-finite `θ`.
    /// - Wrapped `GMMError` for shape, truncation or zero-weight problems.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        self.params(theta)?;
        let n = data.n_bins();
        if self.weight.dim() != n {
            let (rows, cols) = self.weight.matrix().dim();
            return Err(GMMError::WeightMatrixShape { rows, cols, expected: n }.into());
        }
        self.options.moments.truncation.check_edges(data.edges())?;
        if self.options.error_form == ErrorForm::Relative {
            if let Some(bin) = data.weights().as_array().iter().position(|&w| w == 0.0) {
                return Err(GMMError::Division { bin }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmm::core::options::{MomentMethod, MomentOptions, Truncation};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The quadratic form and its shape check.
    // - Sentinel conversion for domain failures versus propagation of
    //   other errors.
    // - Scale invariance of the relative form with identity weighting.
    // - `Objective` conformance of `GMMObjective` (`value`, `check`).
    // -------------------------------------------------------------------------

    fn three_bins() -> BinnedData {
        BinnedData::from_arrays(array![0.0, 50.0, 100.0, 350.0], array![0.5, 0.3, 0.2]).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // `quadratic_form` matches a hand computation.
    //
    // Given
    // -----
    // - `e = (1, 2)` and `W = [[2, 1], [1, 3]]`.
    //
    // Expect
    // ------
    // - `eᵀ W e = 2 + 4 + 12 = 18`; a wrong-size `W` is rejected.
    fn quadratic_form_matches_hand_computation() {
        let w = WeightMatrix::from_matrix(array![[2.0, 1.0], [1.0, 3.0]], 2).unwrap();
        assert_relative_eq!(quadratic_form(&array![1.0, 2.0], &w).unwrap(), 18.0);
        assert_eq!(
            quadratic_form(&array![1.0, 2.0, 3.0], &w),
            Err(GMMError::WeightMatrixShape { rows: 2, cols: 2, expected: 3 })
        );
    }

    #[test]
    // Purpose
    // -------
    // A domain failure becomes the sentinel; a zero weight does not.
    //
    // Given
    // -----
    // - Lognormal with `sigma = -1` and a dataset with a zero weight.
    //
    // Expect
    // ------
    // - `Ok(CRITERION_SENTINEL)` for the domain failure,
    //   `Err(Division)` for the zero weight.
    fn criterion_maps_domain_failures_to_sentinel() {
        // Arrange
        let data = three_bins();
        let w = WeightMatrix::identity(3);
        let opts = GMMOptions::default();

        // Act
        let bad_domain = criterion(&array![4.0, -1.0], &data, &w, Family::LogNormal, &opts);
        let zero = BinnedData::from_arrays(array![0.0, 50.0, 100.0, 350.0], array![0.5, 0.0, 0.5])
            .unwrap();
        let division = criterion(&array![4.0, 0.5], &zero, &w, Family::LogNormal, &opts);

        // Assert
        assert_eq!(bad_domain, Ok(CRITERION_SENTINEL));
        assert_eq!(division, Err(GMMError::Division { bin: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // Relative errors with `W = I` are invariant to a common rescaling of
    // model and empirical moments; absolute errors are not.
    //
    // Given
    // -----
    // - Model moments `m` and data `d`, and both scaled by 7.
    //
    // Expect
    // ------
    // - Equal relative criteria, absolute criterion scaled by 49.
    fn relative_form_is_scale_invariant() {
        // Arrange
        let w = WeightMatrix::identity(3);
        let m = array![0.35, 0.45, 0.2];
        let d = array![0.5, 0.3, 0.2];
        let emp = crate::gmm::core::bins::EmpiricalWeights::new(d.clone()).unwrap();
        let emp_scaled = crate::gmm::core::bins::EmpiricalWeights::new(&d * 7.0).unwrap();

        // Act
        let rel = |m: &Array1<f64>, e| {
            quadratic_form(&moment_errors(m, e, ErrorForm::Relative).unwrap(), &w).unwrap()
        };
        let abs = |m: &Array1<f64>, e| {
            quadratic_form(&moment_errors(m, e, ErrorForm::Absolute).unwrap(), &w).unwrap()
        };

        // Assert
        assert_relative_eq!(rel(&m, &emp), rel(&(&m * 7.0), &emp_scaled), epsilon = 1e-12);
        assert_relative_eq!(abs(&(&m * 7.0), &emp_scaled), 49.0 * abs(&m, &emp), epsilon = 1e-12);
        assert!((abs(&(&m * 7.0), &emp_scaled) - abs(&m, &emp)).abs() > 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // `GMMObjective::value` equals `criterion` at the mapped parameters.
    fn objective_value_matches_criterion_after_bounds_map() {
        // Arrange
        let data = three_bins();
        let w = WeightMatrix::identity(3);
        let opts = GMMOptions {
            moments: MomentOptions::new(Truncation::default(), MomentMethod::ClosedForm),
            ..GMMOptions::default()
        };
        let obj = GMMObjective::new(Family::LogNormal, &w, &opts);
        let x = array![60f64.ln(), 0.5];
        let theta = obj.bounds().to_theta(&x).unwrap();

        // Act
        let via_objective = obj.value(&theta, &data).unwrap();
        let direct = criterion(&x, &data, &w, Family::LogNormal, &opts).unwrap();

        // Assert
        assert_relative_eq!(via_objective, direct, epsilon = 1e-10);
        assert!(obj.check(&theta, &data).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `check` rejects non-finite θ, a mis-sized `W` and zero weights.
    fn objective_check_rejects_unusable_configurations() {
        let data = three_bins();
        let opts = GMMOptions::default();
        let w2 = WeightMatrix::identity(2);
        let obj = GMMObjective::new(Family::Gamma, &w2, &opts);
        let err: GMMError = obj.check(&array![0.0, 0.0], &data).unwrap_err().into();
        assert_eq!(err, GMMError::WeightMatrixShape { rows: 2, cols: 2, expected: 3 });

        let w3 = WeightMatrix::identity(3);
        let obj = GMMObjective::new(Family::Gamma, &w3, &opts);
        assert!(matches!(
            obj.check(&array![f64::NAN, 0.0], &data),
            Err(OptError::InvalidThetaInput { index: 0, .. })
        ));
        let zero = BinnedData::from_arrays(array![0.0, 1.0, 2.0, 3.0], array![0.0, 0.5, 0.5])
            .unwrap();
        let err: GMMError = obj.check(&array![0.0, 0.0], &zero).unwrap_err().into();
        assert_eq!(err, GMMError::Division { bin: 0 });
    }
}
