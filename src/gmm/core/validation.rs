//! Validation helpers for binned GMM inputs.
//!
//! Purpose
//! -------
//! Centralize the scalar and vector checks shared by the data contracts,
//! distribution specs and option builders so every constructor reports the
//! same [`GMMError`] variants for the same failure.
//!
//! Key behaviors
//! -------------
//! - Bin edges: at least two, finite, first edge `>= 0`, strictly
//!   increasing.
//! - Empirical weights: finite and non-negative, one per bin.
//! - Distribution parameters: family-specific domains (lognormal `mu`
//!   finite and `sigma > 0`; gamma `alpha > 0` and `beta > 0`).
//! - Initial guesses: finite and of the family's parameter count.
//!
//! Conventions
//! -----------
//! - All helpers stop at the first offending element and report its
//!   0-based index.
//! - Helpers never panic; failures are returned as `GMMResult`.
use crate::gmm::{
    core::family::Family,
    errors::{GMMError, GMMResult},
};
use ndarray::Array1;

/// Validate a vector of bin edges.
///
/// # Errors
/// - `GMMError::TooFewEdges` if fewer than two edges are given.
/// - `GMMError::NonFiniteEdge` for NaN/±inf entries.
/// - `GMMError::NegativeFirstEdge` if `edges[0] < 0`.
/// - `GMMError::EdgesNotIncreasing` if `edges[i] <= edges[i - 1]`.
pub fn validate_edges(edges: &Array1<f64>) -> GMMResult<()> {
    if edges.len() < 2 {
        return Err(GMMError::TooFewEdges { len: edges.len() });
    }
    for (index, &value) in edges.iter().enumerate() {
        if !value.is_finite() {
            return Err(GMMError::NonFiniteEdge { index, value });
        }
    }
    if edges[0] < 0.0 {
        return Err(GMMError::NegativeFirstEdge { value: edges[0] });
    }
    for index in 1..edges.len() {
        let (previous, value) = (edges[index - 1], edges[index]);
        if value <= previous {
            return Err(GMMError::EdgesNotIncreasing { index, previous, value });
        }
    }
    Ok(())
}

/// Validate empirical weights.
///
/// # Errors
/// - `GMMError::NonFiniteWeight` / `GMMError::NegativeWeight` for the first
///   offending entry.
pub fn validate_weights(weights: &Array1<f64>) -> GMMResult<()> {
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() {
            return Err(GMMError::NonFiniteWeight { index, value });
        }
        if value < 0.0 {
            return Err(GMMError::NegativeWeight { index, value });
        }
    }
    Ok(())
}

/// Validate the two parameters of a distribution family.
///
/// # Errors
/// - `GMMError::Domain` naming the first parameter outside its domain.
pub fn validate_family_params(family: Family, p1: f64, p2: f64) -> GMMResult<()> {
    let [name1, name2] = family.param_names();
    match family {
        Family::LogNormal => {
            if !p1.is_finite() {
                return Err(GMMError::Domain { family, parameter: name1, value: p1 });
            }
            verify_positive(family, name2, p2)
        }
        Family::Gamma => {
            verify_positive(family, name1, p1)?;
            verify_positive(family, name2, p2)
        }
    }
}

/// Validate an initial guess in model space for `family`.
///
/// # Errors
/// - `GMMError::ParameterCountMismatch` if `initial.len() != 2`.
/// - `GMMError::NonFiniteInitial` for NaN/±inf entries.
pub fn validate_initial(initial: &Array1<f64>, family: Family) -> GMMResult<()> {
    let expected = family.param_names().len();
    if initial.len() != expected {
        return Err(GMMError::ParameterCountMismatch { expected, actual: initial.len() });
    }
    for (index, &value) in initial.iter().enumerate() {
        if !value.is_finite() {
            return Err(GMMError::NonFiniteInitial { index, value });
        }
    }
    Ok(())
}

/// Check that two moment vectors have equal length.
///
/// # Errors
/// - `GMMError::MomentLengthMismatch`.
pub fn validate_moment_lengths(expected: usize, actual: usize) -> GMMResult<()> {
    if expected != actual {
        return Err(GMMError::MomentLengthMismatch { expected, actual });
    }
    Ok(())
}

// ---- Helper methods ----

fn verify_positive(family: Family, parameter: &'static str, value: f64) -> GMMResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GMMError::Domain { family, parameter, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each failure mode of `validate_edges` and `validate_weights`.
    // - Family-specific parameter domains.
    // - Initial-guess length and finiteness checks.
    //
    // They intentionally DO NOT cover:
    // - How constructors compose these helpers (see `bins` and `family`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `validate_edges` accepts a zero first edge and rejects malformed
    // vectors with the matching variant.
    //
    // Given
    // -----
    // - Valid edges `[0, 50, 100]` and several broken variants.
    //
    // Expect
    // ------
    // - `Ok(())` for the valid vector; one specific error per broken case.
    fn validate_edges_reports_each_failure_mode() {
        // Arrange / Act / Assert
        assert!(validate_edges(&array![0.0, 50.0, 100.0]).is_ok());
        assert_eq!(validate_edges(&array![1.0]), Err(GMMError::TooFewEdges { len: 1 }));
        assert!(matches!(
            validate_edges(&array![0.0, f64::NAN]),
            Err(GMMError::NonFiniteEdge { index: 1, .. })
        ));
        assert_eq!(
            validate_edges(&array![-1.0, 2.0]),
            Err(GMMError::NegativeFirstEdge { value: -1.0 })
        );
        assert_eq!(
            validate_edges(&array![0.0, 5.0, 5.0]),
            Err(GMMError::EdgesNotIncreasing { index: 2, previous: 5.0, value: 5.0 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Weights must be finite and non-negative; zeros are allowed.
    fn validate_weights_allows_zero_and_rejects_negative() {
        assert!(validate_weights(&array![0.0, 0.4, 0.6]).is_ok());
        assert_eq!(
            validate_weights(&array![0.1, -0.2]),
            Err(GMMError::NegativeWeight { index: 1, value: -0.2 })
        );
        assert!(matches!(
            validate_weights(&array![f64::INFINITY]),
            Err(GMMError::NonFiniteWeight { index: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Family domains: lognormal allows any finite `mu`, gamma requires
    // both parameters positive.
    fn validate_family_params_enforces_domains() {
        assert!(validate_family_params(Family::LogNormal, -3.0, 0.5).is_ok());
        assert_eq!(
            validate_family_params(Family::LogNormal, 1.0, 0.0),
            Err(GMMError::Domain { family: Family::LogNormal, parameter: "sigma", value: 0.0 })
        );
        assert_eq!(
            validate_family_params(Family::Gamma, -1.0, 2.0),
            Err(GMMError::Domain { family: Family::Gamma, parameter: "alpha", value: -1.0 })
        );
        assert!(matches!(
            validate_family_params(Family::LogNormal, f64::NAN, 1.0),
            Err(GMMError::Domain { parameter: "mu", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Initial guesses must have two finite entries.
    fn validate_initial_checks_length_and_finiteness() {
        assert!(validate_initial(&array![3.0, 20.0], Family::Gamma).is_ok());
        assert_eq!(
            validate_initial(&array![3.0], Family::Gamma),
            Err(GMMError::ParameterCountMismatch { expected: 2, actual: 1 })
        );
        assert!(matches!(
            validate_initial(&array![3.0, f64::NAN], Family::Gamma),
            Err(GMMError::NonFiniteInitial { index: 1, .. })
        ));
    }
}
