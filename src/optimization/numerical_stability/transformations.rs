//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear transforms used to map
//! an unconstrained optimizer vector into box-constrained distribution
//! parameters. Each transform uses an explicit cutoff (`|x| > 20.0`) to
//! keep `f64` arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`BOUND_MARGIN`]: relative buffer kept between an initial guess and
//!   the edge of an open interval before inverting the transform.
//! - [`safe_softplus(x)`]: stable `ln(1 + exp(x))`, mapping ℝ → (0, ∞).
//! - [`safe_softplus_inv(x)`]: inverse of softplus on (0, ∞).
//! - [`safe_logistic(x)`]: stable `1 / (1 + exp(-x))`, mapping ℝ → (0, 1).
//! - [`safe_logit(p)`]: inverse of the logistic on (0, 1).

/// Relative buffer used when inverting an interval transform.
///
/// Inverting the logistic at exactly `0` or `1` would produce `∓∞`; a
/// starting value is nudged inside the interval by this fraction of its
/// width first.
pub const BOUND_MARGIN: f64 = 1e-12;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For `x > 20`, `softplus(x) ≈ x` to machine precision.
/// - Otherwise evaluates `ln1p(exp(x))`, which stays accurate for very
///   negative `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: returns `t = ln(exp(x) - 1)`.
///
/// - For `x > 20`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise uses `ln(expm1(x))`.
///
/// `x` must be finite and `> 0`; the result is `-∞` at `x = 0`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Evaluates the branch that never exponentiates a large positive number,
/// so the result is exact to rounding on both tails. Also the derivative
/// of [`safe_softplus`].
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of the logistic on `(0, 1)`: `logit(p) = ln(p / (1 - p))`.
///
/// Written as `ln(p) - ln1p(-p)` to keep precision when `p` is close to
/// `1`.
pub fn safe_logit(p: f64) -> f64 {
    p.ln() - (-p).ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the stable transforms with naïve formulas on safe grids.
    // - Inverse pairs (softplus/softplus_inv, logistic/logit).
    // - Tail behavior where the naïve formulas overflow.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Stable softplus agrees with the naïve formula where the latter is safe.
    //
    // Given
    // -----
    // - A grid of moderate inputs in [-10, 10].
    //
    // Expect
    // ------
    // - `safe_softplus(x) ≈ ln(1 + exp(x))`.
    fn safe_softplus_matches_naive_formula_on_moderate_grid() {
        for i in -20..=20 {
            let x = i as f64 * 0.5;
            let naive = (1.0 + x.exp()).ln();
            assert_relative_eq!(safe_softplus(x), naive, epsilon = 1e-12, max_relative = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Softplus and its inverse round-trip on positive values, including
    // values above the large-input cutoff.
    //
    // Expect
    // ------
    // - `safe_softplus(safe_softplus_inv(y)) ≈ y`.
    fn safe_softplus_inv_inverts_softplus() {
        for &y in &[1e-8, 1e-3, 0.5, 1.0, 7.5, 19.9, 25.0, 1e4] {
            let t = safe_softplus_inv(y);
            assert_relative_eq!(safe_softplus(t), y, max_relative = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // The logistic never overflows and stays inside [0, 1] on extreme tails.
    //
    // Expect
    // ------
    // - Values at ±800 are finite and saturate at 0 and 1.
    // - `σ(-x) = 1 - σ(x)` on a moderate grid.
    fn safe_logistic_is_bounded_and_symmetric() {
        assert_eq!(safe_logistic(800.0), 1.0);
        assert_eq!(safe_logistic(-800.0), 0.0);
        for i in -10..=10 {
            let x = i as f64 * 0.7;
            assert_relative_eq!(safe_logistic(-x), 1.0 - safe_logistic(x), epsilon = 1e-14);
        }
    }

    #[test]
    // Purpose
    // -------
    // Logit inverts the logistic on the open unit interval.
    fn safe_logit_inverts_logistic() {
        for &p in &[1e-9, 0.01, 0.25, 0.5, 0.9, 0.999_999] {
            assert_relative_eq!(safe_logistic(safe_logit(p)), p, max_relative = 1e-9);
        }
    }
}
