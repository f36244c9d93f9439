//! Adapter that exposes a user `Objective` as an `argmin` problem.
//!
//! The objective value is passed straight through as argmin's cost. Analytic
//! gradients (if provided) are validated and used as-is; otherwise the cost
//! closure is finite-differenced.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    minimizer::{
        finite_diff::fd_gradient,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a user `Objective` to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: Objective> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `c(θ)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the user’s `value`.
    /// - `NonFiniteCost` if the value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at `θ`.
    ///
    /// - If the user implements `grad(θ, data)`, it is validated and returned.
    /// - Otherwise a finite-difference gradient of the cost is computed,
    ///   central first with a forward fallback (see [`fd_gradient`]).
    ///
    /// The FD closure must return `f64`, so the first error raised by `cost`
    /// is captured in `closure_err` and the closure returns `NaN`.
    ///
    /// # Errors
    /// - Propagates user errors from `grad` (other than
    ///   `GradientNotImplemented`).
    /// - Propagates errors raised by cost evaluations during FD.
    /// - Returns validation errors for wrong-length or non-finite gradients.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                Ok(fd_gradient(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a, F: Objective> ArgMinAdapter<'a, F> {
    /// Construct a new adapter over a user `Objective` and its data.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Pass-through of the objective value as the argmin cost.
    // - Use of analytic gradients when provided, FD otherwise.
    // - Recovery of the original `OptError` from argmin's error type.
    // -------------------------------------------------------------------------

    struct Bowl {
        analytic: bool,
    }

    impl Objective for Bowl {
        type Data = f64;

        fn value(&self, theta: &Theta, shift: &f64) -> OptResult<Cost> {
            if theta[0] > 100.0 {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(theta.mapv(|t| (t - shift).powi(2)).sum())
        }

        fn check(&self, _theta: &Theta, _shift: &f64) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, shift: &f64) -> OptResult<Grad> {
            if self.analytic {
                Ok(theta.mapv(|t| 2.0 * (t - shift)))
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter reports the objective value unchanged.
    fn cost_is_objective_value_without_sign_flip() {
        // Arrange
        let bowl = Bowl { analytic: false };
        let adapter = ArgMinAdapter::new(&bowl, &1.0);

        // Act
        let cost = adapter.cost(&array![3.0, 1.0]).unwrap();

        // Assert
        assert_relative_eq!(cost, 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Analytic and finite-difference gradients agree on a smooth bowl.
    fn analytic_and_fd_gradients_agree() {
        // Arrange
        let theta = array![0.25, -2.0];
        let exact = Bowl { analytic: true };
        let numeric = Bowl { analytic: false };

        // Act
        let g_exact = ArgMinAdapter::new(&exact, &1.0).gradient(&theta).unwrap();
        let g_fd = ArgMinAdapter::new(&numeric, &1.0).gradient(&theta).unwrap();

        // Assert
        for i in 0..2 {
            assert_relative_eq!(g_exact[i], g_fd[i], epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // An error raised inside `value` travels through argmin's error type and
    // is recovered as the original `OptError`.
    fn objective_errors_are_recovered_after_argmin_boxing() {
        // Arrange
        let bowl = Bowl { analytic: false };
        let adapter = ArgMinAdapter::new(&bowl, &0.0);

        // Act
        let err: OptError = adapter.cost(&array![150.0]).unwrap_err().into();

        // Assert
        assert_eq!(err, OptError::InvalidThetaInput { index: 0, value: 150.0 });
    }
}
