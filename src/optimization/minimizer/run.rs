//! Execution helpers that run an `argmin` solver on an objective and return a
//! crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        Grad, Objective, OptimOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
        traits::SolverKind,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, IterState, Solver, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an L-BFGS solve for an objective.
///
/// Wires up the problem via [`ArgMinAdapter`], the chosen solver, the
/// initial parameter `theta0`, optional observers (behind the `obs_slog`
/// feature) and `max_iters`, then converts the final state into
/// [`OptimOutcome`].
///
/// # Errors
/// - Propagates any `argmin` runtime error (solver errors, line-search
///   failures, objective errors) via `From<argmin::core::Error>`.
/// - Propagates validation errors raised when constructing [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &OptimOptions, problem: ArgMinAdapter<'a, F>, solver: S,
    kind: SolverKind,
) -> OptResult<OptimOutcome>
where
    F: Objective,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let outcome = OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
        kind,
    )?;
    log::debug!(
        "{kind} finished after {iterations} iterations: value = {:.6e}, status = {}",
        outcome.value,
        outcome.status
    );
    Ok(outcome)
}

/// Run the derivative-free Nelder–Mead solver for an objective.
///
/// Same wiring as [`run_lbfgs`]; the simplex is carried by the solver
/// itself, so `theta0` only seeds the reported state.
///
/// # Errors
/// - Propagates any `argmin` runtime error via `From<argmin::core::Error>`.
/// - Propagates validation errors raised when constructing [`OptimOutcome`].
pub fn run_nelder_mead<'a, F, S>(
    opts: &OptimOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: Objective,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, (), (), (), (), f64>> + Send + 'static,
{
    let mut optimizer = Executor::new(problem, solver);
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let outcome = OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
        SolverKind::NelderMead,
    )?;
    log::debug!(
        "Nelder-Mead finished after {iterations} iterations: value = {:.6e}, status = {}",
        outcome.value,
        outcome.status
    );
    Ok(outcome)
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: Objective,
{
    let c0 = problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: c(theta0) = {:.6e}{}",
        c0,
        g0n.map(|n| format!(", ||grad|| = {:.6e}", n)).unwrap_or_default()
    );
    Ok(())
}
