//! High-level entry point for minimizing a user-provided `Objective`.
//!
//! This selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the objective in an `ArgMinAdapter`, and delegates the run
//! to `run_lbfgs`. When the L-BFGS backend breaks down, or its line search
//! gives up before convergence, and the fallback is enabled, the solve
//! restarts from the initial guess with Nelder–Mead.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, run_nelder_mead},
        traits::{LineSearcher, Objective, OptimOptions, SolverKind},
    },
};

/// Minimize an objective `c(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Builds an L-BFGS solver with either **Hager–Zhang** or **More–Thuente**
///   line search based on `opts.line_searcher` and runs it.
/// - If that run fails inside the argmin backend (see
///   [`OptError::is_backend_failure`](crate::optimization::errors::OptError::is_backend_failure))
///   and `opts.nelder_mead_fallback` is set, logs a warning and runs
///   Nelder–Mead from `theta0` instead.
/// - argmin reports a line-search breakdown inside L-BFGS as a normal
///   termination (`SolverExit`), not as an error. Such an outcome
///   (`solver_exit && !converged`) triggers the same restart.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_*`.
/// - Propagates runtime errors from the solver that ran last.
///
/// # Example
/// ```no_run
/// use ndarray::{Array1, array};
/// use binned_gmm::optimization::errors::OptResult;
/// use binned_gmm::optimization::minimizer::{minimize, Objective, OptimOptions};
///
/// struct Bowl;
/// impl Objective for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Array1<f64>, _: &()) -> OptResult<f64> {
///         Ok(theta.dot(theta))
///     }
///     fn check(&self, _: &Array1<f64>, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2, 0.3], &(), &OptimOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), binned_gmm::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: Objective>(
    f: &F, theta0: Theta, data: &F::Data, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    let kind = SolverKind::Lbfgs(opts.line_searcher);
    let lbfgs = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0.clone(), opts, problem, solver, kind)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0.clone(), opts, problem, solver, kind)
        }
    };
    match lbfgs {
        Err(err) if opts.nelder_mead_fallback && err.is_backend_failure() => {
            log::warn!("{kind} failed ({err}); restarting from the initial guess with Nelder-Mead");
            restart_with_nelder_mead(f, &theta0, data, opts)
        }
        Ok(out) if opts.nelder_mead_fallback && out.solver_exit && !out.converged => {
            log::warn!(
                "{kind} stopped after {} iterations ({}); restarting from the initial guess \
                 with Nelder-Mead",
                out.iterations,
                out.status
            );
            restart_with_nelder_mead(f, &theta0, data, opts)
        }
        other => other,
    }
}

fn restart_with_nelder_mead<F: Objective>(
    f: &F, theta0: &Theta, data: &F::Data, opts: &OptimOptions,
) -> OptResult<OptimOutcome> {
    let solver = build_nelder_mead(theta0, opts)?;
    run_nelder_mead(opts, ArgMinAdapter::new(f, data), solver)
}
