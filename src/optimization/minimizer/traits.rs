//! Public API surface for criterion minimization.
//!
//! - [`Objective`]: trait users implement for their criterion.
//! - [`OptimOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`SolverKind`]: which solver produced a result.
//! - [`OptimOutcome`]: normalized result returned by the high-level `minimize` API.
//!
//! Convention: the objective value *is* the cost handed to argmin. If an
//! analytic gradient is provided, it is the gradient of that same value.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{
            validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad,
            verify_tol_simplex,
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::{fmt, str::FromStr};

/// User-implemented objective interface.
///
/// The optimizer minimizes `c(θ)` over the unconstrained vector `θ`.
///
/// - `type Data`: per-problem data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `c(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇c(θ)`.
///   If not implemented, finite differences are used automatically.
pub trait Objective {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`). Unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver that produced an [`OptimOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Lbfgs(LineSearcher),
    NelderMead,
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Lbfgs(LineSearcher::MoreThuente) => write!(f, "L-BFGS (More-Thuente)"),
            SolverKind::Lbfgs(LineSearcher::HagerZhang) => write!(f, "L-BFGS (Hager-Zhang)"),
            SolverKind::NelderMead => write!(f, "Nelder-Mead"),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size (default 7).
/// - `nelder_mead_fallback: bool` — restart with Nelder–Mead when the L-BFGS
///   backend fails.
/// - `simplex_tol: f64` — standard-deviation tolerance of the simplex
///   vertices' costs that stops the fallback solver.
///
/// Default:
/// - `tols`: `tol_grad = 1e-7`, `tol_cost = 1e-12`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
/// - `nelder_mead_fallback`: `true`, `simplex_tol = 1e-10`
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub nelder_mead_fallback: bool,
    pub simplex_tol: f64,
}

/// Default stopping spread for the Nelder–Mead fallback.
pub const DEFAULT_SIMPLEX_TOL: f64 = 1e-10;

impl OptimOptions {
    /// Create a new set of optimizer options with the Nelder–Mead fallback
    /// enabled at [`DEFAULT_SIMPLEX_TOL`].
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self {
            tols,
            line_searcher,
            verbose,
            lbfgs_mem,
            nelder_mead_fallback: true,
            simplex_tol: DEFAULT_SIMPLEX_TOL,
        })
    }

    /// Configure the derivative-free fallback.
    ///
    /// # Errors
    /// - [`OptError::InvalidTolSimplex`] if `simplex_tol` is not finite and
    ///   strictly positive.
    pub fn with_fallback(mut self, enabled: bool, simplex_tol: f64) -> OptResult<Self> {
        verify_tol_simplex(simplex_tol)?;
        self.nelder_mead_fallback = enabled;
        self.simplex_tol = simplex_tol;
        Ok(self)
    }
}

impl Default for OptimOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-7), tol_cost: Some(1e-12), max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
            nelder_mead_fallback: true,
            simplex_tol: DEFAULT_SIMPLEX_TOL,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or
    ///   non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best objective value `c(θ̂)`.
/// - `converged`: `true` only if the solver met one of its convergence
///   criteria. Hitting the iteration cap, a timeout or an interrupt is
///   reported as `false`.
/// - `solver_exit`: `true` if the solver stopped itself without converging,
///   e.g. after a line-search breakdown on a flat or noisy surface.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`
///   (`cost_count`, `gradient_count`, ...).
/// - `grad_norm`: norm of the last available gradient, if present.
/// - `solver`: solver that produced this outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub solver_exit: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub solver: SolverKind,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>, solver: SolverKind,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, solver_exit, status) = classify_termination(&termination);
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            solver_exit,
            status,
            iterations,
            fn_evals,
            grad_norm,
            solver,
        })
    }
}

/// Map an argmin termination status onto `(converged, solver_exit, status)`.
fn classify_termination(termination: &TerminationStatus) -> (bool, bool, String) {
    match termination {
        TerminationStatus::NotTerminated => (false, false, "Not terminated".to_string()),
        TerminationStatus::Terminated(reason) => {
            let converged = matches!(
                reason,
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            );
            let solver_exit = matches!(reason, TerminationReason::SolverExit(_));
            (converged, solver_exit, format!("{reason:?}"))
        }
    }
}
