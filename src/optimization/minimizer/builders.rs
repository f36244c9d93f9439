//! minimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the solvers used by the criterion
//! minimizer. These helpers hide Argmin’s generic wiring and apply
//! crate-level options (tolerances, memory size, simplex spread) so that
//! higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente
//!   line search.
//! - Apply optional gradient and cost-change tolerances from
//!   [`OptimOptions`] via [`configure_lbfgs`].
//! - Construct the Nelder–Mead fallback with an initial simplex built
//!   around the starting point.
//!
//! Conventions
//! -----------
//! - The builders do **not** set `max_iters`; it is applied by the runner.
//! - Invalid tolerances rejected by Argmin surface as [`OptError`] via the
//!   crate’s `From<Error>` implementation.
//!
//! Testing notes
//! -------------
//! - Unit tests verify that each builder accepts valid options and that the
//!   initial simplex has the expected geometry.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    minimizer::{
        traits::OptimOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_STEP, Grad, HagerZhangLS, LbfgsHagerZhang,
            LbfgsMoreThuente, MoreThuenteLS, NelderMeadSolver, Theta,
        },
    },
};

/// Perturbation used for a zero coordinate when building the simplex.
const ZERO_SIMPLEX_STEP: f64 = 0.00025;

/// Build an [`LbfgsHagerZhang`] solver with the configured memory and
/// tolerances.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
///   tolerance.
pub fn build_optimizer_hager_zhang(opts: &OptimOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Build an [`LbfgsMoreThuente`] solver with the configured memory and
/// tolerances.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
///   tolerance.
pub fn build_optimizer_more_thuente(opts: &OptimOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// configure_lbfgs — apply optional tolerances to an L-BFGS solver.
///
/// When a tolerance is `None`, the corresponding `with_tolerance_*` method
/// is not called and Argmin’s default remains in effect.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when a tolerance is
///   rejected.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &OptimOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// build_nelder_mead — derivative-free fallback solver.
///
/// The initial simplex holds `theta0` plus one vertex per coordinate, where
/// coordinate `i` is scaled by `1 + DEFAULT_SIMPLEX_STEP` (or set to a small
/// absolute step when it is exactly zero). The solver stops once the
/// standard deviation of the vertex costs falls below `opts.simplex_tol`.
///
/// # Errors
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects the
///   tolerance.
pub fn build_nelder_mead(theta0: &Theta, opts: &OptimOptions) -> OptResult<NelderMeadSolver> {
    let solver = NelderMeadSolver::new(initial_simplex(theta0));
    Ok(solver.with_sd_tolerance(opts.simplex_tol)?)
}

fn initial_simplex(theta0: &Theta) -> Vec<Theta> {
    let mut simplex = vec![theta0.clone(); theta0.len() + 1];
    for (i, vertex) in simplex.iter_mut().skip(1).enumerate() {
        vertex[i] = if vertex[i] != 0.0 {
            (1.0 + DEFAULT_SIMPLEX_STEP) * vertex[i]
        } else {
            ZERO_SIMPLEX_STEP
        };
    }
    simplex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::traits::{LineSearcher, OptimOptions, Tolerances};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction of L-BFGS solvers with both line searches.
    // - Application of gradient and cost tolerances via `configure_lbfgs`.
    // - Geometry of the Nelder–Mead initial simplex.
    //
    // They intentionally DO NOT cover:
    // - End-to-end executor behavior (tested in the runner layer).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both L-BFGS builders succeed with default and explicit memory.
    //
    // Given
    // -----
    // - Valid `Tolerances`.
    // - `lbfgs_mem = None` and `lbfgs_mem = Some(11)`.
    //
    // Expect
    // ------
    // - All builders return `Ok(_)`.
    fn lbfgs_builders_accept_default_and_explicit_memory() {
        // Arrange
        let tols =
            Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).expect("Tolerances should be valid");
        let default_mem = OptimOptions::new(tols, LineSearcher::HagerZhang, false, None)
            .expect("OptimOptions should be valid");
        let explicit_mem = OptimOptions::new(tols, LineSearcher::MoreThuente, false, Some(11))
            .expect("OptimOptions should be valid");

        // Act / Assert
        assert!(build_optimizer_hager_zhang(&default_mem).is_ok());
        assert!(build_optimizer_hager_zhang(&explicit_mem).is_ok());
        assert!(build_optimizer_more_thuente(&default_mem).is_ok());
        assert!(build_optimizer_more_thuente(&explicit_mem).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` succeeds with absent tolerances, relying on Argmin
    // defaults.
    fn configure_lbfgs_respects_absent_tolerances() {
        // Arrange
        let raw = LBFGS::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM);
        let tols = Tolerances::new(None, None, Some(50)).expect("Tolerances should be valid");
        let opts = OptimOptions::new(tols, LineSearcher::MoreThuente, false, None)
            .expect("OptimOptions should be valid");

        // Act
        let configured = configure_lbfgs(raw, &opts);

        // Assert
        assert!(configured.is_ok(), "configure_lbfgs should succeed when both tolerances are None");
    }

    #[test]
    // Purpose
    // -------
    // The initial simplex has `d + 1` vertices, each perturbing one
    // coordinate of the start.
    //
    // Given
    // -----
    // - `θ₀ = (2.0, 0.0)`.
    //
    // Expect
    // ------
    // - Vertices `(2, 0)`, `(2.1, 0)`, `(2, 0.00025)`.
    fn initial_simplex_perturbs_one_coordinate_per_vertex() {
        // Arrange
        let theta0 = array![2.0, 0.0];

        // Act
        let simplex = initial_simplex(&theta0);

        // Assert
        assert_eq!(simplex.len(), 3);
        assert_eq!(simplex[0], theta0);
        assert!((simplex[1][0] - 2.1).abs() < 1e-12);
        assert_eq!(simplex[1][1], 0.0);
        assert_eq!(simplex[2][0], 2.0);
        assert_eq!(simplex[2][1], ZERO_SIMPLEX_STEP);
    }

    #[test]
    // Purpose
    // -------
    // The Nelder–Mead builder accepts the default options.
    fn build_nelder_mead_accepts_default_options() {
        let opts = OptimOptions::default();
        assert!(build_nelder_mead(&array![0.1, 0.2], &opts).is_ok());
    }
}
