//! binned_gmm — GMM estimation of income distributions from binned data.
//!
//! Purpose
//! -------
//! Serve as the crate root for estimating lognormal and gamma income
//! distributions from bracketed income shares. The estimator matches the
//! probability mass each bin receives under a candidate distribution to the
//! observed bin weights by the generalized method of moments, first with the
//! identity weighting matrix and then with the two-step estimate.
//!
//! Key behaviors
//! -------------
//! - `gmm`: data containers, distribution families, quadrature, the GMM
//!   criterion, the two-step weighting estimator and the estimation session.
//! - `optimization`: an argmin-backed L-BFGS minimizer with finite-difference
//!   gradients and a Nelder–Mead fallback, plus θ-space transforms.
//! - `inference`: moment covariance and the SVD pseudo-inverse used for the
//!   second-stage weighting matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - All computation is single-threaded, synchronous and deterministic for
//!   fixed inputs; no module holds mutable global state.
//! - Every public entry point validates its inputs and reports failures as a
//!   layer-specific error (`GMMError`, `OptError`, `InferenceError`) rather
//!   than panicking.
//!
//! Conventions
//! -----------
//! - Incomes are in the units of the input table (e.g. thousands of
//!   dollars); truncation bounds are expressed in the same units.
//! - Diagnostics go through the `log` facade; the caller chooses the logger.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use binned_gmm::gmm::prelude::*;
//! use ndarray::array;
//!
//! let table: BracketTable = "0.5 50\n0.3 100\n0.2 350".parse()?;
//! let session = GMMEstimator::from_table(Family::LogNormal, &table, 0.0, GMMOptions::default())?;
//! let out = session.fit_two_step(&array![60f64.ln(), 0.5])?;
//! println!("identity: {}, two-step: {}", out.identity.spec, out.two_step.spec);
//! # Ok::<(), binned_gmm::gmm::GMMError>(())
//! ```
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; the end-to-end pipeline is covered
//!   by `tests/integration_gmm_pipeline.rs`.

pub mod gmm;
pub mod inference;
pub mod optimization;
