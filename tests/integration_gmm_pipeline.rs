//! Integration tests for binned GMM estimation.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from a bracket table, through
//!   identity-weighted and two-step fits, to fitted moments.
//! - Check the estimator against known answers: moments generated at known
//!   parameters are recovered, and the criterion falls from its starting
//!   value on a small hand-made dataset.
//!
//! Coverage
//! --------
//! - `gmm::core`:
//!   - `BracketTable` parsing, rescaling and conversion to `BinnedData`.
//!   - `GMMOptions` with adaptive and closed-form moments.
//! - `gmm::models`:
//!   - `fit`, `criterion`, `predict`, `estimate_weighting`.
//!   - `GMMEstimator::fit_identity` / `fit_two_step` and stage labeling.
//!
//! Exclusions
//! ----------
//! - Quadrature, bound transforms, pseudo-inverse and solver internals;
//!   these are covered by unit tests.
use approx::assert_relative_eq;
use binned_gmm::gmm::{
    BinEdges, BinnedData, BracketTable, DistributionSpec, EmpiricalWeights, ErrorForm, Family,
    FitStage, GMMError, GMMEstimator, GMMOptions, MomentMethod, MomentOptions, Truncation,
    WeightMatrix, WeightingKind, criterion, estimate_weighting, fit, predict,
};
use binned_gmm::optimization::minimizer::SolverKind;
use ndarray::{Array1, Array2, array};

/// Purpose
/// -------
/// A ten-bracket income table in thousands of dollars, in the
/// `(weight, upper_boundary)` row format, with comments and a blank line.
const INCOME_TABLE: &str = "\
# share  upper bound (k$)
0.04  10
0.06  15
0.07  20
0.08  25
0.08  30

0.15  40
0.18  60
0.17  100
0.09  150
0.08  350
";

/// Purpose
/// -------
/// Options using CDF differences for the moments; used where tests need
/// moments reproducible to machine precision.
fn closed_form_options() -> GMMOptions {
    GMMOptions {
        moments: MomentOptions::new(Truncation::default(), MomentMethod::ClosedForm),
        ..GMMOptions::default()
    }
}

/// Purpose
/// -------
/// Build `BinnedData` whose weights are exactly the model moments of
/// `spec` over `edges` under `options`.
fn generated_data(edges: &BinEdges, spec: &DistributionSpec, options: &GMMOptions) -> BinnedData {
    let moments = predict(edges, spec, &options.moments).expect("predict should succeed");
    let weights = EmpiricalWeights::new(moments).expect("model moments are valid weights");
    BinnedData::new(edges.clone(), weights).expect("edges and weights have matching lengths")
}

fn seven_bin_edges() -> BinEdges {
    BinEdges::new(array![0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 150.0, 350.0])
        .expect("strictly increasing edges")
}

#[test]
// Purpose
// -------
// Run the full session on a parsed bracket table for both families.
//
// Given
// -----
// - The ten-bracket table, the two top brackets rescaled by 10 and 20
//   (merged brackets), lower edge 0, default options (adaptive quadrature,
//   relative errors).
// - Starts `(ln 40, 0.8)` for lognormal and `(2, 20)` for gamma.
//
// Expect
// ------
// - Both stages return parameters inside the family domain.
// - The weighting estimate is computed from the unrescaled weights and
//   has one residual per bin.
// - Fitted moments have one finite, non-negative entry per bin.
fn bracket_table_two_step_pipeline_for_both_families() {
    // Arrange
    let mut table: BracketTable = INCOME_TABLE.parse().expect("table should parse");
    assert_eq!(table.len(), 10);
    table.rescale(8, 10.0).expect("valid rescale");
    table.rescale(9, 20.0).expect("valid rescale");
    let starts = [
        (Family::LogNormal, array![40f64.ln(), 0.8]),
        (Family::Gamma, array![2.0, 20.0]),
    ];

    for (family, start) in starts {
        let session = GMMEstimator::from_table(family, &table, 0.0, GMMOptions::default())
            .expect("session should build");

        // Act
        let out = session.fit_two_step(&start).expect("two-step fit should succeed");

        // Assert
        for res in [&out.identity, &out.two_step] {
            let (p1, p2) = res.spec.params();
            assert!(p1.is_finite() && p2 > 0.0, "{family}: {}", res.spec);
            assert!(res.criterion.is_finite() && res.criterion >= 0.0);
            assert_eq!(res.spec.family(), family);
        }
        assert_eq!(out.identity.weighting, WeightingKind::Identity);
        assert_eq!(out.weighting.residuals.len(), 10);
        assert!(out.weighting.weight.matrix().iter().all(|v| v.is_finite()));

        let raw = session.raw_weights().as_array();
        assert_relative_eq!(raw[9], 0.08, epsilon = 1e-15);
        assert_relative_eq!(session.data().weights().as_array()[9], 0.004, epsilon = 1e-15);

        let fitted = out
            .two_step
            .fitted_moments(session.data().edges(), &session.options().moments)
            .expect("fitted moments");
        assert_eq!(fitted.len(), 10);
        assert!(fitted.iter().all(|m| m.is_finite() && *m >= 0.0));
    }
}

#[test]
// Purpose
// -------
// The identity-weighted fit lowers the criterion on the three-bin example.
//
// Given
// -----
// - Edges `[0, 50, 100, 350]`, weights `[0.5, 0.3, 0.2]`, lognormal,
//   `W = I`, default options, start `(ln 60, 0.5)`.
//
// Expect
// ------
// - The fitted criterion is strictly below the criterion at the start.
// - The fitted median lies inside the first two bins.
fn three_bin_lognormal_fit_lowers_criterion() {
    // Arrange
    let data = BinnedData::from_arrays(array![0.0, 50.0, 100.0, 350.0], array![0.5, 0.3, 0.2])
        .expect("valid data");
    let w = WeightMatrix::identity(3);
    let opts = GMMOptions::default();
    let start = array![60f64.ln(), 0.5];
    let at_start = criterion(&start, &data, &w, Family::LogNormal, &opts).expect("criterion");

    // Act
    let res = fit(&start, &data, &w, Family::LogNormal, &opts).expect("fit should succeed");

    // Assert
    assert!(res.criterion < at_start, "{} !< {at_start}", res.criterion);
    let (mu, sigma) = res.spec.params();
    assert!(sigma > 0.0);
    assert!(mu.exp() > 20.0 && mu.exp() < 100.0, "median = {}", mu.exp());
}

#[test]
// Purpose
// -------
// A far-off start on a flat part of the surface still ends in a usable
// fit: when the L-BFGS line search gives up, Nelder–Mead takes over.
//
// Given
// -----
// - The three-bin example with `W = I`, default options and the start
//   `(ln 69677, 50)`, where the criterion is nearly flat.
//
// Expect
// ------
// - The fit does not end as a stalled L-BFGS run: either L-BFGS converged
//   or the solver is Nelder–Mead.
// - The criterion drops by at least an order of magnitude.
fn far_start_recovers_through_nelder_mead_fallback() {
    // Arrange
    let data = BinnedData::from_arrays(array![0.0, 50.0, 100.0, 350.0], array![0.5, 0.3, 0.2])
        .expect("valid data");
    let w = WeightMatrix::identity(3);
    let opts = GMMOptions::default();
    let start = array![69677f64.ln(), 50.0];
    let at_start = criterion(&start, &data, &w, Family::LogNormal, &opts).expect("criterion");

    // Act
    let res = fit(&start, &data, &w, Family::LogNormal, &opts).expect("fit should succeed");

    // Assert
    assert!(
        res.converged || res.solver == SolverKind::NelderMead,
        "stalled: {} via {}",
        res.status,
        res.solver
    );
    assert!(res.criterion < 0.1 * at_start, "{} vs start {at_start}", res.criterion);
    assert!(res.spec.params().1 > 0.0);
}

#[test]
// Purpose
// -------
// Parameters are recovered from moments generated at known values.
//
// Given
// -----
// - Seven bins, closed-form moments, `W = I`.
// - Lognormal `(ln 60, 0.5)` from `(ln 45, 0.8)` and gamma `(3, 20)` from
//   `(2, 30)`.
//
// Expect
// ------
// - Each recovered parameter within 2% of the truth.
fn fit_recovers_known_parameters_for_both_families() {
    let opts = closed_form_options();
    let cases = [
        (DistributionSpec::lognormal(60f64.ln(), 0.5).expect("spec"), array![45f64.ln(), 0.8]),
        (DistributionSpec::gamma(3.0, 20.0).expect("spec"), array![2.0, 30.0]),
    ];

    for (truth, start) in cases {
        // Arrange
        let data = generated_data(&seven_bin_edges(), &truth, &opts);
        let w = WeightMatrix::identity(7);

        // Act
        let res = fit(&start, &data, &w, truth.family(), &opts).expect("fit should succeed");

        // Assert
        let (p1, p2) = res.spec.params();
        let (t1, t2) = truth.params();
        assert_relative_eq!(p1, t1, max_relative = 2e-2);
        assert_relative_eq!(p2, t2, max_relative = 2e-2);
    }
}

#[test]
// Purpose
// -------
// Recovery also holds on the default path, where moments come from
// adaptive quadrature of the density rather than CDF differences.
//
// Given
// -----
// - Seven bins, default options (adaptive moments, relative errors),
//   `W = I`.
// - Lognormal `(ln 60, 0.5)` from `(ln 45, 0.8)` and gamma `(3, 20)` from
//   `(2, 30)`.
//
// Expect
// ------
// - Each recovered parameter within 2% of the truth.
fn adaptive_moments_recover_known_parameters() {
    let opts = GMMOptions::default();
    assert!(matches!(opts.moments.method, MomentMethod::Adaptive(_)));
    let cases = [
        (DistributionSpec::lognormal(60f64.ln(), 0.5).expect("spec"), array![45f64.ln(), 0.8]),
        (DistributionSpec::gamma(3.0, 20.0).expect("spec"), array![2.0, 30.0]),
    ];

    for (truth, start) in cases {
        // Arrange
        let data = generated_data(&seven_bin_edges(), &truth, &opts);
        let w = WeightMatrix::identity(7);

        // Act
        let res = fit(&start, &data, &w, truth.family(), &opts).expect("fit should succeed");

        // Assert
        let (p1, p2) = res.spec.params();
        let (t1, t2) = truth.params();
        assert_relative_eq!(p1, t1, max_relative = 2e-2);
        assert_relative_eq!(p2, t2, max_relative = 2e-2);
    }
}

#[test]
// Purpose
// -------
// Zero residuals give a finite identity weighting instead of a blow-up.
//
// Given
// -----
// - Weights generated by `predict` at gamma `(2.5, 25)` (adaptive
//   quadrature) and the weighting estimated at the same parameters.
//
// Expect
// ------
// - Identity matrix, degenerate flag set, all entries finite.
fn weighting_from_zero_residuals_is_identity() {
    // Arrange
    let opts = GMMOptions::default();
    let spec = DistributionSpec::gamma(2.5, 25.0).expect("spec");
    let data = generated_data(&seven_bin_edges(), &spec, &opts);

    // Act
    let est = estimate_weighting(&spec, data.edges(), data.weights(), &opts)
        .expect("weighting should succeed");

    // Assert
    assert!(est.is_degenerate());
    assert_eq!(est.weight.kind(), WeightingKind::Identity);
    assert_eq!(est.weight.matrix(), &Array2::<f64>::eye(7));
    assert!(est.residuals.iter().all(|e| e.abs() < 1e-12));
}

#[test]
// Purpose
// -------
// Shrinking residuals move the weighting continuously toward the identity;
// no residual size in between produces a blow-up.
//
// Given
// -----
// - Weights generated by `predict` at gamma `(2.5, 25 + d)` for
//   `d = 1e-3, 1e-5, 1e-6` (adaptive quadrature, relative errors).
// - The weighting estimated at gamma `(2.5, 25)` with default options.
//
// Expect
// ------
// - Every entry of `Ŵ` finite and within `[-1, 1]`; `cond(Ω)` within the
//   default cap.
// - `‖Ŵ - I‖_F` non-increasing as `d` shrinks, and below `0.1` at
//   `d = 1e-6`.
fn weighting_from_small_residuals_is_bounded_and_near_identity() {
    // Arrange
    let opts = GMMOptions::default();
    let first_stage = DistributionSpec::gamma(2.5, 25.0).expect("spec");
    let eye = Array2::<f64>::eye(7);
    let mut distances = Vec::new();

    for shift in [1e-3, 1e-5, 1e-6] {
        let truth = DistributionSpec::gamma(2.5, 25.0 + shift).expect("spec");
        let data = generated_data(&seven_bin_edges(), &truth, &opts);

        // Act
        let est = estimate_weighting(&first_stage, data.edges(), data.weights(), &opts)
            .expect("weighting should succeed");

        // Assert
        let w = est.weight.matrix();
        assert!(
            w.iter().all(|v| v.is_finite() && v.abs() <= 1.0 + 1e-9),
            "shift {shift}: {w}"
        );
        assert!(est.condition <= opts.weighting.max_condition * (1.0 + 1e-9));
        distances.push((w - &eye).mapv(|v| v * v).sum().sqrt());
    }

    assert!(
        distances[1] <= distances[0] + 1e-9 && distances[2] <= distances[1] + 1e-9,
        "distances {distances:?}"
    );
    assert!(distances[2] < 0.1, "distances {distances:?}");
}

#[test]
// Purpose
// -------
// A zero weight breaks the relative form only, and the session names the
// failing stage.
//
// Given
// -----
// - Weights `[0.5, 0, 0.5]` on three bins.
//
// Expect
// ------
// - Relative form: `Stage { Identity, Division { bin: 1 } }`.
// - Absolute form: the fit succeeds.
fn zero_weight_is_rejected_only_under_relative_errors() {
    let data = BinnedData::from_arrays(array![0.0, 50.0, 100.0, 350.0], array![0.5, 0.0, 0.5])
        .expect("valid data");
    let start: Array1<f64> = array![60f64.ln(), 0.5];

    let relative = GMMEstimator::new(Family::LogNormal, data.clone(), GMMOptions::default())
        .expect("session");
    match relative.fit_identity(&start) {
        Err(GMMError::Stage { stage: FitStage::Identity, source }) => {
            assert_eq!(*source, GMMError::Division { bin: 1 });
        }
        other => panic!("Expected identity-stage Division, got {other:?}"),
    }

    let absolute_opts = GMMOptions { error_form: ErrorForm::Absolute, ..GMMOptions::default() };
    let absolute = GMMEstimator::new(Family::LogNormal, data, absolute_opts).expect("session");
    assert!(absolute.fit_identity(&start).is_ok());
}
