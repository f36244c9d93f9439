//! Binned data containers for GMM estimation.
//!
//! Purpose
//! -------
//! Provide small, validated containers for histogram-style income data: the
//! bracket boundaries ([`BinEdges`]), the share of the population in each
//! bracket ([`EmpiricalWeights`]), and the pair of both ([`BinnedData`]).
//!
//! Key behaviors
//! -------------
//! - [`BinEdges`] enforces `N + 1 >= 2` finite, strictly increasing edges
//!   with a non-negative first edge.
//! - [`EmpiricalWeights`] enforces finite, non-negative shares.
//! - [`BinnedData`] enforces one weight per bin.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bin `i` covers `[edges[i], edges[i + 1]]`.
//! - Weights are consumed as given: merged-bracket rescaling happens
//!   upstream (see `gmm::core::table`), never here.
//! - Weights need not sum to one.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction success, length mismatches, and the
//!   bin accessors. Element-level failures are covered in `validation`.
use crate::gmm::{
    core::validation::{validate_edges, validate_weights},
    errors::{GMMError, GMMResult},
};
use ndarray::Array1;

/// `BinEdges` — validated, strictly increasing bracket boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Array1<f64>,
}

impl BinEdges {
    /// Validate and wrap a vector of `N + 1` edges.
    ///
    /// # Errors
    /// - See [`validate_edges`].
    pub fn new(edges: Array1<f64>) -> GMMResult<Self> {
        validate_edges(&edges)?;
        Ok(BinEdges { edges })
    }

    /// Number of bins `N`.
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.edges
    }

    /// `(lower, upper)` edges of bin `i`.
    ///
    /// Panics if `i >= n_bins()`.
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        (self.edges[i], self.edges[i + 1])
    }

    /// Iterate over `(lower, upper)` pairs in bin order.
    pub fn iter_bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.edges.windows(2).into_iter().map(|w| (w[0], w[1]))
    }

    pub fn first(&self) -> f64 {
        self.edges[0]
    }

    pub fn last(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }
}

/// `EmpiricalWeights` — finite, non-negative bracket shares.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalWeights {
    weights: Array1<f64>,
}

impl EmpiricalWeights {
    /// # Errors
    /// - See [`validate_weights`].
    pub fn new(weights: Array1<f64>) -> GMMResult<Self> {
        validate_weights(&weights)?;
        Ok(EmpiricalWeights { weights })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn sum(&self) -> f64 {
        self.weights.sum()
    }
}

/// `BinnedData` — bin edges together with one empirical weight per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedData {
    edges: BinEdges,
    weights: EmpiricalWeights,
}

impl BinnedData {
    /// Pair validated edges and weights.
    ///
    /// # Errors
    /// - `GMMError::WeightLengthMismatch` if `weights.len() != edges.n_bins()`.
    pub fn new(edges: BinEdges, weights: EmpiricalWeights) -> GMMResult<Self> {
        if weights.len() != edges.n_bins() {
            return Err(GMMError::WeightLengthMismatch {
                bins: edges.n_bins(),
                weights: weights.len(),
            });
        }
        Ok(BinnedData { edges, weights })
    }

    /// Validate raw arrays and pair them.
    ///
    /// # Errors
    /// - Any edge, weight or length error.
    pub fn from_arrays(edges: Array1<f64>, weights: Array1<f64>) -> GMMResult<Self> {
        Self::new(BinEdges::new(edges)?, EmpiricalWeights::new(weights)?)
    }

    pub fn edges(&self) -> &BinEdges {
        &self.edges
    }

    pub fn weights(&self) -> &EmpiricalWeights {
        &self.weights
    }

    pub fn n_bins(&self) -> usize {
        self.edges.n_bins()
    }
}
