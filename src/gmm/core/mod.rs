//! core — binned data, distribution families, quadrature and options.
//!
//! Purpose
//! -------
//! Collect the building blocks of binned GMM estimation: validated data
//! containers, the two supported distribution families, the adaptive
//! quadrature primitive, parameter bounds, weighting matrices, option
//! structs, and the bracket-table reader. Higher-level moment and
//! estimation code in `gmm::models` builds on these primitives.
//!
//! Key behaviors
//! -------------
//! - Data contracts: [`BinEdges`], [`EmpiricalWeights`], [`BinnedData`]
//!   and the bracket-table front door [`BracketTable`].
//! - Distributions: [`Family`], [`DistributionSpec`] and the `statrs`-backed
//!   [`Density`], plus the free function [`density`].
//! - Numerics: adaptive double-exponential [`integrate`] and θ-space
//!   [`Bounds`].
//! - Configuration: [`Truncation`], [`QuadratureOptions`],
//!   [`MomentMethod`], [`MomentOptions`], [`ErrorForm`],
//!   [`WeightingOptions`] and [`GMMOptions`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every container and option type is validated at construction, so
//!   downstream code can rely on finite, well-ordered inputs.
//! - Bin indexing is 0-based: bin `i` spans `[edges[i], edges[i + 1]]`.
//!
//! Conventions
//! -----------
//! - This module performs no logging; failures are reported as
//!   `GMMResult`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule.

pub mod bins;
pub mod bounds;
pub mod family;
pub mod options;
pub mod quadrature;
pub mod table;
pub mod validation;
pub mod weight_matrix;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bins::{BinEdges, BinnedData, EmpiricalWeights};
pub use self::bounds::{Bounds, ParamBound};
pub use self::family::{Density, DistributionSpec, Family, density};
pub use self::options::{
    ErrorForm, GMMOptions, MomentMethod, MomentOptions, QuadratureOptions, Truncation,
    WeightingOptions,
};
pub use self::quadrature::{Integral, integrate};
pub use self::table::BracketTable;
pub use self::weight_matrix::{WeightMatrix, WeightingKind};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::bins::{BinEdges, BinnedData, EmpiricalWeights};
    pub use super::bounds::{Bounds, ParamBound};
    pub use super::family::{DistributionSpec, Family};
    pub use super::options::{
        ErrorForm, GMMOptions, MomentMethod, MomentOptions, QuadratureOptions, Truncation,
        WeightingOptions,
    };
    pub use super::table::BracketTable;
    pub use super::weight_matrix::{WeightMatrix, WeightingKind};
}
