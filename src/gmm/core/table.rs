//! Bracket tables: `(weight, upper_boundary)` rows as delivered by surveys.
//!
//! Purpose
//! -------
//! Turn a two-column bracket table into [`BinnedData`]. Rows hold the share
//! of the population in a bracket and the bracket's upper boundary, ordered
//! by boundary. The bin edges are the chosen lower edge followed by the
//! boundaries.
//!
//! Key behaviors
//! -------------
//! - [`BracketTable::parse`] reads any `BufRead`; fields are separated by
//!   whitespace or commas, blank lines and `#` comments are skipped.
//! - [`BracketTable::rescale`] divides the weight of one bracket, e.g. to
//!   express a merged top bracket on the width of the regular brackets.
//! - The unadjusted weights stay available through
//!   [`BracketTable::raw_weights`] for the two-step weighting estimator.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parsing only checks syntax; edge monotonicity and weight signs are
//!   validated when building [`BinnedData`].
//! - Line numbers in errors are 1-based, matching editors.
use crate::gmm::{
    core::bins::{BinnedData, EmpiricalWeights},
    errors::{GMMError, GMMResult},
};
use ndarray::Array1;
use std::{io::BufRead, str::FromStr};

#[derive(Debug, Clone, PartialEq)]
pub struct BracketTable {
    boundaries: Vec<f64>,
    weights: Vec<f64>,
    raw_weights: Vec<f64>,
}

impl BracketTable {
    /// Build a table from parallel columns.
    ///
    /// # Errors
    /// - `GMMError::EmptyTable` for zero rows.
    /// - `GMMError::WeightLengthMismatch` if the columns differ in length.
    pub fn new(weights: Vec<f64>, boundaries: Vec<f64>) -> GMMResult<Self> {
        if weights.is_empty() {
            return Err(GMMError::EmptyTable);
        }
        if weights.len() != boundaries.len() {
            return Err(GMMError::WeightLengthMismatch {
                bins: boundaries.len(),
                weights: weights.len(),
            });
        }
        Ok(BracketTable { boundaries, raw_weights: weights.clone(), weights })
    }

    /// Parse `(weight, upper_boundary)` rows.
    ///
    /// # Errors
    /// - `GMMError::TableIo` if reading fails.
    /// - `GMMError::TableParse` for a row without exactly two numeric fields.
    /// - `GMMError::EmptyTable` if no data rows are found.
    pub fn parse<R: BufRead>(reader: R) -> GMMResult<Self> {
        let mut weights = Vec::new();
        let mut boundaries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| GMMError::TableIo { reason: e.to_string() })?;
            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let fields: Vec<&str> = content
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .collect();
            if fields.len() != 2 {
                return Err(GMMError::TableParse {
                    line: idx + 1,
                    reason: format!("expected 2 fields, found {}", fields.len()),
                });
            }
            weights.push(parse_field(fields[0], idx + 1)?);
            boundaries.push(parse_field(fields[1], idx + 1)?);
        }
        Self::new(weights, boundaries)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Current (possibly rescaled) weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Divide the weight of bracket `index` by `divisor`.
    ///
    /// Rescaling is applied to the current weight, so repeated calls
    /// compound; the raw weights are untouched.
    ///
    /// # Errors
    /// - `GMMError::InvalidRescale` for an out-of-range index or a divisor
    ///   that is not finite and positive.
    pub fn rescale(&mut self, index: usize, divisor: f64) -> GMMResult<()> {
        if index >= self.weights.len() {
            return Err(GMMError::InvalidRescale { index, divisor, reason: "index out of range" });
        }
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(GMMError::InvalidRescale {
                index,
                divisor,
                reason: "divisor must be finite and > 0",
            });
        }
        self.weights[index] /= divisor;
        Ok(())
    }

    /// Unadjusted weights as read, for the two-step weighting estimator.
    ///
    /// # Errors
    /// - Weight validation errors (negative or non-finite entries).
    pub fn raw_weights(&self) -> GMMResult<EmpiricalWeights> {
        EmpiricalWeights::new(Array1::from_vec(self.raw_weights.clone()))
    }

    /// Build validated [`BinnedData`] with edges `[lower_edge, b_1, ..., b_N]`.
    ///
    /// # Errors
    /// - Any edge or weight validation error.
    pub fn to_binned(&self, lower_edge: f64) -> GMMResult<BinnedData> {
        let mut edges = Vec::with_capacity(self.boundaries.len() + 1);
        edges.push(lower_edge);
        edges.extend_from_slice(&self.boundaries);
        BinnedData::from_arrays(Array1::from_vec(edges), Array1::from_vec(self.weights.clone()))
    }
}

impl FromStr for BracketTable {
    type Err = GMMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

// ---- Helper methods ----

fn parse_field(field: &str, line: usize) -> GMMResult<f64> {
    field
        .parse::<f64>()
        .map_err(|e| GMMError::TableParse { line, reason: format!("'{field}': {e}") })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing with comments, blank lines and mixed separators.
    // - Parse errors with 1-based line numbers.
    // - Rescaling merged brackets while keeping raw weights.
    // - Conversion into validated `BinnedData`.
    // -------------------------------------------------------------------------

    const TABLE: &str = "\
# weight  upper
0.5\t50

0.3, 100
0.2 350   # merged top bracket
";

    #[test]
    // Purpose
    // -------
    // A well-formed table parses into parallel columns.
    //
    // Given
    // -----
    // - Three rows with a comment, a blank line and mixed separators.
    //
    // Expect
    // ------
    // - Weights `[0.5, 0.3, 0.2]`, boundaries `[50, 100, 350]`.
    fn parse_reads_rows_and_skips_comments() {
        // Act
        let table: BracketTable = TABLE.parse().unwrap();

        // Assert
        assert_eq!(table.len(), 3);
        assert_eq!(table.weights(), &[0.5, 0.3, 0.2]);
        assert_eq!(table.boundaries(), &[50.0, 100.0, 350.0]);
    }

    #[test]
    // Purpose
    // -------
    // Malformed rows name their line; empty input is rejected.
    fn parse_reports_line_numbers_and_empty_input() {
        let err = BracketTable::parse("0.5 50\n0.3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GMMError::TableParse { line: 2, .. }));
        let err = BracketTable::parse("0.5 fifty\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GMMError::TableParse { line: 1, .. }));
        assert_eq!(BracketTable::parse("# nothing\n\n".as_bytes()), Err(GMMError::EmptyTable));
    }

    #[test]
    // Purpose
    // -------
    // Rescaling adjusts the working weights only.
    //
    // Given
    // -----
    // - The sample table with bracket 2 divided by 10.
    //
    // Expect
    // ------
    // - Working weight `0.02`, raw weight still `0.2`; bad inputs rejected.
    fn rescale_keeps_raw_weights() {
        // Arrange
        let mut table: BracketTable = TABLE.parse().unwrap();

        // Act
        table.rescale(2, 10.0).unwrap();

        // Assert
        assert!((table.weights()[2] - 0.02).abs() < 1e-15);
        assert_eq!(table.raw_weights().unwrap().as_array()[2], 0.2);
        assert!(matches!(table.rescale(3, 2.0), Err(GMMError::InvalidRescale { index: 3, .. })));
        assert!(matches!(table.rescale(0, 0.0), Err(GMMError::InvalidRescale { .. })));
    }

    #[test]
    // Purpose
    // -------
    // The lower edge is prepended to the boundaries.
    fn to_binned_prepends_lower_edge() {
        let table: BracketTable = TABLE.parse().unwrap();
        let data = table.to_binned(0.0).unwrap();
        assert_eq!(data.edges().as_array().to_vec(), vec![0.0, 50.0, 100.0, 350.0]);
        assert!(matches!(table.to_binned(60.0), Err(GMMError::EdgesNotIncreasing { .. })));
    }
}
