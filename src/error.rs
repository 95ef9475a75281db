//! Input-contract errors raised by the segmentation core

use thiserror::Error;

/// Contract violations detected before any arithmetic runs.
///
/// Degenerate inputs (empty record sets, zero-range columns, empty clusters)
/// are not errors; they resolve to documented defaults instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Requested cluster count is below 1 or exceeds the number of records.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_records} records")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of records supplied.
        n_records: usize,
    },

    /// A feature value is NaN or infinite.
    #[error("record {id}: {field} is not a finite number")]
    NonFiniteFeature { id: String, field: &'static str },

    /// A feature value falls outside its accepted input range.
    #[error("record {id}: {field} = {value} is outside {min}..={max}")]
    OutOfRange {
        id: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A required field is empty.
    #[error("record {id}: {field} is required")]
    MissingField { id: String, field: &'static str },

    /// Two records share the same identifier.
    #[error("duplicate customer id: {0}")]
    DuplicateId(String),
}
