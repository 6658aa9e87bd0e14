//! Data containers mapping omics measurements onto model identifiers
pub mod expression_profile;
pub mod flux_constraints;
pub mod frame;

pub use expression_profile::{Condition, ExpressionProfile};
pub use flux_constraints::{DataType, FluxConstraints};
pub use frame::Frame;

use indexmap::IndexMap;
use thiserror::Error;

/// Errors arising from the data set containers
#[derive(Debug, Error)]
pub enum DataSetError {
    /// Matrix dimensions do not match the label dimensions
    #[error("Data dimensions {found:?} don't match label dimensions {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A label that must be unique appears more than once
    #[error("Duplicate label {0}")]
    DuplicateLabel(String),
    /// Lookup of an identifier that is not in the profile
    #[error("Unknown identifier {0}")]
    UnknownIdentifier(String),
    /// Lookup of a condition that is not in the profile
    #[error("Unknown condition {0}")]
    UnknownCondition(String),
    /// Lookup of a condition column outside the profile
    #[error("Condition index {index} out of range for {count} conditions")]
    ConditionIndexOutOfRange { index: usize, count: usize },
    /// Lookup of a reaction that is not in the container
    #[error("Unknown reaction {0}")]
    UnknownReaction(String),
    /// Lookup of a reaction row outside the container
    #[error("Reaction index {index} out of range for {count} reactions")]
    ReactionIndexOutOfRange { index: usize, count: usize },
    /// p-values requested from a profile that has none
    #[error("No p-values defined")]
    PValuesNotDefined,
    /// p-value matrix does not cover all condition pairs
    #[error("p-values don't cover all condition pairs: expected {expected} columns, found {found}")]
    PValueShape { expected: usize, found: usize },
    /// Unknown data type string for flux constraint import
    #[error("Invalid input data type {0}")]
    InvalidDataType(String),
    /// A required column is missing from the data frame
    #[error("Missing column {0}")]
    MissingColumn(String),
    /// Replicate collapsing requested with a block size of zero
    #[error("Replicate count must be positive")]
    InvalidReplicates,
    /// A CSV cell could not be parsed as a number
    #[error("Invalid numeric value {value:?}")]
    InvalidNumber { value: String },
    /// A CSV row has a different width than the header
    #[error("Row {0} has a different number of fields than the header")]
    RaggedRow(String),
    /// Underlying CSV reader failure
    #[error("CSV read failure: {0}")]
    Csv(#[from] csv::Error),
}

/// Build a label to position map, requiring the labels to be unique
pub(crate) fn index_of(labels: &[String]) -> Result<IndexMap<String, usize>, DataSetError> {
    let mut index = IndexMap::new();
    for (position, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), position).is_some() {
            return Err(DataSetError::DuplicateLabel(label.clone()));
        }
    }
    Ok(index)
}
