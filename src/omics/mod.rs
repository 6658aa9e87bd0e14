//! Context-specific model reconstruction and consistency algorithms
pub mod fastcc;
pub mod fastcore;
pub mod gimme;
pub mod imat;

pub use fastcc::fastcc;
pub use fastcore::fastcore;
pub use gimme::gimme;
pub use imat::imat;

use thiserror::Error;

use crate::data_sets::DataSetError;
use crate::metabolic_model::model::ModelError;

/// Errors arising from the omics integration algorithms
#[derive(Debug, Error)]
pub enum OmicsError {
    /// Cutoff pair where the low cutoff exceeds the high cutoff
    #[error("Low cutoff value {low} greater than high cutoff {high}")]
    InvalidCutoffs { low: f64, high: f64 },
    /// A core reaction id that is not part of the model
    #[error("Core reaction {0} is not in the model")]
    UnknownCoreReaction(String),
    /// Failure in the expression profile handling
    #[error(transparent)]
    DataSet(#[from] DataSetError),
    /// Failure while building or solving the model's optimization problem
    #[error(transparent)]
    Model(#[from] ModelError),
}
