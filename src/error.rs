use thiserror::Error;

/// Errors raised by the training engine.
///
/// Every error is raised synchronously at the point of violation, before any
/// training epoch runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Unknown function name, unsupported solver or invalid hyperparameter.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Incompatible weight matrices, or data whose width does not match the network.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Inputs and targets disagree on the number of samples.
    #[error("dimension mismatch: {inputs} input samples but {targets} target samples")]
    DimensionMismatch { inputs: usize, targets: usize },

    /// A weight-dependent operation was called before any weights exist.
    #[error("model is not fitted: call fit() or set_weights() first")]
    NotFitted,

    /// Classification targets that are not a single column of 0/1 labels.
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// Ragged, empty or otherwise malformed data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
