use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty resource set: no records carried a subject")]
    EmptyResourceSet,

    #[error("Invalid feature vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Feature slot {slot} out of range for {feature_count} features")]
    SlotOutOfRange { slot: usize, feature_count: usize },

    #[error("Distance matrix too large: cannot allocate {resources}x{resources} cells ({features} features per resource)")]
    MatrixTooLarge { resources: usize, features: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
