//! Error types for status aggregation

use thiserror::Error;

/// Main error type for status aggregation
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The composite resource carries a status that cannot be read or written
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A child object could not be interpreted by a status computation
    #[error("status computation error: {0}")]
    Compute(String),

    /// A manifest object lacks a field needed to reference it
    #[error("missing field: {0}")]
    MissingField(String),
}

impl Error {
    /// Create an invalid status error with the given message
    pub fn invalid_status(msg: impl Into<String>) -> Self {
        Self::InvalidStatus(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a status computation error with the given message
    pub fn compute(msg: impl Into<String>) -> Self {
        Self::Compute(msg.into())
    }

    /// Create a missing field error naming the field path
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
