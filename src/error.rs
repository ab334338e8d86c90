//! Unified error type for the crate.
//!
//! Decode never fails: the fallback chain in [`crate::codec::decode`] always
//! produces a value, so deserialization failures stay internal and drive the
//! chain instead of appearing here. Store-side failures pass through wrapped
//! in [`Error::Store`], never reinterpreted.

use thiserror::Error;

/// All errors surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be converted to its stored byte form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Tensor codec invoked on an array with an unsupported number of
    /// dimensions (only 1-D, 2-D, and 3-D arrays are representable).
    #[error("unsupported tensor shape: {dims} dimensions (at most 3 supported)")]
    UnsupportedShape {
        /// Number of dimensions of the offending array.
        dims: usize,
    },

    /// Tensor decode given bytes that are not a valid tensor encoding.
    #[error("invalid tensor encoding: {0}")]
    InvalidTensor(String),

    /// An operation was given an argument it cannot accept, e.g. an empty
    /// mapping for a bulk set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrong type for operation.
    #[error("wrong type: expected {expected}, got {actual}")]
    WrongType {
        /// Expected type.
        expected: String,
        /// Actual type found.
        actual: String,
    },

    /// Failure reported by the underlying store, passed through unmodified.
    #[error("store error: {0}")]
    Store(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a store-side failure without reinterpreting it.
    pub fn store(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Store(err.into())
    }
}

/// Result type for all crate operations.
pub type Result<T> = std::result::Result<T, Error>;
