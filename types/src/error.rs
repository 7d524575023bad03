//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for protocol primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("network must contain at least one participant")]
    EmptyNetwork,

    #[error("fault bound {faulty} must be smaller than network size {nodes}")]
    TooManyFaults { nodes: usize, faulty: usize },

    #[error("node {index} is out of range for a network of {nodes}")]
    NodeOutOfRange { index: usize, nodes: usize },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}
