//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the tree engine's contract.
/// "Not found" on a lookup is not an error; it is an empty `Option`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{operation}() requires {argument} to be provided")]
    MissingArgument {
        operation: &'static str,
        argument: &'static str,
    },

    #[error("invalid node literal: {0}")]
    InvalidLiteral(String),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node id already in use: {0}")]
    DuplicateId(NodeId),

    #[error("tree would be {depth} levels deep, limit is {max}")]
    DepthExceeded { depth: usize, max: usize },
}

impl DomainError {
    pub fn missing(operation: &'static str, argument: &'static str) -> Self {
        DomainError::MissingArgument {
            operation,
            argument,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
