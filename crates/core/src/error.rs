//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Authorization decisions are never expressed as errors: a missing grant is
/// simply `false`. This only covers malformed input at the edges.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. empty string).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
