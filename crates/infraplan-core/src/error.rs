//! Error types for infraplan

use std::fmt;

use thiserror::Error;

/// A single input record that failed validation.
///
/// Raised per record so callers can report which asset, pool or
/// requirement was rejected and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Identifier of the offending record (empty when the id itself is missing).
    pub record_id: String,
    /// Name of the field that failed validation.
    pub field: &'static str,
    /// Human-readable reason.
    pub reason: String,
}

impl ValidationError {
    pub fn new(
        record_id: impl Into<String>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.record_id.is_empty() {
            write!(f, "field `{}`: {}", self.field, self.reason)
        } else {
            write!(f, "record `{}`, field `{}`: {}", self.record_id, self.field, self.reason)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Main error type for infraplan operations
#[derive(Debug, Error)]
pub enum PlanError {
    /// A malformed input record
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Arguments that cannot be coerced into a meaningful problem
    /// (negative budget, non-finite weights, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The background worker running a solve went away before replying
    #[error("Solve was abandoned before completion")]
    Abandoned,

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for infraplan operations
pub type Result<T> = std::result::Result<T, PlanError>;
