//! # Error Types
//!
//! Errors raised at the persistence collaborator boundary.

use thiserror::Error;

/// Failure reported by an identity or message store.
///
/// A missing record is not represented here: lookups return `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write collided with an existing record (uniqueness violation).
    #[error("Write conflict on record {id}")]
    Conflict { id: String },

    /// The store accepted the request but failed to complete it.
    #[error("Store I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Returns true for failures that a caller could retry later.
    ///
    /// The ingestion pipeline never retries on its own; this is exposed for
    /// the surrounding application.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}
