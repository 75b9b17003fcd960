//! Table store error types.

use thiserror::Error;

/// Errors surfaced by the persistent table store.
///
/// Variants are cloneable so coalesced callers can all observe the
/// same failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No table record exists for the requested code
    #[error("Table code not found")]
    NotFound,

    /// A record already exists for the code being created
    #[error("Table code already exists")]
    AlreadyExists,

    /// Optimistic transaction lost every retry within the budget
    #[error("Transaction conflict persisted after {attempts} attempts")]
    TransactionConflict { attempts: u32 },

    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
