//! Table error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors from table creation and lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    /// No table exists for the given code
    #[error("Table code not found")]
    NotFound,

    /// Code was empty or reduced to nothing after normalization
    #[error("Invalid table code")]
    InvalidCode,

    /// Every generated code collided within the attempt budget
    #[error("Unable to create a unique table code. Try again.")]
    CodeGenerationExhausted,

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
