//! Occupancy error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors from occupancy transactions.
///
/// Cloneable so every caller coalesced onto one in-flight join
/// observes the same outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OccupancyError {
    /// No table exists for the given code
    #[error("Table code not found")]
    TableNotFound,

    /// Underlying store failure (including an exhausted retry budget)
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for occupancy operations
pub type OccupancyResult<T> = Result<T, OccupancyError>;
