//! Chat error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the realtime event log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LogError {
    /// The log could not be reached
    #[error("Event log unavailable: {0}")]
    Unavailable(String),
}

/// Result type for event log operations
pub type LogResult<T> = Result<T, LogError>;

/// Errors from the chat submission pipeline.
///
/// `CoolingDown` and `DuplicateSubmission` are local rejections made
/// before any store or log call; the rest surface to the sender only
/// and never store the message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    /// Nothing left after trimming
    #[error("Message is empty")]
    EmptyMessage,

    /// Message exceeds the accepted length
    #[error("Message too long (max {max} characters)")]
    TextTooLong { max: usize },

    /// The cooldown window has not elapsed since the last accepted send
    #[error("Wait {remaining_secs}s before sending another message")]
    CoolingDown { remaining_secs: u64 },

    /// Same (table, text) pair resubmitted within the duplicate window
    #[error("Duplicate submission dropped")]
    DuplicateSubmission,

    /// The session is not seated at any table
    #[error("Join a table first")]
    NotInTable,

    /// The table record no longer exists
    #[error("This table is no longer available")]
    TableGone,

    /// The table expired while composing; route through expiry handling
    #[error("This table has expired")]
    TableExpired,

    /// Table re-validation failed at the store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The log write failed; the message was not stored
    #[error(transparent)]
    Log(#[from] LogError),
}
