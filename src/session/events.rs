//! Session events and user-facing notices.

use crate::chat::ChatMessage;
use crate::table::TableSummary;

/// Top-level presence of a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceState {
    /// No identity available
    Unauthenticated,
    /// Signed in, not seated
    Dashboard,
    /// Seated at the table with this code
    InTable(String),
}

/// Events delivered asynchronously into the session's event channel
/// by timers and stream forwarders.
///
/// Every event carries the session epoch it was created under; the
/// session ignores events whose epoch is stale, which is what stops a
/// prior table's timer or stream from touching the current one.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The expiry timer for `code` fired.
    TableExpired {
        code: String,
        epoch: u64,
        message: String,
    },

    /// The log delivered an entry for `code`.
    Incoming {
        code: String,
        epoch: u64,
        key: String,
        message: ChatMessage,
    },
}

/// What the session surfaces to its UI boundary.
///
/// Notices are advisory: the machine never blocks on them being
/// consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Seated at a table
    Entered {
        code: String,
        name: String,
        created_at_ms: i64,
        occupant_count: usize,
    },

    /// Left the table by an explicit action
    Left,

    /// The table expired; `message` carries the context-specific wording
    Expired { message: String },

    /// A non-fatal failure to show
    Error { message: String },

    /// A chat entry to render
    Chat { key: String, message: ChatMessage },

    /// Fresh occupancy count for the current table
    Occupancy { count: usize },

    /// Dashboard history of tables this identity created
    History(Vec<TableSummary>),
}
