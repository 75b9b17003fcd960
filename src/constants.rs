//! Fixed protocol constants shared across the session coordinator.

use std::time::Duration;

/// Hard lifetime of a table. Once `created_at_ms + TABLE_TTL` has
/// passed, the table is permanently inert.
pub const TABLE_TTL: Duration = Duration::from_secs(10 * 60);

/// Minimum spacing between a client's accepted chat sends.
pub const CHAT_COOLDOWN: Duration = Duration::from_secs(15);

/// Window inside which an identical (table, text) resubmission is
/// dropped as a duplicate trigger event.
pub const DUPLICATE_SUBMIT_WINDOW_MS: i64 = 1200;

/// Width of the time bucket folded into deterministic message keys.
pub const MESSAGE_KEY_BUCKET_MS: i64 = 1500;

/// Maximum accepted chat message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Table code alphabet: 32 symbols, visually ambiguous characters
/// (0, O, 1, I) excluded.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a table code.
pub const CODE_LENGTH: usize = 6;

/// Uniqueness checks attempted before code generation gives up.
pub const MAX_CODE_ATTEMPTS: u32 = 10;

/// Optimistic transaction retries before a conflict is surfaced.
pub const MAX_TRANSACT_ATTEMPTS: u32 = 8;

/// Base backoff between transaction retries; doubles per attempt.
pub const TRANSACT_BACKOFF_BASE: Duration = Duration::from_millis(10);

/// Messages replayed to a new subscriber of a table's stream.
pub const SUBSCRIBE_REPLAY_LIMIT: usize = 100;

/// Dashboard table history cap.
pub const HISTORY_LIMIT: usize = 12;

/// Body of the system message posted on a session's first join.
pub const JOIN_ANNOUNCE_TEXT: &str = "Hello! I just joined. (System Message)";

/// Body of the system message posted on leave.
pub const LEAVE_ANNOUNCE_TEXT: &str = "Bye! I just left. (System Message)";

/// Notice shown when a table turns out to be expired on arrival.
pub const EXPIRED_ON_ARRIVAL_TEXT: &str =
    "This table has already closed after 10 minutes (testing mode). Please create or join a new table.";

/// Notice shown when expiry is detected while arming the timer.
pub const EXPIRED_ON_SCHEDULE_TEXT: &str =
    "This table has reached the 10-minute café testing limit. The coffee shop is kindly asking everyone to move to a fresh table.";

/// Notice shown when the expiry timer fires mid-visit.
pub const EXPIRED_WHILE_PRESENT_TEXT: &str =
    "You've been hogging this table for so long that the coffee shop is asking you to leave:( Seems like your hard work annoyed them!";

/// Notice shown when a send hits an expired table.
pub const EXPIRED_AT_SEND_TEXT: &str =
    "This table has reached the 10-minute testing limit. Time to move to a new one.";
