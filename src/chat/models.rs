//! Chat message model and deterministic message keys.

use crate::constants::MESSAGE_KEY_BUCKET_MS;
use serde::{Deserialize, Serialize};

/// What a log entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A user-authored chat line
    Chat,
    /// System entry marking a join
    JoinAnnounce,
    /// System entry marking a leave
    LeaveAnnounce,
}

/// A single immutable entry in a table's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,

    /// Name shown next to the message
    pub sender_name: String,

    /// Authenticated uid, if the sender had one
    pub sender_uid: Option<String>,

    /// Client session id of the producing session; receivers use it to
    /// recognize their own announcements
    pub sender_id: String,

    /// Send instant, epoch milliseconds
    pub timestamp: i64,

    pub kind: MessageKind,
}

impl ChatMessage {
    pub fn is_announcement(&self) -> bool {
        matches!(self.kind, MessageKind::JoinAnnounce | MessageKind::LeaveAnnounce)
    }

    /// Sender label with the anonymous fallback applied.
    pub fn sender_label(&self) -> &str {
        if self.sender_name.is_empty() {
            "Guest"
        } else {
            &self.sender_name
        }
    }
}

fn sanitize_key_part(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// 31x rolling hash over the UTF-16 code units of `text`, in base 36.
///
/// Wrapping i32 arithmetic on UTF-16 units keeps keys identical to
/// those minted by existing web clients sharing the same log.
fn text_hash(text: &str) -> String {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Deterministic log key for a chat send.
///
/// A pure function of (table, sender-or-session, coarse time bucket,
/// lowercased text): redelivery or an accidental double submission
/// lands on the same key, and the overwrite collapses to one stored
/// message.
pub fn message_key(table_code: &str, sender_key: &str, now_ms: i64, text: &str) -> String {
    let table_part = sanitize_key_part(table_code);
    let sender_part = sanitize_key_part(sender_key);
    let bucket = now_ms.div_euclid(MESSAGE_KEY_BUCKET_MS);
    let hash = text_hash(&text.to_lowercase());
    format!("{table_part}_{sender_part}_{bucket}_{hash}")
}
