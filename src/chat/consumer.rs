//! Idempotent consumption of an at-least-once message stream.

use super::models::ChatMessage;
use std::collections::HashSet;

/// Outcome of applying a newly delivered log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub message: ChatMessage,

    /// Another session announced a join or leave: re-fetch the
    /// occupancy count for display.
    pub refresh_occupancy: bool,
}

/// Receive-side dedupe for one table view.
///
/// The log delivers at-least-once, so every entry carries its key and
/// the consumer keeps the set of keys it has already rendered.
/// Announcements sourced from this session's own id render without
/// triggering a refresh.
pub struct ChatConsumer {
    session_id: String,
    rendered: HashSet<String>,
}

impl ChatConsumer {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            rendered: HashSet::new(),
        }
    }

    /// Apply one delivered entry. Returns `None` for a redelivery.
    pub fn apply(&mut self, key: &str, message: ChatMessage) -> Option<Applied> {
        if !self.rendered.insert(key.to_string()) {
            return None;
        }

        let refresh_occupancy =
            message.is_announcement() && message.sender_id != self.session_id;
        Some(Applied {
            message,
            refresh_occupancy,
        })
    }

    /// Forget everything rendered, e.g. when switching tables.
    pub fn reset(&mut self) {
        self.rendered.clear();
    }
}
