//! Table record model and its derived facts.

use crate::constants::TABLE_TTL;
use serde::{Deserialize, Serialize};

/// A coded, TTL-bounded shared table record.
///
/// The record is a multi-writer resource: all mutation goes through
/// the store's transaction primitive. `person_count` is a cache of
/// the member set size, recomputed on every join/leave and never
/// independently incremented. Expiry is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Six-character code, the record key
    pub code: String,

    /// Display name chosen at creation
    pub name: String,

    /// Creation instant, epoch milliseconds
    pub created_at_ms: i64,

    /// Owner identity uid
    pub created_by: String,

    /// Identities currently present (set semantics); `None` when the
    /// record was written without the field
    #[serde(default)]
    pub active_user_ids: Option<Vec<String>>,

    /// Cached member-set size
    #[serde(default)]
    pub person_count: i64,
}

impl Table {
    /// A fresh record: nobody has joined yet, so the member list is
    /// empty and the cached count is zero.
    pub fn new(code: String, name: String, created_at_ms: i64, created_by: String) -> Self {
        Self {
            code,
            name,
            created_at_ms,
            created_by,
            active_user_ids: Some(Vec::new()),
            person_count: 0,
        }
    }

    /// Live occupancy as shown to clients. A record that carries a
    /// member list (even an empty one) counts from the list; only
    /// records written without the field fall back to the cached
    /// count. Both floors at one so a table never displays empty.
    pub fn occupant_count(&self) -> usize {
        match &self.active_user_ids {
            Some(ids) => ids.len().max(1),
            None => self.person_count.max(1) as usize,
        }
    }

    /// Current member list; empty when the record carries none.
    pub fn members(&self) -> &[String] {
        self.active_user_ids.as_deref().unwrap_or(&[])
    }

    /// Member list for mutation, materialized on records written
    /// without the field.
    pub fn members_mut(&mut self) -> &mut Vec<String> {
        self.active_user_ids.get_or_insert_with(Vec::new)
    }

    /// Instant after which the table is permanently inert.
    pub fn expires_at_ms(&self) -> i64 {
        self.created_at_ms + TABLE_TTL.as_millis() as i64
    }

    /// Whether the table has outlived its TTL. Derived, not stored.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

/// Occupancy tier used to pick the table illustration, capped at the
/// largest available artwork.
pub fn display_tier(count: usize) -> usize {
    count.clamp(1, 6)
}

/// Dashboard history entry for a previously created table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub created_at_ms: i64,
}

impl From<&Table> for TableSummary {
    fn from(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            created_at_ms: table.created_at_ms,
        }
    }
}
