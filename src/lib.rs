//! # Coffee Table
//!
//! A coordinator for ephemeral, code-addressed "table" sessions: short
//! shared spaces a few people join with a six-character code, chat in
//! for a fixed ten minutes, and then lose forever.
//!
//! The crate is the full client-side machinery plus the traits its
//! external collaborators implement:
//!
//! - a table record keyed by code, with atomic join/leave occupancy
//!   against a shared store ([`store::TableStore`])
//! - a fixed TTL from creation, enforced by per-session timers and
//!   checked again at every arrival and send
//! - an at-least-once chat stream ([`chat::EventLog`]) made effectively
//!   exactly-once by deterministic message keys on the write side and a
//!   rendered-key set on the read side
//! - a per-session state machine ([`session::TableSession`]) that owns
//!   every table-scoped resource and releases all of it on every exit
//!   path
//!
//! ## Core Modules
//!
//! - [`table`]: the table record, code generation, lifecycle facts
//! - [`store`]: the shared store boundary and its transaction primitive
//! - [`occupancy`]: atomic join/leave with per-client join coalescing
//! - [`chat`]: message model, event log boundary, pipeline, consumer
//! - [`expiry`]: TTL math and the one-shot expiry timer
//! - [`session`]: the presence state machine tying it all together
//! - [`auth`]: identity model and provider boundary
//!
//! ## Example
//!
//! ```
//! use coffee_table::chat::MemoryEventLog;
//! use coffee_table::session::TableSession;
//! use coffee_table::store::MemoryTableStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryTableStore::new());
//! let log = Arc::new(MemoryEventLog::new());
//! let (session, _notices) = TableSession::new(store, log);
//! assert!(!session.session_id().is_empty());
//! ```

pub mod auth;
pub mod chat;
pub mod constants;
pub mod expiry;
pub mod occupancy;
pub mod session;
pub mod store;
pub mod table;

pub use auth::{Identity, IdentityProvider};
pub use chat::{ChatMessage, EventLog, MessageKind, SendError};
pub use session::{Notice, PresenceState, TableSession};
pub use store::{StoreError, TableStore};
pub use table::{Table, TableError, TableSummary};
