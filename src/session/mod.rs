//! Client session orchestration: presence states, the event channel,
//! and the machine that ties tables, occupancy, chat, and expiry
//! together.

pub mod events;
pub mod machine;

pub use events::{Notice, PresenceState, SessionEvent};
pub use machine::{TableSession, format_elapsed};
