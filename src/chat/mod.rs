//! Chat stream: message model, the event log boundary, the rate-
//! limited submission pipeline, and the idempotent consumer.
//!
//! Producers write chat at deterministic keys so redelivery and
//! double submission collapse to one stored message; consumers keep a
//! rendered-key set so at-least-once delivery renders exactly once.

pub mod consumer;
pub mod errors;
pub mod log;
pub mod models;
pub mod pipeline;

pub use consumer::{Applied, ChatConsumer};
pub use errors::{LogError, LogResult, SendError};
pub use log::{EventLog, LogEntry, LogSubscription, MemoryEventLog};
pub use models::{ChatMessage, MessageKind, message_key};
pub use pipeline::ChatPipeline;
