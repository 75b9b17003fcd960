//! Realtime event log boundary.
//!
//! The log is an external collaborator: append-only per table,
//! at-least-once delivery to subscribers, ordered by arrival.
//! [`MemoryEventLog`] implements it in-process for tests.

use super::errors::LogResult;
use super::models::ChatMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

/// A delivered log entry: key plus message.
pub type LogEntry = (String, ChatMessage);

/// Handle to a live message stream for one table.
///
/// Dropping the subscription unsubscribes; the log prunes the dead
/// sender on its next delivery attempt.
pub struct LogSubscription {
    receiver: mpsc::UnboundedReceiver<LogEntry>,
}

impl LogSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<LogEntry>) -> Self {
        Self { receiver }
    }

    /// Next delivered entry, or `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<LogEntry> {
        self.receiver.recv().await
    }

    /// Non-blocking poll used by event-loop drivers.
    pub fn try_next(&mut self) -> Option<LogEntry> {
        self.receiver.try_recv().ok()
    }

    /// Explicit teardown; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

/// External append-only message log with subscription.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append under a log-generated key. Used for announcements.
    async fn append(&self, code: &str, message: ChatMessage) -> LogResult<String>;

    /// Write at a caller-chosen key. Overwriting an existing key is
    /// the dedupe mechanism for chat sends, not an error.
    async fn put(&self, code: &str, key: &str, message: ChatMessage) -> LogResult<()>;

    /// Subscribe to a table's stream: the most recent `limit` entries
    /// replay first, then live entries follow in arrival order.
    /// Delivery is at-least-once; consumers must be idempotent.
    async fn subscribe(&self, code: &str, limit: usize) -> LogResult<LogSubscription>;

    /// Drop every entry for a table. Best-effort on expiry.
    async fn purge(&self, code: &str) -> LogResult<()>;
}

#[derive(Default)]
struct TableLog {
    entries: Vec<LogEntry>,
}

impl TableLog {
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// An [`EventLog`] backed by process-local vectors, for tests and
/// demos.
pub struct MemoryEventLog {
    logs: Mutex<HashMap<String, TableLog>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<LogEntry>>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    async fn notify(&self, code: &str, entry: LogEntry) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(senders) = subscribers.get_mut(code) {
            senders.retain(|tx| tx.send(entry.clone()).is_ok());
        }
    }

    /// Number of stored entries for a table. Test hook.
    pub async fn entry_count(&self, code: &str) -> usize {
        let logs = self.logs.lock().await;
        logs.get(code).map_or(0, |log| log.entries.len())
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, code: &str, message: ChatMessage) -> LogResult<String> {
        let key = Uuid::new_v4().to_string();
        let mut logs = self.logs.lock().await;
        logs.entry(code.to_string())
            .or_default()
            .entries
            .push((key.clone(), message.clone()));
        drop(logs);

        self.notify(code, (key.clone(), message)).await;
        Ok(key)
    }

    async fn put(&self, code: &str, key: &str, message: ChatMessage) -> LogResult<()> {
        let mut logs = self.logs.lock().await;
        let log = logs.entry(code.to_string()).or_default();

        if let Some(index) = log.position(key) {
            // Overwrite at an existing key replaces silently; no
            // second delivery reaches subscribers.
            log.entries[index].1 = message;
            return Ok(());
        }

        log.entries.push((key.to_string(), message.clone()));
        drop(logs);

        self.notify(code, (key.to_string(), message)).await;
        Ok(())
    }

    async fn subscribe(&self, code: &str, limit: usize) -> LogResult<LogSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        let logs = self.logs.lock().await;
        if let Some(log) = logs.get(code) {
            let start = log.entries.len().saturating_sub(limit);
            for entry in &log.entries[start..] {
                let _ = tx.send(entry.clone());
            }
        }
        drop(logs);

        let mut subscribers = self.subscribers.lock().await;
        subscribers.entry(code.to_string()).or_default().push(tx);

        Ok(LogSubscription::new(rx))
    }

    async fn purge(&self, code: &str) -> LogResult<()> {
        let mut logs = self.logs.lock().await;
        logs.remove(code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::models::MessageKind;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            text: text.to_string(),
            sender_name: "Ada".to_string(),
            sender_uid: Some("u1".to_string()),
            sender_id: "session-1".to_string(),
            timestamp: 0,
            kind: MessageKind::Chat,
        }
    }

    #[tokio::test]
    async fn subscribe_replays_then_streams() {
        let log = MemoryEventLog::new();
        log.put("ABC234", "k1", message("first")).await.unwrap();

        let mut sub = log.subscribe("ABC234", 100).await.unwrap();
        let (key, replayed) = sub.next().await.unwrap();
        assert_eq!(key, "k1");
        assert_eq!(replayed.text, "first");

        log.put("ABC234", "k2", message("second")).await.unwrap();
        let (key, live) = sub.next().await.unwrap();
        assert_eq!(key, "k2");
        assert_eq!(live.text, "second");
    }

    #[tokio::test]
    async fn replay_respects_limit() {
        let log = MemoryEventLog::new();
        for i in 0..5 {
            log.put("ABC234", &format!("k{i}"), message(&format!("m{i}")))
                .await
                .unwrap();
        }

        let mut sub = log.subscribe("ABC234", 2).await.unwrap();
        assert_eq!(sub.try_next().unwrap().0, "k3");
        assert_eq!(sub.try_next().unwrap().0, "k4");
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn put_overwrites_without_redelivery() {
        let log = MemoryEventLog::new();
        let mut sub = log.subscribe("ABC234", 100).await.unwrap();

        log.put("ABC234", "k1", message("original")).await.unwrap();
        log.put("ABC234", "k1", message("rewritten")).await.unwrap();

        let (_, delivered) = sub.next().await.unwrap();
        assert_eq!(delivered.text, "original");
        assert!(sub.try_next().is_none());
        assert_eq!(log.entry_count("ABC234").await, 1);
    }

    #[tokio::test]
    async fn purge_clears_entries() {
        let log = MemoryEventLog::new();
        log.append("ABC234", message("hi")).await.unwrap();
        assert_eq!(log.entry_count("ABC234").await, 1);

        log.purge("ABC234").await.unwrap();
        assert_eq!(log.entry_count("ABC234").await, 0);
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned() {
        let log = MemoryEventLog::new();
        let sub = log.subscribe("ABC234", 100).await.unwrap();
        sub.unsubscribe();

        // Delivery attempt prunes the dead sender without failing.
        log.append("ABC234", message("hi")).await.unwrap();
        let subscribers = log.subscribers.lock().await;
        assert!(subscribers.get("ABC234").unwrap().is_empty());
    }
}
