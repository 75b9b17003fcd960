//! Chat submission pipeline.
//!
//! Everything between "the user pressed send" and "the message is in
//! the log": local throttling, duplicate-trigger suppression, the
//! expiry race guard, and the deterministic-key write.

use super::errors::SendError;
use super::log::EventLog;
use super::models::{ChatMessage, MessageKind, message_key};
use crate::auth::Identity;
use crate::constants::{CHAT_COOLDOWN, DUPLICATE_SUBMIT_WINDOW_MS, MAX_MESSAGE_CHARS};
use crate::store::TableStore;
use chrono::Utc;
use std::sync::Arc;

struct LastSubmit {
    key: String,
    at_ms: i64,
}

/// Per-client chat producer for one session.
///
/// The pipeline holds the cooldown window and the last accepted
/// submission; both are local state, so rejected sends never touch
/// the store or the log.
pub struct ChatPipeline<S, L> {
    store: Arc<S>,
    log: Arc<L>,
    session_id: String,
    cooldown_until_ms: i64,
    last_submit: Option<LastSubmit>,
}

impl<S, L> ChatPipeline<S, L>
where
    S: TableStore,
    L: EventLog,
{
    pub fn new(store: Arc<S>, log: Arc<L>, session_id: String) -> Self {
        Self {
            store,
            log,
            session_id,
            cooldown_until_ms: 0,
            last_submit: None,
        }
    }

    /// Seconds (rounded up) until the next send is accepted; zero when
    /// the window has elapsed. Exposed for UI feedback.
    pub fn cooldown_remaining_secs(&self, now_ms: i64) -> u64 {
        let remaining_ms = (self.cooldown_until_ms - now_ms).max(0) as u64;
        remaining_ms.div_ceil(1000)
    }

    /// Reset the cooldown and duplicate guard, e.g. when the session
    /// leaves its table.
    pub fn reset(&mut self) {
        self.cooldown_until_ms = 0;
        self.last_submit = None;
    }

    /// Submit a chat message to a table's log.
    pub async fn send(
        &mut self,
        code: &str,
        identity: &Identity,
        text: &str,
    ) -> Result<ChatMessage, SendError> {
        self.send_at(code, identity, text, Utc::now().timestamp_millis())
            .await
    }

    /// [`ChatPipeline::send`] with an explicit clock instant.
    ///
    /// Rejection order: cooldown, text validation, duplicate window,
    /// table re-validation, log write. Only the last two leave the
    /// client.
    pub async fn send_at(
        &mut self,
        code: &str,
        identity: &Identity,
        text: &str,
        now_ms: i64,
    ) -> Result<ChatMessage, SendError> {
        let remaining_secs = self.cooldown_remaining_secs(now_ms);
        if remaining_secs > 0 {
            return Err(SendError::CoolingDown { remaining_secs });
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(SendError::TextTooLong {
                max: MAX_MESSAGE_CHARS,
            });
        }

        let dedupe_key = format!("{code}::{text}");
        if let Some(last) = &self.last_submit
            && last.key == dedupe_key
            && now_ms - last.at_ms < DUPLICATE_SUBMIT_WINDOW_MS
        {
            return Err(SendError::DuplicateSubmission);
        }

        // Race guard: the table may have expired since the view loaded.
        let table = self.store.get(code).await?.ok_or(SendError::TableGone)?;
        if table.is_expired(now_ms) {
            return Err(SendError::TableExpired);
        }

        let key = message_key(code, &identity.uid, now_ms, text);
        let message = ChatMessage {
            text: text.to_string(),
            sender_name: identity.display_name(),
            sender_uid: Some(identity.uid.clone()),
            sender_id: self.session_id.clone(),
            timestamp: now_ms,
            kind: MessageKind::Chat,
        };
        self.log.put(code, &key, message.clone()).await?;

        self.last_submit = Some(LastSubmit {
            key: dedupe_key,
            at_ms: now_ms,
        });
        self.cooldown_until_ms = now_ms + CHAT_COOLDOWN.as_millis() as i64;
        log::debug!("chat message stored for table {code} at key {key}");

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::log::MemoryEventLog;
    use crate::store::{MemoryTableStore, StoreResult, TableStore};
    use crate::table::Table;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store wrapper counting reads, to prove local rejections stay
    /// local.
    struct CountingStore {
        inner: MemoryTableStore,
        gets: AtomicU32,
    }

    #[async_trait]
    impl TableStore for CountingStore {
        async fn get(&self, code: &str) -> StoreResult<Option<Table>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(code).await
        }

        async fn create(&self, table: Table) -> StoreResult<()> {
            self.inner.create(table).await
        }

        async fn load(&self, code: &str) -> StoreResult<Option<(Table, u64)>> {
            self.inner.load(code).await
        }

        async fn compare_and_swap(
            &self,
            code: &str,
            expected_version: u64,
            table: Table,
        ) -> StoreResult<bool> {
            self.inner.compare_and_swap(code, expected_version, table).await
        }

        async fn query_by_owner(&self, uid: &str) -> StoreResult<Vec<Table>> {
            self.inner.query_by_owner(uid).await
        }
    }

    fn identity() -> Identity {
        Identity {
            uid: "u1".to_string(),
            display_name: Some("Ada".to_string()),
            email: None,
        }
    }

    async fn pipeline_with_table(
        created_at_ms: i64,
    ) -> (ChatPipeline<CountingStore, MemoryEventLog>, Arc<CountingStore>, Arc<MemoryEventLog>)
    {
        let store = Arc::new(CountingStore {
            inner: MemoryTableStore::new(),
            gets: AtomicU32::new(0),
        });
        store
            .create(Table::new(
                "ABC234".to_string(),
                "Window Seat".to_string(),
                created_at_ms,
                "owner".to_string(),
            ))
            .await
            .unwrap();
        let log = Arc::new(MemoryEventLog::new());
        let pipeline = ChatPipeline::new(Arc::clone(&store), Arc::clone(&log), "session-1".to_string());
        (pipeline, store, log)
    }

    #[tokio::test]
    async fn send_stores_message_and_arms_cooldown() {
        let (mut pipeline, _, log) = pipeline_with_table(0).await;

        let message = pipeline
            .send_at("ABC234", &identity(), "hello", 10_000)
            .await
            .unwrap();
        assert_eq!(message.kind, MessageKind::Chat);
        assert_eq!(message.sender_name, "Ada");
        assert_eq!(log.entry_count("ABC234").await, 1);
        assert_eq!(pipeline.cooldown_remaining_secs(10_000), 15);
        // Partial seconds round up.
        assert_eq!(pipeline.cooldown_remaining_secs(10_500), 15);
        assert_eq!(pipeline.cooldown_remaining_secs(24_001), 1);
        assert_eq!(pipeline.cooldown_remaining_secs(25_000), 0);
    }

    #[tokio::test]
    async fn cooldown_rejects_without_store_call() {
        let (mut pipeline, store, _) = pipeline_with_table(0).await;

        pipeline
            .send_at("ABC234", &identity(), "first", 10_000)
            .await
            .unwrap();
        let gets_after_first = store.gets.load(Ordering::SeqCst);

        let err = pipeline
            .send_at("ABC234", &identity(), "second", 11_000)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::CoolingDown { remaining_secs: 14 });
        assert_eq!(store.gets.load(Ordering::SeqCst), gets_after_first);

        // Once the window elapses, sends succeed again.
        pipeline
            .send_at("ABC234", &identity(), "second", 25_000)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_resubmission_is_dropped_silently() {
        let (mut pipeline, store, log) = pipeline_with_table(0).await;

        pipeline
            .send_at("ABC234", &identity(), "hello", 10_000)
            .await
            .unwrap();
        pipeline.cooldown_until_ms = 0; // isolate the duplicate guard
        let gets_before = store.gets.load(Ordering::SeqCst);

        let err = pipeline
            .send_at("ABC234", &identity(), "hello", 10_900)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::DuplicateSubmission);
        assert_eq!(store.gets.load(Ordering::SeqCst), gets_before);
        assert_eq!(log.entry_count("ABC234").await, 1);

        // Outside the window the same text is accepted; the key lands
        // in a new time bucket, so a second entry is stored.
        pipeline
            .send_at("ABC234", &identity(), "hello", 12_000)
            .await
            .unwrap();
        assert_eq!(log.entry_count("ABC234").await, 2);
    }

    #[tokio::test]
    async fn same_bucket_double_write_collapses_to_one_entry() {
        let (mut pipeline, _, log) = pipeline_with_table(0).await;

        pipeline
            .send_at("ABC234", &identity(), "hello", 10_000)
            .await
            .unwrap();
        pipeline.cooldown_until_ms = 0;
        pipeline.last_submit = None;

        // Same text, same 1.5s bucket: overwrite, not a second entry.
        pipeline
            .send_at("ABC234", &identity(), "hello", 10_400)
            .await
            .unwrap();
        assert_eq!(log.entry_count("ABC234").await, 1);
    }

    #[tokio::test]
    async fn expired_table_is_reported_for_expiry_handling() {
        let (mut pipeline, _, log) = pipeline_with_table(0).await;

        let past_ttl = crate::constants::TABLE_TTL.as_millis() as i64 + 1;
        let err = pipeline
            .send_at("ABC234", &identity(), "hello", past_ttl)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::TableExpired);
        assert_eq!(log.entry_count("ABC234").await, 0);
    }

    #[tokio::test]
    async fn missing_table_and_empty_text_are_rejected() {
        let (mut pipeline, _, _) = pipeline_with_table(0).await;

        let err = pipeline
            .send_at("ZZZZ99", &identity(), "hello", 10_000)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::TableGone);

        let err = pipeline
            .send_at("ABC234", &identity(), "   ", 10_000)
            .await
            .unwrap_err();
        assert_eq!(err, SendError::EmptyMessage);
    }
}
