//! The client session state machine.
//!
//! `TableSession` owns every piece of table-scoped state the client
//! holds: the joined code, the stream subscription, the expiry timer,
//! the announcement guards, and the chat pipeline. All of it lives in
//! this one context object and is released on every exit path.
//!
//! Asynchronous continuations (the expiry timer, the stream
//! forwarder) are tagged with a session epoch captured when they were
//! started; the epoch bumps on every teardown, so anything outlived
//! by a table switch is ignored when it finally arrives.

use super::events::{Notice, PresenceState, SessionEvent};
use crate::auth::Identity;
use crate::chat::{ChatConsumer, ChatMessage, ChatPipeline, EventLog, MessageKind, SendError};
use crate::constants::{
    EXPIRED_AT_SEND_TEXT, EXPIRED_ON_ARRIVAL_TEXT, EXPIRED_ON_SCHEDULE_TEXT,
    EXPIRED_WHILE_PRESENT_TEXT, HISTORY_LIMIT, JOIN_ANNOUNCE_TEXT, LEAVE_ANNOUNCE_TEXT,
    SUBSCRIBE_REPLAY_LIMIT,
};
use crate::expiry::{ExpiryTimer, expiry_delay};
use crate::occupancy::OccupancyManager;
use crate::store::TableStore;
use crate::table::{Table, TableError, TableSummary, create_unique_code, normalize_code};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Elapsed-time display anchored at a table's creation instant.
pub fn format_elapsed(elapsed_ms: i64) -> String {
    let total_seconds = (elapsed_ms / 1000).max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// One client's presence machine.
///
/// States are `Unauthenticated`, `Dashboard`, and `InTable(code)`;
/// identity changes, navigation, and explicit actions drive the
/// transitions. Failures surface as [`Notice`]s and always land on a
/// navigable state.
pub struct TableSession<S, L> {
    store: Arc<S>,
    log: Arc<L>,
    session_id: String,

    identity: Option<Identity>,
    state: PresenceState,
    route: Option<String>,

    occupancy: OccupancyManager<S>,
    pipeline: ChatPipeline<S, L>,
    consumer: ChatConsumer,

    joined_code: Option<String>,
    table_anchor_ms: Option<i64>,
    epoch: u64,
    subscription_task: Option<JoinHandle<()>>,
    expiry_timer: Option<ExpiryTimer>,
    announced_joins: HashSet<String>,
    announced_leaves: HashSet<String>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl<S, L> TableSession<S, L>
where
    S: TableStore + 'static,
    L: EventLog + 'static,
{
    /// Build a session against external store and log boundaries.
    /// Returns the session and the notice stream for the UI.
    pub fn new(store: Arc<S>, log: Arc<L>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let session_id = Uuid::new_v4().to_string();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices, notice_rx) = mpsc::unbounded_channel();

        let session = Self {
            occupancy: OccupancyManager::new(Arc::clone(&store)),
            pipeline: ChatPipeline::new(Arc::clone(&store), Arc::clone(&log), session_id.clone()),
            consumer: ChatConsumer::new(session_id.clone()),
            store,
            log,
            session_id,
            identity: None,
            state: PresenceState::Unauthenticated,
            route: None,
            joined_code: None,
            table_anchor_ms: None,
            epoch: 0,
            subscription_task: None,
            expiry_timer: None,
            announced_joins: HashSet::new(),
            announced_leaves: HashSet::new(),
            events_tx,
            events_rx,
            notices,
        };
        (session, notice_rx)
    }

    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Seconds until the next chat send is accepted.
    pub fn cooldown_remaining_secs(&self) -> u64 {
        self.pipeline
            .cooldown_remaining_secs(Utc::now().timestamp_millis())
    }

    /// `HH:MM:SS` since the current table was created, when seated.
    pub fn elapsed_display(&self) -> Option<String> {
        self.table_anchor_ms
            .map(|anchor| format_elapsed(Utc::now().timestamp_millis() - anchor))
    }

    /// The identity provider reported a sign-in or sign-out. Re-route
    /// from the current navigation target.
    pub async fn identity_changed(&mut self, identity: Option<Identity>) {
        self.identity = identity;
        self.route_current().await;
    }

    /// The addressable location changed. A code in the fragment takes
    /// the auto-join path; an empty fragment returns to base.
    pub async fn navigate(&mut self, fragment: Option<&str>) {
        self.route = fragment
            .map(normalize_code)
            .filter(|code| !code.is_empty());
        self.route_current().await;
    }

    /// Explicit join with a user-supplied code.
    pub async fn open_table(&mut self, raw_code: &str) {
        self.open_table_with(raw_code, true).await;
    }

    /// Explicit create: unique code, fresh record, then enter.
    pub async fn create_table(&mut self, name: &str) {
        let Some(identity) = self.identity.clone() else {
            self.notify_error("Please log in to create a table.");
            self.state = PresenceState::Unauthenticated;
            return;
        };

        let name = name.trim();
        if name.is_empty() {
            self.notify_error("Enter a table name.");
            return;
        }

        let code = match create_unique_code(self.store.as_ref()).await {
            Ok(code) => code,
            Err(e) => {
                self.notify_error(&e.to_string());
                return;
            }
        };

        let table = Table::new(
            code.clone(),
            name.to_string(),
            Utc::now().timestamp_millis(),
            identity.uid,
        );
        if let Err(e) = self.store.create(table).await {
            self.notify_error(&e.to_string());
            return;
        }

        self.open_table_with(&code, true).await;
    }

    /// Explicit leave: release every table-scoped resource and land
    /// on the dashboard (or the sign-in screen).
    pub async fn leave_table(&mut self) {
        self.leave_joined().await;
        self.teardown_table_resources();
        self.pipeline.reset();
        self.route = None;
        let _ = self.notices.send(Notice::Left);
        self.land().await;
    }

    /// Sign out: leave first so the occupancy record stays accurate.
    /// The caller is expected to also sign out at the provider.
    pub async fn logout(&mut self) {
        self.leave_joined().await;
        self.teardown_table_resources();
        self.pipeline.reset();
        self.route = None;
        self.identity = None;
        self.land().await;
    }

    /// Submit a chat message to the current table.
    ///
    /// Local rejections (`CoolingDown`, `DuplicateSubmission`) come
    /// back without any store or log traffic; an expired table routes
    /// through expiry handling before the error is returned.
    pub async fn send_chat(&mut self, text: &str) -> Result<(), SendError> {
        let (Some(code), Some(identity)) = (self.joined_code.clone(), self.identity.clone())
        else {
            return Err(SendError::NotInTable);
        };

        match self.pipeline.send(&code, &identity, text).await {
            Ok(_) => Ok(()),
            Err(SendError::TableExpired) => {
                self.handle_expired(&code, EXPIRED_AT_SEND_TEXT).await;
                Err(SendError::TableExpired)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply one asynchronous event. Stale-epoch events are dropped:
    /// they belong to a table this session has already left.
    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TableExpired {
                code,
                epoch,
                message,
            } => {
                if epoch != self.epoch {
                    log::debug!("stale expiry event for table {code} ignored");
                    return;
                }
                self.handle_expired(&code, &message).await;
            }
            SessionEvent::Incoming {
                code,
                epoch,
                key,
                message,
            } => {
                if epoch != self.epoch {
                    return;
                }
                let Some(applied) = self.consumer.apply(&key, message) else {
                    return; // redelivery
                };
                let refresh = applied.refresh_occupancy;
                let _ = self.notices.send(Notice::Chat {
                    key,
                    message: applied.message,
                });
                if refresh {
                    let count = self.occupancy.fetch_count(&code).await.unwrap_or(1);
                    let _ = self.notices.send(Notice::Occupancy { count });
                }
            }
        }
    }

    /// Next queued event, awaiting if none is pending.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Apply every event already queued, without blocking.
    pub async fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn route_current(&mut self) {
        match self.route.clone() {
            Some(code) => self.open_table_with(&code, false).await,
            None => {
                self.leave_joined().await;
                self.teardown_table_resources();
                self.pipeline.reset();
                self.land().await;
            }
        }
    }

    async fn open_table_with(&mut self, raw_code: &str, notify_unauthenticated: bool) {
        if self.identity.is_none() {
            if notify_unauthenticated {
                self.notify_error("Please log in to join or create a table.");
            }
            // Identity can be lost while seated; that is an exit path
            // and releases table resources like any other.
            self.leave_joined().await;
            self.teardown_table_resources();
            self.pipeline.reset();
            self.state = PresenceState::Unauthenticated;
            return;
        }

        let code = normalize_code(raw_code);
        if code.is_empty() {
            self.notify_error(&TableError::InvalidCode.to_string());
            return;
        }

        let table = match self.store.get(&code).await {
            Ok(Some(table)) => table,
            Ok(None) => {
                self.notify_error(&TableError::NotFound.to_string());
                self.route = None;
                self.land().await;
                return;
            }
            Err(e) => {
                self.notify_error(&e.to_string());
                return;
            }
        };

        if table.is_expired(Utc::now().timestamp_millis()) {
            self.handle_expired(&code, EXPIRED_ON_ARRIVAL_TEXT).await;
            return;
        }

        self.enter_table(table).await;
    }

    /// Seat this session at `table`. Teardown of the prior table is
    /// synchronous and completes before any of the new table's setup
    /// begins, so two tables' timers or subscriptions never coexist.
    async fn enter_table(&mut self, table: Table) {
        let code = table.code.clone();
        let rejoining_same = self.joined_code.as_deref() == Some(code.as_str());

        self.teardown_table_resources();
        if !rejoining_same {
            self.leave_joined().await;
        }

        match self.log.subscribe(&code, SUBSCRIBE_REPLAY_LIMIT).await {
            Ok(subscription) => self.spawn_forwarder(code.clone(), subscription),
            Err(e) => self.notify_error(&format!("Chat unavailable: {e}")),
        }

        let occupant_count = if rejoining_same {
            self.occupancy.fetch_count(&code).await.unwrap_or(1)
        } else {
            match self.occupancy.join(&code, self.identity.as_ref()).await {
                Ok(count) => count,
                Err(e) => {
                    self.notify_error(&e.to_string());
                    self.teardown_table_resources();
                    self.route = None;
                    self.land().await;
                    return;
                }
            }
        };

        self.joined_code = Some(code.clone());
        self.announce_join(&code).await;

        self.table_anchor_ms = Some(table.created_at_ms);
        self.route = Some(code.clone());
        self.state = PresenceState::InTable(code.clone());
        let _ = self.notices.send(Notice::Entered {
            code,
            name: table.name.clone(),
            created_at_ms: table.created_at_ms,
            occupant_count,
        });

        self.schedule_expiry(&table).await;
    }

    /// Terminal handling for an expired table: purge its log, leave,
    /// release everything table-scoped, and land on a safe state.
    async fn handle_expired(&mut self, code: &str, message: &str) {
        if let Err(e) = self.log.purge(code).await {
            log::warn!("purge of table {code} failed (ignored): {e}");
        }

        self.leave_joined().await;
        self.teardown_table_resources();
        self.pipeline.reset();
        self.route = None;
        let _ = self.notices.send(Notice::Expired {
            message: message.to_string(),
        });
        self.land().await;
    }

    async fn schedule_expiry(&mut self, table: &Table) {
        let now_ms = Utc::now().timestamp_millis();
        match expiry_delay(table.created_at_ms, now_ms) {
            None => {
                self.handle_expired(&table.code, EXPIRED_ON_SCHEDULE_TEXT)
                    .await;
            }
            Some(delay) => {
                self.expiry_timer = Some(ExpiryTimer::spawn(
                    delay,
                    self.events_tx.clone(),
                    SessionEvent::TableExpired {
                        code: table.code.clone(),
                        epoch: self.epoch,
                        message: EXPIRED_WHILE_PRESENT_TEXT.to_string(),
                    },
                ));
            }
        }
    }

    fn spawn_forwarder(&mut self, code: String, mut subscription: crate::chat::LogSubscription) {
        let events_tx = self.events_tx.clone();
        let epoch = self.epoch;
        let handle = tokio::spawn(async move {
            while let Some((key, message)) = subscription.next().await {
                let event = SessionEvent::Incoming {
                    code: code.clone(),
                    epoch,
                    key,
                    message,
                };
                if events_tx.send(event).is_err() {
                    break;
                }
            }
        });
        self.subscription_task = Some(handle);
    }

    /// Release the subscription, the timer, the rendered-id set, and
    /// the elapsed anchor, and invalidate outstanding continuations.
    fn teardown_table_resources(&mut self) {
        self.epoch += 1;
        if let Some(task) = self.subscription_task.take() {
            task.abort();
        }
        self.expiry_timer = None;
        self.consumer.reset();
        self.table_anchor_ms = None;
    }

    async fn leave_joined(&mut self) {
        let Some(code) = self.joined_code.take() else {
            return;
        };
        // Clearing the join guard lets a later rejoin announce again.
        self.announced_joins.remove(&code);

        if let Some(identity) = self.identity.clone() {
            self.occupancy.leave(&code, &identity).await;
            self.announce_leave(&code, &identity).await;
        }
    }

    async fn announce_join(&mut self, code: &str) {
        let Some(identity) = self.identity.clone() else {
            return;
        };
        if self.announced_joins.contains(code) {
            return;
        }

        let message = self.system_message(&identity, JOIN_ANNOUNCE_TEXT, MessageKind::JoinAnnounce);
        match self.log.append(code, message).await {
            Ok(_) => {
                self.announced_joins.insert(code.to_string());
                self.announced_leaves.remove(code);
            }
            Err(e) => log::warn!("join announcement for table {code} failed (ignored): {e}"),
        }
    }

    async fn announce_leave(&mut self, code: &str, identity: &Identity) {
        if self.announced_leaves.contains(code) {
            return;
        }

        let message = self.system_message(identity, LEAVE_ANNOUNCE_TEXT, MessageKind::LeaveAnnounce);
        match self.log.append(code, message).await {
            Ok(_) => {
                self.announced_leaves.insert(code.to_string());
            }
            Err(e) => log::warn!("leave announcement for table {code} failed (ignored): {e}"),
        }
    }

    fn system_message(&self, identity: &Identity, text: &str, kind: MessageKind) -> ChatMessage {
        ChatMessage {
            text: text.to_string(),
            sender_name: identity.display_name(),
            sender_uid: Some(identity.uid.clone()),
            sender_id: self.session_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
            kind,
        }
    }

    /// Land on Dashboard or Unauthenticated, whichever the current
    /// identity allows. Dashboard entry refreshes the table history.
    async fn land(&mut self) {
        match self.identity.clone() {
            Some(identity) => {
                self.state = PresenceState::Dashboard;
                self.load_history(&identity.uid).await;
            }
            None => {
                self.state = PresenceState::Unauthenticated;
            }
        }
    }

    async fn load_history(&mut self, uid: &str) {
        match self.store.query_by_owner(uid).await {
            Ok(mut tables) => {
                tables.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
                tables.truncate(HISTORY_LIMIT);
                let summaries: Vec<TableSummary> =
                    tables.iter().map(TableSummary::from).collect();
                let _ = self.notices.send(Notice::History(summaries));
            }
            Err(e) => {
                log::warn!("table history load failed: {e}");
                self.notify_error("Unable to load table history right now.");
            }
        }
    }

    fn notify_error(&self, message: &str) {
        let _ = self.notices.send(Notice::Error {
            message: message.to_string(),
        });
    }
}
