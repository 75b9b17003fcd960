//! Occupancy transaction manager.
//!
//! Joins and leaves are atomic read-modify-writes of the shared table
//! record; the manager holds no lock and relies on the store's
//! compare-and-swap retry for conflicts. A client's concurrent joins
//! to the same table coalesce onto one in-flight transaction.

use super::errors::{OccupancyError, OccupancyResult};
use crate::auth::Identity;
use crate::store::{self, StoreError, TableStore};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;

type SharedJoin = Shared<BoxFuture<'static, OccupancyResult<usize>>>;

struct InFlightJoin {
    code: String,
    shared: SharedJoin,
}

/// Per-client join/leave coordinator for the shared table record.
pub struct OccupancyManager<S> {
    store: Arc<S>,
    join_in_flight: Mutex<Option<InFlightJoin>>,
}

impl<S> OccupancyManager<S>
where
    S: TableStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            join_in_flight: Mutex::new(None),
        }
    }

    /// Join a table and return the resulting occupant count.
    ///
    /// Authenticated callers run an atomic transaction: insert the uid
    /// into the member set if absent (rejoin never double counts) and
    /// recompute `person_count` from the set. Unauthenticated callers
    /// get a read-only count without mutating anything.
    ///
    /// Rapid repeated joins to the same code share one pending
    /// transaction instead of issuing a second write.
    pub async fn join(
        &self,
        code: &str,
        identity: Option<&Identity>,
    ) -> OccupancyResult<usize> {
        let Some(identity) = identity else {
            return self.fetch_count(code).await;
        };

        let shared = {
            let mut in_flight = self.join_in_flight.lock().await;
            if let Some(pending) = in_flight.as_ref()
                && pending.code == code
            {
                pending.shared.clone()
            } else {
                let shared = Self::join_transaction(
                    Arc::clone(&self.store),
                    code.to_string(),
                    identity.uid.clone(),
                );
                *in_flight = Some(InFlightJoin {
                    code: code.to_string(),
                    shared: shared.clone(),
                });
                shared
            }
        };

        let result = shared.await;

        let mut in_flight = self.join_in_flight.lock().await;
        if in_flight.as_ref().is_some_and(|p| p.code == code) {
            *in_flight = None;
        }

        result
    }

    fn join_transaction(store: Arc<S>, code: String, uid: String) -> SharedJoin {
        async move {
            let table = store::transact(store.as_ref(), &code, |t| {
                let members = t.members_mut();
                if !members.contains(&uid) {
                    members.push(uid.clone());
                }
                let count = members.len() as i64;
                t.person_count = count;
            })
            .await
            .map_err(|e| match e {
                StoreError::NotFound => OccupancyError::TableNotFound,
                other => OccupancyError::Store(other),
            })?;
            Ok(table.occupant_count())
        }
        .boxed()
        .shared()
    }

    /// Remove an identity from a table's member set.
    ///
    /// Best-effort: a stale leave must never block the caller's
    /// navigation, so every failure is logged and swallowed.
    pub async fn leave(&self, code: &str, identity: &Identity) {
        let uid = identity.uid.clone();
        let result = store::transact(self.store.as_ref(), code, |t| {
            let members = t.members_mut();
            members.retain(|id| id != &uid);
            let count = members.len() as i64;
            t.person_count = count;
        })
        .await;

        if let Err(e) = result {
            log::warn!("leave of table {code} failed (ignored): {e}");
        }
    }

    /// Read-only occupant count; a missing table reads as one.
    pub async fn fetch_count(&self, code: &str) -> OccupancyResult<usize> {
        let count = self
            .store
            .get(code)
            .await?
            .map_or(1, |table| table.occupant_count());
        Ok(count)
    }
}
