//! Persistent table store boundary.
//!
//! The store is an external collaborator: this crate only assumes a
//! keyed record space with a versioned read and a compare-and-swap
//! write. [`transact`] layers the bounded optimistic retry loop every
//! multi-writer mutation goes through; [`MemoryTableStore`] implements
//! the boundary in-process for tests.

pub mod errors;
pub mod memory;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryTableStore;

use crate::constants::{MAX_TRANSACT_ATTEMPTS, TRANSACT_BACKOFF_BASE};
use crate::table::Table;
use async_trait::async_trait;

/// External table record store.
///
/// All mutation of a table record must go through [`transact`]; `get`
/// and `query_by_owner` are read-only.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch a table record by code.
    async fn get(&self, code: &str) -> StoreResult<Option<Table>>;

    /// Create a table record under its code.
    ///
    /// Not atomic against a concurrent create of the same code: callers
    /// check uniqueness first with `get`, and two near-simultaneous
    /// creators can still collide. This is a known gap carried from the
    /// original design; close it with a create-if-absent primitive if
    /// the backing store grows one.
    async fn create(&self, table: Table) -> StoreResult<()>;

    /// Fetch a table record along with its version for a subsequent
    /// [`TableStore::compare_and_swap`].
    async fn load(&self, code: &str) -> StoreResult<Option<(Table, u64)>>;

    /// Replace the record if its version is still `expected_version`.
    /// Returns `false` on conflict without writing anything.
    async fn compare_and_swap(
        &self,
        code: &str,
        expected_version: u64,
        table: Table,
    ) -> StoreResult<bool>;

    /// All tables created by an identity, in no particular order.
    async fn query_by_owner(&self, uid: &str) -> StoreResult<Vec<Table>>;
}

/// Atomic read-modify-write with a bounded optimistic retry budget.
///
/// Loads the current record, applies `apply`, and commits with
/// compare-and-swap; on conflict, retries with exponential backoff.
/// There is no observable partial update: a lost race leaves the
/// record untouched and the loop starts over from a fresh read.
///
/// # Errors
///
/// * `StoreError::NotFound` if no record exists for `code`
/// * `StoreError::TransactionConflict` once the retry budget is spent
pub async fn transact<S, F>(store: &S, code: &str, mut apply: F) -> StoreResult<Table>
where
    S: TableStore + ?Sized,
    F: FnMut(&mut Table) + Send,
{
    for attempt in 0..MAX_TRANSACT_ATTEMPTS {
        let Some((mut table, version)) = store.load(code).await? else {
            return Err(StoreError::NotFound);
        };

        apply(&mut table);

        if store
            .compare_and_swap(code, version, table.clone())
            .await?
        {
            return Ok(table);
        }

        log::debug!("transaction conflict on table {code}, attempt {}", attempt + 1);
        if attempt + 1 < MAX_TRANSACT_ATTEMPTS {
            tokio::time::sleep(TRANSACT_BACKOFF_BASE * 2u32.pow(attempt)).await;
        }
    }

    Err(StoreError::TransactionConflict {
        attempts: MAX_TRANSACT_ATTEMPTS,
    })
}
