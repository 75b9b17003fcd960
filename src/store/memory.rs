//! In-memory table store for tests and demos.

use super::errors::{StoreError, StoreResult};
use crate::table::Table;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Versioned {
    version: u64,
    table: Table,
}

/// A [`super::TableStore`] backed by a process-local map.
///
/// Versions start at 1 and bump on every successful swap, giving the
/// same optimistic-concurrency behavior the coordinator relies on
/// from a real backing store.
pub struct MemoryTableStore {
    tables: RwLock<HashMap<String, Versioned>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::TableStore for MemoryTableStore {
    async fn get(&self, code: &str) -> StoreResult<Option<Table>> {
        let tables = self.tables.read().await;
        Ok(tables.get(code).map(|v| v.table.clone()))
    }

    async fn create(&self, table: Table) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&table.code) {
            return Err(StoreError::AlreadyExists);
        }
        tables.insert(
            table.code.clone(),
            Versioned { version: 1, table },
        );
        Ok(())
    }

    async fn load(&self, code: &str) -> StoreResult<Option<(Table, u64)>> {
        let tables = self.tables.read().await;
        Ok(tables.get(code).map(|v| (v.table.clone(), v.version)))
    }

    async fn compare_and_swap(
        &self,
        code: &str,
        expected_version: u64,
        table: Table,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.get_mut(code) {
            Some(entry) if entry.version == expected_version => {
                entry.version += 1;
                entry.table = table;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound),
        }
    }

    async fn query_by_owner(&self, uid: &str) -> StoreResult<Vec<Table>> {
        let tables = self.tables.read().await;
        Ok(tables
            .values()
            .filter(|v| v.table.created_by == uid)
            .map(|v| v.table.clone())
            .collect())
    }
}
