use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EntryStore, StoreError, StoreHealth};
use crate::{
    dayclock::DayKey,
    entries::repo_types::{EntryRow, NewEntry},
    tenant::TenantKey,
};

/// Process-local store for development and tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<Vec<EntryRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts fully formed rows, bypassing id assignment. Test seeding only.
    pub async fn seed(&self, rows: impl IntoIterator<Item = EntryRow>) {
        self.rows.write().await.extend(rows);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert_many(
        &self,
        tenant: &TenantKey,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<EntryRow>, StoreError> {
        let stored: Vec<EntryRow> = entries.into_iter().map(|e| e.into_row(tenant)).collect();
        self.rows.write().await.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn list_by_day(&self, tenant: &TenantKey, day: DayKey) -> Result<Vec<EntryRow>, StoreError> {
        let mut out: Vec<EntryRow> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|r| &r.sync_key == tenant && r.day_key == day)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.consumed_at);
        Ok(out)
    }

    async fn delete_by_id(&self, tenant: &TenantKey, id: &str) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .retain(|r| !(r.id == id && &r.sync_key == tenant));
        Ok(())
    }

    async fn delete_before(&self, tenant: &TenantKey, cutoff: DayKey) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .retain(|r| !(&r.sync_key == tenant && r.day_key < cutoff));
        Ok(())
    }

    async fn probe(&self) -> StoreHealth {
        StoreHealth {
            reachable: true,
            table_exists: true,
            status: 200,
            error: None,
        }
    }
}
