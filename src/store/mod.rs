//! Tenant-scoped persistence for day entries.
//!
//! Every operation takes the tenant key and filters on it; there is no call
//! that can reach another tenant's rows.

pub mod memory;
pub mod postgres;
pub mod postgrest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    dayclock::DayKey,
    entries::repo_types::{EntryRow, NewEntry},
    tenant::TenantKey,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use postgrest::PostgrestStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Config(&'static str),

    /// Built with the request URL stripped; the URL carries the tenant filter.
    #[error("store request failed: {0}")]
    Transport(reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("store returned malformed data: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn transport(e: reqwest::Error) -> Self {
        StoreError::Transport(e.without_url())
    }

    /// HTTP-like status reported by the backend, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Status { status, .. } => Some(*status),
            StoreError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// `supabase` section of the health snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub reachable: bool,
    pub table_exists: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Stores `entries` for `tenant`, assigning ids. Returns the stored rows.
    async fn insert_many(
        &self,
        tenant: &TenantKey,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<EntryRow>, StoreError>;

    /// Rows for `tenant` on `day`, oldest `consumed_at` first.
    async fn list_by_day(&self, tenant: &TenantKey, day: DayKey) -> Result<Vec<EntryRow>, StoreError>;

    /// Deletes the row only if it belongs to `tenant`; a miss is not an error.
    async fn delete_by_id(&self, tenant: &TenantKey, id: &str) -> Result<(), StoreError>;

    /// Deletes `tenant`'s rows with `day_key < cutoff`.
    async fn delete_before(&self, tenant: &TenantKey, cutoff: DayKey) -> Result<(), StoreError>;

    async fn probe(&self) -> StoreHealth;
}
