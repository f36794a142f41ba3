//! Retention sweep run ahead of every tenant-scoped request.

use crate::{
    dayclock::DayKey,
    store::{EntryStore, StoreError},
    tenant::TenantKey,
};

/// Days before today that are still kept.
pub const RETENTION_DAYS: i64 = 2;

/// Oldest day that survives a sweep run on `today`.
pub fn retention_cutoff(today: DayKey) -> DayKey {
    today.shift(-RETENTION_DAYS)
}

/// Deletes `tenant`'s rows older than the retention cutoff.
///
/// Callers discard the error; it is returned so that discarding it is
/// visible at the call site.
pub async fn purge(store: &dyn EntryStore, tenant: &TenantKey, today: DayKey) -> Result<(), StoreError> {
    store.delete_before(tenant, retention_cutoff(today)).await
}
