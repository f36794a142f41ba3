//! Tenant identity: the opaque sync key every stored row is partitioned by.

pub mod extractors;
pub mod rate_limit;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SYNC_KEY_HEADER: &str = "x-sync-key";
pub const MIN_SYNC_KEY_LEN: usize = 16;

/// Validated sync key. There is no registry: any string of at least
/// [`MIN_SYNC_KEY_LEN`] characters is a tenant.
///
/// The value must never reach a log line, so `Debug` is redacted and there is
/// no `Display`; use [`TenantKey::expose`] only to put it on the wire.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.chars().count() < MIN_SYNC_KEY_LEN {
            return None;
        }
        Some(TenantKey(raw.to_string()))
    }

    /// Fresh random key (UUID v4, 36 chars).
    pub fn generate() -> Self {
        TenantKey(Uuid::new_v4().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TenantKey(..)")
    }
}
