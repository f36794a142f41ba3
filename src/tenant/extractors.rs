use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{TenantKey, SYNC_KEY_HEADER};
use crate::{entries::hygiene, error::ApiError, state::AppState};

/// Admits a tenant-scoped request: validates `X-Sync-Key`, applies the
/// per-tenant rate limit, then runs the retention sweep for that tenant.
///
/// Body/query extractors run after this one, so shape errors are reported
/// only for requests that got this far.
pub struct SyncScope(pub TenantKey);

#[async_trait]
impl FromRequestParts<AppState> for SyncScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .headers
            .get(SYNC_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(TenantKey::parse)
            .ok_or(ApiError::InvalidTenant)?;

        if !state.limiter.check(&tenant) {
            return Err(ApiError::RateLimited);
        }

        if let Err(e) = hygiene::purge(state.store.as_ref(), &tenant, state.clock.today()).await {
            warn!(error = %e, "retention sweep failed; continuing");
        }

        Ok(SyncScope(tenant))
    }
}
