use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{BulkUpsertRequest, DeleteQuery, Entry, ListQuery, OkResponse},
    repo_types::NewEntry,
};
use crate::{
    dayclock::DayKey,
    error::ApiError,
    extractors::{AppJson, AppQuery},
    state::AppState,
    tenant::extractors::SyncScope,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries-bulk-upsert", post(bulk_upsert))
        .route("/entries-get-today", get(get_today))
        .route("/entries-delete", delete(delete_entry))
}

/// POST /entries-bulk-upsert { dayKey, items, consumedAt?, source? }
#[instrument(skip_all)]
pub async fn bulk_upsert(
    State(state): State<AppState>,
    SyncScope(tenant): SyncScope,
    AppJson(body): AppJson<BulkUpsertRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let day_key = body.day_key;
    let consumed_at = body.consumed_at.unwrap_or_else(|| state.clock.now());
    let source = body.source.unwrap_or_default();
    let entries: Vec<NewEntry> = body
        .items
        .into_iter()
        .map(|food| NewEntry {
            day_key,
            consumed_at,
            source,
            food,
        })
        .collect();

    let stored = state.store.insert_many(&tenant, entries).await?;
    info!(%day_key, count = stored.len(), "entries stored");
    Ok(Json(OkResponse::OK))
}

/// GET /entries-get-today?dayKey=YYYY-MM-DD
#[instrument(skip(state, tenant))]
pub async fn get_today(
    State(state): State<AppState>,
    SyncScope(tenant): SyncScope,
    AppQuery(q): AppQuery<ListQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let raw = q.day_key.as_deref().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("Missing dayKey".into()));
    }
    let day: DayKey = raw
        .parse()
        .map_err(|e: crate::dayclock::InvalidDayKey| ApiError::BadRequest(e.to_string()))?;

    let rows = state.store.list_by_day(&tenant, day).await?;
    Ok(Json(rows.into_iter().map(Entry::from).collect()))
}

/// DELETE /entries-delete?id=<id>
#[instrument(skip(state, tenant))]
pub async fn delete_entry(
    State(state): State<AppState>,
    SyncScope(tenant): SyncScope,
    AppQuery(q): AppQuery<DeleteQuery>,
) -> Result<Json<OkResponse>, ApiError> {
    let raw = q.id.as_deref().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("Missing id".into()));
    }
    state.store.delete_by_id(&tenant, raw).await?;
    Ok(Json(OkResponse::OK))
}
