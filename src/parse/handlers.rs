use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    error::ApiError,
    estimator::ParseResponse,
    extractors::AppJson,
    state::AppState,
    tenant::extractors::SyncScope,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/parse-text", post(parse_text))
        .route("/parse-label", post(parse_label))
}

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// POST /parse-text { text }
#[instrument(skip_all)]
pub async fn parse_text(
    State(state): State<AppState>,
    SyncScope(_tenant): SyncScope,
    AppJson(body): AppJson<ParseTextRequest>,
) -> Result<Json<ParseResponse>, ApiError> {
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest("Bad input".into()));
    }

    let items = state.estimator.parse(&text).await?;
    info!(items = items.len(), "text parsed");
    Ok(Json(ParseResponse { items }))
}

/// POST /parse-label. Label photo parsing is not available yet; the tenant
/// checks still apply.
#[instrument(skip_all)]
pub async fn parse_label(SyncScope(_tenant): SyncScope) -> Result<Json<ParseResponse>, ApiError> {
    Err(ApiError::NotImplemented)
}
