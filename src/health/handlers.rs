use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{estimator::EstimatorHealth, state::AppState, store::StoreHealth};

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Which credentials are present, never their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvPresence {
    #[serde(rename = "SUPABASE_URL")]
    pub supabase_url: bool,
    #[serde(rename = "SUPABASE_SERVICE_ROLE_KEY")]
    pub supabase_service_role_key: bool,
    #[serde(rename = "OPENAI_API_KEY")]
    pub openai_api_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub env: EnvPresence,
    pub supabase: StoreHealth,
    pub openai: EstimatorHealth,
}

/// GET /health. Always 200; the body says what is broken.
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let cfg = &state.config;
    let env = EnvPresence {
        supabase_url: cfg.store.supabase_url.is_some(),
        supabase_service_role_key: cfg.store.service_role_key.is_some(),
        openai_api_key: cfg.estimator.api_key.is_some(),
    };
    let supabase = state.store.probe().await;
    let openai = state.estimator.probe().await;
    Json(HealthReport {
        env,
        supabase,
        openai,
    })
}
