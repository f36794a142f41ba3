#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use daylog::{
    app::build_app,
    config::{AppConfig, EstimatorConfig, StoreBackend, StoreConfig},
    dayclock::FixedClock,
    estimator::{AttemptError, EstimationError, Estimator, EstimatorHealth, ParsedFood},
    state::AppState,
    store::{EntryStore, MemoryStore},
};
use time::macros::datetime;

pub const TENANT_A: &str = "tenant-a-0123456789abcdef";
pub const TENANT_B: &str = "tenant-b-0123456789abcdef";

/// Estimator that turns each comma-separated piece of the text into one item.
pub struct FakeEstimator;

#[async_trait]
impl Estimator for FakeEstimator {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedFood>, EstimationError> {
        if text.contains("explode") {
            return Err(EstimationError {
                attempts: 2,
                last: AttemptError::NoContent,
            });
        }
        Ok(text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|piece| ParsedFood {
                item: piece.to_string(),
                qty: 100.0,
                unit: "g".into(),
                calories_kcal: 60.0,
                protein_g: 5.0,
                carbs_g: 7.0,
                fat_g: 1.5,
                assumptions: Some(vec!["typical serving".into()]),
            })
            .collect())
    }

    async fn probe(&self) -> EstimatorHealth {
        EstimatorHealth {
            configured_model: "fake".into(),
            attempted_model: "fake".into(),
            fallback_model: "fake".into(),
            ok: true,
            used_fallback: false,
            status: 200,
            error: None,
        }
    }
}

pub fn test_config(rate_limit_min_interval_ms: u64) -> AppConfig {
    AppConfig {
        store: StoreConfig {
            backend: StoreBackend::Memory,
            supabase_url: None,
            service_role_key: None,
            database_url: None,
            table: "day_entries".into(),
        },
        estimator: EstimatorConfig {
            api_key: None,
            model: "gpt-4.1".into(),
            fallback_model: "gpt-4o".into(),
            base_url: "http://127.0.0.1:9".into(),
        },
        rate_limit_min_interval_ms,
    }
}

pub struct TestApp {
    pub base_url: String,
}

/// Serves the router on an ephemeral port. "Today" is pinned to 2024-01-15
/// in the service's zone.
pub async fn spawn_app_with(
    store: Arc<dyn EntryStore>,
    estimator: Arc<dyn Estimator>,
    rate_limit_min_interval_ms: u64,
) -> TestApp {
    let state = AppState::from_parts(
        Arc::new(test_config(rate_limit_min_interval_ms)),
        store,
        estimator,
        Arc::new(FixedClock(datetime!(2024-01-15 20:00 UTC))),
    );
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{addr}"),
    }
}

pub async fn spawn_app() -> (TestApp, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = spawn_app_with(store.clone(), Arc::new(FakeEstimator), 0).await;
    (app, store)
}
