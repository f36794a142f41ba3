use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::{AppConfig, StoreBackend},
    dayclock::{Clock, SystemClock},
    estimator::{Estimator, OpenAiEstimator},
    store::{EntryStore, MemoryStore, PgStore, PostgrestStore},
    tenant::rate_limit::RateLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn EntryStore>,
    pub estimator: Arc<dyn Estimator>,
    pub limiter: Arc<RateLimiter>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let http = reqwest::Client::builder()
            .user_agent(concat!("daylog/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;

        let store: Arc<dyn EntryStore> = match config.store.backend {
            StoreBackend::Postgrest => Arc::new(PostgrestStore::new(http.clone(), &config.store)),
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required when STORE_BACKEND=postgres")?;
                let pg = PgStore::connect_lazy(url, &config.store.table)?;
                if let Err(e) = pg.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::info!(backend = ?config.store.backend, table = %config.store.table, "entry store ready");

        let estimator = Arc::new(OpenAiEstimator::new(http, &config.estimator)) as Arc<dyn Estimator>;

        Ok(Self::from_parts(config, store, estimator, Arc::new(SystemClock)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn EntryStore>,
        estimator: Arc<dyn Estimator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit_min_interval()));
        Self {
            config,
            store,
            estimator,
            limiter,
            clock,
        }
    }
}
