use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::tenant::rate_limit::DEFAULT_MIN_INTERVAL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgrest,
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(StoreBackend::Postgrest),
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("unknown STORE_BACKEND {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub supabase_url: Option<String>,
    pub service_role_key: Option<String>,
    pub database_url: Option<String>,
    pub table: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub fallback_model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub estimator: EstimatorConfig,
    pub rate_limit_min_interval_ms: u64,
}

/// Unset and blank both mean "not configured".
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Missing credentials are not an error here: health reports them and
    /// the operations that need them fail when called.
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match non_empty_var("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Postgrest,
        };
        let store = StoreConfig {
            backend,
            supabase_url: non_empty_var("SUPABASE_URL"),
            service_role_key: non_empty_var("SUPABASE_SERVICE_ROLE_KEY"),
            database_url: non_empty_var("DATABASE_URL"),
            table: non_empty_var("ENTRIES_TABLE").unwrap_or_else(|| "day_entries".into()),
        };
        let estimator = EstimatorConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            model: non_empty_var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4.1".into()),
            fallback_model: non_empty_var("OPENAI_FALLBACK_MODEL")
                .unwrap_or_else(|| "gpt-4o".into()),
            base_url: non_empty_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into()),
        };
        let rate_limit_min_interval_ms = match non_empty_var("RATE_LIMIT_MIN_INTERVAL_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("RATE_LIMIT_MIN_INTERVAL_MS must be an integer")?,
            None => DEFAULT_MIN_INTERVAL.as_millis() as u64,
        };
        Ok(Self {
            store,
            estimator,
            rate_limit_min_interval_ms,
        })
    }

    pub fn rate_limit_min_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_min_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("postgrest".parse::<StoreBackend>().unwrap(), StoreBackend::Postgrest);
        assert_eq!("Supabase".parse::<StoreBackend>().unwrap(), StoreBackend::Postgrest);
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn interval_in_millis() {
        let cfg = AppConfig {
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
                base_url: "http://localhost".into(),
            },
            rate_limit_min_interval_ms: 150,
        };
        assert_eq!(cfg.rate_limit_min_interval(), Duration::from_millis(150));
    }
}
