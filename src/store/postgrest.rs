//! Entries table behind a Supabase/PostgREST endpoint.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::{EntryStore, StoreError, StoreHealth};
use crate::{
    config::StoreConfig,
    dayclock::DayKey,
    entries::repo_types::{EntryRow, NewEntry},
    tenant::TenantKey,
};

pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: Option<String>,
    service_key: Option<String>,
    table: String,
}

impl PostgrestStore {
    pub fn new(http: reqwest::Client, cfg: &StoreConfig) -> Self {
        Self {
            http,
            base_url: cfg
                .supabase_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            service_key: cfg.service_role_key.clone(),
            table: cfg.table.clone(),
        }
    }

    fn request(&self, method: Method, query: &[(&str, String)]) -> Result<RequestBuilder, StoreError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(StoreError::Config("Missing SUPABASE_URL"))?;
        let key = self
            .service_key
            .as_deref()
            .ok_or(StoreError::Config("Missing SUPABASE_SERVICE_ROLE_KEY"))?;
        Ok(self
            .http
            .request(method, format!("{base}/rest/v1/{}", self.table))
            .query(query)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=representation"))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn ensure_success(res: Response, op: &str) -> Result<Response, StoreError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    debug!(%status, op, "postgrest call failed");
    Err(StoreError::Status {
        status: status.as_u16(),
        message: format!("Supabase {op} failed: {}", status.as_u16()),
    })
}

async fn send(req: RequestBuilder) -> Result<Response, StoreError> {
    req.send().await.map_err(StoreError::transport)
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, StoreError> {
    let bytes = res.bytes().await.map_err(StoreError::transport)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl EntryStore for PostgrestStore {
    async fn insert_many(
        &self,
        tenant: &TenantKey,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<EntryRow>, StoreError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<EntryRow> = entries.into_iter().map(|e| e.into_row(tenant)).collect();
        // one POST with the whole array; PostgREST runs it as a single statement
        let res = send(self.request(Method::POST, &[])?.json(&rows)).await?;
        decode(ensure_success(res, "insert")?).await
    }

    async fn list_by_day(&self, tenant: &TenantKey, day: DayKey) -> Result<Vec<EntryRow>, StoreError> {
        let query = [
            ("select", "*".to_string()),
            ("sync_key", eq(tenant.expose())),
            ("day_key", eq(day)),
            ("order", "consumed_at.asc".to_string()),
        ];
        let res = send(self.request(Method::GET, &query)?).await?;
        decode(ensure_success(res, "select")?).await
    }

    async fn delete_by_id(&self, tenant: &TenantKey, id: &str) -> Result<(), StoreError> {
        let query = [("id", eq(id)), ("sync_key", eq(tenant.expose()))];
        let res = send(self.request(Method::DELETE, &query)?).await?;
        ensure_success(res, "delete")?;
        Ok(())
    }

    async fn delete_before(&self, tenant: &TenantKey, cutoff: DayKey) -> Result<(), StoreError> {
        let query = [
            ("sync_key", eq(tenant.expose())),
            ("day_key", format!("lt.{cutoff}")),
        ];
        let res = send(self.request(Method::DELETE, &query)?).await?;
        ensure_success(res, "delete")?;
        Ok(())
    }

    async fn probe(&self) -> StoreHealth {
        let mut health = StoreHealth::default();
        let query = [("select", "id".to_string()), ("limit", "1".to_string())];
        let req = match self.request(Method::GET, &query) {
            Ok(req) => req,
            Err(e) => {
                health.error = Some(e.to_string());
                return health;
            }
        };
        let res = match send(req).await {
            Ok(res) => res,
            Err(e) => {
                health.error = Some(e.to_string());
                return health;
            }
        };
        let status = res.status();
        health.status = status.as_u16();
        if status.is_success() {
            health.reachable = true;
            health.table_exists = true;
            return health;
        }
        // 404 from PostgREST: project is up, table is not
        health.reachable = status.as_u16() == 404;
        let text = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(text);
        health.error = Some(message);
        health
    }
}
