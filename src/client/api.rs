use reqwest::Response;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use crate::{
    dayclock::DayKey,
    entries::dto::{BulkUpsertRequest, Entry, OkResponse},
    estimator::{ParseResponse, ParsedFood},
    health::handlers::HealthReport,
    tenant::{TenantKey, SYNC_KEY_HEADER},
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

async fn handle_response_error(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(res)
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let res = handle_response_error(res).await?;
    Ok(res.json::<T>().await?)
}

/// Calls the service on behalf of one device; every request carries the
/// device's sync key.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    key: TenantKey,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, key: TenantKey) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, key)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>, key: TenantKey) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, key }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(SYNC_KEY_HEADER, self.key.expose())
    }

    pub async fn parse_text(&self, text: &str) -> Result<ParseResponse, ClientError> {
        let res = self
            .request(reqwest::Method::POST, "/parse-text")
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn bulk_upsert(
        &self,
        day_key: DayKey,
        items: Vec<ParsedFood>,
        consumed_at: Option<OffsetDateTime>,
    ) -> Result<OkResponse, ClientError> {
        let body = BulkUpsertRequest {
            day_key,
            items,
            consumed_at,
            source: None,
        };
        let res = self
            .request(reqwest::Method::POST, "/entries-bulk-upsert")
            .json(&body)
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn get_entries(&self, day_key: DayKey) -> Result<Vec<Entry>, ClientError> {
        let res = self
            .request(reqwest::Method::GET, "/entries-get-today")
            .query(&[("dayKey", day_key.to_string())])
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn delete_entry(&self, id: &str) -> Result<OkResponse, ClientError> {
        let res = self
            .request(reqwest::Method::DELETE, "/entries-delete")
            .query(&[("id", id)])
            .send()
            .await?;
        read_json(res).await
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let res = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        read_json(res).await
    }
}
