//! Free text -> structured nutrition items via a remote language model.

pub mod classify;
pub mod dto;
pub mod error;
pub mod prompt;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::EstimatorConfig;

pub use dto::{ParseResponse, ParsedFood};
pub use error::{AttemptError, EstimationError};
use retry::{AttemptPlan, RetryBudget};

#[async_trait]
pub trait Estimator: Send + Sync {
    async fn parse(&self, text: &str) -> Result<Vec<ParsedFood>, EstimationError>;
    async fn probe(&self) -> EstimatorHealth;
}

/// `openai` section of the health snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatorHealth {
    pub configured_model: String,
    pub attempted_model: String,
    pub fallback_model: String,
    pub ok: bool,
    pub used_fallback: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Responses API client with a primary/fallback model pair.
pub struct OpenAiEstimator {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    fallback_model: String,
}

impl OpenAiEstimator {
    pub fn new(http: reqwest::Client, cfg: &EstimatorConfig) -> Self {
        Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            fallback_model: cfg.fallback_model.clone(),
        }
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    async fn post(&self, body: &Value) -> Result<Value, AttemptError> {
        let key = self.api_key.as_deref().ok_or(AttemptError::MissingApiKey)?;
        let res = self
            .http
            .post(self.responses_url())
            .bearer_auth(key)
            .json(body)
            .send()
            .await?;
        let status = res.status();
        let data = res.json::<Value>().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &data));
        }
        Ok(data)
    }

    async fn attempt(&self, plan: &AttemptPlan, text: &str) -> Result<Vec<ParsedFood>, AttemptError> {
        let body = prompt::parse_request(&plan.model, text, plan.json_only);
        let data = self.post(&body).await?;
        let raw = prompt::extract_output_text(&data).ok_or(AttemptError::NoContent)?;
        Ok(ParseResponse::from_model_output(raw)?.items)
    }

    async fn probe_model(&self, model: &str, key: &str, health: &mut EstimatorHealth) -> bool {
        health.attempted_model = model.to_string();
        let res = match self
            .http
            .post(self.responses_url())
            .bearer_auth(key)
            .json(&prompt::probe_request(model))
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                health.error = Some(e.to_string());
                return false;
            }
        };
        let status = res.status();
        health.status = status.as_u16();
        if !status.is_success() {
            let data = res.json::<Value>().await.unwrap_or(Value::Null);
            health.error = Some(match status_error(status.as_u16(), &data) {
                AttemptError::Status { message, .. } => message,
                other => other.to_string(),
            });
            return false;
        }
        health.ok = true;
        true
    }
}

fn status_error(status: u16, body: &Value) -> AttemptError {
    let field = |pointer: &str, key: &str| {
        body.pointer(pointer)
            .or_else(|| body.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    AttemptError::Status {
        status,
        code: field("/error/code", "code"),
        message: field("/error/message", "message")
            .unwrap_or_else(|| format!("OpenAI error: {status}")),
    }
}

#[async_trait]
impl Estimator for OpenAiEstimator {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn parse(&self, text: &str) -> Result<Vec<ParsedFood>, EstimationError> {
        let mut plan = AttemptPlan::initial(&self.model);
        let mut budget = RetryBudget::default();
        let mut attempts: u8 = 0;
        loop {
            attempts += 1;
            match self.attempt(&plan, text).await {
                Ok(items) => {
                    info!(model = %plan.model, attempts, items = items.len(), "estimate ok");
                    return Ok(items);
                }
                Err(err) => {
                    warn!(model = %plan.model, json_only = plan.json_only, error = %err, "estimate attempt failed");
                    match budget.next(&plan, &err, &self.fallback_model) {
                        Some(next) => plan = next,
                        None => return Err(EstimationError { attempts, last: err }),
                    }
                }
            }
        }
    }

    async fn probe(&self) -> EstimatorHealth {
        let mut health = EstimatorHealth {
            configured_model: self.model.clone(),
            fallback_model: self.fallback_model.clone(),
            ..Default::default()
        };
        let Some(key) = self.api_key.as_deref() else {
            health.error = Some(AttemptError::MissingApiKey.to_string());
            return health;
        };
        if self.probe_model(&self.model, key, &mut health).await {
            return health;
        }
        if self.model != self.fallback_model
            && self.probe_model(&self.fallback_model, key, &mut health).await
        {
            health.used_fallback = true;
        }
        health
    }
}
