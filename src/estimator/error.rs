use super::classify::is_model_unavailable;

/// Why a single estimator attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Missing OPENAI_API_KEY")]
    MissingApiKey,

    #[error("estimator request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("No content")]
    NoContent,

    #[error("estimator output failed validation: {0}")]
    Schema(#[from] serde_json::Error),
}

impl AttemptError {
    pub fn is_model_unavailable(&self) -> bool {
        match self {
            AttemptError::Status {
                status,
                code,
                message,
            } => is_model_unavailable(*status, code.as_deref(), message),
            _ => false,
        }
    }

    /// Failures a second attempt cannot fix.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AttemptError::MissingApiKey)
    }
}

/// All attempts for one `parse` call are exhausted.
#[derive(Debug, thiserror::Error)]
#[error("estimation failed after {attempts} attempt(s): {last}")]
pub struct EstimationError {
    pub attempts: u8,
    #[source]
    pub last: AttemptError,
}
