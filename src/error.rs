use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{estimator::EstimationError, store::StoreError};

/// Everything a handler can answer with besides success. Bodies are short
/// plain-text messages.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing or invalid X-Sync-Key")]
    InvalidTenant,

    #[error("Slow down")]
    RateLimited,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not implemented")]
    NotImplemented,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidTenant | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Estimation(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            tracing::error!(error = %self, "request failed");
            format!("Error: {self}")
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::InvalidTenant.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Store(StoreError::Config("Missing SUPABASE_URL")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::NotImplemented.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn messages() {
        assert_eq!(ApiError::InvalidTenant.to_string(), "Missing or invalid X-Sync-Key");
        assert_eq!(ApiError::RateLimited.to_string(), "Slow down");
        assert_eq!(
            ApiError::Store(StoreError::Status {
                status: 503,
                message: "Supabase select failed: 503".into()
            })
            .to_string(),
            "Supabase select failed: 503"
        );
    }
}
