//! API error types.
//!
//! Every failure a handler can produce collapses into one of four client
//! outcomes: a validation rejection (400), an authorization rejection
//! (401), a missing resource (404) or a failure that is either ours (500)
//! or an upstream service's (502). The response body always carries an
//! `error` field with a human-readable message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A required service is not configured on this deployment.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An upstream service failed or returned garbage.
    #[error("Upstream error: {message}")]
    Upstream {
        /// HTTP status the upstream replied with, when one arrived
        status: Option<u16>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] shorts_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] shorts_media::MediaError),

    #[error("Project store error: {0}")]
    Store(#[from] shorts_project::StoreError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn upstream(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: msg.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(shorts_storage::StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Config(_)
            | ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Media(_)
            | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message for the response body, without the variant prefix.
    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Config(m)
            | ApiError::Internal(m) => m.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::Storage(e) => e.to_string(),
            ApiError::Media(e) => e.to_string(),
            ApiError::Store(e) => e.to_string(),
        }
    }
}

impl From<shorts_render::RenderError> for ApiError {
    fn from(e: shorts_render::RenderError) -> Self {
        use shorts_render::RenderError;
        match e {
            RenderError::NotConfigured(msg) => ApiError::Config(msg),
            RenderError::Upstream { status, message } => ApiError::Upstream {
                status: Some(status),
                message,
            },
            RenderError::InvalidResponse(msg) => ApiError::Upstream {
                status: None,
                message: msg,
            },
            RenderError::Network(e) => ApiError::Upstream {
                status: None,
                message: e.to_string(),
            },
            RenderError::Json(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let error = match &self {
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Media(_)
            | ApiError::Store(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
                    && status == StatusCode::INTERNAL_SERVER_ERROR
                {
                    "An internal error occurred".to_string()
                } else {
                    self.message()
                }
            }
            _ => self.message(),
        };

        let body = ErrorResponse { error, code: None };

        (status, Json(body)).into_response()
    }
}
