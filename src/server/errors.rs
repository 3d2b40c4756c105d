use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::FaqError;

pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Shape of the JSON error body for an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBody {
    /// `{ "success": false, "error": ... }`
    WithSuccessFlag,
    /// `{ "error": ... }`
    Plain,
}

/// Service error converted at the request boundary
#[derive(Debug)]
pub struct ApiError {
    error: FaqError,
    body: ErrorBody,
}

impl ApiError {
    #[inline]
    pub fn insert(error: FaqError) -> Self {
        Self {
            error,
            body: ErrorBody::WithSuccessFlag,
        }
    }

    #[inline]
    pub fn search(error: FaqError) -> Self {
        Self {
            error,
            body: ErrorBody::Plain,
        }
    }

    #[inline]
    pub fn status_code(&self) -> StatusCode {
        match self.error {
            FaqError::Validation(_) => StatusCode::BAD_REQUEST,
            FaqError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            FaqError::Embedding(_)
            | FaqError::Storage(_)
            | FaqError::Config(_)
            | FaqError::Io(_)
            | FaqError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller
    #[inline]
    pub fn message(&self) -> String {
        match &self.error {
            FaqError::Validation(message)
            | FaqError::Embedding(message)
            | FaqError::Storage(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            FaqError::Timeout(_) => self.error.to_string(),
            _ => UNKNOWN_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.error);
        }

        let message = self.message();
        let body = match self.body {
            ErrorBody::WithSuccessFlag => json!({ "success": false, "error": message }),
            ErrorBody::Plain => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
