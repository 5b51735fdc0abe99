use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    MethodNotAllowed,
    Internal,
}

/// Error body returned to HTTP callers: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn missing_fields() -> Self {
        Self::new(ErrorCode::Validation, MISSING_REQUIRED_FIELDS)
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::Internal, INTERNAL_SERVER_ERROR)
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            error: value.message,
        }
    }
}
