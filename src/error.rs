//! Unified relay error model and mapping helpers.
//! Every relay handler resolves its failures into an `AppError`, which renders as the
//! `{success:false, message}` body the browser expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Message returned for transport and parse failures. Upstream detail is never leaked.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    /// Failure reported by upstream; its status is surfaced as-is.
    Upstream { code: String, message: String, status: u16 },
    Config { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Upstream { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Upstream { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn upstream<S: Into<String>>(code: S, msg: S, status: u16) -> Self { AppError::Upstream { code: code.into(), message: msg.into(), status } }
    pub fn config<S: Into<String>>(code: S, msg: S) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S) -> Self { AppError::Internal { code: code.into(), message: INTERNAL_MESSAGE.to_string() } }

    /// 401 used whenever neither an Authorization header nor a token cookie is present.
    pub fn missing_credential() -> Self { Self::auth("missing_credential", "Authorization header required") }

    /// 400 for upload requests without a usable `file` part.
    pub fn missing_file() -> Self { Self::user("missing_file", "No image file provided") }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Upstream { status, .. } => *status,
            AppError::Config { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }

    /// Browser-facing JSON body.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "success": false, "message": self.message() })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(target: "relay", "upstream transport failure: {}", err);
        AppError::internal("upstream_transport")
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(target: "relay", "json decode failure: {}", err);
        AppError::internal("json_decode")
    }
}
