//! Unified application error model and HTTP mapping.
//! Library layers raise their own `thiserror` enums; handlers convert them into
//! `AppError`, which renders as `{ "ok": false, "code": ..., "message": ... }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::identity::{AuthError, Unauthenticated};
use crate::storage::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Unauthenticated { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn unauthenticated<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthenticated { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Unauthenticated { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Internal { .. } => 500,
        }
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
        let body = serde_json::json!({ "ok": false, "code": self.code_str(), "message": self.message() });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, .. } => AppError::Conflict {
                code: "duplicate_key".into(),
                message: format!("Duplicate field: {}", field),
            },
            StoreError::Unavailable(_) => AppError::internal("store_unavailable", "Internal server error"),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            // Only transport-level causes and expiry are told apart; everything else
            // (bad signature, deleted subject, broken role) reads the same from outside.
            AuthError::Unauthenticated(reason) => match reason {
                Unauthenticated::MissingTransport => AppError::unauthenticated("missing_transport", "Not authenticated, missing cookies"),
                Unauthenticated::MissingToken => AppError::unauthenticated("missing_token", "Not authenticated, missing token"),
                Unauthenticated::Expired => AppError::unauthenticated("token_expired", "Session expired, please log in again"),
                _ => AppError::unauthenticated("unauthenticated", "Not authenticated"),
            },
            AuthError::InvalidCredentials => AppError::unauthenticated("invalid_credentials", "Invalid credentials"),
            AuthError::Forbidden(reason) => AppError::Forbidden { code: "forbidden".into(), message: reason },
            AuthError::NotFound(what) => AppError::NotFound { code: "not_found".into(), message: format!("{} not found", what) },
            AuthError::Store(e) => AppError::from(e),
            AuthError::Token(e) => AppError::internal("token_error".to_string(), e.to_string()),
            AuthError::Hashing(msg) => AppError::internal("hashing_error".to_string(), msg),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
