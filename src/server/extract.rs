//! Request extractors shared by the handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::AppState;
use crate::error::AppError;
use crate::identity::{authenticate, RequestContext};
use crate::storage::ObjectId;

/// The `{id}` path segment, checked for object id format before anything else runs.
#[derive(Debug, Clone)]
pub struct IdParam(pub ObjectId);

impl<S: Send + Sync> FromRequestParts<S> for IdParam {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::user("invalid_id", "Invalid ID parameter"))?;
        ObjectId::parse(&raw).map(IdParam).ok_or_else(|| AppError::user("invalid_id", "Invalid ID parameter"))
    }
}

/// A request that passed the authentication gate.
#[derive(Debug, Clone)]
pub struct Authenticated(pub RequestContext);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = authenticate(&parts.headers, &state.tokens, &*state.store)?;
        let ctx = RequestContext::new(principal);
        debug!(target: "taskboard::auth", request = %ctx.request_id, subject = %ctx.principal.subject_id, role = %ctx.principal.role, "request authenticated");
        Ok(Authenticated(ctx))
    }
}

/// JSON body whose rejections use the API error shape.
pub struct ApiJson<T>(pub T);

impl<S: Send + Sync, T: DeserializeOwned + Send> FromRequest<S> for ApiJson<T> {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(v)) => Ok(ApiJson(v)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::user("invalid_input", "Expected a JSON body")),
            Err(e) => Err(AppError::user("invalid_input".to_string(), format!("Invalid input: {}", e.body_text()))),
        }
    }
}
