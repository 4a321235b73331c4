use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::extract::ApiJson;
use super::users::check_new_user;
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{AuthError, LoginRequest, Role, SessionClaim};
use crate::security::Credential;
use crate::storage::{ObjectId, UserRecord};

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub(super) fn session_headers(state: &AppState, token: &str) -> AppResult<HeaderMap> {
    state.cookies.set_headers(token).map_err(|e| AppError::internal("cookie_error".to_string(), e.to_string()))
}

/// Self-service sign-up. The account always starts at the baseline role,
/// whatever the payload says.
pub async fn register(State(state): State<AppState>, ApiJson(body): ApiJson<RegisterPayload>) -> AppResult<impl IntoResponse> {
    let email = check_new_user(&body.name, &body.email, &body.password)?;
    if state.store.users.find_one(|u| u.email == email).is_some() {
        return Err(AppError::conflict("user_exists", "User already exists"));
    }
    let password_hash = Credential::Plain(body.password).into_hash(state.hashing()).await.map_err(AuthError::from)?;
    let now = Utc::now();
    let user = state.store.users.insert(UserRecord {
        id: ObjectId::new(),
        name: body.name.trim().to_string(),
        email,
        password_hash,
        user_level: Role::Developer.level(),
        created_at: now,
        updated_at: now,
    })?;

    let token = state
        .tokens
        .issue(&SessionClaim { subject_id: user.id.clone(), role: Role::Developer })
        .map_err(AuthError::from)?;
    info!(target: "taskboard::auth", user = %user.id, "user registered");
    let headers = session_headers(&state, &token)?;
    Ok((StatusCode::CREATED, headers, Json(json!({ "ok": true, "message": "User registered", "user": user }))))
}

/// Any failure clears the session cookie, so a stale token never outlives a bad login.
pub async fn login(State(state): State<AppState>, body: Result<ApiJson<LoginRequest>, AppError>) -> Response {
    let req = match body {
        Ok(ApiJson(req)) => req,
        Err(e) => return (state.cookies.clear_headers(), e).into_response(),
    };
    let res = match state.credentials.login(&*state.store, &state.tokens, &req).await {
        Ok(res) => res,
        Err(e) => return (state.cookies.clear_headers(), AppError::from(e)).into_response(),
    };
    match session_headers(&state, &res.token) {
        Ok(headers) => (headers, Json(json!({ "ok": true, "message": "Logged in successfully", "user": res.user }))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (state.cookies.clear_headers(), Json(json!({ "ok": true, "message": "Logged out successfully" })))
}
