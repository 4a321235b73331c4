use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::extract::{ApiJson, Authenticated, IdParam};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{
    authorize_level_assignment, authorize_user, authorize_user_delete, normalize_email, AuthError, Role, RoleInput,
    BASELINE_ROLE,
};
use crate::security::Credential;
use crate::storage::{ObjectId, UserRecord};

const MIN_PASSWORD_LEN: usize = 8;

fn check_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::user("invalid_input", "Name is required"));
    }
    Ok(())
}

fn check_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::user("invalid_input", "Invalid email address")),
    }
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::user("invalid_input".to_string(), format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
    }
    Ok(())
}

/// Minimal shape checks for a new account; returns the normalized email.
pub(super) fn check_new_user(name: &str, email: &str, password: &str) -> AppResult<String> {
    check_name(name)?;
    check_password(password)?;
    check_email(email)
}

fn requested_role(input: &RoleInput) -> AppResult<Role> {
    Role::normalize(input).ok_or_else(|| AppError::user("invalid_user_level", "Invalid user level"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub user_level: Option<RoleInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchUserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub user_level: Option<RoleInput>,
}

pub async fn create_user(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserPayload>,
) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, None, Role::Admin, false)?;
    let email = check_new_user(&body.name, &body.email, &body.password)?;
    let role = match &body.user_level {
        Some(input) => requested_role(input)?,
        None => BASELINE_ROLE,
    };
    authorize_level_assignment(&ctx.principal, role.level())?;
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
        user_level: role.level(),
        created_at: now,
        updated_at: now,
    })?;
    info!(target: "taskboard::users", by = %ctx.principal.subject_id, user = %user.id, %role, "user created");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "message": "User created", "user": user }))))
}

pub async fn list_users(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, None, Role::Admin, false)?;
    Ok(Json(json!({ "ok": true, "users": state.store.users.all() })))
}

pub async fn get_user(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, Some(&id), Role::Admin, true)?;
    let user = state.store.users.get(&id).ok_or(AuthError::NotFound("User"))?;
    Ok(Json(json!({ "ok": true, "user": user })))
}

pub async fn patch_user(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PatchUserPayload>,
) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, Some(&id), Role::Admin, true)?;
    let mut user = state.store.users.get(&id).ok_or(AuthError::NotFound("User"))?;

    if let Some(input) = &body.user_level {
        let role = requested_role(input)?;
        authorize_level_assignment(&ctx.principal, role.level())?;
        user.user_level = role.level();
    }
    if let Some(name) = &body.name {
        check_name(name)?;
        user.name = name.trim().to_string();
    }
    if let Some(email) = &body.email {
        user.email = check_email(email)?;
    }
    if let Some(password) = body.password {
        check_password(&password)?;
        user.password_hash = Credential::Plain(password).into_hash(state.hashing()).await.map_err(AuthError::from)?;
    }
    user.updated_at = Utc::now();

    state.store.users.replace(user.clone())?.ok_or(AuthError::NotFound("User"))?;
    info!(target: "taskboard::users", by = %ctx.principal.subject_id, user = %user.id, "user updated");
    Ok(Json(json!({ "ok": true, "message": "User updated", "user": user })))
}

pub async fn delete_user(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, Some(&id), Role::Admin, true)?;
    authorize_user_delete(&ctx.principal, &id)?;
    state.store.users.remove(&id).ok_or(AuthError::NotFound("User"))?;
    info!(target: "taskboard::users", by = %ctx.principal.subject_id, user = %id, "user deleted");

    // A user who deletes themselves also loses the session cookie.
    let headers = if ctx.principal.is(&id) { state.cookies.clear_headers() } else { HeaderMap::new() };
    Ok((headers, Json(json!({ "ok": true, "message": "User deleted" }))))
}

pub async fn user_tasks(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    authorize_user(&*state.store, &ctx.principal, Some(&id), Role::Admin, true)?;
    Ok(Json(json!({ "ok": true, "tasks": state.store.tasks_for_user(&id) })))
}
