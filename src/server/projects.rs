use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::extract::{ApiJson, Authenticated, IdParam};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{authorize_project, AuthError, Role};
use crate::storage::{ObjectId, ProjectRecord};

#[derive(Debug, Deserialize)]
pub struct CreateProjectPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchProjectPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<ObjectId>,
}

fn check_project_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::user("invalid_input", "Project name is required"));
    }
    Ok(name.to_string())
}

/// The caller becomes the owner.
pub async fn create_project(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateProjectPayload>,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let project = state.store.projects.insert(ProjectRecord {
        id: ObjectId::new(),
        name: check_project_name(&body.name)?,
        description: body.description,
        owner_id: ctx.principal.subject_id.clone(),
        created_at: now,
        updated_at: now,
    })?;
    info!(target: "taskboard::projects", owner = %project.owner_id, project = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "message": "Project created", "project": project }))))
}

pub async fn list_projects(Authenticated(_ctx): Authenticated, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(json!({ "ok": true, "projects": state.store.projects.all() })))
}

pub async fn get_project(
    IdParam(id): IdParam,
    Authenticated(_ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let project = state.store.projects.get(&id).ok_or(AuthError::NotFound("Project"))?;
    Ok(Json(json!({ "ok": true, "project": project })))
}

/// Owner or admin. Handing the project to another owner requires that user to exist.
pub async fn patch_project(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PatchProjectPayload>,
) -> AppResult<impl IntoResponse> {
    let mut project = authorize_project(&*state.store, &ctx.principal, &id, Role::Admin)?;

    if let Some(owner) = body.owner {
        if !state.store.users.contains(&owner) {
            return Err(AppError::not_found("not_found", "Owner user not found"));
        }
        project.owner_id = owner;
    }
    if let Some(name) = &body.name {
        project.name = check_project_name(name)?;
    }
    if let Some(description) = body.description {
        project.description = description;
    }
    project.updated_at = Utc::now();

    state.store.projects.replace(project.clone())?.ok_or(AuthError::NotFound("Project"))?;
    info!(target: "taskboard::projects", by = %ctx.principal.subject_id, project = %project.id, owner = %project.owner_id, "project updated");
    Ok(Json(json!({ "ok": true, "message": "Project updated", "project": project })))
}

pub async fn delete_project(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    authorize_project(&*state.store, &ctx.principal, &id, Role::Admin)?;
    state.store.projects.remove(&id).ok_or(AuthError::NotFound("Project"))?;
    info!(target: "taskboard::projects", by = %ctx.principal.subject_id, project = %id, "project deleted");
    Ok(Json(json!({ "ok": true, "message": "Project deleted" })))
}

pub async fn project_tasks(
    IdParam(id): IdParam,
    Authenticated(_ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    if !state.store.projects.contains(&id) {
        return Err(AuthError::NotFound("Project").into());
    }
    Ok(Json(json!({ "ok": true, "tasks": state.store.tasks_for_project(&id) })))
}
