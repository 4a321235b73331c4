use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::extract::{ApiJson, Authenticated, IdParam};
use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::AuthError;
use crate::storage::{ObjectId, Store, TaskRecord, TaskStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub assigned_to: Option<ObjectId>,
    pub project: Option<ObjectId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<ObjectId>,
    pub project: Option<ObjectId>,
}

fn check_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::user("invalid_input", "Task title is required"));
    }
    Ok(title.to_string())
}

fn check_references(store: &Store, assigned_to: Option<&ObjectId>, project: Option<&ObjectId>) -> AppResult<()> {
    if let Some(user) = assigned_to {
        if !store.users.contains(user) {
            return Err(AppError::not_found("not_found", "assignedTo user not found"));
        }
    }
    if let Some(project) = project {
        if !store.projects.contains(project) {
            return Err(AppError::not_found("not_found", "Project not found"));
        }
    }
    Ok(())
}

/// Move a task to `status`. Entering `done` records who finished it and when;
/// leaving `done` clears both.
fn apply_status(task: &mut TaskRecord, status: TaskStatus, by: &ObjectId, now: DateTime<Utc>) {
    match (task.status == TaskStatus::Done, status == TaskStatus::Done) {
        (false, true) => {
            task.finished_by = Some(by.clone());
            task.finished_at = Some(now);
        }
        (true, false) => {
            task.finished_by = None;
            task.finished_at = None;
        }
        _ => {}
    }
    task.status = status;
}

pub async fn create_task(
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTaskPayload>,
) -> AppResult<impl IntoResponse> {
    let title = check_title(&body.title)?;
    check_references(&state.store, body.assigned_to.as_ref(), body.project.as_ref())?;

    let now = Utc::now();
    let mut task = TaskRecord {
        id: ObjectId::new(),
        title,
        description: body.description,
        status: TaskStatus::ToDo,
        assigned_to: body.assigned_to,
        project: body.project,
        finished_by: None,
        finished_at: None,
        created_at: now,
        updated_at: now,
    };
    apply_status(&mut task, body.status, &ctx.principal.subject_id, now);
    let task = state.store.tasks.insert(task)?;
    info!(target: "taskboard::tasks", by = %ctx.principal.subject_id, task = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "message": "Task created", "task": task }))))
}

pub async fn list_tasks(Authenticated(_ctx): Authenticated, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(json!({ "ok": true, "tasks": state.store.tasks.all() })))
}

pub async fn get_task(
    IdParam(id): IdParam,
    Authenticated(_ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let task = state.store.tasks.get(&id).ok_or(AuthError::NotFound("Task"))?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

pub async fn patch_task(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PatchTaskPayload>,
) -> AppResult<impl IntoResponse> {
    let mut task = state.store.tasks.get(&id).ok_or(AuthError::NotFound("Task"))?;
    check_references(&state.store, body.assigned_to.as_ref(), body.project.as_ref())?;

    let now = Utc::now();
    if let Some(title) = &body.title {
        task.title = check_title(title)?;
    }
    if let Some(description) = body.description {
        task.description = description;
    }
    if let Some(user) = body.assigned_to {
        task.assigned_to = Some(user);
    }
    if let Some(project) = body.project {
        task.project = Some(project);
    }
    if let Some(status) = body.status {
        apply_status(&mut task, status, &ctx.principal.subject_id, now);
    }
    task.updated_at = now;

    state.store.tasks.replace(task.clone())?.ok_or(AuthError::NotFound("Task"))?;
    info!(target: "taskboard::tasks", by = %ctx.principal.subject_id, task = %task.id, status = ?task.status, "task updated");
    Ok(Json(json!({ "ok": true, "message": "Task updated", "task": task })))
}

pub async fn delete_task(
    IdParam(id): IdParam,
    Authenticated(ctx): Authenticated,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.store.tasks.remove(&id).ok_or(AuthError::NotFound("Task"))?;
    info!(target: "taskboard::tasks", by = %ctx.principal.subject_id, task = %id, "task deleted");
    Ok(Json(json!({ "ok": true, "message": "Task deleted" })))
}
