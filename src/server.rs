//!
//! taskboard HTTP server
//! ---------------------
//! This module defines the Axum-based HTTP API for taskboard, mounted under `/api`.
//!
//! Responsibilities:
//! - Session handling with a signed token carried in an HttpOnly cookie.
//! - Register/login/logout endpoints backed by the identity module.
//! - CRUD endpoints for users, projects and tasks, each gated by authentication
//!   and the matching authorization predicate.
//! - First-run bootstrap of an administrator account from configuration.
//! - CORS for the configured frontend origin only, with credentials, so a browser
//!   client on that origin can send and read the session cookie.
//!
//! Handlers take their extractors in a fixed order: path id first (format check),
//! then authentication, then state. Existence and authorization follow inside the
//! handler, in that order.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::{AllowCredentials, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::identity::{normalize_email, CookieOptions, CredentialVerifier, Role, TokenService};
use crate::security::{Credential, PasswordHashing};
use crate::storage::{ObjectId, SharedStore, UserRecord};

pub mod auth;
pub mod extract;
pub mod projects;
pub mod tasks;
pub mod users;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
    pub credentials: Arc<CredentialVerifier>,
    pub cookies: CookieOptions,
    pub frontend_origin: HeaderValue,
}

impl AppState {
    pub fn hashing(&self) -> &Arc<PasswordHashing> { self.credentials.hashing() }
}

/// Build handler state from configuration. Fails when the signing secret is
/// missing or too short, so a misconfigured process never starts serving.
pub fn build_state(cfg: &Config, store: SharedStore) -> anyhow::Result<AppState> {
    cfg.validate()?;
    let tokens = TokenService::from_config(cfg).context("While creating token service")?;
    let hashing = Arc::new(PasswordHashing::new(cfg.hash_cost).context("While configuring password hashing")?);
    let credentials = CredentialVerifier::new(hashing).context("While preparing credential verifier")?;
    let frontend_origin = HeaderValue::from_str(cfg.frontend_origin())
        .with_context(|| format!("Invalid FRONTEND_URL: {}", cfg.frontend_origin()))?;
    Ok(AppState {
        store,
        tokens: Arc::new(tokens),
        credentials: Arc::new(credentials),
        cookies: CookieOptions::from_config(cfg),
        frontend_origin,
    })
}

/// Credentialed CORS for exactly one origin. Other origins get neither an
/// allow-origin nor an allow-credentials header.
fn cors_layer(origin: HeaderValue) -> CorsLayer {
    let allowed = origin.clone();
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(AllowCredentials::predicate(move |o: &HeaderValue, _| *o == allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.frontend_origin.clone());
    let api = Router::new()
        .route("/health", get(|| async { Json(json!({ "ok": true, "status": "Healthy" })) }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/users", post(users::create_user).get(users::list_users))
        .route("/users/{id}", get(users::get_user).patch(users::patch_user).delete(users::delete_user))
        .route("/users/{id}/tasks", get(users::user_tasks))
        .route("/projects", post(projects::create_project).get(projects::list_projects))
        .route("/projects/{id}", get(projects::get_project).patch(projects::patch_project).delete(projects::delete_project))
        .route("/projects/{id}/tasks", get(projects::project_tasks))
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/tasks/{id}", get(tasks::get_task).patch(tasks::patch_task).delete(tasks::delete_task));
    Router::new().nest("/api", api).with_state(state).layer(cors)
}

/// Create the configured administrator unless a user with that email exists.
/// Returns true when an account was created.
pub async fn ensure_default_admin(cfg: &Config, state: &AppState) -> anyhow::Result<bool> {
    let Some(admin) = &cfg.admin else { return Ok(false) };
    let email = normalize_email(&admin.email);
    if state.store.users.find_one(|u| u.email == email).is_some() {
        return Ok(false);
    }
    let password_hash = Credential::Plain(admin.password.clone()).into_hash(state.hashing()).await?;
    let now = Utc::now();
    let user = state.store.users.insert(UserRecord {
        id: ObjectId::new(),
        name: "Administrator".into(),
        email,
        password_hash,
        user_level: Role::Admin.level(),
        created_at: now,
        updated_at: now,
    })?;
    info!(target: "startup", user = %user.id, email = %user.email, "created default administrator");
    Ok(true)
}

/// Start the taskboard HTTP server.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let state = build_state(&cfg, SharedStore::new())?;
    ensure_default_admin(&cfg, &state).await.context("While ensuring default admin")?;

    info!(target: "startup", origin = %cfg.frontend_origin(), "CORS origin");
    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
