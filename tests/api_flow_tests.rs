//! End-to-end tests for the HTTP API: sessions, role gates and ownership rules,
//! driven in-process through the router.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use taskboard::config::{AdminBootstrap, Config, HashCost};
use taskboard::identity::{Role, SessionClaim};
use taskboard::server::{build_state, ensure_default_admin, router, AppState};
use taskboard::storage::{ObjectId, SharedStore};

const SECRET: &str = "integration-secret-integration-secret";
const ADMIN_EMAIL: &str = "admin@taskboard.test";
const ADMIN_PASSWORD: &str = "admin-password";

struct Harness {
    app: Router,
    state: AppState,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl Reply {
    /// `token=<value>` from the Set-Cookie header, ready to send back.
    fn session_cookie(&self) -> Option<String> {
        let raw = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
        let pair = raw.split(';').next()?.trim();
        (pair.len() > "token=".len()).then(|| pair.to_string())
    }

    fn clears_cookie(&self) -> bool {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("token=;") && v.contains("Max-Age=0"))
    }

    fn code(&self) -> &str { self.body["code"].as_str().unwrap_or_default() }

    fn id(&self, key: &str) -> String { self.body[key]["_id"].as_str().unwrap_or_default().to_string() }
}

async fn harness() -> Result<Harness> {
    let mut cfg = Config::with_secret(SECRET);
    cfg.hash_cost = HashCost { memory_kib: 1024, iterations: 1, parallelism: 1 };
    cfg.admin = Some(AdminBootstrap { email: ADMIN_EMAIL.into(), password: ADMIN_PASSWORD.into() });
    let state = build_state(&cfg, SharedStore::new())?;
    assert!(ensure_default_admin(&cfg, &state).await?);
    assert!(!ensure_default_admin(&cfg, &state).await?);
    Ok(Harness { app: router(state.clone()), state })
}

impl Harness {
    async fn send(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Result<Reply> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        let req = match body {
            Some(v) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
            None => req.body(Body::empty())?,
        };
        let res = self.app.clone().oneshot(req).await?;
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok(Reply { status, headers, body })
    }

    async fn register(&self, name: &str, email: &str) -> Result<(String, String)> {
        let r = self
            .send(Method::POST, "/api/auth/register", None, Some(json!({ "name": name, "email": email, "password": "password123" })))
            .await?;
        assert_eq!(r.status, StatusCode::CREATED, "{:?}", r.body);
        let cookie = r.session_cookie().expect("register sets the session cookie");
        Ok((r.id("user"), cookie))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Reply> {
        self.send(Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": password }))).await
    }

    async fn admin_cookie(&self) -> Result<String> {
        let r = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
        assert_eq!(r.status, StatusCode::OK);
        Ok(r.session_cookie().expect("login sets the session cookie"))
    }
}

#[tokio::test]
async fn developer_session_lifecycle() -> Result<()> {
    let h = harness().await?;
    let (id, _) = h.register("Dev", "dev@example.com").await?;

    let login = h.login("Dev@Example.com", "password123").await?;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["userLevel"], json!(10));
    assert!(login.body["user"].get("passwordHash").is_none());
    let cookie = login.session_cookie().expect("cookie");

    let r = h.send(Method::GET, "/api/projects", Some(&cookie), None).await?;
    assert_eq!(r.status, StatusCode::OK);
    let r = h.send(Method::GET, &format!("/api/users/{}", id), Some(&cookie), None).await?;
    assert_eq!(r.status, StatusCode::OK);

    let r = h.send(Method::GET, "/api/users", Some(&cookie), None).await?;
    assert_eq!(r.status, StatusCode::FORBIDDEN);

    // A session issued more than one lifetime ago.
    let claim = SessionClaim { subject_id: ObjectId::parse(&id).expect("id"), role: Role::Developer };
    let stale = h.state.tokens.issue_at(&claim, chrono::Utc::now().timestamp() - 3600 - 10)?;
    let r = h.send(Method::GET, "/api/projects", Some(&format!("token={}", stale)), None).await?;
    assert_eq!(r.status, StatusCode::UNAUTHORIZED);
    assert_eq!(r.code(), "token_expired");
    Ok(())
}

#[tokio::test]
async fn transport_and_id_checks_come_first() -> Result<()> {
    let h = harness().await?;
    let r = h.send(Method::GET, "/api/projects", None, None).await?;
    assert_eq!((r.status, r.code()), (StatusCode::UNAUTHORIZED, "missing_transport"));
    let r = h.send(Method::GET, "/api/projects", Some("theme=dark"), None).await?;
    assert_eq!((r.status, r.code()), (StatusCode::UNAUTHORIZED, "missing_token"));
    let r = h.send(Method::GET, "/api/projects", Some("token=garbage"), None).await?;
    assert_eq!((r.status, r.code()), (StatusCode::UNAUTHORIZED, "unauthenticated"));

    // Id format is rejected before authentication is attempted.
    let r = h.send(Method::GET, "/api/users/not-an-id", None, None).await?;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_failures_are_uniform_and_clear_the_cookie() -> Result<()> {
    let h = harness().await?;
    h.register("Real", "real@x.com").await?;

    let unknown = h.login("nonexistent@x.com", "anything").await?;
    let wrong = h.login("real@x.com", "wrongpassword").await?;
    for r in [&unknown, &wrong] {
        assert_eq!(r.status, StatusCode::UNAUTHORIZED);
        assert_eq!(r.code(), "invalid_credentials");
        assert!(r.clears_cookie());
    }
    assert_eq!(unknown.body, wrong.body);

    let dup = h
        .send(Method::POST, "/api/auth/register", None, Some(json!({ "name": "Again", "email": "REAL@x.com", "password": "password123" })))
        .await?;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let out = h.send(Method::POST, "/api/auth/logout", None, None).await?;
    assert!(out.clears_cookie());
    Ok(())
}

#[tokio::test]
async fn registration_cannot_pick_a_role() -> Result<()> {
    let h = harness().await?;
    let r = h
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Sneaky", "email": "sneaky@x.com", "password": "password123", "userLevel": "ADMIN" })),
        )
        .await?;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["user"]["userLevel"], json!(10));
    Ok(())
}

#[tokio::test]
async fn project_owner_or_admin_may_modify() -> Result<()> {
    let h = harness().await?;
    let (owner_id, owner) = h.register("Owner", "owner@x.com").await?;
    let (_, other) = h.register("Other", "other@x.com").await?;
    let admin = h.admin_cookie().await?;

    let r = h.send(Method::POST, "/api/projects", Some(&owner), Some(json!({ "name": "Apollo" }))).await?;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["project"]["owner"], json!(owner_id));
    let project = r.id("project");
    let uri = format!("/api/projects/{}", project);

    let r = h.send(Method::PATCH, &uri, Some(&other), Some(json!({ "description": "mine now" }))).await?;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    let r = h.send(Method::PATCH, &uri, Some(&owner), Some(json!({ "description": "moon" }))).await?;
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.body["project"]["description"], json!("moon"));

    let r = h.send(Method::PATCH, &uri, Some(&owner), Some(json!({ "owner": ObjectId::new().to_string() }))).await?;
    assert_eq!(r.status, StatusCode::NOT_FOUND);

    let missing = format!("/api/projects/{}", ObjectId::new());
    let r = h.send(Method::DELETE, &missing, Some(&other), None).await?;
    assert_eq!(r.status, StatusCode::NOT_FOUND);

    let r = h.send(Method::DELETE, &uri, Some(&admin), None).await?;
    assert_eq!(r.status, StatusCode::OK);
    let r = h.send(Method::GET, &uri, Some(&owner), None).await?;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn self_delete_rules() -> Result<()> {
    let h = harness().await?;
    let admin = h.admin_cookie().await?;
    let admin_id = h.login(ADMIN_EMAIL, ADMIN_PASSWORD).await?.id("user");

    let r = h.send(Method::DELETE, &format!("/api/users/{}", admin_id), Some(&admin), None).await?;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    assert_eq!(r.body["message"], json!("admins cannot self-delete"));

    let (dev_id, dev) = h.register("Dev", "dev@x.com").await?;
    let r = h.send(Method::DELETE, &format!("/api/users/{}", dev_id), Some(&dev), None).await?;
    assert_eq!(r.status, StatusCode::OK);
    assert!(r.clears_cookie());

    // The old token names a subject that no longer exists.
    let r = h.send(Method::GET, "/api/projects", Some(&dev), None).await?;
    assert_eq!((r.status, r.code()), (StatusCode::UNAUTHORIZED, "unauthenticated"));
    Ok(())
}

#[tokio::test]
async fn role_changes_apply_to_existing_sessions() -> Result<()> {
    let h = harness().await?;
    let admin = h.admin_cookie().await?;
    let (dev_id, dev) = h.register("Dev", "dev@x.com").await?;
    let uri = format!("/api/users/{}", dev_id);

    let r = h.send(Method::PATCH, &uri, Some(&dev), Some(json!({ "userLevel": "ADMIN" }))).await?;
    assert_eq!(r.status, StatusCode::FORBIDDEN);
    assert_eq!(r.body["message"], json!("cannot assign higher level than own"));

    let r = h.send(Method::PATCH, &uri, Some(&admin), Some(json!({ "userLevel": 15 }))).await?;
    assert_eq!(r.status, StatusCode::BAD_REQUEST);

    let r = h.send(Method::PATCH, &uri, Some(&admin), Some(json!({ "userLevel": "admin" }))).await?;
    assert_eq!(r.status, StatusCode::OK);

    // Same cookie, new standing.
    let r = h.send(Method::GET, "/api/users", Some(&dev), None).await?;
    assert_eq!(r.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn task_completion_is_stamped() -> Result<()> {
    let h = harness().await?;
    let (dev_id, dev) = h.register("Dev", "dev@x.com").await?;

    let r = h
        .send(Method::POST, "/api/tasks", Some(&dev), Some(json!({ "title": "Write docs", "assignedTo": dev_id })))
        .await?;
    assert_eq!(r.status, StatusCode::CREATED);
    assert_eq!(r.body["task"]["status"], json!("to-do"));
    let uri = format!("/api/tasks/{}", r.id("task"));

    let r = h.send(Method::PATCH, &uri, Some(&dev), Some(json!({ "status": "done" }))).await?;
    assert_eq!(r.body["task"]["finishedBy"], json!(dev_id));
    assert!(r.body["task"]["finishedAt"].is_string());

    let r = h.send(Method::PATCH, &uri, Some(&dev), Some(json!({ "status": "in progress" }))).await?;
    assert!(r.body["task"]["finishedBy"].is_null());

    let r = h.send(Method::GET, &format!("/api/users/{}/tasks", dev_id), Some(&dev), None).await?;
    assert_eq!(r.body["tasks"].as_array().map(Vec::len), Some(1));

    let r = h
        .send(Method::POST, "/api/tasks", Some(&dev), Some(json!({ "title": "Orphan", "project": ObjectId::new().to_string() })))
        .await?;
    assert_eq!(r.status, StatusCode::NOT_FOUND);
    Ok(())
}

async fn preflight(h: &Harness, origin: &str) -> Result<Reply> {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/projects")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())?;
    let res = h.app.clone().oneshot(req).await?;
    Ok(Reply { status: res.status(), headers: res.headers().clone(), body: Value::Null })
}

#[tokio::test]
async fn cors_admits_only_the_frontend_origin() -> Result<()> {
    let h = harness().await?;

    let ok = preflight(&h, "http://localhost:3000").await?;
    assert!(ok.status.is_success());
    assert_eq!(ok.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()), Some("http://localhost:3000"));
    assert_eq!(ok.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).and_then(|v| v.to_str().ok()), Some("true"));
    let methods = ok.headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert!(methods.contains("PATCH"));

    let foreign = preflight(&h, "https://evil.example").await?;
    assert!(foreign.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(foreign.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    Ok(())
}
