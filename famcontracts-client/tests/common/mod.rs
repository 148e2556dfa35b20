//! In-process stand-in for the contracts backend.

#![allow(dead_code)]

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use famcontracts_client::App;
use famcontracts_client::notify::RecordingNotice;
use famcontracts_shared::api::rest::ApiClient;
use famcontracts_shared::storage::{KeyValueStore, MemoryStore};
use serde_json::{Value, json};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "x";
pub const TOKEN: &str = "t1";

type Reply = (StatusCode, Json<Value>);

#[derive(Debug, Default)]
pub struct Backend {
    pub contracts: Vec<Value>,
    /// `Authorization` header of every protected request, in arrival order.
    pub auth_headers: Vec<Option<String>>,
    /// When set, every protected route answers 401.
    pub revoked: bool,
    /// Profile edits applied through the settings routes.
    pub profile: Option<Value>,
    pub account_deleted: bool,
    next_id: usize,
}

#[derive(Clone, Default)]
pub struct Shared(Arc<Mutex<Backend>>);

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, Backend> {
        self.0.lock().unwrap()
    }
}

pub struct StubServer {
    pub base: String,
    pub backend: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn spawn() -> Option<Self> {
        let backend = Shared::default();
        let (addr, handle) = match start(backend.clone()).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start stub backend: {e}"),
        };
        Some(Self {
            base: format!("http://{addr}/api"),
            backend,
            handle,
        })
    }

    /// An app wired to this server with an in-memory token store. The store and
    /// notice log are returned so tests can look behind the app.
    pub fn app(&self) -> (App, Arc<MemoryStore>, RecordingNotice) {
        self.app_with(Arc::new(MemoryStore::new()))
    }

    pub fn app_with(&self, store: Arc<MemoryStore>) -> (App, Arc<MemoryStore>, RecordingNotice) {
        let tokens: Arc<dyn KeyValueStore> = store.clone();
        let api = ApiClient::new(&self.base, tokens, Duration::from_secs(5)).unwrap();
        let notices = RecordingNotice::default();
        let app = App::new(api, Box::new(notices.clone())).unwrap();
        (app, store, notices)
    }

    pub fn last_auth_header(&self) -> Option<String> {
        self.backend.lock().auth_headers.last().cloned().flatten()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start(
    backend: Shared,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/me", get(me))
        .route("/api/contracts", get(list_contracts).post(create_contract))
        .route(
            "/api/contracts/{id}",
            get(get_contract).put(update_contract).delete(delete_contract),
        )
        .route("/api/tasks", post(create_task))
        .route("/api/tasks/{id}", put(update_task))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/rewards", get(list_rewards))
        .route("/api/rewards/{id}/claim", post(claim_reward))
        .route("/api/settings/profile", get(get_profile).put(update_profile))
        .route("/api/settings/password", put(change_password))
        .route("/api/settings/account", delete(delete_account))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}

fn user_json(id: &str, email: &str, role: &str) -> Value {
    json!({"id": id, "email": email, "username": "anna", "firstName": "Anna", "role": role})
}

fn error(status: StatusCode, key: &str, message: &str) -> Reply {
    (status, Json(json!({ key: message })))
}

fn authorize(state: &Shared, headers: &HeaderMap) -> Result<(), Reply> {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut b = state.lock();
    let ok = !b.revoked && auth.as_deref() == Some("Bearer t1");
    b.auth_headers.push(auth);
    if ok {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "error", "unauthorized"))
    }
}

async fn login(Json(body): Json<Value>) -> Reply {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some(EMAIL), Some(PASSWORD)) => (
            StatusCode::OK,
            Json(json!({"token": TOKEN, "user": user_json("1", EMAIL, "parent")})),
        ),
        // non-JSON failure body: the client falls back to its own wording
        (Some("broken@b.com"), _) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!("boom"))),
        _ => error(StatusCode::UNAUTHORIZED, "message", "Invalid email or password"),
    }
}

async fn register(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    if email == EMAIL {
        return error(StatusCode::CONFLICT, "error", "User already exists");
    }
    let role = body["role"].as_str().unwrap_or("child");
    (
        StatusCode::CREATED,
        Json(json!({"token": TOKEN, "user": user_json("2", email, role)})),
    )
}

async fn me(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    (StatusCode::OK, Json(json!({"user": user_json("1", EMAIL, "parent")})))
}

async fn list_contracts(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let b = s.lock();
    (
        StatusCode::OK,
        Json(json!({"contracts": b.contracts, "total": b.contracts.len()})),
    )
}

async fn get_contract(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let b = s.lock();
    match b.contracts.iter().find(|c| c["id"] == id.as_str()) {
        Some(c) => (StatusCode::OK, Json(json!({"contract": c}))),
        None => error(StatusCode::NOT_FOUND, "error", "Contract not found"),
    }
}

async fn create_contract(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let mut b = s.lock();
    b.next_id += 1;
    let id = format!("c{}", b.next_id);
    let tasks: Vec<Value> = body["tasks"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "id": format!("{id}-t{i}"),
                "contractId": id,
                "title": t["title"],
                "points": t["points"],
                "status": "pending",
            })
        })
        .collect();
    let mut contract = json!({
        "id": id,
        "title": body["title"],
        "parent_id": "1",
        "child_id": body["child_id"],
        "status": "pending",
        "start_date": body["start_date"],
        "tasks": tasks,
        "createdAt": "2026-01-01T00:00:00Z",
    });
    if !body["reward"].is_null() {
        contract["reward"] = body["reward"].clone();
    }
    b.contracts.push(contract.clone());
    (StatusCode::CREATED, Json(json!({"contract": contract})))
}

/// Applies the sent fields and answers with the contract minus its tasks, as
/// some deployments do.
async fn update_contract(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let mut b = s.lock();
    let Some(c) = b.contracts.iter_mut().find(|c| c["id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "error", "Contract not found");
    };
    if let Some(fields) = body.as_object() {
        for (k, v) in fields {
            c[k.as_str()] = v.clone();
        }
    }
    let mut reply = c.clone();
    reply["tasks"] = json!([]);
    (StatusCode::OK, Json(reply))
}

async fn delete_contract(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let mut b = s.lock();
    let before = b.contracts.len();
    b.contracts.retain(|c| c["id"] != id.as_str());
    if b.contracts.len() == before {
        return error(StatusCode::NOT_FOUND, "error", "Contract not found");
    }
    (StatusCode::OK, Json(json!({"message": "Contract deleted"})))
}

async fn create_task(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let mut b = s.lock();
    let cid = body["contract_id"].as_str().unwrap_or_default().to_string();
    let Some(c) = b.contracts.iter_mut().find(|c| c["id"] == cid.as_str()) else {
        return error(StatusCode::NOT_FOUND, "error", "Contract not found");
    };
    let tasks = c["tasks"].as_array_mut().unwrap();
    let task = json!({
        "id": format!("{cid}-t{}", tasks.len()),
        "title": body["title"],
        "points": body["points"],
        "status": "pending",
    });
    tasks.push(task.clone());
    (StatusCode::CREATED, Json(json!({"task": task})))
}

fn set_task_status(s: &Shared, id: &str, status: &str) -> Reply {
    let mut b = s.lock();
    for c in b.contracts.iter_mut() {
        let cid = c["id"].clone();
        if let Some(t) = c["tasks"]
            .as_array_mut()
            .and_then(|ts| ts.iter_mut().find(|t| t["id"] == id))
        {
            t["status"] = json!(status);
            let mut reply = t.clone();
            reply["contractId"] = cid;
            return (StatusCode::OK, Json(reply));
        }
    }
    error(StatusCode::NOT_FOUND, "error", "Task not found")
}

async fn complete_task(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    set_task_status(&s, &id, "completed")
}

async fn update_task(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let status = body["status"].as_str().unwrap_or("pending").to_string();
    set_task_status(&s, &id, &status)
}

fn reward_json(status: &str) -> Value {
    json!({
        "id": "r1",
        "contract_id": "c1",
        "title": "Cinema night",
        "points_cost": 10,
        "status": status,
    })
}

async fn list_rewards(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    (
        StatusCode::OK,
        Json(json!({"rewards": [reward_json("available")], "total": 1})),
    )
}

async fn claim_reward(
    State(s): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    if id != "r1" {
        return error(StatusCode::NOT_FOUND, "error", "Reward not found");
    }
    (StatusCode::OK, Json(json!({"reward": reward_json("used")})))
}

fn current_profile(b: &Backend) -> Value {
    b.profile
        .clone()
        .unwrap_or_else(|| user_json("1", EMAIL, "parent"))
}

async fn get_profile(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let b = s.lock();
    (StatusCode::OK, Json(json!({"user": current_profile(&b)})))
}

async fn update_profile(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    if body["email"] == "taken@b.com" {
        return error(StatusCode::BAD_REQUEST, "error", "Email already in use");
    }
    let mut b = s.lock();
    let mut user = current_profile(&b);
    // the stored user spells the first name in camelCase
    for (field, key) in [
        ("first_name", "firstName"),
        ("last_name", "last_name"),
        ("email", "email"),
        ("phone", "phone"),
    ] {
        if let Some(v) = body[field].as_str() {
            user[key] = json!(v);
        }
    }
    b.profile = Some(user.clone());
    (StatusCode::OK, Json(json!({"user": user})))
}

async fn change_password(
    State(s): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    if body["current_password"] != PASSWORD {
        return error(StatusCode::BAD_REQUEST, "error", "Wrong current password");
    }
    if body["new_password"].as_str().unwrap_or_default().len() < 6 {
        return error(StatusCode::BAD_REQUEST, "error", "Password too short");
    }
    (StatusCode::OK, Json(json!({"message": "Password updated"})))
}

async fn delete_account(State(s): State<Shared>, headers: HeaderMap) -> Reply {
    if let Err(r) = authorize(&s, &headers) {
        return r;
    }
    let mut b = s.lock();
    b.contracts.clear();
    b.account_deleted = true;
    (StatusCode::OK, Json(json!({"message": "Account deleted"})))
}
