//! In-memory stand-in for the `v2` API, covering the routes the client uses.
//!
//! Records are kept as raw JSON objects so updates can merge arbitrary
//! fields the way the real API does. Mutating routes and `/user` require the
//! `Authorization` header to equal the server's token.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_TOKEN: &str = "mrp_test_token";

#[derive(Default)]
pub struct Store {
    /// Keyed by project id.
    pub projects: HashMap<String, Map<String, Value>>,
    /// Keyed by version id.
    pub versions: HashMap<String, Map<String, Value>>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RwLock<Store>>,
    pub token: Arc<str>,
}

pub fn app() -> Router {
    app_with_token(DEFAULT_TOKEN)
}

pub fn app_with_token(token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        token: Arc::from(token),
    };
    let api = Router::new()
        .route("/project", post(create_project))
        .route("/project/{id}", get(get_project).patch(modify_project))
        .route("/project/{id}/version", get(list_versions))
        .route("/project/{id}/icon", patch(upload_icon))
        .route("/version", post(create_version))
        .route("/version/{id}", get(get_version))
        .route("/user", get(get_user))
        .route("/search", get(search));
    Router::new().nest("/v2", api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_token(listener, DEFAULT_TOKEN).await
}

pub async fn run_with_token(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock API listening");
    }
    axum::serve(listener, app_with_token(token)).await
}

fn error(status: StatusCode, error: &str, description: &str) -> Response {
    (status, Json(json!({"error": error, "description": description}))).into_response()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let given = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if given == &*state.token {
        Ok(())
    } else {
        Err(error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Authentication Error: Invalid Authentication Credentials",
        ))
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn find_project<'a>(store: &'a Store, id_or_slug: &str) -> Option<&'a Map<String, Value>> {
    store.projects.get(id_or_slug).or_else(|| {
        store
            .projects
            .values()
            .find(|p| p.get("slug").and_then(Value::as_str) == Some(id_or_slug))
    })
}

fn project_id(store: &Store, id_or_slug: &str) -> Option<String> {
    find_project(store, id_or_slug)
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let db = state.db.read().await;
    match find_project(&db, &id) {
        Some(project) => Json(Value::Object(project.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn list_versions(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let db = state.db.read().await;
    let Some(project) = find_project(&db, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let versions: Vec<Value> = project
        .get("versions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|vid| db.versions.get(vid))
        .map(|v| Value::Object(v.clone()))
        .collect();
    Json(versions).into_response()
}

/// Fields the server owns; updates that name them are ignored.
const READ_ONLY: &[&str] = &["id", "team", "published", "versions", "downloads", "followers"];

async fn modify_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<Map<String, Value>>,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let mut db = state.db.write().await;
    let Some(pid) = project_id(&db, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(project) = db.projects.get_mut(&pid) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    debug!(project = %pid, fields = update.len(), "modify project");
    for (key, value) in update {
        if !READ_ONLY.contains(&key.as_str()) {
            project.insert(key, value);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
struct IconQuery {
    ext: String,
}

async fn upload_icon(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<IconQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    if body.is_empty() {
        return error(StatusCode::BAD_REQUEST, "invalid_input", "empty icon");
    }
    let mut db = state.db.write().await;
    let Some(pid) = project_id(&db, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(project) = db.projects.get_mut(&pid) {
        let url = format!("https://cdn.example/data/{pid}/icon.{}", query.ext);
        project.insert("icon_url".to_string(), json!(url));
    }
    StatusCode::NO_CONTENT.into_response()
}

/// A decoded multipart create request.
struct Upload {
    data: Map<String, Value>,
    /// (part name, filename, size) of every non-`data` part.
    files: Vec<(String, Option<String>, usize)>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut data = None;
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error(StatusCode::BAD_REQUEST, "invalid_input", &e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error(StatusCode::BAD_REQUEST, "invalid_input", &e.to_string()))?;
        if name == "data" {
            let parsed: Map<String, Value> = serde_json::from_slice(&bytes)
                .map_err(|e| error(StatusCode::BAD_REQUEST, "invalid_input", &e.to_string()))?;
            data = Some(parsed);
        } else {
            files.push((name, filename, bytes.len()));
        }
    }
    let data = data.ok_or_else(|| error(StatusCode::BAD_REQUEST, "invalid_input", "missing data field"))?;
    Ok(Upload { data, files })
}

fn non_empty<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

async fn create_project(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let Upload { mut data, files } = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejected) => return rejected,
    };
    let (Some(slug), Some(_)) = (non_empty(&data, "slug"), non_empty(&data, "title")) else {
        return error(StatusCode::BAD_REQUEST, "invalid_input", "slug and title are required");
    };
    let slug = slug.to_string();

    let mut db = state.db.write().await;
    if find_project(&db, &slug).is_some() {
        return error(StatusCode::BAD_REQUEST, "invalid_input", "slug collides with another project");
    }

    let id = new_id();
    data.remove("is_draft");
    data.remove("initial_versions");
    if let Some(license_id) = data.remove("license_id") {
        data.insert("license".to_string(), json!({"id": license_id, "name": "", "url": null}));
    }
    if files.iter().any(|(name, _, _)| name == "icon") {
        data.insert("icon_url".to_string(), json!(format!("https://cdn.example/data/{id}/icon.png")));
    }
    data.insert("id".to_string(), json!(id));
    data.insert("team".to_string(), json!(new_id()));
    data.insert("status".to_string(), json!("draft"));
    data.insert("versions".to_string(), json!([]));
    data.insert("downloads".to_string(), json!(0));
    data.insert("followers".to_string(), json!(0));

    info!(%id, %slug, "created project");
    db.projects.insert(id, data.clone());
    (StatusCode::OK, Json(Value::Object(data))).into_response()
}

async fn create_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    let Upload { mut data, files } = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejected) => return rejected,
    };
    if non_empty(&data, "version_number").is_none() {
        return error(StatusCode::BAD_REQUEST, "invalid_input", "version_number is required");
    }

    let file_parts: Vec<String> = data
        .remove("file_parts")
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let mut uploaded = Vec::new();
    for part in &file_parts {
        let Some((_, filename, size)) = files.iter().find(|(name, _, _)| name == part) else {
            return error(StatusCode::BAD_REQUEST, "invalid_input", &format!("missing file part {part}"));
        };
        uploaded.push(json!({
            "hashes": {"sha512": "", "sha1": ""},
            "url": format!("https://cdn.example/files/{}", filename.as_deref().unwrap_or(part)),
            "filename": filename.as_deref().unwrap_or(part),
            "primary": uploaded.is_empty(),
            "size": size,
            "file_type": null,
        }));
    }

    let mut db = state.db.write().await;
    let project = non_empty(&data, "project_id").and_then(|p| project_id(&db, p));
    let Some(pid) = project else {
        return error(StatusCode::BAD_REQUEST, "invalid_input", "unknown project_id");
    };

    let id = new_id();
    data.insert("id".to_string(), json!(id));
    data.insert("project_id".to_string(), json!(pid));
    data.insert("files".to_string(), Value::Array(uploaded));
    data.insert("downloads".to_string(), json!(0));

    if let Some(versions) = db
        .projects
        .get_mut(&pid)
        .and_then(|p| p.get_mut("versions"))
        .and_then(Value::as_array_mut)
    {
        // Newest first, as the real API lists them.
        versions.insert(0, json!(id));
    }
    info!(%id, project = %pid, "created version");
    db.versions.insert(id, data.clone());
    (StatusCode::OK, Json(Value::Object(data))).into_response()
}

async fn get_version(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let db = state.db.read().await;
    match db.versions.get(&id) {
        Some(version) => Json(Value::Object(version.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorize(&state, &headers) {
        return denied;
    }
    Json(json!({
        "username": "tester",
        "name": "Test User",
        "email": "tester@example.com",
        "bio": null,
        "id": "U1234567",
        "avatar_url": "https://cdn.example/avatar.png",
        "created": "2024-01-01T00:00:00Z",
        "role": "developer",
        "badges": 0,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    offset: Option<usize>,
    limit: Option<usize>,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let db = state.db.read().await;
    let needle = params.query.to_lowercase();
    let mut matches: Vec<&Map<String, Value>> = db
        .projects
        .values()
        .filter(|p| {
            p.get("title")
                .and_then(Value::as_str)
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect();
    matches.sort_by_key(|p| p.get("slug").and_then(Value::as_str).unwrap_or_default().to_string());

    let offset = params.offset.unwrap_or(0);
    let limit = params.limit.unwrap_or(10).min(100);
    let hits: Vec<Value> = matches
        .iter()
        .skip(offset)
        .take(limit)
        .map(|p| {
            let text = |key: &str| p.get(key).and_then(Value::as_str).unwrap_or_default();
            json!({
                "slug": text("slug"),
                "title": text("title"),
                "description": text("description"),
                "project_id": text("id"),
                "downloads": p.get("downloads").and_then(Value::as_u64).unwrap_or(0),
            })
        })
        .collect();
    Json(json!({
        "hits": hits,
        "offset": offset,
        "limit": limit,
        "total_hits": matches.len(),
    }))
    .into_response()
}
