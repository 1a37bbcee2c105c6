//! HTTP routes
//!
//! Maps the JSON/multipart API onto the storage, usage, and chat
//! modules. Blocking filesystem work runs on the blocking pool so a
//! slow disk never stalls unrelated requests; within one request the
//! steps stay strictly sequential (resolve, touch the filesystem,
//! respond).

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::error;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::{ServerError, handlers};
use crate::server::core::AppState;
use crate::storage::catalog::{self, Listing};
use crate::storage::content::{self, FileContent};
use crate::storage::operations;
use crate::usage::reporter::{self, UsageSnapshot};

/// Uploads are buffered in memory, so they stay bounded. 100MB.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/files",
            get(list_files)
                .post(upload_or_create)
                .delete(delete_entry)
                .patch(relocate_entry),
        )
        .route("/api/files/download", get(download_file))
        .route("/api/files/read", get(read_file))
        .route("/api/files/storage", get(storage_stats))
        .route(
            "/api/chat",
            get(chat_messages).post(chat_append).delete(chat_clear),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// API error envelope: an HTTP status plus a stable kind and a human
/// message.
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }
}

impl From<ServerError> for ApiError {
    fn from(error: ServerError) -> Self {
        let (status, kind) = handlers::classify(&error);
        Self {
            status,
            kind,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{}", self.message);
        }

        let body = json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

/// Run blocking filesystem work on the blocking pool, folding both task
/// and domain failures into the API error envelope.
async fn blocking<T, E, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ServerError> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::from(e.into())),
        Err(e) => Err(ApiError::from(ServerError::TaskFailed(e.to_string()))),
    }
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    #[serde(default)]
    path: String,
}

// ── Files ────────────────────────────────────────────────────────────

async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Listing>, ApiError> {
    let listing = blocking(move || catalog::list_directory(&state.resolver, &query.path)).await?;
    Ok(Json(listing))
}

/// POST /api/files carries a multipart form: either a file upload
/// (`file` + `path` fields) or a folder creation (`action=create-folder`
/// + `name` + `path`), mirroring the frontend's single upload form.
async fn upload_or_create(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut action = None;
    let mut folder = String::new();
    let mut name = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(reject)? {
        // Owned copy first: reading the field body consumes it.
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("action") => action = Some(field.text().await.map_err(reject)?),
            Some("path") => folder = field.text().await.map_err(reject)?,
            Some("name") => name = Some(field.text().await.map_err(reject)?),
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(reject)?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    if action.as_deref() == Some("create-folder") {
        let name = name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::bad_request("Folder name required"))?;

        blocking(move || operations::create_folder(&state.resolver, &folder, &name)).await?;
        return Ok(Json(json!({ "success": true, "message": "Folder created" })));
    }

    let (filename, bytes) = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    blocking(move || operations::upload(&state.resolver, &folder, &filename, &bytes)).await?;
    Ok(Json(json!({ "success": true, "message": "File uploaded" })))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.path.is_empty() {
        return Err(ApiError::bad_request("Path required"));
    }

    blocking(move || operations::delete(&state.resolver, &query.path)).await?;
    Ok(Json(json!({ "success": true, "message": "Deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelocateRequest {
    source_path: String,
    destination_path: String,
    action: String,
}

/// PATCH /api/files relocates an entry. For `rename` the client sends
/// the full sibling path; only its leaf name is honored.
async fn relocate_entry(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RelocateRequest>,
) -> Result<Json<Value>, ApiError> {
    match request.action.as_str() {
        "move" => {
            blocking(move || {
                operations::move_entry(
                    &state.resolver,
                    &request.source_path,
                    &request.destination_path,
                )
            })
            .await?;
        }
        "rename" => {
            let new_name = request
                .destination_path
                .rsplit('/')
                .next()
                .unwrap_or("")
                .to_string();

            blocking(move || operations::rename(&state.resolver, &request.source_path, &new_name))
                .await?;
        }
        _ => return Err(ApiError::bad_request("Invalid action")),
    }

    Ok(Json(
        json!({ "success": true, "message": "Operation successful" }),
    ))
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let download =
        blocking(move || operations::read_for_download(&state.resolver, &query.path)).await?;

    let disposition = format!("attachment; filename=\"{}\"", download.name);
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, download.bytes).into_response())
}

async fn read_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Value>, ApiError> {
    let preview = blocking(move || content::read_content(&state.resolver, &query.path)).await?;

    let body = match preview.content {
        FileContent::Text { content } => json!({
            "content": content,
            "type": "text",
            "name": preview.name,
            "size": preview.size,
        }),
        FileContent::Binary { content, mime_type } => json!({
            "content": BASE64.encode(content),
            "type": "binary",
            "name": preview.name,
            "size": preview.size,
            "mimeType": mime_type,
        }),
    };

    Ok(Json(body))
}

async fn storage_stats(State(state): State<Arc<AppState>>) -> Json<UsageSnapshot> {
    Json(reporter::report(&state.resolver, &state.probes).await)
}

// ── Chat ─────────────────────────────────────────────────────────────

async fn chat_messages(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let messages = blocking(move || state.chat.messages()).await?;
    Ok(Json(json!({ "messages": messages })))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    text: String,
    sender: Option<String>,
}

async fn chat_append(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, ApiError> {
    let message =
        blocking(move || state.chat.append(&request.text, request.sender.as_deref())).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

async fn chat_clear(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    blocking(move || state.chat.clear()).await?;
    Ok(Json(json!({ "success": true })))
}

/// Malformed multipart bodies are client errors.
fn reject(error: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(error.to_string())
}
