//! API endpoint handlers.
//!
//! Handlers lock the shared storage, call the matching command and return its
//! JSON. List endpoints return bare arrays.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path as AxumPath, Query, State},
    routing::{MethodRouter, get},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::Error;
use crate::commands::{
    self, ConfigShow, DialogueExport, DiagramCreated, FileSaved, FileShow, GraphOutput,
    IdeaSaved, ImageSaved, PrdList, RecordSaved, SearchOutput, TaskMoved, TaskSaved,
};
use crate::models::{Collection, Idea, IdeaDraft, Record, Task, TaskDraft};
use crate::storage::{DiagramRequest, ImageUpload};

/// Decode a JSON request body, reporting malformed input as a 400.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

// ==================== Config ====================

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigShow> {
    Json(commands::config_show(&state.settings))
}

// ==================== Ideas ====================

pub async fn list_ideas(State(state): State<AppState>) -> ApiResult<Json<Vec<Idea>>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::idea_list(&storage)?.ideas))
}

pub async fn save_idea(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<IdeaSaved>> {
    let draft: IdeaDraft = parse_body(&body)?;
    let storage = state.storage.lock().await;
    Ok(Json(commands::idea_add(&storage, &draft)?))
}

// ==================== Tasks ====================

#[derive(Deserialize)]
pub struct TaskQuery {
    status: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let status = query.status.as_deref().filter(|s| !s.trim().is_empty());
    let storage = state.storage.lock().await;
    Ok(Json(commands::task_list(&storage, status)?.tasks))
}

pub async fn save_task(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<TaskSaved>> {
    let draft: TaskDraft = parse_body(&body)?;
    let storage = state.storage.lock().await;
    Ok(Json(commands::task_add(&storage, &draft)?))
}

#[derive(Deserialize)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
}

pub async fn update_task_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Bytes,
) -> ApiResult<Json<TaskMoved>> {
    let StatusBody { status } = parse_body(&body)?;
    let status = status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No status provided"))?;
    let storage = state.storage.lock().await;
    Ok(Json(commands::task_move(&storage, &id, &status)?))
}

// ==================== PRD ====================

pub async fn list_prd(State(state): State<AppState>) -> ApiResult<Json<PrdList>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::prd_list(&storage)?))
}

// ==================== JSON Collections ====================

async fn list_records(state: AppState, collection: Collection) -> ApiResult<Json<Vec<Record>>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::record_list(&storage, collection)?.records))
}

async fn upsert_record(state: AppState, collection: Collection, body: Bytes) -> ApiResult<Json<RecordSaved>> {
    let record: serde_json::Value = parse_body(&body)?;
    let mut storage = state.storage.lock().await;
    Ok(Json(commands::record_put(&mut storage, collection, record)?))
}

/// GET lists a collection, POST upserts one record into it.
pub fn collection_route(collection: Collection) -> MethodRouter<AppState> {
    get(move |State(state): State<AppState>| list_records(state, collection)).post(
        move |State(state): State<AppState>, body: Bytes| upsert_record(state, collection, body),
    )
}

/// GET-only listing, for collections written through dedicated endpoints.
pub fn read_only_collection_route(collection: Collection) -> MethodRouter<AppState> {
    get(move |State(state): State<AppState>| list_records(state, collection))
}

pub async fn export_dialogue(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<DialogueExport>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::dialogue_export(&storage, &id)?))
}

pub async fn relationship_graph(State(state): State<AppState>) -> ApiResult<Json<GraphOutput>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::character_graph(&storage)?))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchOutput>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::search(&storage, query.q.as_deref().unwrap_or(""))?))
}

// ==================== Images and Diagrams ====================

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::bad_request(format!("Invalid multipart body: {}", e))
}

pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<ImageSaved>> {
    let mut upload: Option<ImageUpload> = None;
    let mut description = String::new();
    let mut tags = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                    ..Default::default()
                });
            }
            "description" => description = field.text().await.map_err(multipart_error)?,
            "tags" => tags = field.text().await.map_err(multipart_error)?,
            _ => {}
        }
    }

    let mut upload = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;
    upload.description = description;
    upload.tags = tags;

    let mut storage = state.storage.lock().await;
    Ok(Json(commands::image_upload(&mut storage, upload)?))
}

pub async fn create_diagram(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<DiagramCreated>> {
    let request: DiagramRequest = parse_body(&body)?;
    let mut storage = state.storage.clone().lock_owned().await;
    // The renderer is a blocking subprocess; the lock stays held while it runs
    let created = tokio::task::spawn_blocking(move || commands::diagram_render(&mut storage, request))
        .await
        .map_err(|e| Error::Other(format!("Diagram render task failed: {}", e)))??;
    Ok(Json(created))
}

// ==================== File Access ====================

pub async fn get_file(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
) -> ApiResult<Json<FileShow>> {
    let storage = state.storage.lock().await;
    Ok(Json(commands::file_get(&storage, &path)?))
}

#[derive(Deserialize)]
struct FileBody {
    #[serde(default)]
    content: String,
}

pub async fn save_file(
    State(state): State<AppState>,
    AxumPath(path): AxumPath<String>,
    body: Bytes,
) -> ApiResult<Json<FileSaved>> {
    let FileBody { content } = parse_body(&body)?;
    let storage = state.storage.lock().await;
    Ok(Json(commands::file_put(&storage, &path, &content)?))
}

/// Unknown API paths.
pub async fn not_found() -> ApiError {
    ApiError(Error::NotFound("Not found".to_string()))
}
