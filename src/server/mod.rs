//! HTTP API server for a Lorebook workspace
//!
//! This module exposes the workspace operations as a JSON API, serves uploaded
//! files and pushes reload notices to websocket clients when files change.

mod error;
mod routes;
mod watcher;
mod websocket;

pub use error::{ApiError, ApiResult};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::Settings;
use crate::models::Collection;
use crate::storage::Storage;
use crate::{Error, Result};

/// Largest accepted request body (image uploads).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Workspace storage; the mutex serializes requests within this process
    pub storage: Arc<Mutex<Storage>>,
    pub settings: Arc<Settings>,
    /// Broadcast channel for sending updates to WebSocket clients
    pub update_tx: broadcast::Sender<String>,
}

impl AppState {
    pub fn new(settings: Settings, storage: Storage) -> Self {
        let (update_tx, _) = broadcast::channel(100);
        Self {
            storage: Arc::new(Mutex::new(storage)),
            settings: Arc::new(settings),
            update_tx,
        }
    }
}

/// Build the router for all API routes, `/uploads` and `/ws`.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.settings.uploads_dir());

    Router::new()
        .route("/api/config", get(routes::get_config))
        .route("/api/ideas", get(routes::list_ideas).post(routes::save_idea))
        .route("/api/tasks", get(routes::list_tasks).post(routes::save_task))
        .route("/api/tasks/:id/status", put(routes::update_task_status))
        .route("/api/prd", get(routes::list_prd))
        .route("/api/characters", routes::collection_route(Collection::Characters))
        .route("/api/characters/relationship-graph", get(routes::relationship_graph))
        .route("/api/locations", routes::collection_route(Collection::Locations))
        .route("/api/quests", routes::collection_route(Collection::Quests))
        .route("/api/dialogues", routes::collection_route(Collection::Dialogues))
        .route("/api/dialogues/:id/export", get(routes::export_dialogue))
        .route("/api/story-arcs", routes::collection_route(Collection::StoryArcs))
        .route("/api/search", get(routes::search))
        .route("/api/images", routes::read_only_collection_route(Collection::Images))
        .route("/api/upload/image", post(routes::upload_image))
        .route("/api/diagrams", routes::read_only_collection_route(Collection::Diagrams))
        .route("/api/diagram/create", post(routes::create_diagram))
        .route("/api/file/*path", get(routes::get_file).post(routes::save_file))
        .route("/ws", get(websocket::ws_handler))
        .nest_service("/uploads", uploads)
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server and block until Ctrl+C.
pub async fn start_server(settings: Settings) -> Result<()> {
    let storage = Storage::init(&settings)?;
    let addr = settings.bind_address();
    let state = AppState::new(settings, storage);

    let watch_dirs = vec![
        state.settings.docs_dir().to_path_buf(),
        state.settings.data_dir().to_path_buf(),
    ];
    let watcher_tx = state.update_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = watcher::watch_dirs(watch_dirs, watcher_tx).await {
            tracing::error!(error = %e, "File watcher stopped");
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Other(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Lorebook API listening on http://{}", addr);
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DiagramRenderer;
    use crate::test_utils::TestEnv;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::path::Path;
    use tower::ServiceExt;

    struct SvgRenderer;

    impl DiagramRenderer for SvgRenderer {
        fn render(&self, _source: &Path, output: &Path) -> Result<()> {
            std::fs::write(output, "<svg></svg>")?;
            Ok(())
        }

        fn name(&self) -> &str {
            "svg"
        }
    }

    fn app(env: &TestEnv) -> Router {
        let storage = env.init_storage().with_renderer(Box::new(SvgRenderer));
        build_router(AppState::new(env.settings(), storage))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let env = TestEnv::new();
        let app = app(&env);
        let (status, body) = send(&app, get("/api/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Lorebook");
        assert!(body["docs_dir"].as_str().unwrap().ends_with("docs"));
    }

    #[tokio::test]
    async fn test_character_upsert_and_list() {
        let env = TestEnv::new();
        let app = app(&env);

        let (status, body) = send(&app, json_request("POST", "/api/characters", json!({"name": "Aria"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["id"].as_str().unwrap().to_string();

        let (_, list) = send(&app, get("/api/characters")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], id.as_str());
        assert_eq!(list[0]["created"], list[0]["modified"]);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let env = TestEnv::new();
        let app = app(&env);
        let request = Request::builder()
            .method("POST")
            .uri("/api/quests")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_idea_save_and_list() {
        let env = TestEnv::new();
        let app = app(&env);
        let draft = json!({
            "title": "Double Jump",
            "category": "Gameplay",
            "score": {"impact": 4, "feasibility": 5, "originality": 3, "player_value": 4, "alignment": 5}
        });
        let (status, body) = send(&app, json_request("POST", "/api/ideas", draft)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "Gameplay/double-jump");

        let written = env.path().join("docs/Ideas/Gameplay/double-jump.md");
        assert!(std::fs::read_to_string(written).unwrap().contains("- **Total Score**: 21"));

        let (_, list) = send(&app, get("/api/ideas")).await;
        assert_eq!(list[0]["score"]["total"], 21);
    }

    #[tokio::test]
    async fn test_task_status_transition() {
        let env = TestEnv::new();
        let app = app(&env);
        let (_, saved) = send(&app, json_request("POST", "/api/tasks", json!({"title": "Boss fight"}))).await;
        let id = saved["id"].as_str().unwrap().to_string();
        let uri = format!("/api/tasks/{}/status", id);

        let (status, body) = send(&app, json_request("PUT", &uri, json!({"status": "Backlog"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Task already in this status");

        let (_, body) = send(&app, json_request("PUT", &uri, json!({"status": "Done"}))).await;
        assert!(body["file_path"].as_str().unwrap().contains("/Tasks/Done/"));

        let (_, done) = send(&app, get("/api/tasks?status=Done")).await;
        assert_eq!(done.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, json_request("PUT", &uri, json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No status provided");

        let (status, _) = send(&app, json_request("PUT", "/api/tasks/2000-01-01-01/status", json!({"status": "Done"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let env = TestEnv::new();
        let app = app(&env);
        send(&app, json_request("POST", "/api/locations", json!({"name": "Dragon's Peak"}))).await;

        let (status, body) = send(&app, get("/api/search?q=dragon")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["locations"][0]["name"], "Dragon's Peak");

        let (status, body) = send(&app, get("/api/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Search query not provided");
    }

    #[tokio::test]
    async fn test_dialogue_export_and_graph() {
        let env = TestEnv::new();
        let app = app(&env);
        let (_, saved) = send(&app, json_request("POST", "/api/dialogues", json!({"title": "Greeting"}))).await;
        let uri = format!("/api/dialogues/{}/export", saved["id"].as_str().unwrap());

        let (status, body) = send(&app, get(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Greeting");

        let (status, body) = send(&app, get("/api/dialogues/missing/export")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Dialogue not found");

        let (status, body) = send(&app, get("/api/characters/relationship-graph")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["graph"]["nodes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_round_trip_and_traversal() {
        let env = TestEnv::new();
        let app = app(&env);

        let (status, body) = send(
            &app,
            json_request("POST", "/api/file/Story/intro.md", json!({"content": "# Intro"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (_, body) = send(&app, get("/api/file/Story/intro.md")).await;
        assert_eq!(body["content"], "# Intro");
        assert!(body["html_content"].as_str().unwrap().contains("<h1>Intro</h1>"));

        let (status, _) = send(&app, get("/api/file/Story/missing.md")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get("/api/file/Story/..%2F..%2Fsecret")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_prd_listing() {
        let env = TestEnv::new();
        let app = app(&env);
        let prd = env.path().join("docs/PRD/combat.md");
        std::fs::write(&prd, "# Combat\n\nFast fights.\n").unwrap();

        let (status, body) = send(&app, get("/api/prd")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["documents"][0]["title"], "Combat");
        assert_eq!(body["documents"][0]["path"], "PRD/combat.md");
    }

    #[tokio::test]
    async fn test_image_upload_and_static_serving() {
        let env = TestEnv::new();
        let app = app(&env);

        let boundary = "lorebookboundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"map.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\nmap, world\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload/image")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["image"]["tags"], json!(["map", "world"]));

        let url = body["image"]["url"].as_str().unwrap().to_string();
        let response = app.clone().oneshot(get(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"PNGDATA");

        let (_, images) = send(&app, get("/api/images")).await;
        assert_eq!(images.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_without_image_field() {
        let env = TestEnv::new();
        let app = app(&env);
        let boundary = "x";
        let body = format!("--{b}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\na\r\n--{b}--\r\n", b = boundary);
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload/image")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file part");
    }

    #[tokio::test]
    async fn test_diagram_create() {
        let env = TestEnv::new();
        let app = app(&env);
        let (status, body) = send(
            &app,
            json_request("POST", "/api/diagram/create", json!({"code": "graph TD; A-->B", "name": "Flow"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["diagram"]["name"], "Flow");

        let (status, body) = send(&app, json_request("POST", "/api/diagram/create", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No diagram code provided");

        let (_, diagrams) = send(&app, get("/api/diagrams")).await;
        assert_eq!(diagrams.as_array().unwrap().len(), 1);
    }

    struct SlowRenderer;

    impl DiagramRenderer for SlowRenderer {
        fn render(&self, source: &Path, output: &Path) -> Result<()> {
            std::thread::sleep(std::time::Duration::from_millis(500));
            std::fs::copy(source, output)?;
            Ok(())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_slow_render_does_not_stall_other_requests() {
        let env = TestEnv::new();
        let storage = env.init_storage().with_renderer(Box::new(SlowRenderer));
        let app = build_router(AppState::new(env.settings(), storage));

        let render_app = app.clone();
        let render = tokio::spawn(async move {
            send(
                &render_app,
                json_request("POST", "/api/diagram/create", json!({"code": "graph TD; A-->B"})),
            )
            .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (status, _) = send(&app, get("/api/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!render.is_finished());

        let (status, body) = render.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["diagram"]["code"], "graph TD; A-->B");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let env = TestEnv::new();
        let app = app(&env);
        let (status, body) = send(&app, get("/api/nothing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
