//! HTTP surface of the memory engine.
//!
//! The companion UI process, the email-summary producer, and the retention
//! trigger all talk to the engine through this service. Callers must treat
//! an empty search result as "no relevant memory" and carry on with
//! context-free generation.

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::MemoryConfig;
use crate::memory::{
    record::now_timestamp, retention, ConversationLog, LogMessage, MemoryEngine, MemoryRecord,
    Role, SearchHit,
};

pub struct AppState {
    pub engine: Arc<MemoryEngine>,
    pub log: Arc<ConversationLog>,
    pub config: MemoryConfig,
}

#[derive(Deserialize)]
struct SaveMessageRequest {
    role: Role,
    content: String,
}

#[derive(Serialize)]
struct SaveMessageResponse {
    id: String,
    timestamp: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_top_k")]
    k: usize,
    /// Overrides the configured default threshold.
    threshold: Option<f32>,
}

fn default_top_k() -> usize {
    3
}

#[derive(Serialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct RecentParams {
    #[serde(default = "default_top_k")]
    n: usize,
}

#[derive(Serialize)]
struct RecentResponse {
    records: Vec<MemoryRecord>,
}

struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Memory Service Error: {:#}", self.0),
        );
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/messages", post(save_message_handler))
        .route("/search", post(search_handler))
        .route("/recent", get(recent_handler))
        .route("/sweep", post(sweep_handler))
        .route("/clear", post(clear_handler))
        .route("/persist", post(persist_handler))
        .route("/size", get(size_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until ctrl-c, then flushes the vector store to disk.
pub async fn run(
    config: MemoryConfig,
    engine: Arc<MemoryEngine>,
    log: Arc<ConversationLog>,
) -> Result<()> {
    run_with_shutdown(config, engine, log, shutdown_signal()).await
}

/// Serving loop with a caller-supplied shutdown future. The exit-time save
/// runs after the listener winds down, so whatever was ingested during the
/// session survives a restart.
pub async fn run_with_shutdown<F>(
    config: MemoryConfig,
    engine: Arc<MemoryEngine>,
    log: Arc<ConversationLog>,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr = format!("127.0.0.1:{}", config.port);
    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
        log,
        config,
    });
    let app = router(state);

    info!("Memory service listening at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down, saving memory store");
    engine.save().await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
}

/// Shared save-path for chat turns and email-derived summaries: append to
/// the conversation log, then ingest into the engine. The log goes first
/// because sweeps rebuild the engine from it; a turn that reached the log
/// but not the engine is restored by the next sweep, the reverse is lost.
/// Persistence of the vector store stays explicit via `/persist`.
async fn save_message_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveMessageRequest>,
) -> Result<Json<SaveMessageResponse>, ServerError> {
    let timestamp = now_timestamp();
    state
        .log
        .append(LogMessage {
            role: payload.role,
            content: payload.content.clone(),
            timestamp: timestamp.clone(),
        })
        .await?;
    let record = state
        .engine
        .ingest(payload.role, &payload.content, &timestamp)
        .await?;
    Ok(Json(SaveMessageResponse {
        id: record.id,
        timestamp,
    }))
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ServerError> {
    let threshold = payload
        .threshold
        .unwrap_or(state.config.cosine_similarity);
    let hits = state
        .engine
        .search(&payload.query, payload.k, threshold)
        .await?;
    Ok(Json(SearchResponse { hits }))
}

async fn recent_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentParams>,
) -> Json<RecentResponse> {
    Json(RecentResponse {
        records: state.engine.recent(params.n).await,
    })
}

async fn sweep_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ServerError> {
    retention::sweep(&state.log, &state.engine, state.config.max_day).await?;
    Ok(Json(
        serde_json::json!({ "status": "ok", "size": state.engine.size().await }),
    ))
}

/// Explicit user command: wipe the engine and the log together, so the next
/// sweep does not resurrect cleared turns from the log.
async fn clear_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.log.replace(Vec::new()).await?;
    state.engine.clear().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn persist_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ServerError> {
    state.engine.save().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn size_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "size": state.engine.size().await }))
}
