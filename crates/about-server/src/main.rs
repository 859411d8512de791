//! About development server
//!
//! Hosts the two collaborators of the About page engine for local work: a
//! content-addressed store and a ledger holding the canonical list id. The
//! resolved page is exposed so the read model can be inspected.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health              -> "ok"
//! POST /store               raw body -> {"cid": "<id>"}
//! GET  /store/{cid}         -> raw body
//! GET  /ledger/content      -> {"content_id": "<id>" | null}
//! POST /ledger/content      {"content_id": "<id>"} -> receipt
//! GET  /widgets             -> resolved widgets of the anchored list
//! ```

use about_core::{
    AboutConfig, ContentId, ContentStore, Ledger, LedgerError, MemoryLedger, Receipt,
    StorageError, WidgetEntry, WidgetSyncEngine,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "ABOUT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "about.json";

/// Shared server state
struct AppState {
    store: Arc<dyn ContentStore>,
    ledger: Arc<MemoryLedger>,
    engine: WidgetSyncEngine,
    pin: bool,
}

impl AppState {
    fn new(store: Arc<dyn ContentStore>, pin: bool) -> Self {
        Self {
            engine: WidgetSyncEngine::new(store.clone()),
            store,
            ledger: Arc::new(MemoryLedger::new()),
            pin,
        }
    }
}

/// Errors mapped onto HTTP responses
#[derive(Debug)]
enum ApiError {
    Storage(StorageError),
    Ledger(LedgerError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::Unreachable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(LedgerError::Rejected(_)) => StatusCode::CONFLICT,
            ApiError::Ledger(LedgerError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let message = match self {
            ApiError::Storage(e) => e.to_string(),
            ApiError::Ledger(e) => e.to_string(),
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PutResponse {
    cid: ContentId,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentBody {
    content_id: Option<ContentId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UpdateContent {
    content_id: ContentId,
}

#[derive(Debug, Serialize, Deserialize)]
struct WidgetsResponse {
    content_id: Option<ContentId>,
    syncing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    list_error: Option<String>,
    widgets: Vec<WidgetEntry>,
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/store", axum::routing::post(put_block))
        .route("/store/{cid}", get(get_block))
        .route("/ledger/content", get(current_content).post(update_content))
        .route("/widgets", get(widgets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "about_server=info,about_core=info,tower_http=info".into()),
        )
        .init();

    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AboutConfig::load(&config_path)?;
    info!("Using {:?} content store", config.store);

    let state = Arc::new(AppState::new(config.store.open()?, config.pin));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("About development server listening on {}", config.bind);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// Store a payload
async fn put_block(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PutResponse>, ApiError> {
    let cid = state.store.put(&body, state.pin).await?;
    info!("Stored {} bytes as {}", body.len(), cid);
    Ok(Json(PutResponse { cid }))
}

/// Fetch a payload
async fn get_block(
    State(state): State<Arc<AppState>>,
    Path(cid): Path<String>,
) -> Result<Vec<u8>, ApiError> {
    Ok(state.store.get(&ContentId::new(cid)).await?)
}

/// Read the anchored list id
async fn current_content(State(state): State<Arc<AppState>>) -> Result<Json<ContentBody>, ApiError> {
    let content_id = state.ledger.current_content().await?;
    Ok(Json(ContentBody { content_id }))
}

/// Anchor a new list id
async fn update_content(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateContent>,
) -> Result<Json<Receipt>, ApiError> {
    let receipt = state.ledger.update_content(&body.content_id).await.map_err(|e| {
        warn!("Content update to {} refused: {}", body.content_id, e);
        ApiError::from(e)
    })?;
    info!("Anchored {} (sequence {})", receipt.content_id, receipt.sequence);
    Ok(Json(receipt))
}

/// Resolve the anchored list into widgets
async fn widgets(State(state): State<Arc<AppState>>) -> Result<Json<WidgetsResponse>, ApiError> {
    let content_id = state.ledger.current_content().await?;
    state.engine.resolve(content_id).await;
    for event in state.engine.poll_events() {
        debug!("Sync event: {:?}", event);
    }

    Ok(Json(WidgetsResponse {
        content_id: state.engine.list_id(),
        syncing: state.engine.is_syncing(),
        list_error: state.engine.list_error(),
        widgets: state.engine.entries(),
    }))
}
