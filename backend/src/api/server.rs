//! HTTP Server for the stockview dashboard.
//!
//! Serves the aggregate views of one in-memory session. The frontend
//! forwards clicks and hovers as commands and renders the returned views.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | GET    | `/api/dashboard`  | Current aggregates and selection         |
//! | GET    | `/api/options`    | Distinct years, regions and categories   |
//! | POST   | `/api/command`    | Apply a selection/highlight command      |
//! | GET    | `/api/records`    | Raw rows, `search=` and `col.<name>=`    |
//! | POST   | `/api/upload`     | Upload a CSV, replacing the dataset      |
//! | GET    | `/api/events`     | SSE stream of views after each mutation  |
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::state::AppState;
use super::types::{table_query_from_params, DashboardResponse, TableResponse, UploadResponse};
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::session::{Command, FilterOptions};
use crate::transform::pipeline::{load_bytes, load_source, Dataset, LoadOptions};

/// Start the HTTP server
pub async fn start_server(config: Config) -> ServerResult<()> {
    let options = LoadOptions {
        delimiter: config.delimiter,
    };

    let dataset = match config.data_source.as_deref() {
        Some(source) => load_source(source, &options).await.map_err(|e| {
            log_error(format!("Failed to load dataset: {}", e));
            e
        })?,
        None => {
            log_info("No dataset configured, waiting for an upload");
            Dataset::empty()
        }
    };

    let state = AppState::new(dataset, config.event_capacity);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Stockview server running on http://localhost:{}", config.port);
    println!("   GET  /api/dashboard - Aggregates for the current selection");
    println!("   POST /api/command   - Select / highlight / reset");
    println!("   GET  /api/records   - Raw table rows");
    println!("   POST /api/upload    - Upload CSV file");
    println!("   GET  /api/events    - SSE dashboard updates");
    println!("   GET  /api/logs      - SSE log stream");
    println!("   GET  /health        - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    // Permissive CORS for the standalone dashboard
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/options", get(options))
        .route("/api/command", post(command))
        .route("/api/records", get(records))
        .route("/api/upload", post(upload_csv))
        .route("/api/events", get(sse_events))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "stockview",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "dashboard": "GET /api/dashboard",
            "command": "POST /api/command",
            "records": "GET /api/records",
            "upload": "POST /api/upload",
            "events": "GET /api/events (SSE)",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(state.dashboard().await)
}

async fn options(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(state.options().await)
}

async fn command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<DashboardResponse> {
    Json(state.apply(command).await)
}

async fn records(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<TableResponse> {
    let query = table_query_from_params(&params);
    Json(state.table(&query).await)
}

/// Upload CSV endpoint
async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    // Decoding and parsing are CPU-bound; keep them off the async workers
    let dataset = tokio::task::spawn_blocking(move || load_bytes(&bytes, &LoadOptions::default()))
        .await
        .map_err(|e| ServerError::Internal(format!("Upload task failed: {}", e)))?
        .map_err(|e| {
            log_error(format!("Failed to load dataset: {}", e));
            ServerError::Load(e)
        })?;

    let response = state.replace_dataset(dataset).await;
    log_success(format!(
        "Session {} ready: {} records",
        response.session_id, response.view.total_records
    ));

    Ok(Json(response))
}

/// SSE endpoint for dashboard views published after each mutation
async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_from(BroadcastStream::new(state.subscribe()))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_from(BroadcastStream::new(LOG_BROADCASTER.subscribe()))
}

/// Serialize every received item as an SSE data event; lagged items are dropped.
fn sse_from<T, S, E>(stream: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize,
    S: Stream<Item = Result<T, E>> + Send + 'static,
{
    let events = stream.filter_map(|result| {
        let item = result.ok()?;
        let json = serde_json::to_string(&item).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(events).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
