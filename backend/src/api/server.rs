//! HTTP server for the orderguard API.
//!
//! Uploads are validated in memory: no partition files are written and no
//! notification is sent.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/validate`   | Upload a CSV or JSON dataset         |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::Path, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::types::{error_response, ValidateResponse};
use crate::config::PipelineConfig;
use crate::error::ServerError;
use crate::parser::{is_json_path, parse_dataset_bytes};
use crate::pipeline::validate_dataset;
use crate::schema::RecordSchema;

/// Shared, read-only state for request handlers.
struct AppState {
    config: PipelineConfig,
    schema: RecordSchema,
}

type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server
pub async fn start_server(port: u16, config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let schema = config.build_schema()?;
    let state = Arc::new(AppState { config, schema });

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/validate", post(validate_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Orderguard server running on http://localhost:{}", port);
    println!("   POST /api/validate - Validate a dataset");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "orderguard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "validate": "POST /api/validate",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers drop the skipped entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Dataset upload endpoint
async fn validate_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ValidateResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(ServerError::BadRequest(format!("Read error: {}", e))))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data
        .ok_or_else(|| bad_request(ServerError::BadRequest("No file provided".to_string())))?;
    let name = file_name.unwrap_or_else(|| "upload.csv".to_string());

    log_info(format!("📄 New upload: {} ({} bytes)", name, bytes.len()));

    let is_json = is_json_path(Path::new(&name));
    let dataset = parse_dataset_bytes(&bytes, is_json, &state.config.rename, &state.schema)
        .map_err(|e| {
            log_error(format!("Read error: {}", e));
            // Source errors are the client's data, not a server fault
            bad_request(ServerError::Pipeline(e.into()))
        })?;

    let validated = validate_dataset(&dataset, &state.schema, &state.config);
    let summary = &validated.batch.summary;
    log_success(format!(
        "{}: {} rows, {} valid, {} invalid",
        name, summary.total, summary.valid, summary.invalid
    ));

    Ok(Json(ValidateResponse::new(&dataset, validated)))
}

fn bad_request(error: ServerError) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(&error.to_string())))
}
