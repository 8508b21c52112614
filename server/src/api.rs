//! HTTP API for the mock backend

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use recipebook_core::{RecipebookError, RecordId, ServerConfig};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::db::SharedMockDb;

/// API state containing the mock database
pub type ApiState = SharedMockDb;

/// Error body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// HTTP status for a backend error
pub fn status_for(err: &RecipebookError) -> StatusCode {
    match err {
        RecipebookError::NotFound(_) => StatusCode::NOT_FOUND,
        RecipebookError::Conflict(_) => StatusCode::CONFLICT,
        RecipebookError::InvalidRecord(_) | RecipebookError::SerializationError(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: RecipebookError) -> Response {
    let status = status_for(&err);
    warn!("{} {}", status.as_u16(), err);
    (status, Json(ApiError::new(err))).into_response()
}

fn parse_id(raw: &str) -> Result<RecordId, Response> {
    raw.parse::<RecordId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(format!("Invalid id: {}", raw))),
        )
            .into_response()
    })
}

/// Create API router
pub fn create_router(state: ApiState, config: &ServerConfig) -> Router {
    let root = format!("/{}", config.api_root.trim_matches('/'));

    let router = Router::new()
        // Health
        .route("/health", get(health))
        // Collections
        .route(
            &format!("{}/:collection", root),
            get(list_records).post(create_record),
        )
        .route(
            &format!("{}/:collection/:id", root),
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// List a collection
async fn list_records(State(db): State<ApiState>, Path(collection): Path<String>) -> Response {
    match db.list(&collection) {
        Ok(records) => (StatusCode::OK, Json(Value::Array(records))).into_response(),
        Err(e) => error_response(e),
    }
}

/// Get one record
async fn get_record(
    State(db): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match db.get(&collection, id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Create a record
async fn create_record(
    State(db): State<ApiState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    match db.insert(&collection, body) {
        Ok(record) => {
            info!("Created {} in {}", record["id"], collection);
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Replace a record
async fn update_record(
    State(db): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match db.update(&collection, id, body) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Delete a record; absent ids still answer 204
async fn delete_record(
    State(db): State<ApiState>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match db.remove(&collection, id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// Start API server
pub async fn start_api_server(db: SharedMockDb, config: &ServerConfig) -> anyhow::Result<()> {
    let router = create_router(db, config);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Mock API listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Error waiting for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
