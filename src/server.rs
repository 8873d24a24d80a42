// HTTP adapter: routes, CORS and status mapping over the store

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{CATEGORIES, Contact, Task};
use crate::record::Record;
use crate::store::{Collection, Store};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use eyre::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::{signal, task};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type SharedStore = Arc<Store>;

/// Request failure as seen by the client. Bodies are plain text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Mapping for read routes: missing file 404, undecodable file 400
    fn from_read(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Corrupt { .. } | StoreError::BadRequest(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }

    /// Mapping for write routes: only the request itself can be a 400
    fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, error = %self, "Request failed");
        (status, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct DeleteTaskRequest {
    #[serde(default)]
    task_id: String,
}

#[derive(Deserialize)]
struct RemoveContactRequest {
    #[serde(default, rename = "ID_contact")]
    id_contact: String,
}

pub fn build_router(store: SharedStore, config: &Config) -> Router {
    Router::new()
        .route("/contacts", get(list_records::<Contact>))
        .route("/categories", get(list_categories))
        .route("/tasks", get(list_records::<Task>))
        .route("/add_contact", post(create_record::<Contact>))
        .route("/add_task", post(create_record::<Task>))
        .route("/update_task", post(update_record::<Task>))
        .route("/del_task", delete(delete_task))
        .route("/remove_contact", delete(remove_contact))
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let mut parsed = Vec::new();
    for origin in &config.cors_origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => parsed.push(value),
            Err(err) => warn!("ignoring invalid CORS origin '{origin}': {err}"),
        }
    }
    layer.allow_origin(parsed)
}

/// Run a synchronous store call on the blocking pool
async fn run_blocking<R, F>(f: F) -> Result<R, ApiError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))
}

async fn list_records<T: Record>(State(store): State<SharedStore>) -> Result<Json<Collection<T>>, ApiError> {
    let records = run_blocking(move || store.list::<T>())
        .await?
        .map_err(ApiError::from_read)?;
    Ok(Json(records))
}

async fn list_categories(State(store): State<SharedStore>) -> Result<Response, ApiError> {
    let bytes = run_blocking(move || store.read_categories())
        .await?
        .map_err(ApiError::from_read)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

async fn create_record<T: Record>(
    State(store): State<SharedStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<Collection<T>>), ApiError> {
    let (_, records) = run_blocking(move || store.create::<T>(&body))
        .await?
        .map_err(ApiError::from_write)?;
    Ok((StatusCode::CREATED, Json(records)))
}

async fn update_record<T: Record>(State(store): State<SharedStore>, body: Bytes) -> Result<String, ApiError> {
    run_blocking(move || store.update::<T>(&body))
        .await?
        .map_err(ApiError::from_write)?;
    Ok(format!("{} updated successfully\n", T::label()))
}

async fn delete_task(State(store): State<SharedStore>, body: Bytes) -> Result<String, ApiError> {
    let request: DeleteTaskRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid JSON format".to_string()))?;
    delete_record::<Task>(store, request.task_id).await
}

async fn remove_contact(State(store): State<SharedStore>, body: Bytes) -> Result<String, ApiError> {
    let request: RemoveContactRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid JSON format".to_string()))?;
    delete_record::<Contact>(store, request.id_contact).await
}

async fn delete_record<T: Record>(store: SharedStore, id: String) -> Result<String, ApiError> {
    if id.is_empty() {
        return Err(ApiError::BadRequest(format!("{} ID not provided", T::label())));
    }

    let message = format!("{} with ID {} deleted successfully", T::label(), id);
    run_blocking(move || store.delete::<T>(&id))
        .await?
        .map_err(ApiError::from_write)?;
    Ok(message)
}

/// Start the HTTP server and run until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    let store = Store::open(&config.data_dir).with_id_policy(config.id_policy);

    for collection in [Contact::collection_name(), Task::collection_name(), CATEGORIES] {
        let path = store.collection_path(collection);
        if !path.exists() {
            warn!(collection, file = ?path, "Collection file missing; run `minibackend init` to create it");
        }
    }

    let app = build_router(Arc::new(store), &config);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(bind = %config.bind, data_dir = ?config.data_dir, id_policy = ?config.id_policy, "Starting HTTP server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
