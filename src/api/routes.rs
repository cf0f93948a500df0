//! REST endpoints for tasks.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::TaskError;
use crate::tasks::TaskService;

/// Build the Axum router for the task API.
pub fn task_routes(service: TaskService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/handlers", get(list_handlers))
        .route("/tasks", post(create_task))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route("/tasks/{id}/retry", patch(retry_task))
        .with_state(service)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "task-pool"
    }))
}

async fn list_handlers(State(service): State<TaskService>) -> impl IntoResponse {
    Json(serde_json::json!({ "handlers": service.registry().names() }))
}

// ── Tasks ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateTaskRequest {
    name: String,
    payload: String,
}

async fn create_task(
    State(service): State<TaskService>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, route = "create_task", "Malformed request body");
            return error_response(StatusCode::BAD_REQUEST, e.body_text());
        }
    };

    match service.create(&body.name, body.payload).await {
        Ok(task) => (StatusCode::CREATED, Json(task.view())).into_response(),
        Err(e) => task_error_response("create_task", e),
    }
}

async fn get_task(State(service): State<TaskService>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return invalid_id();
    };

    match service.get(id).await {
        Ok(task) => (StatusCode::OK, Json(task.view())).into_response(),
        Err(e) => task_error_response("get_task", e),
    }
}

async fn retry_task(State(service): State<TaskService>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return invalid_id();
    };

    match service.retry(id).await {
        Ok(task) => (StatusCode::OK, Json(task.view())).into_response(),
        Err(e) => task_error_response("retry_task", e),
    }
}

async fn delete_task(State(service): State<TaskService>, Path(id): Path<String>) -> Response {
    let Some(id) = parse_id(&id) else {
        return invalid_id();
    };

    match service.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "deleted"})),
        )
            .into_response(),
        Err(e) => task_error_response("delete_task", e),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn invalid_id() -> Response {
    error_response(StatusCode::BAD_REQUEST, "Invalid task ID")
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({"error": message.into()}))).into_response()
}

/// Map a facade error onto an HTTP status.
fn task_error_response(route: &str, err: TaskError) -> Response {
    let status = match &err {
        TaskError::NotFound { .. } => StatusCode::NOT_FOUND,
        TaskError::HandlerResolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TaskError::InvalidState { .. } => StatusCode::CONFLICT,
        TaskError::Storage(_) | TaskError::Execution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(route, error = %err, "Request failed");
    } else {
        warn!(route, error = %err, "Request rejected");
    }

    error_response(status, err.to_string())
}
