//! Task CRUD endpoints.
//!
//! - `GET /api/tasks` - List tasks, newest first
//! - `POST /api/tasks` - Create a task
//! - `PUT /api/tasks/:id` - Partially update a task
//! - `DELETE /api/tasks/:id` - Delete a task

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error::ApiError;
use super::routes::AppState;
use super::types::{CreateTaskRequest, UpdateTaskRequest};
use crate::task::{NewTask, Task, TaskError, TaskPatch};

/// Create task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/:id", put(update_task).delete(delete_task))
}

/// JSON request body. A missing or blank body reads as `{}`; anything
/// unparseable is a 400 with the usual `{error}` shape.
struct JsonBody<T>(T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            ApiError::Validation("invalid JSON body".to_string())
        })
    }
}

/// Only JSON strings can carry a title.
fn title_text(value: &serde_json::Value) -> Result<&str, TaskError> {
    value.as_str().ok_or(TaskError::TitleRequired)
}

/// GET /api/tasks - List all tasks.
async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list_tasks().await?;
    Ok(Json(tasks))
}

/// POST /api/tasks - Create a new task.
async fn create_task(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = req.title.as_ref().ok_or(TaskError::TitleRequired)?;
    let new = NewTask::new(title_text(title)?, req.done.unwrap_or_default().into())?;
    let task = state.store.create_task(new).await?;
    tracing::debug!("Created task {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/:id - Update only the supplied fields.
async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let title = req.title.as_ref().map(title_text).transpose()?;
    let patch = TaskPatch::new(title, req.done.map(bool::from))?;
    let task = state
        .store
        .update_task(&id, &patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id - Delete a task.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_task(&id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::debug!("Deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}
