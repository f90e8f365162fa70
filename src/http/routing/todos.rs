use axum::{extract::{Path, State}, routing::{post, put}, Json, Router};
use http::StatusCode;

use super::{required, AppState};
use crate::domain::{clock::Clock, storage::KeyValueStorage, todo::{NewTodo, Todo, TodoId, TodoPatch}};
use crate::http::types::ApiError;

pub fn router<S: KeyValueStorage + 'static, C: Clock>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/todos", post(create_todo::<S, C>))
        .route("/todos/:id", put(update_todo::<S, C>).delete(delete_todo::<S, C>))
        .route("/todos/:id/toggle", post(toggle_todo::<S, C>))
        .with_state(state)
}

async fn create_todo<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Json(mut payload): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    payload.title = required("title", &payload.title)?;
    let todo = state.lock()?.add_todo(payload)?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
    Json(mut payload): Json<TodoPatch>,
) -> Result<Json<Todo>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        payload.title = Some(required("title", title)?);
    }
    let updated = state.lock()?.update_todo(&TodoId(id), payload)?;
    updated.map(Json).ok_or_else(ApiError::not_found)
}

async fn toggle_todo<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, ApiError> {
    let toggled = state.lock()?.toggle_todo_completion(&TodoId(id))?;
    toggled.map(Json).ok_or_else(ApiError::not_found)
}

async fn delete_todo<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.lock()?.remove_todo(&TodoId(id))?;
    if deleted { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::not_found()) }
}
