use axum::{extract::{Path, State}, routing::{get, post, put}, Json, Router};
use http::StatusCode;

use super::{required, AppState};
use crate::domain::{
    category::{Category, CategoryId, CategoryPatch, NewCategory},
    clock::Clock,
    storage::KeyValueStorage,
    todo::Todo,
};
use crate::http::types::ApiError;

pub fn router<S: KeyValueStorage + 'static, C: Clock>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/categories", post(create_category::<S, C>))
        .route("/categories/:id", put(update_category::<S, C>).delete(delete_category::<S, C>))
        .route("/categories/:id/todos", get(list_category_todos::<S, C>))
        .with_state(state)
}

async fn create_category<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Json(mut payload): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    payload.name = required("name", &payload.name)?;
    let category = state.lock()?.add_category(payload)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
    Json(mut payload): Json<CategoryPatch>,
) -> Result<Json<Category>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        payload.name = Some(required("name", name)?);
    }
    let updated = state.lock()?.update_category(&CategoryId(id), payload)?;
    updated.map(Json).ok_or_else(ApiError::not_found)
}

async fn delete_category<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.lock()?.remove_category(&CategoryId(id))?;
    if deleted { Ok(StatusCode::NO_CONTENT) } else { Err(ApiError::not_found()) }
}

async fn list_category_todos<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let id = CategoryId(id);
    let guard = state.lock()?;
    let store = guard.snapshot();
    if store.find_category(&id).is_none() {
        return Err(ApiError::not_found());
    }
    Ok(Json(store.todos_in_category(&id).cloned().collect()))
}
