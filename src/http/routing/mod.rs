pub mod categories;
pub mod settings;
pub mod todos;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::State, routing::get, Json, Router};

use crate::application::task_store::TaskStore;
use crate::domain::{clock::{Clock, SystemClock}, storage::KeyValueStorage, store::{Store, StoreStats}};
use crate::http::types::ApiError;

/// Shared handle on the session's single [`TaskStore`].
pub struct AppState<S, C = SystemClock> {
    pub store: Arc<Mutex<TaskStore<S, C>>>,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: KeyValueStorage, C: Clock> AppState<S, C> {
    pub fn new(store: TaskStore<S, C>) -> Self { Self { store: Arc::new(Mutex::new(store)) } }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, TaskStore<S, C>>, ApiError> {
        self.store.lock().map_err(|_| ApiError::internal("store lock poisoned"))
    }
}

pub fn app(router: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(router)
}

pub fn api<S: KeyValueStorage + 'static, C: Clock>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/store", get(get_store::<S, C>))
        .route("/store/stats", get(get_stats::<S, C>))
        .with_state(state.clone())
        .merge(todos::router(state.clone()))
        .merge(categories::router(state.clone()))
        .merge(settings::router(state))
}

async fn get_store<S: KeyValueStorage + 'static, C: Clock>(State(state): State<AppState<S, C>>) -> Result<Json<Store>, ApiError> {
    Ok(Json(state.lock()?.snapshot().clone()))
}

async fn get_stats<S: KeyValueStorage + 'static, C: Clock>(State(state): State<AppState<S, C>>) -> Result<Json<StoreStats>, ApiError> {
    Ok(Json(state.lock()?.snapshot().stats()))
}

/// Trimmed value of a field the presentation layer requires to be non-blank.
pub(crate) fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
