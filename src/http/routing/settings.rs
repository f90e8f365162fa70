use axum::{extract::State, response::IntoResponse, routing::{delete, get, post}, Json, Router};
use http::{header, StatusCode};

use super::AppState;
use crate::domain::{clock::Clock, storage::KeyValueStorage, store::Store, theme::{Theme, UnknownTheme}};
use crate::http::types::{ApiError, ThemeBody};

pub fn router<S: KeyValueStorage + 'static, C: Clock>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/settings/theme", get(get_theme::<S, C>).put(put_theme::<S, C>))
        .route("/settings/export", get(export_data::<S, C>))
        .route("/settings/import", post(import_data::<S, C>))
        .route("/settings/data", delete(clear_data::<S, C>))
        .with_state(state)
}

async fn get_theme<S: KeyValueStorage + 'static, C: Clock>(State(state): State<AppState<S, C>>) -> Result<Json<ThemeBody>, ApiError> {
    let theme = state.lock()?.theme();
    Ok(Json(ThemeBody { theme: theme.to_string() }))
}

async fn put_theme<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    Json(payload): Json<ThemeBody>,
) -> Result<Json<ThemeBody>, ApiError> {
    let theme: Theme = payload.theme.parse().map_err(|e: UnknownTheme| ApiError::invalid(e.to_string()))?;
    state.lock()?.set_theme(theme)?;
    Ok(Json(ThemeBody { theme: theme.to_string() }))
}

async fn export_data<S: KeyValueStorage + 'static, C: Clock>(State(state): State<AppState<S, C>>) -> Result<impl IntoResponse, ApiError> {
    let body = state.lock()?.export()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

async fn import_data<S: KeyValueStorage + 'static, C: Clock>(
    State(state): State<AppState<S, C>>,
    body: String,
) -> Result<Json<Store>, ApiError> {
    let mut guard = state.lock()?;
    guard.import(&body)?;
    Ok(Json(guard.snapshot().clone()))
}

async fn clear_data<S: KeyValueStorage + 'static, C: Clock>(State(state): State<AppState<S, C>>) -> Result<StatusCode, ApiError> {
    state.lock()?.clear_all_data()?;
    Ok(StatusCode::NO_CONTENT)
}
