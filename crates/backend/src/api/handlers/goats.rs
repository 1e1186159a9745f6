use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use contracts::domain::goat::aggregate::{Goat, GoatDto};

use crate::domain::goat::query::ListParams;
use crate::domain::goat::service::{self, ListPage};
use crate::error::AppError;
use crate::state::AppState;

/// GET /api/goats
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListPage>, AppError> {
    Ok(Json(service::list(&state.db, &params).await?))
}

/// GET /api/goats/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Goat>, AppError> {
    Ok(Json(service::get(&state.db, &id).await?))
}

/// POST /api/goats
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<GoatDto>, JsonRejection>,
) -> Result<(StatusCode, Json<Goat>), AppError> {
    let Json(dto) = payload?;
    let goat = service::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(goat)))
}

/// PATCH /api/goats/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GoatDto>, JsonRejection>,
) -> Result<Json<Goat>, AppError> {
    let Json(dto) = payload?;
    Ok(Json(service::update(&state.db, &id, dto).await?))
}

/// DELETE /api/goats/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service::remove(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
