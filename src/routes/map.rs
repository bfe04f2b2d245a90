use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::app::AppState;
use crate::error::{AppError, AppResult};
use crate::feed::PageAssembler;
use crate::geo::validate_query;
use crate::models::{CreatePointRequest, MapDataParams, MapDataResponse, Point};

pub fn router() -> Router<AppState> {
    Router::new().route("/map-data", get(list_points).post(create_point))
}

async fn list_points(
    State(state): State<AppState>,
    Query(params): Query<MapDataParams>,
) -> AppResult<Json<MapDataResponse>> {
    let window = validate_query(&params, &state.config.query)?;
    let assembler = PageAssembler::new(state.store.clone(), state.config.query.clone());

    let response = tokio::task::spawn_blocking(move || assembler.assemble(&window))
        .await
        .map_err(|e| AppError::Internal(format!("Feed worker failed: {}", e)))??;

    Ok(Json(response))
}

async fn create_point(
    State(state): State<AppState>,
    payload: Result<Json<CreatePointRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Point>)> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let new_point = request.into_new_point()?;

    let store = state.store.clone();
    let point = tokio::task::spawn_blocking(move || store.insert(&new_point))
        .await
        .map_err(|e| AppError::Internal(format!("Insert worker failed: {}", e)))?
        .map_err(|e| match e {
            e if e.is_store_failure() => AppError::Store(e.to_string()),
            other => other,
        })?;

    info!("Created point {} ({}) in {}", point.id, point.title, point.category);
    Ok((StatusCode::CREATED, Json(point)))
}
