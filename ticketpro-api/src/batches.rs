use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use ticketpro_core::Actor;
use ticketpro_inventory::{BatchFilter, BatchStock, NewBatch};
use ticketpro_reports::{batch_metrics, BatchMetrics};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct BatchListResponse {
    batches: Vec<BatchStock>,
    metrics: BatchMetrics,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/batches", get(list_batches).post(register_batch))
}

async fn list_batches(
    State(state): State<AppState>,
    Query(filter): Query<BatchFilter>,
) -> Result<Json<BatchListResponse>, AppError> {
    let batches = state.batches.list(&filter).await?;
    let metrics = batch_metrics(&batches);
    Ok(Json(BatchListResponse { batches, metrics }))
}

async fn register_batch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<NewBatch>,
) -> Result<(StatusCode, Json<BatchStock>), AppError> {
    let stock = state.batches.register(&actor, req).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}
