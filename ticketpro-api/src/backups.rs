use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use ticketpro_core::Actor;
use ticketpro_ops::{BackupOverview, BackupSettings};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct BackupStarted {
    status: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/backups", get(overview))
        .route("/v1/backups/run", post(run_backup))
        .route("/v1/backups/cancel", post(cancel_backup))
        .route("/v1/backups/settings", put(update_settings))
}

async fn overview(State(state): State<AppState>) -> Json<BackupOverview> {
    Json(state.backups.overview().await)
}

/// Starts the run and returns at once; progress shows up in the overview
async fn run_backup(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<(StatusCode, Json<BackupStarted>), AppError> {
    let handle = state.backups.start_manual(&actor).await?;
    handle.detach();
    Ok((StatusCode::ACCEPTED, Json(BackupStarted { status: "running" })))
}

async fn cancel_backup(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<StatusCode, AppError> {
    state.backups.cancel(&actor).await?;
    Ok(StatusCode::ACCEPTED)
}

async fn update_settings(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(settings): Json<BackupSettings>,
) -> Result<Json<BackupSettings>, AppError> {
    Ok(Json(state.backups.update_settings(&actor, settings).await?))
}
