use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use ticketpro_inventory::{LockStatus, TicketFilter};
use ticketpro_ops::Notification;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
struct InboxResponse {
    notifications: Vec<Notification>,
    unread: usize,
}

#[derive(Debug, Serialize)]
struct MarkedResponse {
    marked: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/notifications", get(list_notifications))
        .route("/v1/notifications/read-all", post(mark_all_read))
        .route("/v1/notifications/check-expiries", post(check_expiries))
        .route("/v1/notifications/{id}/read", post(mark_read))
        .route("/v1/notifications/{id}", delete(delete_notification))
}

async fn list_notifications(State(state): State<AppState>) -> Json<InboxResponse> {
    Json(InboxResponse {
        notifications: state.inbox.list().await,
        unread: state.inbox.unread_count().await,
    })
}

async fn mark_read(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Notification>, AppError> {
    Ok(Json(state.inbox.mark_read(id).await?))
}

async fn mark_all_read(State(state): State<AppState>) -> Json<MarkedResponse> {
    Json(MarkedResponse {
        marked: state.inbox.mark_all_read().await,
    })
}

async fn delete_notification(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, AppError> {
    state.inbox.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Raise expiry alerts for locked tickets; returns only the new notifications
async fn check_expiries(State(state): State<AppState>) -> Result<Json<Vec<Notification>>, AppError> {
    let filter = TicketFilter {
        status: Some(LockStatus::Locked),
        ..TicketFilter::default()
    };
    let locked = state.desk.list(&filter).await?;
    let created = state
        .inbox
        .check_lock_expiries(&locked, Utc::now(), state.expiry_windows())
        .await;
    Ok(Json(created))
}
