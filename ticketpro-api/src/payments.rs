use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use ticketpro_core::Actor;
use ticketpro_ledger::{PaymentApplication, PaymentRecord, PaymentStatus};
use ticketpro_shared::models::events::PaymentReceivedEvent;
use ticketpro_shared::BackOfficeEvent;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct PaymentQuery {
    status: Option<PaymentStatus>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/payments", get(list_payments))
        .route("/v1/payments/{id}", get(get_payment))
        .route("/v1/payments/{id}/apply", post(apply_payment))
}

async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentQuery>,
) -> Result<Json<Vec<PaymentRecord>>, AppError> {
    Ok(Json(state.ledger.list(query.status).await?))
}

async fn get_payment(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PaymentRecord>, AppError> {
    Ok(Json(state.ledger.get(id).await?))
}

async fn apply_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payment): Json<PaymentApplication>,
) -> Result<Json<PaymentRecord>, AppError> {
    let record = state.ledger.apply(id, &actor, &payment).await?;

    state.publish(BackOfficeEvent::PaymentReceived(PaymentReceivedEvent {
        payment_id: record.id,
        ticket_no: record.ticket_no.clone(),
        amount: payment.amount,
        remaining_amount: record.remaining_amount,
        timestamp: Utc::now().timestamp(),
    }));

    Ok(Json(record))
}
