use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use ticketpro_core::task::{self, TaskOutcome};
use ticketpro_core::Actor;
use ticketpro_inventory::{
    BookingDecision, BookingForm, BookingRecord, BookingStatus, Ticket, TicketFilter, TicketView,
};
use ticketpro_ledger::PaymentRecord;
use ticketpro_shared::models::events::{TicketConfirmedEvent, TicketLockedEvent, TicketReleasedEvent};
use ticketpro_shared::BackOfficeEvent;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub ticket: TicketView,
    pub booking: BookingRecord,
    #[serde(flatten)]
    pub decision: BookingDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentRecord>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub ticket: TicketView,
    pub booking: Option<BookingRecord>,
    pub payment: Option<PaymentRecord>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/tickets", get(list_tickets))
        .route("/v1/tickets/{id}", get(get_ticket))
        .route("/v1/tickets/{id}/book", post(book_ticket))
        .route("/v1/tickets/{id}/unlock", post(unlock_ticket))
        .route("/v1/tickets/{id}/confirm", post(confirm_ticket))
        .route("/v1/locks/expired", get(expired_locks))
        .route("/v1/locks/release-expired", post(release_expired_locks))
        .route("/v1/bookings", get(list_bookings))
}

async fn list_tickets(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<TicketFilter>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let tickets = state.desk.list(&filter).await?;
    Ok(Json(tickets.iter().map(|t| t.view_for(actor.role)).collect()))
}

async fn get_ticket(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketView>, AppError> {
    let ticket = state.desk.get(id).await?;
    Ok(Json(ticket.view_for(actor.role)))
}

/// The booking dialog's "processing" step runs as a cancellable task.
/// A client that goes away before the delay elapses cancels the booking.
async fn book_ticket(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(form): Json<BookingForm>,
) -> Result<Json<BookingResponse>, AppError> {
    let delay = Duration::from_millis(state.business_rules.booking_delay_ms);
    let worker = state.clone();

    let handle = task::spawn("booking", move |token| async move {
        token.sleep(delay).await?;
        Ok(apply_booking(&worker, id, &actor, &form).await)
    });

    match handle.outcome().await {
        TaskOutcome::Completed(result) => result.map(Json),
        TaskOutcome::Cancelled => Err(AppError::ConflictError("Booking was cancelled".to_string())),
        TaskOutcome::Failed(reason) => Err(AppError::InternalServerError(reason)),
    }
}

async fn apply_booking(
    state: &AppState,
    ticket_id: Uuid,
    actor: &Actor,
    form: &BookingForm,
) -> Result<BookingResponse, AppError> {
    let outcome = state.desk.book(ticket_id, actor, form).await?;
    let booking = state.bookings.insert(outcome.booking).await?;
    let now = Utc::now().timestamp();

    let payment = match &outcome.decision {
        BookingDecision::Confirmed => {
            let payment = settle_confirmed(state, &booking).await?;
            state.publish(BackOfficeEvent::TicketConfirmed(TicketConfirmedEvent {
                ticket_id,
                serial_number: outcome.ticket.serial_number.clone(),
                confirmed_by: actor.name.clone(),
                passenger_name: booking.passenger_name.clone(),
                timestamp: now,
            }));
            Some(payment)
        }
        BookingDecision::Locked { locked_by, lock_expiry } => {
            state.publish(BackOfficeEvent::TicketLocked(TicketLockedEvent {
                ticket_id,
                serial_number: outcome.ticket.serial_number.clone(),
                locked_by: locked_by.clone(),
                lock_expiry: lock_expiry.timestamp(),
                timestamp: now,
            }));
            None
        }
    };

    Ok(BookingResponse {
        ticket: outcome.ticket.view_for(actor.role),
        booking,
        decision: outcome.decision,
        payment,
    })
}

/// Open the receivable and credit the originating agent
async fn settle_confirmed(state: &AppState, booking: &BookingRecord) -> Result<PaymentRecord, AppError> {
    let payment = state.ledger.open_for_booking(booking).await?;
    if state
        .agents
        .record_booking(&booking.agent_name, booking.total_amount)
        .await?
        .is_none()
    {
        info!(agent = %booking.agent_name, "Booking agent is not in the directory, no commission recorded");
    }
    Ok(payment)
}

/// Move the ticket's pending booking, if any, to `status`
async fn close_pending_booking(
    state: &AppState,
    ticket_id: Uuid,
    status: BookingStatus,
) -> Result<Option<BookingRecord>, AppError> {
    let pending = state
        .bookings
        .list()
        .await?
        .into_iter()
        .find(|b| b.ticket_id == ticket_id && b.is_pending());

    match pending {
        Some(mut booking) => {
            booking.status = status;
            Ok(Some(state.bookings.update(booking).await?))
        }
        None => {
            warn!(%ticket_id, "No pending booking for ticket");
            Ok(None)
        }
    }
}

async fn release(state: &AppState, ticket: &Ticket, actor: &Actor, lock_expired: bool) -> Result<(), AppError> {
    close_pending_booking(state, ticket.id, BookingStatus::Released).await?;
    state.publish(BackOfficeEvent::TicketReleased(TicketReleasedEvent {
        ticket_id: ticket.id,
        serial_number: ticket.serial_number.clone(),
        released_by: actor.name.clone(),
        lock_expired,
        timestamp: Utc::now().timestamp(),
    }));
    Ok(())
}

async fn unlock_ticket(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketView>, AppError> {
    let ticket = state.desk.unlock(id, &actor).await?;
    release(&state, &ticket, &actor, false).await?;
    Ok(Json(ticket.view_for(actor.role)))
}

async fn confirm_ticket(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let ticket = state.desk.confirm_lock(id, &actor).await?;
    let booking = close_pending_booking(&state, id, BookingStatus::Confirmed).await?;

    let payment = match &booking {
        Some(booking) => Some(settle_confirmed(&state, booking).await?),
        None => None,
    };

    state.publish(BackOfficeEvent::TicketConfirmed(TicketConfirmedEvent {
        ticket_id: id,
        serial_number: ticket.serial_number.clone(),
        confirmed_by: actor.name.clone(),
        passenger_name: booking.as_ref().map(|b| b.passenger_name.clone()).unwrap_or_default(),
        timestamp: Utc::now().timestamp(),
    }));

    Ok(Json(ConfirmResponse {
        ticket: ticket.view_for(actor.role),
        booking,
        payment,
    }))
}

async fn expired_locks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let tickets = state.desk.expired_locks(Utc::now()).await?;
    Ok(Json(tickets.iter().map(|t| t.view_for(actor.role)).collect()))
}

async fn release_expired_locks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let released = state.desk.release_expired_locks(&actor, Utc::now()).await?;
    for ticket in &released {
        release(&state, ticket, &actor, true).await?;
    }
    Ok(Json(released.iter().map(|t| t.view_for(actor.role)).collect()))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingRecord>>, AppError> {
    let mut bookings = state.bookings.list().await?;
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(bookings))
}
