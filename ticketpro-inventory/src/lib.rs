pub mod batch;
pub mod booking;
pub mod lifecycle;
pub mod ticket;

pub use batch::{BatchDesk, BatchFilter, BatchStock, NewBatch, TicketBatch};
pub use booking::{BookingForm, BookingRecord, BookingStatus, SettlementChoice};
pub use lifecycle::{BookingController, BookingDecision, BookingOutcome, TicketDesk, TicketFilter};
pub use ticket::{LockStatus, Ticket, TicketView};

use ticketpro_core::CoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: LockStatus,
        to: LockStatus,
    },

    #[error("Booking form incomplete: {0}")]
    IncompleteForm(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
