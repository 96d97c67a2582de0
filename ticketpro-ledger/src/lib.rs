pub mod ledger;
pub mod payment;

pub use ledger::PaymentLedger;
pub use payment::{PaymentApplication, PaymentRecord, PaymentStatus};

use ticketpro_core::CoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Payment record not found: {0}")]
    NotFound(Uuid),

    #[error("Payment of {amount} exceeds remaining amount {remaining}")]
    Overpayment { amount: i64, remaining: i64 },

    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error(transparent)]
    Core(#[from] CoreError),
}
