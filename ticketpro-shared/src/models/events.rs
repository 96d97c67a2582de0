use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TicketLockedEvent {
    pub ticket_id: Uuid,
    pub serial_number: String,
    pub locked_by: String,
    pub lock_expiry: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TicketConfirmedEvent {
    pub ticket_id: Uuid,
    pub serial_number: String,
    pub confirmed_by: String,
    pub passenger_name: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct TicketReleasedEvent {
    pub ticket_id: Uuid,
    pub serial_number: String,
    pub released_by: String,
    pub lock_expired: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PaymentReceivedEvent {
    pub payment_id: Uuid,
    pub ticket_no: String,
    pub amount: i64,
    pub remaining_amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BackupFinishedEvent {
    pub backup_id: Uuid,
    pub kind: String,
    pub succeeded: bool,
    pub timestamp: i64,
}

/// Everything the back office broadcasts to live subscribers (SSE, inbox).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackOfficeEvent {
    TicketLocked(TicketLockedEvent),
    TicketConfirmed(TicketConfirmedEvent),
    TicketReleased(TicketReleasedEvent),
    PaymentReceived(PaymentReceivedEvent),
    BackupFinished(BackupFinishedEvent),
}

impl BackOfficeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BackOfficeEvent::TicketLocked(_) => "ticket_locked",
            BackOfficeEvent::TicketConfirmed(_) => "ticket_confirmed",
            BackOfficeEvent::TicketReleased(_) => "ticket_released",
            BackOfficeEvent::PaymentReceived(_) => "payment_received",
            BackOfficeEvent::BackupFinished(_) => "backup_finished",
        }
    }
}
