use std::sync::Arc;
use ticketpro_core::{Actor, Permission, Repository};
use ticketpro_inventory::BookingRecord;
use tracing::{info, warn};
use uuid::Uuid;

use crate::payment::{PaymentApplication, PaymentRecord, PaymentStatus};
use crate::LedgerError;

/// Customer payment tracking
pub struct PaymentLedger {
    records: Arc<dyn Repository<PaymentRecord>>,
}

impl PaymentLedger {
    pub fn new(records: Arc<dyn Repository<PaymentRecord>>) -> Self {
        Self { records }
    }

    pub async fn list(&self, status: Option<PaymentStatus>) -> Result<Vec<PaymentRecord>, LedgerError> {
        let records = self.records.list().await?;
        Ok(records
            .into_iter()
            .filter(|r| status.map_or(true, |s| r.payment_status == s))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<PaymentRecord, LedgerError> {
        self.records.get(id).await?.ok_or(LedgerError::NotFound(id))
    }

    /// Open the receivable for a confirmed booking
    pub async fn open_for_booking(&self, booking: &BookingRecord) -> Result<PaymentRecord, LedgerError> {
        let record = self.records.insert(PaymentRecord::open_for_booking(booking)).await?;
        info!(
            ticket = %record.ticket_no,
            total = record.total_amount,
            paid = record.paid_amount,
            status = record.payment_status.as_str(),
            "Payment record opened"
        );
        Ok(record)
    }

    pub async fn apply(
        &self,
        id: Uuid,
        actor: &Actor,
        payment: &PaymentApplication,
    ) -> Result<PaymentRecord, LedgerError> {
        actor.require(Permission::RecordPayment)?;

        let mut record = self.get(id).await?;
        if let Err(e) = record.apply(payment) {
            warn!(ticket = %record.ticket_no, amount = payment.amount, error = %e, "Payment rejected");
            return Err(e);
        }
        let record = self.records.update(record).await?;

        info!(
            ticket = %record.ticket_no,
            amount = payment.amount,
            remaining = record.remaining_amount,
            actor = %actor.name,
            "Payment recorded"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::sample;
    use ticketpro_core::{InMemoryRepository, Role};
    use ticketpro_inventory::{BookingForm, BookingStatus, SettlementChoice, Ticket};

    fn ledger_with(records: Vec<PaymentRecord>) -> PaymentLedger {
        PaymentLedger::new(Arc::new(InMemoryRepository::with_items(records)))
    }

    fn ticket() -> Ticket {
        Ticket::new(
            "BD003",
            "Qatar Airways",
            "Doha, Qatar",
            chrono::NaiveDate::from_ymd_opt(2024, 2, 18).unwrap(),
            chrono::NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            46500,
            42000,
        )
    }

    #[tokio::test]
    async fn test_manager_records_payment() {
        let record = sample(48000, 25000);
        let id = record.id;
        let ledger = ledger_with(vec![record]);
        let manager = Actor::new("Sarah Khan", Role::Manager);

        let updated = ledger.apply(id, &manager, &PaymentApplication::new(23000)).await.unwrap();
        assert_eq!(updated.payment_status, PaymentStatus::Full);
        assert_eq!(ledger.get(id).await.unwrap().remaining_amount, 0);
        assert_eq!(ledger.list(Some(PaymentStatus::Full)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_staff_cannot_record_payment() {
        let record = sample(48000, 25000);
        let id = record.id;
        let ledger = ledger_with(vec![record]);
        let staff = Actor::new("Jane", Role::Staff);

        assert!(ledger.apply(id, &staff, &PaymentApplication::new(1000)).await.is_err());
        assert_eq!(ledger.get(id).await.unwrap().paid_amount, 25000);
    }

    #[tokio::test]
    async fn test_unknown_record() {
        let ledger = ledger_with(vec![]);
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        let missing = Uuid::new_v4();
        assert!(matches!(
            ledger.apply(missing, &admin, &PaymentApplication::new(1000)).await,
            Err(LedgerError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_booking_opens_record() {
        let ledger = ledger_with(vec![]);
        let ticket = ticket();

        let mut form = BookingForm::new("Sundarban Tours", "Rashida Begum");
        form.pax_count = 2;
        form.payment_status = SettlementChoice::Partial;
        form.partial_amount = 0;
        let booking = BookingRecord::new(&ticket, &form, "Ahmed Rahman", BookingStatus::Confirmed);

        let record = ledger.open_for_booking(&booking).await.unwrap();
        assert_eq!(record.total_amount, 93000);
        assert_eq!(record.remaining_amount, 93000);
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.due_date, Some(ticket.departure_date));

        form.partial_amount = 40000;
        let booking = BookingRecord::new(&ticket, &form, "Ahmed Rahman", BookingStatus::Confirmed);
        let record = ledger.open_for_booking(&booking).await.unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Partial);
        assert_eq!(record.remaining_amount, 53000);

        form.payment_status = SettlementChoice::Full;
        let booking = BookingRecord::new(&ticket, &form, "Ahmed Rahman", BookingStatus::Confirmed);
        let record = ledger.open_for_booking(&booking).await.unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Full);
        assert_eq!(record.due_date, None);
    }
}
