use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ticketpro_core::Entity;
use ticketpro_shared::Masked;
use uuid::Uuid;

use crate::ticket::Ticket;
use crate::InventoryError;

/// How the customer settles at booking time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementChoice {
    #[default]
    Full,
    Partial,
}

fn one() -> u32 {
    1
}

/// What the booking dialog submits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingForm {
    pub agent_name: String,
    #[serde(default)]
    pub agent_address: String,
    #[serde(default)]
    pub agent_phone: String,
    pub passenger_name: String,
    #[serde(default)]
    pub passport_no: Masked<String>,
    #[serde(default)]
    pub mobile_no: Masked<String>,
    #[serde(default = "one")]
    pub pax_count: u32,
    /// Defaults to the ticket price
    #[serde(default)]
    pub selling_price: Option<i64>,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub payment_status: SettlementChoice,
    #[serde(default)]
    pub partial_amount: i64,
}

impl BookingForm {
    pub fn new(agent_name: impl Into<String>, passenger_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            agent_address: String::new(),
            agent_phone: String::new(),
            passenger_name: passenger_name.into(),
            passport_no: Masked::default(),
            mobile_no: Masked::default(),
            pax_count: 1,
            selling_price: None,
            comments: String::new(),
            payment_status: SettlementChoice::Full,
            partial_amount: 0,
        }
    }

    pub fn selling_price_for(&self, ticket: &Ticket) -> i64 {
        self.selling_price.unwrap_or(ticket.price)
    }

    /// `None` when the total does not fit in an `i64`
    pub fn checked_total(&self, ticket: &Ticket) -> Option<i64> {
        self.selling_price_for(ticket).checked_mul(i64::from(self.pax_count))
    }

    /// Saturates; `validate` rejects forms whose total overflows
    pub fn total_for(&self, ticket: &Ticket) -> i64 {
        self.selling_price_for(ticket).saturating_mul(i64::from(self.pax_count))
    }

    /// Amount collected up front
    pub fn initial_payment(&self, total: i64) -> i64 {
        match self.payment_status {
            SettlementChoice::Full => total,
            SettlementChoice::Partial => self.partial_amount,
        }
    }

    /// Checked before any state changes
    pub fn validate(&self, ticket: &Ticket) -> Result<(), InventoryError> {
        if self.agent_name.trim().is_empty() {
            return Err(InventoryError::IncompleteForm("agent name is required".to_string()));
        }
        if self.passenger_name.trim().is_empty() {
            return Err(InventoryError::IncompleteForm("passenger name is required".to_string()));
        }
        if self.pax_count == 0 {
            return Err(InventoryError::IncompleteForm("at least one passenger is required".to_string()));
        }
        if self.selling_price_for(ticket) <= 0 {
            return Err(InventoryError::IncompleteForm("selling price must be positive".to_string()));
        }
        let total = self
            .checked_total(ticket)
            .ok_or_else(|| InventoryError::IncompleteForm("total amount is too large".to_string()))?;
        let partial_out_of_range = self.partial_amount < 0 || self.partial_amount > total;
        if self.payment_status == SettlementChoice::Partial && partial_out_of_range {
            return Err(InventoryError::IncompleteForm(format!(
                "partial amount must be between 0 and {}",
                total
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    PendingApproval,
    /// The held ticket was unlocked before confirmation
    Released,
}

/// A submitted booking, kept for confirmations, invoices and sales reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub serial_number: String,
    pub airline_name: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub agent_name: String,
    pub agent_address: String,
    pub agent_phone: String,
    pub passenger_name: String,
    pub passport_no: Masked<String>,
    pub mobile_no: Masked<String>,
    pub pax_count: u32,
    pub selling_price: i64,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub comments: String,
    pub booked_by: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn new(ticket: &Ticket, form: &BookingForm, booked_by: &str, status: BookingStatus) -> Self {
        let total_amount = form.total_for(ticket);
        Self {
            id: Uuid::new_v4(),
            ticket_id: ticket.id,
            serial_number: ticket.serial_number.clone(),
            airline_name: ticket.airline_name.clone(),
            destination: ticket.destination.clone(),
            departure_date: ticket.departure_date,
            agent_name: form.agent_name.trim().to_string(),
            agent_address: form.agent_address.clone(),
            agent_phone: form.agent_phone.clone(),
            passenger_name: form.passenger_name.trim().to_string(),
            passport_no: form.passport_no.clone(),
            mobile_no: form.mobile_no.clone(),
            pax_count: form.pax_count,
            selling_price: form.selling_price_for(ticket),
            total_amount,
            paid_amount: form.initial_payment(total_amount),
            comments: form.comments.clone(),
            booked_by: booked_by.to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::PendingApproval
    }
}

impl Entity for BookingRecord {
    const KIND: &'static str = "Booking";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::sample;

    #[test]
    fn test_blank_names_are_rejected() {
        let ticket = sample("BD001", 45000);

        let form = BookingForm::new("   ", "Ahmed Hassan");
        assert!(matches!(form.validate(&ticket), Err(InventoryError::IncompleteForm(_))));

        let form = BookingForm::new("Karim Travel", "");
        assert!(matches!(form.validate(&ticket), Err(InventoryError::IncompleteForm(_))));

        let form = BookingForm::new("Karim Travel", "Ahmed Hassan");
        assert!(form.validate(&ticket).is_ok());
    }

    #[test]
    fn test_partial_amount_must_fit_total() {
        let ticket = sample("BD002", 48000);
        let mut form = BookingForm::new("Sundarban Tours", "Rashida Begum");
        form.payment_status = SettlementChoice::Partial;
        form.partial_amount = 60000;
        assert!(form.validate(&ticket).is_err());

        form.partial_amount = 25000;
        assert!(form.validate(&ticket).is_ok());
        assert_eq!(form.initial_payment(form.total_for(&ticket)), 25000);
    }

    #[test]
    fn test_record_totals_use_pax_count() {
        let ticket = sample("BD003", 46500);
        let mut form = BookingForm::new("Karim Travel", "Mohammad Rahman");
        form.pax_count = 2;
        form.passport_no = Masked::new("BX0123456".to_string());

        let record = BookingRecord::new(&ticket, &form, "Ahmed Rahman", BookingStatus::Confirmed);
        assert_eq!(record.selling_price, 46500);
        assert_eq!(record.total_amount, 93000);
        assert_eq!(record.paid_amount, 93000);
        assert!(!format!("{:?}", record).contains("BX0123456"));
    }

    #[test]
    fn test_oversized_total_is_rejected() {
        let ticket = sample("BD004", 45000);
        let mut form = BookingForm::new("Karim Travel", "Ahmed Hassan");
        form.selling_price = Some(i64::MAX / 2 + 1);
        form.pax_count = 2;
        assert_eq!(form.checked_total(&ticket), None);
        assert!(matches!(form.validate(&ticket), Err(InventoryError::IncompleteForm(_))));

        form.pax_count = 1;
        assert!(form.validate(&ticket).is_ok());
    }

    #[test]
    fn test_form_defaults_from_json() {
        let form: BookingForm = serde_json::from_value(serde_json::json!({
            "agent_name": "Karim Travel",
            "passenger_name": "Ahmed Hassan"
        }))
        .unwrap();
        assert_eq!(form.pax_count, 1);
        assert_eq!(form.payment_status, SettlementChoice::Full);
        assert_eq!(form.selling_price, None);
    }
}
