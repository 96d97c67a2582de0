use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ticketpro_core::{CoreError, Entity};
use ticketpro_inventory::BookingRecord;
use uuid::Uuid;

use crate::LedgerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Full,
    Partial,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Full => "full",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Pending => "pending",
        }
    }

    fn for_amounts(paid: i64, remaining: i64) -> Self {
        if remaining <= 0 {
            PaymentStatus::Full
        } else if paid > 0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(PaymentStatus::Full),
            "partial" => Ok(PaymentStatus::Partial),
            "pending" => Ok(PaymentStatus::Pending),
            other => Err(CoreError::ValidationError(format!("unknown payment status: {}", other))),
        }
    }
}

/// What a customer owes for one booked ticket and what has come in so far
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub ticket_no: String,
    pub passenger_name: String,
    pub destination: String,
    pub total_amount: i64,
    pub paid_amount: i64,
    pub remaining_amount: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    pub due_date: Option<NaiveDate>,
    pub last_payment: Option<NaiveDate>,
    pub agent_name: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// A single incoming payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub amount: i64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to today
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
}

impl PaymentApplication {
    pub fn new(amount: i64) -> Self {
        Self {
            amount,
            method: None,
            notes: None,
            paid_on: None,
        }
    }
}

impl PaymentRecord {
    /// Ledger entry opened when a booking is confirmed. Amounts come from the
    /// booking; the balance is due by departure.
    pub fn open_for_booking(booking: &BookingRecord) -> Self {
        let total = booking.total_amount;
        let paid = booking.paid_amount.clamp(0, total);
        let remaining = total - paid;
        Self {
            id: Uuid::new_v4(),
            ticket_no: booking.serial_number.clone(),
            passenger_name: booking.passenger_name.clone(),
            destination: booking.destination.clone(),
            total_amount: total,
            paid_amount: paid,
            remaining_amount: remaining,
            payment_status: PaymentStatus::for_amounts(paid, remaining),
            payment_method: "Not specified".to_string(),
            due_date: (remaining > 0).then_some(booking.departure_date),
            last_payment: (paid > 0).then(|| booking.created_at.date_naive()),
            agent_name: booking.agent_name.clone(),
            notes: booking.comments.clone(),
            created_at: Utc::now(),
        }
    }

    /// Apply a payment. Rejected amounts leave the record untouched.
    pub fn apply(&mut self, payment: &PaymentApplication) -> Result<(), LedgerError> {
        if payment.amount <= 0 {
            return Err(LedgerError::InvalidAmount(payment.amount));
        }
        if payment.amount > self.remaining_amount {
            return Err(LedgerError::Overpayment {
                amount: payment.amount,
                remaining: self.remaining_amount,
            });
        }

        self.paid_amount += payment.amount;
        self.remaining_amount -= payment.amount;
        self.last_payment = Some(payment.paid_on.unwrap_or_else(|| Utc::now().date_naive()));
        if let Some(method) = payment.method.as_deref().filter(|m| !m.trim().is_empty()) {
            self.payment_method = method.to_string();
        }
        if let Some(notes) = payment.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            self.notes = notes.to_string();
        }

        if self.remaining_amount <= 0 {
            self.remaining_amount = 0;
            self.payment_status = PaymentStatus::Full;
        } else {
            self.payment_status = PaymentStatus::Partial;
        }
        Ok(())
    }

    /// Nothing paid and past the due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.payment_status == PaymentStatus::Pending && self.due_date.is_some_and(|due| due < today)
    }
}

impl Entity for PaymentRecord {
    const KIND: &'static str = "PaymentRecord";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
pub(crate) fn sample(total: i64, paid: i64) -> PaymentRecord {
    let remaining = total - paid;
    PaymentRecord {
        id: Uuid::new_v4(),
        ticket_no: "BD002".to_string(),
        passenger_name: "Fatima Khatun".to_string(),
        destination: "Dubai, UAE".to_string(),
        total_amount: total,
        paid_amount: paid,
        remaining_amount: remaining,
        payment_status: PaymentStatus::for_amounts(paid, remaining),
        payment_method: "Cash".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 1, 25),
        last_payment: None,
        agent_name: "Karim Travel".to_string(),
        notes: String::new(),
        created_at: Utc::now(),
    }
}
