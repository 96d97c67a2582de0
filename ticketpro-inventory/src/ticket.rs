use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ticketpro_core::{CoreError, Entity, Permission, Role};
use uuid::Uuid;

/// Where a ticket sits in the booking flow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Available,
    Locked,
    Sold,
}

impl LockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LockStatus::Available => "available",
            LockStatus::Locked => "locked",
            LockStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(LockStatus::Available),
            "locked" => Ok(LockStatus::Locked),
            "sold" => Ok(LockStatus::Sold),
            other => Err(CoreError::ValidationError(format!("unknown lock status: {}", other))),
        }
    }
}

/// One seat the agency holds on a flight to a destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: Uuid,
    pub serial_number: String,
    pub batch_id: Option<Uuid>,
    pub airline_name: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    /// Customer-facing amount
    pub price: i64,
    /// Agency cost, admin eyes only
    pub buying_price: i64,
    pub is_confirmed: bool,
    pub lock_status: LockStatus,
    pub locked_by: Option<String>,
    pub lock_expiry: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        serial_number: impl Into<String>,
        airline_name: impl Into<String>,
        destination: impl Into<String>,
        departure_date: NaiveDate,
        departure_time: NaiveTime,
        price: i64,
        buying_price: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            serial_number: serial_number.into(),
            batch_id: None,
            airline_name: airline_name.into(),
            destination: destination.into(),
            departure_date,
            departure_time,
            price,
            buying_price,
            is_confirmed: false,
            lock_status: LockStatus::Available,
            locked_by: None,
            lock_expiry: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.lock_status == LockStatus::Available
    }

    /// Weekday of departure, e.g. "Thu"
    pub fn day(&self) -> String {
        self.departure_date.weekday().to_string()
    }

    /// Lock has passed its advisory expiry (nothing reverts it automatically)
    pub fn is_lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.lock_status == LockStatus::Locked && self.lock_expiry.is_some_and(|expiry| expiry <= now)
    }

    pub fn margin(&self) -> i64 {
        self.price - self.buying_price
    }

    /// `locked_by`/`lock_expiry` present iff locked, confirmed implies sold
    pub fn holds_invariants(&self) -> bool {
        let lock_fields = self.locked_by.is_some() && self.lock_expiry.is_some();
        let lock_ok = (self.lock_status == LockStatus::Locked) == lock_fields
            && (self.locked_by.is_none() == self.lock_expiry.is_none());
        let confirm_ok = !self.is_confirmed || self.lock_status == LockStatus::Sold;
        lock_ok && confirm_ok
    }

    pub(crate) fn lock(&mut self, by: &str, expiry: DateTime<Utc>, now: DateTime<Utc>) {
        self.lock_status = LockStatus::Locked;
        self.locked_by = Some(by.to_string());
        self.lock_expiry = Some(expiry);
        self.updated_at = now;
    }

    pub(crate) fn sell(&mut self, now: DateTime<Utc>) {
        self.lock_status = LockStatus::Sold;
        self.is_confirmed = true;
        self.locked_by = None;
        self.lock_expiry = None;
        self.updated_at = now;
    }

    pub(crate) fn release(&mut self, now: DateTime<Utc>) {
        self.lock_status = LockStatus::Available;
        self.locked_by = None;
        self.lock_expiry = None;
        self.updated_at = now;
    }

    /// What a given role is allowed to see
    pub fn view_for(&self, role: Role) -> TicketView {
        TicketView {
            id: self.id,
            serial_number: self.serial_number.clone(),
            airline_name: self.airline_name.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date,
            day: self.day(),
            departure_time: self.departure_time,
            price: self.price,
            buying_price: role.can(Permission::ViewBuyingPrice).then_some(self.buying_price),
            is_confirmed: self.is_confirmed,
            lock_status: self.lock_status,
            locked_by: self.locked_by.clone(),
            lock_expiry: self.lock_expiry,
        }
    }
}

impl Entity for Ticket {
    const KIND: &'static str = "Ticket";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketView {
    pub id: Uuid,
    pub serial_number: String,
    pub airline_name: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub day: String,
    pub departure_time: NaiveTime,
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buying_price: Option<i64>,
    pub is_confirmed: bool,
    pub lock_status: LockStatus,
    pub locked_by: Option<String>,
    pub lock_expiry: Option<DateTime<Utc>>,
}

#[cfg(test)]
pub(crate) fn sample(serial: &str, price: i64) -> Ticket {
    Ticket::new(
        serial,
        "Emirates",
        "Dubai, UAE",
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
        NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        price,
        price - 3000,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_ticket_is_available() {
        let ticket = sample("BD001", 45000);
        assert!(ticket.is_available());
        assert!(!ticket.is_confirmed);
        assert!(ticket.holds_invariants());
        assert_eq!(ticket.day(), "Thu");
        assert_eq!(ticket.margin(), 3000);
    }

    #[test]
    fn test_lock_fields_follow_status() {
        let now = Utc::now();
        let mut ticket = sample("BD002", 48000);

        ticket.lock("Jane", now + Duration::hours(24), now);
        assert!(ticket.holds_invariants());
        assert!(!ticket.is_lock_expired(now));
        assert!(ticket.is_lock_expired(now + Duration::hours(25)));

        ticket.release(now);
        assert!(ticket.holds_invariants());
        assert_eq!(ticket.locked_by, None);

        ticket.sell(now);
        assert!(ticket.holds_invariants());
        assert!(ticket.is_confirmed);
    }

    #[test]
    fn test_broken_invariants_are_detected() {
        let mut ticket = sample("BD003", 46500);
        ticket.is_confirmed = true;
        assert!(!ticket.holds_invariants());

        let mut ticket = sample("BD004", 46500);
        ticket.locked_by = Some("Jane".to_string());
        assert!(!ticket.holds_invariants());
    }

    #[test]
    fn test_buying_price_only_for_admin() {
        let ticket = sample("BD005", 38000);
        assert_eq!(ticket.view_for(Role::Admin).buying_price, Some(35000));
        assert_eq!(ticket.view_for(Role::Manager).buying_price, None);
        assert_eq!(ticket.view_for(Role::Staff).buying_price, None);

        let json = serde_json::to_value(ticket.view_for(Role::Staff)).unwrap();
        assert!(json.get("buying_price").is_none());
    }

    #[test]
    fn test_lock_status_strings() {
        assert_eq!("locked".parse::<LockStatus>().unwrap(), LockStatus::Locked);
        assert!("held".parse::<LockStatus>().is_err());
        assert_eq!(LockStatus::Sold.to_string(), "sold");
    }
}
