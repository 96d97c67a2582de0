use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use ticketpro_core::{Actor, CoreError, Permission, Repository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::{BookingForm, BookingRecord, BookingStatus};
use crate::ticket::{LockStatus, Ticket};
use crate::InventoryError;

/// Result of a booking submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingDecision {
    /// Sold and confirmed by an admin or manager
    Confirmed,
    /// Held for managerial confirmation
    Locked {
        locked_by: String,
        lock_expiry: DateTime<Utc>,
    },
}

/// Decides ticket state transitions from the actor's role.
///
/// available → sold (ConfirmBooking), available → locked (everyone else who may
/// book), locked → available (UnlockTicket), locked → sold (ConfirmBooking).
/// Nothing leaves `sold`.
#[derive(Debug, Clone)]
pub struct BookingController {
    lock_hold: Duration,
}

impl BookingController {
    pub fn new(lock_hold: Duration) -> Self {
        Self { lock_hold }
    }

    /// Transition: Available → Sold | Locked
    pub fn book(
        &self,
        ticket: &mut Ticket,
        actor: &Actor,
        form: &BookingForm,
        now: DateTime<Utc>,
    ) -> Result<BookingDecision, InventoryError> {
        actor.require(Permission::BookTicket)?;
        let confirms = actor.can(Permission::ConfirmBooking);

        if ticket.lock_status != LockStatus::Available {
            return Err(InventoryError::InvalidTransition {
                from: ticket.lock_status,
                to: if confirms { LockStatus::Sold } else { LockStatus::Locked },
            });
        }

        form.validate(ticket)?;

        if confirms {
            ticket.sell(now);
            Ok(BookingDecision::Confirmed)
        } else {
            let lock_expiry = now + self.lock_hold;
            ticket.lock(&actor.name, lock_expiry, now);
            Ok(BookingDecision::Locked {
                locked_by: actor.name.clone(),
                lock_expiry,
            })
        }
    }

    /// Transition: Locked → Available
    pub fn unlock(&self, ticket: &mut Ticket, actor: &Actor, now: DateTime<Utc>) -> Result<(), InventoryError> {
        actor.require(Permission::UnlockTicket)?;
        self.expect_locked(ticket, LockStatus::Available)?;
        ticket.release(now);
        Ok(())
    }

    /// Transition: Locked → Sold
    pub fn confirm_lock(&self, ticket: &mut Ticket, actor: &Actor, now: DateTime<Utc>) -> Result<(), InventoryError> {
        actor.require(Permission::ConfirmBooking)?;
        self.expect_locked(ticket, LockStatus::Sold)?;
        ticket.sell(now);
        Ok(())
    }

    fn expect_locked(&self, ticket: &Ticket, to: LockStatus) -> Result<(), InventoryError> {
        if ticket.lock_status != LockStatus::Locked {
            return Err(InventoryError::InvalidTransition {
                from: ticket.lock_status,
                to,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub destination: Option<String>,
    pub status: Option<LockStatus>,
    pub airline: Option<String>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let destination_ok = self
            .destination
            .as_ref()
            .map_or(true, |d| ticket.destination.eq_ignore_ascii_case(d));
        let status_ok = self.status.map_or(true, |s| ticket.lock_status == s);
        let airline_ok = self
            .airline
            .as_ref()
            .map_or(true, |a| ticket.airline_name.eq_ignore_ascii_case(a));
        destination_ok && status_ok && airline_ok
    }
}

#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub ticket: Ticket,
    pub booking: BookingRecord,
    pub decision: BookingDecision,
}

/// Ticket inventory store plus the lifecycle controller
pub struct TicketDesk {
    tickets: Arc<dyn Repository<Ticket>>,
    controller: BookingController,
}

impl TicketDesk {
    pub fn new(tickets: Arc<dyn Repository<Ticket>>, lock_hold: Duration) -> Self {
        Self {
            tickets,
            controller: BookingController::new(lock_hold),
        }
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, InventoryError> {
        let tickets = self.tickets.list().await?;
        Ok(tickets.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn get(&self, ticket_id: Uuid) -> Result<Ticket, InventoryError> {
        self.tickets
            .get(ticket_id)
            .await?
            .ok_or(InventoryError::NotFound(ticket_id))
    }

    /// Submit a booking; touches exactly one ticket record
    pub async fn book(
        &self,
        ticket_id: Uuid,
        actor: &Actor,
        form: &BookingForm,
    ) -> Result<BookingOutcome, InventoryError> {
        let mut ticket = self.get(ticket_id).await?;
        let decision = match self.controller.book(&mut ticket, actor, form, Utc::now()) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(ticket = %ticket.serial_number, actor = %actor.name, error = %e, "Booking rejected");
                return Err(e);
            }
        };
        let status = match decision {
            BookingDecision::Confirmed => BookingStatus::Confirmed,
            BookingDecision::Locked { .. } => BookingStatus::PendingApproval,
        };
        let booking = BookingRecord::new(&ticket, form, &actor.name, status);
        let ticket = self.tickets.update(ticket).await?;

        info!(
            ticket = %ticket.serial_number,
            actor = %actor.name,
            role = %actor.role,
            status = %ticket.lock_status,
            passport = %form.passport_no.tail(4),
            "Ticket booked"
        );

        Ok(BookingOutcome {
            ticket,
            booking,
            decision,
        })
    }

    pub async fn unlock(&self, ticket_id: Uuid, actor: &Actor) -> Result<Ticket, InventoryError> {
        let mut ticket = self.get(ticket_id).await?;
        self.controller.unlock(&mut ticket, actor, Utc::now())?;
        let ticket = self.tickets.update(ticket).await?;
        info!(ticket = %ticket.serial_number, actor = %actor.name, "Ticket unlocked");
        Ok(ticket)
    }

    pub async fn confirm_lock(&self, ticket_id: Uuid, actor: &Actor) -> Result<Ticket, InventoryError> {
        let mut ticket = self.get(ticket_id).await?;
        self.controller.confirm_lock(&mut ticket, actor, Utc::now())?;
        let ticket = self.tickets.update(ticket).await?;
        info!(ticket = %ticket.serial_number, actor = %actor.name, "Locked ticket confirmed");
        Ok(ticket)
    }

    /// Locked tickets whose advisory expiry has passed
    pub async fn expired_locks(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>, InventoryError> {
        let tickets = self.tickets.list().await?;
        Ok(tickets.into_iter().filter(|t| t.is_lock_expired(now)).collect())
    }

    /// Admin sweep: every expired lock goes back to available
    pub async fn release_expired_locks(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, InventoryError> {
        actor.require(Permission::UnlockTicket)?;

        let mut released = Vec::new();
        for mut ticket in self.expired_locks(now).await? {
            self.controller.unlock(&mut ticket, actor, now)?;
            released.push(self.tickets.update(ticket).await?);
        }

        info!(count = released.len(), actor = %actor.name, "Expired locks released");
        Ok(released)
    }

    /// Add new stock; serial numbers must stay unique
    pub async fn add_tickets(&self, actor: &Actor, tickets: Vec<Ticket>) -> Result<Vec<Ticket>, InventoryError> {
        actor.require(Permission::ManageInventory)?;

        let mut serials: HashSet<String> = self
            .tickets
            .list()
            .await?
            .into_iter()
            .map(|t| t.serial_number)
            .collect();
        for ticket in &tickets {
            if !serials.insert(ticket.serial_number.clone()) {
                return Err(CoreError::Conflict(format!(
                    "serial number {} already exists",
                    ticket.serial_number
                ))
                .into());
            }
        }

        let mut added = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            added.push(self.tickets.insert(ticket).await?);
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::sample;
    use ticketpro_core::{InMemoryRepository, Role};

    fn controller() -> BookingController {
        BookingController::new(Duration::hours(24))
    }

    fn form() -> BookingForm {
        BookingForm::new("Karim Travel", "Ahmed Hassan")
    }

    #[test]
    fn test_admin_and_manager_confirm_directly() {
        for role in [Role::Admin, Role::Manager] {
            let mut ticket = sample("BD001", 45000);
            let actor = Actor::new("Ahmed Rahman", role);

            let decision = controller().book(&mut ticket, &actor, &form(), Utc::now()).unwrap();

            assert_eq!(decision, BookingDecision::Confirmed);
            assert_eq!(ticket.lock_status, LockStatus::Sold);
            assert!(ticket.is_confirmed);
            assert!(ticket.holds_invariants());
        }
    }

    #[test]
    fn test_staff_booking_locks_for_a_day() {
        let now = Utc::now();
        let mut ticket = sample("BD001", 45000);
        let jane = Actor::new("Jane", Role::Staff);

        controller().book(&mut ticket, &jane, &form(), now).unwrap();

        assert_eq!(ticket.lock_status, LockStatus::Locked);
        assert_eq!(ticket.locked_by.as_deref(), Some("Jane"));
        assert_eq!(ticket.lock_expiry, Some(now + Duration::hours(24)));
        assert!(!ticket.is_confirmed);
        assert!(ticket.holds_invariants());
    }

    #[test]
    fn test_incomplete_form_changes_nothing() {
        let mut ticket = sample("BD001", 45000);
        let before = ticket.clone();
        let jane = Actor::new("Jane", Role::Staff);

        let result = controller().book(&mut ticket, &jane, &BookingForm::new("Karim Travel", " "), Utc::now());

        assert!(matches!(result, Err(InventoryError::IncompleteForm(_))));
        assert_eq!(ticket, before);
    }

    #[test]
    fn test_admin_unlocks() {
        let now = Utc::now();
        let mut ticket = sample("BD003", 46500);
        controller().book(&mut ticket, &Actor::new("Jane", Role::Staff), &form(), now).unwrap();

        let manager = Actor::new("Fatima Khan", Role::Manager);
        assert!(matches!(
            controller().unlock(&mut ticket, &manager, now),
            Err(InventoryError::Core(CoreError::Forbidden { .. }))
        ));

        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        controller().unlock(&mut ticket, &admin, now).unwrap();
        assert_eq!(ticket.lock_status, LockStatus::Available);
        assert_eq!(ticket.locked_by, None);
        assert_eq!(ticket.lock_expiry, None);
    }

    #[test]
    fn test_manager_confirms_a_lock() {
        let now = Utc::now();
        let mut ticket = sample("BD003", 46500);
        controller().book(&mut ticket, &Actor::new("Jane", Role::Staff), &form(), now).unwrap();

        let staff = Actor::new("Karim", Role::Staff);
        assert!(controller().confirm_lock(&mut ticket, &staff, now).is_err());

        let manager = Actor::new("Fatima Khan", Role::Manager);
        controller().confirm_lock(&mut ticket, &manager, now).unwrap();
        assert_eq!(ticket.lock_status, LockStatus::Sold);
        assert!(ticket.is_confirmed);
        assert!(ticket.holds_invariants());
    }

    #[test]
    fn test_nothing_leaves_sold() {
        let now = Utc::now();
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        let mut ticket = sample("BD002", 48000);
        controller().book(&mut ticket, &admin, &form(), now).unwrap();

        for role in [Role::Admin, Role::Manager, Role::Staff] {
            let actor = Actor::new("anyone", role);
            assert!(controller().book(&mut ticket, &actor, &form(), now).is_err());
            assert!(controller().unlock(&mut ticket, &actor, now).is_err());
            assert!(controller().confirm_lock(&mut ticket, &actor, now).is_err());
        }
        assert_eq!(ticket.lock_status, LockStatus::Sold);
    }

    #[test]
    fn test_locked_ticket_cannot_be_booked_again() {
        let now = Utc::now();
        let mut ticket = sample("BD004", 41000);
        controller().book(&mut ticket, &Actor::new("Jane", Role::Staff), &form(), now).unwrap();

        let result = controller().book(&mut ticket, &Actor::new("Ahmed Rahman", Role::Admin), &form(), now);
        assert!(matches!(
            result,
            Err(InventoryError::InvalidTransition { from: LockStatus::Locked, to: LockStatus::Sold })
        ));
    }

    #[tokio::test]
    async fn test_desk_updates_only_the_booked_ticket() {
        let first = sample("BD001", 45000);
        let second = sample("BD002", 48000);
        let desk = TicketDesk::new(
            Arc::new(InMemoryRepository::with_items(vec![first.clone(), second.clone()])),
            Duration::hours(24),
        );

        let outcome = desk
            .book(first.id, &Actor::new("Jane", Role::Staff), &form())
            .await
            .unwrap();

        assert_eq!(outcome.ticket.lock_status, LockStatus::Locked);
        assert_eq!(outcome.booking.status, BookingStatus::PendingApproval);
        assert_eq!(desk.get(first.id).await.unwrap().locked_by.as_deref(), Some("Jane"));
        assert_eq!(desk.get(second.id).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_oversized_booking_leaves_ticket_available() {
        let ticket = sample("BD005", 45000);
        let desk = TicketDesk::new(
            Arc::new(InMemoryRepository::with_items(vec![ticket.clone()])),
            Duration::hours(24),
        );
        let mut form = form();
        form.selling_price = Some(i64::MAX / 2 + 1);
        form.pax_count = 2;

        let result = desk.book(ticket.id, &Actor::new("Ahmed Rahman", Role::Admin), &form).await;

        assert!(matches!(result, Err(InventoryError::IncompleteForm(_))));
        assert_eq!(desk.get(ticket.id).await.unwrap(), ticket);
    }

    #[tokio::test]
    async fn test_expired_locks_are_reported_and_released() {
        let desk = TicketDesk::new(
            Arc::new(InMemoryRepository::with_items(vec![sample("BD001", 45000), sample("BD002", 48000)])),
            Duration::hours(24),
        );
        let tickets = desk.list(&TicketFilter::default()).await.unwrap();
        desk.book(tickets[0].id, &Actor::new("Jane", Role::Staff), &form()).await.unwrap();

        let later = Utc::now() + Duration::hours(25);
        assert!(desk.expired_locks(Utc::now()).await.unwrap().is_empty());
        assert_eq!(desk.expired_locks(later).await.unwrap().len(), 1);

        let staff = Actor::new("Jane", Role::Staff);
        assert!(desk.release_expired_locks(&staff, later).await.is_err());

        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        let released = desk.release_expired_locks(&admin, later).await.unwrap();
        assert_eq!(released.len(), 1);
        assert!(released[0].is_available());
    }

    #[tokio::test]
    async fn test_filter_and_duplicate_serials() {
        let desk = TicketDesk::new(Arc::new(InMemoryRepository::new()), Duration::hours(24));
        let admin = Actor::new("Ahmed Rahman", Role::Admin);

        desk.add_tickets(&admin, vec![sample("BD001", 45000), sample("BD002", 48000)])
            .await
            .unwrap();
        assert!(desk.add_tickets(&admin, vec![sample("BD001", 45000)]).await.is_err());
        assert!(desk
            .add_tickets(&Actor::new("Jane", Role::Staff), vec![sample("BD009", 45000)])
            .await
            .is_err());

        let filter = TicketFilter {
            status: Some(LockStatus::Available),
            destination: Some("dubai, uae".to_string()),
            airline: None,
        };
        assert_eq!(desk.list(&filter).await.unwrap().len(), 2);
    }
}
