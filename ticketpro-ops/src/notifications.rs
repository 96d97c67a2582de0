use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ticketpro_inventory::Ticket;
use ticketpro_shared::BackOfficeEvent;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::OpsError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_serial: Option<String>,
    /// Set on expiry alerts only: the lock expiry the alert was raised for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_expiry: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub action_required: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            ticket_serial: None,
            lock_expiry: None,
            timestamp: Utc::now(),
            read: false,
            action_required: false,
        }
    }

    fn about(mut self, serial: &str) -> Self {
        self.ticket_serial = Some(serial.to_string());
        self
    }

    fn needs_action(mut self) -> Self {
        self.action_required = true;
        self
    }

    fn for_lock(mut self, expiry: DateTime<Utc>) -> Self {
        self.lock_expiry = Some(expiry);
        self
    }

    /// Whether this is the expiry alert for `serial`'s lock ending at `expiry`
    fn alerts_lock(&self, serial: &str, expiry: DateTime<Utc>) -> bool {
        self.lock_expiry == Some(expiry) && self.ticket_serial.as_deref() == Some(serial)
    }

    /// Inbox entry for a broadcast event
    pub fn from_event(event: &BackOfficeEvent) -> Self {
        match event {
            BackOfficeEvent::TicketLocked(e) => Notification::new(
                NotificationKind::Info,
                "Booking Pending Approval",
                format!("Ticket {} was locked by {} and awaits confirmation", e.serial_number, e.locked_by),
            )
            .about(&e.serial_number)
            .needs_action(),
            BackOfficeEvent::TicketConfirmed(e) => Notification::new(
                NotificationKind::Success,
                "Booking Confirmed",
                format!("Ticket {} confirmed for {} by {}", e.serial_number, e.passenger_name, e.confirmed_by),
            )
            .about(&e.serial_number),
            BackOfficeEvent::TicketReleased(e) => {
                let (kind, message) = if e.lock_expired {
                    (
                        NotificationKind::Warning,
                        format!("Expired lock on ticket {} released by {}", e.serial_number, e.released_by),
                    )
                } else {
                    (
                        NotificationKind::Info,
                        format!("Ticket {} unlocked by {}", e.serial_number, e.released_by),
                    )
                };
                Notification::new(kind, "Ticket Released", message).about(&e.serial_number)
            }
            BackOfficeEvent::PaymentReceived(e) => Notification::new(
                NotificationKind::Success,
                "Payment Received",
                format!(
                    "৳{} received for ticket {}, ৳{} remaining",
                    e.amount, e.ticket_no, e.remaining_amount
                ),
            )
            .about(&e.ticket_no),
            BackOfficeEvent::BackupFinished(e) if e.succeeded => Notification::new(
                NotificationKind::Success,
                "Backup Completed",
                format!("{} backup finished successfully", e.kind),
            ),
            BackOfficeEvent::BackupFinished(e) => Notification::new(
                NotificationKind::Error,
                "Backup Failed",
                format!("{} backup did not complete", e.kind),
            )
            .needs_action(),
        }
    }
}

/// Hours-before-expiry thresholds for lock alerts
#[derive(Debug, Clone, Copy)]
pub struct ExpiryWindows {
    pub warning: Duration,
    pub alert: Duration,
}

impl Default for ExpiryWindows {
    fn default() -> Self {
        Self {
            warning: Duration::hours(24),
            alert: Duration::hours(2),
        }
    }
}

/// Oldest entries beyond this are dropped
pub const MAX_NOTIFICATIONS: usize = 500;

/// Back-office notification inbox, newest first
#[derive(Default)]
pub struct Inbox {
    items: RwLock<Vec<Notification>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, notification: Notification) -> Notification {
        debug!(kind = ?notification.kind, title = %notification.title, "Notification added");
        let mut items = self.items.write().await;
        items.insert(0, notification.clone());
        items.truncate(MAX_NOTIFICATIONS);
        notification
    }

    pub async fn record_event(&self, event: &BackOfficeEvent) -> Notification {
        self.push(Notification::from_event(event)).await
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.items.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.items.read().await.iter().filter(|n| !n.read).count()
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Notification, OpsError> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(OpsError::NotificationNotFound(id))?;
        item.read = true;
        Ok(item.clone())
    }

    pub async fn mark_all_read(&self) -> usize {
        let mut items = self.items.write().await;
        let mut changed = 0;
        for item in items.iter_mut().filter(|n| !n.read) {
            item.read = true;
            changed += 1;
        }
        changed
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), OpsError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|n| n.id != id);
        if items.len() == before {
            return Err(OpsError::NotificationNotFound(id));
        }
        Ok(())
    }

    /// Raise one alert per locked ticket nearing (or past) its expiry.
    /// A lock that already has an expiry alert is skipped; a new lock on the
    /// same ticket gets its own.
    pub async fn check_lock_expiries(
        &self,
        tickets: &[Ticket],
        now: DateTime<Utc>,
        windows: ExpiryWindows,
    ) -> Vec<Notification> {
        let mut items = self.items.write().await;
        let mut created = Vec::new();

        for ticket in tickets {
            let Some(expiry) = ticket.lock_expiry.filter(|_| !ticket.is_available()) else {
                continue;
            };
            let left = expiry - now;
            if left > windows.warning {
                continue;
            }
            if items.iter().any(|n| n.alerts_lock(&ticket.serial_number, expiry)) {
                continue;
            }

            let message = if left <= Duration::zero() {
                format!("Lock on ticket {} has expired and awaits release", ticket.serial_number)
            } else {
                format!(
                    "Ticket {} will expire in {} hours if not confirmed",
                    ticket.serial_number,
                    left.num_hours()
                )
            };
            let (kind, title) = if left <= windows.alert {
                (NotificationKind::Error, "Booking Expiry Alert")
            } else {
                (NotificationKind::Warning, "Booking Expiry Warning")
            };
            let notification = Notification::new(kind, title, message)
                .about(&ticket.serial_number)
                .for_lock(expiry)
                .needs_action();

            items.insert(0, notification.clone());
            created.push(notification);
        }

        items.truncate(MAX_NOTIFICATIONS);
        if !created.is_empty() {
            info!(count = created.len(), "Lock expiry notifications raised");
        }
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use ticketpro_shared::models::events::{BackupFinishedEvent, PaymentReceivedEvent, TicketLockedEvent};

    fn locked(serial: &str, expiry: DateTime<Utc>) -> Ticket {
        let mut ticket = Ticket::new(
            serial,
            "Emirates",
            "Dubai, UAE",
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            45000,
            42000,
        );
        ticket.lock_status = ticketpro_inventory::LockStatus::Locked;
        ticket.locked_by = Some("Jane".to_string());
        ticket.lock_expiry = Some(expiry);
        ticket
    }

    #[tokio::test]
    async fn test_read_and_delete() {
        let inbox = Inbox::new();
        let first = inbox.push(Notification::new(NotificationKind::Info, "System Update", "Nightly maintenance")).await;
        let second = inbox.push(Notification::new(NotificationKind::Warning, "Payment Overdue", "BD003")).await;

        let listed = inbox.list().await;
        assert_eq!(listed[0].id, second.id);
        assert_eq!(inbox.unread_count().await, 2);

        inbox.mark_read(first.id).await.unwrap();
        assert_eq!(inbox.unread_count().await, 1);
        assert_eq!(inbox.mark_all_read().await, 1);
        assert_eq!(inbox.unread_count().await, 0);

        inbox.delete(first.id).await.unwrap();
        assert!(matches!(inbox.delete(first.id).await, Err(OpsError::NotificationNotFound(_))));
        assert_eq!(inbox.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry_alerts_by_window() {
        let now = Utc::now();
        let inbox = Inbox::new();
        let tickets = vec![
            locked("BD008", now + Duration::hours(1)),
            locked("BD009", now + Duration::hours(12)),
            locked("BD010", now + Duration::hours(30)),
        ];

        let created = inbox.check_lock_expiries(&tickets, now, ExpiryWindows::default()).await;
        assert_eq!(created.len(), 2);
        let kind_of = |serial: &str| {
            created
                .iter()
                .find(|n| n.ticket_serial.as_deref() == Some(serial))
                .map(|n| n.kind)
        };
        assert_eq!(kind_of("BD008"), Some(NotificationKind::Error));
        assert_eq!(kind_of("BD009"), Some(NotificationKind::Warning));
        assert_eq!(kind_of("BD010"), None);

        let again = inbox.check_lock_expiries(&tickets, now, ExpiryWindows::default()).await;
        assert!(again.is_empty());
        assert_eq!(inbox.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_lock_raises_alert() {
        let now = Utc::now();
        let inbox = Inbox::new();
        let created = inbox
            .check_lock_expiries(&[locked("BD011", now - Duration::hours(3))], now, ExpiryWindows::default())
            .await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].kind, NotificationKind::Error);
        assert!(created[0].message.contains("expired"));
    }

    #[tokio::test]
    async fn test_lock_event_does_not_hide_expiry_alert() {
        let now = Utc::now();
        let expiry = now + Duration::hours(1);
        let inbox = Inbox::new();
        inbox
            .record_event(&BackOfficeEvent::TicketLocked(TicketLockedEvent {
                ticket_id: Uuid::new_v4(),
                serial_number: "BD008".to_string(),
                locked_by: "Jane".to_string(),
                lock_expiry: expiry.timestamp(),
                timestamp: now.timestamp(),
            }))
            .await;

        let tickets = [locked("BD008", expiry)];
        let created = inbox.check_lock_expiries(&tickets, now, ExpiryWindows::default()).await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].lock_expiry, Some(expiry));
        assert!(inbox.check_lock_expiries(&tickets, now, ExpiryWindows::default()).await.is_empty());

        // Unlocked and locked again: the new hold gets its own alert
        let relocked = [locked("BD008", expiry + Duration::minutes(30))];
        assert_eq!(inbox.check_lock_expiries(&relocked, now, ExpiryWindows::default()).await.len(), 1);
        assert_eq!(inbox.list().await.len(), 3);
    }

    #[tokio::test]
    async fn test_inbox_keeps_newest_entries() {
        let inbox = Inbox::new();
        for n in 0..MAX_NOTIFICATIONS + 5 {
            inbox
                .push(Notification::new(NotificationKind::Info, "System Update", format!("update {}", n)))
                .await;
        }

        let listed = inbox.list().await;
        assert_eq!(listed.len(), MAX_NOTIFICATIONS);
        assert_eq!(listed[0].message, format!("update {}", MAX_NOTIFICATIONS + 4));
    }

    #[test]
    fn test_event_notifications() {
        let paid = Notification::from_event(&BackOfficeEvent::PaymentReceived(PaymentReceivedEvent {
            payment_id: Uuid::new_v4(),
            ticket_no: "BD002".to_string(),
            amount: 23000,
            remaining_amount: 0,
            timestamp: 0,
        }));
        assert_eq!(paid.kind, NotificationKind::Success);
        assert_eq!(paid.ticket_serial.as_deref(), Some("BD002"));

        let failed = Notification::from_event(&BackOfficeEvent::BackupFinished(BackupFinishedEvent {
            backup_id: Uuid::new_v4(),
            kind: "manual".to_string(),
            succeeded: false,
            timestamp: 0,
        }));
        assert_eq!(failed.kind, NotificationKind::Error);
        assert!(failed.action_required);
    }
}
