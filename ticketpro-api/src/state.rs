use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use ticketpro_core::{Actor, CoreResult, InMemoryRepository, Repository, Role};
use ticketpro_directory::{Agent, Airline, Directory, NewUser, SystemUser};
use ticketpro_inventory::{BatchDesk, BookingRecord, Ticket, TicketBatch, TicketDesk};
use ticketpro_ledger::{PaymentLedger, PaymentRecord};
use ticketpro_ops::{spawn_event_listener, BackupRunner, ExpiryWindows, Inbox, SnapshotSource};
use ticketpro_shared::BackOfficeEvent;
use ticketpro_store::app_config::{BackupConfig, BusinessRules};
use ticketpro_store::{DbClient, PgDocumentRepository, PgPaymentRepository, PgTicketRepository};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Every collection the back office keeps
#[derive(Clone)]
pub struct Stores {
    pub tickets: Arc<dyn Repository<Ticket>>,
    pub batches: Arc<dyn Repository<TicketBatch>>,
    pub bookings: Arc<dyn Repository<BookingRecord>>,
    pub payments: Arc<dyn Repository<PaymentRecord>>,
    pub agents: Arc<dyn Repository<Agent>>,
    pub airlines: Arc<dyn Repository<Airline>>,
    pub users: Arc<dyn Repository<SystemUser>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            tickets: Arc::new(InMemoryRepository::<Ticket>::new()),
            batches: Arc::new(InMemoryRepository::<TicketBatch>::new()),
            bookings: Arc::new(InMemoryRepository::<BookingRecord>::new()),
            payments: Arc::new(InMemoryRepository::<PaymentRecord>::new()),
            agents: Arc::new(InMemoryRepository::<Agent>::new()),
            airlines: Arc::new(InMemoryRepository::<Airline>::new()),
            users: Arc::new(InMemoryRepository::<SystemUser>::new()),
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        let pool = db.pool.clone();
        Self {
            tickets: Arc::new(PgTicketRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            batches: Arc::new(PgDocumentRepository::<TicketBatch>::new(pool.clone())),
            bookings: Arc::new(PgDocumentRepository::<BookingRecord>::new(pool.clone())),
            agents: Arc::new(PgDocumentRepository::<Agent>::new(pool.clone())),
            airlines: Arc::new(PgDocumentRepository::<Airline>::new(pool.clone())),
            users: Arc::new(PgDocumentRepository::<SystemUser>::new(pool)),
        }
    }
}

#[async_trait]
impl SnapshotSource for Stores {
    async fn snapshot(&self) -> CoreResult<serde_json::Value> {
        Ok(serde_json::json!({
            "tickets": self.tickets.list().await?,
            "batches": self.batches.list().await?,
            "bookings": self.bookings.list().await?,
            "payments": self.payments.list().await?,
            "agents": self.agents.list().await?,
            "airlines": self.airlines.list().await?,
            "users": self.users.list().await?,
        }))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<TicketDesk>,
    pub batches: Arc<BatchDesk>,
    pub bookings: Arc<dyn Repository<BookingRecord>>,
    pub ledger: Arc<PaymentLedger>,
    pub agents: Directory<Agent>,
    pub airlines: Directory<Airline>,
    pub users: Directory<SystemUser>,
    pub inbox: Arc<Inbox>,
    pub backups: BackupRunner,
    pub sse_tx: broadcast::Sender<BackOfficeEvent>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

impl AppState {
    pub fn new(stores: Stores, auth: AuthConfig, business_rules: BusinessRules, backup: &BackupConfig) -> Self {
        let (sse_tx, _) = broadcast::channel(100);

        let lock_hold = chrono::Duration::hours(business_rules.lock_hold_hours);
        let desk = Arc::new(TicketDesk::new(stores.tickets.clone(), lock_hold));
        let batches = Arc::new(BatchDesk::new(stores.batches.clone(), desk.clone()));
        let backups = BackupRunner::new(
            Arc::new(stores.clone()),
            backup.settings(),
            Duration::from_millis(backup.step_delay_ms),
        )
        .with_events(sse_tx.clone());

        Self {
            desk,
            batches,
            bookings: stores.bookings.clone(),
            ledger: Arc::new(PaymentLedger::new(stores.payments.clone())),
            agents: Directory::new(stores.agents.clone()),
            airlines: Directory::new(stores.airlines.clone()),
            users: Directory::new(stores.users.clone()),
            inbox: Arc::new(Inbox::new()),
            backups,
            sse_tx,
            auth,
            business_rules,
        }
    }

    /// Everything in memory; what tests and a database-less run use
    pub fn in_memory(auth: AuthConfig, business_rules: BusinessRules, backup: &BackupConfig) -> Self {
        Self::new(Stores::in_memory(), auth, business_rules, backup)
    }

    pub fn expiry_windows(&self) -> ExpiryWindows {
        ExpiryWindows {
            warning: chrono::Duration::hours(self.business_rules.expiry_warning_hours),
            alert: chrono::Duration::hours(self.business_rules.expiry_alert_hours),
        }
    }

    /// Broadcast to SSE subscribers and the notification listener.
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: BackOfficeEvent) {
        let name = event.name();
        if self.sse_tx.send(event).is_err() {
            tracing::debug!(event = name, "No subscribers for event");
        }
    }

    /// Record every broadcast event in the notification inbox
    pub fn spawn_notification_listener(&self) -> JoinHandle<()> {
        spawn_event_listener(self.inbox.clone(), self.sse_tx.subscribe())
    }

    /// Make sure someone can log in: create the configured admin when there are no users
    pub async fn seed_admin(&self, name: &str, email: &str) -> anyhow::Result<()> {
        if !self.users.list().await?.is_empty() {
            return Ok(());
        }
        let user = SystemUser::new(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Admin,
            phone: String::new(),
        })?;
        let system = Actor::new("system", Role::Admin);
        self.users.create(&system, user).await?;
        info!(%email, "Bootstrap admin created");
        Ok(())
    }
}
