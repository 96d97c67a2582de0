use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ticketpro_core::{Actor, CoreError, Entity, Permission, Repository};
use tracing::info;
use uuid::Uuid;

use crate::lifecycle::{TicketDesk, TicketFilter};
use crate::ticket::{LockStatus, Ticket};
use crate::InventoryError;

/// A block of seats bought from an airline or consolidator at one price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketBatch {
    pub id: Uuid,
    pub batch_ref: String,
    pub country: String,
    pub airline: String,
    pub flight_date: NaiveDate,
    pub flight_time: NaiveTime,
    pub buying_price: i64,
    pub selling_price: i64,
    pub quantity: u32,
    pub total_cost: i64,
    pub agent_name: String,
    pub agent_contact: Option<String>,
    pub agent_address: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub country: String,
    pub airline: String,
    pub flight_date: NaiveDate,
    pub flight_time: NaiveTime,
    pub buying_price: i64,
    pub selling_price: i64,
    pub quantity: u32,
    pub agent_name: String,
    pub agent_contact: Option<String>,
    pub agent_address: Option<String>,
    pub remarks: Option<String>,
}

impl NewBatch {
    fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("country", &self.country),
            ("airline", &self.airline),
            ("agent name", &self.agent_name),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CoreError::ValidationError(format!("{} is required", field)));
        }
        if self.quantity == 0 {
            return Err(CoreError::ValidationError("quantity must be at least 1".to_string()));
        }
        if self.buying_price <= 0 || self.selling_price <= 0 {
            return Err(CoreError::ValidationError("prices must be positive".to_string()));
        }
        if self.buying_price.checked_mul(i64::from(self.quantity)).is_none() {
            return Err(CoreError::ValidationError("total cost is too large".to_string()));
        }
        Ok(())
    }
}

impl TicketBatch {
    pub fn new(batch_ref: String, req: NewBatch) -> Self {
        Self {
            id: Uuid::new_v4(),
            batch_ref,
            total_cost: req.buying_price.saturating_mul(i64::from(req.quantity)),
            country: req.country,
            airline: req.airline,
            flight_date: req.flight_date,
            flight_time: req.flight_time,
            buying_price: req.buying_price,
            selling_price: req.selling_price,
            quantity: req.quantity,
            agent_name: req.agent_name,
            agent_contact: req.agent_contact,
            agent_address: req.agent_address,
            remarks: req.remarks,
            created_at: Utc::now(),
        }
    }

    /// One available ticket per seat, serials `{batch_ref}-001`, `-002`, ...
    pub fn issue_tickets(&self) -> Vec<Ticket> {
        (1..=self.quantity)
            .map(|n| {
                let mut ticket = Ticket::new(
                    format!("{}-{:03}", self.batch_ref, n),
                    self.airline.clone(),
                    self.country.clone(),
                    self.flight_date,
                    self.flight_time,
                    self.selling_price,
                    self.buying_price,
                );
                ticket.batch_id = Some(self.id);
                ticket
            })
            .collect()
    }
}

impl Entity for TicketBatch {
    const KIND: &'static str = "TicketBatch";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFilter {
    /// Matches batch ref, agent or airline, case-insensitive
    pub search: Option<String>,
    pub country: Option<String>,
    pub airline: Option<String>,
}

impl BatchFilter {
    pub fn matches(&self, batch: &TicketBatch) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&batch.batch_ref, &batch.agent_name, &batch.airline]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        };
        let country_ok = self.country.as_ref().map_or(true, |c| &batch.country == c);
        let airline_ok = self.airline.as_ref().map_or(true, |a| &batch.airline == a);
        search_ok && country_ok && airline_ok
    }
}

/// A batch with its live stock counts
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchStock {
    #[serde(flatten)]
    pub batch: TicketBatch,
    pub sold_count: u32,
    pub available_count: u32,
    pub locked_count: u32,
    pub total_profit: i64,
}

impl BatchStock {
    pub fn from_tickets(batch: TicketBatch, tickets: &[Ticket]) -> Self {
        let mut stock = Self {
            batch,
            sold_count: 0,
            available_count: 0,
            locked_count: 0,
            total_profit: 0,
        };
        for ticket in tickets.iter().filter(|t| t.batch_id == Some(stock.batch.id)) {
            match ticket.lock_status {
                LockStatus::Available => stock.available_count += 1,
                LockStatus::Locked => stock.locked_count += 1,
                LockStatus::Sold => {
                    stock.sold_count += 1;
                    stock.total_profit += ticket.margin();
                }
            }
        }
        stock
    }
}

/// Ticket buying: register purchased batches and track their stock
pub struct BatchDesk {
    batches: Arc<dyn Repository<TicketBatch>>,
    desk: Arc<TicketDesk>,
}

impl BatchDesk {
    pub fn new(batches: Arc<dyn Repository<TicketBatch>>, desk: Arc<TicketDesk>) -> Self {
        Self { batches, desk }
    }

    pub async fn register(&self, actor: &Actor, req: NewBatch) -> Result<BatchStock, InventoryError> {
        actor.require(Permission::ManageInventory)?;
        req.validate()?;

        // Sequence restarts every year
        let prefix = format!("BTH-{}-", req.flight_date.year());
        let same_year = self
            .batches
            .list()
            .await?
            .iter()
            .filter(|b| b.batch_ref.starts_with(&prefix))
            .count();
        let batch_ref = format!("{}{:03}", prefix, same_year + 1);
        let batch = TicketBatch::new(batch_ref, req);

        let tickets = self.desk.add_tickets(actor, batch.issue_tickets()).await?;
        let batch = self.batches.insert(batch).await?;

        info!(
            batch = %batch.batch_ref,
            quantity = batch.quantity,
            total_cost = batch.total_cost,
            actor = %actor.name,
            "Ticket batch registered"
        );
        Ok(BatchStock::from_tickets(batch, &tickets))
    }

    pub async fn list(&self, filter: &BatchFilter) -> Result<Vec<BatchStock>, InventoryError> {
        let tickets = self.desk.list(&TicketFilter::default()).await?;
        let batches = self.batches.list().await?;
        Ok(batches
            .into_iter()
            .filter(|b| filter.matches(b))
            .map(|b| BatchStock::from_tickets(b, &tickets))
            .collect())
    }
}
