use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ticketpro_core::{Actor, CoreError, Entity, Permission};
use tracing::info;
use uuid::Uuid;

use crate::directory::{Directory, Listing};
use crate::{require_filled, ActiveStatus, DirectoryError};

/// Partner travel agency that originates bookings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub total_bookings: u32,
    pub total_revenue: i64,
    pub status: ActiveStatus,
    pub joined_date: NaiveDate,
    pub last_booking: Option<NaiveDate>,
    /// Percent of revenue
    pub commission: f64,
    pub commission_earned: i64,
    pub commission_paid: i64,
    pub commission_pending: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAgent {
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_commission")]
    pub commission: f64,
}

fn default_country() -> String {
    "Bangladesh".to_string()
}

fn default_commission() -> f64 {
    5.0
}

impl Agent {
    pub fn new(req: NewAgent) -> Result<Self, CoreError> {
        require_filled(&[("name", &req.name)])?;
        if !(0.0..=100.0).contains(&req.commission) {
            return Err(CoreError::ValidationError("commission must be between 0 and 100".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            company: req.company,
            email: req.email,
            phone: req.phone,
            address: req.address,
            city: req.city,
            country: req.country,
            total_bookings: 0,
            total_revenue: 0,
            status: ActiveStatus::Active,
            joined_date: Utc::now().date_naive(),
            last_booking: None,
            commission: req.commission,
            commission_earned: 0,
            commission_paid: 0,
            commission_pending: 0,
        })
    }

    /// Commission accrues at the agent's rate, rounded to whole taka.
    /// Running totals saturate instead of overflowing.
    pub fn record_booking(&mut self, amount: i64, on: NaiveDate) {
        let commission = (amount as f64 * self.commission / 100.0).round() as i64;
        self.total_bookings = self.total_bookings.saturating_add(1);
        self.total_revenue = self.total_revenue.saturating_add(amount);
        self.commission_earned = self.commission_earned.saturating_add(commission);
        self.commission_pending = self.commission_pending.saturating_add(commission);
        self.last_booking = Some(on);
    }

    pub fn pay_commission(&mut self, amount: i64) -> Result<(), DirectoryError> {
        if amount <= 0 {
            return Err(CoreError::ValidationError("commission payment must be positive".to_string()).into());
        }
        if amount > self.commission_pending {
            return Err(DirectoryError::CommissionExceeded {
                amount,
                pending: self.commission_pending,
            });
        }
        self.commission_paid += amount;
        self.commission_pending -= amount;
        Ok(())
    }
}

impl Entity for Agent {
    const KIND: &'static str = "Agent";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Listing for Agent {
    const MANAGE: Permission = Permission::ManageAgents;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ActiveStatus {
        self.status
    }

    fn set_status(&mut self, status: ActiveStatus) {
        self.status = status;
    }
}

impl Directory<Agent> {
    /// Credit a confirmed booking to the agent with that name, if registered
    pub async fn record_booking(&self, agent_name: &str, amount: i64) -> Result<Option<Agent>, DirectoryError> {
        let Some(mut agent) = self.find_by_name(agent_name).await? else {
            return Ok(None);
        };
        agent.record_booking(amount, Utc::now().date_naive());
        let agent = self.save(agent).await?;
        info!(
            agent = %agent.name,
            amount,
            pending = agent.commission_pending,
            "Booking credited to agent"
        );
        Ok(Some(agent))
    }

    pub async fn pay_commission(&self, actor: &Actor, id: Uuid, amount: i64) -> Result<Agent, DirectoryError> {
        actor.require(Permission::ManageAgents)?;

        let mut agent = self.get(id).await?;
        agent.pay_commission(amount)?;
        let agent = self.save(agent).await?;
        info!(agent = %agent.name, amount, actor = %actor.name, "Commission paid");
        Ok(agent)
    }
}
