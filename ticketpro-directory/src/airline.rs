use serde::{Deserialize, Serialize};
use ticketpro_core::{CoreError, Entity, Permission};
use uuid::Uuid;

use crate::directory::Listing;
use crate::{require_filled, ActiveStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Airline {
    pub id: Uuid,
    pub name: String,
    /// IATA designator, e.g. "EK"
    pub code: String,
    pub country: String,
    pub logo: String,
    pub total_routes: u32,
    pub active_tickets: u32,
    pub total_revenue: i64,
    pub status: ActiveStatus,
    /// Percent
    pub commission: f64,
    pub contact_email: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAirline {
    pub name: String,
    pub code: String,
    pub country: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default = "default_commission")]
    pub commission: f64,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
}

fn default_commission() -> f64 {
    5.0
}

impl Airline {
    pub fn new(req: NewAirline) -> Result<Self, CoreError> {
        require_filled(&[("name", &req.name), ("code", &req.code), ("country", &req.country)])?;
        if !(0.0..=100.0).contains(&req.commission) {
            return Err(CoreError::ValidationError("commission must be between 0 and 100".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            code: req.code.trim().to_uppercase(),
            country: req.country.trim().to_string(),
            logo: req.logo,
            total_routes: 0,
            active_tickets: 0,
            total_revenue: 0,
            status: ActiveStatus::Active,
            commission: req.commission,
            contact_email: req.contact_email,
            contact_phone: req.contact_phone,
        })
    }
}

impl Entity for Airline {
    const KIND: &'static str = "Airline";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Listing for Airline {
    const MANAGE: Permission = Permission::ManageAirlines;

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ActiveStatus {
        self.status
    }

    fn set_status(&mut self, status: ActiveStatus) {
        self.status = status;
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }
}
