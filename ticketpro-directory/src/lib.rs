//! Agents, airlines and system users.
//!
//! All three are plain lists with create / toggle-status / delete. The only
//! rule shared across them is id uniqueness plus, where a listing has one, a
//! unique business key (airline code, user email).

pub mod agent;
pub mod airline;
pub mod directory;
pub mod user;

pub use agent::{Agent, NewAgent};
pub use airline::{Airline, NewAirline};
pub use directory::{Directory, Listing};
pub use user::{NewUser, SystemUser};

use serde::{Deserialize, Serialize};
use std::fmt;
use ticketpro_core::CoreError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

impl ActiveStatus {
    pub fn toggled(self) -> Self {
        match self {
            ActiveStatus::Active => ActiveStatus::Inactive,
            ActiveStatus::Inactive => ActiveStatus::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self == ActiveStatus::Active
    }
}

impl fmt::Display for ActiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActiveStatus::Active => "active",
            ActiveStatus::Inactive => "inactive",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} already registered: {key}")]
    Duplicate { kind: &'static str, key: String },

    #[error("Commission payment of {amount} exceeds pending {pending}")]
    CommissionExceeded { amount: i64, pending: i64 },

    #[error("Account inactive: {0}")]
    Inactive(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub(crate) fn require_filled(fields: &[(&str, &str)]) -> Result<(), CoreError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(CoreError::ValidationError(format!("{} is required", name))),
        None => Ok(()),
    }
}
