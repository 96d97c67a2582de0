use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Back-office role of a system user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    BookTicket,
    ConfirmBooking,
    UnlockTicket,
    ViewBuyingPrice,
    ViewReports,
    RecordPayment,
    ManageAgents,
    ManageAirlines,
    ManageUsers,
    ManageInventory,
    RunBackup,
}

// ============================================================================
// Authorization table
// ============================================================================

const ADMIN: &[Permission] = &[
    Permission::BookTicket,
    Permission::ConfirmBooking,
    Permission::UnlockTicket,
    Permission::ViewBuyingPrice,
    Permission::ViewReports,
    Permission::RecordPayment,
    Permission::ManageAgents,
    Permission::ManageAirlines,
    Permission::ManageUsers,
    Permission::ManageInventory,
    Permission::RunBackup,
];

const MANAGER: &[Permission] = &[
    Permission::BookTicket,
    Permission::ConfirmBooking,
    Permission::ViewReports,
    Permission::RecordPayment,
    Permission::ManageAgents,
    Permission::ManageInventory,
];

const STAFF: &[Permission] = &[Permission::BookTicket];

impl Role {
    /// The single source of truth for what a role may do.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN,
            Role::Manager => MANAGER,
            Role::Staff => STAFF,
        }
    }

    pub fn can(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Coarse labels stored on the user record and shown in user management.
    pub fn permission_labels(self) -> Vec<String> {
        let labels: &[&str] = match self {
            Role::Admin => &["all"],
            Role::Manager => &["book", "confirm", "reports"],
            Role::Staff => &["book"],
        };
        labels.iter().map(|l| l.to_string()).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(CoreError::ValidationError(format!("unknown role: {}", other))),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The authenticated user performing an operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    pub fn require(&self, permission: Permission) -> CoreResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::warn!(actor = %self.name, role = %self.role, %permission, "Permission denied");
            Err(CoreError::Forbidden {
                role: self.role,
                permission,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_and_manager_confirm() {
        assert!(Role::Admin.can(Permission::ConfirmBooking));
        assert!(Role::Manager.can(Permission::ConfirmBooking));
        assert!(!Role::Staff.can(Permission::ConfirmBooking));
    }

    #[test]
    fn test_only_admin_unlocks_and_sees_cost() {
        for role in [Role::Manager, Role::Staff] {
            assert!(!role.can(Permission::UnlockTicket));
            assert!(!role.can(Permission::ViewBuyingPrice));
        }
        assert!(Role::Admin.can(Permission::UnlockTicket));
        assert!(Role::Admin.can(Permission::ViewBuyingPrice));
    }

    #[test]
    fn test_everyone_books() {
        for role in [Role::Admin, Role::Manager, Role::Staff] {
            assert!(role.can(Permission::BookTicket));
        }
    }

    #[test]
    fn test_require_reports_missing_permission() {
        let actor = Actor::new("Jane", Role::Staff);
        let err = actor.require(Permission::ManageUsers).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Forbidden { role: Role::Staff, permission: Permission::ManageUsers }
        ));
    }

    #[test]
    fn test_role_parsing_and_labels() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("pilot".parse::<Role>().is_err());
        assert_eq!(Role::Admin.permission_labels(), vec!["all"]);
        assert_eq!(Role::Manager.permission_labels(), vec!["book", "confirm", "reports"]);
    }
}
