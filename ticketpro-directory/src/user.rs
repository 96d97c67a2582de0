use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ticketpro_core::{CoreError, Entity, Permission, Role};
use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::{Directory, Listing};
use crate::{require_filled, ActiveStatus, DirectoryError};

/// A back-office login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub status: ActiveStatus,
    pub created_at: NaiveDate,
    pub last_login: Option<DateTime<Utc>>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub phone: String,
}

fn default_role() -> Role {
    Role::Staff
}

impl SystemUser {
    pub fn new(req: NewUser) -> Result<Self, CoreError> {
        require_filled(&[("name", &req.name), ("email", &req.email)])?;
        if !req.email.contains('@') {
            return Err(CoreError::ValidationError(format!("invalid email: {}", req.email)));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            role: req.role,
            phone: req.phone,
            status: ActiveStatus::Active,
            created_at: Utc::now().date_naive(),
            last_login: None,
            permissions: req.role.permission_labels(),
        })
    }
}

impl Entity for SystemUser {
    const KIND: &'static str = "User";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Listing for SystemUser {
    const MANAGE: Permission = Permission::ManageUsers;

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
        Some(&self.email)
    }
}

impl Directory<SystemUser> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<SystemUser>, DirectoryError> {
        let wanted = email.trim().to_lowercase();
        Ok(self.list().await?.into_iter().find(|u| u.email == wanted))
    }

    /// Resolve a login; unknown and inactive accounts are refused
    pub async fn login(&self, email: &str) -> Result<SystemUser, DirectoryError> {
        let Some(mut user) = self.find_by_email(email).await? else {
            warn!(%email, "Login for unknown email");
            return Err(CoreError::not_found(SystemUser::KIND, email).into());
        };
        if !user.status.is_active() {
            warn!(user = %user.name, "Login for inactive account");
            return Err(DirectoryError::Inactive(user.email));
        }

        user.last_login = Some(Utc::now());
        let user = self.save(user).await?;
        info!(user = %user.name, role = %user.role, "User logged in");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ticketpro_core::{Actor, InMemoryRepository};

    fn new_user(name: &str, email: &str, role: Role) -> SystemUser {
        SystemUser::new(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role,
            phone: String::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_permissions_follow_role() {
        let manager = new_user("Sarah Khan", "Manager@BDTicketPro.com", Role::Manager);
        assert_eq!(manager.permissions, vec!["book", "confirm", "reports"]);
        assert_eq!(manager.email, "manager@bdticketpro.com");
        assert!(manager.last_login.is_none());
    }

    #[test]
    fn test_bad_email_rejected() {
        let req = NewUser {
            name: "Jane".to_string(),
            email: "jane".to_string(),
            role: Role::Staff,
            phone: String::new(),
        };
        assert!(SystemUser::new(req).is_err());
    }

    #[tokio::test]
    async fn test_login_records_time_and_refuses_inactive() {
        let users: Directory<SystemUser> = Directory::new(Arc::new(InMemoryRepository::new()));
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        let jane = users
            .create(&admin, new_user("Jane", "staff@bdticketpro.com", Role::Staff))
            .await
            .unwrap();

        let logged_in = users.login("STAFF@bdticketpro.com").await.unwrap();
        assert!(logged_in.last_login.is_some());

        users.toggle_status(&admin, jane.id).await.unwrap();
        assert!(matches!(users.login("staff@bdticketpro.com").await, Err(DirectoryError::Inactive(_))));
        assert!(users.login("nobody@bdticketpro.com").await.is_err());
    }

    #[tokio::test]
    async fn test_emails_are_unique() {
        let users: Directory<SystemUser> = Directory::new(Arc::new(InMemoryRepository::new()));
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        users
            .create(&admin, new_user("Jane", "staff@bdticketpro.com", Role::Staff))
            .await
            .unwrap();
        assert!(matches!(
            users.create(&admin, new_user("Jane Two", "Staff@bdticketpro.com", Role::Staff)).await,
            Err(DirectoryError::Duplicate { .. })
        ));
    }
}
