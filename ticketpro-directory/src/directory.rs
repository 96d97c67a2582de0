use std::sync::Arc;
use ticketpro_core::{Actor, Entity, Permission, Repository};
use tracing::info;
use uuid::Uuid;

use crate::{ActiveStatus, DirectoryError};

/// A record managed through one of the directory panels
pub trait Listing: Entity {
    /// Permission needed to change this list
    const MANAGE: Permission;

    fn display_name(&self) -> &str;

    fn status(&self) -> ActiveStatus;

    fn set_status(&mut self, status: ActiveStatus);

    /// Business key that must stay unique, compared case-insensitively
    fn unique_key(&self) -> Option<&str> {
        None
    }
}

/// CRUD over one listing type, with permission checks
pub struct Directory<T: Listing> {
    repo: Arc<dyn Repository<T>>,
}

impl<T: Listing> Clone for Directory<T> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone() }
    }
}

impl<T: Listing> Directory<T> {
    pub fn new(repo: Arc<dyn Repository<T>>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<T>, DirectoryError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<T, DirectoryError> {
        self.repo
            .get(id)
            .await?
            .ok_or(DirectoryError::NotFound { kind: T::KIND, id })
    }

    pub async fn create(&self, actor: &Actor, item: T) -> Result<T, DirectoryError> {
        actor.require(T::MANAGE)?;

        if let Some(key) = item.unique_key() {
            let taken = self
                .repo
                .list()
                .await?
                .iter()
                .filter_map(|existing| existing.unique_key().map(str::to_lowercase))
                .any(|existing| existing == key.to_lowercase());
            if taken {
                return Err(DirectoryError::Duplicate {
                    kind: T::KIND,
                    key: key.to_string(),
                });
            }
        }

        let item = self.repo.insert(item).await?;
        info!(kind = T::KIND, name = item.display_name(), actor = %actor.name, "Directory entry created");
        Ok(item)
    }

    pub async fn toggle_status(&self, actor: &Actor, id: Uuid) -> Result<T, DirectoryError> {
        actor.require(T::MANAGE)?;

        let mut item = self.get(id).await?;
        item.set_status(item.status().toggled());
        let item = self.repo.update(item).await?;
        info!(kind = T::KIND, name = item.display_name(), status = %item.status(), "Directory entry toggled");
        Ok(item)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DirectoryError> {
        actor.require(T::MANAGE)?;

        if !self.repo.delete(id).await? {
            return Err(DirectoryError::NotFound { kind: T::KIND, id });
        }
        info!(kind = T::KIND, %id, actor = %actor.name, "Directory entry deleted");
        Ok(())
    }

    /// Case-insensitive lookup on the display name
    pub async fn find_by_name(&self, name: &str) -> Result<Option<T>, DirectoryError> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .repo
            .list()
            .await?
            .into_iter()
            .find(|item| item.display_name().to_lowercase() == wanted))
    }

    /// Write back a record changed by a listing-specific operation
    pub(crate) async fn save(&self, item: T) -> Result<T, DirectoryError> {
        Ok(self.repo.update(item).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Airline, NewAirline};
    use ticketpro_core::{CoreError, InMemoryRepository, Role};

    fn airlines() -> Directory<Airline> {
        Directory::new(Arc::new(InMemoryRepository::new()))
    }

    fn emirates() -> Airline {
        Airline::new(NewAirline {
            name: "Emirates".to_string(),
            code: "EK".to_string(),
            country: "UAE".to_string(),
            logo: String::new(),
            commission: 8.5,
            contact_email: "booking@emirates.com".to_string(),
            contact_phone: "+971-4-214-4444".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_toggle_delete() {
        let dir = airlines();
        let admin = Actor::new("Ahmed Rahman", Role::Admin);

        let created = dir.create(&admin, emirates()).await.unwrap();
        assert!(created.status.is_active());

        let toggled = dir.toggle_status(&admin, created.id).await.unwrap();
        assert_eq!(toggled.status, ActiveStatus::Inactive);
        let toggled = dir.toggle_status(&admin, created.id).await.unwrap();
        assert_eq!(toggled.status, ActiveStatus::Active);

        dir.delete(&admin, created.id).await.unwrap();
        assert!(dir.list().await.unwrap().is_empty());
        assert!(matches!(
            dir.delete(&admin, created.id).await,
            Err(DirectoryError::NotFound { kind: "Airline", .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let dir = airlines();
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        dir.create(&admin, emirates()).await.unwrap();

        let mut again = emirates();
        again.code = "ek".to_string();
        assert!(matches!(
            dir.create(&admin, again).await,
            Err(DirectoryError::Duplicate { kind: "Airline", .. })
        ));
    }

    #[tokio::test]
    async fn test_manager_cannot_manage_airlines() {
        let dir = airlines();
        let manager = Actor::new("Sarah Khan", Role::Manager);
        assert!(matches!(
            dir.create(&manager, emirates()).await,
            Err(DirectoryError::Core(CoreError::Forbidden { .. }))
        ));
    }

    #[tokio::test]
    async fn test_find_by_name_ignores_case() {
        let dir = airlines();
        let admin = Actor::new("Ahmed Rahman", Role::Admin);
        dir.create(&admin, emirates()).await.unwrap();
        assert!(dir.find_by_name(" emirates ").await.unwrap().is_some());
        assert!(dir.find_by_name("Biman").await.unwrap().is_none());
    }
}
