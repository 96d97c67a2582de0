use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{Entity, Repository};
use crate::{CoreError, CoreResult};

struct Slots<T> {
    items: HashMap<Uuid, T>,
    order: Vec<Uuid>,
}

/// In-memory repository keyed by id (tests and the default runtime)
pub struct InMemoryRepository<T: Entity> {
    slots: RwLock<Slots<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                items: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Build a repository pre-filled with records (duplicates keep the last copy)
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut slots = Slots {
            items: HashMap::new(),
            order: Vec::new(),
        };
        for item in items {
            let id = item.id();
            if slots.items.insert(id, item).is_none() {
                slots.order.push(id);
            }
        }
        Self {
            slots: RwLock::new(slots),
        }
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn list(&self) -> CoreResult<Vec<T>> {
        let slots = self.slots.read().await;
        Ok(slots
            .order
            .iter()
            .filter_map(|id| slots.items.get(id).cloned())
            .collect())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<T>> {
        Ok(self.slots.read().await.items.get(&id).cloned())
    }

    async fn insert(&self, item: T) -> CoreResult<T> {
        let mut slots = self.slots.write().await;
        let id = item.id();
        if slots.items.contains_key(&id) {
            return Err(CoreError::Conflict(format!("{} {} already exists", T::KIND, id)));
        }
        slots.items.insert(id, item.clone());
        slots.order.push(id);
        Ok(item)
    }

    async fn update(&self, item: T) -> CoreResult<T> {
        let mut slots = self.slots.write().await;
        let slot = slots
            .items
            .get_mut(&item.id())
            .ok_or_else(|| CoreError::not_found(T::KIND, item.id()))?;
        *slot = item.clone();
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let mut slots = self.slots.write().await;
        if slots.items.remove(&id).is_none() {
            return Ok(false);
        }
        slots.order.retain(|existing| *existing != id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Uuid,
        text: String,
    }

    impl Entity for Note {
        const KIND: &'static str = "Note";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn note(text: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let repo = InMemoryRepository::new();
        let a = repo.insert(note("a")).await.unwrap();
        let b = repo.insert(note("b")).await.unwrap();
        let c = repo.insert(note("c")).await.unwrap();

        repo.delete(b.id).await.unwrap();

        let texts: Vec<String> = repo.list().await.unwrap().into_iter().map(|n| n.text).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(repo.get(a.id).await.unwrap().unwrap(), a);
        assert_eq!(repo.get(c.id).await.unwrap().unwrap(), c);
    }

    #[tokio::test]
    async fn test_update_replaces_by_id_only() {
        let repo = InMemoryRepository::with_items(vec![note("a"), note("b")]);
        let mut first = repo.list().await.unwrap()[0].clone();
        first.text = "changed".to_string();
        repo.update(first.clone()).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all[0].text, "changed");
        assert_eq!(all[1].text, "b");
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_ids() {
        let repo = InMemoryRepository::new();
        let n = repo.insert(note("a")).await.unwrap();

        assert!(matches!(repo.insert(n.clone()).await, Err(CoreError::Conflict(_))));
        assert!(matches!(repo.update(note("ghost")).await, Err(CoreError::NotFound { .. })));
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }
}
