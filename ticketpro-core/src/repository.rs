use async_trait::async_trait;
use uuid::Uuid;

use crate::CoreResult;

/// A record that lives in a repository, addressed by id
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name used in not-found errors and logs
    const KIND: &'static str;

    fn id(&self) -> Uuid;
}

/// Storage seam shared by every back-office collection.
///
/// Writes replace the whole record by id; concurrent writers are not
/// detected (last write wins).
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All records, in insertion order
    async fn list(&self) -> CoreResult<Vec<T>>;

    async fn get(&self, id: Uuid) -> CoreResult<Option<T>>;

    /// Fails with `Conflict` if the id is already taken
    async fn insert(&self, item: T) -> CoreResult<T>;

    /// Fails with `NotFound` if the id is unknown
    async fn update(&self, item: T) -> CoreResult<T>;

    /// Returns whether a record was removed
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}
