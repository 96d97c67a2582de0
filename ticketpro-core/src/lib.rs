pub mod access;
pub mod memory;
pub mod repository;
pub mod task;

pub use access::{Actor, Permission, Role};
pub use memory::InMemoryRepository;
pub use repository::{Entity, Repository};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Role {role} lacks permission {permission}")]
    Forbidden { role: Role, permission: Permission },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { kind, id: id.to_string() }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
