pub mod app_config;
pub mod database;
pub mod document_repo;
pub mod payment_repo;
pub mod ticket_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use document_repo::PgDocumentRepository;
pub use payment_repo::PgPaymentRepository;
pub use ticket_repo::PgTicketRepository;

use ticketpro_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Stored record is unreadable: {0}")]
    Corrupt(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                CoreError::Conflict(db.message().to_string())
            }
            other => CoreError::StorageError(other.to_string()),
        }
    }
}

/// Shorthand for repository methods: sqlx failure to domain error
pub(crate) fn db_err(err: sqlx::Error) -> CoreError {
    StoreError::Database(err).into()
}
