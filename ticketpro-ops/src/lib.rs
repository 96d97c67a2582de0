pub mod backup;
pub mod listener;
pub mod notifications;

pub use backup::{
    BackupEntry, BackupFrequency, BackupKind, BackupOverview, BackupRunner, BackupSettings, BackupStatus,
    SnapshotSource,
};
pub use listener::spawn_event_listener;
pub use notifications::{ExpiryWindows, Inbox, Notification, NotificationKind};

use ticketpro_core::CoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("Notification not found: {0}")]
    NotificationNotFound(Uuid),

    #[error("A backup is already running")]
    BackupInProgress,

    #[error("No backup is running")]
    NoBackupRunning,

    #[error(transparent)]
    Core(#[from] CoreError),
}
