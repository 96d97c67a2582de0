//! Simulated backups: progress steps on a cancellable task, a history of runs
//! and the auto-backup schedule. Nothing is written anywhere; the "size" of a
//! backup is the size of a JSON snapshot of the collections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ticketpro_core::task::{self, Canceller, CancellationToken, TaskError, TaskHandle};
use ticketpro_core::{Actor, CoreResult, Permission};
use ticketpro_shared::models::events::BackupFinishedEvent;
use ticketpro_shared::BackOfficeEvent;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info};
use uuid::Uuid;

use crate::OpsError;

pub const PROGRESS_STEPS: [u8; 6] = [10, 25, 45, 70, 85, 100];

/// Runs kept in the history, newest first
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Manual,
    Auto,
}

impl BackupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackupKind::Manual => "manual",
            BackupKind::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl BackupFrequency {
    pub fn period(self) -> chrono::Duration {
        match self {
            BackupFrequency::Daily => chrono::Duration::days(1),
            BackupFrequency::Weekly => chrono::Duration::days(7),
            BackupFrequency::Monthly => chrono::Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupSettings {
    pub auto_enabled: bool,
    pub frequency: BackupFrequency,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            auto_enabled: true,
            frequency: BackupFrequency::Daily,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupEntry {
    pub id: Uuid,
    pub kind: BackupKind,
    pub status: BackupStatus,
    pub date: DateTime<Utc>,
    pub size_bytes: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupOverview {
    pub settings: BackupSettings,
    pub last_backup: Option<DateTime<Utc>>,
    pub running: bool,
    pub progress: u8,
    pub history: Vec<BackupEntry>,
}

/// Produces the data a backup would contain
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self) -> CoreResult<serde_json::Value>;
}

struct ActiveRun {
    id: Uuid,
    canceller: Option<Canceller>,
}

#[derive(Default)]
struct BackupState {
    settings: BackupSettings,
    history: Vec<BackupEntry>,
    last_backup: Option<DateTime<Utc>>,
    progress: u8,
    active: Option<ActiveRun>,
}

#[derive(Clone)]
pub struct BackupRunner {
    state: Arc<RwLock<BackupState>>,
    source: Arc<dyn SnapshotSource>,
    step_delay: Duration,
    events: Option<broadcast::Sender<BackOfficeEvent>>,
}

impl BackupRunner {
    pub fn new(source: Arc<dyn SnapshotSource>, settings: BackupSettings, step_delay: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(BackupState {
                settings,
                ..Default::default()
            })),
            source,
            step_delay,
            events: None,
        }
    }

    /// Announce finished runs on this channel
    pub fn with_events(mut self, events: broadcast::Sender<BackOfficeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn overview(&self) -> BackupOverview {
        let state = self.state.read().await;
        BackupOverview {
            settings: state.settings,
            last_backup: state.last_backup,
            running: state.active.is_some(),
            progress: state.progress,
            history: state.history.clone(),
        }
    }

    pub async fn settings(&self) -> BackupSettings {
        self.state.read().await.settings
    }

    pub async fn update_settings(&self, actor: &Actor, settings: BackupSettings) -> Result<BackupSettings, OpsError> {
        actor.require(Permission::RunBackup)?;
        self.state.write().await.settings = settings;
        info!(?settings, actor = %actor.name, "Backup settings updated");
        Ok(settings)
    }

    /// Start a manual backup. Only one run at a time.
    pub async fn start_manual(&self, actor: &Actor) -> Result<TaskHandle<BackupEntry>, OpsError> {
        actor.require(Permission::RunBackup)?;
        self.start(BackupKind::Manual).await
    }

    pub async fn cancel(&self, actor: &Actor) -> Result<(), OpsError> {
        actor.require(Permission::RunBackup)?;
        let state = self.state.read().await;
        match state.active.as_ref().and_then(|run| run.canceller.as_ref()) {
            Some(canceller) => {
                canceller.cancel();
                info!(actor = %actor.name, "Backup cancellation requested");
                Ok(())
            }
            None => Err(OpsError::NoBackupRunning),
        }
    }

    /// Auto backup is due when enabled and the last successful run is older
    /// than the configured frequency (or there has never been one)
    pub async fn auto_backup_due(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.read().await;
        if !state.settings.auto_enabled || state.active.is_some() {
            return false;
        }
        state
            .last_backup
            .map_or(true, |last| now - last >= state.settings.frequency.period())
    }

    /// Start an auto backup if one is due
    pub async fn run_due_auto_backup(&self, now: DateTime<Utc>) -> Result<Option<TaskHandle<BackupEntry>>, OpsError> {
        if !self.auto_backup_due(now).await {
            return Ok(None);
        }
        match self.start(BackupKind::Auto).await {
            Ok(handle) => Ok(Some(handle)),
            Err(OpsError::BackupInProgress) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check the schedule periodically until the runtime shuts down
    pub fn spawn_scheduler(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match runner.run_due_auto_backup(Utc::now()).await {
                    Ok(Some(handle)) => {
                        info!("Auto backup triggered");
                        drop(handle.detach());
                    }
                    Ok(None) => {}
                    Err(e) => error!(error = %e, "Auto backup check failed"),
                }
            }
        })
    }

    async fn start(&self, kind: BackupKind) -> Result<TaskHandle<BackupEntry>, OpsError> {
        let run_id = Uuid::new_v4();
        {
            let mut state = self.state.write().await;
            if state.active.is_some() {
                return Err(OpsError::BackupInProgress);
            }
            state.active = Some(ActiveRun {
                id: run_id,
                canceller: None,
            });
            state.progress = 0;
        }

        let runner = self.clone();
        let handle = task::spawn("backup", move |token| async move { runner.run(run_id, kind, token).await });

        let mut state = self.state.write().await;
        if let Some(run) = state.active.as_mut().filter(|run| run.id == run_id) {
            run.canceller = Some(handle.canceller());
        }
        info!(kind = kind.as_str(), "Backup started");
        Ok(handle)
    }

    async fn run(&self, run_id: Uuid, kind: BackupKind, token: CancellationToken) -> Result<BackupEntry, TaskError> {
        let started = Instant::now();
        let result = self.steps(&token).await;

        let entry = BackupEntry {
            id: run_id,
            kind,
            status: if result.is_ok() {
                BackupStatus::Success
            } else {
                BackupStatus::Failed
            },
            date: Utc::now(),
            size_bytes: *result.as_ref().unwrap_or(&0),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        {
            let mut state = self.state.write().await;
            state.history.insert(0, entry.clone());
            state.history.truncate(MAX_HISTORY);
            if entry.status == BackupStatus::Success {
                state.last_backup = Some(entry.date);
            }
            state.progress = 0;
            if state.active.as_ref().is_some_and(|run| run.id == run_id) {
                state.active = None;
            }
        }

        if let Some(events) = &self.events {
            let _ = events.send(BackOfficeEvent::BackupFinished(BackupFinishedEvent {
                backup_id: entry.id,
                kind: kind.as_str().to_string(),
                succeeded: entry.status == BackupStatus::Success,
                timestamp: entry.date.timestamp(),
            }));
        }

        match result {
            Ok(size) => {
                info!(kind = kind.as_str(), size_bytes = size, duration_ms = entry.duration_ms, "Backup finished");
                Ok(entry)
            }
            Err(e) => Err(e),
        }
    }

    async fn steps(&self, token: &CancellationToken) -> Result<u64, TaskError> {
        for step in PROGRESS_STEPS {
            token.sleep(self.step_delay).await?;
            self.state.write().await.progress = step;
        }
        let snapshot = self
            .source
            .snapshot()
            .await
            .map_err(|e| TaskError::Failed(e.to_string()))?;
        let bytes = serde_json::to_vec(&snapshot).map_err(|e| TaskError::Failed(e.to_string()))?;
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketpro_core::task::TaskOutcome;
    use ticketpro_core::{CoreError, Role};

    struct FixedSnapshot;

    #[async_trait]
    impl SnapshotSource for FixedSnapshot {
        async fn snapshot(&self) -> CoreResult<serde_json::Value> {
            Ok(serde_json::json!({ "tickets": [{ "serial_number": "BD001" }] }))
        }
    }

    struct BrokenSnapshot;

    #[async_trait]
    impl SnapshotSource for BrokenSnapshot {
        async fn snapshot(&self) -> CoreResult<serde_json::Value> {
            Err(CoreError::StorageError("disk full".to_string()))
        }
    }

    fn runner(source: Arc<dyn SnapshotSource>, delay_ms: u64) -> BackupRunner {
        BackupRunner::new(source, BackupSettings::default(), Duration::from_millis(delay_ms))
    }

    fn admin() -> Actor {
        Actor::new("Ahmed Rahman", Role::Admin)
    }

    #[tokio::test]
    async fn test_manual_backup_records_history() {
        let runner = runner(Arc::new(FixedSnapshot), 1);
        let handle = runner.start_manual(&admin()).await.unwrap();

        let TaskOutcome::Completed(entry) = handle.outcome().await else {
            panic!("backup did not complete");
        };
        assert_eq!(entry.status, BackupStatus::Success);
        assert_eq!(entry.kind, BackupKind::Manual);
        assert!(entry.size_bytes > 0);

        let overview = runner.overview().await;
        assert!(!overview.running);
        assert_eq!(overview.history.len(), 1);
        assert_eq!(overview.last_backup, Some(entry.date));
    }

    #[tokio::test]
    async fn test_history_keeps_latest_runs() {
        let runner = runner(Arc::new(FixedSnapshot), 0);
        let mut last = None;
        for _ in 0..MAX_HISTORY + 3 {
            let handle = runner.start_manual(&admin()).await.unwrap();
            if let TaskOutcome::Completed(entry) = handle.outcome().await {
                last = Some(entry.id);
            }
        }

        let history = runner.overview().await.history;
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(Some(history[0].id), last);
    }

    #[tokio::test]
    async fn test_one_run_at_a_time() {
        let runner = runner(Arc::new(FixedSnapshot), 50);
        let handle = runner.start_manual(&admin()).await.unwrap();
        assert!(matches!(runner.start_manual(&admin()).await, Err(OpsError::BackupInProgress)));
        assert!(runner.overview().await.running);
        handle.cancel();
        handle.outcome().await;
    }

    #[tokio::test]
    async fn test_cancel_records_failed_run() {
        let runner = runner(Arc::new(FixedSnapshot), 200);
        let handle = runner.start_manual(&admin()).await.unwrap();
        runner.cancel(&admin()).await.unwrap();

        assert_eq!(handle.outcome().await, TaskOutcome::Cancelled);
        let overview = runner.overview().await;
        assert_eq!(overview.history[0].status, BackupStatus::Failed);
        assert_eq!(overview.last_backup, None);
        assert!(matches!(runner.cancel(&admin()).await, Err(OpsError::NoBackupRunning)));
    }

    #[tokio::test]
    async fn test_snapshot_failure_is_reported() {
        let runner = runner(Arc::new(BrokenSnapshot), 1);
        let handle = runner.start_manual(&admin()).await.unwrap();
        assert!(matches!(handle.outcome().await, TaskOutcome::Failed(_)));
        assert_eq!(runner.overview().await.history[0].status, BackupStatus::Failed);
    }

    #[tokio::test]
    async fn test_auto_backup_schedule() {
        let runner = runner(Arc::new(FixedSnapshot), 1);
        let now = Utc::now();
        assert!(runner.auto_backup_due(now).await);

        let handle = runner.run_due_auto_backup(now).await.unwrap().unwrap();
        let TaskOutcome::Completed(entry) = handle.outcome().await else {
            panic!("auto backup did not complete");
        };
        assert_eq!(entry.kind, BackupKind::Auto);
        assert!(!runner.auto_backup_due(entry.date + chrono::Duration::hours(23)).await);
        assert!(runner.auto_backup_due(entry.date + chrono::Duration::hours(24)).await);

        runner
            .update_settings(
                &admin(),
                BackupSettings {
                    auto_enabled: false,
                    frequency: BackupFrequency::Weekly,
                },
            )
            .await
            .unwrap();
        assert!(!runner.auto_backup_due(entry.date + chrono::Duration::days(30)).await);
    }

    #[tokio::test]
    async fn test_only_admin_runs_backups() {
        let runner = runner(Arc::new(FixedSnapshot), 1);
        let manager = Actor::new("Sarah Khan", Role::Manager);
        assert!(runner.start_manual(&manager).await.is_err());
        assert!(runner.update_settings(&manager, BackupSettings::default()).await.is_err());
    }
}
