//! Simulated asynchronous work (booking "processing", backup progress).
//!
//! Each piece of work runs as a spawned task that owns a [`CancellationToken`]
//! and resolves to a [`TaskOutcome`], so a real backend call can later replace
//! the simulated delay without touching call sites. Dropping the
//! [`TaskHandle`] before the task finishes cancels it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    Completed(T),
    Cancelled,
    Failed(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task cancelled")]
    Cancelled,
    #[error("task failed: {0}")]
    Failed(String),
}

/// Read side of a task's cancellation signal
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // Every canceller is gone: nobody can cancel any more.
            std::future::pending::<()>().await;
        }
    }

    /// Sleep that aborts early with `TaskError::Cancelled`
    pub async fn sleep(&self, duration: Duration) -> Result<(), TaskError> {
        if self.is_cancelled() {
            return Err(TaskError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(TaskError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

/// Write side of a task's cancellation signal, cheap to clone and store
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Arc<watch::Sender<bool>>,
}

impl Canceller {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct TaskHandle<T> {
    name: &'static str,
    canceller: Canceller,
    join: Option<JoinHandle<TaskOutcome<T>>>,
}

/// Spawn simulated work on the tokio runtime
pub fn spawn<T, F, Fut>(name: &'static str, work: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    let (tx, rx) = watch::channel(false);
    let work = work(CancellationToken { rx });

    let join = tokio::spawn(async move {
        match work.await {
            Ok(value) => TaskOutcome::Completed(value),
            Err(TaskError::Cancelled) => {
                tracing::info!(task = name, "Task cancelled");
                TaskOutcome::Cancelled
            }
            Err(TaskError::Failed(reason)) => {
                tracing::warn!(task = name, %reason, "Task failed");
                TaskOutcome::Failed(reason)
            }
        }
    });

    tracing::debug!(task = name, "Task started");
    TaskHandle {
        name,
        canceller: Canceller { tx: Arc::new(tx) },
        join: Some(join),
    }
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |j| j.is_finished())
    }

    /// Wait for the task. If the caller stops waiting, the task is cancelled.
    pub async fn outcome(mut self) -> TaskOutcome<T> {
        let result = match self.join.as_mut() {
            Some(join) => join.await,
            None => return TaskOutcome::Failed(format!("{} already awaited", self.name)),
        };
        self.join = None;
        result.unwrap_or_else(|e| TaskOutcome::Failed(e.to_string()))
    }

    /// Let the task run to completion without anyone awaiting it
    pub fn detach(mut self) -> Canceller {
        self.join = None;
        self.canceller.clone()
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.canceller.cancel();
        }
    }
}
