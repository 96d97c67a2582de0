use std::sync::Arc;
use ticketpro_shared::BackOfficeEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::notifications::Inbox;

/// Turn every broadcast event into an inbox notification until the channel closes
pub fn spawn_event_listener(inbox: Arc<Inbox>, mut events: broadcast::Receiver<BackOfficeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Notification listener started");
        loop {
            match events.recv().await {
                Ok(event) => {
                    inbox.record_event(&event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification listener lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!("Notification listener stopped");
    })
}
