//! Debounced background writes to the autosave slot.
//!
//! Handlers push snapshots after each mutation; a burst collapses into a single
//! `auto_save` of the latest snapshot once the channel has been quiet for the debounce
//! window. When every handle is dropped the pending snapshot is flushed and the task ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::models::CvAggregate;
use crate::persistence::CvPersistence;

enum Command {
    Save(Box<CvAggregate>),
    /// Drop the pending snapshot; acknowledged once no write is in flight.
    Cancel(oneshot::Sender<()>),
}

/// Cloneable sender side of the auto-saver.
#[derive(Clone)]
pub struct AutoSaveHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl AutoSaveHandle {
    /// Queues a snapshot. Dropped silently if the auto-saver has already stopped.
    pub fn schedule(&self, snapshot: CvAggregate) {
        if self.tx.send(Command::Save(Box::new(snapshot))).is_err() {
            debug!("Auto-saver stopped; snapshot dropped");
        }
    }

    /// Discards any pending snapshot and waits until no auto-save write is in progress.
    pub async fn cancel_pending(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Cancel(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

pub struct AutoSaver;

impl AutoSaver {
    pub fn spawn(
        persistence: Arc<CvPersistence>,
        debounce: Duration,
    ) -> (AutoSaveHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(persistence, debounce, rx));
        (AutoSaveHandle { tx }, task)
    }
}

async fn flush(persistence: &CvPersistence, snapshot: CvAggregate) {
    let report = persistence.auto_save(&snapshot).await;
    debug!(
        "Auto-save to {} slot finished: {:?}",
        report.slot.name(),
        report.outcome
    );
}

async fn run(
    persistence: Arc<CvPersistence>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<CvAggregate> = None;
    loop {
        let next = if pending.is_some() {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    if let Some(snapshot) = pending.take() {
                        flush(&persistence, snapshot).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match next {
            Some(Command::Save(snapshot)) => pending = Some(*snapshot),
            Some(Command::Cancel(ack)) => {
                pending = None;
                let _ = ack.send(());
            }
            None => {
                if let Some(snapshot) = pending.take() {
                    flush(&persistence, snapshot).await;
                }
                break;
            }
        }
    }
    info!("Auto-saver stopped");
}
