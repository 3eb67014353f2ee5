use crate::error::{AudioServerError, Result};
use crate::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Outcome of one coordinator refresh
#[derive(Debug, Clone)]
pub enum SnapshotUpdate {
    /// A new snapshot was published
    Refreshed(Arc<Snapshot>),

    /// A core subsystem failed; the previous snapshot is still current
    Failed(String),
}

impl SnapshotUpdate {
    /// The published snapshot, if the refresh succeeded
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            SnapshotUpdate::Refreshed(snapshot) => Some(snapshot),
            SnapshotUpdate::Failed(_) => None,
        }
    }
}

/// Stream of refresh outcomes from a [`Coordinator`](crate::Coordinator)
///
/// Updates are buffered per receiver. A reader that falls behind loses the
/// oldest outcomes. Every snapshot is complete on its own, so a lagging reader
/// only needs the latest one from `Coordinator::snapshot()`.
pub struct UpdateReceiver {
    rx: broadcast::Receiver<SnapshotUpdate>,
}

impl UpdateReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<SnapshotUpdate>) -> Self {
        Self { rx }
    }

    /// Wait for the next refresh outcome
    ///
    /// Fails with `ConnectionClosed` once the coordinator is dropped, and with
    /// `ChannelError` when snapshots were skipped. The receiver stays usable
    /// after a skip and resumes at the oldest retained update.
    pub async fn recv(&mut self) -> Result<SnapshotUpdate> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => AudioServerError::ConnectionClosed,
            broadcast::error::RecvError::Lagged(n) => skipped(n),
        })
    }

    /// Take a pending refresh outcome without waiting
    pub fn try_recv(&mut self) -> Result<Option<SnapshotUpdate>> {
        match self.rx.try_recv() {
            Ok(update) => Ok(Some(update)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(AudioServerError::ConnectionClosed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(skipped(n)),
        }
    }
}

fn skipped(n: u64) -> AudioServerError {
    AudioServerError::ChannelError(format!("Skipped {} snapshot updates", n))
}
