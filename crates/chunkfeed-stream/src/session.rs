#![forbid(unsafe_code)]

use chunkfeed_events::{SessionId, StreamPhase};
use tokio::sync::watch;
use tracing::warn;
use url::Url;

use crate::error::ControllerError;

/// Where a session is in its lifecycle.
#[derive(Clone, Debug)]
pub enum StreamStatus {
    Idle,
    FetchingSegment { index: u64 },
    AppendingSegment { index: u64 },
    Draining,
    Ended,
    Failed(ControllerError),
}

impl StreamStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamStatus::Ended | StreamStatus::Failed(_))
    }

    pub fn phase(&self) -> StreamPhase {
        match self {
            StreamStatus::Idle => StreamPhase::Idle,
            StreamStatus::FetchingSegment { index } => StreamPhase::FetchingSegment { index: *index },
            StreamStatus::AppendingSegment { index } => {
                StreamPhase::AppendingSegment { index: *index }
            }
            StreamStatus::Draining => StreamPhase::Draining,
            StreamStatus::Ended => StreamPhase::Ended,
            StreamStatus::Failed(_) => StreamPhase::Failed,
        }
    }
}

/// State of one playback attempt.
///
/// `next_index` only moves forward, one step per completed append. Status is
/// published through a watch channel so observers outside the controller task
/// can follow it.
pub struct StreamSession {
    id: SessionId,
    base_location: Url,
    next_index: u64,
    status: watch::Sender<StreamStatus>,
}

impl StreamSession {
    pub fn new(id: SessionId, base_location: Url) -> Self {
        let (status, _) = watch::channel(StreamStatus::Idle);
        Self {
            id,
            base_location,
            next_index: 0,
            status,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn base_location(&self) -> &Url {
        &self.base_location
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn status(&self) -> StreamStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    /// Returns `false` if the session is already terminal; terminal states never change.
    pub(crate) fn set_status(&mut self, status: StreamStatus) -> bool {
        let current = self.status.borrow().clone();
        if current.is_terminal() {
            warn!(session = %self.id, ?current, ?status, "transition out of terminal state ignored");
            return false;
        }
        self.status.send_replace(status);
        true
    }

    /// Record one completed append.
    pub(crate) fn advance(&mut self) -> u64 {
        self.next_index += 1;
        self.next_index
    }
}
