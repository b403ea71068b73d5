#![forbid(unsafe_code)]

use std::{fmt, time::Duration};

/// Identifies one playback attempt on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Coarse session state, mirrored from the controller for subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    FetchingSegment { index: u64 },
    AppendingSegment { index: u64 },
    Draining,
    Ended,
    Failed,
}

/// Events emitted while a session drives segments into a decode buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    SessionStarted {
        session: SessionId,
        base_url: String,
    },
    StatusChanged {
        session: SessionId,
        phase: StreamPhase,
    },
    /// Segment download started.
    SegmentStart { session: SessionId, index: u64 },
    /// Segment bytes received.
    SegmentFetched {
        session: SessionId,
        index: u64,
        bytes: u64,
        duration: Duration,
    },
    /// Decode buffer acknowledged the append.
    SegmentAppended { session: SessionId, index: u64 },
    /// A transient failure will be retried after `delay`.
    RetryScheduled {
        session: SessionId,
        index: u64,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// End of stream signalled to the source container.
    EndOfStream { session: SessionId, segments: u64 },
    Failed { session: SessionId, error: String },
    Cancelled { session: SessionId },
}
