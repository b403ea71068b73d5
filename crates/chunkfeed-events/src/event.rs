#![forbid(unsafe_code)]

use crate::{PlaybackEvent, StreamEvent};

/// Unified event.
///
/// Hierarchical: each subsystem has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Segment pipeline event.
    Stream(StreamEvent),
    /// Playback surface control event.
    Playback(PlaybackEvent),
}

impl From<StreamEvent> for Event {
    fn from(e: StreamEvent) -> Self {
        Self::Stream(e)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}
