#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Unified event bus for chunkfeed sessions and player controls.

mod bus;
mod event;
mod playback;
mod stream;

pub use bus::EventBus;
pub use event::Event;
pub use playback::PlaybackEvent;
pub use stream::{SessionId, StreamEvent, StreamPhase};
