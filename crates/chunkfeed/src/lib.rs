#![forbid(unsafe_code)]

//! # Chunkfeed
//!
//! Facade crate: streams numbered media segments from a base URL into a
//! playback surface, one segment at a time and strictly in order.
//!
//! ## Quick start
//!
//! ```ignore
//! use chunkfeed::prelude::*;
//!
//! let mut player = StreamPlayer::with_http(factory, surface, StreamOptions::default())?;
//! player.start("https://cdn.example.com/videos/42/".parse()?).await?;
//! let summary = player.wait().await;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod events {
    pub use chunkfeed_events::*;
}

pub mod net {
    pub use chunkfeed_net::*;
}

pub mod play {
    pub use chunkfeed_play::*;
}

pub mod stream {
    pub use chunkfeed_stream::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use chunkfeed_events::{Event, EventBus, PlaybackEvent, SessionId, StreamEvent};
    pub use chunkfeed_net::{HttpClient, NetOptions};
    pub use chunkfeed_play::{
        MediaSource, PlaybackSurface, PlayerControls, SourceBuffer, SourceFactory, Volume,
    };
    pub use chunkfeed_stream::{
        ControllerError, RetryPolicy, SegmentTemplate, StreamOptions, StreamPlayer, StreamStatus,
        StreamSummary,
    };
}
