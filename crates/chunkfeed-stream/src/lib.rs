//! `chunkfeed-stream`
//!
//! Progressive segment buffering: numbered segments are fetched one at a time
//! and appended to a decode buffer in strict order.
//!
//! ## Pieces
//! - [`SegmentAddresser`]: index -> URL, pure.
//! - [`SegmentFetcher`]: one GET per call, failures classified into [`FetchError`].
//! - [`BufferFeeder`]: at most one append in flight, end-of-stream exactly once.
//! - [`StreamController`]: the loop, retries, cancellation and terminal state.
//! - [`StreamPlayer`]: one session per playback surface.

#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod addresser;
mod config;
mod controller;
mod error;
mod feeder;
mod fetcher;
mod player;
mod retry;
mod session;

pub use addresser::{Segment, SegmentAddresser, SegmentTemplate};
pub use config::{DEFAULT_MIME_CODECS, StreamOptions};
pub use controller::{StreamController, StreamSummary};
pub use error::{ControllerError, FeedError, FetchError, RetryCause, StreamError, StreamResult};
pub use feeder::BufferFeeder;
pub use fetcher::{MpegTsValidator, NonEmptyPayload, PayloadValidator, SegmentFetcher, SegmentPayload};
pub use player::{SessionOutcome, StreamPlayer};
pub use retry::RetryPolicy;
pub use session::{StreamSession, StreamStatus};
