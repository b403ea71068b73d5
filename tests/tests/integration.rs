//! All integration tests for chunkfeed
#![allow(clippy::unwrap_used)]

mod chunkfeed_net;
mod chunkfeed_stream;
