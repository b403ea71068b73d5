#![forbid(unsafe_code)]
#![allow(clippy::unwrap_used)]

//! Shared test utilities for the chunkfeed workspace.

pub mod http_server;
pub mod scripted_net;
pub mod segments;

pub use http_server::TestHttpServer;
pub use scripted_net::{Reply, ScriptedNet};
pub use segments::{SegmentServer, parse_segment_index, segment_payload};
