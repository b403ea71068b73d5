//! Segment fixtures and an HTTP server that serves them.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use crate::TestHttpServer;

/// Body served for segment `index`.
#[must_use]
pub fn segment_payload(index: u64) -> Bytes {
    Bytes::from(format!("segment-{index}"))
}

/// Index encoded in a `chunk_{index}.ts` file name.
#[must_use]
pub fn parse_segment_index(file: &str) -> Option<u64> {
    file.strip_prefix("chunk_")?
        .strip_suffix(".ts")?
        .parse()
        .ok()
}

struct ServerState {
    segments: u64,
    faults: Mutex<HashMap<u64, VecDeque<StatusCode>>>,
    hits: Mutex<Vec<String>>,
}

/// Serves `/{stream}/chunk_{i}.ts` for `i < segments`, 404 beyond.
///
/// Every stream name serves the same segments; requests are recorded by path
/// so tests can tell sessions apart.
pub struct SegmentServer {
    server: TestHttpServer,
    state: Arc<ServerState>,
}

impl SegmentServer {
    pub async fn start(segments: u64) -> Self {
        let state = Arc::new(ServerState {
            segments,
            faults: Mutex::new(HashMap::new()),
            hits: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .route("/{stream}/{file}", get(serve_segment))
            .with_state(Arc::clone(&state));
        Self {
            server: TestHttpServer::new(router).await,
            state,
        }
    }

    /// Base URL for the stream called `name`.
    #[must_use]
    pub fn stream_url(&self, name: &str) -> Url {
        self.server.url(&format!("{name}/"))
    }

    /// Answer the next requests for `index` with these statuses, in order.
    pub fn fail(&self, index: u64, statuses: impl IntoIterator<Item = u16>) {
        let statuses = statuses
            .into_iter()
            .map(|s| StatusCode::from_u16(s).unwrap());
        self.state
            .faults
            .lock()
            .entry(index)
            .or_default()
            .extend(statuses);
    }

    /// Request paths in arrival order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().clone()
    }
}

async fn serve_segment(
    State(state): State<Arc<ServerState>>,
    Path((stream, file)): Path<(String, String)>,
) -> Response {
    state.hits.lock().push(format!("/{stream}/{file}"));

    let Some(index) = parse_segment_index(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let fault = state
        .faults
        .lock()
        .get_mut(&index)
        .and_then(VecDeque::pop_front);
    if let Some(status) = fault {
        return status.into_response();
    }
    if index >= state.segments {
        return StatusCode::NOT_FOUND.into_response();
    }
    segment_payload(index).into_response()
}
