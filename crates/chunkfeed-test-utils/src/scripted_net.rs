//! In-process [`Net`] with per-file scripted replies.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use chunkfeed_net::{Headers, Net, NetError};
use parking_lot::Mutex;
use tokio::sync::watch;
use url::Url;

use crate::segments::{parse_segment_index, segment_payload};

/// One scripted answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    /// The segment body from [`segment_payload`].
    Ok,
    /// An HTTP error status.
    Status(u16),
    Timeout,
    /// Connection dropped before a status arrived.
    Reset,
    /// `200` with an empty body.
    Empty,
    /// Never answers.
    Hang,
}

struct Inner {
    segments: u64,
    latency: Duration,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: watch::Sender<Vec<Url>>,
}

/// Serves `chunk_{i}.ts` for `i < segments` and 404 beyond, unless a script
/// for that file name says otherwise. Clones share state.
#[derive(Clone)]
pub struct ScriptedNet {
    inner: Arc<Inner>,
}

impl ScriptedNet {
    #[must_use]
    pub fn new(segments: u64) -> Self {
        Self::build(segments, Duration::ZERO)
    }

    /// Every reply is delayed by `latency`.
    #[must_use]
    pub fn with_latency(segments: u64, latency: Duration) -> Self {
        Self::build(segments, latency)
    }

    fn build(segments: u64, latency: Duration) -> Self {
        let (requests, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                segments,
                latency,
                scripts: Mutex::new(HashMap::new()),
                requests,
            }),
        }
    }

    /// Queue replies for requests to `file`; once used up, the default applies.
    pub fn script(&self, file: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.inner
            .scripts
            .lock()
            .entry(file.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Every requested URL, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Url> {
        self.inner.requests.borrow().clone()
    }

    /// Requested file names, oldest first.
    #[must_use]
    pub fn requested_files(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|url| file_name(url).to_string())
            .collect()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.inner.requests.borrow().len()
    }

    /// Resolves once at least `count` requests were issued.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut rx = self.inner.requests.subscribe();
        rx.wait_for(|requests| requests.len() >= count)
            .await
            .unwrap();
    }

    fn next_reply(&self, file: &str) -> Reply {
        if let Some(reply) = self
            .inner
            .scripts
            .lock()
            .get_mut(file)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        match parse_segment_index(file) {
            Some(index) if index < self.inner.segments => Reply::Ok,
            _ => Reply::Status(404),
        }
    }
}

fn file_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
}

#[async_trait]
impl Net for ScriptedNet {
    async fn get_bytes(&self, url: Url, _headers: Option<Headers>) -> Result<Bytes, NetError> {
        self.inner
            .requests
            .send_modify(|requests| requests.push(url.clone()));
        let reply = self.next_reply(file_name(&url));

        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }

        match reply {
            Reply::Ok => {
                let index = parse_segment_index(file_name(&url)).unwrap_or_default();
                Ok(segment_payload(index))
            }
            Reply::Status(status) => Err(NetError::http_error(status, url, None)),
            Reply::Timeout => Err(NetError::Timeout),
            Reply::Reset => Err(NetError::http("connection reset by peer")),
            Reply::Empty => Ok(Bytes::new()),
            Reply::Hang => std::future::pending().await,
        }
    }
}
