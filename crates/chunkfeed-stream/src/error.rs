#![forbid(unsafe_code)]

use chunkfeed_net::NetError;
use chunkfeed_play::{AppendError, MediaSourceError};
use thiserror::Error;

/// Outcome of a single segment retrieval that did not yield bytes.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    /// No segment at this index. At the expected next index this is the end of the stream.
    #[error("segment {index} not found")]
    NotFound { index: u64 },

    /// Timeout, connection reset or a body cut short.
    #[error("segment {index}: transient network failure: {source}")]
    TransientNetwork {
        index: u64,
        #[source]
        source: NetError,
    },

    /// Non-2xx status other than not-found.
    #[error("segment {index}: server answered {status}")]
    ServerError { index: u64, status: u16 },

    /// Body arrived but cannot be decoded.
    #[error("segment {index}: malformed payload: {reason}")]
    Malformed { index: u64, reason: String },
}

impl FetchError {
    pub fn index(&self) -> u64 {
        match self {
            FetchError::NotFound { index }
            | FetchError::TransientNetwork { index, .. }
            | FetchError::ServerError { index, .. }
            | FetchError::Malformed { index, .. } => *index,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::TransientNetwork { .. } | FetchError::ServerError { .. }
        )
    }
}

/// Failures of the buffer feeder.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedError {
    #[error(transparent)]
    Append(#[from] AppendError),

    /// A previous append was abandoned before the decoder acknowledged it.
    #[error("an append is still in flight on this decode buffer")]
    AppendInFlight,

    #[error("segment {got} appended out of order (expected {expected})")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("end of stream already signalled")]
    Ended,

    #[error("source container rejected end of stream: {0}")]
    EndOfStream(#[source] MediaSourceError),
}

/// Last failure seen before a retry budget ran out.
#[derive(Debug, Error, Clone)]
pub enum RetryCause {
    #[error(transparent)]
    Fetch(FetchError),
    #[error(transparent)]
    Append(AppendError),
}

/// Terminal reason for a session that did not complete.
#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    #[error("fetch failed: {source}")]
    Fetch {
        index: u64,
        #[source]
        source: FetchError,
    },

    #[error("segment {index}: append failed: {source}")]
    Append {
        index: u64,
        #[source]
        source: FeedError,
    },

    #[error("segment {index}: gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        index: u64,
        attempts: u32,
        last: RetryCause,
    },

    #[error("source container did not open: {0}")]
    SourceOpen(#[source] MediaSourceError),

    #[error("could not signal end of stream: {0}")]
    EndOfStream(#[source] FeedError),

    #[error("session cancelled")]
    Cancelled,

    /// The session task died without reporting.
    #[error("session task aborted: {0}")]
    Aborted(String),
}

impl ControllerError {
    /// Segment the failure is attached to, if any.
    pub fn index(&self) -> Option<u64> {
        match self {
            ControllerError::Fetch { index, .. }
            | ControllerError::Append { index, .. }
            | ControllerError::RetriesExhausted { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ControllerError::Cancelled)
    }
}

/// Setup errors: bad addressing configuration or transport construction.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("base URL cannot hold path segments: {0}")]
    InvalidBaseUrl(String),

    #[error("segment template must contain `{{index}}`: {0:?}")]
    InvalidTemplate(String),

    #[error("network client: {0}")]
    Net(#[from] NetError),
}

pub type StreamResult<T> = Result<T, StreamError>;
