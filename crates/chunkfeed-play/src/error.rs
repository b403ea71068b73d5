#![forbid(unsafe_code)]

use thiserror::Error;

/// Failure reported by a decode buffer for one append.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AppendError {
    /// Decoder cannot take more data right now; retry once it drains.
    #[error("decode buffer is full")]
    BufferFull,
    /// The surface tore the buffer down.
    #[error("decode buffer closed")]
    DecodeBufferClosed,
}

impl AppendError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppendError::BufferFull)
    }
}

/// Failure reported by a source container.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaSourceError {
    #[error("source is not open (state: {0:?})")]
    NotOpen(crate::ReadyState),
    #[error("source closed before it opened")]
    Closed,
    #[error("unsupported MIME type: {0}")]
    Unsupported(String),
}
