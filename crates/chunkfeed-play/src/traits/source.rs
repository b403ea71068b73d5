use async_trait::async_trait;
use bytes::Bytes;

use crate::{AppendError, MediaSourceError, ReadyState, SourceHandle};

/// Appendable decode buffer.
///
/// Decoders reject overlapping writes: callers must not start an append
/// while a previous one on the same buffer is pending.
#[async_trait]
pub trait SourceBuffer: Send + Sync + 'static {
    /// Hand `bytes` to the decoder. Resolves when the decoder reports the
    /// append finished.
    async fn append(&self, bytes: Bytes) -> Result<(), AppendError>;
}

/// Source container attached to a playback surface.
#[async_trait]
pub trait MediaSource: Send + Sync + 'static {
    type Buffer: SourceBuffer;

    /// Handle the surface uses to attach this container.
    fn handle(&self) -> SourceHandle;

    fn ready_state(&self) -> ReadyState;

    /// Resolves once the container reports [`ReadyState::Open`].
    async fn opened(&self) -> Result<(), MediaSourceError>;

    /// Only valid once the container is open.
    fn open_source_buffer(&self, mime_codecs: &str) -> Result<Self::Buffer, MediaSourceError>;

    fn end_of_stream(&self) -> Result<(), MediaSourceError>;
}

/// Creates a fresh source container per playback attempt.
pub trait SourceFactory: Send + Sync + 'static {
    type Source: MediaSource;

    fn create_source(&self) -> Self::Source;
}
