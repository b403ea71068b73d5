#![forbid(unsafe_code)]

use std::time::Duration;

use chunkfeed_events::{EventBus, SessionId, StreamEvent};
use chunkfeed_net::Net;
use chunkfeed_play::{AppendError, MediaSource};
use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info, warn};
use url::Url;

use crate::{
    addresser::SegmentAddresser,
    config::StreamOptions,
    error::{ControllerError, FeedError, FetchError, RetryCause, StreamResult},
    feeder::BufferFeeder,
    fetcher::{SegmentFetcher, SegmentPayload},
    retry::RetryPolicy,
    session::{StreamSession, StreamStatus},
};

/// What a session delivered before ending normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSummary {
    pub session: SessionId,
    /// Number of segments appended, i.e. the index of the first missing one.
    pub segments: u64,
}

/// Drives one session: open the source, then fetch and append segments in
/// order until the first missing index, then signal end of stream.
///
/// Cancellation is checked at every state transition and raced against every
/// await. A cancelled session ends in [`StreamStatus::Ended`] and `run`
/// returns [`ControllerError::Cancelled`].
pub struct StreamController<N, M> {
    source: M,
    mime_codecs: String,
    pipeline: Pipeline<N>,
}

/// Everything except the source, which the feeder takes over once open.
struct Pipeline<N> {
    session: StreamSession,
    addresser: SegmentAddresser,
    fetcher: SegmentFetcher<N>,
    fetch_retry: RetryPolicy,
    append_retry: RetryPolicy,
    cancel: CancellationToken,
    bus: EventBus,
}

impl<N: Net, M: MediaSource> StreamController<N, M> {
    pub fn new(
        id: SessionId,
        base_url: Url,
        net: N,
        source: M,
        options: &StreamOptions,
    ) -> StreamResult<Self> {
        let addresser = SegmentAddresser::new(base_url.clone(), options.template.clone())?;
        let pipeline = Pipeline {
            session: StreamSession::new(id, base_url),
            addresser,
            fetcher: SegmentFetcher::new(net, options.validator.clone()),
            fetch_retry: options.fetch_retry.clone(),
            append_retry: options.append_retry.clone(),
            cancel: options.session_token(),
            bus: options.event_bus(),
        };
        Ok(Self {
            source,
            mime_codecs: options.mime_codecs.clone(),
            pipeline,
        })
    }

    pub fn session(&self) -> &StreamSession {
        &self.pipeline.session
    }

    pub fn subscribe_status(&self) -> watch::Receiver<StreamStatus> {
        self.pipeline.session.subscribe_status()
    }

    /// Cancelling this token stops the session at its next suspension point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.pipeline.cancel.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.pipeline.bus
    }

    /// Run the session to a terminal state.
    pub async fn run(self) -> Result<StreamSummary, ControllerError> {
        let Self {
            source,
            mime_codecs,
            mut pipeline,
        } = self;
        let span = debug_span!(
            "stream_session",
            session = %pipeline.session.id(),
            base = %pipeline.session.base_location(),
        );

        async move {
            let result = pipeline.drive(source, &mime_codecs).await;
            pipeline.finish(&result);
            result
        }
        .instrument(span)
        .await
    }
}

impl<N: Net> Pipeline<N> {
    async fn drive<M: MediaSource>(
        &mut self,
        source: M,
        mime_codecs: &str,
    ) -> Result<StreamSummary, ControllerError> {
        let mut feeder = self.open(source, mime_codecs).await?;

        loop {
            self.check_cancelled()?;
            let index = self.session.next_index();
            debug_assert_eq!(index, feeder.next_index());

            self.transition(StreamStatus::FetchingSegment { index });
            let Some(payload) = self.fetch_segment(index).await? else {
                break;
            };

            // A response that lost the race with cancel is dropped unappended.
            self.check_cancelled()?;

            self.transition(StreamStatus::AppendingSegment { index });
            self.append_segment(&mut feeder, &payload).await?;
            self.session.advance();
            self.bus.publish(StreamEvent::SegmentAppended {
                session: self.session.id(),
                index,
            });
        }

        self.transition(StreamStatus::Draining);
        self.check_cancelled()?;
        feeder
            .signal_end_of_stream()
            .map_err(ControllerError::EndOfStream)?;

        let segments = self.session.next_index();
        self.bus.publish(StreamEvent::EndOfStream {
            session: self.session.id(),
            segments,
        });
        Ok(StreamSummary {
            session: self.session.id(),
            segments,
        })
    }

    /// Wait for the source container to open, then create the decode buffer.
    async fn open<M: MediaSource>(
        &mut self,
        source: M,
        mime_codecs: &str,
    ) -> Result<BufferFeeder<M>, ControllerError> {
        debug!(handle = %source.handle(), "waiting for source to open");
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(ControllerError::Cancelled),
            opened = source.opened() => opened.map_err(ControllerError::SourceOpen)?,
        }

        let buffer = source
            .open_source_buffer(mime_codecs)
            .map_err(ControllerError::SourceOpen)?;
        debug!(mime_codecs, "decode buffer opened");
        Ok(BufferFeeder::new(source, buffer))
    }

    /// `Ok(None)` means `index` does not exist: the stream is complete.
    async fn fetch_segment(
        &mut self,
        index: u64,
    ) -> Result<Option<SegmentPayload>, ControllerError> {
        let segment = self.addresser.segment(index);
        self.bus.publish(StreamEvent::SegmentStart {
            session: self.session.id(),
            index,
        });

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let started = Instant::now();
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(ControllerError::Cancelled),
                result = self.fetcher.fetch(&segment) => result,
            };

            let error = match result {
                Ok(payload) => {
                    self.bus.publish(StreamEvent::SegmentFetched {
                        session: self.session.id(),
                        index,
                        bytes: payload.len() as u64,
                        duration: started.elapsed(),
                    });
                    return Ok(Some(payload));
                }
                Err(FetchError::NotFound { index: missing }) if missing == index => {
                    debug!(index, "segment not found, end of stream");
                    return Ok(None);
                }
                Err(error) if error.is_retryable() => error,
                Err(error) => return Err(ControllerError::Fetch { index, source: error }),
            };

            if !self.fetch_retry.allows_another(attempts) {
                return Err(ControllerError::RetriesExhausted {
                    index,
                    attempts,
                    last: RetryCause::Fetch(error),
                });
            }
            let delay = self.fetch_retry.delay_for_attempt(attempts);
            self.backoff(index, attempts, delay, error.to_string()).await?;
        }
    }

    async fn append_segment<M: MediaSource>(
        &mut self,
        feeder: &mut BufferFeeder<M>,
        payload: &SegmentPayload,
    ) -> Result<(), ControllerError> {
        let index = payload.index;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(ControllerError::Cancelled),
                result = feeder.append(payload) => result,
            };

            match result {
                Ok(()) => return Ok(()),
                Err(FeedError::Append(AppendError::BufferFull)) => {}
                Err(source) => return Err(ControllerError::Append { index, source }),
            }

            if !self.append_retry.allows_another(attempts) {
                return Err(ControllerError::RetriesExhausted {
                    index,
                    attempts,
                    last: RetryCause::Append(AppendError::BufferFull),
                });
            }
            let delay = self.append_retry.delay_for_attempt(attempts);
            self.backoff(index, attempts, delay, AppendError::BufferFull.to_string())
                .await?;
        }
    }

    /// Announce a retry and sleep, giving up early on cancel.
    async fn backoff(
        &self,
        index: u64,
        attempt: u32,
        delay: Duration,
        error: String,
    ) -> Result<(), ControllerError> {
        debug!(index, attempt, ?delay, %error, "retrying segment");
        self.bus.publish(StreamEvent::RetryScheduled {
            session: self.session.id(),
            index,
            attempt,
            delay,
            error,
        });

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ControllerError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn check_cancelled(&self) -> Result<(), ControllerError> {
        if self.cancel.is_cancelled() {
            return Err(ControllerError::Cancelled);
        }
        Ok(())
    }

    fn transition(&mut self, status: StreamStatus) {
        let phase = status.phase();
        if self.session.set_status(status) {
            self.bus.publish(StreamEvent::StatusChanged {
                session: self.session.id(),
                phase,
            });
        }
    }

    fn finish(&mut self, result: &Result<StreamSummary, ControllerError>) {
        let session = self.session.id();
        match result {
            Ok(summary) => {
                info!(segments = summary.segments, "stream ended");
                self.transition(StreamStatus::Ended);
            }
            Err(ControllerError::Cancelled) => {
                debug!(index = self.session.next_index(), "session cancelled");
                self.transition(StreamStatus::Ended);
                self.bus.publish(StreamEvent::Cancelled { session });
            }
            Err(error) => {
                warn!(%error, index = ?error.index(), "session failed");
                self.transition(StreamStatus::Failed(error.clone()));
                self.bus.publish(StreamEvent::Failed {
                    session,
                    error: error.to_string(),
                });
            }
        }
    }
}
