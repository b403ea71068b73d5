#![forbid(unsafe_code)]

use chunkfeed_play::{MediaSource, SourceBuffer};
use tracing::{debug, trace};

use crate::{error::FeedError, fetcher::SegmentPayload};

/// Serialises appends into one decode buffer.
///
/// `append` takes `&mut self` and holds the borrow until the decoder reports
/// completion, so a second append cannot start while one is pending. If an
/// append future is dropped before completing, the feeder stays marked in
/// flight and refuses further work: the decoder may still be busy.
pub struct BufferFeeder<M: MediaSource> {
    source: M,
    buffer: M::Buffer,
    next_index: u64,
    in_flight: bool,
    ended: bool,
}

impl<M: MediaSource> BufferFeeder<M> {
    pub fn new(source: M, buffer: M::Buffer) -> Self {
        Self {
            source,
            buffer,
            next_index: 0,
            in_flight: false,
            ended: false,
        }
    }

    /// Index the next append must carry; equals the number of completed appends.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Append one payload and wait for the decoder to finish with it.
    ///
    /// On `Err` nothing advanced; the same payload may be offered again.
    pub async fn append(&mut self, payload: &SegmentPayload) -> Result<(), FeedError> {
        if self.ended {
            return Err(FeedError::Ended);
        }
        if self.in_flight {
            return Err(FeedError::AppendInFlight);
        }
        if payload.index != self.next_index {
            return Err(FeedError::OutOfOrder {
                expected: self.next_index,
                got: payload.index,
            });
        }

        trace!(index = payload.index, bytes = payload.len(), "append started");
        self.in_flight = true;
        let result = self.buffer.append(payload.bytes.clone()).await;
        self.in_flight = false;

        result?;
        self.next_index += 1;
        trace!(index = payload.index, "append completed");
        Ok(())
    }

    /// Tell the source container no more data follows. Idempotent.
    pub fn signal_end_of_stream(&mut self) -> Result<(), FeedError> {
        if self.ended {
            return Ok(());
        }
        if self.in_flight {
            return Err(FeedError::AppendInFlight);
        }
        self.source
            .end_of_stream()
            .map_err(FeedError::EndOfStream)?;
        self.ended = true;
        debug!(segments = self.next_index, "end of stream signalled");
        Ok(())
    }
}
