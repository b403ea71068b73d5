#![forbid(unsafe_code)]

use std::sync::Arc;

use bytes::Bytes;
use chunkfeed_net::{Net, NetError};
use tracing::{debug, trace};

use crate::{addresser::Segment, error::FetchError};

/// Raw bytes of one segment plus the index they belong to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentPayload {
    pub index: u64,
    pub bytes: Bytes,
}

impl SegmentPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decides whether a fetched body can be handed to the decoder.
#[cfg_attr(test, unimock::unimock(api = PayloadValidatorMock))]
pub trait PayloadValidator: Send + Sync {
    /// `Err` carries a human-readable reason.
    fn validate(&self, index: u64, bytes: &Bytes) -> Result<(), String>;
}

/// Rejects empty bodies only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmptyPayload;

impl PayloadValidator for NonEmptyPayload {
    fn validate(&self, _index: u64, bytes: &Bytes) -> Result<(), String> {
        if bytes.is_empty() {
            return Err("empty body".to_string());
        }
        Ok(())
    }
}

/// Checks MPEG-TS packet framing: 188-byte packets, each starting with `0x47`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MpegTsValidator;

impl MpegTsValidator {
    const PACKET_LEN: usize = 188;
    const SYNC_BYTE: u8 = 0x47;
}

impl PayloadValidator for MpegTsValidator {
    fn validate(&self, index: u64, bytes: &Bytes) -> Result<(), String> {
        NonEmptyPayload.validate(index, bytes)?;
        if bytes.len() % Self::PACKET_LEN != 0 {
            return Err(format!(
                "length {} is not a multiple of {}",
                bytes.len(),
                Self::PACKET_LEN
            ));
        }
        if let Some(packet) = bytes
            .chunks(Self::PACKET_LEN)
            .position(|packet| packet[0] != Self::SYNC_BYTE)
        {
            return Err(format!("packet {packet} lost sync"));
        }
        Ok(())
    }
}

/// Retrieves one segment per call. Never retries; the controller owns retry policy.
pub struct SegmentFetcher<N> {
    net: N,
    validator: Arc<dyn PayloadValidator>,
}

impl<N: Net> SegmentFetcher<N> {
    pub fn new(net: N, validator: Arc<dyn PayloadValidator>) -> Self {
        Self { net, validator }
    }

    pub async fn fetch(&self, segment: &Segment) -> Result<SegmentPayload, FetchError> {
        let index = segment.index;
        trace!(index, url = %segment.location, "fetching segment");

        let bytes = self
            .net
            .get_bytes(segment.location.clone(), None)
            .await
            .map_err(|e| classify(index, e))?;

        self.validator
            .validate(index, &bytes)
            .map_err(|reason| FetchError::Malformed { index, reason })?;

        trace!(index, bytes = bytes.len(), "segment fetched");
        Ok(SegmentPayload { index, bytes })
    }
}

/// Maps a transport failure onto the fetch taxonomy.
fn classify(index: u64, error: NetError) -> FetchError {
    if error.is_not_found() {
        return FetchError::NotFound { index };
    }
    match error.status_code() {
        Some(status) => {
            debug!(index, status, "segment request answered with error status");
            FetchError::ServerError { index, status }
        }
        None => FetchError::TransientNetwork {
            index,
            source: error,
        },
    }
}
